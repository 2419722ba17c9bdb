pub mod generate;
pub mod llm;
pub mod openai;
pub mod retry;
