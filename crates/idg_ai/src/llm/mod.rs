use idg_core::error::AppError;

/// One text-generation call: a rendered prompt plus sampling parameters and a credential.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub api_key: &'a str,
}

pub trait Llm {
    /// Returns the generated text. Blank text is a valid result, not an error.
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError>;
}

pub mod openai_llm;
