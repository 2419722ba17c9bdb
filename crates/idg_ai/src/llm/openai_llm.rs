use idg_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{GenerateRequest, Llm};
use crate::openai::OpenAiClient;

const MAX_ERROR_BODY: usize = 2_000;

#[derive(Debug, Clone)]
pub struct OpenAiLlm {
    client: OpenAiClient,
}

impl OpenAiLlm {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn truncate(mut s: String) -> String {
    if s.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

impl Llm for OpenAiLlm {
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError> {
        if req.api_key.trim().is_empty() {
            return Err(AppError::new(
                "GEN_REQUEST_INVALID",
                "An API key is required for the generation backend",
            ));
        }

        let url = self.client.chat_completions_url();
        let body = ChatCompletionRequest {
            model: req.model,
            messages: vec![ChatMessage {
                role: "user",
                content: req.prompt,
            }],
            temperature: req.temperature,
            max_completion_tokens: req.max_completion_tokens,
        };

        let resp = ureq::post(&url)
            .timeout(self.client.timeout())
            .set("Authorization", &format!("Bearer {}", req.api_key.trim()))
            .send_json(&body);

        match resp {
            Ok(r) => {
                let v: ChatCompletionResponse = r.into_json().map_err(|e| {
                    AppError::new("GEN_BACKEND_FAILED", "Failed to decode generation response")
                        .with_details(e.to_string())
                })?;
                Ok(v
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default())
            }
            Err(ureq::Error::Status(status, r)) => {
                let text = r.into_string().unwrap_or_default();
                Err(AppError::new("GEN_BACKEND_FAILED", "Generation request failed")
                    .with_details(format!("status={status}; body={}", truncate(text)))
                    .with_retryable(status == 429 || status >= 500))
            }
            Err(e) => Err(AppError::new(
                "GEN_BACKEND_UNREACHABLE",
                "Failed to reach the generation backend",
            )
            .with_details(format!("url={url}; err={e}"))
            .with_retryable(true)),
        }
    }
}
