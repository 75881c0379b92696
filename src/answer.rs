use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;

const COMPLETIONS_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Returned when the completion provider produced no content (not an error)
pub const NO_ANSWER: &str = "No answer generated";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on \
YouTube video transcripts. Only use information from the provided transcript to answer questions.";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

/// External chat-completion provider: one prompt in, at most one answer out
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns `None` when the provider responded without any content
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<Option<String>>;
}

/// OpenAI chat-completions client
#[derive(Clone)]
pub struct OpenAiCompletions {
    client: reqwest::Client,
    model: String,
}

impl OpenAiCompletions {
    pub fn new(client: reqwest::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<Option<String>> {
        if api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY not configured (set the environment variable or save it with 'ytqa config')");
        }

        debug!("Requesting completion from model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let resp = self
            .client
            .post(COMPLETIONS_API_URL)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("completion provider returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        Ok(extract_completion_text(&json))
    }
}

/// Build the single user message carrying the grounding transcript and the question
pub fn build_prompt(transcript: &str, question: &str) -> String {
    format!("Based on this YouTube transcript: \"{transcript}\"\n\nQuestion: {question}")
}

fn extract_completion_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
}
