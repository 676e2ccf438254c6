//! OpenAI-compatible chat-completions oracle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::backends::Oracle;
use crate::error::ExtractError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [Message<'a>; 2],
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat-completions client asking for a JSON object answer at temperature 0.
pub struct ChatCompletionsOracle {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsOracle {
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Oracle for ChatCompletionsOracle {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ExtractError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::OracleStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: Value = serde_json::from_str(&body).map_err(|e| ExtractError::Deserialize {
            context: "oracle chat completion".to_string(),
            source: e,
        })?;

        parsed
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ExtractError::OracleResponse {
                reason: "completion has no choices[0].message.content".to_string(),
            })
    }
}
