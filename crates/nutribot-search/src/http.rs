//! HTTP client for the answering service's search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use nutribot_core::config::AnswerConfig;
use nutribot_core::types::Citation;

use crate::error::QueryFailed;
use crate::{Answer, AnswerClient};

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

/// Wire shape of a search response. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Citation>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Validate the response into an [`Answer`].
    pub fn into_answer(self) -> Result<Answer, QueryFailed> {
        if !self.success {
            return Err(QueryFailed::Rejected {
                message: self.error.or(self.answer),
            });
        }
        match self.answer {
            Some(answer) if !answer.trim().is_empty() => Ok(Answer {
                text: answer,
                sources: self.sources.unwrap_or_default(),
            }),
            _ => Err(QueryFailed::Malformed(
                "success response without an answer".to_string(),
            )),
        }
    }
}

/// Answering-service client backed by `reqwest`.
pub struct HttpAnswerClient {
    search_url: String,
    reset_command: String,
    client: reqwest::Client,
}

impl HttpAnswerClient {
    /// Create a client from the answer section of the config.
    pub fn new(config: &AnswerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            search_url: config.search_url(),
            reset_command: config.reset_command.clone(),
            client,
        }
    }

    async fn post(&self, query: &str) -> Result<SearchResponse, QueryFailed> {
        let response = self
            .client
            .post(&self.search_url)
            .json(&SearchRequest { query })
            .send()
            .await
            .map_err(|e| QueryFailed::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QueryFailed::Transport(e.to_string()))?;

        if !status.is_success() {
            // Error bodies usually carry `{"error": "..."}`.
            let message = serde_json::from_str::<SearchResponse>(&body)
                .ok()
                .and_then(|r| r.error);
            return Err(QueryFailed::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| QueryFailed::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AnswerClient for HttpAnswerClient {
    async fn query(&self, text: &str) -> Result<Answer, QueryFailed> {
        if text.trim().is_empty() {
            return Err(QueryFailed::EmptyQuery);
        }
        tracing::debug!(url = %self.search_url, text_len = text.len(), "Querying answering service");
        self.post(text).await?.into_answer()
    }

    async fn notify_reset(&self) -> Result<(), QueryFailed> {
        tracing::debug!(url = %self.search_url, "Asking answering service to clear history");
        let response = self.post(&self.reset_command).await?;
        if response.success {
            Ok(())
        } else {
            Err(QueryFailed::Rejected {
                message: response.error,
            })
        }
    }
}
