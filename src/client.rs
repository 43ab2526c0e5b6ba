use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

/// Body returned by the chat service
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub answer: String,
    pub is_verified: Option<bool>,
}

impl ChatReply {
    /// Read a reply out of any JSON body.
    ///
    /// Only a `null` body fails. A missing or `null` answer becomes empty text
    /// and a non-string answer is shown as its JSON text.
    pub fn from_json(body: Value) -> Result<Self, ChatError> {
        if body.is_null() {
            return Err(ChatError::NullBody);
        }

        let answer = match body.get("answer") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };
        let is_verified = body.get("is_verified").and_then(Value::as_bool);

        Ok(Self { answer, is_verified })
    }
}

/// Every failure of an exchange. The view treats all of them the same way.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request to chat service failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("chat service returned an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("chat service returned a null body")]
    NullBody,
    #[error("chat task did not complete: {0}")]
    Task(String),
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Like `new`, but requests give up after `timeout`
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChatError::Transport)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn ask(&self, question: &str) -> Result<ChatReply, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { question })
            .send()
            .await
            .map_err(ChatError::Transport)?;

        // The status code is only logged; a readable body wins either way.
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, endpoint = %self.endpoint, "chat service answered with non-success status");
        }

        let body: Value = response.json().await.map_err(ChatError::Decode)?;
        let reply = ChatReply::from_json(body)?;
        tracing::debug!(
            answer_len = reply.answer.len(),
            server_verified = ?reply.is_verified,
            "chat reply decoded"
        );
        Ok(reply)
    }
}
