//! Conversation state machine behind the chat view
//!
//! `Idle -> Researching... -> Verified | Error`. Status is never reset to
//! `Idle`; it keeps the outcome of the last exchange.

use chrono::Local;

use crate::client::{ChatError, ChatReply};
use crate::state::{display_time, AgentState, Message, StepIcon, StepStatus, TraceStep};

#[derive(Debug, Default)]
pub struct ChatSession {
    pub messages: Vec<Message>,
    pub input: String,
    pub status: AgentState,
    pub trace: Vec<TraceStep>,
    processing: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Accept the current input as a question.
    ///
    /// Returns the text to send, or `None` when the input is blank or an
    /// exchange is already in flight.
    pub fn submit(&mut self) -> Option<String> {
        if self.input.trim().is_empty() || self.processing {
            return None;
        }

        let question = std::mem::take(&mut self.input);
        self.messages.push(Message::user(question.clone()));
        self.processing = true;
        self.status = AgentState::Researching;
        Some(question)
    }

    /// Record the outcome of the exchange started by `submit`.
    pub fn settle(&mut self, outcome: Result<ChatReply, ChatError>) {
        match outcome {
            Ok(reply) => {
                self.trace = completed_trace();
                self.messages.push(Message::assistant(reply.answer, true));
                self.status = AgentState::Verified;
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat exchange failed");
                self.status = AgentState::Error;
            }
        }
        self.processing = false;
    }
}

/// Trace shown after every successful reply.
fn completed_trace() -> Vec<TraceStep> {
    let now = display_time(Local::now());
    vec![
        TraceStep {
            id: "1".to_string(),
            name: "Researcher".to_string(),
            status: StepStatus::Success,
            icon: StepIcon::Researcher,
            description: "Context retrieved.".to_string(),
            timestamp: now.clone(),
        },
        TraceStep {
            id: "2".to_string(),
            name: "Critic".to_string(),
            status: StepStatus::Success,
            icon: StepIcon::Critic,
            description: "Answer verified.".to_string(),
            timestamp: now,
        },
    ]
}
