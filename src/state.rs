//! Conversation records shown by the control panel
//!
//! Nothing here depends on the terminal; the same types back the TUI and the
//! one-shot `ask` command.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
    /// Only set on assistant replies
    pub is_verified: Option<bool>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Local::now(),
            is_verified: None,
        }
    }

    pub fn assistant(content: impl Into<String>, verified: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Local::now(),
            is_verified: Some(verified),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified.unwrap_or(false)
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepIcon {
    Researcher,
    Critic,
}

/// One entry of the execution trace panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    pub icon: StepIcon,
    pub description: String,
    /// Local wall-clock time, already formatted for display
    pub timestamp: String,
}

/// Agent status label shown in the side panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgentState {
    #[default]
    Idle,
    Researching,
    Verified,
    Error,
}

impl AgentState {
    pub fn label(&self) -> &'static str {
        match self {
            AgentState::Idle => "Idle",
            AgentState::Researching => "Researching...",
            AgentState::Verified => "Verified",
            AgentState::Error => "Error",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Format a time the way the trace panel shows it, e.g. `3:07:42 PM`
pub fn display_time(time: DateTime<Local>) -> String {
    time.format("%-I:%M:%S %p").to_string()
}
