pub mod app;
pub mod client;
pub mod config;
pub mod handler;
pub mod logging;
pub mod session;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use client::{ChatClient, ChatError, ChatReply};
pub use config::Config;
pub use session::ChatSession;
pub use state::{AgentState, Message, Role, TraceStep};
