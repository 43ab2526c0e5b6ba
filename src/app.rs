use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use crate::client::{ChatClient, ChatError, ChatReply};
use crate::session::ChatSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub session: ChatSession,
    pub input_cursor: usize, // cursor position in session.input, in chars
    pub pending: Option<JoinHandle<Result<ChatReply, ChatError>>>,

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height, updated during render
    pub chat_width: u16,  // inner width, updated during render
    pub chat_total_lines: usize, // wrapped line count, updated during render
    pub chat_follow: bool, // pin the view to the newest line on next render
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub client: ChatClient,
}

impl App {
    pub fn new(client: ChatClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            session: ChatSession::new(),
            input_cursor: 0,
            pending: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,
            chat_follow: true,
            chat_area: None,

            animation_frame: 0,

            client,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.session.is_processing()
    }

    /// Submit the input line and start the exchange in the background.
    /// Returns false when the session refused the submission.
    pub fn send(&mut self) -> bool {
        let Some(question) = self.session.submit() else {
            return false;
        };
        self.input_cursor = 0;

        tracing::info!(endpoint = %self.client.endpoint(), "sending question");
        let client = self.client.clone();
        self.pending = Some(tokio::spawn(async move { client.ask(&question).await }));

        // Keep "Thinking..." visible
        self.scroll_chat_to_bottom();
        true
    }

    /// Settle the session if the background exchange has finished.
    pub async fn poll_pending(&mut self) {
        let finished = self.pending.as_ref().is_some_and(|h| h.is_finished());
        if finished {
            self.wait_pending().await;
        }
    }

    /// Wait for the in-flight exchange, if any, and settle the session.
    pub async fn wait_pending(&mut self) {
        let Some(handle) = self.pending.take() else {
            return;
        };

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ChatError::Task(e.to_string())),
        };
        self.session.settle(outcome);
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_processing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_follow = false;
        self.chat_scroll = 0;
    }

    /// Jump to the newest line. The jump is re-applied after the next render
    /// measures the wrapped conversation.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_follow = true;
        self.chat_scroll = self.max_chat_scroll();
    }

    /// Record the wrapped line count measured by the renderer
    pub fn set_chat_total_lines(&mut self, total: usize) {
        self.chat_total_lines = total;
        if self.chat_follow {
            self.chat_scroll = self.max_chat_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_chat_scroll());
        }
    }

    pub fn max_chat_scroll(&self) -> u16 {
        let hidden = self.chat_total_lines.saturating_sub(self.chat_height as usize);
        u16::try_from(hidden).unwrap_or(u16::MAX)
    }
}
