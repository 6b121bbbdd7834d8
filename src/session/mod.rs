//! Per-conversation chat state.
//!
//! Drives the `Idle → Submitting → Streaming → Idle` cycle for one
//! conversation. Once the server accepts a request the session holds one
//! assistant message with a fixed id, and stream chunks accumulate in it.
//! A failure keeps
//! whatever was received and parks the session in `Errored` until the
//! error has been shown.

use strum::Display;
use tracing::debug;
use uuid::Uuid;

use crate::models::{ChatMessage, Message, Role};

/// Where the conversation is in its request cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Streaming,
    Errored,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    phase: Phase,
    in_flight: Option<Uuid>,
    error: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A request is outstanding; new submissions are ignored.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Submitting | Phase::Streaming)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The assistant message currently receiving chunks.
    pub fn in_flight(&self) -> Option<&Message> {
        let id = self.in_flight?;
        self.messages.iter().find(|m| m.id == id)
    }

    /// Start a turn.
    ///
    /// Appends the user message (when `text` is not blank) and returns the
    /// history to send. Returns `None` without changing anything while a
    /// request is outstanding.
    pub fn submit(&mut self, text: &str) -> Option<Vec<ChatMessage>> {
        if self.is_busy() {
            debug!(phase = %self.phase, "ignoring submit while busy");
            return None;
        }
        if !text.trim().is_empty() {
            self.messages.push(Message::new(Role::User, text));
        }
        self.error = None;
        self.phase = Phase::Submitting;
        Some(self.history())
    }

    /// The server accepted the request: add the empty assistant message
    /// that chunks will fill.
    ///
    /// Returns the message id. Calling it again while streaming returns the
    /// same id; outside a turn it does nothing.
    pub fn begin_stream(&mut self) -> Option<Uuid> {
        match self.phase {
            Phase::Submitting => {
                let message = Message::new(Role::Assistant, "");
                let id = message.id;
                self.messages.push(message);
                self.in_flight = Some(id);
                self.phase = Phase::Streaming;
                Some(id)
            }
            Phase::Streaming => self.in_flight,
            Phase::Idle | Phase::Errored => None,
        }
    }

    /// Append one stream chunk to the in-flight assistant message.
    ///
    /// A chunk that arrives before [`begin_stream`](Self::begin_stream)
    /// starts the message itself. Chunks outside a turn are dropped.
    pub fn push_chunk(&mut self, delta: &str) -> Option<Uuid> {
        match self.phase {
            Phase::Submitting => {
                let id = self.begin_stream()?;
                self.push_chunk(delta);
                Some(id)
            }
            Phase::Streaming => {
                let id = self.in_flight?;
                let message = self.messages.iter_mut().rev().find(|m| m.id == id)?;
                message.append(delta);
                Some(id)
            }
            Phase::Idle | Phase::Errored => {
                debug!(phase = %self.phase, "dropping chunk outside a turn");
                None
            }
        }
    }

    /// The stream ended normally.
    pub fn complete(&mut self) {
        if self.is_busy() {
            self.phase = Phase::Idle;
            self.in_flight = None;
        }
    }

    /// The request failed. Partial output stays in the transcript.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = Phase::Errored;
        self.in_flight = None;
        self.error = Some(message.into());
    }

    /// Take the pending error for display and return to `Idle`.
    pub fn take_error(&mut self) -> Option<String> {
        let error = self.error.take();
        if self.phase == Phase::Errored {
            self.phase = Phase::Idle;
        }
        error
    }

    /// Wire turns for the next request. Empty messages are skipped.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .map(Message::to_chat)
            .collect()
    }
}
