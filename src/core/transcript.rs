//! Streaming transcript state machine.
//!
//! [`TranscriptController`] owns the ordered turns of one conversation and
//! folds the fragments of an in-flight model response into them. At most one
//! response is in flight at a time. The running text of that response lives
//! in a [`ResponseBuffer`] separate from the committed turns, and only the
//! turn the buffer created is ever rewritten.

use std::sync::Arc;

use tracing::debug;

use crate::core::message::{Role, Turn};
use crate::core::session::{ProviderError, SessionHandle, SessionProvider, StreamError};

/// Text of the turn appended when a response fails before producing output.
pub const STREAM_ERROR_TEXT: &str =
    "Sorry, I encountered an error. Please check the logs or try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    /// Request issued, no fragment received yet.
    Sending,
    /// At least one fragment has been applied.
    Streaming,
}

/// Result of a user submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Blank or whitespace-only text; nothing was recorded.
    Empty,
    /// A response is still in flight; the submission was dropped.
    Busy,
}

impl SubmitOutcome {
    pub fn is_accepted(self) -> bool {
        self == SubmitOutcome::Accepted
    }
}

#[derive(Debug, Default)]
struct ResponseBuffer {
    text: String,
    committed: bool,
}

impl ResponseBuffer {
    fn clear(&mut self) {
        self.text.clear();
        self.committed = false;
    }
}

pub struct TranscriptController {
    turns: Vec<Turn>,
    buffer: ResponseBuffer,
    in_flight: bool,
    response_id: u64,
    generation: u64,
    provider: Arc<dyn SessionProvider>,
    system_instruction: String,
    session: Arc<dyn SessionHandle>,
}

impl TranscriptController {
    /// Opens the first session. Provider failures surface here, once.
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        system_instruction: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let system_instruction = system_instruction.into();
        let session = provider.create_session(&system_instruction)?;
        Ok(Self {
            turns: Vec::new(),
            buffer: ResponseBuffer::default(),
            in_flight: false,
            response_id: 0,
            generation: 0,
            provider,
            system_instruction,
            session,
        })
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn phase(&self) -> StreamPhase {
        match (self.in_flight, self.buffer.committed) {
            (false, _) => StreamPhase::Idle,
            (true, false) => StreamPhase::Sending,
            (true, true) => StreamPhase::Streaming,
        }
    }

    /// Counts resets. Turns only ever change by appending, or by rewriting the
    /// turn of the response in flight, until the generation moves on.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of leading turns that can no longer change.
    pub fn settled_len(&self) -> usize {
        match self.phase() {
            StreamPhase::Streaming => self.turns.len().saturating_sub(1),
            StreamPhase::Idle | StreamPhase::Sending => self.turns.len(),
        }
    }

    pub fn current_response_id(&self) -> u64 {
        self.response_id
    }

    /// True when `id` names the response currently in flight.
    pub fn is_current_response(&self, id: u64) -> bool {
        self.in_flight && self.response_id == id
    }

    pub fn session(&self) -> Arc<dyn SessionHandle> {
        Arc::clone(&self.session)
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn append_user_turn(&mut self, text: &str) -> SubmitOutcome {
        if self.in_flight {
            debug!("dropping submission while a response is in flight");
            return SubmitOutcome::Busy;
        }
        if text.trim().is_empty() {
            return SubmitOutcome::Empty;
        }
        self.turns.push(Turn::user(text));
        SubmitOutcome::Accepted
    }

    /// Marks a response as in flight and returns its id.
    ///
    /// Returns `None` and changes nothing while another response is still in
    /// flight.
    pub fn begin_streaming(&mut self) -> Option<u64> {
        if self.in_flight {
            debug!(response_id = self.response_id, "refusing to start a second response");
            return None;
        }
        self.in_flight = true;
        self.buffer.clear();
        self.response_id += 1;
        Some(self.response_id)
    }

    pub fn consume_fragment(&mut self, fragment: &str) {
        if !self.in_flight || fragment.is_empty() {
            return;
        }
        self.buffer.text.push_str(fragment);

        if !self.buffer.committed {
            self.turns.push(Turn::model(self.buffer.text.clone()));
            self.buffer.committed = true;
            return;
        }

        if let Some(last) = self.turns.last_mut() {
            if last.role == Role::Model {
                last.text.clone_from(&self.buffer.text);
            }
        }
    }

    pub fn end_streaming(&mut self, error: Option<&StreamError>) {
        let produced_output = self.buffer.committed;
        self.in_flight = false;
        self.buffer.clear();

        if error.is_none() || produced_output {
            return;
        }
        if self.turns.last().is_some_and(Turn::is_user) {
            self.turns.push(Turn::model(STREAM_ERROR_TEXT));
        }
    }

    /// Discards the conversation and opens a fresh session.
    ///
    /// The new session is opened first; on failure the transcript, the
    /// in-flight response and the bound session are all left as they were.
    pub fn reset(&mut self) -> Result<(), ProviderError> {
        let session = self.provider.create_session(&self.system_instruction)?;
        self.session = session;
        self.turns.clear();
        self.buffer.clear();
        self.in_flight = false;
        // Anything still arriving for the old session must be treated as stale.
        self.response_id += 1;
        self.generation += 1;
        Ok(())
    }
}
