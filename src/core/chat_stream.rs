use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::session::{SessionHandle, StreamError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(StreamError),
    End,
}

pub struct StreamParams {
    pub session: Arc<dyn SessionHandle>,
    pub user_text: String,
    pub stream_id: u64,
}

/// Runs provider streams on background tasks and reports their progress,
/// tagged with the stream id, over a single channel.
///
/// This is where provider failures stop: an `Err` from the fragment stream
/// becomes [`StreamMessage::Error`] followed by [`StreamMessage::End`].
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(forward_stream(params, tx));
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn forward_stream(params: StreamParams, tx: mpsc::UnboundedSender<(StreamMessage, u64)>) {
    let StreamParams {
        session,
        user_text,
        stream_id,
    } = params;

    debug!(stream_id, "starting response stream");
    let mut fragments = session.stream_response(&user_text);
    let mut count = 0usize;

    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => {
                if fragment.is_empty() {
                    continue;
                }
                count += 1;
                if tx.send((StreamMessage::Chunk(fragment), stream_id)).is_err() {
                    // Receiver is gone; nobody is left to render the reply.
                    return;
                }
            }
            Err(err) => {
                warn!(stream_id, fragments = count, "response stream failed: {err}");
                let _ = tx.send((StreamMessage::Error(err), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }
        }
    }

    debug!(stream_id, fragments = count, "response stream finished");
    let _ = tx.send((StreamMessage::End, stream_id));
}
