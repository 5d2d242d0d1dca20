mod blocks;
mod input;
mod streaming;

use tokio::sync::mpsc;

use super::App;
use crate::core::chat_stream::StreamParams;
use crate::core::session::StreamError;

#[derive(Debug)]
pub enum AppAction {
    AppendResponseChunk { content: String, stream_id: u64 },
    StreamErrored { error: StreamError, stream_id: u64 },
    StreamCompleted { stream_id: u64 },
    SubmitMessage { message: String },
    SubmitSuggestion { index: usize },
    NewChat,
    ClearStatus,
    SetStatus { message: String },
    ClearInput,
    InsertIntoInput { text: String },
    ScrollBy { lines: i32 },
    ScrollToBottom,
    SelectNextSuggestion,
    SelectPreviousSuggestion,
    ToggleMarkdown,
    EnterBlockSelect,
    SelectNextBlock,
    SelectPreviousBlock,
    CopySelectedBlock,
    ExitBlockSelect,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

pub enum AppCommand {
    SpawnStream(StreamParams),
    CopyToClipboard(String),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::SubmitMessage { .. }
        | AppAction::SubmitSuggestion { .. }
        | AppAction::NewChat => streaming::handle_streaming_action(app, action, ctx),

        AppAction::ClearStatus
        | AppAction::SetStatus { .. }
        | AppAction::ClearInput
        | AppAction::InsertIntoInput { .. }
        | AppAction::ScrollBy { .. }
        | AppAction::ScrollToBottom
        | AppAction::SelectNextSuggestion
        | AppAction::SelectPreviousSuggestion
        | AppAction::ToggleMarkdown => input::handle_input_action(app, action, ctx),

        AppAction::EnterBlockSelect
        | AppAction::SelectNextBlock
        | AppAction::SelectPreviousBlock
        | AppAction::CopySelectedBlock
        | AppAction::ExitBlockSelect => blocks::handle_block_action(app, action, ctx),
    }
}
