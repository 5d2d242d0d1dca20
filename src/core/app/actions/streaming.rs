use tracing::{debug, info, warn};

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::chat_stream::StreamParams;
use crate::core::session::StreamError;
use crate::core::suggestions::suggestion;
use crate::core::transcript::SubmitOutcome;

pub(super) fn handle_streaming_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            append_response_chunk(app, &content, ctx);
            None
        }
        AppAction::StreamErrored { error, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            handle_stream_error(app, &error, ctx);
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            finalize_stream(app, ctx);
            None
        }
        AppAction::SubmitMessage { message } => spawn_stream_for_message(app, message, ctx),
        AppAction::SubmitSuggestion { index } => {
            let prompt = suggestion(index)?.prompt;
            spawn_stream_for_message(app, prompt.to_string(), ctx)
        }
        AppAction::NewChat => {
            start_new_chat(app, ctx);
            None
        }
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}

pub(super) fn spawn_stream_for_message(
    app: &mut App,
    message: String,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match app.transcript.append_user_turn(&message) {
        SubmitOutcome::Accepted => {}
        SubmitOutcome::Empty | SubmitOutcome::Busy => return None,
    }

    app.ui.clear_input();
    app.ui.clear_status();
    app.ui.welcome_selection = None;
    app.ui.begin_activity();

    let stream_id = app.transcript.begin_streaming()?;
    debug!(stream_id, chars = message.len(), "submitting message");

    app.ui.auto_scroll = true;
    update_scroll(app, ctx);

    Some(AppCommand::SpawnStream(StreamParams {
        session: app.transcript.session(),
        user_text: message,
        stream_id,
    }))
}

fn append_response_chunk(app: &mut App, chunk: &str, ctx: AppActionContext) {
    if chunk.is_empty() {
        return;
    }
    app.transcript.consume_fragment(chunk);
    update_scroll(app, ctx);
}

fn handle_stream_error(app: &mut App, error: &StreamError, ctx: AppActionContext) {
    warn!("response failed: {error}");
    app.transcript.end_streaming(Some(error));
    update_scroll(app, ctx);
}

fn finalize_stream(app: &mut App, ctx: AppActionContext) {
    app.transcript.end_streaming(None);
    update_scroll(app, ctx);
}

fn start_new_chat(app: &mut App, ctx: AppActionContext) {
    if let Err(err) = app.transcript.reset() {
        warn!("could not start a new chat: {err}");
        app.ui.set_status(format!("New chat failed: {err}"));
        return;
    }

    info!("started a new chat");
    app.ui.clear_input();
    app.ui.clear_status();
    app.ui.welcome_selection = None;
    app.ui.selected_block = None;
    app.ui.auto_scroll = true;
    app.ui.scroll_offset = 0;
    update_scroll(app, ctx);
}

fn update_scroll(app: &mut App, ctx: AppActionContext) {
    if ctx.term_width == 0 || ctx.term_height == 0 {
        return;
    }
    let available_height = app.calculate_available_height(ctx.term_height);
    app.update_scroll_position(available_height, ctx.term_width);
}
