//! Event polling, dispatching, and UI rendering loop.
//!
//! Terminal input is read on a background task and turned into actions.
//! Provider fragments arrive over the stream channel, are coalesced per
//! frame, and go through the same reducer. Commands the reducer returns
//! (spawning a response stream, copying a code block) are executed here.

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind, MouseEventKind};
use ratatui::prelude::Size;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::app::{
    apply_actions, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope, AppCommand,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::ui::renderer::ui;
use crate::utils::clipboard::copy_to_clipboard;

use super::keybindings::{handle_key_event, KeyResult};
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::setup::bootstrap_app;
use super::AppHandle;

const MAX_FPS: u64 = 60;
const MOUSE_SCROLL_LINES: i32 = 3;
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const COPIED_STATUS: &str = "Copied code block";
const CLIPBOARD_ERROR_STATUS: &str = "Clipboard error";

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

async fn current_terminal_size(terminal: &SharedTerminal) -> Size {
    let terminal_guard = terminal.lock().await;
    terminal_guard.size().unwrap_or_default()
}

async fn try_draw_frame(
    app: &AppHandle,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    app.update(|app| terminal_guard.draw(|f| ui(f, app)).map(|_| ()))
        .await?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    exit_requested: bool,
}

async fn process_ui_events(
    app: &AppHandle,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    term_size: Size,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        exit_requested: false,
    };
    let ctx = AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    };

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let result = app
                    .update(|app| handle_key_event(app, &key, term_size.height))
                    .await;
                match result {
                    KeyResult::Exit => {
                        outcome.exit_requested = true;
                        break;
                    }
                    KeyResult::Dispatch(actions) => dispatcher.dispatch_many(actions, ctx),
                    KeyResult::Edited | KeyResult::Ignored => {}
                }
            }
            UiEvent::Crossterm(Event::Mouse(mouse)) => {
                let lines = match mouse.kind {
                    MouseEventKind::ScrollUp => -MOUSE_SCROLL_LINES,
                    MouseEventKind::ScrollDown => MOUSE_SCROLL_LINES,
                    _ => continue,
                };
                dispatcher.dispatch_many([AppAction::ScrollBy { lines }], ctx);
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                let text = sanitize_pasted_text(&text);
                if !text.is_empty() {
                    dispatcher.dispatch_many([AppAction::InsertIntoInput { text }], ctx);
                }
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    outcome
}

/// Normalizes line endings and drops control characters other than newline.
pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// Drains the stream channel, merging consecutive chunks into a single
/// append so a burst of fragments costs one reducer pass.
///
/// Messages for other streams are dropped here; the reducer checks the id
/// again since a reset can land between this call and the dispatch.
fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    term_size: Size,
    current_stream_id: u64,
) -> bool {
    let mut received_any = false;
    let mut coalesced_chunks = String::new();
    let mut followup_actions = Vec::new();

    while let Ok((message, msg_stream_id)) = rx.try_recv() {
        if msg_stream_id != current_stream_id {
            debug!(stream_id = msg_stream_id, "dropping message from stale stream");
            continue;
        }

        match message {
            StreamMessage::Chunk(content) => coalesced_chunks.push_str(&content),
            StreamMessage::Error(error) => followup_actions.push(AppAction::StreamErrored {
                error,
                stream_id: msg_stream_id,
            }),
            StreamMessage::End => followup_actions.push(AppAction::StreamCompleted {
                stream_id: msg_stream_id,
            }),
        }
        received_any = true;
    }

    if !received_any {
        return false;
    }

    let mut actions = Vec::with_capacity(1 + followup_actions.len());
    if !coalesced_chunks.is_empty() {
        actions.push(AppAction::AppendResponseChunk {
            content: coalesced_chunks,
            stream_id: current_stream_id,
        });
    }
    actions.extend(followup_actions);

    dispatcher.dispatch_many(
        actions,
        AppActionContext {
            term_width: term_size.width,
            term_height: term_size.height,
        },
    );
    true
}

async fn drain_action_queue(
    app: &AppHandle,
    stream_service: &ChatStreamService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = app.update(|app| apply_actions(app, pending)).await;
    for cmd in commands {
        match cmd {
            AppCommand::SpawnStream(params) => stream_service.spawn_stream(params),
            AppCommand::CopyToClipboard(text) => {
                let result = copy_to_clipboard(&text);
                if let Err(err) = &result {
                    warn!("copy failed: {err}");
                }
                app.update(|app| app.ui.set_status(clipboard_status(&result)))
                    .await;
            }
        }
    }

    true
}

fn clipboard_status(result: &Result<(), String>) -> &'static str {
    match result {
        Ok(()) => COPIED_STATUS,
        Err(_) => CLIPBOARD_ERROR_STATUS,
    }
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(model: Option<String>, env_only: bool) -> Result<(), Box<dyn Error>> {
    let app = bootstrap_app(model, env_only).await?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let action_dispatcher = AppActionDispatcher::new(action_tx);

    let terminal = setup_terminal()?;
    let (stream_service, mut rx) = ChatStreamService::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut last_term_size = Size::default();
    let mut indicator_visible = false;

    let result: Result<(), Box<dyn Error>> = 'main_loop: loop {
        if app.read(|app| app.ui.exit_requested).await {
            break 'main_loop Ok(());
        }

        if let Err(err) = try_draw_frame(
            &app,
            &terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break 'main_loop Err(err.into());
        }

        let term_size = current_terminal_size(&terminal).await;
        if term_size != last_term_size {
            last_term_size = term_size;
            request_redraw = true;
        }

        let event_outcome =
            process_ui_events(&app, &mut event_rx, &action_dispatcher, term_size).await;
        if event_outcome.exit_requested {
            break 'main_loop Ok(());
        }
        if event_outcome.events_processed {
            request_redraw = true;
        }

        let current_stream_id = app.read(|app| app.transcript.current_response_id()).await;
        let received_any =
            process_stream_updates(&action_dispatcher, &mut rx, term_size, current_stream_id);
        if received_any {
            request_redraw = true;
        }

        let status_expired = app
            .read(|app| {
                app.ui
                    .status_set_at
                    .is_some_and(|set_at| set_at.elapsed() >= STATUS_TIMEOUT)
            })
            .await;
        if status_expired {
            action_dispatcher.dispatch_many([AppAction::ClearStatus], AppActionContext::default());
        }

        if drain_action_queue(&app, &stream_service, &mut action_rx).await {
            request_redraw = true;
        }

        // The pulsing indicator needs a redraw every frame while it is shown.
        let indicator_now = app.read(|app| app.is_loading()).await;
        if indicator_now || indicator_now != indicator_visible {
            indicator_visible = indicator_now;
            request_redraw = true;
        }

        let idle = !event_outcome.events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        } else if request_redraw {
            tokio::task::yield_now().await;
        }
    };

    event_reader_handle.abort();
    restore_terminal(&terminal).await?;
    info!("chat session closed");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::StreamError;

    const TERM: Size = Size {
        width: 80,
        height: 24,
    };

    fn dispatcher() -> (
        AppActionDispatcher,
        mpsc::UnboundedReceiver<AppActionEnvelope>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AppActionDispatcher::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>) -> Vec<AppAction> {
        let mut actions = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            actions.push(envelope.action);
        }
        actions
    }

    #[test]
    fn coalesces_chunks_into_one_append() {
        let (dispatcher, mut action_rx) = dispatcher();
        let (service, mut rx) = ChatStreamService::new();
        service.send_for_test(StreamMessage::Chunk("Hel".into()), 3);
        service.send_for_test(StreamMessage::Chunk("lo".into()), 3);
        service.send_for_test(StreamMessage::End, 3);

        assert!(process_stream_updates(&dispatcher, &mut rx, TERM, 3));

        let actions = drain(&mut action_rx);
        assert_eq!(actions.len(), 2);
        match &actions[0] {
            AppAction::AppendResponseChunk { content, stream_id } => {
                assert_eq!(content, "Hello");
                assert_eq!(*stream_id, 3);
            }
            _ => panic!("expected chunk"),
        }
        assert!(matches!(
            actions[1],
            AppAction::StreamCompleted { stream_id: 3 }
        ));
    }

    #[test]
    fn drops_messages_from_other_streams() {
        let (dispatcher, mut action_rx) = dispatcher();
        let (service, mut rx) = ChatStreamService::new();
        service.send_for_test(StreamMessage::Chunk("old".into()), 1);
        service.send_for_test(StreamMessage::End, 1);

        assert!(!process_stream_updates(&dispatcher, &mut rx, TERM, 2));
        assert!(drain(&mut action_rx).is_empty());
    }

    #[test]
    fn errors_follow_the_text_received_before_them() {
        let (dispatcher, mut action_rx) = dispatcher();
        let (service, mut rx) = ChatStreamService::new();
        service.send_for_test(StreamMessage::Chunk("partial".into()), 5);
        service.send_for_test(StreamMessage::Error(StreamError::new("boom")), 5);
        service.send_for_test(StreamMessage::End, 5);

        process_stream_updates(&dispatcher, &mut rx, TERM, 5);

        let actions = drain(&mut action_rx);
        assert!(matches!(actions[0], AppAction::AppendResponseChunk { .. }));
        match &actions[1] {
            AppAction::StreamErrored { error, .. } => assert_eq!(error.message(), "boom"),
            _ => panic!("expected error"),
        }
        assert!(matches!(actions[2], AppAction::StreamCompleted { .. }));
    }

    #[test]
    fn empty_channel_reports_nothing() {
        let (dispatcher, _action_rx) = dispatcher();
        let (_service, mut rx) = ChatStreamService::new();
        assert!(!process_stream_updates(&dispatcher, &mut rx, TERM, 0));
    }

    #[test]
    fn clipboard_outcome_becomes_status() {
        assert_eq!(clipboard_status(&Ok(())), "Copied code block");
        assert_eq!(
            clipboard_status(&Err("no xclip".to_string())),
            "Clipboard error"
        );
    }

    #[test]
    fn pasted_text_is_normalized() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(sanitize_pasted_text("x\ty"), "x    y");
        assert_eq!(sanitize_pasted_text("bell\u{7}"), "bell");
    }
}
