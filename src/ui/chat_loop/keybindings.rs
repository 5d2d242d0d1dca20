//! Maps key presses to input edits and app actions.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::{CursorMove, Input as TAInput};

use crate::core::app::{App, AppAction};

/// Rows kept from the previous page when paging.
const PAGE_OVERLAP: u16 = 2;

#[derive(Debug)]
pub enum KeyResult {
    /// The input box was edited in place.
    Edited,
    Dispatch(Vec<AppAction>),
    Exit,
    Ignored,
}

pub fn handle_key_event(app: &mut App, key: &KeyEvent, term_height: u16) -> KeyResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    if ctrl && key.code == KeyCode::Char('c') {
        return KeyResult::Exit;
    }
    if app.ui.in_block_select_mode() {
        return handle_block_select_key(key);
    }

    match key.code {
        KeyCode::Char('d') if ctrl && app.ui.input_is_blank() => KeyResult::Exit,
        KeyCode::Char('n') if ctrl => KeyResult::Dispatch(vec![AppAction::NewChat]),
        KeyCode::Char('t') if ctrl => KeyResult::Dispatch(vec![AppAction::ToggleMarkdown]),
        KeyCode::Char('b') if ctrl => KeyResult::Dispatch(vec![AppAction::EnterBlockSelect]),

        KeyCode::Enter if alt || shift => {
            app.ui.apply_textarea_edit(|ta| ta.insert_newline());
            KeyResult::Edited
        }
        KeyCode::Enter => submit(app),

        KeyCode::Up if app.show_welcome() && app.ui.input_is_blank() => {
            KeyResult::Dispatch(vec![AppAction::SelectPreviousSuggestion])
        }
        KeyCode::Down if app.show_welcome() && app.ui.input_is_blank() => {
            KeyResult::Dispatch(vec![AppAction::SelectNextSuggestion])
        }
        KeyCode::Up => {
            app.ui.apply_textarea_edit(|ta| ta.move_cursor(CursorMove::Up));
            KeyResult::Edited
        }
        KeyCode::Down => {
            app.ui.apply_textarea_edit(|ta| ta.move_cursor(CursorMove::Down));
            KeyResult::Edited
        }

        KeyCode::PageUp => KeyResult::Dispatch(vec![AppAction::ScrollBy {
            lines: -i32::from(page_size(app, term_height)),
        }]),
        KeyCode::PageDown => KeyResult::Dispatch(vec![AppAction::ScrollBy {
            lines: i32::from(page_size(app, term_height)),
        }]),
        KeyCode::End if ctrl => KeyResult::Dispatch(vec![AppAction::ScrollToBottom]),
        KeyCode::Esc => {
            if app.ui.status.is_some() {
                KeyResult::Dispatch(vec![AppAction::ClearStatus])
            } else {
                KeyResult::Ignored
            }
        }

        KeyCode::Char(_)
        | KeyCode::Backspace
        | KeyCode::Delete
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End
        | KeyCode::Tab => {
            let input = TAInput::from(*key);
            app.ui.apply_textarea_edit(|ta| {
                ta.input(input);
            });
            KeyResult::Edited
        }
        _ => KeyResult::Ignored,
    }
}

/// While a code block is selected the input box is inactive.
fn handle_block_select_key(key: &KeyEvent) -> KeyResult {
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => AppAction::SelectPreviousBlock,
        KeyCode::Down | KeyCode::Char('j') => AppAction::SelectNextBlock,
        KeyCode::Enter | KeyCode::Char('c') | KeyCode::Char('C') => AppAction::CopySelectedBlock,
        KeyCode::Esc => AppAction::ExitBlockSelect,
        _ => return KeyResult::Ignored,
    };
    KeyResult::Dispatch(vec![action])
}

/// Enter sends the typed text; on an empty welcome screen it sends the
/// highlighted suggestion instead.
fn submit(app: &App) -> KeyResult {
    if app.ui.input_is_blank() {
        return match app.ui.welcome_selection {
            Some(index) if app.show_welcome() => {
                KeyResult::Dispatch(vec![AppAction::SubmitSuggestion { index }])
            }
            _ => KeyResult::Ignored,
        };
    }
    KeyResult::Dispatch(vec![AppAction::SubmitMessage {
        message: app.ui.get_input_text(),
    }])
}

fn page_size(app: &App, term_height: u16) -> u16 {
    app.calculate_available_height(term_height)
        .saturating_sub(PAGE_OVERLAP)
        .max(1)
}
