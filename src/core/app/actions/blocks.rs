use tracing::debug;

use super::input::available_height;
use super::{App, AppAction, AppActionContext, AppCommand};
use crate::ui::markdown::code_block_contents;

pub const NO_CODE_BLOCKS_STATUS: &str = "No code blocks";
pub const MARKDOWN_OFF_STATUS: &str = "Turn on markdown (Ctrl+T) to select code blocks";

pub(super) fn handle_block_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::EnterBlockSelect => {
            enter_block_select(app, ctx);
            None
        }
        AppAction::SelectNextBlock => {
            let total = block_count(app);
            app.ui.select_next_block(total);
            scroll_selection_into_view(app, ctx);
            None
        }
        AppAction::SelectPreviousBlock => {
            let total = block_count(app);
            app.ui.select_previous_block(total);
            scroll_selection_into_view(app, ctx);
            None
        }
        AppAction::CopySelectedBlock => {
            let content = app
                .ui
                .selected_block
                .and_then(|index| code_block_contents(app.transcript.turns()).into_iter().nth(index));
            leave_block_select(app, ctx);
            content.map(AppCommand::CopyToClipboard)
        }
        AppAction::ExitBlockSelect => {
            leave_block_select(app, ctx);
            None
        }
        _ => unreachable!("non-block action routed to block handler"),
    }
}

fn block_count(app: &App) -> usize {
    code_block_contents(app.transcript.turns()).len()
}

/// Selects the newest code block.
fn enter_block_select(app: &mut App, ctx: AppActionContext) {
    if !app.ui.markdown_enabled {
        app.ui.set_status(MARKDOWN_OFF_STATUS);
        return;
    }
    let total = block_count(app);
    if total == 0 {
        app.ui.set_status(NO_CODE_BLOCKS_STATUS);
        return;
    }
    debug!(blocks = total, "entering block select mode");
    app.ui.clear_status();
    app.ui.selected_block = Some(total - 1);
    scroll_selection_into_view(app, ctx);
}

fn leave_block_select(app: &mut App, ctx: AppActionContext) {
    app.ui.exit_block_select_mode();
    app.ui.auto_scroll = true;
    if let Some(available_height) = available_height(app, ctx) {
        app.update_scroll_position(available_height, ctx.term_width);
    }
}

fn scroll_selection_into_view(app: &mut App, ctx: AppActionContext) {
    let Some(index) = app.ui.selected_block else {
        return;
    };
    if let Some(available_height) = available_height(app, ctx) {
        app.scroll_block_into_view(index, available_height, ctx.term_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::apply_action;
    use crate::utils::test_utils::create_test_app;

    fn ctx() -> AppActionContext {
        AppActionContext {
            term_width: 80,
            term_height: 24,
        }
    }

    fn app_with_blocks() -> App {
        let mut app = create_test_app();
        app.transcript.append_user_turn("Two snippets please");
        app.transcript.begin_streaming();
        app.transcript
            .consume_fragment("First:\n\n```sh\necho one\n```\n\nSecond:\n\n```python\nprint(2)\n```");
        app.transcript.end_streaming(None);
        app
    }

    #[test]
    fn entering_selects_the_newest_block() {
        let mut app = app_with_blocks();
        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        assert_eq!(app.ui.selected_block, Some(1));
        assert!(app.ui.status.is_none());
    }

    #[test]
    fn entering_without_blocks_reports_status() {
        let mut app = create_test_app();
        app.transcript.append_user_turn("no code here");
        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        assert!(!app.ui.in_block_select_mode());
        assert_eq!(app.ui.status.as_deref(), Some(NO_CODE_BLOCKS_STATUS));

        let mut app = app_with_blocks();
        app.ui.markdown_enabled = false;
        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        assert!(!app.ui.in_block_select_mode());
        assert_eq!(app.ui.status.as_deref(), Some(MARKDOWN_OFF_STATUS));
    }

    #[test]
    fn selection_wraps_through_blocks() {
        let mut app = app_with_blocks();
        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        apply_action(&mut app, AppAction::SelectNextBlock, ctx());
        assert_eq!(app.ui.selected_block, Some(0));
        apply_action(&mut app, AppAction::SelectPreviousBlock, ctx());
        assert_eq!(app.ui.selected_block, Some(1));
    }

    #[test]
    fn copy_returns_block_text_and_leaves_select_mode() {
        let mut app = app_with_blocks();
        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        apply_action(&mut app, AppAction::SelectPreviousBlock, ctx());
        app.ui.auto_scroll = false;

        match apply_action(&mut app, AppAction::CopySelectedBlock, ctx()) {
            Some(AppCommand::CopyToClipboard(text)) => assert_eq!(text, "echo one"),
            _ => panic!("expected a clipboard copy"),
        }
        assert!(!app.ui.in_block_select_mode());
        assert!(app.ui.auto_scroll);

        assert!(apply_action(&mut app, AppAction::CopySelectedBlock, ctx()).is_none());
    }

    #[test]
    fn selecting_scrolls_the_block_into_view() {
        let mut app = create_test_app();
        app.transcript.append_user_turn("code first");
        app.transcript.begin_streaming();
        app.transcript.consume_fragment("```\nlet x = 1;\n```");
        app.transcript.end_streaming(None);
        for i in 0..20 {
            app.transcript.append_user_turn(&format!("filler {i}"));
        }

        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        assert!(!app.ui.auto_scroll);
        // Label, text and blank for the user turn, then the model label.
        assert_eq!(app.ui.scroll_offset, 4);

        apply_action(&mut app, AppAction::ExitBlockSelect, ctx());
        assert!(app.ui.auto_scroll);
        assert!(!app.ui.in_block_select_mode());
    }

    #[test]
    fn toggling_markdown_leaves_select_mode() {
        let mut app = app_with_blocks();
        apply_action(&mut app, AppAction::EnterBlockSelect, ctx());
        apply_action(&mut app, AppAction::ToggleMarkdown, ctx());
        assert!(!app.ui.in_block_select_mode());
    }
}
