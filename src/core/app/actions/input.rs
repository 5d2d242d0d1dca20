use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::suggestions::WELCOME_SUGGESTIONS;

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::ClearStatus => {
            app.ui.clear_status();
            None
        }
        AppAction::SetStatus { message } => {
            app.ui.set_status(message);
            None
        }
        AppAction::ClearInput => {
            app.ui.clear_input();
            None
        }
        AppAction::InsertIntoInput { text } => {
            if !text.is_empty() {
                app.ui.apply_textarea_edit(|ta| {
                    ta.insert_str(&text);
                });
            }
            None
        }
        AppAction::ScrollBy { lines } => {
            if let Some(available_height) = available_height(app, ctx) {
                app.scroll_by(lines, available_height, ctx.term_width);
            }
            None
        }
        AppAction::ScrollToBottom => {
            if let Some(available_height) = available_height(app, ctx) {
                app.scroll_to_bottom(available_height, ctx.term_width);
            }
            None
        }
        AppAction::SelectNextSuggestion => {
            if app.show_welcome() {
                app.ui.select_next_suggestion(WELCOME_SUGGESTIONS.len());
            }
            None
        }
        AppAction::SelectPreviousSuggestion => {
            if app.show_welcome() {
                app.ui
                    .select_previous_suggestion(WELCOME_SUGGESTIONS.len());
            }
            None
        }
        AppAction::ToggleMarkdown => {
            app.ui.markdown_enabled = !app.ui.markdown_enabled;
            app.ui.exit_block_select_mode();
            let state = if app.ui.markdown_enabled { "on" } else { "off" };
            app.ui.set_status(format!("Markdown {state}"));
            if let Some(available_height) = available_height(app, ctx) {
                app.update_scroll_position(available_height, ctx.term_width);
            }
            None
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

pub(super) fn available_height(app: &App, ctx: AppActionContext) -> Option<u16> {
    if ctx.term_width == 0 || ctx.term_height == 0 {
        return None;
    }
    Some(app.calculate_available_height(ctx.term_height))
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

    #[test]
    fn suggestions_only_move_on_the_welcome_screen() {
        let mut app = create_test_app();
        apply_action(&mut app, AppAction::SelectNextSuggestion, ctx());
        assert_eq!(app.ui.welcome_selection, Some(0));

        app.transcript.append_user_turn("Hi");
        apply_action(&mut app, AppAction::SelectNextSuggestion, ctx());
        assert_eq!(app.ui.welcome_selection, Some(0));
    }

    #[test]
    fn status_can_be_set_and_cleared() {
        let mut app = create_test_app();
        apply_action(
            &mut app,
            AppAction::SetStatus {
                message: "hello".into(),
            },
            ctx(),
        );
        assert_eq!(app.ui.status.as_deref(), Some("hello"));
        apply_action(&mut app, AppAction::ClearStatus, ctx());
        assert!(app.ui.status.is_none());
    }

    #[test]
    fn insert_into_input_keeps_newlines() {
        let mut app = create_test_app();
        app.ui.set_input_text("say: ");
        apply_action(
            &mut app,
            AppAction::InsertIntoInput {
                text: "one\ntwo".into(),
            },
            ctx(),
        );
        assert_eq!(app.ui.get_input_text(), "say: one\ntwo");
    }

    #[test]
    fn toggle_markdown_flips_flag() {
        let mut app = create_test_app();
        assert!(app.ui.markdown_enabled);
        apply_action(&mut app, AppAction::ToggleMarkdown, ctx());
        assert!(!app.ui.markdown_enabled);
        assert_eq!(app.ui.status.as_deref(), Some("Markdown off"));
    }

    #[test]
    fn scroll_without_terminal_size_is_ignored() {
        let mut app = create_test_app();
        for i in 0..20 {
            app.transcript.append_user_turn(&format!("line {i}"));
        }
        apply_action(
            &mut app,
            AppAction::ScrollBy { lines: -3 },
            AppActionContext::default(),
        );
        assert!(app.ui.auto_scroll);

        apply_action(&mut app, AppAction::ScrollToBottom, ctx());
        apply_action(&mut app, AppAction::ScrollBy { lines: -3 }, ctx());
        assert!(!app.ui.auto_scroll);
    }
}
