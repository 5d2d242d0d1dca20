use std::time::Instant;

use ratatui::style::Style;
use tui_textarea::{CursorMove, TextArea};

use crate::ui::theme::Theme;

pub const INPUT_PLACEHOLDER: &str = "Message Gemini...";
const MAX_INPUT_ROWS: u16 = 6;

pub struct UiState {
    pub theme: Theme,
    pub markdown_enabled: bool,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub status: Option<String>,
    pub status_set_at: Option<Instant>,
    /// Highlighted welcome suggestion, if any.
    pub welcome_selection: Option<usize>,
    /// Highlighted code block while block select mode is active.
    pub selected_block: Option<usize>,
    pub pulse_start: Instant,
    pub exit_requested: bool,
    textarea: TextArea<'static>,
}

impl UiState {
    pub fn new(theme: Theme, markdown_enabled: bool) -> Self {
        let mut ui = Self {
            theme,
            markdown_enabled,
            scroll_offset: 0,
            auto_scroll: true,
            status: None,
            status_set_at: None,
            welcome_selection: None,
            selected_block: None,
            pulse_start: Instant::now(),
            exit_requested: false,
            textarea: TextArea::default(),
        };
        ui.configure_textarea();
        ui
    }

    pub(crate) fn configure_textarea(&mut self) {
        self.textarea.set_style(self.theme.input_text_style);
        self.textarea
            .set_cursor_style(self.theme.input_cursor_style);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.set_placeholder_text(INPUT_PLACEHOLDER);
        self.textarea
            .set_placeholder_style(self.theme.input_title_style);
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn get_input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn input_is_blank(&self) -> bool {
        self.textarea.lines().iter().all(|line| line.trim().is_empty())
    }

    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::from(lines);
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
        self.configure_textarea();
    }

    pub fn clear_input(&mut self) {
        self.set_input_text("");
    }

    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
    }

    /// Rows the input box needs for its text, excluding borders.
    pub fn calculate_input_area_height(&self) -> u16 {
        let rows = u16::try_from(self.textarea.lines().len()).unwrap_or(MAX_INPUT_ROWS);
        rows.clamp(1, MAX_INPUT_ROWS)
    }

    pub fn set_status<S: Into<String>>(&mut self, s: S) {
        self.status = Some(s.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_set_at = None;
    }

    pub fn begin_activity(&mut self) {
        self.pulse_start = Instant::now();
    }

    pub fn select_next_suggestion(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.welcome_selection = Some(match self.welcome_selection {
            Some(index) => (index + 1) % count,
            None => 0,
        });
    }

    pub fn select_previous_suggestion(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.welcome_selection = Some(match self.welcome_selection {
            Some(0) | None => count - 1,
            Some(index) => index - 1,
        });
    }

    pub fn in_block_select_mode(&self) -> bool {
        self.selected_block.is_some()
    }

    pub fn exit_block_select_mode(&mut self) {
        self.selected_block = None;
    }

    pub fn select_next_block(&mut self, total: usize) {
        if let Some(current) = self.selected_block {
            self.selected_block = wrap_next_index(current, total);
        }
    }

    pub fn select_previous_block(&mut self, total: usize) {
        if let Some(current) = self.selected_block {
            self.selected_block = wrap_previous_index(current, total);
        }
    }
}

fn wrap_next_index(current: usize, total: usize) -> Option<usize> {
    if total == 0 {
        None
    } else {
        Some((current + 1) % total)
    }
}

fn wrap_previous_index(current: usize, total: usize) -> Option<usize> {
    if total == 0 {
        None
    } else if current == 0 || current >= total {
        Some(total - 1)
    } else {
        Some(current - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_round_trips_multiline_text() {
        let mut ui = UiState::new(Theme::dark_default(), true);
        assert!(ui.input_is_blank());
        ui.set_input_text("first\nsecond");
        assert_eq!(ui.get_input_text(), "first\nsecond");
        assert_eq!(ui.textarea().cursor(), (1, 6));
        assert_eq!(ui.calculate_input_area_height(), 2);
        ui.clear_input();
        assert_eq!(ui.get_input_text(), "");
        assert_eq!(ui.calculate_input_area_height(), 1);
    }

    #[test]
    fn input_height_is_capped() {
        let mut ui = UiState::new(Theme::dark_default(), true);
        ui.set_input_text(&"x\n".repeat(20));
        assert_eq!(ui.calculate_input_area_height(), MAX_INPUT_ROWS);
    }

    #[test]
    fn suggestion_selection_wraps_both_ways() {
        let mut ui = UiState::new(Theme::dark_default(), true);
        ui.select_previous_suggestion(4);
        assert_eq!(ui.welcome_selection, Some(3));
        ui.select_next_suggestion(4);
        assert_eq!(ui.welcome_selection, Some(0));
        ui.select_next_suggestion(4);
        assert_eq!(ui.welcome_selection, Some(1));
    }

    #[test]
    fn block_selection_wraps_and_exits_when_blocks_vanish() {
        let mut ui = UiState::new(Theme::dark_default(), true);
        ui.select_next_block(3);
        assert!(!ui.in_block_select_mode());

        ui.selected_block = Some(2);
        ui.select_next_block(3);
        assert_eq!(ui.selected_block, Some(0));
        ui.select_previous_block(3);
        assert_eq!(ui.selected_block, Some(2));

        ui.select_next_block(0);
        assert!(!ui.in_block_select_mode());
    }

    #[test]
    fn status_records_when_it_was_set() {
        let mut ui = UiState::new(Theme::dark_default(), true);
        ui.set_status("Saved");
        assert_eq!(ui.status.as_deref(), Some("Saved"));
        assert!(ui.status_set_at.is_some());
        ui.clear_status();
        assert!(ui.status.is_none() && ui.status_set_at.is_none());
    }
}
