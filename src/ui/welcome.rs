//! Greeting and suggested prompts shown before the first turn.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::core::suggestions::{WELCOME_BLURB, WELCOME_HEADING, WELCOME_SUGGESTIONS};
use crate::ui::theme::Theme;

pub fn build_welcome_lines(theme: &Theme, selected: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(WELCOME_HEADING, theme.welcome_heading_style))
            .alignment(Alignment::Center),
        Line::from(Span::styled(WELCOME_BLURB, theme.welcome_text_style))
            .alignment(Alignment::Center),
        Line::from(""),
    ];

    for (index, suggestion) in WELCOME_SUGGESTIONS.iter().enumerate() {
        let is_selected = selected == Some(index);
        let (marker, title_style, text_style) = if is_selected {
            (
                "› ",
                theme.suggestion_selected_style,
                theme.suggestion_selected_style,
            )
        } else {
            (
                "  ",
                theme.suggestion_title_style,
                theme.suggestion_text_style,
            )
        };
        lines.push(Line::from(vec![
            Span::styled(marker, title_style),
            Span::styled(suggestion.title, title_style),
        ]));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(suggestion.prompt, text_style),
        ]));
        lines.push(Line::from(""));
    }

    lines.push(
        Line::from(Span::styled(
            "↑/↓ to pick a prompt, Enter to send it",
            theme.welcome_text_style,
        ))
        .alignment(Alignment::Center),
    );
    lines
}

pub fn render_welcome(f: &mut Frame, area: Rect, theme: &Theme, selected: Option<usize>) {
    let paragraph =
        Paragraph::new(build_welcome_lines(theme, selected)).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
