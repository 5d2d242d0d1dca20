use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::app::App;
use crate::ui::markdown::code_block_contents;
use crate::ui::welcome::render_welcome;
use crate::utils::scroll::ScrollCalculator;

pub const FOOTER_TEXT: &str = "Powered by Google Gemini.";
pub const LOADING_TEXT: &str = "Waiting for Gemini...";
const INPUT_HINT: &str = "Enter to send • Alt+Enter for newline • Ctrl+N new chat • Ctrl+C to quit";

pub fn ui(f: &mut Frame, app: &mut App) {
    let input_area_height = app.ui.calculate_input_area_height();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(input_area_height + 2), // +2 for borders
            Constraint::Length(1),
        ])
        .split(f.area());

    render_title(f, chunks[0], app);

    if app.show_welcome() {
        render_welcome(f, chunks[1], &app.ui.theme, app.ui.welcome_selection);
    } else {
        render_transcript(f, chunks[1], app);
    }

    render_status(f, chunks[2], app);
    render_input(f, chunks[3], app);

    let footer = Paragraph::new(Line::from(Span::styled(
        FOOTER_TEXT,
        app.ui.theme.status_style,
    )))
    .alignment(Alignment::Center);
    f.render_widget(footer, chunks[4]);
}

fn render_title(f: &mut Frame, area: Rect, app: &App) {
    let mut title = format!(
        "Gemini Chat v{} • {}",
        env!("CARGO_PKG_VERSION"),
        app.model
    );
    if !app.ui.markdown_enabled {
        title.push_str(" • plain text");
    }
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(title, app.ui.theme.title_style))),
        area,
    );
}

fn render_transcript(f: &mut Frame, area: Rect, app: &mut App) {
    // Lines are prewrapped so the scroll offset counts screen rows.
    let lines = app.get_prewrapped_lines(area.width);
    let scroll_offset = visible_scroll_offset(app, lines.len(), area.height);
    let paragraph = Paragraph::new(lines).scroll((scroll_offset, 0));
    f.render_widget(paragraph, area);
}

/// Follows the newest line while auto-scroll is on, otherwise keeps the
/// stored offset within bounds.
fn visible_scroll_offset(app: &App, total_lines: usize, available_height: u16) -> u16 {
    if app.ui.auto_scroll {
        ScrollCalculator::calculate_scroll_to_bottom(total_lines, available_height)
    } else {
        let max_offset = ScrollCalculator::calculate_max_scroll_offset(total_lines, available_height);
        app.ui.scroll_offset.min(max_offset)
    }
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.ui.theme;
    let line = if let Some(selected) = app.ui.selected_block {
        let total = code_block_contents(app.transcript.turns()).len();
        Line::from(Span::styled(
            block_select_hint(selected, total),
            theme.status_style,
        ))
    } else if app.is_loading() {
        Line::from(vec![
            Span::styled(
                pulse_symbol(app.ui.pulse_start.elapsed().as_millis()),
                theme.streaming_indicator_style,
            ),
            Span::raw(" "),
            Span::styled(LOADING_TEXT, theme.streaming_indicator_style),
        ])
    } else if let Some(status) = &app.ui.status {
        Line::from(Span::styled(status.clone(), theme.status_style))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(line), area);
}

fn block_select_hint(selected: usize, total: usize) -> String {
    format!(
        "Code block {} of {total} • ↑/↓ choose • Enter copy • Esc cancel",
        selected + 1
    )
}

/// Pulse animation: two cycles per second through three fill levels.
fn pulse_symbol(elapsed_ms: u128) -> &'static str {
    let elapsed = elapsed_ms as f32 / 1000.0;
    let pulse_phase = (elapsed * 2.0) % 2.0;
    let pulse_intensity = if pulse_phase < 1.0 {
        pulse_phase
    } else {
        2.0 - pulse_phase
    };

    if pulse_intensity < 0.33 {
        "○"
    } else if pulse_intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.ui.theme;
    let title = if app.is_loading() {
        LOADING_TEXT
    } else {
        INPUT_HINT
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(title, theme.input_title_style));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.ui.textarea(), inner);
}
