use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Transcript
    pub user_label_style: Style,
    pub user_text_style: Style,
    pub model_label_style: Style,
    pub model_text_style: Style,
    pub inline_code_style: Style,
    pub code_block_style: Style,
    pub code_header_style: Style,
    pub code_block_selected_style: Style,

    // Chrome
    pub title_style: Style,
    pub status_style: Style,
    pub streaming_indicator_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,
    pub input_cursor_style: Style,

    // Welcome screen
    pub welcome_heading_style: Style,
    pub welcome_text_style: Style,
    pub suggestion_title_style: Style,
    pub suggestion_text_style: Style,
    pub suggestion_selected_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            user_label_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::LightBlue),
            model_label_style: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
            model_text_style: Style::default().fg(Color::Gray),
            inline_code_style: Style::default().fg(Color::LightRed),
            code_block_style: Style::default().fg(Color::White).bg(Color::Black),
            code_header_style: Style::default().fg(Color::DarkGray),
            code_block_selected_style: Style::default().fg(Color::Black).bg(Color::LightBlue),

            title_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(Color::Yellow),
            streaming_indicator_style: Style::default().fg(Color::LightBlue),
            input_border_style: Style::default().fg(Color::DarkGray),
            input_title_style: Style::default().fg(Color::Gray),
            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            welcome_heading_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            welcome_text_style: Style::default().fg(Color::Gray),
            suggestion_title_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            suggestion_text_style: Style::default().fg(Color::DarkGray),
            suggestion_selected_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        Theme {
            user_label_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            model_label_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            model_text_style: Style::default().fg(Color::Black),
            inline_code_style: Style::default().fg(Color::Red),
            code_block_style: Style::default().fg(Color::Black).bg(Color::Gray),
            code_header_style: Style::default().fg(Color::DarkGray),
            code_block_selected_style: Style::default().fg(Color::White).bg(Color::Blue),

            title_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(Color::Red),
            streaming_indicator_style: Style::default().fg(Color::Blue),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),
            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            welcome_heading_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            welcome_text_style: Style::default().fg(Color::DarkGray),
            suggestion_title_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            suggestion_text_style: Style::default().fg(Color::DarkGray),
            suggestion_selected_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        }
    }

    /// Unknown names fall back to the dark theme.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark_default(),
        }
    }

    /// Collapses every style to the terminal default, for piped output.
    pub fn monochrome() -> Self {
        let plain = Style::default();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        Theme {
            user_label_style: bold,
            user_text_style: plain,
            model_label_style: bold,
            model_text_style: plain,
            inline_code_style: plain,
            code_block_style: plain,
            code_header_style: plain,
            code_block_selected_style: Style::default().add_modifier(Modifier::REVERSED),
            title_style: bold,
            status_style: plain,
            streaming_indicator_style: plain,
            input_border_style: plain,
            input_title_style: plain,
            input_text_style: plain,
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            welcome_heading_style: bold,
            welcome_text_style: plain,
            suggestion_title_style: bold,
            suggestion_text_style: plain,
            suggestion_selected_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }
}
