use ratatui::text::Line;

use crate::core::message::Turn;
use crate::core::transcript::TranscriptController;
use crate::ui::markdown::{build_transcript_lines, render_labelled_turn, MessageRenderConfig};
use crate::ui::theme::Theme;
use crate::utils::scroll::ScrollCalculator;

pub mod actions;
pub mod ui_state;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use ui_state::UiState;

/// Rows taken by everything other than the transcript and the input text:
/// title, status line and footer.
const CHROME_ROWS: u16 = 3;
const INPUT_BORDER_ROWS: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RenderKey {
    generation: u64,
    width: u16,
    config: MessageRenderConfig,
}

/// Prewrapped rows of the turns that can no longer change.
///
/// Streaming only ever rewrites the last turn, so each frame re-renders that
/// turn alone and reuses the rows before it.
#[derive(Default)]
struct TranscriptRenderCache {
    key: Option<RenderKey>,
    turns: usize,
    blocks: usize,
    rows: Vec<Line<'static>>,
    block_rows: Vec<usize>,
}

/// Rows for the turns after the cached ones.
struct TailRows {
    rows: Vec<Line<'static>>,
    block_rows: Vec<usize>,
}

/// Renders `turn`, appends its prewrapped rows and the row of each code block
/// header. Returns the number of code blocks appended.
fn append_turn_rows(
    rows: &mut Vec<Line<'static>>,
    block_rows: &mut Vec<usize>,
    turn: &Turn,
    theme: &Theme,
    config: MessageRenderConfig,
    first_block: usize,
    width: u16,
) -> usize {
    let rendered = render_labelled_turn(turn, theme, config, first_block);
    let mut starts = rendered.codeblock_starts.iter().peekable();
    for (index, line) in rendered.lines.iter().enumerate() {
        if starts.next_if_eq(&&index).is_some() {
            block_rows.push(rows.len());
        }
        rows.extend(ScrollCalculator::prewrap_lines(std::slice::from_ref(line), width));
    }
    rendered.codeblock_starts.len()
}

pub struct App {
    pub transcript: TranscriptController,
    pub ui: UiState,
    pub model: String,
    render_cache: TranscriptRenderCache,
}

impl App {
    pub fn new(
        transcript: TranscriptController,
        model: String,
        theme: Theme,
        markdown_enabled: bool,
    ) -> Self {
        Self {
            transcript,
            ui: UiState::new(theme, markdown_enabled),
            model,
            render_cache: TranscriptRenderCache::default(),
        }
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.transcript.is_current_response(stream_id)
    }

    pub fn is_loading(&self) -> bool {
        self.transcript.is_in_flight()
    }

    /// The welcome screen replaces the transcript until the first turn exists.
    pub fn show_welcome(&self) -> bool {
        self.transcript.is_empty() && !self.transcript.is_in_flight()
    }

    pub fn render_config(&self) -> MessageRenderConfig {
        MessageRenderConfig::markdown(self.ui.markdown_enabled)
            .with_selected_block(self.ui.selected_block)
    }

    /// Unwrapped transcript lines, rendered from scratch.
    pub fn build_display_lines(&self) -> Vec<Line<'static>> {
        build_transcript_lines(self.transcript.turns(), &self.ui.theme, self.render_config())
    }

    fn refresh_render_cache(&mut self, terminal_width: u16) {
        let key = RenderKey {
            generation: self.transcript.generation(),
            width: terminal_width,
            config: self.render_config(),
        };
        let settled = self.transcript.settled_len();
        if self.render_cache.key != Some(key) || self.render_cache.turns > settled {
            self.render_cache = TranscriptRenderCache {
                key: Some(key),
                ..TranscriptRenderCache::default()
            };
        }

        let cache = &mut self.render_cache;
        for turn in &self.transcript.turns()[cache.turns..settled] {
            let added = append_turn_rows(
                &mut cache.rows,
                &mut cache.block_rows,
                turn,
                &self.ui.theme,
                key.config,
                cache.blocks,
                terminal_width,
            );
            cache.blocks += added;
        }
        cache.turns = settled;
    }

    fn render_tail(&mut self, terminal_width: u16) -> TailRows {
        self.refresh_render_cache(terminal_width);
        let config = self.render_config();
        let cache = &self.render_cache;
        let mut tail = TailRows {
            rows: Vec::new(),
            block_rows: Vec::new(),
        };
        let mut blocks = cache.blocks;
        for turn in &self.transcript.turns()[cache.turns..] {
            blocks += append_turn_rows(
                &mut tail.rows,
                &mut tail.block_rows,
                turn,
                &self.ui.theme,
                config,
                blocks,
                terminal_width,
            );
        }
        tail
    }

    /// Transcript lines wrapped to `terminal_width`, one entry per screen row.
    pub fn get_prewrapped_lines(&mut self, terminal_width: u16) -> Vec<Line<'static>> {
        let tail = self.render_tail(terminal_width);
        let mut lines = Vec::with_capacity(self.render_cache.rows.len() + tail.rows.len());
        lines.extend_from_slice(&self.render_cache.rows);
        lines.extend(tail.rows);
        lines
    }

    pub fn transcript_row_count(&mut self, terminal_width: u16) -> usize {
        let tail = self.render_tail(terminal_width);
        self.render_cache.rows.len() + tail.rows.len()
    }

    /// Screen row of the header of code block `index`.
    pub fn code_block_row(&mut self, index: usize, terminal_width: u16) -> Option<usize> {
        let tail = self.render_tail(terminal_width);
        let cache = &self.render_cache;
        match index.checked_sub(cache.block_rows.len()) {
            None => cache.block_rows.get(index).copied(),
            Some(tail_index) => tail
                .block_rows
                .get(tail_index)
                .map(|row| cache.rows.len() + row),
        }
    }

    pub fn calculate_available_height(&self, term_height: u16) -> u16 {
        let input_area_height = self.ui.calculate_input_area_height();
        term_height
            .saturating_sub(input_area_height + INPUT_BORDER_ROWS)
            .saturating_sub(CHROME_ROWS)
    }

    pub fn max_scroll_offset(&mut self, available_height: u16, terminal_width: u16) -> u16 {
        let total = self.transcript_row_count(terminal_width);
        ScrollCalculator::calculate_max_scroll_offset(total, available_height)
    }

    /// Pins the view to the newest line while auto-scroll is on.
    pub fn update_scroll_position(&mut self, available_height: u16, terminal_width: u16) {
        if self.ui.auto_scroll {
            let total = self.transcript_row_count(terminal_width);
            self.ui.scroll_offset =
                ScrollCalculator::calculate_scroll_to_bottom(total, available_height);
        }
    }

    /// Scrolls by `delta` rows. Scrolling up detaches from the bottom;
    /// reaching the bottom again re-attaches.
    pub fn scroll_by(&mut self, delta: i32, available_height: u16, terminal_width: u16) {
        let max_offset = self.max_scroll_offset(available_height, terminal_width);
        let current = i32::from(self.ui.scroll_offset.min(max_offset));
        let target = (current + delta).clamp(0, i32::from(max_offset));
        self.ui.scroll_offset = u16::try_from(target).unwrap_or(max_offset);
        self.ui.auto_scroll = self.ui.scroll_offset >= max_offset;
    }

    pub fn scroll_to_bottom(&mut self, available_height: u16, terminal_width: u16) {
        self.ui.auto_scroll = true;
        self.update_scroll_position(available_height, terminal_width);
    }

    /// Moves the view so the header of code block `index` is on screen.
    pub fn scroll_block_into_view(
        &mut self,
        index: usize,
        available_height: u16,
        terminal_width: u16,
    ) {
        let Some(row) = self.code_block_row(index, terminal_width) else {
            return;
        };
        let max_offset = self.max_scroll_offset(available_height, terminal_width);
        let current = if self.ui.auto_scroll {
            max_offset
        } else {
            self.ui.scroll_offset.min(max_offset)
        };
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        let visible = row >= current && row < current.saturating_add(available_height);
        if !visible {
            self.ui.scroll_offset = row.min(max_offset);
        } else {
            self.ui.scroll_offset = current;
        }
        self.ui.auto_scroll = self.ui.scroll_offset >= max_offset;
    }
}
