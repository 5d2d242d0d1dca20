//! Turn text into styled terminal lines.
//!
//! Supported formatting: fenced code blocks, bold, italic,
//! inline code, headings and list bullets. Everything else renders as plain
//! text, and any HTML in a reply is shown literally rather than interpreted.
//! Blank lines outside code blocks are dropped.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::message::{Role, Turn};
use crate::ui::theme::Theme;

pub const CODE_BLOCK_LABEL: &str = "Generated Code";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageRenderConfig {
    pub markdown: bool,
    /// Code block drawn with the selection style, counted across the
    /// rendered turns in order.
    pub selected_block: Option<usize>,
}

impl MessageRenderConfig {
    pub fn markdown(enabled: bool) -> Self {
        Self {
            markdown: enabled,
            selected_block: None,
        }
    }

    pub fn with_selected_block(mut self, selected_block: Option<usize>) -> Self {
        self.selected_block = selected_block;
        self
    }
}

pub struct RenderedMessage {
    pub lines: Vec<Line<'static>>,
    /// Index into `lines` of each code block header, in order.
    pub codeblock_starts: Vec<usize>,
}

/// Lines for a whole transcript, one labelled block per turn.
pub fn build_transcript_lines(
    turns: &[Turn],
    theme: &Theme,
    config: MessageRenderConfig,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut blocks = 0;
    for turn in turns {
        let rendered = render_labelled_turn(turn, theme, config, blocks);
        blocks += rendered.codeblock_starts.len();
        lines.extend(rendered.lines);
    }
    lines
}

/// One turn as it appears in the transcript: role label, body, blank line.
///
/// `first_block` is the number of code blocks in the turns before this one,
/// so `config.selected_block` keeps its transcript-wide meaning.
pub fn render_labelled_turn(
    turn: &Turn,
    theme: &Theme,
    config: MessageRenderConfig,
    first_block: usize,
) -> RenderedMessage {
    let local = config.with_selected_block(
        config
            .selected_block
            .and_then(|index| index.checked_sub(first_block)),
    );
    let body = render_turn(turn, theme, local);

    let mut lines = Vec::with_capacity(body.lines.len() + 2);
    lines.push(role_label(turn.role, theme));
    lines.extend(body.lines);
    lines.push(Line::from(""));
    RenderedMessage {
        lines,
        codeblock_starts: body.codeblock_starts.iter().map(|start| start + 1).collect(),
    }
}

/// Raw text of every code block in the transcript, in display order.
pub fn code_block_contents(turns: &[Turn]) -> Vec<String> {
    let mut blocks = Vec::new();
    for turn in turns {
        let mut current: Option<String> = None;
        for event in Parser::new(&turn.text) {
            match event {
                Event::Start(Tag::CodeBlock(_)) => current = Some(String::new()),
                Event::Text(content) => {
                    if let Some(buffer) = current.as_mut() {
                        buffer.push_str(&content);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(buffer) = current.take() {
                        blocks.push(buffer.trim_matches('\n').to_string());
                    }
                }
                _ => {}
            }
        }
        if let Some(buffer) = current {
            blocks.push(buffer.trim_matches('\n').to_string());
        }
    }
    blocks
}

pub fn role_label(role: Role, theme: &Theme) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled("You", theme.user_label_style)),
        Role::Model => Line::from(Span::styled("Gemini", theme.model_label_style)),
    }
}

pub fn render_turn(turn: &Turn, theme: &Theme, config: MessageRenderConfig) -> RenderedMessage {
    let base = match turn.role {
        Role::User => theme.user_text_style,
        Role::Model => theme.model_text_style,
    };
    if config.markdown {
        render_markdown(&turn.text, base, theme, config.selected_block)
    } else {
        RenderedMessage {
            lines: render_plain(&turn.text, base),
            codeblock_starts: Vec::new(),
        }
    }
}

fn render_plain(text: &str, base: Style) -> Vec<Line<'static>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Line::from(Span::styled(detab(line), base)))
        .collect()
}

#[derive(Default)]
struct InlineState {
    bold: usize,
    italic: usize,
}

impl InlineState {
    fn style(&self, base: Style) -> Style {
        let mut style = base;
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.current.push(Span::styled(detab(text), style));
        }
    }

    /// Ends the current line, dropping it if it holds only whitespace.
    fn flush(&mut self) {
        let spans = std::mem::take(&mut self.current);
        if spans.iter().any(|span| !span.content.trim().is_empty()) {
            self.lines.push(Line::from(spans));
        }
    }

    fn push_raw_line(&mut self, line: Line<'static>) {
        self.flush();
        self.lines.push(line);
    }
}

fn render_markdown(
    text: &str,
    base: Style,
    theme: &Theme,
    selected_block: Option<usize>,
) -> RenderedMessage {
    let mut out = LineBuilder::new();
    let mut inline = InlineState::default();
    let mut in_code_block = false;
    let mut code_buffer = String::new();
    let mut code_style = theme.code_block_style;
    let mut codeblock_starts = Vec::new();
    let mut list_prefixes: Vec<Option<u64>> = Vec::new();

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                out.flush();
                in_code_block = true;
                code_buffer.clear();
                let selected = selected_block == Some(codeblock_starts.len());
                let header_style = if selected {
                    theme.code_block_selected_style
                } else {
                    theme.code_header_style
                };
                code_style = if selected {
                    theme.code_block_selected_style
                } else {
                    theme.code_block_style
                };
                let label = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        format!("{CODE_BLOCK_LABEL} ({})", lang.trim())
                    }
                    _ => CODE_BLOCK_LABEL.to_string(),
                };
                codeblock_starts.push(out.lines.len());
                out.push_raw_line(Line::from(Span::styled(label, header_style)));
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                for line in code_buffer.trim_matches('\n').lines() {
                    out.push_raw_line(Line::from(Span::styled(
                        format!("  {}", detab(line)),
                        code_style,
                    )));
                }
                code_buffer.clear();
            }
            Event::Text(content) if in_code_block => code_buffer.push_str(&content),
            Event::Text(content) => {
                let style = inline.style(base);
                let mut parts = content.split('\n');
                if let Some(first) = parts.next() {
                    out.push(first, style);
                }
                for part in parts {
                    out.flush();
                    out.push(part, style);
                }
            }
            Event::Code(content) => out.push(&content, theme.inline_code_style),
            Event::Html(content) | Event::InlineHtml(content) => {
                out.push(content.trim_end_matches('\n'), inline.style(base));
            }
            Event::Start(Tag::Strong) | Event::Start(Tag::Heading { .. }) => inline.bold += 1,
            Event::End(TagEnd::Strong) => inline.bold = inline.bold.saturating_sub(1),
            Event::End(TagEnd::Heading(_)) => {
                inline.bold = inline.bold.saturating_sub(1);
                out.flush();
            }
            Event::Start(Tag::Emphasis) => inline.italic += 1,
            Event::End(TagEnd::Emphasis) => inline.italic = inline.italic.saturating_sub(1),
            Event::Start(Tag::List(start)) => {
                out.flush();
                list_prefixes.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                out.flush();
                list_prefixes.pop();
            }
            Event::Start(Tag::Item) => {
                out.flush();
                let depth = list_prefixes.len().saturating_sub(1);
                let marker = match list_prefixes.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                out.push(&format!("{}{marker}", "  ".repeat(depth)), base);
            }
            Event::SoftBreak | Event::HardBreak => out.flush(),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::BlockQuote(_)) => out.flush(),
            Event::Rule => out.push_raw_line(Line::from(Span::styled("───", base))),
            _ => {}
        }
    }

    // An unterminated fence still streaming in.
    if in_code_block {
        for line in code_buffer.trim_matches('\n').lines() {
            out.push_raw_line(Line::from(Span::styled(
                format!("  {}", detab(line)),
                code_style,
            )));
        }
    }
    out.flush();
    RenderedMessage {
        lines: out.lines,
        codeblock_starts,
    }
}

fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}
