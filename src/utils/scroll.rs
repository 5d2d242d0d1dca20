use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Word-wraps styled lines to `terminal_width` columns.
    ///
    /// The renderer draws the result without further wrapping, so scroll
    /// math done on these lines matches what ends up on screen. Words longer
    /// than a row are broken mid-word.
    pub fn prewrap_lines(lines: &[Line], terminal_width: u16) -> Vec<Line<'static>> {
        let width = terminal_width as usize;
        let mut out = Vec::with_capacity(lines.len());

        for line in lines {
            let cells: Vec<(char, Style, usize)> = line
                .spans
                .iter()
                .flat_map(|span| {
                    let style = line.style.patch(span.style);
                    span.content
                        .chars()
                        .map(move |ch| (ch, style, ch.width().unwrap_or(0)))
                })
                .collect();

            if width == 0 || cells.iter().map(|c| c.2).sum::<usize>() <= width {
                out.push(cells_to_line(&cells));
                continue;
            }

            let mut row: Vec<(char, Style, usize)> = Vec::new();
            let mut row_width = 0usize;
            let mut last_space: Option<usize> = None;

            for cell in cells {
                if row_width + cell.2 > width && !row.is_empty() {
                    match last_space {
                        Some(space) if cell.0 != ' ' => {
                            let carry = row.split_off(space + 1);
                            row.pop();
                            out.push(cells_to_line(&row));
                            row = carry;
                        }
                        _ => {
                            out.push(cells_to_line(&row));
                            row.clear();
                        }
                    }
                    row_width = row.iter().map(|c| c.2).sum();
                    last_space = None;
                    if cell.0 == ' ' && row.is_empty() {
                        continue;
                    }
                }
                if cell.0 == ' ' {
                    last_space = Some(row.len());
                }
                row_width += cell.2;
                row.push(cell);
            }
            out.push(cells_to_line(&row));
        }

        out
    }

    pub fn calculate_scroll_to_bottom(total_lines: usize, available_height: u16) -> u16 {
        Self::calculate_max_scroll_offset(total_lines, available_height)
    }

    pub fn calculate_max_scroll_offset(total_lines: usize, available_height: u16) -> u16 {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        total.saturating_sub(available_height)
    }
}

fn cells_to_line(cells: &[(char, Style, usize)]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut current_style: Option<Style> = None;

    for &(ch, style, _) in cells {
        if current_style != Some(style) {
            if let Some(prev) = current_style {
                spans.push(Span::styled(std::mem::take(&mut current), prev));
            }
            current_style = Some(style);
        }
        current.push(ch);
    }
    if let Some(style) = current_style {
        spans.push(Span::styled(current, style));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Modifier};

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn short_lines_are_untouched() {
        let lines = vec![Line::from("hello"), Line::from("")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 20);
        assert_eq!(wrapped.len(), 2);
        assert_eq!(text_of(&wrapped[0]), "hello");
        assert_eq!(text_of(&wrapped[1]), "");
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = vec![Line::from("the quick brown fox jumps")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 10);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn breaks_words_longer_than_a_row() {
        let lines = vec![Line::from("abcdefghij")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 4);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn styles_survive_wrapping() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let red = Style::default().fg(Color::Red);
        let lines = vec![Line::from(vec![
            Span::styled("bold words ", bold),
            Span::styled("red", red),
        ])];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 12);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["bold words", "red"]);
        assert_eq!(wrapped[0].spans[0].style, bold);
        assert_eq!(wrapped[1].spans[0].style, red);
    }

    #[test]
    fn wide_characters_count_double() {
        let lines = vec![Line::from("日本語テキスト")];
        let wrapped = ScrollCalculator::prewrap_lines(&lines, 6);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn max_scroll_offset_saturates() {
        assert_eq!(ScrollCalculator::calculate_max_scroll_offset(5, 10), 0);
        assert_eq!(ScrollCalculator::calculate_max_scroll_offset(25, 10), 15);
        assert_eq!(ScrollCalculator::calculate_scroll_to_bottom(11, 10), 1);
    }
}
