//! Source pane rendering with syntax highlighting
//!
//! Shows the editor buffer with line numbers. In editing mode the terminal
//! cursor is placed at the editor cursor; after a failed run the line the
//! error points at is painted in the error color.

use crate::ui::editor::Editor;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Width of the line-number gutter, including the trailing space
const GUTTER_WIDTH: u16 = 5;

/// Simple syntax highlighting for sort scripts
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        // Handle comments
        if c == '/' && matches!(chars.get(i + 1), Some((_, '/' | '*'))) {
            flush_word(&mut spans, &mut current_word, false);
            spans.push(Span::styled(
                &line[offset..],
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        // Handle strings and template literals
        if c == '"' || c == '\'' || c == '`' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != c {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            let end_offset = chars.get(end).map_or(line.len(), |(o, _)| *o);
            spans.push(Span::styled(
                &line[offset..end_offset],
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        // Handle non-alphanumeric (delimiters)
        if !c.is_alphanumeric() && c != '_' && c != '$' {
            flush_word(&mut spans, &mut current_word, c == '(');
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

fn flush_word(spans: &mut Vec<Span<'_>>, word: &mut String, is_function: bool) {
    if !word.is_empty() {
        let style = get_keyword_style(word, is_function);
        spans.push(Span::styled(std::mem::take(word), style));
    }
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "function" | "return" | "if" | "else" | "while" | "for" | "do" | "break"
        | "continue" | "let" | "const" | "var" | "throw" | "typeof" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "true" | "false" | "null" | "undefined" | "NaN" | "Infinity" => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        "data" | "snapshot" | "console" | "Math" => Style::default().fg(DEFAULT_THEME.builtin),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Everything the source pane needs for one frame
pub struct SourceRenderData<'a> {
    pub editor: &'a Editor,
    /// 1-based line of the last run's error
    pub error_line: Option<usize>,
    pub is_editing: bool,
    pub is_focused: bool,
}

/// Render the source pane; `scroll` is the first visible line
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: &SourceRenderData<'_>,
    scroll: &mut usize,
) {
    let border_style = if data.is_editing {
        Style::default()
            .fg(DEFAULT_THEME.secondary)
            .add_modifier(Modifier::BOLD)
    } else if data.is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let title = if data.is_editing {
        " Source [EDITING: Esc leaves, Ctrl+R runs] "
    } else if data.editor.is_modified() {
        " Source [modified] "
    } else {
        " Source "
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines = data.editor.lines();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let (cursor_row, cursor_col) = data.editor.cursor();

    // Keep the cursor on screen
    if cursor_row < *scroll {
        *scroll = cursor_row;
    } else if cursor_row >= *scroll + visible_height {
        *scroll = cursor_row + 1 - visible_height;
    }
    *scroll = (*scroll).min(lines.len().saturating_sub(1));

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_error = data.error_line == Some(line_num);
            let is_current = data.is_editing && idx == cursor_row;

            let num_style = if is_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut content = highlight_source_code(line);
            if is_error {
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content.spans {
                    span.style = error_style;
                }
            } else if is_current {
                let current_style = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut content.spans {
                    span.style = span.style.patch(current_style);
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);

    if data.is_editing {
        let x = area.x + 1 + GUTTER_WIDTH + cursor_col as u16;
        let y = area.y + 1 + (cursor_row - *scroll) as u16;
        if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
            frame.set_cursor_position((x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_highlighting_keeps_text() {
        let source = "let s = `a ${b}`; // done";
        assert_eq!(text_of(&highlight_source_code(source)), source);
        let source = "snapshot([...data], [i], 'é');";
        assert_eq!(text_of(&highlight_source_code(source)), source);
    }

    #[test]
    fn test_keyword_styles() {
        let line = highlight_source_code("function sort(data) {");
        assert_eq!(line.spans[0].content, "function");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.keyword));
        let sort = line.spans.iter().find(|s| s.content == "sort").unwrap();
        assert_eq!(sort.style.fg, Some(DEFAULT_THEME.function));
        let data = line.spans.iter().find(|s| s.content == "data").unwrap();
        assert_eq!(data.style.fg, Some(DEFAULT_THEME.builtin));
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let line = highlight_source_code("x = 'abc");
        assert_eq!(line.spans.last().unwrap().content, "'abc");
    }
}
