//! Console pane: captured script output and the last run's error

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

pub struct ConsoleRenderData<'a> {
    pub logs: &'a [String],
    /// Error of the last run, until dismissed
    pub error: Option<&'a str>,
    /// Source line the error points at
    pub error_line: Option<usize>,
    pub is_focused: bool,
}

fn line_style(line: &str) -> Style {
    if line.starts_with("ERROR: ") {
        Style::default().fg(DEFAULT_THEME.error)
    } else if line.starts_with("WARN: ") {
        Style::default().fg(DEFAULT_THEME.secondary)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// Hint shown under the error message
fn error_hint(error_line: Option<usize>) -> String {
    match error_line {
        Some(line) => format!("line {line} | x: dismiss"),
        None => "x: dismiss".to_string(),
    }
}

/// Render the console pane; `scroll_offset` of `usize::MAX` pins the bottom
pub fn render_console_pane(
    frame: &mut Frame,
    area: Rect,
    data: &ConsoleRenderData<'_>,
    scroll_offset: &mut usize,
) {
    let border_style = if data.is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Console ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (log_area, error_area) = match data.error {
        Some(_) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(3)])
                .split(inner);
            (rows[0], Some(rows[1]))
        }
        None => (inner, None),
    };

    if data.logs.is_empty() {
        let paragraph =
            Paragraph::new("(no output)").style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, log_area);
    } else {
        let total_items = data.logs.len();
        let visible_height = log_area.height.max(1) as usize;

        if total_items > visible_height {
            let max_scroll = total_items - visible_height;
            *scroll_offset = (*scroll_offset).min(max_scroll);
        } else {
            *scroll_offset = 0;
        }

        let visible_items: Vec<ListItem> = data
            .logs
            .iter()
            .skip(*scroll_offset)
            .take(visible_height)
            .map(|line| ListItem::new(line.as_str()).style(line_style(line)))
            .collect();

        let list = List::new(visible_items).block(Block::default().padding(Padding::new(1, 0, 0, 0)));
        frame.render_widget(list, log_area);
    }

    if let (Some(error), Some(error_area)) = (data.error, error_area) {
        let text = vec![
            Line::from(Span::styled(
                error,
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                error_hint(data.error_line),
                Style::default().fg(DEFAULT_THEME.comment),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(DEFAULT_THEME.error)),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, error_area);
    }
}
