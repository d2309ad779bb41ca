//! Bar chart of the step under the playback cursor

use crate::memory::value::format_number;
use crate::playback::StepView;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

/// Everything the visualizer needs for one frame
pub struct VisualizerRenderData<'a> {
    pub view: StepView<'a>,
    pub cursor: usize,
    pub total_steps: usize,
    pub is_focused: bool,
}

/// Widest bar that lets `count` bars with one-column gaps fit in `width`
pub fn bar_width(width: u16, count: usize) -> u16 {
    if count == 0 {
        return 1;
    }
    let count = u16::try_from(count).unwrap_or(u16::MAX);
    let gaps = count.saturating_sub(1);
    (width.saturating_sub(gaps) / count).clamp(1, 9)
}

/// Bar height for a value; negative and non-finite values draw empty
pub fn bar_value(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// "Step i / max(len, 1)"
pub fn step_counter(cursor: usize, total_steps: usize) -> String {
    format!("Step {} / {}", cursor + 1, total_steps.max(1))
}

pub fn render_visualizer_pane(frame: &mut Frame, area: Rect, data: &VisualizerRenderData<'_>) {
    let border_style = if data.is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Visualizer ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let view = &data.view;
    if view.array.is_empty() {
        let empty = Paragraph::new("(empty array)")
            .alignment(Alignment::Center)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(empty, rows[0]);
    } else {
        let bars: Vec<Bar> = view
            .array
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                let color = if view.is_highlighted(index) {
                    DEFAULT_THEME.bar_highlight
                } else {
                    DEFAULT_THEME.bar
                };
                Bar::default()
                    .value(bar_value(value))
                    .text_value(format_number(value))
                    .style(Style::default().fg(color))
                    .value_style(Style::default().bg(color).fg(Color::Black))
            })
            .collect();

        let chart = BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width(rows[0].width, bars.len()))
            .bar_gap(1);
        frame.render_widget(chart, rows[0]);
    }

    let description = Paragraph::new(Line::from(Span::styled(
        view.description,
        Style::default()
            .fg(DEFAULT_THEME.fg)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(description, rows[1]);

    let counter = Paragraph::new(step_counter(data.cursor, data.total_steps))
        .alignment(Alignment::Center)
        .style(Style::default().fg(DEFAULT_THEME.comment));
    frame.render_widget(counter, rows[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_bar_geometry() {
        assert_eq!(bar_width(40, 9), 3);
        assert_eq!(bar_width(5, 9), 1);
        assert_eq!(bar_width(200, 2), 9);
        assert_eq!(bar_value(-4.0), 0);
        assert_eq!(bar_value(f64::NAN), 0);
        assert_eq!(bar_value(41.6), 42);
    }

    #[test]
    fn test_step_counter_never_shows_zero_total() {
        assert_eq!(step_counter(0, 0), "Step 1 / 1");
        assert_eq!(step_counter(4, 10), "Step 5 / 10");
    }

    #[test]
    fn test_renders_description_and_counter() {
        let backend = TestBackend::new(40, 14);
        let mut terminal = Terminal::new(backend).unwrap();
        let array = [3.0, 1.0, 2.0];
        let data = VisualizerRenderData {
            view: StepView {
                array: &array,
                highlights: &[1],
                description: "Comparing 3 > 1",
            },
            cursor: 1,
            total_steps: 4,
            is_focused: false,
        };
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_visualizer_pane(frame, area, &data);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("Comparing 3 > 1"));
        assert!(screen.contains("Step 2 / 4"));
    }
}
