//! Status bar rendering with keybindings and playback indicators

use std::time::Duration;

use crate::playback::PlaybackState;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub state: PlaybackState,
    pub cursor: usize,
    pub total_steps: usize,
    pub speed: Duration,
    /// Fraction of the sequence shown, 0..=1
    pub progress: f64,
    pub has_error: bool,
    pub is_editing: bool,
}

/// Badge text and background for the playback state
pub fn state_badge(data: &StatusRenderData<'_>) -> (&'static str, Color) {
    if data.is_editing {
        return (" EDIT ", DEFAULT_THEME.secondary);
    }
    match data.state {
        PlaybackState::Idle => (" READY ", DEFAULT_THEME.primary),
        PlaybackState::Playing => (" ▶ PLAYING ", DEFAULT_THEME.secondary),
        PlaybackState::Paused if data.cursor + 1 >= data.total_steps => {
            (" END ", DEFAULT_THEME.error)
        }
        PlaybackState::Paused if data.cursor == 0 => (" START ", DEFAULT_THEME.success),
        PlaybackState::Paused => (" PAUSED ", DEFAULT_THEME.primary),
    }
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: &StatusRenderData<'_>) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let (badge, badge_color) = state_badge(data);
    let left_spans = vec![
        Span::styled(
            badge,
            Style::default()
                .bg(badge_color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", data.message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(if data.has_error {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.fg
                }),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let keys: &[(&str, &str)] = if data.is_editing {
        &[(" Esc ", " done "), (" ^R ", " run ")]
    } else {
        &[
            (" ←/→ ", " step "),
            (" ⎵ ", " play "),
            (" +/- ", " speed "),
            (" r ", " run "),
            (" n ", " new data "),
            (" e ", " edit "),
            (" a/g/c ", " ai "),
            (" q ", " quit "),
        ]
    };

    let mut right_spans = vec![
        Span::styled(
            format!(" {}ms ", data.speed.as_millis()),
            Style::default().bg(DEFAULT_THEME.current_line_bg).fg(DEFAULT_THEME.primary),
        ),
        Span::styled(
            format!(" {:>3.0}% ", data.progress * 100.0),
            Style::default().bg(DEFAULT_THEME.current_line_bg).fg(DEFAULT_THEME.success),
        ),
    ];
    for (key, desc) in keys {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(*key, key_style));
        right_spans.push(Span::styled(*desc, desc_style));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: PlaybackState, cursor: usize, total_steps: usize) -> StatusRenderData<'static> {
        StatusRenderData {
            message: "",
            state,
            cursor,
            total_steps,
            speed: Duration::from_millis(500),
            progress: 0.0,
            has_error: false,
            is_editing: false,
        }
    }

    #[test]
    fn test_badges() {
        assert_eq!(state_badge(&status(PlaybackState::Idle, 0, 0)).0, " READY ");
        assert_eq!(state_badge(&status(PlaybackState::Playing, 2, 5)).0, " ▶ PLAYING ");
        assert_eq!(state_badge(&status(PlaybackState::Paused, 4, 5)).0, " END ");
        assert_eq!(state_badge(&status(PlaybackState::Paused, 0, 5)).0, " START ");
        assert_eq!(state_badge(&status(PlaybackState::Paused, 2, 5)).0, " PAUSED ");
    }
}
