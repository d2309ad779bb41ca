//! Assistant pane: code analysis, chat transcript and the prompt line

use crate::assistant::{ChatTurn, Role};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Text being typed for a generate or chat request
pub struct PromptLine<'a> {
    pub label: &'a str,
    pub input: &'a str,
}

pub struct AssistantRenderData<'a> {
    /// Latest analysis, or a placeholder
    pub analysis: &'a str,
    pub transcript: &'a [ChatTurn],
    /// Requests still waiting for a reply, e.g. "analyzing"
    pub pending: &'a [&'a str],
    /// Set when no backend is configured
    pub unavailable: Option<&'a str>,
    pub prompt: Option<PromptLine<'a>>,
    pub is_focused: bool,
}

fn transcript_lines<'a>(transcript: &'a [ChatTurn]) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for turn in transcript {
        let (speaker, color) = match turn.role {
            Role::User => ("You", DEFAULT_THEME.user_message),
            Role::Model => ("AlgoBot", DEFAULT_THEME.success),
        };
        lines.push(Line::from(Span::styled(
            format!("{speaker}:"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(
            turn.text
                .lines()
                .map(|text| Line::from(Span::styled(text, Style::default().fg(DEFAULT_THEME.fg)))),
        );
    }
    lines
}

/// Render the assistant pane; `scroll` counts lines from the top of the chat
pub fn render_assistant_pane(
    frame: &mut Frame,
    area: Rect,
    data: &AssistantRenderData<'_>,
    scroll: &mut usize,
) {
    let border_style = if data.prompt.is_some() {
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

    let block = Block::default()
        .title(" Assistant ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Analysis
    let analysis_text = match data.unavailable {
        Some(reason) => Span::styled(reason, Style::default().fg(DEFAULT_THEME.error)),
        None if data.analysis.is_empty() => Span::styled(
            "Press 'a' to analyze the current code.",
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        None => Span::styled(data.analysis, Style::default().fg(DEFAULT_THEME.fg)),
    };
    let analysis = Paragraph::new(Line::from(analysis_text))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(DEFAULT_THEME.border_normal)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(analysis, rows[0]);

    // Chat
    let lines = transcript_lines(data.transcript);
    if lines.is_empty() {
        let hint = Paragraph::new("Press 'c' to chat, 'g' to generate an algorithm.")
            .style(Style::default().fg(DEFAULT_THEME.comment))
            .wrap(Wrap { trim: true });
        frame.render_widget(hint, rows[1]);
    } else {
        let visible_height = rows[1].height.max(1) as usize;
        let max_scroll = lines.len().saturating_sub(visible_height);
        *scroll = (*scroll).min(max_scroll);
        let chat = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(*scroll).unwrap_or(u16::MAX), 0));
        frame.render_widget(chat, rows[1]);
    }

    // Prompt or pending requests
    let bottom = match &data.prompt {
        Some(prompt) => Line::from(vec![
            Span::styled(
                format!("{} > ", prompt.label),
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(prompt.input, Style::default().fg(DEFAULT_THEME.fg)),
        ]),
        None if !data.pending.is_empty() => Line::from(Span::styled(
            format!("{}...", data.pending.join(", ")),
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::ITALIC),
        )),
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(bottom), rows[2]);

    if let Some(prompt) = &data.prompt {
        let x = rows[2].x + prompt.label.chars().count() as u16 + 3 + prompt.input.chars().count() as u16;
        if x < rows[2].right() {
            frame.set_cursor_position((x, rows[2].y));
        }
    }
}
