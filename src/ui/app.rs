//! Main TUI application state and logic

use crate::assistant::{
    AssistantConfig, AssistantReply, AssistantWorker, ChatTurn, RequestGenerations, RequestKind,
};
use crate::config::Config;
use crate::dataset::{Dataset, DatasetConfig};
use crate::executor::{ExecutionOutcome, Executor, EMPTY_RESULT_MESSAGE};
use crate::playback::PlaybackController;
use crate::snapshot::StepSequence;
use crate::ui::editor::Editor;
use crate::ui::panes::{
    self, AssistantRenderData, ConsoleRenderData, PromptLine, SourceRenderData, StatusRenderData,
    VisualizerRenderData,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Longest the loop blocks waiting for input when no tick is due
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Visualizer,
    Console,
    Assistant,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> visualizer -> assistant -> console)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Visualizer,
            FocusedPane::Visualizer => FocusedPane::Assistant,
            FocusedPane::Assistant => FocusedPane::Console,
            FocusedPane::Console => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Console,
            FocusedPane::Visualizer => FocusedPane::Source,
            FocusedPane::Assistant => FocusedPane::Visualizer,
            FocusedPane::Console => FocusedPane::Assistant,
        }
    }
}

/// What a line typed into the assistant pane is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Generate,
    Chat,
}

impl PromptKind {
    fn label(self) -> &'static str {
        match self {
            PromptKind::Generate => "Generate",
            PromptKind::Chat => "Chat",
        }
    }
}

/// How key presses are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Prompt(PromptKind),
}

/// The main application state
pub struct App {
    /// Source being edited and run
    pub editor: Editor,
    pub dataset: Dataset,
    dataset_config: DatasetConfig,
    executor: Executor,
    pub playback: PlaybackController,

    /// Console output of the last run
    pub logs: Vec<String>,
    /// Error (or empty-run notice) of the last run, until dismissed
    pub error: Option<String>,
    /// Line the last error points at
    pub error_line: Option<usize>,

    assistant: Option<AssistantWorker>,
    /// Why the assistant is unavailable, if it is
    assistant_unavailable: Option<String>,
    generations: RequestGenerations,
    pub analysis: String,
    pub transcript: Vec<ChatTurn>,
    analyzing: bool,
    generating: bool,
    /// Chat messages sent and not yet answered
    pending_chats: usize,

    pub mode: InputMode,
    pub prompt_input: String,
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub console_scroll: usize,
    pub assistant_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create the app around `source`; the assistant is disabled when its
    /// worker cannot be created.
    pub fn new(config: &Config, source: &str, dataset: Dataset) -> Self {
        let (assistant, assistant_unavailable) = start_assistant(&config.assistant);
        App {
            editor: Editor::new(source),
            dataset,
            dataset_config: config.dataset.clone(),
            executor: Executor::new(config.execution.clone()),
            playback: PlaybackController::new(config.playback.clone()),
            logs: Vec::new(),
            error: None,
            error_line: None,
            assistant,
            assistant_unavailable,
            generations: RequestGenerations::new(),
            analysis: String::new(),
            transcript: Vec::new(),
            analyzing: false,
            generating: false,
            pending_chats: 0,
            mode: InputMode::Normal,
            prompt_input: String::new(),
            focused_pane: FocusedPane::Source,
            source_scroll: 0,
            console_scroll: 0,
            assistant_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.run_code();

        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            while let Some(reply) = self.assistant.as_ref().and_then(AssistantWorker::try_recv) {
                self.handle_reply(reply);
            }

            // Wake up for the next playback tick, or often enough to pick up replies
            let timeout = self
                .playback
                .time_until_tick(Instant::now())
                .map_or(IDLE_POLL, |until| until.min(IDLE_POLL));
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }

            self.playback.poll(Instant::now());
        }

        Ok(())
    }

    /// Run the editor contents against the working dataset.
    ///
    /// A failed run keeps the previously loaded steps on screen.
    pub fn run_code(&mut self) {
        self.playback.pause();
        self.invalidate_pending_code_requests();

        let outcome = self.executor.execute(&self.editor.text(), self.dataset.values());
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: ExecutionOutcome) {
        let ExecutionOutcome { steps, logs, error } = outcome;
        self.logs = logs;
        self.console_scroll = usize::MAX;

        match error {
            Some(err) => {
                self.error_line = err.location().map(|location| location.line);
                self.error = Some(err.to_string());
                self.status_message = "Run failed".to_string();
            }
            None if steps.is_empty() => {
                self.playback.load(steps);
                self.error_line = None;
                self.error = Some(EMPTY_RESULT_MESSAGE.to_string());
                self.status_message = "No steps recorded".to_string();
            }
            None => {
                let count = steps.len();
                self.playback.load(steps);
                self.error_line = None;
                self.error = None;
                self.status_message = format!("Recorded {count} steps");
            }
        }
    }

    /// Replace the dataset with random values and run again.
    ///
    /// Steps recorded against the old values are dropped even if the
    /// re-run fails.
    pub fn reset_data(&mut self) {
        self.dataset = self.dataset_config.reset(&mut rand::rng());
        info!(values = ?self.dataset.values(), "dataset reset");
        self.playback.load(StepSequence::new());
        self.run_code();
    }

    fn invalidate_pending_code_requests(&mut self) {
        if self.analyzing || self.generating {
            debug!("dropping outstanding analysis and generation requests");
        }
        self.generations.invalidate(RequestKind::Explain);
        self.generations.invalidate(RequestKind::Generate);
        self.analyzing = false;
        self.generating = false;
    }

    /// Apply a finished assistant request unless a newer one superseded it
    pub fn handle_reply(&mut self, reply: AssistantReply) {
        if !self.generations.accepts(&reply) {
            debug!(kind = ?reply.kind, generation = reply.generation, "ignoring stale assistant reply");
            return;
        }

        match reply.kind {
            RequestKind::Explain => {
                self.analyzing = false;
                self.analysis = reply.text;
                self.status_message = "Analysis ready".to_string();
            }
            RequestKind::Generate => {
                self.generating = false;
                if reply.text.is_empty() {
                    self.status_message = "Nothing was generated".to_string();
                    return;
                }
                self.editor.set_text(&reply.text);
                self.source_scroll = 0;
                self.status_message = "Generated code loaded".to_string();
                self.run_code();
            }
            RequestKind::Chat => {
                self.pending_chats = self.pending_chats.saturating_sub(1);
                self.transcript.push(ChatTurn::model(reply.text));
                self.assistant_scroll = usize::MAX;
            }
        }
    }

    fn request_analysis(&mut self) {
        let Some(worker) = &self.assistant else {
            self.report_unavailable();
            return;
        };
        let generation = self.generations.issue(RequestKind::Explain);
        worker.explain(generation, self.editor.text());
        self.analyzing = true;
        self.status_message = "Analyzing...".to_string();
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        if self.assistant.is_none() {
            self.report_unavailable();
            return;
        }
        self.playback.pause();
        self.prompt_input.clear();
        self.mode = InputMode::Prompt(kind);
        self.focused_pane = FocusedPane::Assistant;
    }

    fn submit_prompt(&mut self, kind: PromptKind) {
        self.mode = InputMode::Normal;
        let text = std::mem::take(&mut self.prompt_input);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(worker) = &self.assistant else {
            return;
        };

        match kind {
            PromptKind::Generate => {
                let generation = self.generations.issue(RequestKind::Generate);
                worker.generate(generation, text.to_string());
                self.generating = true;
                self.status_message = format!("Generating: {text}");
            }
            PromptKind::Chat => {
                let generation = self.generations.issue(RequestKind::Chat);
                worker.chat(generation, text.to_string());
                self.transcript.push(ChatTurn::user(text));
                self.pending_chats += 1;
                self.assistant_scroll = usize::MAX;
            }
        }
    }

    fn report_unavailable(&mut self) {
        if let Some(reason) = &self.assistant_unavailable {
            self.status_message = reason.clone();
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Create layout: 4 panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let pane_area = main_chunks[0];
        let status_area = main_chunks[1];

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(pane_area);

        // Left column: Source (top) | Console (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[0]);

        // Right column: Visualizer (top) | Assistant (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        panes::render_source_pane(
            frame,
            left_rows[0],
            &SourceRenderData {
                editor: &self.editor,
                error_line: self.error_line,
                is_editing: self.mode == InputMode::Editing,
                is_focused: self.focused_pane == FocusedPane::Source,
            },
            &mut self.source_scroll,
        );

        panes::render_console_pane(
            frame,
            left_rows[1],
            &ConsoleRenderData {
                logs: &self.logs,
                error: self.error.as_deref(),
                error_line: self.error_line,
                is_focused: self.focused_pane == FocusedPane::Console,
            },
            &mut self.console_scroll,
        );

        panes::render_visualizer_pane(
            frame,
            right_rows[0],
            &VisualizerRenderData {
                view: self.playback.current_view(self.dataset.values()),
                cursor: self.playback.cursor(),
                total_steps: self.playback.len(),
                is_focused: self.focused_pane == FocusedPane::Visualizer,
            },
        );

        let mut pending = Vec::new();
        if self.analyzing {
            pending.push("analyzing");
        }
        if self.generating {
            pending.push("generating");
        }
        if self.pending_chats > 0 {
            pending.push("thinking");
        }
        let prompt = match self.mode {
            InputMode::Prompt(kind) => Some(PromptLine {
                label: kind.label(),
                input: &self.prompt_input,
            }),
            _ => None,
        };
        panes::render_assistant_pane(
            frame,
            right_rows[1],
            &AssistantRenderData {
                analysis: &self.analysis,
                transcript: &self.transcript,
                pending: &pending,
                unavailable: self.assistant_unavailable.as_deref(),
                prompt,
                is_focused: self.focused_pane == FocusedPane::Assistant,
            },
            &mut self.assistant_scroll,
        );

        panes::render_status_bar(
            frame,
            status_area,
            &StatusRenderData {
                message: &self.status_message,
                state: self.playback.state(),
                cursor: self.playback.cursor(),
                total_steps: self.playback.len(),
                speed: self.playback.speed(),
                progress: self.playback.progress(),
                has_error: self.error.is_some(),
                is_editing: self.mode == InputMode::Editing,
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Editing => self.handle_editing_key(key),
            InputMode::Prompt(kind) => self.handle_prompt_key(kind, key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.playback.pause();
                if self.playback.step_back() {
                    self.status_message = "Stepped backward".to_string();
                }
            }
            KeyCode::Right => {
                self.playback.pause();
                if self.playback.step_forward() {
                    self.status_message = "Stepped forward".to_string();
                }
            }
            KeyCode::Up => self.scroll_focused(-1),
            KeyCode::Down => self.scroll_focused(1),
            KeyCode::Char(' ') => {
                self.playback.toggle_play(Instant::now());
                self.status_message = if self.playback.is_playing() {
                    "Playing...".to_string()
                } else {
                    "Paused".to_string()
                };
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.playback.speed_up();
                self.status_message = format!("Speed {}ms", self.playback.speed().as_millis());
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                self.playback.slow_down();
                self.status_message = format!("Speed {}ms", self.playback.speed().as_millis());
            }
            KeyCode::Enter => {
                self.playback.pause();
                self.playback.jump_to_end();
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.playback.pause();
                self.playback.jump_to_start();
                self.status_message = "Jumped to start".to_string();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => self.run_code(),
            KeyCode::Char('r') => self.run_code(),
            KeyCode::Char('n') => self.reset_data(),
            KeyCode::Char('e') => {
                self.playback.pause();
                self.mode = InputMode::Editing;
                self.focused_pane = FocusedPane::Source;
                self.status_message = "Editing".to_string();
            }
            KeyCode::Char('a') => self.request_analysis(),
            KeyCode::Char('g') => self.open_prompt(PromptKind::Generate),
            KeyCode::Char('c') => self.open_prompt(PromptKind::Chat),
            KeyCode::Char('x') => {
                self.error = None;
                self.error_line = None;
            }
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.status_message = "Ready!".to_string();
            }
            KeyCode::Char('r') if ctrl => self.run_code(),
            KeyCode::Char(c) if !ctrl => self.editor.insert_char(c),
            KeyCode::Tab => self.editor.insert_tab(),
            KeyCode::Enter => self.editor.newline(),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Home => self.editor.move_home(),
            KeyCode::End => self.editor.move_end(),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, kind: PromptKind, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.prompt_input.clear();
            }
            KeyCode::Enter => self.submit_prompt(kind),
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.prompt_input.push(c);
            }
            _ => {}
        }
    }

    fn scroll_focused(&mut self, delta: isize) {
        let offset = match self.focused_pane {
            FocusedPane::Console => &mut self.console_scroll,
            FocusedPane::Assistant => &mut self.assistant_scroll,
            FocusedPane::Source => &mut self.source_scroll,
            FocusedPane::Visualizer => return,
        };
        *offset = offset.saturating_add_signed(delta);
    }
}

fn start_assistant(config: &AssistantConfig) -> (Option<AssistantWorker>, Option<String>) {
    match AssistantWorker::from_config(config) {
        Ok(worker) => (Some(worker), None),
        Err(err) => {
            info!(error = %err, "assistant disabled");
            (None, Some(err.to_string()))
        }
    }
}
