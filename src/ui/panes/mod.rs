//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source editor with syntax highlighting and the error line
//! - [`visualizer`]: Bar chart of the current step with its description
//! - [`console`]: Captured `console.*` output and the last run's error
//! - [`assistant`]: Code analysis, chat transcript and prompt input
//! - [`status`]: Status bar with playback state, speed and keybindings
//!
//! Each pane module exports a `render_*` function taking a `*RenderData`
//! borrow of the application state, plus any scroll state it owns.

pub mod assistant;
pub mod console;
pub mod source;
pub mod status;
pub mod visualizer;

pub use assistant::{render_assistant_pane, AssistantRenderData, PromptLine};
pub use console::{render_console_pane, ConsoleRenderData};
pub use source::{render_source_pane, SourceRenderData};
pub use status::{render_status_bar, StatusRenderData};
pub use visualizer::{render_visualizer_pane, VisualizerRenderData};
