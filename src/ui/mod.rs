//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into four layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, input modes
//! - **[`editor`]**: the text buffer behind the source pane's editing mode
//! - **[`panes`]**: stateless render functions for each visible pane (source,
//!   visualizer, console, assistant, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it from a [`Config`],
//! the initial source and a dataset, then call [`App::run`] to start the
//! event loop.
//!
//! [`Config`]: crate::config::Config
//! [`App::run`]: app::App::run

pub mod app;
pub mod editor;
pub mod panes;
pub mod theme;

pub use app::App;
