//! Gemini Chat is a terminal chat client for Google's Gemini models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the transcript controller, the session-provider boundary
//!   and its Gemini implementation, configuration, credentials, and streaming
//!   orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the Gemini request and response payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which initializes logging and dispatches into
//! [`ui::chat_loop`] for interactive sessions or [`cli::say`] for one-shot
//! prompts.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
