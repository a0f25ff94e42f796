//! relaychat is a terminal chat client for the n1n.ai and OpenRouter
//! chat-completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session state machine, provider/model selection,
//!   attachments, the model catalog and request orchestration.
//! - [`auth`] stores per-provider API keys and the active-provider preference.
//! - [`api`] defines the chat/model payloads and the HTTP calls that carry them.
//! - [`cli`] parses arguments and runs the interactive line-based chat driver;
//!   [`commands`] holds its slash commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which builds a [`core::app::App`] and feeds it
//! actions from stdin and from completed requests.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod utils;
