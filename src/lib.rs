//! mindchat is a terminal chat front-end for Google's Gemini API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation session, the completion client, the
//!   credential store, and the preference file.
//! - [`ui`] prints the home screen and runs the line-based chat screen.
//! - [`commands`] parses the slash commands used on the chat screen.
//! - [`api`] defines the `generateContent` request and response payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
