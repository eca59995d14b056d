//! Dossier is a terminal-first client for project-scoped assistant chat.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the client-side state machines: the resource cascade
//!   (projects, sessions, message history), the send-message protocol with
//!   optimistic entries, configuration, and error surfacing.
//! - [`ui`] renders the terminal interface, runs the interactive event loop,
//!   derives panel visibility from the viewport, and converts assistant
//!   replies into structured markup.
//! - [`api`] defines backend payloads and the HTTP client, behind a
//!   [`api::Backend`] seam so drivers and tests can substitute transports.
//! - [`auth`] stores the session token in the system keyring and implements
//!   the interactive `auth`/`deauth` flows.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
