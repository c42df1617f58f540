//! Client core for a multi-session chat service.
//!
//! An authenticated user holds independent conversation sessions, each
//! backed by persisted server-side history. Three controllers own the
//! client state: [`auth::AuthController`] (the signed-in identity),
//! [`registry::ConversationRegistry`] (the session list), and
//! [`transcript::TranscriptController`] (the active session's message
//! history, with optimistic updates reconciled against the server).
//! [`client::ChatClient`] composes them over a shared
//! [`gateway::Gateway`].

pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod model;
pub mod registry;
pub mod settings;
pub mod transcript;

pub use client::ChatClient;
pub use error::{ClientError, Result};
