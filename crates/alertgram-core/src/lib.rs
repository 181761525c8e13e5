//! Core of the alert relay: template resolution, rendering, chunking and
//! delivery.
//!
//! This crate is framework-agnostic. Telegram and HTTP live in adapter crates
//! behind the messaging port.

pub mod chunking;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod pipeline;
pub mod render;
pub mod templates;

pub use errors::{Error, Result};
