//! Shared building blocks for the Manabi real-time core.
//!
//! This crate holds everything both the synchronization core and its
//! embedding applications need to agree on: the JSON wire protocol spoken
//! over the WebSocket and HTTP channels, the clock abstraction used for
//! staleness and TTL decisions, and logging setup.

pub mod dto;
pub mod logger;
pub mod time;
