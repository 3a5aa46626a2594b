//! Real-time presence and group-chat synchronization core.
//!
//! This library keeps a live WebSocket channel healthy and reconciles
//! optimistic local state against asynchronous server broadcasts:
//!
//! - [`connection::ConnectionManager`] drives a single socket per channel
//!   purpose through connect/close/backoff-reconnect and exposes a typed
//!   event stream.
//! - [`presence::PresenceTracker`] aggregates join/leave events, roster
//!   snapshots and the process-wide presence signal into an online/offline
//!   predicate derived from last-activity staleness.
//! - [`chat::ChatSession`] merges a REST-submitted message with its later
//!   WebSocket echo exactly once, aggregates typing indicators and delivers
//!   messages to the view layer in processing order.
//!
//! It has no command-line surface; it is consumed as a library by UI
//! components.

pub mod chat;
pub mod config;
pub mod connection;
pub mod domain;
pub mod error;
pub mod presence;
pub mod rest;
