//! Data Transfer Objects (DTOs) for the real-time core.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs (inbound and outbound)
//! - `http`: HTTP API request/response DTOs

pub mod http;
pub mod websocket;
