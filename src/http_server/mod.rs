//! # aerochat HTTP Server Module
//!
//! The transport in front of the broadcast engine, built on Axum.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/realtime/ws` - Join stream (WebSocket)
//! - `/realtime/messages` - Send a chat message
//! - `/realtime/stats`, `/realtime/members` - Membership overview
//! - `/observability/metrics` - Counters

pub mod observability_routes;
pub mod realtime_routes;
pub mod server;

pub use realtime_routes::{ClientFrame, ServerFrame};
pub use server::HttpServer;
