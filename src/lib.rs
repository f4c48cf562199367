//! aerochat - real-time channel chat with Lamport-ordered broadcast
//!
//! Clients join named channels and see every join, leave and message of that
//! channel stamped by one server-wide logical clock.

pub mod cli;
pub mod clock;
pub mod config;
pub mod http_server;
pub mod observability;
pub mod realtime;
