//! event-hub - a realtime connection hub for sentinels.
//!
//! Sentinels open a persistent WebSocket on [`api::CONNECT_PATH`] carrying an
//! `X-Stack-ID` header. The hub tracks which stack ids are connected in a
//! [`registry::ConnectionRegistry`] so later logic can address them.

pub mod api;
pub mod config;
pub mod registry;
pub mod session;
