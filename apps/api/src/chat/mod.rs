//! Chat relay.
//!
//! Pass-through broadcast over WebSocket. Rooms and the socket-to-user map
//! live only in memory and are rebuilt as clients reconnect; nothing is
//! persisted and delivery is not guaranteed.

pub mod filter;
pub mod handlers;
pub mod hub;
pub mod messages;
mod session;
