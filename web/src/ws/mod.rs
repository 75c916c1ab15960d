//! WebSocket transport for the fan-out core.
//!
//! `handler` accepts upgrades and pumps inbound frames into the manager;
//! `transport` is what the dispatcher writes outbound frames through.

pub mod handler;
pub mod transport;
