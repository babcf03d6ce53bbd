//! Hexagonal ports: what the manager exposes (`inbound`) and what it needs
//! from the outside world (`outbound`).

pub mod inbound;
pub mod outbound;
