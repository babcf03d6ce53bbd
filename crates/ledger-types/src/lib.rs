//! # Ledger Types Crate
//!
//! This crate contains the scalar primitives and wire-layout records shared
//! by the cryptographic kernel, the stateless manager, and the user client.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the leaf/batch/counter layouts are defined
//!   here once; every other crate imports them rather than redeclaring them.
//! - **Wire-exact**: field widths and byte order match §3 and §6 of the
//!   specification exactly (big-endian `u32`s, 32-byte x-only public keys).

pub mod constants;
pub mod entities;
pub mod errors;
pub mod namespaces;

pub use constants::*;
pub use entities::*;
pub use errors::TypesError;
pub use namespaces::*;
