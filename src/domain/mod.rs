//! Domain layer types and invariants.

pub mod ads;
pub mod entities;
pub mod error;
pub mod types;
