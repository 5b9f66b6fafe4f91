//! Application services layer.

pub mod auth;
pub mod error;
pub mod listing;
pub mod moderation;
pub mod repos;
pub mod stats;
