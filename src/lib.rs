//! Bazari: a self-hosted classified-ads marketplace server.
//!
//! Public listings are served from a two-tier snapshot cache (process
//! memory plus a durable JSON file) rebuilt asynchronously whenever a
//! moderation decision or owner action changes the approved set.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
