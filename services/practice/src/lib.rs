//! Practice service library crate.
//!
//! # Purpose
//! Exposes the practice API surface, authentication, configuration, and
//! storage implementations for use by the binary and tests. Access decisions
//! are delegated to the `precedent-authz` engine.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;
