//! Authentication for the practice API.
//!
//! # Purpose
//! Bearer-token resolution and the per-request [`AccessContext`] that hands
//! the authenticated actor and its grants to the access-control engine.
pub mod bootstrap;
pub mod context;
pub mod token;

pub use context::{AccessContext, authenticate};
