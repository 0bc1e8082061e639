//! deltagen - Partial Update Artifact Builder
//!
//! Builds partial binary update artifacts (deltas between two full update
//! archives) by driving external unpack/diff tools, with a content-addressed
//! cache so identical requests are served without recompute.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod tools;
pub mod workspace;

pub use error::{DeltagenError, DeltagenResult};
