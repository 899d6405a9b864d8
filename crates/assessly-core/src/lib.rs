//! assessly-core: Assessment model, scoring, and timed sessions.
//!
//! This crate defines the data model, the backend trait, the reference
//! scoring function, and the session engine that the rest of assessly
//! builds on.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod result;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
