//! Run configuration, document enumeration, and pipeline orchestration.

pub mod config;
pub mod documents;
pub mod pipeline;
