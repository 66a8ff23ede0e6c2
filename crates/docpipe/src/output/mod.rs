//! CSV writing, fallback row derivation, and raw result persistence.

pub mod results;
pub mod rows;
pub mod writer;
