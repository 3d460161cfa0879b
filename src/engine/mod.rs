//! Core engine: the authenticate → evaluate → execute → record loop.

pub mod driver;
pub mod executor;
pub mod summary;
