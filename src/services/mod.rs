//! Core services for filtering, traversal, progress reporting, and backup

pub mod backup;
pub mod cancel;
pub mod controller;
pub mod filter;
pub mod format;
pub mod profiles;
pub mod progress;
pub mod traverse;
