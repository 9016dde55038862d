//! Persistence of scan results

pub mod results;
