//! Implementations that are useful accross the whole project
//!
//! Date management, record definition, filtering and aggregation

pub mod dataset;
pub mod date;
pub mod entry;
pub mod error;
pub mod filter;
pub mod report;
pub mod summary;
pub mod trend;
