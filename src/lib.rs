//! Concurrent harvesting of dated news articles.
//!
//! The engine is split into small collaborators that the binary wires
//! together:
//!
//! - [`dates`]: localized publication date parsing
//! - [`ruleset`]: swappable markup extraction rules
//! - [`fetch`]: page fetching
//! - [`harvester`]: the two-stage fetch of one date
//! - [`scheduler`]: bounded, completion-ordered execution of many dates
//! - [`checkpoint`]: threshold-based persistence of records
//! - [`progress`]: best-effort progress output
//! - [`audit`]: post-run completeness check
//! - [`pipeline`]: the loop that ties them together

pub mod audit;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod harvester;
pub mod logging;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod progress;
pub mod ruleset;
pub mod scheduler;
pub mod utils;
