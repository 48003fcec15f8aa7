//! Persisted artifacts written by a run.
//!
//! # Submodules
//!
//! - [`csv`]: checkpoint artifacts and the full dataset as CSV files
//! - [`json`]: the completeness report as JSON
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── fontanka_intermediate_0.csv   # checkpoint artifacts, in flush order
//! ├── fontanka_intermediate_1.csv
//! ├── fontanka_full.csv             # every record of the run
//! └── fontanka_report.json          # completeness report
//! ```

pub mod csv;
pub mod json;
