//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`NewsSnapshot`](crate::models::NewsSnapshot) consumed by the static site
//!
//! # Output Structure
//!
//! ```text
//! docs/
//! └── data/
//!     └── news.json
//! ```

pub mod json;
