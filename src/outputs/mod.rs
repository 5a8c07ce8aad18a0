//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Loads, merges and writes the article collection
//!
//! # Output Structure
//!
//! ```text
//! data/
//! └── news.json   # read on the next run and by the site front-end
//! ```

pub mod json;
