//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the section to articles report as a JSON file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── output_2025-05-06_09-30-00.json
//! ```

pub mod json;
