//! tagweave - Hierarchical tag taxonomies
//!
//! Tagsets are versioned forests of tag definitions. Independent copies of a
//! tagset can be edited apart and reconciled later; annotations that point
//! at tag definitions follow renames and lose references to removed tags.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::TagweaveError;
