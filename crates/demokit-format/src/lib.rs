//! # demokit-format
//!
//! Core types and binary encoding for agent demonstration files.
//!
//! A demonstration is an append-only recording of one agent's trajectory:
//! a header record describing the brain, one step record per decision, and
//! a summary trailer with aggregate statistics. This crate provides:
//! - Type definitions for all record payloads
//! - Name sanitization for file stems
//! - The framed binary codec (writer and reader)
//! - Validation of decoded files
//!
//! ## Example
//!
//! ```rust,no_run
//! use demokit_format::DemonstrationFile;
//!
//! // Read a demonstration file
//! let file = DemonstrationFile::from_path("Demonstrations/Test.demo")?;
//!
//! for step in &file.steps {
//!     println!("agent {} reward {}", step.id, step.reward);
//! }
//! if let Some(summary) = &file.summary {
//!     println!("{} steps, {} episodes", summary.number_steps, summary.number_episodes);
//! }
//! # Ok::<(), demokit_format::FormatError>(())
//! ```

mod codec;
mod error;
mod file;
mod record;
mod sanitize;
mod validation;

pub use codec::*;
pub use error::*;
pub use file::*;
pub use record::*;
pub use sanitize::*;
pub use validation::*;

/// The current version of the demonstration format.
pub const FORMAT_VERSION: u32 = 1;

/// Magic bytes at the start of every demonstration stream.
pub const MAGIC: [u8; 4] = *b"DEMO";

/// File extension for demonstration files.
pub const FILE_EXTENSION: &str = "demo";
