//! Defpatch: function-boundary patching for indentation-delimited sources
//!
//! A small patching system for adapting an external project's source files
//! after the fact - the kind of vendor-code surgery where a handful of
//! function bodies must be swapped out without touching the project's build
//! or distribution.
//!
//! # Architecture
//!
//! Two layers, leaves first:
//!
//! - [`engine`]: pure span location and text splice. Given file text, a
//!   function name and replacement text, it finds the definition's byte
//!   span (declaration line through the last body line, terminated by the
//!   next dedented line) and produces the new text. No I/O, no state.
//! - [`batch`]: the orchestrator. Reads each targeted file once, applies
//!   every request for it sequentially over the accumulated text, writes
//!   back atomically at most once, and reports a [`PatchOutcome`] per
//!   request. No failure escapes [`apply_batch`]; everything is data.
//!
//! Batches are normally built from TOML patch files via [`config`].
//!
//! # Example
//!
//! ```no_run
//! use defpatch::{apply_batch, PatchBatch, PatchRequest};
//!
//! let batch = PatchBatch::from_requests(vec![PatchRequest::new(
//!     "comfy/model_management.py",
//!     "get_torch_device_name",
//!     "def get_torch_device_name(device):\n    return str(device)\n",
//! )]);
//!
//! for outcome in apply_batch(&batch) {
//!     println!("{outcome}");
//! }
//! ```

pub mod batch;
pub mod config;
pub mod engine;

// Re-exports
pub use batch::{apply_batch, check_batch, PatchBatch, PatchOutcome, PatchRequest, PatchStatus};
pub use config::{
    load_from_path, load_from_str, ConfigError, Metadata, PatchConfig, PatchEntry,
    ValidationError, ValidationIssue,
};
pub use engine::{locate_all, locate_function, replace_function, FunctionSpan};
