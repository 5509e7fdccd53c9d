//! Trellis Pump - background file import for the layout editor.
//!
//! Copies a picked file into the project's asset directory on its own thread
//! and reports progress as [`trellis_api::CopyEvent`]s.

pub mod copy;

pub use copy::{resolve_source, CancelHandle, CopyCallback, CopyError, CopyTask};
