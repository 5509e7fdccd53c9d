//! Inflation error types.

use thiserror::Error;
use trellis_api::LayoutError;

use crate::WidgetId;

/// Construction-phase failures. Any of these aborts the whole `inflate` call.
#[derive(Debug, Error)]
pub enum InflateError {
    #[error("layout not found: '{0}'")]
    LayoutNotFound(String),

    #[error("no parser registered for view type '{0}' and no unknown-type callback is set")]
    UnresolvedType(String),

    #[error("unknown-type callback returned no widget for view type '{0}'")]
    CallbackReturnedNothing(String),

    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Failures of a live attribute edit.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("widget {0} has no view manager")]
    NoManager(WidgetId),

    #[error("attribute '{name}' was rejected by the '{view_type}' parser")]
    Rejected { name: String, view_type: String },

    #[error("invalid attribute value: {0}")]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Inflate(#[from] InflateError),
}
