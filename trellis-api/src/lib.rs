//! Trellis API - Shared data model for the layout inflation runtime.

mod event;
mod layout;
mod value;

pub use event::*;
pub use layout::*;
pub use value::*;
