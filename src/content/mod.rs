//! Built-in narrative content for Echo.

pub mod memories;
pub mod script;
