//! Plain data shared across the engine: stages, messages, and the
//! per-reply emotion and glitch records.

pub mod emotion;
pub mod message;
pub mod stage;
