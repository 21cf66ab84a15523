pub mod config;
pub mod dialogue;
pub mod distortion;
pub mod memory;
pub mod recency;
pub mod script;
pub mod session;
pub mod stage_machine;
pub mod text;
