//! Echo Engine — scripted dialogue for a companion that remembers things
//! that never happened.
//!
//! Each user message advances a staged narrative (normal chat, glitches,
//! revelation, a choice, and one of three endings). Replies are composed
//! from scripted beats, fabricated memories and predictions, then
//! optionally corrupted by a glitch pass. Everything is keyword matching
//! and scripted content driven by a seeded RNG.

pub mod content;
pub mod core;
pub mod schema;
pub mod store;

pub use crate::core::dialogue::{DialogueOrchestrator, DialogueResult};
pub use crate::core::session::{Session, SessionBuilder, SessionError};
pub use crate::schema::message::{Message, Sender};
pub use crate::schema::stage::Stage;
