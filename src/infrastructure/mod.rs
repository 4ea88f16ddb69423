//! # Infrastructure Layer
//!
//! Concrete adapters for the external collaborators: the Discord session
//! (gateway + REST) and the flat-file consent store.

pub mod consent;
pub mod discord;
