//! # Interface Layer
//!
//! Concrete command implementations and inbound-message handlers. These are
//! invoked by the dispatcher and the lifecycle service, never directly by
//! the infrastructure layer.

pub mod commands;
pub mod messages;
