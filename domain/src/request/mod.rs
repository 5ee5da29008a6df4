//! Request and response value objects.
//!
//! - [`entities::Request`]: a unit of work submitted by the caller
//! - [`response::Response`]: an answer produced by an agent or by the engine
//! - [`message::AgentMessage`]: a response flattened into a transcript line

pub mod entities;
pub mod message;
pub mod response;
