//! Shared types for the stream monitor: wire models, the push protocol and
//! the error taxonomy.

pub mod models;
pub mod protocol;
pub mod error;

pub use models::*;
pub use protocol::*;
pub use error::*;
