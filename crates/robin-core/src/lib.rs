pub mod config;
pub mod error;
pub mod types;

pub use error::{Result, RobinError};
pub use types::{Context, Decision, Message, Reply, Role, SessionId, Turn};
