//! Request handlers.

pub mod health;
pub mod pubsub;

pub use health::*;
pub use pubsub::*;
