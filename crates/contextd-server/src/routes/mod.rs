//! Route handlers, one module per concern.

pub mod debug;
pub mod health;
pub mod query;
