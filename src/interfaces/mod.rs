//! Adapters that expose the application to the outside world.

pub mod csv;
pub mod http;
