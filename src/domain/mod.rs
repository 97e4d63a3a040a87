//! Domain records, their state machines and the ports the application
//! layer talks to.

pub mod content;
pub mod event;
pub mod money;
pub mod ports;
pub mod product;
pub mod purchase;
pub mod record;
pub mod submission;
pub mod upload;
pub mod webhook;
