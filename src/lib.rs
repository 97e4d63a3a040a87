//! Back end of the student government (ASB) portal.
//!
//! Visitors browse events, clubs, announcements and videos, buy store
//! products through a hosted checkout and submit approval forms for
//! restricted events. Admins manage the content and review submissions
//! from a dashboard. Payment confirmations arrive as signed webhooks.
//!
//! Layout follows ports and adapters: [`domain`] holds records and the
//! storage/gateway/mail ports, [`application`] the workflows,
//! [`infrastructure`] the adapters and [`interfaces`] the REST surface.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
