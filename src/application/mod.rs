//! Application layer containing the business logic orchestration.
//!
//! `ApprovalWorkflow` is the entry point for everything that moves a form
//! submission or a purchase between states. It owns the storage ports and
//! the outbound adapters (payment gateway, mailer) and serializes the
//! steps that touch purchase status and stock.

pub mod auth;
pub mod notifications;
pub mod uploads;
pub mod workflow;
