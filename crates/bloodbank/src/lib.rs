//! Blood bank workflows: request intake and fulfillment, donor management,
//! stock inventory, and the administrative dashboard, all ranked and filtered
//! through the pure rules in [`scoring`].

pub mod auth;
pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
pub mod workflows;
