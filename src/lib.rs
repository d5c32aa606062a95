//! Lydia: session gating, onboarding and assistant plumbing for a
//! consumer health dashboard.

pub mod assistant;
pub mod config;
pub mod error;
pub mod functions;
pub mod notice;
pub mod onboarding;
pub mod routing;
pub mod session;
pub mod store;
