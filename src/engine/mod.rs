//! Pure computation: rate resolution and commission arithmetic.
//!
//! Nothing in this module performs I/O; the batch jobs hydrate a
//! `LeadRateContext` through the store and hand it here.

pub mod calculator;
pub mod resolver;

pub use calculator::{commission_for, should_persist};
pub use resolver::{resolve_rate, ResolvedRate};
