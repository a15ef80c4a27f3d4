//! Illustration prompt building and content-safety sanitization.
//!
//! This crate is the only place prompt text is manipulated. Everything here
//! is pure: no I/O, no side effects, deterministic output for identical
//! inputs.
//!
//! Sanitization is word substitution over fixed tables: a best-effort
//! filter to reduce content-policy rejections, not a safety guarantee. It is
//! isolated behind this crate so it can be swapped for a more principled
//! classifier without touching the orchestrator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod sanitize;

pub use builder::illustration_prompt;
pub use sanitize::{SafetyTier, sanitize_scene};
