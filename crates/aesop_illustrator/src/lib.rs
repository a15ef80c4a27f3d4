//! Illustration orchestration for the Aesop storybook pipeline.
//!
//! The [`Illustrator`] turns a story's pages into persisted illustrations:
//! one staggered image-generation request per page, fan-in over the batch,
//! bounded retry rounds with exponential backoff and increasingly
//! conservative prompts, and a final status decision driven by which pages
//! ended up with images.
//!
//! No per-page failure ever aborts the batch; only a failure to load the
//! story metadata itself is fatal to a run.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod budget;
mod illustrator;
mod report;

pub use budget::RunBudget;
pub use illustrator::{Illustrator, classify_failure};
pub use report::IllustrationReport;
