//! PDF storybook assembly for the Aesop pipeline.
//!
//! The [`DocumentAssembler`] renders a story and its pages into a complete
//! PDF byte buffer: one cover page, then up to a configured number of story
//! pages, each with its illustration (when resolvable) above word-wrapped
//! body text.
//!
//! Image failure never aborts assembly: any reference that cannot be
//! fetched, decoded, or embedded is downgraded to a one-line
//! "[Image unavailable]" placeholder and the document still completes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod layout;
mod resolve;

pub use assembler::DocumentAssembler;
pub use layout::{fit_rect, wrap_words};
pub use resolve::{ResolvedImage, convert_webp_to_png, decode_raster, resolve_image};

/// Placeholder line emitted in place of an image that could not be embedded.
pub const IMAGE_PLACEHOLDER: &str = "[Image unavailable]";
