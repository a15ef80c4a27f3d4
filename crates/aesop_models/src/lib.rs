//! Service clients for the Aesop storybook pipeline.
//!
//! Provides the production implementations of the network-facing capability
//! traits:
//! - [`OpenAiImageClient`] implements
//!   [`ImageGenerator`](aesop_interface::ImageGenerator) against an
//!   OpenAI-style `/images/generations` endpoint, with an optional
//!   images-per-minute throttle and transport-level retry.
//! - [`HttpImageFetcher`] implements
//!   [`ImageFetcher`](aesop_interface::ImageFetcher) as a bounded download
//!   (timeout plus byte ceiling) for document assembly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod fetcher;
mod openai_images;

pub use fetcher::HttpImageFetcher;
pub use openai_images::OpenAiImageClient;
