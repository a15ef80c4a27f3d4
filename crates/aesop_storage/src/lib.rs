//! Keyed object storage for Aesop.
//!
//! This crate provides the filesystem implementation of the
//! [`MediaStore`](aesop_interface::MediaStore) capability. Objects are
//! written under caller-chosen hierarchical keys (`stories/{id}/pages/...`),
//! which the pipeline scopes by story id, page number, and attempt so that
//! concurrent writes never collide.
//!
//! # Example
//!
//! ```rust
//! use aesop_interface::MediaStore;
//! use aesop_storage::FileSystemStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileSystemStore::new("/tmp/aesop-media")?;
//!
//! let data = vec![0u8; 1024]; // PNG data
//! let reference = store.put("stories/abc/pages/page-01.png", &data, "image/png").await?;
//!
//! let retrieved = store.get(&reference.key).await?;
//! assert_eq!(data, retrieved);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;

pub use aesop_error::{StorageError, StorageErrorKind};
pub use filesystem::FileSystemStore;
