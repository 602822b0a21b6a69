//! Common utilities and shared types for yatube-rs.
//!
//! This crate provides foundational components used across all yatube-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: File storage backends for uploaded post images
//!
//! # Example
//!
//! ```no_run
//! use yatube_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} serves pages of {} posts ({id})", config.server.url, config.feed.page_size);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult, FormErrors};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
