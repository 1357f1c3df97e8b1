//! Backend access, local persistence, and dataset resolution for CarbonScape.
//!
//! # Modules
//!
//! - [`api`] -- Typed `reqwest` client for the projection backend
//! - [`resolver`] -- Live/cache/sample fallback chain
//! - [`session`] -- Login, items, suggestions, and actions
//! - [`store`] -- Identity and projection cache on disk or in memory
//! - [`error`] -- [`ClientError`] and [`StoreError`]

pub mod api;
pub mod error;
pub mod resolver;
pub mod session;
pub mod store;

pub use api::BackendClient;
pub use error::{ClientError, StoreError};
pub use resolver::{DatasetResolver, ProjectionSource};
pub use session::{ActionOutcome, Session};
pub use store::{CachedDataset, FileStore, LocalState, LocalStore, MemoryStore};
