//! Shared type definitions for the CarbonScape scene.
//!
//! This crate is the single source of truth for the data that flows between
//! the projection backend, the local cache, and the animation core.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed identifiers for users and projection years
//! - [`color`] -- RGB colors with hex parsing and component-wise lerp
//! - [`snapshot`] -- Yearly snapshots, the projection dataset, and the raw
//!   backend shape with its one-time normalization
//! - [`api`] -- Request/response bodies of the backend HTTP contract

pub mod api;
pub mod color;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use api::{
    AuthResponse, ErrorBody, ItemCounts, ItemsPatch, ItemsPatchResponse, ItemsResponse,
    LoginRequest, ProjectionEnvelope, SignupRequest, Suggestion, SuggestionsResponse,
    TakeActionRequest, TakeActionResponse,
};
pub use color::{ColorParseError, Rgb};
pub use ids::{UserId, YearLabel};
pub use snapshot::{
    AnimalHealth, EmptyDatasetError, LakeState, ProjectionDataset, RawProjection, RawSnapshot,
    SkyState, YearSnapshot,
};
