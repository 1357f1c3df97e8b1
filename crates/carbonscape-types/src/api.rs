//! Request and response bodies for the projection backend.
//!
//! These mirror the backend's JSON contract. Item counts are floating point
//! because continuous quantities (kWh, km) share the same map as counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::snapshot::RawProjection;

/// Item name to count (or yearly quantity).
pub type ItemCounts = BTreeMap<String, f64>;

/// Body of `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
}

/// Body of `POST /signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
}

/// Response of `POST /login` and `POST /signup`.
///
/// This is also the identity record persisted locally after a successful
/// login so the next session can resolve the user's projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// `"ok"` on success.
    pub status: String,
    /// `"login"` or `"signup"`, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// The authenticated user.
    pub user_id: UserId,
}

impl AuthResponse {
    /// Whether the backend reported success.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Response of `GET /projections/{id}` and `GET /projection/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionEnvelope {
    /// Raw yearly snapshots in the backend convention.
    pub projection: RawProjection,
}

/// Response of `GET /items/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsResponse {
    /// Current item counts.
    #[serde(default)]
    pub items: ItemCounts,
}

/// Body of `PATCH /items/{id}`: deltas merged into the stored counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsPatch {
    /// Count deltas by item name.
    pub items: ItemCounts,
}

/// Response of `PATCH /items/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsPatchResponse {
    /// Merged item counts after the patch.
    #[serde(default)]
    pub items: ItemCounts,
    /// Refreshed projection, when the backend recomputed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<RawProjection>,
}

/// One AI-generated suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Short human-readable text.
    pub suggestion: String,
    /// Item deltas the suggestion would apply.
    #[serde(default)]
    pub impact: ItemCounts,
}

/// Response of `GET /ai_suggestions/{id}?year=Y`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    /// The year the backend actually used (nearest available).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    /// Suggestions, possibly empty.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// Body of `POST /take_action/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeActionRequest {
    /// Year the action takes effect.
    pub year: i64,
    /// Action category, e.g. `"ai_suggestion"`.
    pub action_type: String,
    /// Item deltas.
    pub impact: ItemCounts,
}

/// Response of `POST /take_action/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TakeActionResponse {
    /// `"ok"` on success.
    #[serde(default)]
    pub status: String,
    /// Ledger transaction signature recorded for the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_sig: Option<String>,
    /// Projection recomputed with the action applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<RawProjection>,
}

/// Error body returned by the backend on non-success statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub detail: Option<String>,
}
