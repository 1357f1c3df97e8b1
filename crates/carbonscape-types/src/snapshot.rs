//! Yearly environmental snapshots and the multi-year projection dataset.
//!
//! # Conventions
//!
//! The backend reports the tree field as a loss percentage. The scene
//! consumes the complement, the coverage remaining. [`RawProjection`] models
//! the wire shape and [`RawProjection::normalize`] performs the `100 - x`
//! flip exactly once. Everything stored as a [`ProjectionDataset`] (cache
//! entries, the built-in sample) is already in the coverage convention and
//! must never be normalized again.
//!
//! # Defaults
//!
//! Any field missing from a snapshot takes the value of
//! [`YearSnapshot::default`]: carbon score 50, tree coverage 0, a clear
//! `#1E90FF` lake, every animal at full health, and a light `0.01` fog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::ids::YearLabel;

/// Carbon score of the default snapshot.
pub const DEFAULT_CARBON_SCORE: f64 = 50.0;

/// Fog density of the default snapshot.
pub const DEFAULT_FOG_DENSITY: f64 = 0.01;

/// Built-in sample projection, stored in the coverage-remaining convention.
const SAMPLE_PROJECTION_JSON: &str = include_str!("../data/sample_projection.json");

/// Lake appearance for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LakeState {
    /// Water color.
    pub color: Rgb,
    /// Water clarity in `[0, 1]`, rendered as opacity.
    pub clarity: f64,
}

impl Default for LakeState {
    fn default() -> Self {
        Self {
            color: Rgb::from_u8(0x1E, 0x90, 0xFF),
            clarity: 1.0,
        }
    }
}

/// Per-species health fractions for one year, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimalHealth {
    /// Deer health.
    pub deer: f64,
    /// Fox health.
    pub fox: f64,
    /// Fish health (shared by both aquatic entities).
    pub fish: f64,
    /// Bird health.
    pub bird: f64,
}

impl AnimalHealth {
    /// Every species at the same health.
    pub const fn uniform(health: f64) -> Self {
        Self {
            deer: health,
            fox: health,
            fish: health,
            bird: health,
        }
    }

    /// Species readings in display order (deer, fox, fish, bird).
    pub const fn readings(&self) -> [(&'static str, f64); 4] {
        [
            ("deer", self.deer),
            ("fox", self.fox),
            ("fish", self.fish),
            ("bird", self.bird),
        ]
    }
}

impl Default for AnimalHealth {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

/// Sky conditions for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyState {
    /// Fog density target.
    pub fog: f64,
}

impl Default for SkyState {
    fn default() -> Self {
        Self {
            fog: DEFAULT_FOG_DENSITY,
        }
    }
}

/// The complete set of environmental values for one year.
///
/// Immutable once produced. The tree field is serialized as `trees` and
/// holds the coverage-remaining percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct YearSnapshot {
    /// Overall carbon score in `[0, 100]`; higher is healthier.
    pub carbon_score: f64,
    /// Tree coverage remaining, in percent `[0, 100]`.
    #[serde(rename = "trees")]
    pub tree_coverage: f64,
    /// Lake color and clarity.
    pub lake: LakeState,
    /// Animal health fractions.
    pub animals: AnimalHealth,
    /// Sky and fog conditions.
    pub sky: SkyState,
}

impl Default for YearSnapshot {
    fn default() -> Self {
        Self {
            carbon_score: DEFAULT_CARBON_SCORE,
            tree_coverage: 0.0,
            lake: LakeState::default(),
            animals: AnimalHealth::default(),
            sky: SkyState::default(),
        }
    }
}

/// A non-empty, temporally ordered mapping from year to snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<YearLabel, YearSnapshot>")]
#[serde(into = "BTreeMap<YearLabel, YearSnapshot>")]
pub struct ProjectionDataset {
    years: BTreeMap<YearLabel, YearSnapshot>,
}

/// Error returned when building a dataset from an empty mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("projection dataset must contain at least one year")]
pub struct EmptyDatasetError;

impl ProjectionDataset {
    /// Build a dataset from a year mapping.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyDatasetError`] if the mapping has no years.
    pub fn new(years: BTreeMap<YearLabel, YearSnapshot>) -> Result<Self, EmptyDatasetError> {
        if years.is_empty() {
            return Err(EmptyDatasetError);
        }
        Ok(Self { years })
    }

    /// A dataset with exactly one year.
    pub fn single(year: YearLabel, snapshot: YearSnapshot) -> Self {
        let mut years = BTreeMap::new();
        years.insert(year, snapshot);
        Self { years }
    }

    /// The built-in sample dataset used when no live or cached data exists.
    ///
    /// The embedded JSON is validated by tests; should it ever fail to
    /// parse, a single default `2025` snapshot is returned instead.
    pub fn sample() -> Self {
        serde_json::from_str(SAMPLE_PROJECTION_JSON)
            .unwrap_or_else(|_err| Self::single(YearLabel::from("2025"), YearSnapshot::default()))
    }

    /// Snapshot for a year, if present.
    pub fn get(&self, year: &YearLabel) -> Option<&YearSnapshot> {
        self.years.get(year)
    }

    /// Years in temporal order.
    pub fn years(&self) -> impl Iterator<Item = &YearLabel> {
        self.years.keys()
    }

    /// `(year, snapshot)` pairs in temporal order.
    pub fn iter(&self) -> impl Iterator<Item = (&YearLabel, &YearSnapshot)> {
        self.years.iter()
    }

    /// Number of years (always at least one).
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// The earliest year.
    pub fn first_year(&self) -> Option<&YearLabel> {
        self.years.keys().next()
    }
}

impl TryFrom<BTreeMap<YearLabel, YearSnapshot>> for ProjectionDataset {
    type Error = EmptyDatasetError;

    fn try_from(years: BTreeMap<YearLabel, YearSnapshot>) -> Result<Self, Self::Error> {
        Self::new(years)
    }
}

impl From<ProjectionDataset> for BTreeMap<YearLabel, YearSnapshot> {
    fn from(dataset: ProjectionDataset) -> Self {
        dataset.years
    }
}

/// One year as the backend reports it, before normalization.
///
/// Every field is optional; absent values fall back to the default
/// snapshot. Unknown fields (e.g. per-year `suggestions`) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    /// Carbon score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_score: Option<f64>,
    /// Tree value in the backend's loss-percentage convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trees: Option<f64>,
    /// Lake state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lake: Option<LakeState>,
    /// Animal health.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animals: Option<AnimalHealth>,
    /// Sky state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sky: Option<SkyState>,
}

impl RawSnapshot {
    /// Convert to the scene convention, flipping the tree field to
    /// `100 - loss` and filling gaps from the default snapshot.
    pub fn normalize(self) -> YearSnapshot {
        let defaults = YearSnapshot::default();
        YearSnapshot {
            carbon_score: self.carbon_score.unwrap_or(defaults.carbon_score),
            tree_coverage: self
                .trees
                .map_or(defaults.tree_coverage, |loss| 100.0 - loss),
            lake: self.lake.unwrap_or(defaults.lake),
            animals: self.animals.unwrap_or(defaults.animals),
            sky: self.sky.unwrap_or(defaults.sky),
        }
    }
}

/// A full projection as the backend reports it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProjection(pub BTreeMap<YearLabel, RawSnapshot>);

impl RawProjection {
    /// Normalize every year into a [`ProjectionDataset`].
    ///
    /// This is the only place the tree convention is flipped and must be
    /// applied exactly once, on freshly fetched data.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyDatasetError`] if the projection has no years.
    pub fn normalize(self) -> Result<ProjectionDataset, EmptyDatasetError> {
        let years = self
            .0
            .into_iter()
            .map(|(year, raw)| (year, raw.normalize()))
            .collect();
        ProjectionDataset::new(years)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_matches_documented_values() {
        let snapshot = YearSnapshot::default();
        assert!((snapshot.carbon_score - 50.0).abs() < f64::EPSILON);
        assert!(snapshot.tree_coverage.abs() < f64::EPSILON);
        assert_eq!(snapshot.lake.color.to_hex(), "#1E90FF");
        assert!((snapshot.lake.clarity - 1.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.animals, AnimalHealth::uniform(1.0));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let snapshot: YearSnapshot =
            serde_json::from_str(r#"{"carbonScore": 70, "lake": {"clarity": 0.4}}"#).unwrap();
        assert!((snapshot.carbon_score - 70.0).abs() < f64::EPSILON);
        assert!((snapshot.lake.clarity - 0.4).abs() < f64::EPSILON);
        assert_eq!(snapshot.lake.color.to_hex(), "#1E90FF");
        assert_eq!(snapshot.animals, AnimalHealth::default());
    }

    #[test]
    fn raw_tree_loss_flips_to_coverage() {
        let raw = RawSnapshot {
            trees: Some(30.0),
            ..RawSnapshot::default()
        };
        assert!((raw.normalize().tree_coverage - 70.0).abs() < 1e-9);
    }

    #[test]
    fn normalizing_twice_is_not_idempotent() {
        let once = RawSnapshot {
            trees: Some(30.0),
            ..RawSnapshot::default()
        }
        .normalize();
        let twice = RawSnapshot {
            trees: Some(once.tree_coverage),
            ..RawSnapshot::default()
        }
        .normalize();
        assert!((twice.tree_coverage - 30.0).abs() < 1e-9);
    }

    #[test]
    fn raw_projection_parses_backend_shape() {
        let body = r##"{
            "2025": {"carbonScore": 100.0, "trees": 0.0,
                     "animals": {"deer": 1.0, "fox": 1.0, "fish": 1.0, "bird": 1.0},
                     "lake": {"color": "#1E90FF", "clarity": 1.0},
                     "sky": {"fog": 0.01}, "suggestions": []},
            "2031": {"carbonScore": 40.2, "trees": 45.5,
                     "animals": {"deer": 0.5, "fox": 0.5, "fish": 0.4, "bird": 0.35},
                     "lake": {"color": "#3CB371", "clarity": 0.55},
                     "sky": {"fog": 0.1}}
        }"##;
        let raw: RawProjection = serde_json::from_str(body).unwrap();
        let dataset = raw.normalize().unwrap();
        assert_eq!(dataset.len(), 2);
        let later = dataset.get(&YearLabel::from("2031")).unwrap();
        assert!((later.tree_coverage - 54.5).abs() < 1e-9);
        assert_eq!(later.lake.color.to_hex(), "#3CB371");
    }

    #[test]
    fn empty_projection_is_rejected() {
        assert_eq!(RawProjection::default().normalize(), Err(EmptyDatasetError));
        let parsed: Result<ProjectionDataset, _> = serde_json::from_str("{}");
        assert!(parsed.is_err());
    }

    #[test]
    fn sample_dataset_parses_from_embedded_json() {
        let parsed: ProjectionDataset = serde_json::from_str(SAMPLE_PROJECTION_JSON).unwrap();
        assert_eq!(parsed, ProjectionDataset::sample());
        let years: Vec<&str> = parsed.years().map(YearLabel::as_str).collect();
        assert_eq!(years, vec!["2025", "2030", "2035", "2040"]);
        let first = parsed.get(&YearLabel::from("2025")).unwrap();
        assert!((first.tree_coverage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dataset_round_trips_through_json_unchanged() {
        let sample = ProjectionDataset::sample();
        let json = serde_json::to_string(&sample).unwrap();
        let back: ProjectionDataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn mixed_year_labels_all_resolve() {
        let json = r#"{"10000": {}, "1a": {}, "2025": {}, "2030": {}, "abc": {}, "2a": {}, "999": {}}"#;
        let dataset: ProjectionDataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.len(), 7);
        for label in ["10000", "1a", "2025", "2030", "abc", "2a", "999"] {
            assert!(
                dataset.get(&YearLabel::from(label)).is_some(),
                "lookup lost for {label}"
            );
        }
        let years: Vec<&str> = dataset.years().map(YearLabel::as_str).collect();
        assert_eq!(years, vec!["999", "2025", "2030", "10000", "1a", "2a", "abc"]);
    }
}
