//! Animation and composition core for the CarbonScape scene.
//!
//! Everything here is synchronous and deterministic given its inputs: the
//! caller supplies elapsed time and the active dataset, and gets back the
//! values a renderer should draw. Network access and persistence live in
//! `carbonscape-client`; scheduling lives in the viewer binary.
//!
//! # Modules
//!
//! - [`smoothing`] -- [`SmoothedValue`] easing and the [`Blend`] policy
//! - [`timeline`] -- [`YearTimeline`] playback over the projection years
//! - [`entity`] -- Per-animal [`EntityController`]s and their profiles
//! - [`forest`] -- Persistent arena of tree slots
//! - [`ambient`] -- Emission pulse unrelated to the year cycle
//! - [`compositor`] -- Sky, fog, ground, lake and forest targets
//! - [`dataset`] -- [`DatasetHandle`] shared with the resolution task
//! - [`scene`] -- [`Scene`], tying the pieces together per frame
//! - [`config`] -- `carbonscape.yaml` loading
//!
//! [`SmoothedValue`]: smoothing::SmoothedValue
//! [`Blend`]: smoothing::Blend
//! [`YearTimeline`]: timeline::YearTimeline
//! [`EntityController`]: entity::EntityController
//! [`DatasetHandle`]: dataset::DatasetHandle
//! [`Scene`]: scene::Scene

pub mod ambient;
pub mod compositor;
pub mod config;
pub mod dataset;
pub mod entity;
pub mod forest;
pub mod scene;
pub mod smoothing;
pub mod timeline;
