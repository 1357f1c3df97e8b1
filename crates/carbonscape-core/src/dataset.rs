//! Shared handle to the active projection dataset.
//!
//! Resolution runs on its own task and publishes here; the render loop
//! reads the latest value without waiting. Every resolution takes a
//! [`Ticket`] up front. A publish whose ticket is older than the newest one
//! already published is dropped, so a slow, superseded resolution can never
//! overwrite fresher data.

use std::sync::Arc;

use carbonscape_types::ProjectionDataset;
use tokio::sync::watch;
use tracing::debug;

/// Where a resolved dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// Freshly fetched from the backend and normalized.
    Live,
    /// Last successful fetch, read from the local cache.
    Cache,
    /// The built-in sample dataset.
    Sample,
}

impl DataSource {
    /// Stable lowercase name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cache => "cache",
            Self::Sample => "sample",
        }
    }
}

/// A dataset together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDataset {
    /// The normalized yearly snapshots.
    pub dataset: Arc<ProjectionDataset>,
    /// How it was obtained.
    pub source: DataSource,
}

impl ResolvedDataset {
    /// Wrap `dataset` with its source.
    pub fn new(dataset: ProjectionDataset, source: DataSource) -> Self {
        Self {
            dataset: Arc::new(dataset),
            source,
        }
    }

    /// The built-in sample.
    pub fn sample() -> Self {
        Self::new(ProjectionDataset::sample(), DataSource::Sample)
    }
}

/// Identifies one resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Snapshot of the handle's contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetState {
    /// Latest published dataset; `None` until the first publish.
    pub current: Option<ResolvedDataset>,
    /// Whether the newest resolution has not yet published.
    pub loading: bool,
    issued: u64,
    published: u64,
}

/// Cloneable handle shared by the resolver task and the render loop.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    tx: Arc<watch::Sender<DatasetState>>,
}

impl DatasetHandle {
    /// Empty handle: no dataset, not loading.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DatasetState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Start a resolution and mark the handle as loading.
    pub fn begin(&self) -> Ticket {
        let mut ticket = Ticket(0);
        self.tx.send_modify(|state| {
            state.issued = state.issued.saturating_add(1);
            state.loading = true;
            ticket = Ticket(state.issued);
        });
        ticket
    }

    /// Publish a resolution result.
    ///
    /// Returns `false` if a newer ticket has already published.
    pub fn publish(&self, ticket: Ticket, resolved: ResolvedDataset) -> bool {
        let source = resolved.source;
        let mut slot = Some(resolved);
        let accepted = self.tx.send_if_modified(|state| {
            if ticket.0 <= state.published {
                return false;
            }
            state.published = ticket.0;
            state.current = slot.take();
            state.loading = state.issued > state.published;
            true
        });
        if accepted {
            debug!(ticket = ticket.0, source = source.as_str(), "dataset published");
        } else {
            debug!(ticket = ticket.0, "stale dataset dropped");
        }
        accepted
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> DatasetState {
        self.tx.borrow().clone()
    }

    /// Latest published dataset, if any.
    pub fn current(&self) -> Option<ResolvedDataset> {
        self.tx.borrow().current.clone()
    }

    /// Whether a resolution is outstanding.
    pub fn is_loading(&self) -> bool {
        self.tx.borrow().loading
    }

    /// Receiver notified on every accepted change.
    pub fn subscribe(&self) -> watch::Receiver<DatasetState> {
        self.tx.subscribe()
    }
}

impl Default for DatasetHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use carbonscape_types::{YearLabel, YearSnapshot};

    fn one_year(label: &str) -> ResolvedDataset {
        ResolvedDataset::new(
            ProjectionDataset::single(YearLabel::from(label), YearSnapshot::default()),
            DataSource::Live,
        )
    }

    #[test]
    fn starts_empty_and_idle() {
        let handle = DatasetHandle::new();
        assert!(handle.current().is_none());
        assert!(!handle.is_loading());
    }

    #[test]
    fn begin_marks_loading_until_published() {
        let handle = DatasetHandle::new();
        let ticket = handle.begin();
        assert!(handle.is_loading());
        assert!(handle.publish(ticket, ResolvedDataset::sample()));
        assert!(!handle.is_loading());
        assert_eq!(handle.current().unwrap().source, DataSource::Sample);
    }

    #[test]
    fn stale_publish_is_dropped() {
        let handle = DatasetHandle::new();
        let older = handle.begin();
        let newer = handle.begin();
        assert!(handle.publish(newer, one_year("2030")));
        assert!(!handle.publish(older, one_year("2025")));
        let current = handle.current().unwrap();
        assert_eq!(current.dataset.first_year().unwrap().as_str(), "2030");
        assert!(!handle.is_loading());
    }

    #[test]
    fn older_publish_first_keeps_loading_for_newer() {
        let handle = DatasetHandle::new();
        let older = handle.begin();
        let newer = handle.begin();
        assert!(handle.publish(older, one_year("2025")));
        assert!(handle.is_loading());
        assert!(handle.publish(newer, one_year("2030")));
        assert!(!handle.is_loading());
        assert_eq!(
            handle.current().unwrap().dataset.first_year().unwrap().as_str(),
            "2030"
        );
    }

    #[tokio::test]
    async fn subscribers_see_published_dataset() {
        let handle = DatasetHandle::new();
        let mut rx = handle.subscribe();
        let publisher = handle.clone();
        let task = tokio::spawn(async move {
            let ticket = publisher.begin();
            publisher.publish(ticket, ResolvedDataset::sample())
        });
        assert!(task.await.unwrap());
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.current.unwrap().source, DataSource::Sample);
    }
}
