//! Dataset resolution: live fetch, then cache, then the built-in sample.
//!
//! The first success wins:
//!
//! 1. No identity -- the sample, without touching the network.
//! 2. Live fetch succeeds -- normalize once, cache for this identity,
//!    return it.
//! 3. Live fetch fails for any reason -- the cached dataset for this
//!    identity exactly as stored, or the sample if there is none.
//!
//! Resolution never fails. Cache read and write problems are logged and
//! treated as a miss or ignored respectively.

use std::future::Future;

use carbonscape_core::dataset::{DataSource, ResolvedDataset};
use carbonscape_types::{ProjectionDataset, RawProjection, UserId};
use tracing::{info, warn};

use crate::api::BackendClient;
use crate::error::ClientError;
use crate::store::{LocalState, LocalStore};

/// Anything that can fetch a raw projection for a user.
pub trait ProjectionSource: Send + Sync {
    /// Fetch the stored projection for `user` in the backend convention.
    fn fetch_projection(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<RawProjection, ClientError>> + Send;
}

impl ProjectionSource for BackendClient {
    fn fetch_projection(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<RawProjection, ClientError>> + Send {
        Self::fetch_projection(self, user)
    }
}

/// Resolves the dataset to display for an identity.
#[derive(Debug, Clone)]
pub struct DatasetResolver<P, S> {
    source: P,
    state: LocalState<S>,
}

impl<P, S> DatasetResolver<P, S> {
    /// Resolver fetching from `source` and caching in `state`.
    pub const fn new(source: P, state: LocalState<S>) -> Self {
        Self { source, state }
    }
}

impl<P: ProjectionSource, S: LocalStore + 'static> DatasetResolver<P, S> {

    /// Resolve for the identity persisted in the local store.
    pub async fn resolve_stored(&self) -> ResolvedDataset {
        let identity = match self.state.identity().await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "stored identity unreadable, using sample");
                None
            }
        };
        self.resolve(identity.as_ref().map(|record| &record.user_id))
            .await
    }

    /// Resolve for `identity`, falling back as described in the module docs.
    pub async fn resolve(&self, identity: Option<&UserId>) -> ResolvedDataset {
        let Some(user) = identity else {
            info!(source = DataSource::Sample.as_str(), "no identity, using sample");
            return ResolvedDataset::sample();
        };

        match self.fetch_live(user).await {
            Ok(dataset) => {
                if let Err(err) = self.state.save_projection(user, &dataset).await {
                    warn!(user = %user, error = %err, "failed to cache projection");
                }
                info!(
                    user = %user,
                    source = DataSource::Live.as_str(),
                    years = dataset.len(),
                    "dataset resolved"
                );
                ResolvedDataset::new(dataset, DataSource::Live)
            }
            Err(err) => {
                warn!(user = %user, error = %err, "live fetch failed, falling back");
                self.fallback(user).await
            }
        }
    }

    async fn fetch_live(&self, user: &UserId) -> Result<ProjectionDataset, ClientError> {
        let raw = self.source.fetch_projection(user).await?;
        raw.normalize().map_err(|err| ClientError::MalformedResponse {
            reason: err.to_string(),
        })
    }

    async fn fallback(&self, user: &UserId) -> ResolvedDataset {
        match self.state.cached_projection(user).await {
            Ok(Some(cached)) => {
                info!(
                    user = %user,
                    source = DataSource::Cache.as_str(),
                    saved_at = %cached.saved_at,
                    "dataset resolved"
                );
                ResolvedDataset::new(cached.projection, DataSource::Cache)
            }
            Ok(None) => {
                info!(
                    user = %user,
                    source = DataSource::Sample.as_str(),
                    "cache miss, using sample"
                );
                ResolvedDataset::sample()
            }
            Err(err) => {
                warn!(user = %user, error = %err, "cache unreadable, using sample");
                ResolvedDataset::sample()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use carbonscape_types::{AuthResponse, RawSnapshot, YearLabel};

    use super::*;
    use crate::store::{FileStore, MemoryStore};

    /// Source double returning a fixed result and counting calls.
    struct FixedSource {
        result: Result<RawProjection, fn() -> ClientError>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn ok(raw: RawProjection) -> Self {
            Self {
                result: Ok(raw),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(err: fn() -> ClientError) -> Self {
            Self {
                result: Err(err),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ProjectionSource for FixedSource {
        async fn fetch_projection(&self, _user: &UserId) -> Result<RawProjection, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(raw) => Ok(raw.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn offline() -> ClientError {
        ClientError::NetworkUnavailable {
            reason: "connection refused".to_owned(),
        }
    }

    fn raw_with_trees(loss: f64) -> RawProjection {
        let mut raw = RawProjection::default();
        raw.0.insert(
            YearLabel::from("2025"),
            RawSnapshot {
                carbon_score: Some(40.0),
                trees: Some(loss),
                ..RawSnapshot::default()
            },
        );
        raw
    }

    fn state() -> LocalState<MemoryStore> {
        LocalState::new(Arc::new(MemoryStore::new()), "carbonscape")
    }

    #[tokio::test]
    async fn no_identity_uses_sample_without_fetching() {
        let resolver = DatasetResolver::new(FixedSource::ok(raw_with_trees(30.0)), state());
        let resolved = resolver.resolve(None).await;
        assert_eq!(resolved.source, DataSource::Sample);
        assert_eq!(*resolved.dataset, ProjectionDataset::sample());
        assert_eq!(resolver.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn live_fetch_is_normalized_and_cached() {
        let state = state();
        let resolver = DatasetResolver::new(FixedSource::ok(raw_with_trees(30.0)), state.clone());
        let user = UserId::from("u-1");

        let resolved = resolver.resolve(Some(&user)).await;
        assert_eq!(resolved.source, DataSource::Live);
        let year = resolved.dataset.get(&YearLabel::from("2025")).unwrap();
        assert!((year.tree_coverage - 70.0).abs() < f64::EPSILON);

        let cached = state.cached_projection(&user).await.unwrap().unwrap();
        assert_eq!(cached.projection, *resolved.dataset);
    }

    #[tokio::test]
    async fn failing_fetch_returns_cache_unmodified() {
        let state = state();
        let user = UserId::from("u-1");
        let stored = raw_with_trees(30.0).normalize().unwrap();
        state.save_projection(&user, &stored).await.unwrap();

        let resolver = DatasetResolver::new(FixedSource::failing(offline), state);
        let resolved = resolver.resolve(Some(&user)).await;
        assert_eq!(resolved.source, DataSource::Cache);
        // No second flip: still 70, not 30.
        assert_eq!(*resolved.dataset, stored);
    }

    #[tokio::test]
    async fn failing_fetch_with_empty_cache_returns_sample() {
        let resolver = DatasetResolver::new(
            FixedSource::failing(|| ClientError::NoDataAvailable { detail: None }),
            state(),
        );
        let resolved = resolver.resolve(Some(&UserId::from("u-1"))).await;
        assert_eq!(resolved.source, DataSource::Sample);
        assert_eq!(*resolved.dataset, ProjectionDataset::sample());
    }

    #[tokio::test]
    async fn empty_projection_falls_back() {
        let state = state();
        let user = UserId::from("u-1");
        let resolver =
            DatasetResolver::new(FixedSource::ok(RawProjection::default()), state.clone());
        let resolved = resolver.resolve(Some(&user)).await;
        assert_eq!(resolved.source, DataSource::Sample);
        assert!(state.cached_projection(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_users_cache_is_not_used() {
        let state = state();
        state
            .save_projection(
                &UserId::from("someone-else"),
                &raw_with_trees(10.0).normalize().unwrap(),
            )
            .await
            .unwrap();
        let resolver = DatasetResolver::new(FixedSource::failing(offline), state);
        let resolved = resolver.resolve(Some(&UserId::from("u-1"))).await;
        assert_eq!(resolved.source, DataSource::Sample);
    }

    #[tokio::test]
    async fn resolve_stored_reads_identity_from_disk() {
        let dir = std::env::temp_dir()
            .join(format!("carbonscape-resolver-{}", uuid::Uuid::new_v4()));
        let state = LocalState::new(Arc::new(FileStore::new(&dir)), "carbonscape");
        state
            .save_identity(&AuthResponse {
                status: "ok".to_owned(),
                mode: None,
                user_id: UserId::from("u-9"),
            })
            .await
            .unwrap();

        let resolver = DatasetResolver::new(FixedSource::ok(raw_with_trees(55.0)), state.clone());
        let resolved = resolver.resolve_stored().await;
        assert_eq!(resolved.source, DataSource::Live);
        assert!(
            state
                .cached_projection(&UserId::from("u-9"))
                .await
                .unwrap()
                .is_some()
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn unwritable_cache_does_not_change_result() {
        // A regular file where the store directory should be makes every write fail.
        let blocker = std::env::temp_dir()
            .join(format!("carbonscape-blocker-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"").unwrap();
        let state = LocalState::new(Arc::new(FileStore::new(&blocker)), "carbonscape");

        let resolver = DatasetResolver::new(FixedSource::ok(raw_with_trees(30.0)), state);
        let resolved = resolver.resolve(Some(&UserId::from("u-1"))).await;
        assert_eq!(resolved.source, DataSource::Live);
        std::fs::remove_file(&blocker).ok();
    }
}
