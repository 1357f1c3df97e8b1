//! Account task: owns the [`Session`] and runs backend commands off the
//! render loop.
//!
//! Identity changes (login, signup, logout) trigger a fresh resolution;
//! projections returned by item and action calls are published directly.
//! Every result goes through a [`DatasetHandle`] ticket, so a slow
//! resolution that finishes after a newer result is dropped.

use std::sync::Arc;

use carbonscape_client::{ActionOutcome, DatasetResolver, LocalStore, ProjectionSource, Session};
use carbonscape_core::dataset::{DatasetHandle, ResolvedDataset};
use carbonscape_types::{Suggestion, YearLabel};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use crate::command::AccountCommand;

/// Queue `command` for the account task without waiting.
///
/// A full queue drops the command with a warning; the render loop never
/// waits on the backend. Returns whether the command was queued.
pub fn submit(tx: &mpsc::Sender<AccountCommand>, command: AccountCommand) -> bool {
    match tx.try_send(command) {
        Ok(()) => true,
        Err(TrySendError::Full(command)) => {
            warn!(command = ?command, "account queue full, command dropped");
            false
        }
        Err(TrySendError::Closed(_)) => {
            warn!("account task is gone");
            false
        }
    }
}

/// Drives account commands until the sender side closes.
pub struct AccountTask<P, S> {
    session: Session<S>,
    resolver: Arc<DatasetResolver<P, S>>,
    datasets: DatasetHandle,
    suggestions: Vec<Suggestion>,
}

impl<P, S> AccountTask<P, S>
where
    P: ProjectionSource + 'static,
    S: LocalStore + 'static,
{
    /// Task over an existing session and resolver.
    pub const fn new(
        session: Session<S>,
        resolver: Arc<DatasetResolver<P, S>>,
        datasets: DatasetHandle,
    ) -> Self {
        Self {
            session,
            resolver,
            datasets,
            suggestions: Vec::new(),
        }
    }

    /// Process commands in order until the channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<AccountCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
            if let Some(notice) = self.session.notice() {
                info!(notice, "account");
            }
        }
        info!("account task stopped");
    }

    async fn handle(&mut self, command: AccountCommand) {
        match command {
            AccountCommand::Login { email } => {
                if self.session.login(&email).await.is_ok() {
                    self.suggestions.clear();
                    self.re_resolve();
                }
            }
            AccountCommand::Signup { name, email } => {
                if self.session.signup(&name, &email).await.is_ok() {
                    self.suggestions.clear();
                    self.re_resolve();
                }
            }
            AccountCommand::Logout => {
                self.session.logout().await;
                self.suggestions.clear();
                self.re_resolve();
            }
            AccountCommand::Items => {
                if let Ok(items) = self.session.refresh_items().await {
                    info!(items = ?items, "item counts");
                }
            }
            AccountCommand::AddItem { item, count } => {
                match self.session.add_item(&item, count).await {
                    Ok(Some(resolved)) => self.publish(resolved),
                    Ok(None) => info!(items = ?self.session.items(), "items updated"),
                    Err(_) => {}
                }
            }
            AccountCommand::Predict => {
                if let Ok(resolved) = self.session.request_projection().await {
                    self.publish(resolved);
                }
            }
            AccountCommand::Suggest { year } => {
                let Some(year) = year else {
                    warn!("no year on screen");
                    return;
                };
                if let Ok(list) = self.session.suggestions(&year).await {
                    for (n, entry) in (1_usize..).zip(&list) {
                        info!(
                            n,
                            year = %year,
                            suggestion = entry.suggestion,
                            impact = ?entry.impact,
                            "suggestion"
                        );
                    }
                    self.suggestions = list;
                }
            }
            AccountCommand::Apply { year, index } => {
                self.apply(year.as_ref(), index).await;
            }
        }
    }

    async fn apply(&mut self, year: Option<&YearLabel>, index: usize) {
        let Some(year) = year else {
            warn!("no year on screen");
            return;
        };
        let Some(suggestion) = index
            .checked_sub(1)
            .and_then(|i| self.suggestions.get(i))
            .cloned()
        else {
            warn!(index, available = self.suggestions.len(), "no such suggestion");
            return;
        };
        if let Ok(ActionOutcome {
            dataset: Some(resolved),
            ..
        }) = self.session.take_action(year, &suggestion).await
        {
            self.publish(resolved);
        }
    }

    /// Resolve for the new identity on its own task.
    fn re_resolve(&self) {
        let ticket = self.datasets.begin();
        let resolver = Arc::clone(&self.resolver);
        let datasets = self.datasets.clone();
        let user = self.session.user().cloned();
        tokio::spawn(async move {
            let resolved = resolver.resolve(user.as_ref()).await;
            datasets.publish(ticket, resolved);
        });
    }

    /// Publish a dataset returned by a backend call. It supersedes any
    /// resolution still in flight.
    fn publish(&self, resolved: ResolvedDataset) {
        let ticket = self.datasets.begin();
        self.datasets.publish(ticket, resolved);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use carbonscape_client::{BackendClient, LocalState, MemoryStore};
    use carbonscape_core::config::BackendConfig;
    use carbonscape_core::dataset::DataSource;

    use super::*;

    fn task(datasets: &DatasetHandle) -> AccountTask<BackendClient, MemoryStore> {
        let client = BackendClient::new(&BackendConfig::default()).unwrap();
        let state = LocalState::new(Arc::new(MemoryStore::new()), "carbonscape");
        let resolver = Arc::new(DatasetResolver::new(client.clone(), state.clone()));
        AccountTask::new(Session::new(client, state), resolver, datasets.clone())
    }

    #[tokio::test]
    async fn logout_publishes_the_sample() {
        let datasets = DatasetHandle::new();
        let mut rx = datasets.subscribe();
        let (tx, commands) = mpsc::channel(4);
        let runner = tokio::spawn(task(&datasets).run(commands));

        tx.send(AccountCommand::Logout).await.unwrap();
        drop(tx);
        runner.await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.current.is_some()))
            .await
            .unwrap()
            .unwrap();
        let current = datasets.current().unwrap();
        assert_eq!(current.source, DataSource::Sample);
        assert!(!datasets.is_loading());
    }

    #[test]
    fn submit_never_waits_on_a_full_queue() {
        let (tx, mut commands) = mpsc::channel(1);
        assert!(submit(&tx, AccountCommand::Items));
        assert!(!submit(&tx, AccountCommand::Predict));

        assert_eq!(commands.try_recv().unwrap(), AccountCommand::Items);
        assert!(commands.try_recv().is_err());
        drop(commands);
        assert!(!submit(&tx, AccountCommand::Logout));
    }

    #[tokio::test]
    async fn apply_without_listing_changes_nothing() {
        let datasets = DatasetHandle::new();
        let (tx, commands) = mpsc::channel(4);
        let runner = tokio::spawn(task(&datasets).run(commands));

        tx.send(AccountCommand::Apply {
            year: Some(YearLabel::from("2030")),
            index: 1,
        })
        .await
        .unwrap();
        drop(tx);
        runner.await.unwrap();

        assert!(datasets.current().is_none());
        assert!(!datasets.is_loading());
    }
}
