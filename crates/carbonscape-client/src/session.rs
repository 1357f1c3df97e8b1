//! Account session: identity, item counts, and backend actions.
//!
//! Every operation is fail-soft. On failure the session keeps its previous
//! identity and items untouched, records a user-visible notice, and returns
//! the classified [`ClientError`]. Operations that yield a fresh projection
//! normalize it, cache it for the current user, and hand it back as a
//! [`ResolvedDataset`] for the caller to publish.

use carbonscape_core::dataset::{DataSource, ResolvedDataset};
use carbonscape_types::{
    AuthResponse, ItemCounts, RawProjection, Suggestion, TakeActionRequest, UserId, YearLabel,
};
use tracing::{info, warn};

use crate::api::BackendClient;
use crate::error::ClientError;
use crate::store::{LocalState, LocalStore};

/// Action type sent when applying a suggestion.
pub const SUGGESTION_ACTION: &str = "ai_suggestion";

/// Session operations, used to word failure notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `login`.
    Login,
    /// `signup`.
    Signup,
    /// `refresh_items`.
    Items,
    /// `add_item`.
    AddItem,
    /// `request_projection`.
    Projection,
    /// `suggestions`.
    Suggestions,
    /// `take_action`.
    TakeAction,
}

impl Operation {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::Login => "Login failed.",
            Self::Signup => "Signup failed.",
            Self::Items => "Could not load items.",
            Self::AddItem => "Add failed.",
            Self::Projection => "Prediction failed.",
            Self::Suggestions => "Failed to fetch AI suggestions.",
            Self::TakeAction => "Failed to take action. Try again.",
        }
    }

    /// Notice for `err`: backend detail first, then the transport message,
    /// then the operation's generic wording.
    fn notice(self, err: &ClientError) -> String {
        if let Some(detail) = err.detail() {
            return detail.to_owned();
        }
        match err {
            ClientError::NetworkUnavailable { .. } => err.user_message(),
            _ => self.failure_message().to_owned(),
        }
    }
}

/// Result of applying an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Ledger transaction signature, when reported.
    pub tx_sig: Option<String>,
    /// Recomputed dataset, when the backend returned one.
    pub dataset: Option<ResolvedDataset>,
}

/// Logged-in (or anonymous) account state.
#[derive(Debug)]
pub struct Session<S> {
    client: BackendClient,
    state: LocalState<S>,
    identity: Option<AuthResponse>,
    items: ItemCounts,
    notice: Option<String>,
}

impl<S: LocalStore + 'static> Session<S> {
    /// Anonymous session.
    pub const fn new(client: BackendClient, state: LocalState<S>) -> Self {
        Self {
            client,
            state,
            identity: None,
            items: ItemCounts::new(),
            notice: None,
        }
    }

    /// Session resuming the identity persisted by a previous login.
    ///
    /// An unreadable identity record starts anonymous.
    pub async fn restore(client: BackendClient, state: LocalState<S>) -> Self {
        let identity = state.identity().await.unwrap_or_else(|err| {
            warn!(error = %err, "stored identity unreadable");
            None
        });
        Self {
            identity,
            ..Self::new(client, state)
        }
    }

    /// Current user, if logged in.
    pub fn user(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|record| &record.user_id)
    }

    /// Item counts as last loaded.
    pub const fn items(&self) -> &ItemCounts {
        &self.items
    }

    /// Last user-visible notice.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// `POST /login`, then persist the identity and load items.
    pub async fn login(&mut self, email: &str) -> Result<UserId, ClientError> {
        let result = self.client.login(email).await;
        let record = self.settle(Operation::Login, result)?;
        self.adopt(record).await
    }

    /// `POST /signup`, then persist the identity.
    pub async fn signup(&mut self, name: &str, email: &str) -> Result<UserId, ClientError> {
        let result = self.client.signup(name, email).await;
        let record = self.settle(Operation::Signup, result)?;
        self.adopt(record).await
    }

    /// Forget the identity, items, and cached dataset.
    pub async fn logout(&mut self) {
        if let Err(err) = self.state.clear().await {
            warn!(error = %err, "failed to clear local state");
        }
        info!(user = ?self.user().map(UserId::as_str), "logged out");
        self.identity = None;
        self.items.clear();
        self.notice = None;
    }

    /// Reload item counts from the backend.
    pub async fn refresh_items(&mut self) -> Result<&ItemCounts, ClientError> {
        let user = self.require_user(Operation::Items)?;
        let result = self.client.items(&user).await;
        self.items = self.settle(Operation::Items, result)?;
        Ok(&self.items)
    }

    /// Add `count` of `item` to the stored counts.
    ///
    /// A blank item name or non-finite count is ignored. Returns the
    /// refreshed dataset when the backend recomputed one.
    pub async fn add_item(
        &mut self,
        item: &str,
        count: f64,
    ) -> Result<Option<ResolvedDataset>, ClientError> {
        let item = item.trim();
        if item.is_empty() || !count.is_finite() {
            return Ok(None);
        }
        let user = self.require_user(Operation::AddItem)?;
        let mut delta = ItemCounts::new();
        delta.insert(item.to_owned(), count);

        let result = self.client.add_items(&user, delta).await;
        let response = self.settle(Operation::AddItem, result)?;
        self.items = response.items;
        match response.projection {
            Some(raw) => Ok(self.adopt_projection(&user, raw).await),
            None => Ok(None),
        }
    }

    /// Ask the backend to recompute the projection from current items.
    pub async fn request_projection(&mut self) -> Result<ResolvedDataset, ClientError> {
        let user = self.require_user(Operation::Projection)?;
        let result = self.client.compute_projection(&user).await;
        let raw = self.settle(Operation::Projection, result)?;
        self.adopt_projection(&user, raw).await.ok_or_else(|| {
            self.notice = Some(Operation::Projection.failure_message().to_owned());
            ClientError::MalformedResponse {
                reason: "projection has no years".to_owned(),
            }
        })
    }

    /// Suggestions for `year`. An empty list is not an error.
    pub async fn suggestions(&mut self, year: &YearLabel) -> Result<Vec<Suggestion>, ClientError> {
        let user = self.require_user(Operation::Suggestions)?;
        let year = self.numeric_year(Operation::Suggestions, year)?;
        let result = self.client.suggestions(&user, year).await;
        let response = self.settle(Operation::Suggestions, result)?;
        if response.suggestions.is_empty() {
            self.notice = Some("No AI suggestions returned. Try again later.".to_owned());
        }
        Ok(response.suggestions)
    }

    /// Apply `suggestion` in `year`.
    pub async fn take_action(
        &mut self,
        year: &YearLabel,
        suggestion: &Suggestion,
    ) -> Result<ActionOutcome, ClientError> {
        let user = self.require_user(Operation::TakeAction)?;
        let year = self.numeric_year(Operation::TakeAction, year)?;
        let request = TakeActionRequest {
            year,
            action_type: SUGGESTION_ACTION.to_owned(),
            impact: suggestion.impact.clone(),
        };
        let result = self.client.take_action(&user, &request).await;
        let response = self.settle(Operation::TakeAction, result)?;
        self.notice = Some("Action successfully applied!".to_owned());
        info!(
            user = %user,
            year,
            tx_sig = response.tx_sig.as_deref().unwrap_or(""),
            "action applied"
        );
        let dataset = match response.projection {
            Some(raw) => self.adopt_projection(&user, raw).await,
            None => None,
        };
        Ok(ActionOutcome {
            tx_sig: response.tx_sig,
            dataset,
        })
    }

    /// Record the outcome of a backend call: clear the notice on success,
    /// set it on failure.
    fn settle<T>(
        &mut self,
        op: Operation,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.notice = None;
                Ok(value)
            }
            Err(err) => {
                warn!(operation = ?op, error = %err, "session operation failed");
                self.notice = Some(op.notice(&err));
                Err(err)
            }
        }
    }

    fn require_user(&mut self, op: Operation) -> Result<UserId, ClientError> {
        let user = self.user().cloned();
        user.ok_or_else(|| {
            self.notice = Some("Log in first.".to_owned());
            warn!(operation = ?op, "operation requires a logged-in user");
            ClientError::AuthenticationRejected { detail: None }
        })
    }

    fn numeric_year(&mut self, op: Operation, year: &YearLabel) -> Result<i64, ClientError> {
        year.as_year().ok_or_else(|| {
            self.notice = Some(op.failure_message().to_owned());
            ClientError::NoDataAvailable {
                detail: Some(format!("Year {year} is not a calendar year.")),
            }
        })
    }

    /// Make `record` the active identity. Items load best-effort.
    async fn adopt(&mut self, record: AuthResponse) -> Result<UserId, ClientError> {
        if let Err(err) = self.state.save_identity(&record).await {
            warn!(error = %err, "failed to persist identity");
        }
        info!(
            user = %record.user_id,
            mode = record.mode.as_deref().unwrap_or(""),
            "logged in"
        );
        let user = record.user_id.clone();
        self.identity = Some(record);
        self.items = self.client.items(&user).await.unwrap_or_else(|err| {
            warn!(user = %user, error = %err, "item load failed after login");
            ItemCounts::new()
        });
        Ok(user)
    }

    async fn adopt_projection(
        &self,
        user: &UserId,
        raw: RawProjection,
    ) -> Option<ResolvedDataset> {
        match raw.normalize() {
            Ok(dataset) => {
                if let Err(err) = self.state.save_projection(user, &dataset).await {
                    warn!(user = %user, error = %err, "failed to cache projection");
                }
                Some(ResolvedDataset::new(dataset, DataSource::Live))
            }
            Err(err) => {
                warn!(user = %user, error = %err, "ignoring empty projection");
                None
            }
        }
    }
}
