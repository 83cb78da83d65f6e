//! Access-token middleware with single-flight refresh.
//!
//! [`TokenRefreshLayer`] wraps the next executor in the chain (usually the
//! HTTP transport). The resulting [`TokenRefresh`] executor:
//!
//! - attaches `Authorization: Bearer <token>` to every non-public request
//! - on a `401`, starts a refresh or joins the one already in flight
//! - replays the request once with the new token
//! - surfaces a second `401` as a terminal `AUTH_RETRY_EXHAUSTED` error
//!
//! # State machine
//!
//! ```text
//!            401 on a request
//!   Idle ─────────────────────────▶ Refreshing { followers }
//!    ▲                                   │
//!    │  success: store token, replay all │
//!    └───────────────────────────────────┘
//!       failure: fail all followers with the refresh error
//! ```
//!
//! At most one refresh call is in flight per executor. Requests failing while
//! a refresh is running, and requests issued while it is running, attach to it
//! as followers and are woken in FIFO order when it settles. The refresh runs
//! on its own task, so followers are still resolved when the caller that
//! started it is dropped.
//!
//! Every request records the token generation it was sent with. A `401` for a
//! generation that has since been replaced skips the refresh and replays with
//! the current token. The same check guards refresh completion: if the owner
//! set or cleared the token while the refresh was running, the refreshed token
//! is discarded and the waiting requests replay with whatever is current.
//!
//! A request that waited on a refresh before it was first sent has already
//! spent one refresh from its budget.

use crate::config::RefreshConfig;
use crate::credential::{AccessToken, RefreshResponse};
use crate::hooks::SessionHooks;
use estate_api_core::{
    codes, normalize, ApiError, ApiRequest, ApiResponse, ErrorKind, ExecutorFuture, Failure,
    HeaderValue, Layer, RequestExecutor, Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type RefreshOutcome = Result<()>;

/// Observable phase of the refresh state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No refresh in flight.
    Idle,
    /// A refresh call is in flight.
    Refreshing,
}

enum Phase {
    Idle,
    Refreshing {
        followers: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

struct RefreshState {
    token: Option<AccessToken>,
    generation: u64,
    phase: Phase,
    /// Generation for which the retry-exhaustion hook has already fired.
    exhausted_generation: Option<u64>,
}

struct Shared<E> {
    next: E,
    config: RefreshConfig,
    hooks: SessionHooks,
    state: Mutex<RefreshState>,
}

/// Layer producing a [`TokenRefresh`] executor.
#[derive(Debug, Clone, Default)]
pub struct TokenRefreshLayer {
    config: RefreshConfig,
    hooks: SessionHooks,
    initial_token: Option<AccessToken>,
}

impl TokenRefreshLayer {
    /// Create a layer.
    #[must_use]
    pub fn new(config: RefreshConfig, hooks: SessionHooks) -> Self {
        Self {
            config,
            hooks,
            initial_token: None,
        }
    }

    /// Start with a previously persisted access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.initial_token = Some(AccessToken::new(token));
        self
    }
}

impl<E> Layer<E> for TokenRefreshLayer
where
    E: RequestExecutor + 'static,
{
    type Executor = TokenRefresh<E>;

    fn layer(&self, next: E) -> Self::Executor {
        TokenRefresh {
            shared: Arc::new(Shared {
                next,
                config: self.config.clone(),
                hooks: self.hooks.clone(),
                state: Mutex::new(RefreshState {
                    token: self.initial_token.clone(),
                    generation: 0,
                    phase: Phase::Idle,
                    exhausted_generation: None,
                }),
            }),
        }
    }
}

/// Executor that attaches the access token and refreshes it on `401`.
///
/// Clones share the token and the refresh state.
pub struct TokenRefresh<E> {
    shared: Arc<Shared<E>>,
}

impl<E> Clone for TokenRefresh<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E> std::fmt::Debug for TokenRefresh<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresh")
            .field("config", &self.shared.config)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl<E> TokenRefresh<E> {
    /// Current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.shared
            .lock_state()
            .token
            .as_ref()
            .map(|t| t.expose().to_string())
    }

    /// Replace the access token (e.g. after login).
    ///
    /// Requests already rejected with the previous token replay with this one
    /// instead of starting a refresh.
    pub fn set_access_token(&self, token: impl Into<String>) {
        let mut state = self.shared.lock_state();
        state.token = Some(AccessToken::new(token));
        state.generation += 1;
        tracing::debug!(generation = state.generation, "Access token set");
    }

    /// Forget the access token (e.g. after logout).
    pub fn clear_access_token(&self) {
        let mut state = self.shared.lock_state();
        state.token = None;
        state.generation += 1;
        tracing::debug!(generation = state.generation, "Access token cleared");
    }

    /// Current phase of the refresh state machine.
    #[must_use]
    pub fn phase(&self) -> RefreshPhase {
        match self.shared.lock_state().phase {
            Phase::Idle => RefreshPhase::Idle,
            Phase::Refreshing { .. } => RefreshPhase::Refreshing,
        }
    }

    /// Middleware configuration.
    #[must_use]
    pub fn config(&self) -> &RefreshConfig {
        &self.shared.config
    }
}

impl<E> TokenRefresh<E>
where
    E: RequestExecutor + 'static,
{
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let shared = &self.shared;

        if shared.config.is_public(&request.path) {
            return shared.next.execute(request).await;
        }

        let mut refreshes = 0;
        if let Some(receiver) = self.join_active_refresh() {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                "Refresh in flight, holding request until it settles"
            );
            Self::settle(receiver, &shared.config.refresh_path).await?;
            refreshes = 1;
        }

        loop {
            let (token, generation) = shared.snapshot();
            let attempt = shared.authorize(request.clone(), token.as_ref())?;

            match shared.next.execute(attempt).await {
                Err(error) if shared.config.requires_refresh(&error) => {
                    if refreshes >= shared.config.max_refresh_attempts {
                        tracing::warn!(
                            method = %request.method,
                            path = %request.path,
                            refreshes,
                            "Authentication failed after token refresh, giving up"
                        );
                        let error = error.into_auth_exhausted(codes::AUTH_RETRY_EXHAUSTED);
                        if shared.mark_exhausted(generation) {
                            shared.hooks.auth_error(&error);
                        }
                        return Err(error);
                    }

                    tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        generation,
                        "Request rejected, waiting for token refresh"
                    );
                    refreshes += 1;
                    self.await_refresh(generation).await?;
                }
                result => return result,
            }
        }
    }

    /// Wait until the token that was current at `seen_generation` has been replaced.
    ///
    /// Starts a refresh if none is in flight, otherwise joins the active one.
    async fn await_refresh(&self, seen_generation: u64) -> Result<()> {
        let receiver = {
            let mut state = self.shared.lock_state();

            if state.generation != seen_generation {
                tracing::debug!(
                    seen_generation,
                    current_generation = state.generation,
                    "Token already replaced, replaying without refresh"
                );
                return Ok(());
            }

            let (sender, receiver) = oneshot::channel();
            if let Phase::Refreshing { followers } = &mut state.phase {
                followers.push(sender);
                tracing::debug!(followers = followers.len(), "Joining in-flight token refresh");
            } else {
                state.phase = Phase::Refreshing {
                    followers: vec![sender],
                };
                tracing::info!(path = %self.shared.config.refresh_path, "Starting token refresh");
                tokio::spawn(Arc::clone(&self.shared).refresh(seen_generation));
            }
            receiver
        };

        Self::settle(receiver, &self.shared.config.refresh_path).await
    }

    /// Attach to the refresh in flight, if there is one.
    fn join_active_refresh(&self) -> Option<oneshot::Receiver<RefreshOutcome>> {
        let mut state = self.shared.lock_state();
        match &mut state.phase {
            Phase::Refreshing { followers } => {
                let (sender, receiver) = oneshot::channel();
                followers.push(sender);
                Some(receiver)
            }
            Phase::Idle => None,
        }
    }

    async fn settle(receiver: oneshot::Receiver<RefreshOutcome>, refresh_path: &str) -> Result<()> {
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::new(
                ErrorKind::AuthExhausted,
                codes::AUTH_REFRESH_FAILED,
                "Authentication Error",
                0,
                "Token refresh was aborted",
                refresh_path,
            )),
        }
    }
}

impl<E> RequestExecutor for TokenRefresh<E>
where
    E: RequestExecutor + 'static,
{
    fn execute(&self, request: ApiRequest) -> ExecutorFuture<'_> {
        Box::pin(self.call(request))
    }
}

impl<E> Shared<E> {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> (Option<AccessToken>, u64) {
        let state = self.lock_state();
        (state.token.clone(), state.generation)
    }

    /// Record that retries for `generation` are exhausted.
    ///
    /// Returns `true` only for the first caller per generation, so concurrent
    /// requests rejected with the same token force one logout, not many.
    fn mark_exhausted(&self, generation: u64) -> bool {
        let mut state = self.lock_state();
        if state.exhausted_generation == Some(generation) {
            false
        } else {
            state.exhausted_generation = Some(generation);
            true
        }
    }

    fn authorize(&self, mut request: ApiRequest, token: Option<&AccessToken>) -> Result<ApiRequest> {
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("{}{}", self.config.header_prefix, token.expose()))
                .map_err(|e| {
                    normalize(Failure::NotDispatched {
                        message: format!("Access token is not a valid header value: {e}"),
                    })
                })?;
            request.headers.insert(self.config.header_name.clone(), value);
        }
        Ok(request)
    }
}

impl<E> Shared<E>
where
    E: RequestExecutor + 'static,
{
    /// Run one refresh call and settle every follower with its outcome.
    ///
    /// `started_generation` is the token generation the refresh replaces. If
    /// the owner changed the token meanwhile, the result is discarded and no
    /// hook fires.
    async fn refresh(self: Arc<Self>, started_generation: u64) {
        let path = self.config.refresh_path.clone();
        let request = ApiRequest::post(path.clone()).with_body(serde_json::json!({}));

        let outcome: Result<AccessToken> = self
            .next
            .execute(request)
            .await
            .and_then(|response| {
                let status = response.status.as_u16();
                let instance = response.instance.clone();
                let token = AccessToken::new(response.json::<RefreshResponse>()?.access_token);
                if token.is_empty() {
                    Err(ApiError::decode(
                        status,
                        "Refresh response carried an empty access token",
                        instance,
                    ))
                } else {
                    Ok(token)
                }
            })
            .map_err(|error| error.into_auth_exhausted(codes::AUTH_REFRESH_FAILED));

        let (followers, superseded) = {
            let mut state = self.lock_state();
            let superseded = state.generation != started_generation;
            if let (Ok(token), false) = (&outcome, superseded) {
                state.token = Some(token.clone());
                state.generation += 1;
            }
            let followers = match std::mem::replace(&mut state.phase, Phase::Idle) {
                Phase::Refreshing { followers } => followers,
                Phase::Idle => Vec::new(),
            };
            (followers, superseded)
        };

        let settled: RefreshOutcome = if superseded {
            tracing::info!(
                started_generation,
                followers = followers.len(),
                "Token changed during refresh, discarding refresh result"
            );
            Ok(())
        } else {
            match outcome {
                Ok(token) => {
                    tracing::info!(followers = followers.len(), "Token refresh succeeded");
                    self.hooks.token_refreshed(token.expose());
                    Ok(())
                }
                Err(error) => {
                    tracing::warn!(
                        status = error.status(),
                        code = error.code().unwrap_or_default(),
                        followers = followers.len(),
                        "Token refresh failed"
                    );
                    self.hooks.auth_error(&error);
                    Err(error)
                }
            }
        };

        for follower in followers {
            let _ = follower.send(settled.clone());
        }
    }
}
