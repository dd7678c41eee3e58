use crate::call::remote_call;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use quest_core::session::{LoginRequest, RegisterRequest, UserSession};
use quest_core::{QuestError, RemoteClient, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Authentication state as the rest of the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// A session check is running and nothing is known yet.
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Screens the client can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Feed,
    Lobbies,
    Journal,
}

impl Route {
    /// Whether the route is only reachable by an authenticated user.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still being checked; render nothing yet.
    Wait,
    Allow,
    Redirect(Route),
}

struct GateState {
    status: AuthStatus,
    session: Option<UserSession>,
    error: Option<QuestError>,
    /// Bumped by every local session change; checks started in an older epoch are discarded.
    epoch: u64,
}

type SharedCheck = Shared<BoxFuture<'static, AuthStatus>>;

struct GateInner {
    remote: Arc<dyn RemoteClient>,
    timeout: Duration,
    state: RwLock<GateState>,
    inflight: Mutex<Option<(u64, SharedCheck)>>,
    next_check: AtomicU64,
}

/// Decides whether the current user is authenticated.
///
/// Starts in `Loading`. Every check settles to `Authenticated` or
/// `Unauthenticated`; any error or timeout counts as unauthenticated.
/// Overlapping `check_session` calls share one remote call.
#[derive(Clone)]
pub struct SessionGate {
    inner: Arc<GateInner>,
}

impl SessionGate {
    pub fn new(remote: Arc<dyn RemoteClient>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(GateInner {
                remote,
                timeout,
                state: RwLock::new(GateState {
                    status: AuthStatus::Loading,
                    session: None,
                    error: None,
                    epoch: 0,
                }),
                inflight: Mutex::new(None),
                next_check: AtomicU64::new(0),
            }),
        }
    }

    pub async fn status(&self) -> AuthStatus {
        self.inner.state.read().await.status
    }

    pub async fn is_loading(&self) -> bool {
        self.status().await == AuthStatus::Loading
    }

    pub async fn session(&self) -> Option<UserSession> {
        self.inner.state.read().await.session.clone()
    }

    /// The error of the last session check or credential call, if it failed.
    pub async fn last_error(&self) -> Option<QuestError> {
        self.inner.state.read().await.error.clone()
    }

    /// Asks the remote for a current session and settles the status.
    ///
    /// Never fails: an error or timeout settles to `Unauthenticated`. If a
    /// check is already running, this call waits for it instead of starting
    /// another.
    pub async fn check_session(&self) -> AuthStatus {
        let (check_id, check) = {
            let mut inflight = self.inner.inflight.lock().await;
            match inflight.as_ref() {
                Some((id, check)) => {
                    tracing::debug!("[SessionGate] Joining in-flight check #{}", id);
                    (*id, check.clone())
                }
                None => {
                    let id = self.inner.next_check.fetch_add(1, Ordering::SeqCst) + 1;
                    let epoch = {
                        let mut state = self.inner.state.write().await;
                        state.status = AuthStatus::Loading;
                        state.epoch
                    };
                    let inner = self.inner.clone();
                    let check = async move { inner.run_check(id, epoch).await }
                        .boxed()
                        .shared();
                    *inflight = Some((id, check.clone()));
                    (id, check)
                }
            }
        };

        let status = check.await;

        let mut inflight = self.inner.inflight.lock().await;
        if matches!(inflight.as_ref(), Some((id, _)) if *id == check_id) {
            *inflight = None;
        }
        status
    }

    /// Logs in and marks the gate authenticated.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any remote call if the credentials
    /// are malformed, or the remote error. The status is unchanged on failure.
    pub async fn login(&self, request: LoginRequest) -> Result<UserSession> {
        let result = match request.validate() {
            Ok(()) => {
                remote_call("login", self.inner.timeout, self.inner.remote.login(request)).await
            }
            Err(err) => Err(err),
        };
        self.settle_credentials("login", result).await
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserSession> {
        let result = match request.validate() {
            Ok(()) => {
                remote_call(
                    "register",
                    self.inner.timeout,
                    self.inner.remote.register(request),
                )
                .await
            }
            Err(err) => Err(err),
        };
        self.settle_credentials("register", result).await
    }

    async fn settle_credentials(
        &self,
        operation: &str,
        result: Result<UserSession>,
    ) -> Result<UserSession> {
        let mut state = self.inner.state.write().await;
        match result {
            Ok(session) => {
                tracing::info!("[SessionGate] {} succeeded for {}", operation, session.username);
                state.epoch += 1;
                state.status = AuthStatus::Authenticated;
                state.session = Some(session.clone());
                state.error = None;
                Ok(session)
            }
            Err(err) => {
                tracing::warn!("[SessionGate] {} failed: {}", operation, err);
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Clears the session locally, then invalidates it remotely.
    ///
    /// The local clear happens before the remote call, so a check still in
    /// flight settles to `Unauthenticated` and cannot flip the status back.
    pub async fn logout(&self) {
        {
            let mut state = self.inner.state.write().await;
            state.epoch += 1;
            state.status = AuthStatus::Unauthenticated;
            state.session = None;
            state.error = None;
        }
        *self.inner.inflight.lock().await = None;

        let result = remote_call("logout", self.inner.timeout, self.inner.remote.logout()).await;
        if let Err(err) = &result {
            tracing::warn!(
                "[SessionGate] Remote logout failed, local session already cleared: {}",
                err
            );
        }
        tracing::info!("[SessionGate] Logged out");
    }

    /// Where a navigation to `route` should go given the current status.
    pub async fn route_decision(&self, route: Route) -> RouteDecision {
        decide(self.status().await, route)
    }
}

fn decide(status: AuthStatus, route: Route) -> RouteDecision {
    match (status, route.requires_auth()) {
        (AuthStatus::Loading, _) => RouteDecision::Wait,
        (AuthStatus::Unauthenticated, true) => RouteDecision::Redirect(Route::Register),
        (AuthStatus::Authenticated, false) => RouteDecision::Redirect(Route::Home),
        _ => RouteDecision::Allow,
    }
}

impl GateInner {
    async fn run_check(self: Arc<Self>, check_id: u64, epoch: u64) -> AuthStatus {
        let result = remote_call(
            "get_current_session",
            self.timeout,
            self.remote.get_current_session(),
        )
        .await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!(
                "[SessionGate] Check #{} settled after a local session change, discarding",
                check_id
            );
            return state.status;
        }

        match result {
            Ok(Some(session)) => {
                tracing::debug!("[SessionGate] Check #{}: authenticated", check_id);
                state.status = AuthStatus::Authenticated;
                state.session = Some(session);
                state.error = None;
            }
            Ok(None) => {
                tracing::debug!("[SessionGate] Check #{}: no session", check_id);
                state.status = AuthStatus::Unauthenticated;
                state.session = None;
                state.error = None;
            }
            Err(err) => {
                tracing::warn!(
                    "[SessionGate] Check #{} failed, treating as unauthenticated: {}",
                    check_id,
                    err
                );
                state.status = AuthStatus::Unauthenticated;
                state.session = None;
                state.error = Some(err);
            }
        }
        state.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockRemote, session};
    use quest_core::ErrorCode;

    fn gate(remote: &Arc<MockRemote>) -> SessionGate {
        SessionGate::new(remote.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let remote = Arc::new(MockRemote::new());
        let gate = gate(&remote);

        assert_eq!(gate.status().await, AuthStatus::Loading);
        assert_eq!(gate.route_decision(Route::Home).await, RouteDecision::Wait);
    }

    #[tokio::test]
    async fn test_check_settles_each_way() {
        let remote = Arc::new(MockRemote::new());
        remote.session.push(Ok(Some(session())));
        remote.session.push(Ok(None));
        let gate = gate(&remote);

        assert_eq!(gate.check_session().await, AuthStatus::Authenticated);
        assert_eq!(gate.session().await, Some(session()));

        assert_eq!(gate.check_session().await, AuthStatus::Unauthenticated);
        assert_eq!(gate.session().await, None);
    }

    #[tokio::test]
    async fn test_check_error_fails_closed() {
        let remote = Arc::new(MockRemote::new());
        remote
            .session
            .push(Err(QuestError::remote(ErrorCode::ServerError, "boom")));
        let gate = gate(&remote);

        assert_eq!(gate.check_session().await, AuthStatus::Unauthenticated);
        assert!(!gate.is_loading().await);
        assert_eq!(gate.last_error().await.unwrap().code(), Some(ErrorCode::ServerError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_timeout_fails_closed() {
        let remote = Arc::new(MockRemote::new());
        let _gate_tx = remote.session.push_gated();
        let gate = gate(&remote);

        assert_eq!(gate.check_session().await, AuthStatus::Unauthenticated);
        assert!(gate.last_error().await.unwrap().is_timeout());
    }

    #[tokio::test]
    async fn test_overlapping_checks_share_one_call() {
        let remote = Arc::new(MockRemote::new());
        let tx = remote.session.push_gated();
        let gate = gate(&remote);

        let first = tokio::spawn({
            let gate = gate.clone();
            async move { gate.check_session().await }
        });
        let second = tokio::spawn({
            let gate = gate.clone();
            async move { gate.check_session().await }
        });
        tokio::task::yield_now().await;
        assert!(gate.is_loading().await);

        tx.send(Ok(Some(session()))).unwrap();
        assert_eq!(first.await.unwrap(), AuthStatus::Authenticated);
        assert_eq!(second.await.unwrap(), AuthStatus::Authenticated);
        assert_eq!(remote.session.calls(), 1);
    }

    #[tokio::test]
    async fn test_logout_beats_in_flight_check() {
        let remote = Arc::new(MockRemote::new());
        let tx = remote.session.push_gated();
        remote.logout.push(Ok(()));
        let gate = gate(&remote);

        let check = tokio::spawn({
            let gate = gate.clone();
            async move { gate.check_session().await }
        });
        tokio::task::yield_now().await;

        gate.logout().await;
        tx.send(Ok(Some(session()))).unwrap();

        assert_eq!(check.await.unwrap(), AuthStatus::Unauthenticated);
        assert_eq!(gate.status().await, AuthStatus::Unauthenticated);
        assert_eq!(gate.session().await, None);
    }

    #[tokio::test]
    async fn test_check_settling_during_remote_logout_is_unauthenticated() {
        let remote = Arc::new(MockRemote::new());
        let check_tx = remote.session.push_gated();
        let logout_tx = remote.logout.push_gated();
        let gate = gate(&remote);

        let check = tokio::spawn({
            let gate = gate.clone();
            async move { gate.check_session().await }
        });
        tokio::task::yield_now().await;
        let logout = tokio::spawn({
            let gate = gate.clone();
            async move { gate.logout().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(gate.status().await, AuthStatus::Unauthenticated);

        check_tx.send(Ok(Some(session()))).unwrap();
        assert_eq!(check.await.unwrap(), AuthStatus::Unauthenticated);
        assert_eq!(gate.session().await, None);

        logout_tx.send(Ok(())).unwrap();
        logout.await.unwrap();
        assert_eq!(gate.status().await, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_clears_locally_when_remote_fails() {
        let remote = Arc::new(MockRemote::new());
        remote.session.push(Ok(Some(session())));
        remote.logout.push(Err(QuestError::transport("offline")));
        let gate = gate(&remote);
        gate.check_session().await;

        gate.logout().await;

        assert_eq!(gate.status().await, AuthStatus::Unauthenticated);
        assert_eq!(gate.session().await, None);
        assert_eq!(
            gate.route_decision(Route::Feed).await,
            RouteDecision::Redirect(Route::Register)
        );
    }

    #[tokio::test]
    async fn test_invalid_login_never_reaches_remote() {
        let remote = Arc::new(MockRemote::new());
        remote.session.push(Ok(None));
        let gate = gate(&remote);
        gate.check_session().await;

        let err = gate
            .login(LoginRequest {
                email: "not-an-email".to_string(),
                password: "longenough".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, QuestError::Validation(_)));
        assert_eq!(remote.login.calls(), 0);
        assert_eq!(gate.status().await, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_authenticates() {
        let remote = Arc::new(MockRemote::new());
        remote.login.push(Ok(session()));
        let gate = gate(&remote);

        gate.login(LoginRequest {
            email: "hero@example.com".to_string(),
            password: "longenough".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(gate.status().await, AuthStatus::Authenticated);
        assert_eq!(
            gate.route_decision(Route::Login).await,
            RouteDecision::Redirect(Route::Home)
        );
        assert_eq!(gate.route_decision(Route::Lobbies).await, RouteDecision::Allow);
    }

    #[test]
    fn test_route_table() {
        assert_eq!(decide(AuthStatus::Loading, Route::Login), RouteDecision::Wait);
        assert_eq!(
            decide(AuthStatus::Unauthenticated, Route::Register),
            RouteDecision::Allow
        );
        assert_eq!(
            decide(AuthStatus::Unauthenticated, Route::Journal),
            RouteDecision::Redirect(Route::Register)
        );
    }
}
