//! The session store: single owner of the principal and its persisted copy.
//!
//! All mutations go through [`SessionState::apply`]. Predicates only read the
//! in-memory state and never touch storage or the network.

use super::{
    authenticator::Authenticator,
    errors::{AuthError, HydrationError},
    machine::{SessionEvent, SessionState},
    principal::{Principal, PrincipalError, Role},
    storage::SessionStorage,
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    sync::{
        PoisonError, RwLock, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{sync::watch, time::timeout};
use tracing::{debug, info, instrument, warn};

/// Upper bound for the credential exchange inside `login`.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SessionStore<A, S> {
    authenticator: A,
    storage: S,
    state: RwLock<SessionState>,
    ready: watch::Sender<bool>,
    login_in_flight: AtomicBool,
    login_timeout: Duration,
}

/// Clears the re-entrancy flag when a login settles, including on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: Authenticator, S: SessionStorage> SessionStore<A, S> {
    #[must_use]
    pub fn new(authenticator: A, storage: S) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            authenticator,
            storage,
            state: RwLock::new(SessionState::Pending),
            ready,
            login_in_flight: AtomicBool::new(false),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_login_timeout(mut self, login_timeout: Duration) -> Self {
        self.login_timeout = login_timeout;
        self
    }

    /// Restores the session from storage. Never fails: unreadable or corrupt
    /// data resolves to "no session". Once the store is ready this is a no-op.
    pub fn hydrate(&self) {
        if self.is_ready() {
            debug!("session already hydrated");
            return;
        }

        let principal = match self.read_persisted() {
            Ok(Some(principal)) => {
                info!(
                    username = %principal.username,
                    role = %principal.role,
                    "session restored from storage"
                );
                Some(principal)
            }
            Ok(None) => {
                info!("no persisted session");
                None
            }
            Err(HydrationError::Corrupt(err)) => {
                warn!("discarding corrupt persisted session: {err}");
                if let Err(err) = self.storage.remove() {
                    warn!("failed to clear corrupt session slot: {err}");
                }
                None
            }
            Err(err) => {
                warn!("treating session as logged out: {err}");
                None
            }
        };

        self.dispatch(SessionEvent::Hydrated(principal));
    }

    fn read_persisted(&self) -> Result<Option<Principal>, HydrationError> {
        let Some(raw) = self.storage.get()? else {
            return Ok(None);
        };
        Ok(Some(Principal::from_json(&raw)?))
    }

    /// Resolves once hydration has completed (or a login/logout made the
    /// session known).
    pub async fn wait_until_ready(&self) {
        let mut ready = self.ready.subscribe();
        // the sender lives as long as `self`, so this only ends once ready
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Exchanges credentials for a principal and commits it to storage, then
    /// memory. On any failure the in-memory principal is cleared, storage is
    /// left as it was, and the error is returned. A call rejected because
    /// another login is running counts as a failure too.
    ///
    /// # Errors
    /// Returns an error if the credentials are rejected, the backend cannot be
    /// reached in time, the response is malformed, the session cannot be
    /// persisted, or another login is still running.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError> {
        if self.login_in_flight.swap(true, Ordering::AcqRel) {
            warn!("login rejected: another login is in progress");
            self.dispatch(SessionEvent::LoginFailure);
            return Err(AuthError::LoginInProgress);
        }
        let _in_flight = InFlight(&self.login_in_flight);

        let outcome = match self.exchange(username, password).await {
            Ok((principal, serialized)) => self.persist(principal, &serialized),
            Err(err) => {
                self.dispatch(SessionEvent::LoginFailure);
                Err(err)
            }
        };

        match &outcome {
            Ok(principal) => info!(
                id = principal.id,
                username = %principal.username,
                role = %principal.role,
                "login successful"
            ),
            Err(err) => warn!("login failed: {err}"),
        }
        outcome
    }

    /// Login for the administration console: only an `ADMIN` principal is
    /// kept. Any other role is logged out again right away.
    ///
    /// # Errors
    /// Returns the same errors as [`SessionStore::login`], or
    /// [`AuthError::NotAdmin`] when the credentials belong to another role.
    pub async fn login_as_admin(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError> {
        let principal = self.login(username, password).await?;
        if principal.role == Role::Admin {
            return Ok(principal);
        }

        warn!(
            username = %principal.username,
            role = %principal.role,
            "admin login refused for non-admin role"
        );
        self.logout();
        Err(AuthError::NotAdmin)
    }

    async fn exchange(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(Principal, String), AuthError> {
        let principal = timeout(
            self.login_timeout,
            self.authenticator.authenticate(username, password),
        )
        .await
        .map_err(|_| AuthError::Timeout(self.login_timeout))??;

        principal.validate().map_err(PrincipalError::from)?;
        let serialized = principal.to_json().map_err(PrincipalError::from)?;

        Ok((principal, serialized))
    }

    /// Writes the slot and commits memory under one state lock, so a
    /// concurrent logout observes either both or neither.
    fn persist(&self, principal: Principal, serialized: &str) -> Result<Principal, AuthError> {
        let mut state = self.write_state();
        match self.storage.set(serialized) {
            Ok(()) => {
                self.commit(&mut state, SessionEvent::LoginSuccess(principal.clone()));
                Ok(principal)
            }
            Err(err) => {
                self.commit(&mut state, SessionEvent::LoginFailure);
                Err(err.into())
            }
        }
    }

    /// Clears storage and memory. Never fails.
    pub fn logout(&self) {
        let username = {
            let mut state = self.write_state();
            let username = state.principal().map(|principal| principal.username.clone());
            if let Err(err) = self.storage.remove() {
                warn!("failed to clear persisted session: {err}");
            }
            self.commit(&mut state, SessionEvent::Logout);
            username
        };

        info!(username = username.as_deref().unwrap_or("-"), "logged out");
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.read_state(SessionState::is_ready)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read_state(|state| state.principal().is_some())
    }

    /// Case-insensitive role check; false without a principal.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.read_state(|state| {
            state
                .principal()
                .is_some_and(|principal| principal.has_role(role))
        })
    }

    #[must_use]
    pub fn current_principal(&self) -> Option<Principal> {
        self.read_state(|state| state.principal().cloned())
    }

    /// Token for the `Authorization: Bearer` header of outgoing requests.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.read_state(|state| {
            state
                .principal()
                .map(|principal| SecretString::from(principal.token.expose_secret().to_string()))
        })
    }

    fn read_state<T>(&self, read: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        read(&state)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, event: SessionEvent) {
        let mut state = self.write_state();
        self.commit(&mut state, event);
    }

    /// Applies `event` to a state the caller holds the write lock on.
    fn commit(&self, state: &mut SessionState, event: SessionEvent) {
        let name = event.name();
        *state = std::mem::take(state).apply(event);
        let ready = state.is_ready();
        self.ready.send_replace(ready);
        debug!(event = name, ready, "session event applied");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        api::ApiError,
        session::storage::{MemoryStorage, StorageError},
    };
    use async_trait::async_trait;
    use std::{
        io,
        path::PathBuf,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    enum Script {
        Succeed(Principal),
        Reject(&'static str),
        Hang,
    }

    struct FakeAuthenticator {
        script: Script,
        calls: AtomicUsize,
    }

    impl FakeAuthenticator {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Authenticator for FakeAuthenticator {
        async fn authenticate(
            &self,
            _username: &str,
            _password: &SecretString,
        ) -> Result<Principal, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Succeed(principal) => Ok(principal.clone()),
                Script::Reject(message) => Err(AuthError::Api(ApiError::Http {
                    status: 401,
                    message: (*message).to_string(),
                })),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(AuthError::LoginInProgress)
                }
            }
        }
    }

    /// Storage that lingers after each write, flagging that the slot is set.
    #[derive(Default)]
    struct LingeringStorage {
        slot: MemoryStorage,
        written: AtomicBool,
    }

    impl SessionStorage for LingeringStorage {
        fn get(&self) -> Result<Option<String>, StorageError> {
            self.slot.get()
        }

        fn set(&self, value: &str) -> Result<(), StorageError> {
            self.slot.set(value)?;
            self.written.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            Ok(())
        }

        fn remove(&self) -> Result<(), StorageError> {
            self.slot.remove()
        }
    }

    /// Storage whose writes and removals always fail.
    struct BrokenStorage(Option<String>);

    impl SessionStorage for BrokenStorage {
        fn get(&self) -> Result<Option<String>, StorageError> {
            Ok(self.0.clone())
        }

        fn set(&self, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                path: PathBuf::from("/broken"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&self) -> Result<(), StorageError> {
            Err(StorageError::Io {
                path: PathBuf::from("/broken"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn principal(role: Role) -> Principal {
        Principal::new(42, "alice", role, SecretString::from("jwt-42".to_string()))
    }

    fn password() -> SecretString {
        SecretString::from("Secret1!".to_string())
    }

    fn store(
        script: Script,
        storage: Arc<MemoryStorage>,
    ) -> SessionStore<FakeAuthenticator, Arc<MemoryStorage>> {
        SessionStore::new(FakeAuthenticator::new(script), storage)
    }

    #[test]
    fn hydrate_with_empty_slot_is_ready_and_anonymous() {
        let store = store(Script::Reject("no"), Arc::new(MemoryStorage::default()));
        assert!(!store.is_ready());
        store.hydrate();
        assert!(store.is_ready());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn hydrate_restores_a_valid_session() {
        let storage = Arc::new(MemoryStorage::with_value(
            principal(Role::Employee).to_json().unwrap(),
        ));
        let store = store(Script::Reject("no"), storage);
        store.hydrate();
        assert!(store.is_authenticated());
        assert!(store.has_role("employee"));
        assert_eq!(store.current_principal(), Some(principal(Role::Employee)));
    }

    #[test]
    fn hydrate_discards_malformed_data() {
        let cases = [
            "",
            "{",
            "[]",
            r#"{"id":1,"role":"ADMIN","token":"t"}"#,
            r#"{"id":1,"username":"a","token":"t"}"#,
            r#"{"id":1,"username":"a","role":"GOD","token":"t"}"#,
        ];
        for raw in cases {
            let storage = Arc::new(MemoryStorage::with_value(raw));
            let store = store(Script::Reject("no"), Arc::clone(&storage));
            store.hydrate();
            assert!(store.is_ready(), "not ready for {raw:?}");
            assert!(!store.is_authenticated(), "authenticated for {raw:?}");
            assert_eq!(storage.snapshot(), None, "corrupt slot kept for {raw:?}");
        }
    }

    #[test]
    fn lowercase_persisted_role_satisfies_uppercase_check() {
        let raw = r#"{"id":1,"username":"root","role":"admin","token":"t"}"#;
        let store = store(Script::Reject("no"), Arc::new(MemoryStorage::with_value(raw)));
        store.hydrate();
        assert!(store.has_role("ADMIN"));
    }

    #[test]
    fn hydrate_twice_keeps_the_first_outcome() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(Script::Reject("no"), Arc::clone(&storage));
        store.hydrate();
        storage.set(&principal(Role::Admin).to_json().unwrap()).unwrap();
        store.hydrate();
        assert!(store.is_ready());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn login_success_commits_memory_and_storage() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(Script::Succeed(principal(Role::Admin)), Arc::clone(&storage));
        store.hydrate();

        let returned = store.login("alice", &password()).await.unwrap();

        assert!(store.is_authenticated());
        assert!(store.has_role(returned.role.as_str()));
        let persisted = Principal::from_json(&storage.snapshot().unwrap()).unwrap();
        assert_eq!(persisted, returned);
        assert_eq!(
            store.bearer_token().map(|token| token.expose_secret().to_string()),
            Some("jwt-42".to_string())
        );
    }

    #[tokio::test]
    async fn login_failure_clears_memory_and_keeps_storage() {
        let previous = principal(Role::Employee).to_json().unwrap();
        let storage = Arc::new(MemoryStorage::with_value(previous.clone()));
        let store = store(Script::Reject("Authentication failed: Bad credentials"), Arc::clone(&storage));
        store.hydrate();
        assert!(store.is_authenticated());

        let err = store.login("alice", &password()).await.unwrap_err();

        assert_eq!(err.user_message(), "Authentication failed: Bad credentials");
        assert!(!store.is_authenticated());
        assert_eq!(storage.snapshot(), Some(previous));
    }

    #[tokio::test]
    async fn login_storage_failure_is_a_login_failure() {
        let store = SessionStore::new(
            FakeAuthenticator::new(Script::Succeed(principal(Role::Admin))),
            BrokenStorage(None),
        );
        store.hydrate();

        let err = store.login("alice", &password()).await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)), "{err:?}");
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn login_times_out_without_partial_state() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(Script::Hang, Arc::clone(&storage))
            .with_login_timeout(Duration::from_millis(50));
        store.hydrate();

        let err = store.login("alice", &password()).await.unwrap_err();
        assert!(matches!(err, AuthError::Timeout(_)), "{err:?}");
        assert!(!store.is_authenticated());
        assert_eq!(storage.snapshot(), None);
    }

    #[tokio::test]
    async fn overlapping_login_is_rejected() {
        let store = store(Script::Hang, Arc::new(MemoryStorage::default()))
            .with_login_timeout(Duration::from_millis(200));
        store.hydrate();

        let pw = password();
        let (first, second) = tokio::join!(store.login("alice", &pw), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.login("alice", &pw).await
        });

        assert!(matches!(first, Err(AuthError::Timeout(_))));
        assert!(matches!(second, Err(AuthError::LoginInProgress)));
        assert_eq!(store.authenticator.calls.load(Ordering::SeqCst), 1);

        // the flag is released once the first attempt settles
        let third = store.login("alice", &password()).await;
        assert!(matches!(third, Err(AuthError::Timeout(_))));
    }

    #[tokio::test]
    async fn rejected_overlapping_login_clears_memory() {
        let previous = principal(Role::Employee).to_json().unwrap();
        let storage = Arc::new(MemoryStorage::with_value(previous.clone()));
        let store = store(Script::Hang, Arc::clone(&storage))
            .with_login_timeout(Duration::from_millis(200));
        store.hydrate();
        assert!(store.is_authenticated());

        let pw = password();
        let (first, (second, authenticated_after_rejection)) =
            tokio::join!(store.login("alice", &pw), async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let second = store.login("alice", &pw).await;
                (second, store.is_authenticated())
            });

        assert!(matches!(second, Err(AuthError::LoginInProgress)));
        assert!(!authenticated_after_rejection);
        assert!(matches!(first, Err(AuthError::Timeout(_))));
        assert!(!store.is_authenticated());
        assert_eq!(storage.snapshot(), Some(previous));
    }

    #[tokio::test]
    async fn admin_login_keeps_an_admin() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(Script::Succeed(principal(Role::Admin)), Arc::clone(&storage));
        store.hydrate();

        let admin = store.login_as_admin("alice", &password()).await.unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert!(store.has_role("ADMIN"));
        assert!(storage.snapshot().is_some());
    }

    #[tokio::test]
    async fn admin_login_refuses_other_roles() {
        for role in [Role::Employee, Role::Hr, Role::Pending] {
            let storage = Arc::new(MemoryStorage::default());
            let store = store(Script::Succeed(principal(role)), Arc::clone(&storage));
            store.hydrate();

            let err = store.login_as_admin("alice", &password()).await.unwrap_err();

            assert!(matches!(err, AuthError::NotAdmin), "{role}: {err:?}");
            assert_eq!(
                err.user_message(),
                "Access Denied: You are not authorized as an Admin."
            );
            assert!(!store.is_authenticated(), "{role} kept in memory");
            assert_eq!(storage.snapshot(), None, "{role} kept in storage");
        }
    }

    #[tokio::test]
    async fn admin_login_passes_backend_rejection_through() {
        let store = store(
            Script::Reject("Authentication failed: Bad credentials"),
            Arc::new(MemoryStorage::default()),
        );
        store.hydrate();

        let err = store.login_as_admin("alice", &password()).await.unwrap_err();
        assert_eq!(err.user_message(), "Authentication failed: Bad credentials");
    }

    #[tokio::test]
    async fn logout_during_slot_write_leaves_memory_and_storage_agreeing() {
        let storage = Arc::new(LingeringStorage::default());
        let store = Arc::new(SessionStore::new(
            FakeAuthenticator::new(Script::Succeed(principal(Role::Admin))),
            Arc::clone(&storage),
        ));
        store.hydrate();

        let logout = {
            let store = Arc::clone(&store);
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                while !storage.written.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(1));
                }
                store.logout();
            })
        };

        store.login("alice", &password()).await.unwrap();
        logout.join().unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(storage.slot.snapshot(), None);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let storage = Arc::new(MemoryStorage::default());
        let store = store(Script::Succeed(principal(Role::Hr)), Arc::clone(&storage));
        store.hydrate();
        store.login("alice", &password()).await.unwrap();

        store.logout();

        assert!(!store.is_authenticated());
        assert!(!store.has_role("HR"));
        assert_eq!(storage.snapshot(), None);
        assert!(store.bearer_token().is_none());
    }

    #[test]
    fn logout_never_fails_even_with_broken_storage() {
        let store = SessionStore::new(
            FakeAuthenticator::new(Script::Reject("no")),
            BrokenStorage(None),
        );
        store.logout();
        assert!(store.is_ready());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn has_role_is_false_without_principal() {
        let store = store(Script::Reject("no"), Arc::new(MemoryStorage::default()));
        store.hydrate();
        for role in Role::ALL {
            assert!(!store.has_role(role.as_str()));
        }
    }

    #[tokio::test]
    async fn wait_until_ready_resolves_after_hydrate() {
        let store = Arc::new(store(Script::Reject("no"), Arc::new(MemoryStorage::default())));
        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store.wait_until_ready().await;
                store.is_ready()
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.hydrate();
        let ready = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(ready);
    }
}
