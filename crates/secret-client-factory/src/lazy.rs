//! Lazily initialized downstream client.

use crate::{ClientInitError, SecretRef, SecretStore};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type BuildFn<C> = Arc<dyn Fn(&str) -> Result<C, String> + Send + Sync>;

type InitAttempt<C> = Shared<BoxFuture<'static, Result<Arc<C>, ClientInitError>>>;

/// Builds a client from a stored credential on first use and caches it.
pub struct LazyClient<C> {
    store: Arc<dyn SecretStore>,
    secret: SecretRef,
    build: BuildFn<C>,
    cell: OnceCell<Arc<C>>,
    in_flight: Mutex<Option<InitAttempt<C>>>,
}

impl<C: Send + Sync + 'static> LazyClient<C> {
    /// `build` receives the credential with surrounding whitespace removed.
    pub fn new<F>(store: Arc<dyn SecretStore>, secret: SecretRef, build: F) -> Self
    where
        F: Fn(&str) -> Result<C, String> + Send + Sync + 'static,
    {
        Self {
            store,
            secret,
            build: Arc::new(build),
            cell: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    /// Return the cached client, initializing it if this is the first call.
    ///
    /// At most one initialization is in flight. Callers arriving while it
    /// runs await the same attempt and all receive its outcome, success or
    /// failure. A failed attempt is forgotten once it settles.
    pub async fn get(&self) -> Result<Arc<C>, ClientInitError> {
        if let Some(client) = self.cell.get() {
            return Ok(Arc::clone(client));
        }

        let attempt = {
            let mut in_flight = self.in_flight.lock();
            if let Some(client) = self.cell.get() {
                return Ok(Arc::clone(client));
            }
            match in_flight.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = self.start_attempt();
                    *in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };

        let result = attempt.clone().await;

        let mut in_flight = self.in_flight.lock();
        if let Ok(client) = &result {
            // Only the first settle stores; the rest see the same Arc.
            let _ = self.cell.set(Arc::clone(client));
        }
        if in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&attempt))
        {
            *in_flight = None;
        }
        result
    }

    /// Whether a client has been built.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    fn start_attempt(&self) -> InitAttempt<C> {
        let store = Arc::clone(&self.store);
        let secret = self.secret.clone();
        let build = Arc::clone(&self.build);
        async move { initialize(store.as_ref(), &secret, build.as_ref()).await }
            .boxed()
            .shared()
    }
}

async fn initialize<C>(
    store: &dyn SecretStore,
    secret: &SecretRef,
    build: &(dyn Fn(&str) -> Result<C, String> + Send + Sync),
) -> Result<Arc<C>, ClientInitError> {
    debug!(secret = %secret, "Initializing downstream client");
    let raw = store.access_latest(secret).await.map_err(|e| {
        warn!(secret = %secret, error = %e, "Secret fetch failed");
        ClientInitError::from(e)
    })?;

    let credential = raw.trim();
    if credential.is_empty() {
        return Err(ClientInitError::EmptySecret(secret.to_string()));
    }

    let client = build(credential).map_err(ClientInitError::Build)?;
    info!(secret = %secret, "Downstream client initialized");
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SecretError, SecretResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory store counting fetches; fails the first `fail_first` calls.
    struct CountingStore {
        value: String,
        fetches: AtomicUsize,
        fail_first: usize,
        delay: Duration,
    }

    impl CountingStore {
        fn new(value: &str) -> Self {
            Self {
                value: value.to_string(),
                fetches: AtomicUsize::new(0),
                fail_first: 0,
                delay: Duration::ZERO,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        async fn access_latest(&self, secret: &SecretRef) -> SecretResult<String> {
            let call = self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call < self.fail_first {
                return Err(SecretError::Status {
                    status: 503,
                    secret: secret.to_string(),
                });
            }
            Ok(self.value.clone())
        }
    }

    #[derive(Debug)]
    struct ApiClient {
        key: String,
    }

    fn secret() -> SecretRef {
        SecretRef::new("bots-prod", "image-api-key")
    }

    fn lazy(store: Arc<CountingStore>) -> LazyClient<ApiClient> {
        LazyClient::new(store, secret(), |key| {
            Ok(ApiClient {
                key: key.to_string(),
            })
        })
    }

    #[tokio::test]
    async fn first_call_fetches_and_trims() {
        let store = Arc::new(CountingStore::new("  sk-live-123 \n"));
        let client = lazy(store.clone());
        assert!(!client.is_initialized());

        let built = client.get().await.unwrap();
        assert_eq!(built.key, "sk-live-123");
        assert!(client.is_initialized());
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test]
    async fn later_calls_reuse_cached_client() {
        let store = Arc::new(CountingStore::new("sk"));
        let client = lazy(store.clone());

        let first = client.get().await.unwrap();
        let second = client.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_share_one_fetch() {
        let mut store = CountingStore::new("sk");
        store.delay = Duration::from_millis(50);
        let store = Arc::new(store);
        let client = Arc::new(lazy(store.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get().await.unwrap() })
            })
            .collect();

        let mut clients = Vec::new();
        for handle in handles {
            clients.push(handle.await.unwrap());
        }

        assert_eq!(store.fetches(), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let mut store = CountingStore::new("sk");
        store.fail_first = 1;
        let store = Arc::new(store);
        let client = lazy(store.clone());

        let err = client.get().await.unwrap_err();
        assert!(matches!(
            err,
            ClientInitError::Secret(ref e) if matches!(**e, SecretError::Status { status: 503, .. })
        ));
        assert!(!client.is_initialized());

        let built = client.get().await.unwrap();
        assert_eq!(built.key, "sk");
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_a_failed_attempt() {
        let mut store = CountingStore::new("sk");
        store.fail_first = 1;
        store.delay = Duration::from_secs(10);
        let store = Arc::new(store);
        let client = Arc::new(lazy(store.clone()));
        let started = tokio::time::Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get().await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, ClientInitError::Secret(_)));
        }
        assert_eq!(store.fetches(), 1);
        assert!(started.elapsed() < Duration::from_secs(20));
        assert!(!client.is_initialized());

        let built = client.get().await.unwrap();
        assert_eq!(built.key, "sk");
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test]
    async fn blank_secret_is_an_error() {
        let store = Arc::new(CountingStore::new(" \n\t"));
        let client = lazy(store.clone());
        assert!(matches!(
            client.get().await.unwrap_err(),
            ClientInitError::EmptySecret(_)
        ));
    }

    #[tokio::test]
    async fn build_failure_is_reported_and_retried() {
        let store = Arc::new(CountingStore::new("sk"));
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let client: LazyClient<ApiClient> = LazyClient::new(store.clone(), secret(), move |key| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("tls backend unavailable".to_string())
            } else {
                Ok(ApiClient {
                    key: key.to_string(),
                })
            }
        });

        assert!(matches!(client.get().await, Err(ClientInitError::Build(_))));
        assert!(client.get().await.is_ok());
        assert_eq!(store.fetches(), 2);
    }
}
