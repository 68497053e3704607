use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::InitError;

type SetupFuture<T> = Shared<BoxFuture<'static, Result<Arc<T>, InitError>>>;

enum InitState<T> {
    Idle,
    Pending { epoch: u64, setup: SetupFuture<T> },
    Ready(Arc<T>),
}

/// Lazily initializes a shared handle with single-flight semantics: no
/// matter how many callers arrive while setup is in flight, the factory
/// runs at most once, and every waiter resolves with the same result.
///
/// A failed attempt resets the state so the next caller triggers a fresh
/// setup; the initializer is never stuck in a broken pending state.
pub struct SingleFlight<T> {
    factory: Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>,
    state: Mutex<InitState<T>>,
    epoch: AtomicU64,
}

impl<T: Send + Sync + 'static> SingleFlight<T> {
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            factory: Box::new(move || factory().boxed()),
            state: Mutex::new(InitState::Idle),
            epoch: AtomicU64::new(0),
        }
    }

    /// Returns the shared handle, starting setup if none is in flight.
    pub async fn get(&self) -> Result<Arc<T>, InitError> {
        let (epoch, setup) = {
            let mut state = self.state.lock().unwrap();
            match &*state {
                InitState::Ready(handle) => return Ok(handle.clone()),
                InitState::Pending { epoch, setup } => (*epoch, setup.clone()),
                InitState::Idle => {
                    let epoch = self.epoch.fetch_add(1, Ordering::Relaxed);
                    let setup = (self.factory)()
                        .map(|res| res.map(Arc::new).map_err(InitError::new))
                        .boxed()
                        .shared();
                    *state = InitState::Pending {
                        epoch,
                        setup: setup.clone(),
                    };
                    (epoch, setup)
                }
            }
        };

        let result = setup.await;

        // First waiter back records the outcome. The epoch check keeps a
        // stale attempt from clobbering a newer one.
        let mut state = self.state.lock().unwrap();
        if let InitState::Pending { epoch: current, .. } = &*state {
            if *current == epoch {
                *state = match &result {
                    Ok(handle) => InitState::Ready(handle.clone()),
                    Err(_) => InitState::Idle,
                };
            }
        }
        result
    }

    /// Pure read of the current state, used by the health endpoint.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock().unwrap(), InitState::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_callers_share_one_setup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let flight = Arc::new(SingleFlight::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(42u32)
            }
        }));

        assert!(!flight.is_ready());

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let flight = flight.clone();
            tasks.push(tokio::spawn(async move { flight.get().await }));
        }
        for task in tasks {
            let handle = task.await.unwrap().unwrap();
            assert_eq!(*handle, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(flight.is_ready());

        // Once ready, further calls return the existing handle with no new work.
        let handle = flight.get().await.unwrap();
        assert_eq!(*handle, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_setup_is_shared_then_reset_for_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let flight = Arc::new(SingleFlight::new(move || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                if attempt == 0 {
                    Err(anyhow::anyhow!("bootstrap unreachable"))
                } else {
                    Ok(7u32)
                }
            }
        }));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let flight = flight.clone();
            tasks.push(tokio::spawn(async move { flight.get().await }));
        }
        for task in tasks {
            let result = task.await.unwrap();
            assert!(result.is_err());
        }

        // Every waiter observed the one failed attempt, and the state rolled
        // back so the next call runs a fresh setup.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!flight.is_ready());

        let handle = flight.get().await.unwrap();
        assert_eq!(*handle, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(flight.is_ready());
    }

    #[tokio::test]
    async fn failure_message_reaches_the_caller() {
        let flight: SingleFlight<u32> =
            SingleFlight::new(|| async { Err(anyhow::anyhow!("no route to host")) });

        let err = flight.get().await.unwrap_err();
        assert!(err.to_string().contains("no route to host"));
    }
}
