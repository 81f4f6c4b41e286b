//! Poll-and-replace refresh loop.
//!
//! A poller re-fetches one document on a fixed interval and overwrites the
//! shared snapshot with whatever came back. Subscribers are woken only when
//! the fetched value differs from the previous snapshot. A failed fetch with
//! no cached copy leaves the snapshot alone.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::blob::Collection;
use crate::error::StoreError;

pub struct Poller;

impl Poller {
    /// Start polling `collection` every `interval` until `cancel` fires.
    ///
    /// The first fetch happens immediately. Must be called inside a tokio
    /// runtime.
    pub fn spawn<T>(
        collection: Collection<T>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> PollHandle<T>
    where
        T: Serialize + DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
    {
        let (tx, _rx) = watch::channel(collection.default_value());
        let tx = Arc::new(tx);

        let task = {
            let collection = collection.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                tracing::debug!("Polling {} every {:?}", collection.key(), interval);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            if refresh(&collection, &tx).await {
                                tracing::debug!("{} changed", collection.key());
                            }
                        }
                    }
                }
                tracing::debug!("Stopped polling {}", collection.key());
            })
        };

        PollHandle {
            collection,
            tx,
            cancel,
            task,
        }
    }
}

/// Fetch once and overwrite the snapshot; report whether it changed.
async fn refresh<T>(collection: &Collection<T>, tx: &watch::Sender<T>) -> bool
where
    T: Serialize + DeserializeOwned + PartialEq,
{
    match collection.try_get().await {
        Ok(fresh) => replace(tx, fresh),
        Err(e) => {
            tracing::warn!("Keeping last snapshot of {}: {}", collection.key(), e);
            false
        }
    }
}

/// Overwrite the snapshot; report whether it changed.
fn replace<T: PartialEq>(tx: &watch::Sender<T>, fresh: T) -> bool {
    tx.send_if_modified(|current| {
        let changed = *current != fresh;
        *current = fresh;
        changed
    })
}

pub struct PollHandle<T> {
    collection: Collection<T>,
    tx: Arc<watch::Sender<T>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<T> PollHandle<T>
where
    T: Serialize + DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
{
    /// Latest snapshot.
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that wakes whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Fetch immediately instead of waiting for the next tick.
    ///
    /// Returns the snapshot, which is unchanged when the fetch failed.
    pub async fn refresh_now(&self) -> T {
        refresh(&self.collection, &self.tx).await;
        self.current()
    }

    /// Overwrite the snapshot without saving; returns whether it changed.
    pub fn replace(&self, value: T) -> bool {
        replace(&self.tx, value)
    }

    /// Save `value` and show it locally right away, ahead of the next poll.
    ///
    /// # Errors
    /// The save failure. The local snapshot is replaced either way.
    pub async fn publish(&self, value: T) -> Result<(), StoreError> {
        let result = self.collection.save(&value).await;
        replace(&self.tx, value);
        result
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling and wait for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Poller for {} ended abnormally: {}", self.collection.key(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobStore;
    use crate::remote::RemoteStore;
    use crate::retry::RetryConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn numbers(store: &BlobStore) -> Collection<Vec<u32>> {
        Collection::new(store.clone(), "numbers", Vec::new)
    }

    #[tokio::test]
    async fn test_initial_fetch_replaces_default() {
        let store = BlobStore::memory();
        numbers(&store).save(&vec![1]).await.unwrap();

        let handle = Poller::spawn(numbers(&store), Duration::from_millis(20), CancellationToken::new());

        tokio::time::timeout(Duration::from_secs(2), async {
            while handle.current() != vec![1] {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_remote_write_is_picked_up() {
        let store = BlobStore::memory();
        let handle = Poller::spawn(numbers(&store), Duration::from_millis(20), CancellationToken::new());
        let mut rx = handle.subscribe();

        numbers(&store).save(&vec![5, 6]).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                rx.changed().await.unwrap();
                if *rx.borrow() == vec![5, 6] {
                    break;
                }
            }
        })
        .await
        .unwrap();
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_publish_is_visible_immediately() {
        let store = BlobStore::memory();
        let handle = Poller::spawn(numbers(&store), Duration::from_secs(60), CancellationToken::new());

        handle.publish(vec![42]).await.unwrap();
        assert_eq!(handle.current(), vec![42]);
        assert_eq!(numbers(&store).get().await, vec![42]);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_refresh_now() {
        let store = BlobStore::memory();
        let handle = Poller::spawn(numbers(&store), Duration::from_secs(60), CancellationToken::new());

        numbers(&store).save(&vec![3]).await.unwrap();
        assert_eq!(handle.refresh_now().await, vec![3]);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_snapshot() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/board_numbers"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1,2]"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/board_numbers"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let remote = RemoteStore::new(&mock_server.uri(), "board", RetryConfig::none(), Duration::from_secs(5)).unwrap();
        let store = BlobStore::remote(remote);
        let handle = Poller::spawn(numbers(&store), Duration::from_millis(20), CancellationToken::new());

        tokio::time::timeout(Duration::from_secs(2), async {
            while handle.current() != vec![1, 2] {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.current(), vec![1, 2]);
        assert_eq!(handle.refresh_now().await, vec![1, 2]);

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests.len() > 2);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_cancel_stops_task() {
        let store = BlobStore::memory();
        let cancel = CancellationToken::new();
        let handle = Poller::spawn(numbers(&store), Duration::from_millis(10), cancel.clone());

        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_running());
    }

    #[test]
    fn test_replace_reports_change() {
        let (tx, _rx) = watch::channel(vec![1u32]);
        assert!(!replace(&tx, vec![1]));
        assert!(replace(&tx, vec![2]));
        assert_eq!(*tx.borrow(), vec![2]);
    }
}
