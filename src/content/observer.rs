use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::source::ContentSource;

/// Live subscription to a value derived from a [`ContentSource`].
///
/// Dropping the observation disconnects it.
pub struct Observation<T> {
    snapshot: watch::Receiver<T>,
    task: Option<JoinHandle<()>>,
}

/// Compute `derive` now and again after every mutation of `source`.
///
/// Must be called from within a tokio runtime. Mutations that arrive while a
/// recompute is running are coalesced into one further recompute.
pub fn observe<S, T, F>(source: Arc<S>, derive: F) -> Observation<T>
where
    S: ContentSource + ?Sized,
    T: Send + Sync + 'static,
    F: Fn(&S) -> T + Send + 'static,
{
    let mut mutations = source.mutations();
    mutations.borrow_and_update();

    let (tx, rx) = watch::channel(derive(&*source));

    let task = tokio::spawn(async move {
        while mutations.changed().await.is_ok() {
            if tx.send(derive(&*source)).is_err() {
                break;
            }
        }
    });

    Observation {
        snapshot: rx,
        task: Some(task),
    }
}

impl<T> Observation<T> {
    /// Latest derived value
    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.snapshot.borrow().clone()
    }

    /// Wait for the next recompute. Returns `false` once the observation has
    /// been disconnected.
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Disconnect from the source. The last snapshot stays readable.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for Observation<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
