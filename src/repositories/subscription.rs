use std::future::Future;

use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc,
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{models::posts::Post, Result};

use super::changes::ChangeEvent;

/// A standing live query. Every delivery is the complete, ordered result set.
///
/// Dropping the handle releases the query: the feeding task is aborted and no
/// further snapshot is delivered.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<Vec<Post>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<Vec<Post>>, task: Option<JoinHandle<()>>) -> Self {
        Self { receiver, task }
    }

    /// Delivers `refresh()` now and again after every change event.
    ///
    /// `changes` should be subscribed before calling, so a write landing
    /// between the subscribe and the first read still triggers a refresh.
    /// A lagged receiver re-reads once. A failed refresh is logged and skipped.
    /// The feed ends when the change channel closes.
    pub async fn refreshing<F, Fut>(
        mut changes: broadcast::Receiver<ChangeEvent>,
        buffer: usize,
        refresh: F,
    ) -> Result<Self>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<Post>>> + Send + 'static,
    {
        let initial = refresh().await?;

        let (sender, receiver) = mpsc::channel(buffer.max(1));
        // The receiver is still in hand, so this cannot fail.
        let _ = sender.send(initial).await;

        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) => debug!(
                        collection = %event.collection,
                        document_id = %event.document_id,
                        "collection changed"
                    ),
                    Err(RecvError::Lagged(missed)) => {
                        debug!(missed, "change subscriber lagged, re-reading")
                    }
                    Err(RecvError::Closed) => break,
                }

                let snapshot = match refresh().await {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        warn!(error = %err, "failed to refresh snapshot");
                        continue;
                    }
                };

                if sender.send(snapshot).await.is_err() {
                    debug!("subscription released");
                    break;
                }
            }
        });

        Ok(Self::new(receiver, Some(task)))
    }

    /// Waits for the next full snapshot; `None` once the source has gone away.
    pub async fn next_snapshot(&mut self) -> Option<Vec<Post>> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
