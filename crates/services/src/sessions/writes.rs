use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossword_core::Clock;
use crossword_core::model::{CrosswordId, GuessSnapshot, ProfileId, ProgressId, ProgressPatch};
use storage::cache::LocalCache;
use storage::repository::ProgressRepository;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One best-effort remote write of a progress row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressWrite {
    TimeSpent {
        id: ProgressId,
        secs: u32,
    },
    Expired {
        id: ProgressId,
        time_limit: u32,
    },
    Completed {
        id: ProgressId,
    },
    Answers {
        id: ProgressId,
        crossword_id: CrosswordId,
        profile_id: ProfileId,
        answers: String,
        cache_key: String,
    },
}

impl ProgressWrite {
    #[must_use]
    pub fn progress_id(&self) -> ProgressId {
        match self {
            ProgressWrite::TimeSpent { id, .. }
            | ProgressWrite::Expired { id, .. }
            | ProgressWrite::Completed { id }
            | ProgressWrite::Answers { id, .. } => *id,
        }
    }
}

enum QueueItem {
    Write(ProgressWrite),
    Flush(oneshot::Sender<()>),
}

/// Serializes progress writes on a background task.
///
/// Submitting never waits for the store. Failed writes are logged and
/// dropped; the next periodic flush carries newer state anyway.
pub struct WriteQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    pending: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl WriteQueue {
    /// Start the queue task on the current tokio runtime.
    #[must_use]
    pub fn spawn(
        progress: Arc<dyn ProgressRepository>,
        cache: Arc<dyn LocalCache>,
        clock: Clock,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let task = tokio::spawn(drain(rx, progress, cache, clock, Arc::clone(&pending)));
        Self { tx, pending, task }
    }

    pub fn submit(&self, write: ProgressWrite) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(item)) = self.tx.send(QueueItem::Write(write)) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            if let QueueItem::Write(write) = item {
                warn!(progress_id = %write.progress_id(), "write queue closed, dropping write");
            }
        }
    }

    /// Writes submitted but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until every write submitted before this call has finished.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(QueueItem::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Finish outstanding writes and stop the task.
    pub async fn shutdown(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!(error = %e, "write queue task ended abnormally");
        }
    }
}

async fn drain(
    mut rx: mpsc::UnboundedReceiver<QueueItem>,
    progress: Arc<dyn ProgressRepository>,
    cache: Arc<dyn LocalCache>,
    clock: Clock,
    pending: Arc<AtomicUsize>,
) {
    while let Some(item) = rx.recv().await {
        match item {
            QueueItem::Write(write) => {
                apply(&write, progress.as_ref(), cache.as_ref(), clock).await;
                pending.fetch_sub(1, Ordering::SeqCst);
            }
            QueueItem::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn apply(
    write: &ProgressWrite,
    progress: &dyn ProgressRepository,
    cache: &dyn LocalCache,
    clock: Clock,
) {
    let now = clock.now();
    let result = match write {
        ProgressWrite::TimeSpent { id, secs } => {
            progress
                .update_progress(*id, ProgressPatch::time_spent(*secs), now)
                .await
        }
        ProgressWrite::Expired { id, time_limit } => {
            progress
                .update_progress(*id, ProgressPatch::expired(*time_limit), now)
                .await
        }
        ProgressWrite::Completed { id } => {
            progress
                .update_progress(*id, ProgressPatch::completed(), now)
                .await
        }
        ProgressWrite::Answers {
            id,
            crossword_id,
            profile_id,
            answers,
            cache_key,
        } => progress
            .upsert_answers(*id, *crossword_id, *profile_id, answers, now)
            .await
            .map(|stored| {
                let normalized = stored
                    .current_answers
                    .as_deref()
                    .and_then(GuessSnapshot::parse)
                    .and_then(|snapshot| snapshot.to_json().ok());
                match normalized {
                    Some(json) => {
                        if let Err(e) = cache.set(cache_key, &json) {
                            warn!(progress_id = %id, error = %e, "failed to restage saved answers");
                        }
                    }
                    None => debug!(progress_id = %id, "saved answers unrecognized, cache left as is"),
                }
            }),
    };

    if let Err(e) = result {
        warn!(progress_id = %write.progress_id(), error = %e, ?write, "progress write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossword_core::time::{fixed_clock, fixed_now};
    use storage::cache::MemoryCache;
    use storage::repository::{InMemoryRepository, ProgressRepository};

    #[tokio::test]
    async fn writes_land_in_submission_order() {
        let repo = InMemoryRepository::new();
        let cache = Arc::new(MemoryCache::new());
        let profile = ProfileId::random();
        let crossword = CrosswordId::new(1);
        let id = repo.create_default(crossword, profile, fixed_now()).await.unwrap();

        let queue = WriteQueue::spawn(Arc::new(repo.clone()), cache.clone(), fixed_clock());
        queue.submit(ProgressWrite::TimeSpent { id, secs: 5 });
        queue.submit(ProgressWrite::TimeSpent { id, secs: 10 });
        queue.submit(ProgressWrite::Completed { id });
        queue.flush().await;
        assert_eq!(queue.pending(), 0);

        let patches: Vec<_> = repo.patch_log().unwrap().into_iter().map(|(_, p)| p).collect();
        assert_eq!(
            patches,
            vec![
                ProgressPatch::time_spent(5),
                ProgressPatch::time_spent(10),
                ProgressPatch::completed()
            ]
        );
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn saved_answers_are_restaged_only_when_recognizable() {
        let repo = InMemoryRepository::new();
        let cache = Arc::new(MemoryCache::new());
        let profile = ProfileId::random();
        let crossword = CrosswordId::new(1);
        let id = repo.create_default(crossword, profile, fixed_now()).await.unwrap();
        let queue = WriteQueue::spawn(Arc::new(repo.clone()), cache.clone(), fixed_clock());

        queue.submit(ProgressWrite::Answers {
            id,
            crossword_id: crossword,
            profile_id: profile,
            answers: r#"{"guesses":{"0_0":"S"}}"#.into(),
            cache_key: "k".into(),
        });
        queue.flush().await;
        assert_eq!(
            cache.get("k").unwrap().as_deref(),
            Some(r#"{"date":0,"guesses":{"0_0":"S"}}"#)
        );

        cache.set("k", "local").unwrap();
        queue.submit(ProgressWrite::Answers {
            id,
            crossword_id: crossword,
            profile_id: profile,
            answers: "garbage".into(),
            cache_key: "k".into(),
        });
        queue.shutdown().await;
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn failed_writes_are_dropped() {
        let repo = InMemoryRepository::new();
        let queue = WriteQueue::spawn(
            Arc::new(repo.clone()),
            Arc::new(MemoryCache::new()),
            fixed_clock(),
        );
        queue.submit(ProgressWrite::Completed {
            id: ProgressId::new(404),
        });
        queue.flush().await;
        assert_eq!(queue.pending(), 0);
        assert_eq!(repo.patch_log().unwrap().len(), 1);
        queue.shutdown().await;
    }
}
