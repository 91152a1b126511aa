use std::sync::Arc;
use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::{
    config::PollSettings,
    error::AppResult,
    generation::registry::ProviderRegistry,
};
use domain::generation::{GenerationTask, ImageProvider, TaskId, TaskStatus};

/// Poll-on-demand task lifecycle. Each caller request triggers exactly
/// one provider poll; there is no background loop. Task records live
/// in-process for the polling window only.
pub struct TaskPoller {
    providers: Arc<ProviderRegistry>,
    tasks: DashMap<TaskId, GenerationTask>,
    settings: PollSettings,
}

impl TaskPoller {
    pub fn new(providers: Arc<ProviderRegistry>, settings: PollSettings) -> Arc<Self> {
        Arc::new(Self {
            providers,
            tasks: DashMap::new(),
            settings,
        })
    }

    /// Registers a freshly submitted task so the timeout clock starts
    /// at submission, not at the first status query.
    pub fn track(&self, task: GenerationTask) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    #[instrument(skip(self))]
    pub async fn poll(
        &self,
        provider: ImageProvider,
        task_id: &TaskId,
    ) -> AppResult<GenerationTask> {
        let now = OffsetDateTime::now_utc();
        self.evict_expired(now);

        // Tasks unseen by this process (e.g. after a restart) are
        // adopted with a fresh timeout window.
        let snapshot = self
            .tasks
            .entry(task_id.clone())
            .or_insert_with(|| GenerationTask::new(task_id.clone(), provider, now))
            .clone();

        if snapshot.status.is_terminal() {
            return Ok(snapshot);
        }

        if snapshot.age_seconds(now) > self.settings.poll_timeout_secs as i64 {
            debug!(
                "Task {} exceeded polling window after {}s",
                task_id,
                snapshot.age_seconds(now)
            );
            return Ok(self.finish(task_id, |task| task.mark_timed_out(now), snapshot));
        }

        let adapter = Arc::clone(self.providers.get(snapshot.provider)?);

        // Transport failures propagate as PollError without touching
        // the task; the caller may simply retry.
        let poll = adapter.poll_status(task_id).await?;

        if poll.status == TaskStatus::Succeeded {
            debug!(
                "Task {} succeeded with {} result url(s)",
                task_id,
                poll.result_urls.len()
            );
        }

        Ok(self.finish(
            task_id,
            |task| task.record_poll(poll.status, poll.result_urls, poll.error_message, now),
            snapshot,
        ))
    }

    // Terminal records stay readable for one retention window after
    // their last poll, then get dropped. The registry is bounded by
    // in-flight tasks plus recently finished ones, not by everything
    // the process has ever seen.
    fn evict_expired(&self, now: OffsetDateTime) {
        let retention_secs = self.settings.poll_timeout_secs as i64;
        self.tasks.retain(|_, task| !task.expired(now, retention_secs));
    }

    fn finish(
        &self,
        task_id: &TaskId,
        apply: impl FnOnce(&mut GenerationTask),
        fallback: GenerationTask,
    ) -> GenerationTask {
        match self.tasks.get_mut(task_id) {
            Some(mut entry) => {
                apply(entry.value_mut());
                entry.clone()
            }
            None => fallback,
        }
    }
}
