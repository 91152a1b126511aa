use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    Dashscope,
    Replicate,
}

impl ImageProvider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashscope => "dashscope",
            Self::Replicate => "replicate",
        }
    }
}

impl Display for ImageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashscope" => Ok(Self::Dashscope),
            "replicate" => Ok(Self::Replicate),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// Canonical task state all provider vocabularies normalize into.
/// `TimedOut` is synthetic; providers never report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl TaskStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// One outstanding or completed provider job. Lives only for the
/// polling window; durable result storage is a collaborator concern.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub provider: ImageProvider,
    pub status: TaskStatus,
    pub result_urls: Vec<String>,
    pub error_message: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_polled_at: Option<OffsetDateTime>,
}

impl GenerationTask {
    pub fn new(task_id: TaskId, provider: ImageProvider, now: OffsetDateTime) -> Self {
        Self {
            task_id,
            provider,
            status: TaskStatus::Pending,
            result_urls: Vec::new(),
            error_message: None,
            created_at: now,
            last_polled_at: None,
        }
    }

    #[must_use]
    pub fn primary_url(&self) -> Option<&str> {
        self.result_urls.first().map(String::as_str)
    }

    #[must_use]
    pub fn age_seconds(&self, now: OffsetDateTime) -> i64 {
        (now - self.created_at).whole_seconds()
    }

    /// Whether this record has outlived its retention. Terminal tasks
    /// stay readable for `retention_secs` after their last poll, then
    /// may be dropped from any in-process registry.
    #[must_use]
    pub fn expired(&self, now: OffsetDateTime, retention_secs: i64) -> bool {
        let last_touched = self.last_polled_at.unwrap_or(self.created_at);
        self.status.is_terminal() && (now - last_touched).whole_seconds() > retention_secs
    }

    /// Applies a provider poll result. Terminal tasks are immutable;
    /// a late poll result is ignored.
    pub fn record_poll(
        &mut self,
        status: TaskStatus,
        result_urls: Vec<String>,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) {
        if self.status.is_terminal() {
            return;
        }

        self.status = status;
        self.result_urls = result_urls;
        self.error_message = error_message;
        self.last_polled_at = Some(now);
    }

    pub fn mark_timed_out(&mut self, now: OffsetDateTime) {
        if self.status.is_terminal() {
            return;
        }

        self.status = TaskStatus::TimedOut;
        self.last_polled_at = Some(now);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use time::Duration;

    fn task() -> GenerationTask {
        GenerationTask::new(
            TaskId::new("task-1"),
            ImageProvider::Dashscope,
            OffsetDateTime::now_utc(),
        )
    }

    #[test]
    fn terminal_task_ignores_further_polls() {
        let mut task = task();
        let now = OffsetDateTime::now_utc();

        task.record_poll(
            TaskStatus::Succeeded,
            vec!["https://cdn.example/img.png".to_string()],
            None,
            now,
        );
        task.record_poll(TaskStatus::Failed, Vec::new(), Some("late".to_string()), now);

        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.primary_url(), Some("https://cdn.example/img.png"));
        assert_eq!(task.error_message, None);
    }

    #[test]
    fn timed_out_is_terminal() {
        let mut task = task();
        let now = OffsetDateTime::now_utc();

        task.mark_timed_out(now);
        task.record_poll(TaskStatus::Running, Vec::new(), None, now);

        assert_eq!(task.status, TaskStatus::TimedOut);
        assert!(task.status.is_terminal());
    }

    #[test]
    fn expiry_starts_at_the_terminal_transition() {
        let mut task = task();
        let finished = OffsetDateTime::now_utc();

        task.record_poll(TaskStatus::Succeeded, Vec::new(), None, finished);

        assert!(!task.expired(finished + Duration::seconds(299), 300));
        assert!(task.expired(finished + Duration::seconds(301), 300));
    }

    #[test]
    fn running_task_never_expires() {
        let mut task = task();
        task.status = TaskStatus::Running;

        assert!(!task.expired(OffsetDateTime::now_utc() + Duration::seconds(3600), 300));
    }

    #[test]
    fn provider_round_trips_through_str() {
        assert_eq!(
            "replicate".parse::<ImageProvider>().unwrap(),
            ImageProvider::Replicate
        );
        assert!("midjourney".parse::<ImageProvider>().is_err());
    }
}
