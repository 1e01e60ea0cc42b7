use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use db::{
    DbErr, DbPool, TransactionTrait,
    models::{
        task::{Task, TaskStatus},
        task_submission::{CreateTaskSubmission, SubmissionStatus, TaskSubmission},
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils::assets::uploads_dir;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Task not found")]
    TaskNotFound,
    #[error("No submission awaiting review for this task")]
    SubmissionNotFound,
    #[error("Only the assigned employee can submit work for this task")]
    NotAssignee,
    #[error("Invalid file payload: {0}")]
    InvalidPayload(String),
    #[error("File is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error("A review comment is required when rejecting")]
    CommentRequired,
}

#[derive(Debug, Deserialize, TS)]
pub struct SubmitTaskRequest {
    pub file_name: Option<String>,
    pub file_base64: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct SubmissionWithFile {
    #[serde(flatten)]
    #[ts(flatten)]
    pub submission: TaskSubmission,
    pub file_base64: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Clone, Default)]
pub struct SubmissionService;

impl SubmissionService {
    pub fn new() -> Self {
        Self
    }

    /// Writes the decoded payload, then records the submission row and the
    /// task transition in one transaction. The file lands on disk before
    /// the row that references it exists, never the other way around.
    pub async fn submit(
        &self,
        pool: &DbPool,
        task_id: Uuid,
        employee_id: Uuid,
        payload: SubmitTaskRequest,
        max_upload_size_bytes: usize,
    ) -> Result<TaskSubmission, SubmissionError> {
        let task = Task::find_by_id(pool, task_id)
            .await?
            .ok_or(SubmissionError::TaskNotFound)?;
        if task.assigned_employee_id != employee_id {
            return Err(SubmissionError::NotAssignee);
        }

        let file_path = match payload.file_base64.as_deref() {
            Some(encoded) if !encoded.trim().is_empty() => {
                let bytes = BASE64
                    .decode(encoded.trim())
                    .map_err(|err| SubmissionError::InvalidPayload(err.to_string()))?;
                if bytes.len() > max_upload_size_bytes {
                    return Err(SubmissionError::TooLarge {
                        size: bytes.len(),
                        limit: max_upload_size_bytes,
                    });
                }
                Some(store_file(task_id, payload.file_name.as_deref(), &bytes)?)
            }
            _ => None,
        };

        let tx = pool.begin().await?;
        let submission = TaskSubmission::create(
            &tx,
            &CreateTaskSubmission {
                task_id,
                employee_id,
                file_path,
                comment: payload.comment.filter(|c| !c.trim().is_empty()),
            },
            Uuid::new_v4(),
        )
        .await?;
        Task::update_status(&tx, task_id, TaskStatus::Submitted).await?;
        tx.commit().await?;

        tracing::info!(task_id = %task_id, submission_id = %submission.id, "Task submitted for review");
        Ok(submission)
    }

    /// Approve finishes the task; reject sends it back to in-progress.
    /// Both operate on the latest unreviewed submission.
    pub async fn review(
        &self,
        pool: &DbPool,
        task_id: Uuid,
        decision: ReviewDecision,
        qa_comment: Option<String>,
    ) -> Result<TaskSubmission, SubmissionError> {
        if Task::find_by_id(pool, task_id).await?.is_none() {
            return Err(SubmissionError::TaskNotFound);
        }

        let qa_comment = qa_comment.filter(|c| !c.trim().is_empty());
        if decision == ReviewDecision::Reject && qa_comment.is_none() {
            return Err(SubmissionError::CommentRequired);
        }

        let submission = TaskSubmission::latest_submitted_by_task_id(pool, task_id)
            .await?
            .ok_or(SubmissionError::SubmissionNotFound)?;

        let (submission_status, task_status) = match decision {
            ReviewDecision::Approve => (SubmissionStatus::Approved, TaskStatus::Done),
            ReviewDecision::Reject => (SubmissionStatus::Rejected, TaskStatus::InProgress),
        };

        let tx = pool.begin().await?;
        let reviewed =
            TaskSubmission::review(&tx, submission.id, submission_status, qa_comment).await?;
        Task::update_status(&tx, task_id, task_status).await?;
        tx.commit().await?;

        Ok(reviewed)
    }

    /// Latest submission for the task with its file re-encoded to base64.
    pub async fn fetch(
        &self,
        pool: &DbPool,
        task_id: Uuid,
    ) -> Result<SubmissionWithFile, SubmissionError> {
        if Task::find_by_id(pool, task_id).await?.is_none() {
            return Err(SubmissionError::TaskNotFound);
        }

        let submission = TaskSubmission::latest_by_task_id(pool, task_id)
            .await?
            .ok_or(SubmissionError::SubmissionNotFound)?;

        let file_base64 = match submission.file_path.as_deref() {
            Some(relative) => {
                let bytes = std::fs::read(uploads_dir().join(relative))?;
                Some(BASE64.encode(bytes))
            }
            None => None,
        };

        Ok(SubmissionWithFile {
            submission,
            file_base64,
        })
    }
}

/// Temp-write, fsync, then rename into place so a crash mid-write never
/// leaves a partial file at the final path. Returns the path relative to
/// the uploads directory.
fn store_file(
    task_id: Uuid,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<String, SubmissionError> {
    let dir = uploads_dir();
    std::fs::create_dir_all(&dir)?;

    let extension = file_name.map(sanitized_extension).unwrap_or_default();
    let relative = format!(
        "{}_{}{}",
        task_id.simple(),
        Utc::now().timestamp_millis(),
        extension
    );

    let final_path = dir.join(&relative);
    let tmp_path = dir.join(format!("{relative}.tmp"));

    write_and_sync(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, &final_path)?;

    Ok(relative)
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Keeps only a trailing `.alnum` suffix; anything path-like is dropped.
fn sanitized_extension(file_name: &str) -> String {
    PathBuf::from(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ext.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(16)
                .collect::<String>()
        })
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
