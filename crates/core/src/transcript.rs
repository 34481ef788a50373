//! Diagnostic transcripts of completion calls.
//!
//! When a transcript directory is configured, every invocation writes one plain-text file holding
//! the prompt and the raw reply. Nothing reads these files back; they exist so a developer can see
//! exactly what the model was asked and what it answered.

use crate::task::TaskKind;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const PROMPT_HEADER: &str = "=== PROMPT ===";
const REPLY_HEADER: &str = "=== REPLY ===";

#[derive(Clone, Debug)]
pub struct TranscriptWriter {
    dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for one transcript: `<timestamp>-<task>-<request id>.txt`.
    pub fn file_name(at: DateTime<Utc>, task: TaskKind, request_id: Uuid) -> String {
        format!(
            "{}-{}-{}.txt",
            at.format("%Y%m%dT%H%M%S%.3fZ"),
            task.name(),
            request_id.simple()
        )
    }

    /// Write a transcript, creating the directory if needed.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the directory or file cannot be written.
    pub async fn write(
        &self,
        task: TaskKind,
        request_id: Uuid,
        prompt: &str,
        reply: &str,
    ) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self
            .dir
            .join(Self::file_name(Utc::now(), task, request_id));
        let contents = format!(
            "{}\n{}\n\n{}\n{}\n",
            PROMPT_HEADER, prompt, REPLY_HEADER, reply
        );
        tokio::fs::write(&path, contents).await?;

        Ok(path)
    }
}
