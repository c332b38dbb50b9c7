//! Question pools and course lessons stored as JSON content files.
//!
//! Each topic name maps to `<root>/<name>.json`. A file holds either a flat
//! array of questions or an object of named sections, e.g. an assessment file
//! keyed by lesson id.
//!
//! Lessons live in a courses directory: every `*.json` file there is an
//! array of lessons, and the catalog is all of them merged in file-name order.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quiz_core::model::{Lesson, LessonId, LessonSummary, Question, QuestionPool, QuestionRecord, Topic};
use serde::Deserialize;

use crate::repository::{LessonRepository, QuestionPoolRepository, StorageError};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PoolDocument {
    List(Vec<QuestionRecord>),
    Sections(BTreeMap<String, Vec<QuestionRecord>>),
}

/// Reads question pools from a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonPoolRepository {
    root: PathBuf,
}

impl JsonPoolRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, topic: &Topic) -> Result<PathBuf, StorageError> {
        let name = topic.name();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            tracing::warn!(%topic, "rejecting topic name that is not a plain file stem");
            return Err(StorageError::NotFound);
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

#[async_trait]
impl QuestionPoolRepository for JsonPoolRepository {
    async fn load_pool(&self, topic: &Topic) -> Result<QuestionPool, StorageError> {
        let path = self.path_for(topic)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read pool file");
                return Err(StorageError::Unavailable(err.to_string()));
            }
        };
        let pool = parse_pool(&bytes, topic)?;
        tracing::debug!(%topic, questions = pool.len(), "loaded question pool");
        Ok(pool)
    }
}

/// Parse a pool document and select the topic's section.
///
/// A missing section yields an empty pool. Records without an id get a
/// positional one (`<topic>#<n>`, 1-based).
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON, invalid
/// questions, duplicate ids, or a section lookup on a flat file.
pub fn parse_pool(bytes: &[u8], topic: &Topic) -> Result<QuestionPool, StorageError> {
    let document: PoolDocument = serde_json::from_slice(bytes).map_err(ser)?;
    let records = match (document, topic.section()) {
        (PoolDocument::List(records), None) => records,
        (PoolDocument::List(_), Some(section)) => {
            return Err(StorageError::Serialization(format!(
                "{} is a flat list, cannot select section {section}",
                topic.name()
            )));
        }
        (PoolDocument::Sections(mut sections), Some(section)) => {
            sections.remove(section).unwrap_or_else(|| {
                tracing::debug!(%topic, "section missing, serving an empty pool");
                Vec::new()
            })
        }
        (PoolDocument::Sections(sections), None) => sections.into_values().flatten().collect(),
    };

    let questions = records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            if record.id.trim().is_empty() {
                record.id = format!("{topic}#{}", index + 1);
            }
            Question::try_from(record).map_err(ser)
        })
        .collect::<Result<Vec<_>, _>>()?;

    QuestionPool::new(questions).map_err(ser)
}

/// Reads lessons from every course file in a directory.
///
/// A missing directory is an empty catalog.
#[derive(Debug, Clone)]
pub struct JsonLessonRepository {
    root: PathBuf,
}

impl JsonLessonRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn course_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(root = %self.root.display(), "no courses directory");
                return Ok(Vec::new());
            }
            Err(err) => return Err(StorageError::Unavailable(err.to_string())),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn load_all(&self) -> Result<Vec<Lesson>, StorageError> {
        let mut lessons: Vec<Lesson> = Vec::new();
        for path in self.course_files().await? {
            let bytes = tokio::fs::read(&path).await.map_err(|err| {
                tracing::warn!(path = %path.display(), error = %err, "failed to read course file");
                StorageError::Unavailable(err.to_string())
            })?;
            let course = parse_course(&bytes).map_err(|err| {
                tracing::warn!(path = %path.display(), error = %err, "malformed course file");
                err
            })?;
            for lesson in course {
                if lessons.iter().any(|l| l.id() == lesson.id()) {
                    tracing::warn!(path = %path.display(), lesson = %lesson.id(), "duplicate lesson id skipped");
                    continue;
                }
                lessons.push(lesson);
            }
        }
        Ok(lessons)
    }
}

#[async_trait]
impl LessonRepository for JsonLessonRepository {
    async fn list_lessons(&self) -> Result<Vec<LessonSummary>, StorageError> {
        let lessons = self.load_all().await?;
        tracing::debug!(lessons = lessons.len(), "loaded lesson catalog");
        Ok(lessons.iter().map(Lesson::summary).collect())
    }

    async fn load_lesson(&self, id: &LessonId) -> Result<Lesson, StorageError> {
        self.load_all()
            .await?
            .into_iter()
            .find(|lesson| lesson.id() == id)
            .ok_or(StorageError::NotFound)
    }
}

/// Parse one course file: an array of lessons.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON or a lesson
/// without an id or title.
pub fn parse_course(bytes: &[u8]) -> Result<Vec<Lesson>, StorageError> {
    serde_json::from_slice(bytes).map_err(ser)
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}
