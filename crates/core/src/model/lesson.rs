use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::LessonId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson id must not be empty")]
    EmptyId,
    #[error("lesson {0} has an empty title")]
    EmptyTitle(String),
}

/// A course lesson: reading material plus optional media and references.
///
/// Its assessment lives separately, under `Topic::lesson(id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LessonRecord", into = "LessonRecord")]
pub struct Lesson {
    id: LessonId,
    title: String,
    excerpt: Option<String>,
    category: Option<String>,
    content: String,
    images: Vec<String>,
    sources: Vec<String>,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `LessonError` if the id or title is blank.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, LessonError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LessonError::EmptyId);
        }
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle(id));
        }
        Ok(Self {
            id: LessonId::new(id),
            title,
            excerpt: None,
            category: None,
            content: content.into(),
            images: Vec::new(),
            sources: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn excerpt(&self) -> Option<&str> {
        self.excerpt.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Image URLs, in display order.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// The list entry for this lesson, without its body.
    #[must_use]
    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            category: self.category.clone(),
        }
    }
}

/// Light catalog entry: enough to list and search lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: LessonId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LessonSummary {
    /// Case-insensitive substring match on title or excerpt. A blank query
    /// matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .excerpt
                .as_deref()
                .is_some_and(|excerpt| excerpt.to_lowercase().contains(&needle))
    }
}

// ─── Wire format ───────────────────────────────────────────────────────────────

/// Lesson as stored in course files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl TryFrom<LessonRecord> for Lesson {
    type Error = LessonError;

    fn try_from(record: LessonRecord) -> Result<Self, Self::Error> {
        let mut lesson = Lesson::new(record.id, record.title, record.content)?;
        lesson.excerpt = record.excerpt.filter(|e| !e.trim().is_empty());
        lesson.category = record.category.filter(|c| !c.trim().is_empty());
        lesson.images = record.images;
        lesson.sources = record.sources;
        Ok(lesson)
    }
}

impl From<Lesson> for LessonRecord {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id.as_str().to_string(),
            title: lesson.title,
            excerpt: lesson.excerpt,
            category: lesson.category,
            content: lesson.content,
            images: lesson.images,
            sources: lesson.sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constitution() -> LessonSummary {
        Lesson::new("1", "1987 Constitution Overview", "Body")
            .unwrap()
            .with_excerpt("Introduction to the Philippine Constitution")
            .summary()
    }

    #[test]
    fn blank_id_or_title_is_rejected() {
        assert_eq!(Lesson::new(" ", "Title", "").unwrap_err(), LessonError::EmptyId);
        assert_eq!(
            Lesson::new("7", "", "").unwrap_err(),
            LessonError::EmptyTitle("7".into())
        );
    }

    #[test]
    fn search_matches_title_or_excerpt_ignoring_case() {
        let lesson = constitution();
        assert!(lesson.matches("CONSTITUTION"));
        assert!(lesson.matches("philippine"));
        assert!(lesson.matches("  "));
        assert!(!lesson.matches("republic act"));
    }

    #[test]
    fn summary_without_excerpt_matches_title_only() {
        let lesson = Lesson::new("2", "Presidents since 1987", "").unwrap().summary();
        assert!(lesson.matches("presidents"));
        assert!(!lesson.matches("bios"));
    }

    #[test]
    fn course_record_fills_defaults() {
        let json = r#"{"id": "3", "title": "Recent Republic Acts", "category": "law"}"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.category(), Some("law"));
        assert_eq!(lesson.excerpt(), None);
        assert!(lesson.content().is_empty());
        assert!(lesson.sources().is_empty());
    }

    #[test]
    fn course_record_with_blank_title_fails() {
        let json = r#"{"id": "4", "title": " "}"#;
        assert!(serde_json::from_str::<Lesson>(json).is_err());
    }
}
