use quiz_core::model::{LessonId, Topic};
use storage::json::JsonPoolRepository;
use storage::repository::{QuestionPoolRepository, StorageError};

const ASSESSMENT: &str = r#"{
    "constitution-1987": [
        {"id": "a1", "type": "multiple", "question": "Which branch makes law?",
         "options": ["Executive", "Legislative", "Judiciary"], "answer": "Legislative"},
        {"id": "a2", "type": "true_false", "question": "The Bill of Rights is Article III.", "answer": true},
        {"id": "a3", "type": "identification", "question": "Right to vote?",
         "answer": "Suffrage", "answerRegex": "^suffrage$"}
    ]
}"#;

#[tokio::test]
async fn loads_lesson_section_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("assessment.json"), ASSESSMENT)
        .await
        .unwrap();
    let repo = JsonPoolRepository::new(dir.path());

    let pool = repo
        .load_pool(&Topic::lesson(&LessonId::new("constitution-1987")))
        .await
        .unwrap();
    assert_eq!(pool.len(), 3);

    let unknown = repo
        .load_pool(&Topic::lesson(&LessonId::new("no-such-lesson")))
        .await
        .unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonPoolRepository::new(dir.path());
    let err = repo.load_pool(&Topic::new("quiz_pool")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn malformed_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("quiz_pool.json"), "{ not json")
        .await
        .unwrap();
    let repo = JsonPoolRepository::new(dir.path());
    let err = repo.load_pool(&Topic::new("quiz_pool")).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
