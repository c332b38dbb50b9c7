use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    ActivityKind, Answer, AppSettingsDraft, Lesson, LessonId, ProgressRecord, Question,
    QuestionKind, QuestionPool, QuizSettings, SessionLength, Topic,
};
use quiz_core::time::fixed_now;
use services::{
    AppServices, Clock, MatchingGame, QuizLoopService, SelectionPolicy, SessionError, SessionState,
};
use storage::repository::{InMemoryRepository, ProgressRepository, Storage, StorageError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct OfflineProgress;

#[async_trait]
impl ProgressRepository for OfflineProgress {
    async fn save_progress(&self, _record: &ProgressRecord) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("backend offline".into()))
    }

    async fn recent_progress(&self, _limit: u32) -> Result<Vec<ProgressRecord>, StorageError> {
        Err(StorageError::Unavailable("backend offline".into()))
    }
}

fn ten_question_pool() -> QuestionPool {
    QuestionPool::new(
        (1..=10)
            .map(|i| {
                Question::multiple_choice(
                    format!("pool-{i}"),
                    format!("Question {i}"),
                    vec!["Executive".into(), "Legislative".into(), "Judiciary".into()],
                    "Judiciary",
                )
                .unwrap()
            })
            .collect(),
    )
    .unwrap()
}

fn correct_answer(question: &Question) -> Answer {
    match question.kind() {
        QuestionKind::MultipleChoice { correct, .. } => Answer::text(correct.clone()),
        QuestionKind::TrueFalse { answer } => Answer::Bool(*answer),
        QuestionKind::Identification { display, .. } => {
            Answer::text(display.clone().unwrap_or_default())
        }
    }
}

#[tokio::test]
async fn sequential_session_saves_points() {
    let repo = InMemoryRepository::new();
    let topic = Topic::new("quiz_pool");
    repo.insert_pool(topic.clone(), ten_question_pool()).unwrap();

    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );

    let mut session = svc
        .start_session(&topic, Some(SessionLength::new(10)), SelectionPolicy::Sequential)
        .await
        .unwrap();

    let mut answered = 0;
    while !session.is_complete() {
        let question = session.current_question().unwrap().clone();
        let answer = if answered < 5 {
            correct_answer(&question)
        } else {
            Answer::text("Executive")
        };
        session.submit(question.id(), answer).unwrap();
        session.advance().unwrap();
        answered += 1;
    }

    let outcome = session.result().unwrap();
    assert_eq!((outcome.score(), outcome.total()), (5, 10));
    assert!(!outcome.passed());

    let record = svc
        .finish_session(&session, ActivityKind::Assessment)
        .await
        .unwrap();
    assert_eq!(record.daily_points(), 5);
    assert_eq!(record.recorded_at(), fixed_now());

    let saved = repo.recent_progress(5).await.unwrap();
    assert_eq!(saved, vec![record]);
}

#[tokio::test]
async fn sequential_all_correct_session_passes_with_full_marks() {
    let repo = InMemoryRepository::new();
    let topic = Topic::new("quiz_pool");
    repo.insert_pool(topic.clone(), ten_question_pool()).unwrap();
    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );

    let mut session = svc
        .start_session(&topic, Some(SessionLength::new(10)), SelectionPolicy::Sequential)
        .await
        .unwrap();

    let mut order = Vec::new();
    while !session.is_complete() {
        let question = session.current_question().unwrap().clone();
        order.push(question.id().as_str().to_string());
        session.submit(question.id(), correct_answer(&question)).unwrap();
        session.advance().unwrap();
    }

    let expected: Vec<String> = (1..=10).map(|i| format!("pool-{i}")).collect();
    assert_eq!(order, expected);
    let outcome = session.result().unwrap();
    assert_eq!((outcome.score(), outcome.total()), (10, 10));
    assert!(outcome.passed());

    let record = svc
        .finish_session(&session, ActivityKind::Assessment)
        .await
        .unwrap();
    assert_eq!(record.daily_points(), 10);
}

#[tokio::test]
async fn random_full_length_session_visits_every_question_once() {
    let repo = InMemoryRepository::new();
    let topic = Topic::new("quiz_pool");
    repo.insert_pool(topic.clone(), ten_question_pool()).unwrap();
    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let mut session = svc
        .start_session(&topic, Some(SessionLength::new(10)), SelectionPolicy::Random)
        .await
        .unwrap();

    let mut seen = Vec::new();
    while session.state() != SessionState::Complete {
        let question = session.current_question().unwrap().clone();
        seen.push(question.id().as_str().to_string());
        session.submit(question.id(), correct_answer(&question)).unwrap();
        session.advance().unwrap();
    }
    seen.sort();
    let mut expected: Vec<String> = (1..=10).map(|i| format!("pool-{i}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
    assert!(session.result().unwrap().passed());
}

#[tokio::test]
async fn offline_backend_keeps_session_and_allows_retry() {
    let repo = InMemoryRepository::new();
    let topic = Topic::new("quiz_pool");
    repo.insert_pool(topic.clone(), ten_question_pool()).unwrap();

    let offline = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(OfflineProgress),
    );
    let mut session = offline
        .start_session(&topic, Some(SessionLength::new(2)), SelectionPolicy::Sequential)
        .await
        .unwrap();
    while !session.is_complete() {
        let question = session.current_question().unwrap().clone();
        session.submit(question.id(), correct_answer(&question)).unwrap();
        session.advance().unwrap();
    }

    let err = offline
        .finish_session(&session, ActivityKind::Assessment)
        .await
        .unwrap_err();
    match err {
        SessionError::Storage(inner) => assert!(inner.is_transient()),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.is_complete());
    assert_eq!(session.score(), 2);

    let online = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let record = online
        .finish_session(&session, ActivityKind::Assessment)
        .await
        .unwrap();
    assert_eq!(record.daily_points(), 2);
}

#[tokio::test]
async fn empty_section_starts_a_complete_passing_session() {
    let repo = InMemoryRepository::new();
    let topic = Topic::new("interactive_question").with_section("identification");
    repo.insert_pool(topic.clone(), QuestionPool::empty()).unwrap();
    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let session = svc
        .start_session(&topic, None, SelectionPolicy::Random)
        .await
        .unwrap();
    assert!(session.is_complete());
    assert!(session.result().unwrap().passed());
}

#[tokio::test]
async fn matching_score_is_saved() {
    let repo = InMemoryRepository::new();
    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let mut game = MatchingGame::law_terms();
    let pair = game.cards()[0].pair();
    let partner = (1..game.cards().len())
        .find(|i| game.cards()[*i].pair() == pair)
        .unwrap();
    game.reveal(0);
    game.reveal(partner);

    let record = svc.save_matching(&game).await.unwrap();
    assert_eq!(record.daily_points(), 10);
    assert_eq!(record.activity(), ActivityKind::Matching);
}

#[tokio::test]
async fn catalog_lesson_opens_with_its_assessment() {
    let repo = InMemoryRepository::new();
    let lesson_id = LessonId::new("branches-of-government");
    repo.insert_lesson(
        Lesson::new(lesson_id.as_str(), "Branches of Government", "Three co-equal branches.")
            .unwrap()
            .with_excerpt("Who makes, enforces, and interprets the law"),
    )
    .unwrap();
    repo.insert_pool(Topic::lesson(&lesson_id), ten_question_pool())
        .unwrap();

    let settings = AppSettingsDraft::new().validate().unwrap();
    let services = AppServices::from_storage(
        Storage::from_repository(repo),
        Clock::fixed(fixed_now()),
        settings,
    )
    .unwrap();

    let found = services.lessons().list(Some("enforces")).await.unwrap();
    assert_eq!(found.len(), 1);
    let lesson = services.lessons().lesson(&found[0].id).await.unwrap();
    assert_eq!(lesson.content(), "Three co-equal branches.");

    let assessment = services
        .quiz_loop()
        .start_lesson(lesson.id().clone())
        .await
        .unwrap();
    assert_eq!(assessment.questions().len(), 10);
}

#[tokio::test]
async fn remote_rejection_is_reported_as_final() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/progress"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;

    let mut draft = AppSettingsDraft::new();
    draft.progress_base_url = Some(server.uri());
    let services = AppServices::from_storage(
        Storage::in_memory(),
        Clock::fixed(fixed_now()),
        draft.validate().unwrap(),
    )
    .unwrap();

    let game = MatchingGame::law_terms();
    let err = services.quiz_loop().save_matching(&game).await.unwrap_err();
    match err {
        SessionError::Storage(inner) => {
            assert!(matches!(inner, StorageError::Rejected(_)));
            assert!(!inner.is_transient());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
