use chrono::{Duration, NaiveDate};
use quiz_core::model::{ActivityKind, ProgressRecord, StreakState, Theme};
use quiz_core::time::fixed_now;
use storage::repository::{PreferencesRepository, ProgressRepository};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_progress_round_trips_newest_first() {
    let repo = connect("memdb_progress").await;

    let first = ProgressRecord::new(40, ActivityKind::Matching, fixed_now());
    let second = ProgressRecord::new(
        7,
        ActivityKind::Assessment,
        fixed_now() + Duration::minutes(5),
    );
    repo.save_progress(&first).await.unwrap();
    repo.save_progress(&second).await.unwrap();

    let recent = repo.recent_progress(10).await.unwrap();
    assert_eq!(recent, vec![second.clone(), first]);

    let limited = repo.recent_progress(1).await.unwrap();
    assert_eq!(limited, vec![second]);
}

#[tokio::test]
async fn sqlite_preferences_store_theme_and_streak() {
    let repo = connect("memdb_preferences").await;

    assert_eq!(repo.load_theme().await.unwrap(), None);
    assert_eq!(repo.load_streak().await.unwrap(), StreakState::default());

    repo.save_theme(Theme::Dark).await.unwrap();
    repo.save_theme(Theme::Light).await.unwrap();
    assert_eq!(repo.load_theme().await.unwrap(), Some(Theme::Light));

    let day = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    let streak = StreakState::new(Some(day), 5);
    repo.save_streak(&streak).await.unwrap();
    assert_eq!(repo.load_streak().await.unwrap(), streak);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let record = ProgressRecord::new(3, ActivityKind::Lesson, fixed_now());
    repo.save_progress(&record).await.unwrap();
    assert_eq!(repo.recent_progress(5).await.unwrap().len(), 1);
}
