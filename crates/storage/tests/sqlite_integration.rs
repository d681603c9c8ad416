use chrono::Duration;
use quiz_core::model::{PrincipalId, Profile, QuizResult};
use quiz_core::time::fixed_now;
use storage::repository::{ProfileRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn principal(id: &str) -> PrincipalId {
    PrincipalId::new(id).unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_history_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_history?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let profile = Profile::new(principal("learner-1"))
        .with_display_name("Asha")
        .with_email("asha@example.com");
    repo.upsert_profile(&profile).await.unwrap();

    let first = QuizResult::from_persisted(3, 4, 75, fixed_now()).unwrap();
    let second =
        QuizResult::from_persisted(1, 3, 33, fixed_now() + Duration::minutes(5)).unwrap();
    repo.merge_quiz_results(&principal("learner-1"), &[first.clone()])
        .await
        .unwrap();
    repo.merge_quiz_results(&principal("learner-1"), &[first.clone(), second.clone()])
        .await
        .unwrap();

    let fetched = repo
        .get_profile(&principal("learner-1"))
        .await
        .expect("fetch")
        .expect("profile exists");
    assert_eq!(fetched.display_name(), Some("Asha"));
    assert_eq!(fetched.email(), Some("asha@example.com"));
    assert_eq!(fetched.quiz_results(), &[first, second]);
}

#[tokio::test]
async fn sqlite_upsert_does_not_clobber_history() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running migrations twice is a no-op.
    repo.migrate().await.expect("migrate again");

    repo.upsert_profile(&Profile::new(principal("learner-2")))
        .await
        .unwrap();
    let result = QuizResult::from_persisted(2, 2, 100, fixed_now()).unwrap();
    repo.merge_quiz_results(&principal("learner-2"), &[result])
        .await
        .unwrap();

    repo.upsert_profile(&Profile::new(principal("learner-2")).with_display_name("Later"))
        .await
        .unwrap();

    let fetched = repo
        .get_profile(&principal("learner-2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.display_name(), Some("Later"));
    assert_eq!(fetched.quiz_results().len(), 1);
}

#[tokio::test]
async fn sqlite_merge_for_unknown_profile_is_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.get_profile(&principal("nobody")).await.unwrap().is_none());

    let result = QuizResult::from_persisted(0, 1, 0, fixed_now()).unwrap();
    let err = repo
        .merge_quiz_results(&principal("nobody"), &[result])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_concurrent_appends_keep_every_result() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_append?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo.upsert_profile(&Profile::new(principal("learner-3")))
        .await
        .unwrap();

    let first = QuizResult::from_persisted(1, 2, 50, fixed_now()).unwrap();
    let second = QuizResult::from_persisted(2, 2, 100, fixed_now()).unwrap();
    let (p1, p2) = (principal("learner-3"), principal("learner-3"));
    let (a, b) = tokio::join!(
        repo.append_quiz_result(&p1, &first),
        repo.append_quiz_result(&p2, &second),
    );
    a.unwrap();
    b.unwrap();
    let third = QuizResult::from_persisted(0, 2, 0, fixed_now()).unwrap();
    repo.append_quiz_result(&principal("learner-3"), &third)
        .await
        .unwrap();

    let history = repo
        .get_profile(&principal("learner-3"))
        .await
        .unwrap()
        .unwrap()
        .quiz_results()
        .to_vec();
    assert_eq!(history.len(), 3);
    assert!(history.contains(&first));
    assert!(history.contains(&second));
    assert_eq!(history[2], third);

    let err = repo
        .append_quiz_result(&principal("nobody"), &third)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
