mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use exam_prep_server::{
    errors::AppError,
    models::domain::{ExamType, QuestionOutcome, QuizResult, User},
    repositories::{QuizResultRepository, UserRepository},
    services::{
        quiz_result_service::QuizResultService,
        user_service::{OAuthProfile, UserService},
    },
};

use common::{InMemoryQuizResultRepository, InMemoryUserRepository};

fn make_result(owner: &str, subject: &str, correct: &[bool], minutes_ago: i64) -> QuizResult {
    let outcomes = correct
        .iter()
        .enumerate()
        .map(|(i, ok)| {
            QuestionOutcome::new(
                format!("{}-{}", subject, i),
                subject,
                Some(if *ok { 1 } else { 0 }),
                1,
            )
        })
        .collect();
    let score = correct.iter().filter(|ok| **ok).count() as u32;

    let mut result = QuizResult::new(
        vec![subject.to_string()],
        ExamType::Utme,
        score,
        120,
        900,
        outcomes,
    )
    .with_owner(owner);
    result.created_at = Utc::now() - Duration::minutes(minutes_ago);
    result
}

#[tokio::test]
async fn quiz_result_repository_lists_newest_first_per_user() {
    let repo = InMemoryQuizResultRepository::default();
    let older = make_result("u1", "Mathematics", &[true, false], 30);
    let newer = make_result("u1", "Economics", &[true], 5);
    let foreign = make_result("u2", "Mathematics", &[true], 1);

    for r in [older.clone(), newer.clone(), foreign] {
        repo.create(r).await.expect("created");
    }

    let listed = repo.list_by_user("u1").await.expect("listed");
    let ids: Vec<_> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);

    assert!(matches!(
        repo.create(older).await,
        Err(AppError::AlreadyExists(_))
    ));
    assert!(repo.find_by_id("missing").await.expect("lookup").is_none());
}

#[tokio::test]
async fn user_repository_upsert_keeps_stable_id() {
    let repo = InMemoryUserRepository::default();
    let first = User::from_github("99".into(), "tunde".into(), "t@example.com".into(), None);
    let stored = repo.upsert_by_github_id(first).await.expect("inserted");

    let renamed = User::from_github(
        "99".into(),
        "tunde".into(),
        "t@example.com".into(),
        Some("Tunde Ade".into()),
    );
    let updated = repo.upsert_by_github_id(renamed).await.expect("updated");

    assert_eq!(updated.id, stored.id);
    assert_eq!(updated.display_name, "Tunde Ade");
    assert!(matches!(
        repo.upsert_by_github_id(User::new("x", "X", "x@example.com")).await,
        Err(AppError::ValidationError(_))
    ));
}

#[tokio::test]
async fn result_service_enforces_storage_rules() {
    let user = User::new("ife", "Ife", "ife@example.com");
    let service = QuizResultService::new(
        Arc::new(InMemoryQuizResultRepository::default()),
        Arc::new(InMemoryUserRepository::with_users([user.clone()])),
    );

    let ok = make_result(&user.id, "Mathematics", &[true, true, false], 10);
    let id = service.save_result(Some(&user.id), ok).await.expect("saved");
    assert_eq!(service.get_result(&user.id, &id).await.expect("found").score, 2);

    let err = service
        .save_result(None, make_result(&user.id, "Mathematics", &[true], 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = service
        .save_result(Some("ghost"), make_result("ghost", "Mathematics", &[true], 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service
        .save_result(Some(&user.id), make_result(&user.id, "Mathematics", &[], 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = service.get_result("someone-else", &id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn dashboard_matches_worked_example() {
    let user = User::new("ada", "Ada", "ada@example.com");
    let service = QuizResultService::new(
        Arc::new(InMemoryQuizResultRepository::default()),
        Arc::new(InMemoryUserRepository::with_users([user.clone()])),
    );

    let seventy = [true, true, true, true, true, true, true, false, false, false];
    let ninety = [true, true, true, true, true, true, true, true, true, false];
    service
        .save_result(Some(&user.id), make_result(&user.id, "Mathematics", &seventy, 20))
        .await
        .expect("saved");
    service
        .save_result(Some(&user.id), make_result(&user.id, "Mathematics", &ninety, 10))
        .await
        .expect("saved");

    let dashboard = service.dashboard(&user.id).await.expect("dashboard");
    let stats = &dashboard.subject_stats[0];
    assert_eq!(stats.attempts, 2);
    assert!((stats.average_score - 80.0).abs() < 1e-9);
    assert!((stats.best_score - 90.0).abs() < 1e-9);
    assert_eq!(stats.total_questions, 20);

    let history: Vec<f64> = dashboard.score_history.iter().map(|p| p.percentage).collect();
    assert_eq!(history.len(), 2);
    assert!((history[0] - 70.0).abs() < 1e-9);
}

#[tokio::test]
async fn user_service_signs_in_through_repository() {
    let service = UserService::new(Arc::new(InMemoryUserRepository::default()));

    let user = service
        .upsert_oauth_user(OAuthProfile {
            provider_id: "5".into(),
            login: "ngozi".into(),
            email: None,
            name: None,
        })
        .await
        .expect("signed in");

    assert_eq!(user.email, "ngozi@users.noreply.github.com");
    assert_eq!(service.get_user(&user.id).await.expect("found").username, "ngozi");
}
