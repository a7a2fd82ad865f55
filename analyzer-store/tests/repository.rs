use analyzer_store::{NewCheck, Repository, StoreError};

async fn fresh_repo() -> Repository {
    let pool = analyzer_store::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    analyzer_store::migrate(&pool).await.expect("migrations apply");
    Repository::new(pool)
}

fn check_with_status(code: u16) -> NewCheck {
    NewCheck {
        status_code: Some(code),
        ..Default::default()
    }
}

#[tokio::test]
async fn saved_url_can_be_found_by_id_and_name() {
    let repo = fresh_repo().await;

    let id = repo.save_url("https://example.com").await.unwrap();

    let by_id = repo.find_url_by_id(id).await.unwrap().expect("by id");
    let by_name = repo
        .find_url_by_name("https://example.com")
        .await
        .unwrap()
        .expect("by name");
    assert_eq!(by_id, by_name);
    assert_eq!(by_id.name, "https://example.com");
}

#[tokio::test]
async fn lookups_for_unknown_urls_are_none() {
    let repo = fresh_repo().await;
    assert!(repo.find_url_by_id(42).await.unwrap().is_none());
    assert!(repo.find_url_by_name("https://nope.example").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_name_is_reported_and_not_inserted() {
    let repo = fresh_repo().await;
    repo.save_url("https://example.com").await.unwrap();

    let err = repo.save_url("https://example.com").await.unwrap_err();

    assert!(matches!(err, StoreError::Duplicate(ref name) if name == "https://example.com"));
    assert_eq!(repo.list_urls_with_last_check().await.unwrap().len(), 1);
}

#[tokio::test]
async fn listing_is_newest_url_first_with_latest_check() {
    let repo = fresh_repo().await;
    let first = repo.save_url("https://first.example").await.unwrap();
    let second = repo.save_url("https://second.example").await.unwrap();

    repo.save_check(first, check_with_status(500)).await.unwrap();
    repo.save_check(first, check_with_status(200)).await.unwrap();

    let rows = repo.list_urls_with_last_check().await.unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].id, second);
    assert_eq!(rows[0].last_status_code, None);
    assert_eq!(rows[0].last_check_at, None);

    assert_eq!(rows[1].id, first);
    assert_eq!(rows[1].last_status_code, Some(200));
    assert!(rows[1].last_check_at.is_some());
}

#[tokio::test]
async fn latest_check_ties_go_to_the_highest_id() {
    let repo = fresh_repo().await;
    let url_id = repo.save_url("https://tie.example").await.unwrap();
    repo.save_check(url_id, check_with_status(301)).await.unwrap();
    repo.save_check(url_id, check_with_status(302)).await.unwrap();

    // Force both checks onto the same timestamp.
    sqlx::query("UPDATE url_checks SET created_at = '2024-01-01T00:00:00+00:00'")
        .execute(repo.pool())
        .await
        .unwrap();

    let rows = repo.list_urls_with_last_check().await.unwrap();
    assert_eq!(rows.len(), 1, "one row per url even when timestamps tie");
    assert_eq!(rows[0].last_status_code, Some(302));
}

#[tokio::test]
async fn checks_are_listed_newest_first_with_all_fields() {
    let repo = fresh_repo().await;
    let url_id = repo.save_url("https://example.com").await.unwrap();
    let other = repo.save_url("https://other.example").await.unwrap();

    let older = repo.save_check(url_id, check_with_status(404)).await.unwrap();
    let newer = repo
        .save_check(
            url_id,
            NewCheck {
                status_code: Some(200),
                title: Some("Example site 1".into()),
                h1: Some("Some inner data".into()),
                description: Some("Lorem ipsum".into()),
            },
        )
        .await
        .unwrap();
    repo.save_check(other, check_with_status(200)).await.unwrap();

    let checks = repo.list_checks_for_url(url_id).await.unwrap();
    assert_eq!(checks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![newer, older]);
    assert_eq!(checks[0].url_id, url_id);
    assert_eq!(checks[0].title.as_deref(), Some("Example site 1"));
    assert_eq!(checks[0].h1.as_deref(), Some("Some inner data"));
    assert_eq!(checks[0].description.as_deref(), Some("Lorem ipsum"));
    assert_eq!(checks[1].status_code, Some(404));
    assert_eq!(checks[1].title, None);
}

#[tokio::test]
async fn check_for_missing_url_is_rejected() {
    let repo = fresh_repo().await;

    let err = repo.save_check(999, NewCheck::default()).await.unwrap_err();

    assert!(matches!(err, StoreError::Database(_)));
    assert!(repo.list_checks_for_url(999).await.unwrap().is_empty());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = fresh_repo().await;
    analyzer_store::migrate(repo.pool()).await.expect("second run is a no-op");
}
