use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_entry_lifecycle() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    // create with trimmed text and derived photo flag
    let (status_code, entry, _) = helper::maybe_create_entry(
        &mut app,
        &token,
        json!({
            "title": "  Morning pages  ",
            "body": "Slept well, long walk before breakfast.",
            "mood": 4,
            "date": "2025-03-10",
            "tags": ["Fitness", "gratitude"],
            "photoUris": ["file:///photo-1.jpg"],
        }),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    let entry = entry.unwrap();

    assert_eq!(Some("Morning pages".to_string()), entry.title);
    assert_eq!("2025-03-10", entry.date);
    assert_eq!(Some(4), entry.mood);
    assert!(entry.has_photos);
    assert_eq!(
        vec!["fitness".to_string(), "gratitude".to_string()],
        entry
            .tags
            .iter()
            .map(|tag| tag.name.clone())
            .collect::<Vec<String>>()
    );

    // read it back
    let (status_code, fetched, _) = helper::single_entry(&mut app, &token, &entry.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(entry.title.clone()), fetched.map(|e| e.title));

    // patch only the title
    let (status_code, updated, _) = helper::maybe_update_entry(
        &mut app,
        &token,
        &entry.id,
        json!({ "title": "Evening pages" }),
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);
    let updated = updated.unwrap();

    assert_eq!(entry.id, updated.id);
    assert_eq!(entry.created_at, updated.created_at);
    assert_eq!(Some("Evening pages".to_string()), updated.title);
    assert_eq!(entry.body, updated.body);
    assert_eq!(entry.mood, updated.mood);
    assert!(updated.updated_at >= entry.updated_at);

    // delete twice; both yield 204
    assert_eq!(
        StatusCode::NO_CONTENT,
        helper::delete_entry(&mut app, &token, &entry.id).await
    );
    assert_eq!(
        StatusCode::NO_CONTENT,
        helper::delete_entry(&mut app, &token, &entry.id).await
    );

    // it is gone from reads and listings
    let (status_code, _, error) = helper::single_entry(&mut app, &token, &entry.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Entry not found".to_string()), error);

    let (_, entries) = helper::list_entries(&mut app, &token).await;
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_entry_defaults() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let (status_code, entry, _) =
        helper::maybe_create_entry(&mut app, &token, json!({ "body": "Just a thought" })).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let entry = entry.unwrap();

    // unset mood stays unset; no write-time default
    assert_eq!(None, entry.mood);
    assert_eq!(None, entry.title);
    assert!(entry.tags.is_empty());
    assert!(entry.photo_uris.is_empty());
    assert!(!entry.has_photos);
    assert_eq!(10, entry.date.len());
}

#[tokio::test]
async fn test_entry_upsert_by_id() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let id = uuid::Uuid::new_v4();

    // a client-composed entry carries its own ID
    let (status_code, first, _) = helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "id": id, "body": "composed offline" }),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!(id, first.unwrap().id);

    // repeating the write replaces instead of duplicating
    let (status_code, _, _) = helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "id": id, "body": "composed offline, retried" }),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);

    let (_, entries) = helper::list_entries(&mut app, &token).await;
    assert_eq!(1, entries.len());
    assert_eq!(
        Some("composed offline, retried".to_string()),
        entries[0].body
    );
}

#[tokio::test]
async fn test_entry_validation() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    // mood outside the scale
    let (status_code, _, error) =
        helper::maybe_create_entry(&mut app, &token, json!({ "mood": 6 })).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Mood must be between 1 and 5".to_string()), error);

    // too many photos
    let photos = (0..6)
        .map(|n| format!("file:///photo-{n}.jpg"))
        .collect::<Vec<String>>();
    let (status_code, _, error) =
        helper::maybe_create_entry(&mut app, &token, json!({ "photoUris": photos })).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("At most 5 photos per entry".to_string()), error);

    // invalid path parameter
    let (status_code, _, error) =
        helper::single_entry_with_str(&mut app, &token, "some-id").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid path parameter".to_string()), error);
}

#[tokio::test]
async fn test_updating_a_missing_entry_is_not_found() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let (status_code, _, error) = helper::maybe_update_entry(
        &mut app,
        &token,
        &uuid::Uuid::new_v4(),
        json!({ "title": "nothing here" }),
    )
    .await;

    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Entry not found".to_string()), error);
}

#[tokio::test]
async fn test_listing_orders_by_date_then_creation() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    // created first, dated later
    helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "body": "dated later", "date": "2025-03-20" }),
    )
    .await;

    // created second, backdated
    helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "body": "backdated", "date": "2025-03-05" }),
    )
    .await;

    let (_, entries) = helper::list_entries(&mut app, &token).await;

    assert_eq!(2, entries.len());
    assert_eq!("2025-03-20", entries[0].date);
    assert_eq!("2025-03-05", entries[1].date);
}
