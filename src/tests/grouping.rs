use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

async fn seed_entries(app: &mut helper::TestApp, token: &str) {
    // 2025-03-10 is a Monday; 2025-04-01 is the Tuesday of the week
    // starting 2025-03-31
    for (date, body) in [
        ("2025-03-10", "start of the week"),
        ("2025-03-12", "midweek"),
        ("2025-03-16", "sunday wrap-up"),
        ("2025-04-01", "new month"),
    ] {
        let (status_code, _, _) =
            helper::maybe_create_entry(app, token, json!({ "date": date, "body": body })).await;
        assert_eq!(StatusCode::CREATED, status_code);
    }
}

#[tokio::test]
async fn test_grouping_by_day() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    seed_entries(&mut app, &token).await;

    let (_, grouped) = helper::group_entries(&mut app, &token, "day").await;

    assert_eq!(4, grouped.len());

    // every entry sits under exactly its own date key
    for (key, entries) in &grouped {
        assert_eq!(1, entries.len());
        assert_eq!(key, &entries[0].date);
    }
}

#[tokio::test]
async fn test_grouping_by_week_keys_on_monday() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    seed_entries(&mut app, &token).await;

    let (_, grouped) = helper::group_entries(&mut app, &token, "week").await;

    assert_eq!(2, grouped.len());
    assert_eq!(3, grouped["2025-03-10"].len());
    assert_eq!(1, grouped["2025-03-31"].len());
}

#[tokio::test]
async fn test_grouping_by_month_keys_on_first_day() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    seed_entries(&mut app, &token).await;

    let (_, grouped) = helper::group_entries(&mut app, &token, "month").await;

    assert_eq!(2, grouped.len());
    assert_eq!(3, grouped["2025-03-01"].len());
    assert_eq!(1, grouped["2025-04-01"].len());
}

#[tokio::test]
async fn test_grouping_ignores_tombstones() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let (_, entry, _) = helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "date": "2025-03-10", "body": "soon gone" }),
    )
    .await;
    helper::delete_entry(&mut app, &token, &entry.unwrap().id).await;

    let (_, grouped) = helper::group_entries(&mut app, &token, "day").await;
    assert!(grouped.is_empty());
}

#[tokio::test]
async fn test_grouping_rejects_unknown_buckets() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let (status_code, error) = helper::try_group_entries(&mut app, &token, "fortnight").await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid query parameter".to_string()), error);
}

#[tokio::test]
async fn test_date_range_listing() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    seed_entries(&mut app, &token).await;

    let (_, entries) = helper::range_entries(&mut app, &token, "2025-03-10", "2025-03-12").await;

    assert_eq!(2, entries.len());
    // both bounds are inclusive, newest first
    assert_eq!("2025-03-12", entries[0].date);
    assert_eq!("2025-03-10", entries[1].date);
}
