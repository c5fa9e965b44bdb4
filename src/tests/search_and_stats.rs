use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_blank_search_equals_listing() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    for (date, body) in [
        ("2025-03-12", "midweek walk"),
        ("2025-03-10", "monday planning"),
        ("2025-03-16", "sunday wrap-up"),
    ] {
        helper::maybe_create_entry(&mut app, &token, json!({ "date": date, "body": body })).await;
    }

    let (_, listed) = helper::list_entries(&mut app, &token).await;
    let (_, searched) = helper::search_entries(&mut app, &token, "").await;

    // same set, same order
    assert_eq!(listed, searched);
    assert_eq!(3, listed.len());
}

#[tokio::test]
async fn test_search_matches_title_body_and_tags() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "title": "Gym session", "body": "leg day", "tags": ["fitness"] }),
    )
    .await;
    helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "title": "Quiet evening", "body": "tea and a book" }),
    )
    .await;

    // case-insensitive on the title
    let (_, found) = helper::search_entries(&mut app, &token, "GYM").await;
    assert_eq!(1, found.len());
    assert_eq!(Some("Gym session".to_string()), found[0].title);

    // on the body
    let (_, found) = helper::search_entries(&mut app, &token, "tea").await;
    assert_eq!(1, found.len());
    assert_eq!(Some("Quiet evening".to_string()), found[0].title);

    // on a tag name
    let (_, found) = helper::search_entries(&mut app, &token, "fitness").await;
    assert_eq!(1, found.len());
    assert_eq!(Some("Gym session".to_string()), found[0].title);

    // no match
    let (_, found) = helper::search_entries(&mut app, &token, "missing").await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_search_skips_tombstones() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let (_, entry, _) = helper::maybe_create_entry(
        &mut app,
        &token,
        json!({ "title": "Gym session" }),
    )
    .await;
    helper::delete_entry(&mut app, &token, &entry.unwrap().id).await;

    let (_, found) = helper::search_entries(&mut app, &token, "gym").await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_stats_counts_absent_moods_as_three() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    helper::maybe_create_entry(&mut app, &token, json!({ "mood": 5 })).await;
    helper::maybe_create_entry(&mut app, &token, json!({ "mood": 3 })).await;
    helper::maybe_create_entry(&mut app, &token, json!({ "body": "moodless" })).await;

    let (_, stats) = helper::stats(&mut app, &token).await;

    assert_eq!(3, stats.total_entries);
    // 11 / 3, rounded to one decimal
    assert!((stats.avg_mood - 3.7).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_stats_top_tags() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    helper::maybe_create_entry(&mut app, &token, json!({ "tags": ["work", "family"] })).await;
    helper::maybe_create_entry(&mut app, &token, json!({ "tags": ["work"] })).await;
    helper::maybe_create_entry(&mut app, &token, json!({ "tags": ["work", "health"] })).await;

    let (_, stats) = helper::stats(&mut app, &token).await;

    assert_eq!("work", stats.top_tags[0]);
    assert_eq!(3, stats.top_tags.len());
}

#[tokio::test]
async fn test_stats_days_and_streaks() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    // three consecutive days plus a duplicate, well in the past
    for date in ["2025-03-10", "2025-03-10", "2025-03-11", "2025-03-12"] {
        helper::maybe_create_entry(&mut app, &token, json!({ "date": date })).await;
    }

    let (_, stats) = helper::stats(&mut app, &token).await;

    assert_eq!(4, stats.total_entries);
    assert_eq!(3, stats.total_days);
    assert_eq!(3, stats.longest_streak);
    // nothing written today or yesterday
    assert_eq!(0, stats.current_streak);
}

#[tokio::test]
async fn test_tag_suggestions() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    helper::maybe_create_entry(&mut app, &token, json!({ "tags": ["deep-work"] })).await;
    helper::maybe_create_entry(&mut app, &token, json!({ "tags": ["deep-work", "reading"] })).await;

    // without input: own tags first, padded with presets
    let (_, suggestions) = helper::tag_suggestions(&mut app, &token, None).await;
    assert_eq!(5, suggestions.len());
    assert_eq!("deep-work", suggestions[0]);
    assert_eq!("reading", suggestions[1]);

    // with input: matching candidates, the input itself excluded
    let (_, suggestions) = helper::tag_suggestions(&mut app, &token, Some("work")).await;
    assert!(suggestions.contains(&"deep-work".to_string()));
    assert!(!suggestions.contains(&"reading".to_string()));
}

#[tokio::test]
async fn test_stats_on_an_empty_journal() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    let (_, stats) = helper::stats(&mut app, &token).await;

    assert_eq!(0, stats.total_entries);
    assert!((stats.avg_mood - 0.0).abs() < f64::EPSILON);
    assert!(stats.top_tags.is_empty());
}
