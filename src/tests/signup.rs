use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_signup_and_login() {
    let mut app = helper::setup_test_app().await;

    // sign up
    let (status_code, token) =
        helper::signup(&mut app, "ada@example.com", "verysecret", Some("Ada")).await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert!(token.is_some());

    // the fresh token works
    let (status_code, entries) = helper::list_entries(&mut app, &token.unwrap()).await;
    assert_eq!(StatusCode::OK, status_code);
    assert!(entries.is_empty());

    // logging in again works too
    let (status_code, token) = helper::login(&mut app, "ada@example.com", "verysecret").await;
    assert_eq!(StatusCode::OK, status_code);
    assert!(token.is_some());
}

#[tokio::test]
async fn test_signup_rejects_duplicates() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    assert_eq!(StatusCode::CREATED, status_code);

    let (status_code, token) =
        helper::signup(&mut app, "ada@example.com", "othersecret", None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(token.is_none());

    // email comparison ignores case and surrounding whitespace
    let (status_code, _) =
        helper::signup(&mut app, "  Ada@Example.com ", "othersecret", None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let mut app = helper::setup_test_app().await;

    helper::signup(&mut app, "ada@example.com", "verysecret", None).await;

    let (status_code, token) = helper::login(&mut app, "ada@example.com", "wrong").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(token.is_none());

    let (status_code, token) = helper::login(&mut app, "nobody@example.com", "wrong").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(token.is_none());
}

#[tokio::test]
async fn test_entries_require_a_token() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) =
        helper::single_entry_with_str(&mut app, "Bearer nonsense", "some-id").await;

    // a bogus token never reaches path validation
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert!(error.is_some());
}
