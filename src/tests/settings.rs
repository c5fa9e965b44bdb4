use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_settings_round_trip() {
    let mut app = helper::setup_test_app().await;
    let (_, token) = helper::signup(&mut app, "ada@example.com", "verysecret", None).await;
    let token = token.unwrap();

    // missing key
    let (status_code, value) = helper::get_setting(&mut app, &token, "theme").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(None, value);

    // write, read back
    let status_code = helper::put_setting(&mut app, &token, "theme", "dark").await;
    assert_eq!(StatusCode::OK, status_code);

    let (status_code, value) = helper::get_setting(&mut app, &token, "theme").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some("dark".to_string()), value);

    // overwrite
    helper::put_setting(&mut app, &token, "theme", "light").await;
    let (_, value) = helper::get_setting(&mut app, &token, "theme").await;
    assert_eq!(Some("light".to_string()), value);
}
