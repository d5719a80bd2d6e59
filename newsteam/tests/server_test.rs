mod support;

use mockito::Matcher;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

use common::TOPICS;
use newsteam::server::{build_rocket, AppState};
use support::{headlines_body, pipeline, RecordingProvider, HEADLINES_PATH};

async fn client(server_url: &str, provider: std::sync::Arc<RecordingProvider>) -> Client {
    let state = AppState::new(pipeline(server_url, provider), "us", 3);
    Client::tracked(build_rocket(state, rocket::Config::figment()))
        .await
        .expect("valid rocket instance")
}

#[rocket::async_test]
async fn index_lists_every_topic() {
    let server = mockito::Server::new_async().await;
    let client = client(&server.url(), RecordingProvider::new()).await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::HTML));

    let body = response.into_string().await.unwrap();
    assert!(body.contains("AI News Summarizer"));
    for topic in TOPICS {
        assert!(body.contains(&format!("<option value=\"{}\"", topic)));
    }
    assert!(body.contains("Get Latest News"));
}

#[rocket::async_test]
async fn form_submission_renders_summaries() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", HEADLINES_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "sports".into()),
            Matcher::UrlEncoded("country".into(), "us".into()),
        ]))
        .with_status(200)
        .with_body(headlines_body(&[
            ("Cup final <live>", Some("Extra time & penalties."), "https://a.test/final"),
            ("Transfer news", Some("A striker moves."), "javascript:alert(1)"),
        ]))
        .create_async()
        .await;

    let provider = RecordingProvider::new();
    let client = client(&server.url(), provider.clone()).await;

    let response = client
        .post("/news")
        .header(ContentType::Form)
        .body("topic=sports")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    assert!(body.contains("<option value=\"sports\" selected>"));
    assert!(body.contains("<h3>📰 Cup final &lt;live&gt;</h3>"));
    assert!(body.contains("href=\"https://a.test/final\""));
    assert!(body.contains("🤖 AI Summary: reply to: Extra time &amp; penalties."));
    assert!(!body.contains("javascript:"));

    assert_eq!(provider.calls(), 2);
    mock.assert_async().await;
}

#[rocket::async_test]
async fn form_submission_shows_source_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", HEADLINES_PATH)
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"bad key"}"#)
        .create_async()
        .await;

    let provider = RecordingProvider::new();
    let client = client(&server.url(), provider.clone()).await;

    let response = client
        .post("/news")
        .header(ContentType::Form)
        .body("topic=business")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    assert!(body.contains(
        "<p class=\"error\">Error fetching news: {&quot;message&quot;:&quot;bad key&quot;}</p>"
    ));
    assert_eq!(provider.calls(), 0);
}

#[rocket::async_test]
async fn json_api_returns_summaries() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", HEADLINES_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "health".into()),
            Matcher::UrlEncoded("country".into(), "gb".into()),
        ]))
        .with_status(200)
        .with_body(headlines_body(&[
            ("One", Some("About one"), "https://a.test/1"),
            ("Two", None, "https://a.test/2"),
        ]))
        .create_async()
        .await;

    let client = client(&server.url(), RecordingProvider::new()).await;

    let response = client
        .get("/api/v1/news?topic=health&country=gb&count=1")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let json: serde_json::Value = response.into_json().await.unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "One");
    assert_eq!(items[0]["url"], "https://a.test/1");
    assert_eq!(items[0]["summary"], "reply to: About one");
}

#[rocket::async_test]
async fn json_api_maps_failures_to_bad_gateway() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", HEADLINES_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("rate limited")
        .create_async()
        .await;

    let client = client(&server.url(), RecordingProvider::new()).await;

    let response = client.get("/api/v1/news?topic=science").dispatch().await;
    assert_eq!(response.status(), Status::BadGateway);

    let json: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(json["error"], "Error fetching news: rate limited");
    assert_eq!(json["upstream_status"], 429);
}

#[rocket::async_test]
async fn health_and_status() {
    let server = mockito::Server::new_async().await;
    let client = client(&server.url(), RecordingProvider::new()).await;

    let response = client.get("/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().await.unwrap(), "OK");

    let response = client.get("/api/v1/status").dispatch().await;
    let json: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["default_country"], "us");
    assert_eq!(json["default_count"], 3);
    assert_eq!(json["topics"].as_array().unwrap().len(), TOPICS.len());
}
