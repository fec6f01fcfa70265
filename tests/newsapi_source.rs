//! Integration tests for `NewsApiSource` using wiremock HTTP mocks.

use chrono::{Duration, TimeZone, Utc};
use std::time::Duration as StdDuration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_news_relay::ingest::providers::newsapi::{NewsApiSource, QueryRules};
use market_news_relay::{ArticleSource, FetchWindow};

fn window() -> FetchWindow {
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
    FetchWindow::ending_at(now, Duration::hours(24))
}

fn test_source(base_url: &str) -> NewsApiSource {
    let query = QueryRules {
        terms: vec!["inflation".into(), "bitcoin".into()],
        language: "en".into(),
        page_size: 10,
    };
    NewsApiSource::new("test-key", query, StdDuration::from_secs(5))
        .expect("client construction should not fail")
        .with_base_url(base_url)
}

#[tokio::test]
async fn fetch_sends_window_and_parses_articles() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": { "id": "reuters", "name": "Reuters" },
                "title": "Inflation cools",
                "description": "Prices rose less than expected.",
                "url": "https://n.test/1",
                "publishedAt": "2025-09-06T09:00:00Z",
                "content": "Prices rose less than expected… [+1200 chars]"
            },
            {
                "source": { "id": null, "name": "CoinDesk" },
                "title": "Bitcoin steady",
                "description": null,
                "url": null,
                "publishedAt": "2025-09-06T10:00:00Z",
                "content": null
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", "inflation OR bitcoin"))
        .and(query_param("from", "2025-09-05T12:00:00Z"))
        .and(query_param("to", "2025-09-06T12:00:00Z"))
        .and(query_param("language", "en"))
        .and(query_param("pageSize", "10"))
        .and(query_param("sortBy", "publishedAt"))
        .and(query_param("apiKey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let articles = test_source(&server.uri())
        .fetch(&window())
        .await
        .expect("should parse articles");

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].url.as_deref(), Some("https://n.test/1"));
    assert_eq!(articles[0].source_name, "Reuters");
    assert_eq!(articles[0].published_at, "2025-09-06T09:00:00Z");
    assert_eq!(articles[1].url, None);
    assert_eq!(articles[1].description, "");
}

#[tokio::test]
async fn error_status_is_a_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&server)
        .await;

    let err = test_source(&server.uri())
        .fetch(&window())
        .await
        .expect_err("401 must fail");
    assert!(format!("{err:#}").contains("apiKeyInvalid"));
}

#[tokio::test]
async fn error_body_with_200_is_still_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "code": "rateLimited",
            "message": "Too many requests."
        })))
        .mount(&server)
        .await;

    assert!(test_source(&server.uri()).fetch(&window()).await.is_err());
}

#[tokio::test]
async fn non_json_body_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    assert!(test_source(&server.uri()).fetch(&window()).await.is_err());
}
