//! Integration tests for `ScrapeEngine` against a wiremock HTTP server.

use offerwatch_core::ScrapeStatus;
use offerwatch_scraper::{ScrapeConfig, ScrapeEngine};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Engine with zero backoff so retry tests run instantly.
fn test_engine(max_retries: u32) -> ScrapeEngine {
    ScrapeEngine::new(ScrapeConfig {
        timeout_ms: 5_000,
        user_agent: "offerwatch-test/0.1".to_string(),
        max_retries,
        backoff_base_ms: 0,
        backoff_cap_ms: 0,
    })
    .expect("engine construction should not fail")
}

const AD_PAGE: &str = r#"<html><body>
  <h1>Emagrecedor Turbo</h1>
  <div>12 ads found for this page</div>
  <p>Perca peso em 30 dias com o método comprovado por especialistas!</p>
  <div role="article"></div>
</body></html>"#;

#[tokio::test]
async fn successful_fetch_maps_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AD_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_engine(3).scrape(&format!("{}/library", server.uri())).await;

    assert_eq!(result.status, ScrapeStatus::Success);
    assert_eq!(result.campaigns_count, 12);
    assert_eq!(result.creatives_count, 12);
    assert_eq!(result.page_name.as_deref(), Some("Emagrecedor Turbo"));
    assert_eq!(result.ad_texts.as_ref().map(Vec::len), Some(1));
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn empty_page_is_partial_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_engine(3).scrape(&server.uri()).await;

    assert_eq!(result.status, ScrapeStatus::Partial);
    assert_eq!(result.campaigns_count, 0);
    assert_eq!(result.creatives_count, 0);
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn server_errors_exhaust_the_attempt_budget() {
    let server = MockServer::start().await;
    // expect(3) asserts the engine made exactly max_retries attempts.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let result = test_engine(3).scrape(&server.uri()).await;

    assert_eq!(result.status, ScrapeStatus::Failed);
    assert_eq!(result.campaigns_count, 0);
    assert_eq!(result.creatives_count, 0);
    let message = result.error_message.expect("failed result carries message");
    assert!(message.contains("500"), "message should name the status: {message}");
}

#[tokio::test]
async fn transient_failure_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AD_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_engine(3).scrape(&server.uri()).await;

    assert_eq!(result.status, ScrapeStatus::Success);
    assert_eq!(result.campaigns_count, 12);
}

#[tokio::test]
async fn unreachable_host_becomes_failed_result() {
    // Nothing listens on this port; the connect error must become data.
    let result = test_engine(2).scrape("http://127.0.0.1:9/library").await;

    assert_eq!(result.status, ScrapeStatus::Failed);
    assert!(result.error_message.is_some());
}

#[tokio::test]
async fn zero_attempt_budget_fails_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AD_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let result = test_engine(0).scrape(&server.uri()).await;
    assert_eq!(result.status, ScrapeStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some("max retries exceeded"));
}
