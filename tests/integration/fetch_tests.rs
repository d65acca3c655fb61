//! Integration tests for the HTTP fetcher and the per-item pipeline
//!
//! These tests use wiremock to stand in for the target site.

use vpn_sweep::config::{ExtractConfig, TargetConfig};
use vpn_sweep::crawler::{
    BlockDetector, ContentFetcher, HttpFetcher, PageSignals, ProcessOutcome, ProfileExtractor,
    WorkProcessor,
};
use vpn_sweep::input::WorkItem;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PAGE: &str = r#"
    <html><body>
        <h2>Rezultati pretrage</h2>
        <a href="/pretraga?strana=2">Sljedeća</a>
        <a href="/firma/alpha-doo/02012345">Alpha d.o.o.</a>
    </body></html>
"#;

const PROFILE_PAGE: &str = r#"
    <html><body>
        <h1>Alpha d.o.o.</h1>
        <div class="qanda-body">Koja je adresa firme? Njegoševa 12, Nikšić</div>
        <div class="qanda-body">Koliki je prihod? <span class="text-bold">12.500,00 €</span></div>
        <p>E-mail: office@alpha.me</p>
        <p>Tel: 040 212 345</p>
        <p>Šifra djelatnosti KD 4690</p>
    </body></html>
"#;

/// Creates a target configuration pointing at the mock server
fn create_test_config(base_url: &str) -> TargetConfig {
    TargetConfig {
        search_url: format!("{}/pretraga", base_url),
        search_param: "n".to_string(),
        profile_link_selector: "a[href*='/firma/']".to_string(),
        blocked_patterns: vec!["registracija".to_string()],
        blocked_statuses: vec![429],
        user_agent: "TestBot/1.0".to_string(),
        request_timeout: 5,
        item_delay: 0,
    }
}

fn processor(config: &TargetConfig) -> WorkProcessor {
    WorkProcessor::new(
        Box::new(HttpFetcher::new(config).unwrap()),
        Box::new(ProfileExtractor::new(&ExtractConfig::default()).unwrap()),
        BlockDetector::from_config(config),
    )
}

async fn mount_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/pretraga"))
        .and(query_param("n", "02012345"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_locate_finds_profile_link() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server).await;
    let fetcher = HttpFetcher::new(&create_test_config(&mock_server.uri())).unwrap();

    let located = fetcher.locate("02012345").await.unwrap();

    assert_eq!(located.status, 200);
    assert!(located
        .landed_at
        .starts_with(&format!("{}/pretraga", mock_server.uri())));
    assert_eq!(
        located.target,
        Some(format!("{}/firma/alpha-doo/02012345", mock_server.uri()))
    );
}

#[tokio::test]
async fn test_locate_follows_redirect_to_block_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pretraga"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/registracija"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/registracija"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Registrujte se</h1>"))
        .mount(&mock_server)
        .await;
    let config = create_test_config(&mock_server.uri());
    let fetcher = HttpFetcher::new(&config).unwrap();

    let located = fetcher.locate("02012345").await.unwrap();

    assert_eq!(located.landed_at, format!("{}/registracija", mock_server.uri()));
    assert!(located.target.is_none());
    assert!(BlockDetector::from_config(&config)
        .is_blocked(&PageSignals::new(&located.landed_at, Some(located.status))));
}

#[tokio::test]
async fn test_process_extracts_profile() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/firma/alpha-doo/02012345"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_PAGE))
        .mount(&mock_server)
        .await;

    let outcome = processor(&create_test_config(&mock_server.uri()))
        .process(&WorkItem::new("02012345"))
        .await;

    let ProcessOutcome::Completed(result) = outcome else {
        panic!("expected a completed item, got {:?}", outcome);
    };
    assert_eq!(result.key, "02012345");
    assert_eq!(result.fields.name, "Alpha d.o.o.");
    assert_eq!(result.fields.contact_email, "office@alpha.me");
    assert_eq!(result.fields.phone, "040 212 345");
    assert_eq!(result.fields.activity_code, "4690");
    assert_eq!(result.fields.revenue, "12500.00");
    assert_eq!(result.fields.locality, "NIKŠIĆ");
}

#[tokio::test]
async fn test_process_reports_redirected_profile_as_blocked() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/firma/alpha-doo/02012345"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/registracija?next=/firma"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/registracija"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Prijava</h1>"))
        .mount(&mock_server)
        .await;

    let outcome = processor(&create_test_config(&mock_server.uri()))
        .process(&WorkItem::new("02012345"))
        .await;

    assert!(matches!(outcome, ProcessOutcome::Blocked { .. }));
}

#[tokio::test]
async fn test_process_blocked_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pretraga"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let outcome = processor(&create_test_config(&mock_server.uri()))
        .process(&WorkItem::new("02012345"))
        .await;

    assert!(matches!(outcome, ProcessOutcome::Blocked { .. }));
}

#[tokio::test]
async fn test_process_server_error_gives_empty_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pretraga"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let outcome = processor(&create_test_config(&mock_server.uri()))
        .process(&WorkItem::new("02012345"))
        .await;

    let ProcessOutcome::Completed(result) = outcome else {
        panic!("expected a completed item, got {:?}", outcome);
    };
    assert!(!result.has_data());
}

#[tokio::test]
async fn test_process_profile_error_page_gives_empty_result() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/firma/alpha-doo/02012345"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_string("<h1>Service Unavailable</h1><p>Error 5030</p>"),
        )
        .mount(&mock_server)
        .await;

    let outcome = processor(&create_test_config(&mock_server.uri()))
        .process(&WorkItem::new("02012345"))
        .await;

    let ProcessOutcome::Completed(result) = outcome else {
        panic!("expected a completed item, got {:?}", outcome);
    };
    assert!(!result.has_data());
    assert_eq!(result.fields.name, "");
    assert_eq!(result.fields.activity_code, "");
}

#[tokio::test]
async fn test_process_unreachable_site_gives_empty_result() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());
    drop(mock_server);

    let outcome = processor(&config).process(&WorkItem::new("02012345")).await;

    assert!(matches!(outcome, ProcessOutcome::Completed(ref r) if !r.has_data()));
}
