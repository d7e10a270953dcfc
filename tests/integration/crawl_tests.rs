//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the listing API and run the
//! fetcher, engine and CSV export end-to-end.

use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vidsift::config::{ApiConfig, Config, CrawlerConfig, OutputConfig};
use vidsift::crawler::{
    build_http_client, BatchRunner, CrawlEngine, Endpoint, HttpPageFetcher, PageFetcher,
    TargetSpec,
};
use vidsift::output::{CsvSink, OutputResult, ResultSink, SinkReport};
use vidsift::{CrawlOutcome, FetchError, RejectCode, StopReason};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POPULAR_PATH: &str = "/x/web-interface/popular";
const RANKING_PATH: &str = "/x/web-interface/ranking/v2";

/// Creates a test configuration pointing at the mock server, with no delays
fn create_test_config(base_url: &str, out_dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages: 10,
            max_empty_pages: 3,
            page_size: 20,
            request_timeout: 5,
            delay_min: 0.0,
            delay_max: 0.0,
            ..CrawlerConfig::default()
        },
        api: ApiConfig {
            base_url: base_url.to_string(),
            user_agent: "vidsift-test/1.0".to_string(),
            ..ApiConfig::default()
        },
        output: OutputConfig {
            ranking_dir: out_dir.path().join("ranking").display().to_string(),
            popular_dir: out_dir.path().join("popular").display().to_string(),
            csv_prefix: "TOP".to_string(),
        },
        ..Config::default()
    }
}

fn entry(id: &str, views: u64, likes: u64) -> Value {
    json!({
        "bvid": id,
        "title": format!("  title {}  ", id),
        "owner": { "name": "up" },
        "stat": { "view": views, "like": likes, "coin": 7, "favorite": 5, "share": 3, "reply": 2, "danmaku": 1 },
        "duration": 120,
        "pubdate": 1700000000,
        "pic": "https://example.com/cover.jpg",
        "desc": "description"
    })
}

fn listing(entries: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "message": "0",
        "data": { "list": entries }
    }))
}

async fn mount_popular_page(server: &MockServer, page: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(POPULAR_PATH))
        .and(query_param("pn", page.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn popular_engine(config: &Config) -> CrawlEngine<HttpPageFetcher> {
    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let fetcher = HttpPageFetcher::new(client, &config.api, Endpoint::Popular).unwrap();
    CrawlEngine::from_config(fetcher, &config.crawler)
}

#[tokio::test]
async fn test_popular_crawl_stops_at_target() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    mount_popular_page(
        &mock_server,
        1,
        listing(vec![
            entry("BV1", 1000, 200),
            entry("BV2", 1000, 50),
            entry("BV3", 0, 0),
        ]),
    )
    .await;
    mount_popular_page(
        &mock_server,
        2,
        listing(vec![entry("BV4", 1000, 300), entry("BV5", 1000, 150)]),
    )
    .await;

    // Page 3 must never be requested
    Mock::given(method("GET"))
        .and(path(POPULAR_PATH))
        .and(query_param("pn", "3"))
        .respond_with(listing(vec![entry("BV6", 1000, 900)]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut engine = popular_engine(&config);
    let target = TargetSpec::popular(&config.crawler, 2, 10);
    let outcome = engine.run(&target).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::TargetReached);
    assert_eq!(outcome.pages_fetched, 2);
    let ids: Vec<_> = outcome.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["BV1", "BV4"]);
    assert_eq!(outcome.records[0].title, "title BV1");
    assert_eq!(outcome.records[0].score.to_string(), "0.2000");
}

#[tokio::test]
async fn test_popular_request_parameters_and_headers() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    Mock::given(method("GET"))
        .and(path(POPULAR_PATH))
        .and(query_param("ps", "20"))
        .and(query_param("pn", "1"))
        .and(header("user-agent", "vidsift-test/1.0"))
        .and(header("referer", "https://www.bilibili.com/"))
        .respond_with(listing(vec![entry("BV1", 100, 50)]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let fetcher = HttpPageFetcher::new(client, &config.api, Endpoint::Popular).unwrap();

    let page = fetcher.fetch(1, 20).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.records[0].id, "BV1");
    assert_eq!(page.records[0].stats.approvals, 50);
}

#[tokio::test]
async fn test_blocked_pages_hit_empty_ceiling() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    Mock::given(method("GET"))
        .and(path(POPULAR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -352,
            "message": "-352",
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut engine = popular_engine(&config);
    let target = TargetSpec::popular(&config.crawler, 10, 10);
    let outcome = engine.run(&target).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::EmptyPageCeiling);
    assert!(outcome.is_empty());
    assert_eq!(outcome.errors.blocked, 3);
    assert_eq!(outcome.last_page, 3);
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    mount_popular_page(&mock_server, 1, ResponseTemplate::new(500)).await;
    mount_popular_page(
        &mock_server,
        2,
        ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
    )
    .await;
    mount_popular_page(&mock_server, 3, listing(vec![entry("BV9", 100, 40)])).await;

    let mut engine = popular_engine(&config);
    let target = TargetSpec::popular(&config.crawler, 10, 3);
    let outcome = engine.run(&target).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::MaxPages);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.last_page, 3);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.errors.rejected, 1);
    assert_eq!(outcome.errors.malformed, 1);
}

#[tokio::test]
async fn test_http_status_maps_to_server_rejected() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    mount_popular_page(&mock_server, 1, ResponseTemplate::new(412)).await;

    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let fetcher = HttpPageFetcher::new(client, &config.api, Endpoint::Popular).unwrap();

    let result = fetcher.fetch(1, 20).await;
    assert_eq!(
        result,
        Err(FetchError::ServerRejected(RejectCode::Http(412)))
    );
}

#[tokio::test]
async fn test_timeout_maps_to_transport_error() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    mount_popular_page(
        &mock_server,
        1,
        listing(vec![entry("BV1", 100, 50)]).set_delay(Duration::from_secs(2)),
    )
    .await;

    let client = build_http_client(&config.api, Duration::from_millis(200)).unwrap();
    let fetcher = HttpPageFetcher::new(client, &config.api, Endpoint::Popular).unwrap();

    let result = fetcher.fetch(1, 20).await;
    assert!(matches!(result, Err(FetchError::Transport(_))));
}

#[tokio::test]
async fn test_ranking_batch_writes_csv_per_category() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    Mock::given(method("GET"))
        .and(path(RANKING_PATH))
        .and(query_param("rid", "3"))
        .and(query_param("type", "all"))
        .respond_with(listing(vec![
            entry("BV1", 1000, 120),
            entry("BV2", 1000, 10),
            entry("BV3", 1000, 300),
        ]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(RANKING_PATH))
        .and(query_param("rid", "4"))
        .respond_with(listing(vec![entry("BV4", 1000, 20)]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let categories = vec![
        config.find_category("music").unwrap().clone(),
        config.find_category("game").unwrap().clone(),
    ];

    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let mut sink = CsvSink::new(&config.output.ranking_dir, config.api.content_url_base.clone());
    let runner = BatchRunner::new(config.clone(), client);

    let summary = runner.run_ranking(&categories, 100, &mut sink).await.unwrap();

    assert_eq!(summary.runs.len(), 2);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.aborted);
    assert!(summary.runs[1].export.is_none());

    let music = &summary.runs[0];
    assert_eq!(music.outcome.stop_reason, StopReason::MaxPages);
    assert_eq!(music.export.as_ref().unwrap().rows, 2);

    let csv_path = sink.path_for("TOP-音乐-high-quality");
    let text = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.trim_start_matches('\u{feff}').lines();
    assert!(lines.next().unwrap().starts_with("rank,title,author,views,likes,like_rate"));
    assert!(lines.next().unwrap().starts_with("1,title BV3,up,1000,300,0.3000,7,5,3,2,1,120,https://www.bilibili.com/video/BV3,BV3,"));
    assert!(lines.next().unwrap().starts_with("2,title BV1,up,1000,120,0.1200,"));
    assert!(lines.next().is_none());

    assert!(!sink.path_for("TOP-游戏-high-quality").exists());
}

#[tokio::test]
async fn test_ranking_batch_aborts_when_blocked() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &out_dir);
    config.crawler.abort_on_blocked = true;

    Mock::given(method("GET"))
        .and(path(RANKING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -352,
            "message": "-352",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let categories = vec![
        config.find_category("music").unwrap().clone(),
        config.find_category("game").unwrap().clone(),
    ];

    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let mut sink = CsvSink::new(&config.output.ranking_dir, config.api.content_url_base.clone());
    let runner = BatchRunner::new(config.clone(), client);

    let summary = runner.run_ranking(&categories, 100, &mut sink).await.unwrap();

    assert!(summary.aborted);
    assert_eq!(summary.runs.len(), 1);
    assert_eq!(summary.runs[0].outcome.errors.blocked, 1);
}

/// Records exports and fires a cancellation token on the first one
struct CancellingSink {
    cancel: CancellationToken,
    written: Vec<String>,
}

impl ResultSink for CancellingSink {
    fn write(&mut self, name: &str, outcome: &CrawlOutcome) -> OutputResult<SinkReport> {
        self.written.push(name.to_string());
        self.cancel.cancel();
        Ok(SinkReport {
            location: name.to_string(),
            rows: outcome.records.len(),
        })
    }
}

#[tokio::test]
async fn test_ranking_batch_cancelled_between_categories() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &out_dir);
    config.crawler.delay_min = 600.0;
    config.crawler.delay_max = 600.0;

    Mock::given(method("GET"))
        .and(path(RANKING_PATH))
        .and(query_param("rid", "3"))
        .respond_with(listing(vec![entry("BV1", 1000, 200)]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(RANKING_PATH))
        .and(query_param("rid", "4"))
        .respond_with(listing(vec![entry("BV2", 1000, 200)]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let categories = vec![
        config.find_category("music").unwrap().clone(),
        config.find_category("game").unwrap().clone(),
    ];

    let cancel = CancellationToken::new();
    let mut sink = CancellingSink {
        cancel: cancel.clone(),
        written: Vec::new(),
    };
    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let runner = BatchRunner::new(config.clone(), client).with_cancellation(cancel);

    let summary = tokio::time::timeout(
        Duration::from_secs(10),
        runner.run_ranking(&categories, 100, &mut sink),
    )
    .await
    .expect("batch kept waiting after cancellation")
    .unwrap();

    assert!(summary.cancelled);
    assert!(!summary.aborted);
    assert_eq!(summary.runs.len(), 1);
    assert_eq!(summary.runs[0].outcome.records.len(), 1);
    assert_eq!(sink.written, vec!["TOP-音乐-high-quality".to_string()]);
}

#[tokio::test]
async fn test_popular_batch_writes_timestamped_csv() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    mount_popular_page(&mock_server, 1, listing(vec![entry("BV1", 1000, 200)])).await;
    mount_popular_page(&mock_server, 2, listing(vec![entry("BV2", 1000, 250)])).await;

    let client = build_http_client(&config.api, Duration::from_secs(5)).unwrap();
    let mut sink = CsvSink::new(&config.output.popular_dir, config.api.content_url_base.clone());
    let runner = BatchRunner::new(config.clone(), client);

    let run = runner.run_popular(2, 5, &mut sink).await.unwrap();

    assert_eq!(run.outcome.stop_reason, StopReason::TargetReached);
    let export = run.export.unwrap();
    assert_eq!(export.rows, 2);
    assert!(export.location.contains("popular-high-quality-"));
    assert!(export.location.ends_with(".csv"));
}

#[tokio::test]
async fn test_sink_write_directly() {
    let mock_server = MockServer::start().await;
    let out_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &out_dir);

    mount_popular_page(&mock_server, 1, listing(vec![entry("BV1", 10, 9)])).await;

    let mut engine = popular_engine(&config);
    let outcome = engine
        .run(&TargetSpec::popular(&config.crawler, 1, 1))
        .await
        .unwrap();

    let mut sink = CsvSink::new(out_dir.path(), "https://example.com/v/");
    let report = sink.write("single", &outcome).unwrap();

    assert_eq!(report.rows, 1);
    let text = std::fs::read_to_string(out_dir.path().join("single.csv")).unwrap();
    assert!(text.contains("https://example.com/v/BV1"));
    assert!(text.contains(",0.9000,"));
}
