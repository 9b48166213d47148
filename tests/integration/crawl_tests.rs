//! Integration tests for the crawler
//!
//! These tests drive the frontier, workers and pool end-to-end: with a stub
//! fetcher, through a real SQLite file, and against a wiremock HTTP server.

use anteater::config::{
    Config, ContentConfig, CrawlerConfig, ScopeConfig, StorageConfig, UserAgentConfig,
};
use anteater::crawler::{
    process_page, CrawlPool, Fetch, FetchError, Frontier, HtmlExtractor, HttpFetcher, Response,
};
use anteater::storage::{open_store, Store};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEED: &str = "https://www.ics.uci.edu/";

/// Creates a test configuration over the given domains and seeds
fn create_test_config(domains: &[&str], seeds: &[&str], db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            workers: 2,
            politeness_interval: 10, // Very short for testing
            time_delay: 0,
            poll_timeout: 200,
        },
        content: ContentConfig::default(),
        scope: ScopeConfig::new(domains.iter().copied()),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            save_file: db_path.to_string_lossy().into_owned(),
        },
    }
}

const MACHINE_LEARNING: &str = "Our machine learning group studies statistical models, \
    deep neural networks, probabilistic inference and reinforcement learning. Weekly \
    reading sessions cover recent conference papers, and graduate students present \
    ongoing thesis work to faculty advisors every Thursday afternoon.";

const COMPUTER_VISION: &str = "Computer vision researchers build systems that recognize \
    objects in photographs, reconstruct three dimensional scenes from video, and track \
    pedestrians across camera networks. Lab openings for summer internships are posted \
    each spring on the departmental bulletin.";

const PARKING: &str = "Parking permits for the fall quarter go on sale next Monday at the \
    transportation office near the main library. Bring a student identification card, \
    vehicle registration and a form of payment accepted by the cashier; lost permits \
    cannot be refunded or transferred.";

/// Builds a page whose only visible text is `text`
fn html_page(text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{}\"></a>\n", l))
        .collect();

    format!("<html><body><p>{}</p>{}</body></html>", text, anchors)
}

/// Serves canned pages; anything else fails to connect
struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.clone()))
                .collect(),
        }
    }
}

impl Fetch for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        self.pages
            .get(url)
            .map(|body| Response::new(200, body.clone()))
            .ok_or_else(|| FetchError::Connect(format!("no route to {}", url)))
    }
}

#[tokio::test]
async fn test_seed_page_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &["ics.uci.edu", "cs.uci.edu", "informatics.uci.edu", "stat.uci.edu"],
        &[SEED],
        &dir.path().join("frontier.db"),
    );

    let frontier = Frontier::open(&config, true).unwrap();
    assert_eq!(frontier.pending(), vec![SEED.to_string()]);

    let fetcher = StubFetcher::new(&[(
        SEED,
        html_page(
            MACHINE_LEARNING,
            &[
                "/about/",
                "https://www.stat.uci.edu/seminars",
                "https://www.google.com/search",
            ],
        ),
    )]);

    let url = frontier.next_url().await.unwrap();
    assert_eq!(url, SEED);

    let outcome = process_page(&url, &fetcher, &HtmlExtractor, &frontier, &config.content)
        .await
        .unwrap();
    frontier.mark_complete(&url).unwrap();

    assert_eq!(outcome.links_enqueued, 2);
    assert!(frontier.record(SEED).unwrap().unwrap().completed);

    for link in [
        "https://www.ics.uci.edu/about/",
        "https://www.stat.uci.edu/seminars",
    ] {
        let record = frontier.record(link).unwrap().expect("in-scope link recorded");
        assert!(!record.completed);
    }
    assert!(frontier
        .record("https://www.google.com/search")
        .unwrap()
        .is_none());

    let pending: HashSet<String> = frontier.pending().into_iter().collect();
    assert_eq!(pending.len(), 2);
}

#[tokio::test]
async fn test_pool_drains_frontier() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["ics.uci.edu"], &[SEED], &dir.path().join("frontier.db"));

    let fetcher = StubFetcher::new(&[
        (
            SEED,
            html_page(MACHINE_LEARNING, &["/a", "/b", "/missing", "/report.pdf"]),
        ),
        (
            "https://www.ics.uci.edu/a",
            html_page(COMPUTER_VISION, &["/", "/b"]),
        ),
        // Same text as the seed: a near-duplicate whose links are not followed
        (
            "https://www.ics.uci.edu/b",
            html_page(MACHINE_LEARNING, &["/never-followed"]),
        ),
    ]);

    let frontier = Arc::new(Frontier::open(&config, true).unwrap());
    let pool = CrawlPool::new(Arc::clone(&frontier), fetcher, HtmlExtractor, &config);
    let report = pool.run().await;

    assert_eq!(report.crawled, 2);
    assert_eq!(report.near_duplicates, 1);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.processed(), 4);
    assert_eq!(frontier.pending_len(), 0);
    assert_eq!(frontier.in_flight(), 0);
    assert!(frontier
        .record("https://www.ics.uci.edu/never-followed")
        .unwrap()
        .is_none());
    assert!(frontier
        .record("https://www.ics.uci.edu/report.pdf")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_crash_recovery_from_sqlite() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("frontier.db");
    let config = create_test_config(&["ics.uci.edu"], &[SEED], &db_path);

    let incomplete = [
        "https://www.ics.uci.edu/one",
        "https://www.ics.uci.edu/two",
        "https://vision.ics.uci.edu/three",
    ];
    let complete = ["https://www.ics.uci.edu/done-1", "https://www.ics.uci.edu/done-2"];

    {
        let frontier = Frontier::open(&config, true).unwrap();
        frontier.mark_complete(SEED).unwrap();
        for url in incomplete.iter().chain(complete.iter()) {
            assert!(frontier.enqueue(url).unwrap());
        }
        for url in complete {
            frontier.mark_complete(url).unwrap();
        }
        // Dropped without any shutdown step
    }

    let frontier = Frontier::open(&config, false).unwrap();
    let pending: HashSet<String> = frontier.pending().into_iter().collect();
    let expected: HashSet<String> = incomplete.iter().map(|u| u.to_string()).collect();
    assert_eq!(pending, expected);

    let store = open_store(&db_path).unwrap();
    assert_eq!(store.len().unwrap(), 6);
}

#[tokio::test]
async fn test_restart_discards_saved_frontier() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["ics.uci.edu"], &[SEED], &dir.path().join("frontier.db"));

    {
        let frontier = Frontier::open(&config, true).unwrap();
        frontier.enqueue("https://www.ics.uci.edu/old").unwrap();
    }

    let frontier = Frontier::open(&config, true).unwrap();
    assert_eq!(frontier.pending(), vec![SEED.to_string()]);
    assert!(frontier
        .record("https://www.ics.uci.edu/old")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_http_crawl_against_mock_server() {
    // Start a mock server
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(COMPUTER_VISION, &["/page1", "/page2#top"]))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(PARKING, &["/", "/page2"]))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let seed = format!("{}/", base_url);
    let config = create_test_config(&["127.0.0.1"], &[&seed], &dir.path().join("frontier.db"));

    let frontier = Arc::new(Frontier::open(&config, true).unwrap());
    let fetcher = HttpFetcher::new(&config.user_agent).unwrap();
    let report = CrawlPool::new(Arc::clone(&frontier), fetcher, HtmlExtractor, &config)
        .run()
        .await;

    assert_eq!(report.crawled, 2);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.links_enqueued, 2);

    for url in [seed.clone(), format!("{}/page1", base_url), format!("{}/page2", base_url)] {
        assert!(frontier.record(&url).unwrap().unwrap().completed);
    }
}

#[tokio::test]
async fn test_http_fetcher_reports_status_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410).insert_header("X-Reason", "retired"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&["127.0.0.1"], &[], Path::new("unused.db"));
    let fetcher = HttpFetcher::new(&config.user_agent).unwrap();

    let response = fetcher
        .fetch(&format!("{}/gone", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status, 410);
    assert!(!response.is_success());
    assert_eq!(response.header("x-reason"), Some("retired"));
}
