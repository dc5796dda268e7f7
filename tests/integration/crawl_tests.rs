//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small catalog and run the full
//! pipeline end-to-end into temporary CSV and SQLite files.

use shelf_scrape::config::{ArchiveConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use shelf_scrape::crawler::Coordinator;
use shelf_scrape::output::load_statistics;
use shelf_scrape::ShelfError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEED: &str = "/catalogue/category/books_1/index.html";
const TRAVEL: &str = "/catalogue/category/books/travel_2/index.html";
const TRAVEL_PAGE_2: &str = "/catalogue/category/books/travel_2/page-2.html";
const MYSTERY: &str = "/catalogue/category/books/mystery_3/index.html";

/// Creates a test configuration writing into `dir`
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: format!("{}{}", base_url, SEED),
            countries_url: format!("{}/countries", base_url),
            max_concurrent_requests: 4,
            max_pages_per_category: 50,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        archive: ArchiveConfig {
            enabled: false,
            ..ArchiveConfig::default()
        },
        output: OutputConfig {
            books_path: path_str(&dir.join("out/books.csv")),
            books_with_country_path: path_str(&dir.join("out/books_with_country.csv")),
            database_path: path_str(&dir.join("out/books.db")),
            isolate_sink_failures: false,
        },
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Renders a catalog page with a category menu, book entries and an optional next link
fn catalog_page(categories: &[(&str, &str)], books: &[(&str, &str)], next: Option<&str>) -> String {
    let menu: String = categories
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{href}">{name}</a></li>"#))
        .collect();

    let entries: String = books
        .iter()
        .map(|(slug, rating)| {
            format!(
                r#"<li><article class="product_pod">
                    <div class="image_container"><a href="/catalogue/{slug}/index.html">img</a></div>
                    <p class="star-rating {rating}"></p>
                    <h3><a href="/catalogue/{slug}/index.html" title="Title of {slug}">Title…</a></h3>
                    <div class="product_price">
                        <p class="price_color">£12.50</p>
                        <p class="instock availability"> In stock </p>
                    </div>
                </article></li>"#
            )
        })
        .collect();

    let pager = next
        .map(|href| format!(r#"<div><ul class="pager"><li class="next"><a href="{href}">next</a></li></ul></div>"#))
        .unwrap_or_default();

    format!(
        r#"<html><head><title>Catalog</title></head><body id="default">
        <div class="container-fluid page"><div class="page_inner"><div class="row">
        <aside class="sidebar"><div class="side_categories"><ul>
            <li><a href="{SEED}">Books</a><ul>{menu}</ul></li>
        </ul></div></aside>
        <div class="col-sm-8"><section>
            <div class="alert">results</div>
            <div><ol class="row">{entries}</ol>{pager}</div>
        </section></div>
        </div></div></div></body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn mount_countries(server: &MockServer) {
    let body = r#"[{"name": {"common": "Chile"}}, {"name": {"common": "Ghana"}}]"#;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(server)
        .await;
}

/// Mounts a seed page listing only the Travel category
async fn mount_travel_seed(server: &MockServer) {
    mount_html(server, SEED, catalog_page(&[("Travel", TRAVEL)], &[], None)).await;
}

/// Mounts the two Travel listing pages, three books each
async fn mount_travel_pages(server: &MockServer) {
    let categories = [("Travel", TRAVEL)];
    mount_html(
        server,
        TRAVEL,
        catalog_page(
            &categories,
            &[("t1", "One"), ("t2", "Three"), ("t3", "Five")],
            Some("page-2.html"),
        ),
    )
    .await;
    mount_html(
        server,
        TRAVEL_PAGE_2,
        catalog_page(
            &categories,
            &[("t4", "Two"), ("t5", "Four"), ("t6", "Zero")],
            None,
        ),
    )
    .await;
}

/// Reads a CSV file into its header row and data rows
fn read_csv(path: impl AsRef<Path>) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    let headers = reader
        .headers()
        .expect("Missing header row")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|record| record.expect("Bad CSV row").iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

fn stored_books(config: &Config) -> u64 {
    load_statistics(Path::new(&config.output.database_path))
        .expect("Failed to read statistics")
        .total_books
}

#[tokio::test]
async fn test_full_crawl_and_rerun() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_travel_pages(&mock_server).await;
    mount_countries(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    let mut coordinator = Coordinator::new(config.clone())
        .expect("Failed to create coordinator")
        .with_index_source(Box::new(fastrand::Rng::with_seed(11)));
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.categories, 1);
    assert_eq!(report.pages, 2);
    assert_eq!(report.items, 6);
    assert!(report.branch_failures.is_empty());

    let (headers, rows) = read_csv(&config.output.books_path);
    assert_eq!(
        headers,
        vec!["title", "price", "availability", "star", "cate", "product_url"]
    );
    assert_eq!(rows.len(), 6);

    let (headers, rows) = read_csv(&config.output.books_with_country_path);
    assert_eq!(headers.last().map(String::as_str), Some("country"));
    assert_eq!(rows.len(), 6);
    for row in &rows {
        assert_eq!(row[4], "Travel");
        assert!(row[6] == "Chile" || row[6] == "Ghana", "country was {}", row[6]);
    }

    let mut stars: Vec<&str> = rows.iter().map(|row| row[3].as_str()).collect();
    stars.sort_unstable();
    assert_eq!(stars, vec!["0", "1", "2", "3", "4", "5"]);

    assert_eq!(stored_books(&config), 6);

    // Second run: files keep appending, the database drops every duplicate
    let mut coordinator = Coordinator::new(config.clone()).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Second crawl failed");

    assert_eq!(read_csv(&config.output.books_path).1.len(), 12);
    assert_eq!(read_csv(&config.output.books_with_country_path).1.len(), 12);
    assert_eq!(stored_books(&config), 6);

    let db = report.sink("sqlite-upsert").expect("Missing database counters");
    assert_eq!(db.persisted, 0);
    assert_eq!(db.dropped, 6);
    assert_eq!(report.sink("csv-export").unwrap().persisted, 6);
}

#[tokio::test]
async fn test_country_failure_assigns_unknown() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_travel_pages(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    let report = Coordinator::new(config.clone())
        .unwrap()
        .run()
        .await
        .expect("Crawl failed");
    assert_eq!(report.items, 6);

    let (_, rows) = read_csv(&config.output.books_with_country_path);
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|row| row[6] == "Unknown"));
}

#[tokio::test]
async fn test_next_link_requested_exactly_once() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_countries(&mock_server).await;

    let categories = [("Travel", TRAVEL)];
    Mock::given(method("GET"))
        .and(path(TRAVEL))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            catalog_page(&categories, &[("t1", "One")], Some("page-2.html")),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(TRAVEL_PAGE_2))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            catalog_page(&categories, &[("t2", "Two")], None),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let report = Coordinator::new(config.clone()).unwrap().run().await.unwrap();

    mock_server.verify().await;
    assert_eq!(report.pages, 2);
    assert_eq!(report.branches_finished, 1);

    let (_, rows) = read_csv(&config.output.books_path);
    assert!(rows.iter().all(|row| row[4] == "Travel"));
}

#[tokio::test]
async fn test_cyclic_next_link_terminates() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_countries(&mock_server).await;

    let categories = [("Travel", TRAVEL)];
    Mock::given(method("GET"))
        .and(path(TRAVEL))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            catalog_page(&categories, &[("t1", "One")], Some("page-2.html")),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(TRAVEL_PAGE_2))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            catalog_page(&categories, &[("t2", "Two")], Some("index.html")),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    mock_server.verify().await;
    assert_eq!(report.pages, 2);
    assert_eq!(report.items, 2);
    assert_eq!(report.branches_finished, 1);
}

#[tokio::test]
async fn test_page_limit_stops_branch() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_countries(&mock_server).await;
    mount_html(
        &mock_server,
        TRAVEL,
        catalog_page(&[("Travel", TRAVEL)], &[("t1", "One")], Some("page-2.html")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(TRAVEL_PAGE_2))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.crawler.max_pages_per_category = 1;

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    mock_server.verify().await;
    assert_eq!(report.pages, 1);
    assert_eq!(report.items, 1);
}

#[tokio::test]
async fn test_failing_category_does_not_stop_others() {
    let mock_server = MockServer::start().await;
    mount_countries(&mock_server).await;
    mount_html(
        &mock_server,
        SEED,
        catalog_page(&[("Travel", TRAVEL), ("Mystery", MYSTERY)], &[], None),
    )
    .await;
    mount_travel_pages(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(MYSTERY))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let report = Coordinator::new(config.clone()).unwrap().run().await.unwrap();

    assert_eq!(report.categories, 2);
    assert_eq!(report.items, 6);
    assert_eq!(report.branches_finished, 1);
    assert_eq!(report.branch_failures.len(), 1);
    assert_eq!(report.branch_failures[0].category, "Mystery");
    assert_eq!(stored_books(&config), 6);
}

#[tokio::test]
async fn test_category_list_failure_yields_no_items() {
    let mock_server = MockServer::start().await;
    mount_countries(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(SEED))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let report = Coordinator::new(config.clone()).unwrap().run().await.unwrap();

    assert_eq!(report.categories, 0);
    assert_eq!(report.items, 0);

    // Sinks were still opened, so both files carry just a header
    let (headers, rows) = read_csv(&config.output.books_path);
    assert_eq!(headers.len(), 6);
    assert!(rows.is_empty());
    assert_eq!(stored_books(&config), 0);
}

/// Points the database below a regular file so the SQLite sink cannot open
fn break_database_path(config: &mut Config, dir: &Path) {
    let blocker: PathBuf = dir.join("not-a-directory");
    std::fs::write(&blocker, "plain file").unwrap();
    config.output.database_path = path_str(&blocker.join("books.db"));
}

#[tokio::test]
async fn test_sink_setup_failure_aborts_by_default() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    break_database_path(&mut config, dir.path());

    let err = Coordinator::new(config).unwrap().run().await.unwrap_err();

    assert!(matches!(err, ShelfError::SinkOpen { ref name, .. } if name == "sqlite-upsert"));
    mock_server.verify().await;
}

#[tokio::test]
async fn test_sink_setup_failure_isolated_when_configured() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_travel_pages(&mock_server).await;
    mount_countries(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    break_database_path(&mut config, dir.path());
    config.output.isolate_sink_failures = true;

    let report = Coordinator::new(config.clone()).unwrap().run().await.unwrap();

    assert_eq!(report.items, 6);
    assert!(!report.sink("sqlite-upsert").unwrap().active);
    assert_eq!(read_csv(&config.output.books_path).1.len(), 6);
}

#[tokio::test]
async fn test_listing_pages_are_archived() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_travel_pages(&mock_server).await;
    mount_countries(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let archive_dir = dir.path().join("debug_html");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.archive = ArchiveConfig {
        enabled: true,
        directory: path_str(&archive_dir),
        strip_prefix: format!("{}/catalogue/category/", mock_server.uri()),
    };

    Coordinator::new(config).unwrap().run().await.unwrap();

    let first = archive_dir.join("books/travel_2/index.html");
    let second = archive_dir.join("books/travel_2/page-2.html");
    assert!(first.exists(), "missing {}", first.display());
    assert!(second.exists(), "missing {}", second.display());
    assert!(std::fs::read_to_string(second).unwrap().contains("Title of t4"));
}

#[tokio::test]
async fn test_on_page_order_is_preserved() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_travel_pages(&mock_server).await;
    mount_countries(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    Coordinator::new(config.clone()).unwrap().run().await.unwrap();

    let expected: Vec<String> = ["t1", "t2", "t3", "t4", "t5", "t6"]
        .iter()
        .map(|slug| format!("{}/catalogue/{}/index.html", mock_server.uri(), slug))
        .collect();

    for export in [&config.output.books_path, &config.output.books_with_country_path] {
        let (_, rows) = read_csv(export);
        let urls: Vec<String> = rows.iter().map(|row| row[5].clone()).collect();
        assert_eq!(urls, expected, "row order in {}", export);
    }
}

#[tokio::test]
async fn test_next_link_with_fragment_back_to_first_page_terminates() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_countries(&mock_server).await;

    let categories = [("Travel", TRAVEL)];
    Mock::given(method("GET"))
        .and(path(TRAVEL))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            catalog_page(&categories, &[("t1", "One")], Some("page-2.html")),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(TRAVEL_PAGE_2))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            catalog_page(&categories, &[("t2", "Two")], Some("index.html#top")),
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    mock_server.verify().await;
    assert_eq!(report.pages, 2);
    assert_eq!(report.branches_finished, 1);
}

#[tokio::test]
async fn test_malformed_entry_keeps_earlier_items_and_fails_branch() {
    let mock_server = MockServer::start().await;
    mount_travel_seed(&mock_server).await;
    mount_countries(&mock_server).await;

    let page = catalog_page(
        &[("Travel", TRAVEL)],
        &[("t1", "One"), ("t2", "Two"), ("t3", "Three")],
        Some("page-2.html"),
    )
    .replace(r#" title="Title of t2""#, "");
    mount_html(&mock_server, TRAVEL, page).await;
    Mock::given(method("GET"))
        .and(path(TRAVEL_PAGE_2))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let report = Coordinator::new(config.clone()).unwrap().run().await.unwrap();

    mock_server.verify().await;
    assert_eq!(report.items, 1);
    assert_eq!(report.branch_failures.len(), 1);
    assert_eq!(report.branch_failures[0].category, "Travel");

    let (_, rows) = read_csv(&config.output.books_path);
    assert_eq!(rows.len(), 1);
    assert!(rows[0][5].ends_with("/catalogue/t1/index.html"));
    assert_eq!(stored_books(&config), 1);
}
