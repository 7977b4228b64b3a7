use std::sync::Mutex;

use mockito::{Matcher, Mock, Server, ServerGuard};
use shelob::configuration::{FetchPolicy, Settings};
use shelob::errors::{ExportRowError, ExtractionError, PageFetchError, PipelineError};
use shelob::exporter::ExportSummary;
use shelob::parser::BuscalibreParser;
use shelob::pipeline::Pipeline;
use shelob::telemetry::DiagnosticsSink;
use shelob::types::BookRecord;

const PATH: &str = "/libros-envio-express-chile_t.html";

#[derive(Default)]
struct RecordingSink {
    skipped: Mutex<Vec<String>>,
    dropped: Mutex<Vec<u64>>,
}

impl DiagnosticsSink for RecordingSink {
    fn record_skipped(&self, record: &BookRecord, _error: &ExportRowError) {
        self.skipped.lock().unwrap().push(record.title.clone());
    }

    fn page_dropped(&self, error: &PageFetchError) {
        self.dropped.lock().unwrap().push(error.page);
    }
}

fn listing(title: &str, badge: &str, price: &str) -> String {
    format!(
        r#"<div class="producto">
            <a href="/libro-{title}/123">
                <div class="imagen"><img src="/cover.jpg"></div>
                <h3 class="nombre">{title}</h3>
                <div class="autor">Isabel Allende</div>
                <div class="box-dcto col-xs-5">{badge}</div>
                <h5 class="precio-antes hide-on-hover margin-0 color-dark-gray font-weight-normal">{price}</h5>
            </a>
        </div>"#
    )
}

fn html(body: &str) -> String {
    format!("<html><body>{}</body></html>", body)
}

fn pipeline(server: &ServerGuard, policy: FetchPolicy) -> Pipeline {
    let mut settings = Settings::default();
    settings.shop.base_url = format!("{}{}", server.url(), PATH);
    settings.http.max_concurrent_fetches = 8;
    settings.http.fetch_policy = policy;
    Pipeline::new(settings, Box::new(BuscalibreParser)).unwrap()
}

async fn mock_seed(server: &mut ServerGuard, count_text: &str) -> Mock {
    server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(html(&format!(
            r#"<div class="cantidadProductos">{}</div>"#,
            count_text
        )))
        .expect(1)
        .create_async()
        .await
}

async fn mock_page(server: &mut ServerGuard, page: u64, status: usize, body: String) -> Mock {
    server
        .mock("GET", PATH)
        .match_query(Matcher::UrlEncoded("page".into(), page.to_string()))
        .with_status(status)
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

/// One book per page. Even pages are 20% off, odd pages are not discounted.
fn book_page(page: u64) -> String {
    let title = format!("Libro{}", page);
    if page % 2 == 0 {
        html(&listing(&title, "20%", "$ 10.000"))
    } else {
        html(&listing(&title, "", "$ 10.000"))
    }
}

#[tokio::test]
async fn fifteen_hundred_books_fetch_twenty_pages() {
    let mut server = Server::new_async().await;
    let seed = mock_seed(&mut server, "Encontramos 1.500 resultados").await;
    let mut pages = Vec::new();
    for page in 1..=20 {
        pages.push(mock_page(&mut server, page, 200, book_page(page)).await);
    }

    let sink = RecordingSink::default();
    let mut out = Vec::new();
    let summary = pipeline(&server, FetchPolicy::FailFast)
        .run(&mut out, &sink)
        .await
        .unwrap();

    seed.assert_async().await;
    for m in pages {
        m.assert_async().await;
    }

    assert_eq!(summary, ExportSummary { written: 20, skipped: 0 });
    let csv = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 21);
    assert_eq!(
        lines[0],
        "title;author;discount_percentage;discount;original_price;price_with_discount;url"
    );
    assert_eq!(lines[1], "Libro1;Isabel Allende;0;0;0;0;/libro-Libro1/123");
    assert_eq!(
        lines[2],
        "Libro2;Isabel Allende;0.2;2000;10000;8000;/libro-Libro2/123"
    );
    assert_eq!(lines[20].split(';').next().unwrap(), "Libro20");
    assert!(sink.skipped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn one_failed_page_means_no_csv() {
    let mut server = Server::new_async().await;
    let _seed = mock_seed(&mut server, "Encontramos 1.500 resultados").await;
    let mut _pages = Vec::new();
    for page in 1..=20 {
        let status = if page == 7 { 500 } else { 200 };
        _pages.push(mock_page(&mut server, page, status, book_page(page)).await);
    }

    let mut out = Vec::new();
    let err = pipeline(&server, FetchPolicy::FailFast)
        .run(&mut out, &RecordingSink::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Fetch(e) => assert_eq!(e.page, 7),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(out.is_empty());
}

#[tokio::test]
async fn collect_errors_exports_the_rest() {
    let mut server = Server::new_async().await;
    let _seed = mock_seed(&mut server, "Encontramos 1.500 resultados").await;
    let mut _pages = Vec::new();
    for page in 1..=20 {
        let status = if page == 7 { 500 } else { 200 };
        _pages.push(mock_page(&mut server, page, status, book_page(page)).await);
    }

    let sink = RecordingSink::default();
    let mut out = Vec::new();
    let summary = pipeline(&server, FetchPolicy::CollectErrors)
        .run(&mut out, &sink)
        .await
        .unwrap();

    assert_eq!(summary.written, 19);
    assert_eq!(*sink.dropped.lock().unwrap(), vec![7]);
    let csv = String::from_utf8(out).unwrap();
    assert!(!csv.contains("Libro7;"));
    assert!(csv.contains("Libro8;"));
}

#[tokio::test]
async fn missing_count_stops_before_any_page() {
    let mut server = Server::new_async().await;
    let seed = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(html("<p>Sin resultados</p>"))
        .expect(1)
        .create_async()
        .await;
    let pages = server
        .mock("GET", PATH)
        .match_query(Matcher::Regex("page=".into()))
        .expect(0)
        .create_async()
        .await;

    let mut out = Vec::new();
    let err = pipeline(&server, FetchPolicy::FailFast)
        .run(&mut out, &RecordingSink::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Count(_)));
    assert!(out.is_empty());
    seed.assert_async().await;
    pages.assert_async().await;
}

#[tokio::test]
async fn failed_seed_is_fatal() {
    let mut server = Server::new_async().await;
    let _seed = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let err = pipeline(&server, FetchPolicy::FailFast)
        .collect_books(&RecordingSink::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Fetch(e) => assert_eq!(e.page, 0),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn malformed_listing_aborts_the_run() {
    let mut server = Server::new_async().await;
    let _seed = mock_seed(&mut server, "Encontramos 100 resultados").await;
    let mut _pages = Vec::new();
    for page in 1..=10 {
        let body = if page == 3 {
            html(&listing("Roto", "15%", "consultar precio"))
        } else {
            book_page(page)
        };
        _pages.push(mock_page(&mut server, page, 200, body).await);
    }

    let mut out = Vec::new();
    let err = pipeline(&server, FetchPolicy::FailFast)
        .run(&mut out, &RecordingSink::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Extraction { page, source } => {
            assert_eq!(page, 3);
            assert!(matches!(source, ExtractionError::Price(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(out.is_empty());
}

#[tokio::test]
async fn trailing_empty_pages_are_fine() {
    let mut server = Server::new_async().await;
    let _seed = mock_seed(&mut server, "Encontramos 150 resultados").await;
    let mut pages = Vec::new();
    // 150 / 147 + 10 = 11 pages, only the first two have books
    for page in 1..=11 {
        let body = match page {
            1 => html(&[listing("Paula", "10%", "$ 15.990"), listing("Eva Luna", "", "$ 12.000")].concat()),
            2 => html(&listing("Inés del alma mía", "50%", "$ 21.001")),
            _ => html(r#"<div class="sin-resultados"></div>"#),
        };
        pages.push(mock_page(&mut server, page, 200, body).await);
    }

    let books = pipeline(&server, FetchPolicy::FailFast)
        .collect_books(&RecordingSink::default())
        .await
        .unwrap();

    for m in pages {
        m.assert_async().await;
    }
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Paula", "Eva Luna", "Inés del alma mía"]);
    assert_eq!(
        books[0].price,
        shelob::types::PriceInfo::Discounted {
            percentage: 10,
            discount: 1_599,
            original: 15_990,
            with_discount: 14_391,
        }
    );
    assert_eq!(
        books[2].price,
        shelob::types::PriceInfo::Discounted {
            percentage: 50,
            discount: 10_500,
            original: 21_001,
            with_discount: 10_501,
        }
    );
}
