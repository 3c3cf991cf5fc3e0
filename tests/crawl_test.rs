use std::fs;
use std::path::Path;
use std::sync::Arc;

use rs_webminer::fetch::StaticFetcher;
use rs_webminer::images::extract_image_results;
use rs_webminer::parser::{DocumentParser, HtmlParser, ParseHints};
use rs_webminer::workflow::RESULTS_FILE_NAME;
use rs_webminer::{
    run_crawl, AdmissionFilter, CrawlDbEntry, Error, ExtractionResult, ExtractorFactory, FetchPolicy,
    FetchedDocument, FetcherMode, LoopOrchestrator, MiningWorkflow, RunConfig, UrlStatus,
};

fn impolite() -> FetchPolicy {
    FetchPolicy {
        mode: FetcherMode::Impolite,
        ..FetchPolicy::default()
    }
}

fn read_results(loop_dir: &Path) -> Vec<ExtractionResult> {
    fs::read_to_string(loop_dir.join(RESULTS_FILE_NAME))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn single_loop_mines_seed_page() {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    fs::write(&seeds, "https://a.example/\n").unwrap();

    let fetcher = StaticFetcher::new().with_document(FetchedDocument::new(
        "https://a.example/",
        "text/html",
        r#"<html><body><a href="https://c.example" rel="nofollow">hi</a></body></html>"#,
    ));
    let filter = Arc::new(AdmissionFilter::new([".*"]).unwrap());
    let factory = ExtractorFactory::new(Arc::clone(&filter));
    let orchestrator = LoopOrchestrator::new(dir.path().join("work"), MiningWorkflow::new(Arc::new(fetcher), 2));

    let seed = orchestrator.setup_working_dir(&seeds).unwrap();
    let last = orchestrator.run(seed, 1, &impolite(), &filter, &factory).unwrap();

    let loop_dir = last.path().parent().unwrap();
    let results = read_results(loop_dir);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outlinks[0].target_url, "https://c.example");
    assert_eq!(results[0].outlinks[0].rel, "nofollow");
    assert_eq!(results[0].page_results[0].source_url, "https://a.example/");
    assert_eq!(results[0].page_results[0].target_url, "https://c.example");
    assert_eq!(results[0].page_results[0].link_text, "hi");

    let entries = last.read().unwrap();
    assert_eq!(entries[0].url, "https://a.example/");
    assert_eq!(entries[0].status, UrlStatus::Fetched);
    assert_eq!(entries[0].page_score, Some(1.0));
    assert_eq!(entries[1], CrawlDbEntry::unfetched("https://c.example/"));
}

#[test]
fn pages_outside_mine_filter_are_fetched_but_not_mined() {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    fs::write(&seeds, "https://a.example/\nhttps://a.example/\n").unwrap();

    let fetcher = StaticFetcher::new()
        .with_document(FetchedDocument::new(
            "https://a.example/",
            "text/html",
            r#"<a href="/next">next</a><a href="https://elsewhere.example/">out</a>"#,
        ))
        .with_document(FetchedDocument::new(
            "https://a.example/next",
            "text/html",
            r#"<a href="/">home</a>"#,
        ));
    let crawl_filter = Arc::new(AdmissionFilter::new([r"^https://a\.example/"]).unwrap());
    let mine_filter = Arc::new(AdmissionFilter::new([r"/next$"]).unwrap());
    let factory = ExtractorFactory::new(mine_filter);
    let orchestrator = LoopOrchestrator::new(dir.path().join("work"), MiningWorkflow::new(Arc::new(fetcher), 1));

    let seed = orchestrator.setup_working_dir(&seeds).unwrap();
    assert_eq!(seed.read().unwrap().len(), 1);

    let first = orchestrator.run(seed, 1, &impolite(), &crawl_filter, &factory).unwrap();
    let entries = first.read().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, UrlStatus::Fetched);
    assert!(read_results(first.path().parent().unwrap()).is_empty());
}

#[test]
fn crawl_filter_limits_the_frontier_across_loops() {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    fs::write(&seeds, "https://a.example/\n").unwrap();

    let fetcher = StaticFetcher::new()
        .with_document(FetchedDocument::new(
            "https://a.example/",
            "text/html",
            r#"<a href="/next">next</a><a href="https://elsewhere.example/">out</a>"#,
        ))
        .with_document(FetchedDocument::new("https://a.example/next", "text/html", "<p>leaf</p>"));
    let crawl_filter = Arc::new(AdmissionFilter::new([r"^https://a\.example/"]).unwrap());
    let factory = ExtractorFactory::new(Arc::new(AdmissionFilter::new([".*"]).unwrap()));
    let orchestrator = LoopOrchestrator::new(dir.path().join("work"), MiningWorkflow::new(Arc::new(fetcher), 2));

    let seed = orchestrator.setup_working_dir(&seeds).unwrap();
    let last = orchestrator.run(seed, 2, &impolite(), &crawl_filter, &factory).unwrap();

    let entries = last.read().unwrap();
    let status_of = |url: &str| entries.iter().find(|e| e.url == url).map(|e| e.status);
    assert_eq!(status_of("https://a.example/"), Some(UrlStatus::Fetched));
    assert_eq!(status_of("https://a.example/next"), Some(UrlStatus::Fetched));
    assert_eq!(status_of("https://elsewhere.example/"), Some(UrlStatus::Unfetched));
    assert_eq!(entries.len(), 3);
}

#[test]
fn fetch_failures_and_foreign_mime_types_do_not_abort_a_loop() {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    fs::write(&seeds, "https://a.example/\nhttps://missing.example/\nhttps://a.example/logo.png\n").unwrap();

    let fetcher = StaticFetcher::new()
        .with_document(FetchedDocument::new("https://a.example/", "text/html", "<p>ok</p>"))
        .with_document(FetchedDocument::new("https://a.example/logo.png", "image/png", vec![0x89, b'P', b'N', b'G']));
    let filter = Arc::new(AdmissionFilter::new([".*"]).unwrap());
    let factory = ExtractorFactory::new(Arc::clone(&filter));
    let orchestrator = LoopOrchestrator::new(dir.path().join("work"), MiningWorkflow::new(Arc::new(fetcher), 2));

    let seed = orchestrator.setup_working_dir(&seeds).unwrap();
    let last = orchestrator.run(seed, 1, &impolite(), &filter, &factory).unwrap();

    let statuses: Vec<_> = last.read().unwrap().into_iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![UrlStatus::Fetched, UrlStatus::Failed, UrlStatus::Skipped]);
}

#[test]
fn undeclared_content_type_is_fetched_and_mined() {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    fs::write(&seeds, "https://a.example/\n").unwrap();

    let fetcher = StaticFetcher::new().with_document(FetchedDocument::new(
        "https://a.example/",
        "",
        r#"<html><body><a href="/x">x</a></body></html>"#,
    ));
    let filter = Arc::new(AdmissionFilter::new([".*"]).unwrap());
    let factory = ExtractorFactory::new(Arc::clone(&filter));
    let orchestrator = LoopOrchestrator::new(dir.path().join("work"), MiningWorkflow::new(Arc::new(fetcher), 1));

    let seed = orchestrator.setup_working_dir(&seeds).unwrap();
    let last = orchestrator.run(seed, 1, &impolite(), &filter, &factory).unwrap();

    let entries = last.read().unwrap();
    assert_eq!(entries[0].status, UrlStatus::Fetched);
    assert_eq!(entries[1], CrawlDbEntry::unfetched("https://a.example/x"));
    let results = read_results(last.path().parent().unwrap());
    assert_eq!(results[0].outlinks[0].target_url, "/x");
}

#[test]
fn run_crawl_rejects_bad_filter_before_touching_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    fs::create_dir_all(work.join("0-20240101000000000")).unwrap();

    let seeds = dir.path().join("seeds.txt");
    let crawl_filter = dir.path().join("crawl.txt");
    let mine_filter = dir.path().join("mine.txt");
    fs::write(&seeds, "https://a.example/\n").unwrap();
    fs::write(&crawl_filter, "(unclosed\n").unwrap();
    fs::write(&mine_filter, ".*\n").unwrap();

    let config = RunConfig {
        working_dir: work.clone(),
        seed_urls_file: seeds,
        crawl_filter_file: crawl_filter,
        mine_filter_file: mine_filter,
        num_loops: 0,
        ..RunConfig::default()
    };

    let err = run_crawl(&config).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    assert!(work.join("0-20240101000000000").is_dir());
}

#[test]
fn run_crawl_with_zero_loops_returns_seeded_crawl_db() {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    let filter = dir.path().join("filter.txt");
    fs::write(&seeds, "https://a.example/\nhttps://b.example/\nhttps://a.example/\n").unwrap();
    fs::write(&filter, "# everything\n.*\n").unwrap();

    let config = RunConfig {
        working_dir: dir.path().join("work"),
        seed_urls_file: seeds,
        crawl_filter_file: filter.clone(),
        mine_filter_file: filter,
        num_loops: 0,
        ..RunConfig::default()
    };

    let last = run_crawl(&config).unwrap();
    assert_eq!(last.read().unwrap().len(), 2);
}

#[test]
fn image_results_come_from_the_same_parse() {
    let hints = ParseHints {
        content_type: "text/html".to_string(),
        ..ParseHints::default()
    };
    let parsed = HtmlParser
        .parse(
            br#"<a href="/big.PNG">big</a><a href="/page">page</a><img src="/inline.gif" alt="dot">"#,
            &hints,
        )
        .unwrap();

    let mut extractor = rs_webminer::BoundedExtractor::new(Arc::new(AdmissionFilter::new([".*"]).unwrap()));
    let doc = FetchedDocument::new(
        "https://a.example/",
        "text/html",
        r#"<a href="/big.PNG">big</a><a href="/page">page</a><img src="/inline.gif" alt="dot">"#,
    );
    let result = extractor.extract(&doc).unwrap().unwrap();

    let images = extract_image_results(&result.url, &result.outlinks, &parsed);
    let targets: Vec<_> = images.iter().map(|p| (p.target_url.as_str(), p.link_text.as_str())).collect();
    assert_eq!(targets, vec![("/big.PNG", ""), ("/inline.gif", "dot")]);
}

fn crawl_db_after_one_loop(doc: FetchedDocument) -> Vec<String> {
    let dir = tempfile::tempdir().unwrap();
    let seeds = dir.path().join("seeds.txt");
    fs::write(&seeds, format!("{}\n", doc.base_url)).unwrap();

    let filter = Arc::new(AdmissionFilter::new([".*"]).unwrap());
    let factory = ExtractorFactory::new(Arc::clone(&filter));
    let fetcher = StaticFetcher::new().with_document(doc);
    let orchestrator = LoopOrchestrator::new(dir.path().join("work"), MiningWorkflow::new(Arc::new(fetcher), 1));

    let seed = orchestrator.setup_working_dir(&seeds).unwrap();
    let last = orchestrator.run(seed, 1, &impolite(), &filter, &factory).unwrap();
    last.read().unwrap().into_iter().map(|e| e.url).collect()
}

#[test]
fn discovered_links_resolve_against_redirect_target() {
    let mut doc = FetchedDocument::new("https://a.example/old", "text/html", r#"<a href="next">next</a>"#);
    doc.fetched_url = "https://a.example/new/dir/page".to_string();

    assert_eq!(
        crawl_db_after_one_loop(doc),
        vec!["https://a.example/old", "https://a.example/new/dir/next"]
    );
}

#[test]
fn discovered_links_resolve_against_content_location() {
    let doc = FetchedDocument::new("https://a.example/old", "text/html", r#"<a href="next">next</a>"#)
        .with_header("Content-Location", "/moved/here/");

    assert_eq!(
        crawl_db_after_one_loop(doc),
        vec!["https://a.example/old", "https://a.example/moved/here/next"]
    );
}
