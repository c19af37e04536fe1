//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the search API and run the
//! developer phase, the repository phase and document generation end-to-end.

use made_in::config::{Config, CrawlerConfig, GithubConfig, OutputConfig, PoolConfig, RankStyle};
use made_in::crawler::connect;
use made_in::output::generate_documents;
use made_in::state::Endpoint;
use made_in::storage::{JsonStorage, Storage};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(api_url: &str, dir: &Path) -> Config {
    Config {
        github: GithubConfig {
            api_url: api_url.to_string(),
            user_agent: "made-in-test".to_string(),
            tokens: vec!["t1".to_string(), "t2".to_string()],
        },
        crawler: CrawlerConfig {
            max_page: 34,
            min_batch: 2,
            lowest_star: 3,
            repository_concurrency: Some(1),
            locations: vec![],
        },
        pool: PoolConfig {
            cooldown_ms: 60_000,
            usage_ceiling: 30,
        },
        output: OutputConfig {
            data_dir: dir.join("data").display().to_string(),
            docs_dir: dir.join("docs").display().to_string(),
            readme_path: dir.join("README.md").display().to_string(),
            template_path: None,
            homepage: "https://github.com/user/made-in".to_string(),
            top_limit: 10,
            rank_limit: 1000,
            rank_style: RankStyle::Dense,
        },
    }
}

fn users(logins: &[&str]) -> Value {
    let items: Vec<Value> = logins.iter().map(|l| json!({ "login": l })).collect();
    json!({ "total_count": items.len(), "incomplete_results": false, "items": items })
}

fn repositories(owner: &str, repos: &[(&str, &str, u64)]) -> Value {
    let items: Vec<Value> = repos
        .iter()
        .map(|(name, language, stars)| {
            json!({
                "name": name,
                "full_name": format!("{}/{}", owner, name),
                "owner": { "login": owner, "html_url": format!("https://github.com/{}", owner) },
                "language": language,
                "description": format!("{} | tool", name),
                "html_url": format!("https://github.com/{}/{}", owner, name),
                "stargazers_count": stars,
                "homepage": "https://example.com"
            })
        })
        .collect();
    json!({ "total_count": items.len(), "incomplete_results": false, "items": items })
}

async fn mount_empty_fallbacks(server: &MockServer) {
    for endpoint in ["/search/users", "/search/repositories"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(users(&[])))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_full_crawl_and_documents() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    // Developer phase: two pages, the second one short
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "location:tokyo"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(&["bob", "alice"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "location:tokyo"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(&["carol"])))
        .expect(1)
        .mount(&server)
        .await;

    // Repository phase
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "user:alice fork:false stars:>=3"))
        .and(query_param("page", "1"))
        .and(query_param("sort", "stars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repositories(
            "alice",
            &[("a", "Rust", 10), ("b", "Go", 5)],
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "user:bob fork:false stars:>=3"))
        .and(header("authorization", "token t1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "API rate limit exceeded for user ID 1."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "user:bob fork:false stars:>=3"))
        .and(header("authorization", "token t2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(repositories("bob", &[("c", "Rust", 20)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "user:carol fork:false stars:>=3"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation Failed"
        })))
        .mount(&server)
        .await;
    mount_empty_fallbacks(&server).await;

    let storage = Arc::new(JsonStorage::new(Path::new(&config.output.data_dir)).unwrap());
    let cancel = CancellationToken::new();
    let coordinator = connect(config.clone(), storage.clone(), &cancel)
        .await
        .unwrap();

    let outcome = coordinator
        .crawl_developers(&["tokyo".to_string()], 1)
        .await
        .unwrap();
    assert!(outcome.is_complete());
    assert_eq!(
        storage.read_developers().unwrap(),
        vec!["alice", "bob", "carol"]
    );

    let developers = storage.read_developers().unwrap();
    let outcome = coordinator.crawl_repositories(&developers, 1).await.unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.completed.len(), 3);

    let repos = storage.read_repositories().unwrap();
    let keys: Vec<_> = repos.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(keys, vec!["alice/a", "alice/b", "bob/c"]);
    assert!(storage
        .read_checkpoint(Endpoint::Repositories)
        .unwrap()
        .is_none());

    let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let summary = generate_documents(&config.output, storage.as_ref(), date).unwrap();
    assert_eq!(summary.languages, 2);

    let readme = std::fs::read_to_string(&config.output.readme_path).unwrap();
    assert!(readme.contains("## Top 10 Developers out of 3 (2024/05/01)"));
    assert!(readme.contains("|1|[bob](https://github.com/bob)|20|\n"));
    assert!(readme.contains("|2|[alice](https://github.com/alice)|15|\n"));
    assert!(readme.contains("|1|[Rust](https://github.com/user/made-in/blob/master/docs/Rust.md)|30|2|\n"));

    let rust_doc = std::fs::read_to_string(dir.path().join("docs").join("Rust.md")).unwrap();
    assert!(rust_doc.contains(
        "|20|[@bob](https://github.com/bob)/[**c**](https://github.com/bob/c)|c \\| tool|[:arrow_upper_right:](https://example.com)|"
    ));
    assert_eq!(storage.read_rankers().unwrap(), vec!["bob", "alice"]);
}

#[tokio::test]
async fn test_interrupted_crawl_resumes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "location:tokyo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(&["taro"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "location:paris"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users(&["pierre"]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    mount_empty_fallbacks(&server).await;

    let storage = Arc::new(JsonStorage::new(Path::new(&config.output.data_dir)).unwrap());
    let locations = vec!["tokyo".to_string(), "paris".to_string()];

    // First attempt: interrupted while paris's page is in flight
    let cancel = CancellationToken::new();
    let coordinator = connect(config.clone(), storage.clone(), &cancel)
        .await
        .unwrap();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let outcome = coordinator.crawl_developers(&locations, 1).await.unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.completed, vec!["tokyo"]);
    assert_eq!(outcome.incomplete(), vec!["paris"]);
    assert_eq!(storage.read_developers().unwrap(), vec!["taro"]);

    let checkpoint = storage.read_checkpoint(Endpoint::Users).unwrap().unwrap();
    assert_eq!(checkpoint.endpoint, Endpoint::Users);

    // Second attempt picks up paris only
    let cancel = CancellationToken::new();
    let coordinator = connect(config, storage.clone(), &cancel).await.unwrap();
    let outcome = coordinator.resume(checkpoint).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.completed, vec!["paris"]);
    assert_eq!(storage.read_developers().unwrap(), vec!["pierre", "taro"]);
    assert!(storage.read_checkpoint(Endpoint::Users).unwrap().is_none());
}
