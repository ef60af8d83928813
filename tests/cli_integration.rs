//! End-to-end tests of the command-line binary against a mock FoodAI service
//!
//! Every test runs the real binary with a scrubbed environment inside a
//! temporary working directory so no local `.env` or cache leaks in.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const USER_KEY: &str = "test-key";
const RECOGNITION_PATH: &str = "/v1/foodrecognition/full";

const SCRUBBED_VARS: &[&str] = &[
    "USER_KEY",
    "ENDPOINT",
    "NUM_PARALLEL",
    "SAMPLE_COUNT",
    "IMAGE_URLS",
    "RESIZE_MAX_DIM",
    "CACHE_DIR",
    "OUTPUT_DIR",
    "ENABLE_COLOR",
    "FORCE_COLOR",
    "CLICOLOR_FORCE",
];

/// Nothing listens on port 1, so the ping fails right after configuration
const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1/";

/// Helper function to create a test command in an isolated directory
fn create_test_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("foodai-latency").unwrap();
    cmd.current_dir(workdir);
    for var in SCRUBBED_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Run a command off the async runtime so the mock server keeps serving
async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90)
        .encode_image(&img)
        .unwrap();
    out
}

/// Mock service answering ping, image download and recognition
async fn mock_service(image: Vec<u8>, recognition: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("FoodAI mock service is up"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/meal.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(RECOGNITION_PATH))
        .and(query_param("user_key", USER_KEY))
        .and(query_param("top", "1"))
        .respond_with(recognition)
        .mount(&server)
        .await;

    server
}

fn food_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(r#"{"is_food": true, "results": []}"#)
}

fn sampling_cmd(workdir: &TempDir, server: &MockServer, count: &str, parallel: &str) -> Command {
    let mut cmd = create_test_cmd(workdir.path());
    cmd.env("USER_KEY", USER_KEY)
        .arg("--endpoint")
        .arg(format!("{}/", server.uri()))
        .arg("--image-url")
        .arg(format!("{}/img/meal.jpg", server.uri()))
        .arg("-n")
        .arg(count)
        .arg("-p")
        .arg(parallel)
        .arg("--cache-dir")
        .arg(workdir.path().join("cache"))
        .arg("--no-color");
    cmd
}

fn sample_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_writes_sample_file() {
    let image = jpeg_bytes(64, 48);
    let image_len = image.len();
    let server = mock_service(image, food_response()).await;
    let workdir = TempDir::new().unwrap();
    let out_dir = workdir.path().join("out");

    let mut cmd = sampling_cmd(&workdir, &server, "5", "2");
    cmd.arg("--output-dir").arg(&out_dir);
    let output = run(cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ping: FoodAI mock service is up"));
    assert!(stdout.contains("FoodAI Latency Results"));
    assert!(stdout.contains("Samples:          5"));
    for label in ["p50", "p90", "p99"] {
        assert!(stdout.contains(label), "missing {} in {}", label, stdout);
    }
    assert!(!stdout.contains('\x1b'));

    let files = sample_files(&out_dir);
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("latency_http_127_0_0_1_"), "unexpected name {}", name);
    assert!(name.ends_with(".txt"));

    let content = fs::read_to_string(&files[0]).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5);
    for line in lines {
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields.len(), 3, "bad line {:?}", line);
        assert!(fields[0].parse::<i64>().unwrap() > 1_600_000_000);
        fields[1].parse::<u64>().unwrap();
        assert_eq!(fields[2].parse::<usize>().unwrap(), image_len);
    }

    // Image downloaded once into the cache
    assert_eq!(sample_files(&workdir.path().join("cache")).len(), 1);
    let received = server.received_requests().await.unwrap();
    let recognitions = received.iter().filter(|r| r.url.path() == RECOGNITION_PATH).count();
    assert_eq!(recognitions, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_save_and_skip_ping() {
    let server = mock_service(jpeg_bytes(32, 32), food_response()).await;
    let workdir = TempDir::new().unwrap();

    let mut cmd = sampling_cmd(&workdir, &server, "3", "1");
    cmd.arg("--no-save").arg("--skip-ping");
    let output = run(cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Ping:"));
    assert!(!stdout.contains("Samples written"));

    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.url.path() != "/"));

    let leftovers: Vec<_> = sample_files(workdir.path())
        .into_iter()
        .filter(|p| p.extension().map(|e| e == "txt").unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resize_sends_smaller_payload() {
    let image = jpeg_bytes(800, 600);
    let original_len = image.len();
    let server = mock_service(image, food_response()).await;
    let workdir = TempDir::new().unwrap();
    let out_dir = workdir.path().join("out");

    let mut cmd = sampling_cmd(&workdir, &server, "2", "2");
    cmd.arg("--resize").arg("100").arg("--output-dir").arg(&out_dir);
    let output = run(cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("100x75"));

    let files = sample_files(&out_dir);
    let content = fs::read_to_string(&files[0]).unwrap();
    for line in content.lines() {
        let bytes: usize = line.rsplit(' ').next().unwrap().parse().unwrap();
        assert!(bytes < original_len);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_fails_fast_with_http_exit_code() {
    let server = mock_service(jpeg_bytes(32, 32), ResponseTemplate::new(503).set_body_string("overloaded")).await;
    let workdir = TempDir::new().unwrap();

    let mut cmd = sampling_cmd(&workdir, &server, "20", "1");
    cmd.arg("--no-save");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[HTTP]"), "stderr: {}", stderr);
    assert!(stderr.contains("503"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_is_food_is_recognition_failure() {
    let server = mock_service(
        jpeg_bytes(32, 32),
        ResponseTemplate::new(200).set_body_string(r#"{"error": "bad key"}"#),
    )
    .await;
    let workdir = TempDir::new().unwrap();

    let mut cmd = sampling_cmd(&workdir, &server, "3", "1");
    cmd.arg("--no-save");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[RECOGNITION]"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_keep_going_with_every_call_failing() {
    let server = mock_service(jpeg_bytes(32, 32), ResponseTemplate::new(500)).await;
    let workdir = TempDir::new().unwrap();

    let mut cmd = sampling_cmd(&workdir, &server, "4", "2");
    cmd.arg("--no-save").arg("--keep-going");
    let output = run(cmd).await;

    // The last failure decides the category: HTTP 500 is an HTTP error
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[HTTP]"), "stderr: {}", stderr);
    assert!(stderr.contains("All 4 recognition calls failed"));

    let received = server.received_requests().await.unwrap();
    let recognitions = received.iter().filter(|r| r.url.path() == RECOGNITION_PATH).count();
    assert_eq!(recognitions, 4);
}

#[test]
fn test_missing_user_key_is_config_error() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(workdir.path())
        .arg("--skip-ping")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("USER_KEY is required"))
        .stderr(predicate::str::contains("Configuration help"));
}

#[test]
fn test_user_key_from_env_file() {
    let workdir = TempDir::new().unwrap();
    fs::write(workdir.path().join(".env"), "USER_KEY=from-file\nSAMPLE_COUNT=0\n").unwrap();

    // The key is picked up, so validation moves on to the sample count
    create_test_cmd(workdir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Sample count must be greater than 0"));
}

#[test]
fn test_environment_beats_env_file() {
    let workdir = TempDir::new().unwrap();
    fs::write(
        workdir.path().join(".env"),
        format!("USER_KEY=from-file\nNUM_PARALLEL=3\nSAMPLE_COUNT=7\nENDPOINT={}\n", UNREACHABLE_ENDPOINT),
    )
    .unwrap();

    let output = create_test_cmd(workdir.path())
        .env("NUM_PARALLEL", "5")
        .arg("--debug")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Parallelism: 5"), "stdout: {}", stdout);
    // Keys only present in .env still apply
    assert!(stdout.contains("Samples: 7"));
    assert!(stdout.contains("User Key: from*****"));
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_enable_color_false_keeps_errors_plain() {
    let workdir = TempDir::new().unwrap();
    let colored_cmd = || {
        let mut cmd = create_test_cmd(workdir.path());
        cmd.env_remove("NO_COLOR")
            .env("TERM", "xterm-256color")
            .env("FORCE_COLOR", "1")
            .env("CLICOLOR_FORCE", "1")
            .env("USER_KEY", USER_KEY)
            .env("ENDPOINT", UNREACHABLE_ENDPOINT);
        cmd
    };

    // Colors are on when nothing disables them
    let output = colored_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains('\x1b'));

    let output = colored_cmd().env("ENABLE_COLOR", "false").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[NETWORK]") || stderr.contains("[HTTP]"), "stderr: {}", stderr);
    assert!(!stderr.contains('\x1b'), "stderr: {:?}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compact_log_format() {
    let server = mock_service(jpeg_bytes(32, 32), food_response()).await;
    let workdir = TempDir::new().unwrap();

    let mut cmd = sampling_cmd(&workdir, &server, "2", "1");
    cmd.args(["--no-save", "--log-level", "info", "--log-format", "compact"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(" I SAMPLER: Starting 2 samples"), "stdout: {}", stdout);
    assert!(stdout.contains(" I APP: Run configured"));
}

#[test]
fn test_write_env_example() {
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("example.env");

    create_test_cmd(workdir.path())
        .arg("--write-env-example")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Example configuration written"));

    let content = fs::read_to_string(&target).unwrap();
    assert!(content.contains("# USER_KEY="));
    assert!(content.contains("# NUM_PARALLEL="));

    // An existing file is never replaced
    create_test_cmd(workdir.path())
        .arg("--write-env-example")
        .arg(&target)
        .assert()
        .failure()
        .code(1);
    assert_eq!(fs::read_to_string(&target).unwrap(), content);
}

#[test]
fn test_invalid_arguments() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(workdir.path())
        .args(["--percentiles", "50,abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid percentile"));

    create_test_cmd(workdir.path())
        .args(["--user-key", "k", "--color", "--no-color"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--color and --no-color"));
}

#[test]
fn test_help_lists_options() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(workdir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fresh-connections"))
        .stdout(predicate::str::contains("--keep-going"))
        .stdout(predicate::str::contains("--resize"));
}

#[test]
fn test_env_help_needs_no_configuration() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(workdir.path())
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Supported Environment Variables"))
        .stdout(predicate::str::contains("USER_KEY"))
        .stdout(predicate::str::contains("RESIZE_MAX_DIM"));
}
