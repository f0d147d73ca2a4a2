//! Webhook delivery against a local HTTP listener.

use ci_report_core::{RunReport, StepKind, StepResult, StepStatus};
use ci_report_notify::payload::{FAILURE_COLOR, SUCCESS_COLOR};
use ci_report_notify::{NotifyConfig, WebhookNotifier};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one request, answer with `status_line`, return the request body.
async fn capture_one(status_line: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/webhook", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let length: usize = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);

        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8(buf[header_end..header_end + length].to_vec()).unwrap()
    });

    (url, handle)
}

fn report(scan: StepStatus) -> RunReport {
    RunReport::new(
        "run-1",
        vec![
            StepResult::new(StepKind::Compilation, StepStatus::Passed, "~$ make"),
            StepResult::new(StepKind::UnitTests, StepStatus::Skipped, "Ignoring"),
            StepResult::new(StepKind::CodingStyle, StepStatus::Passed, "You have 0"),
            StepResult::new(StepKind::SecretScan, scan, "gitleaks"),
            StepResult::new(StepKind::Documentation, StepStatus::Skipped, "Ignoring"),
        ],
        Duration::from_millis(5),
    )
}

fn notifier(url: &str) -> WebhookNotifier {
    let config = NotifyConfig::new(
        "octocat",
        "Fix the widget",
        "https://github.com/acme/widget/commit/abc123",
    )
    .with_webhook(url)
    .with_footer("ci-report");
    WebhookNotifier::new(config).unwrap()
}

/// Test: a successful run posts one JSON body with the success color
#[tokio::test]
async fn test_posts_success_payload() {
    let (url, server) = capture_one("HTTP/1.1 204 No Content").await;

    notifier(&url)
        .send(&report(StepStatus::Passed))
        .await
        .expect("delivery failed");

    let body: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(body["username"], "Github - octocat");
    assert_eq!(body["avatar_url"], "https://github.com/octocat.png");
    let embed = &body["embeds"][0];
    assert_eq!(embed["color"], SUCCESS_COLOR);
    assert_eq!(embed["title"], "Fix the widget");
    assert_eq!(embed["footer"]["text"], "ci-report");
    let description = embed["description"].as_str().unwrap();
    assert!(description.contains("Compilation \u{1b}[32mSuccess\u{1b}[0m"));
    assert!(description.contains("Unit testing \u{1b}[34mSkipped\u{1b}[0m"));
    assert_eq!(body["allowed_mentions"]["parse"][0], "everyone");
}

/// Test: a failing gating step turns the embed red
#[tokio::test]
async fn test_posts_failure_color() {
    let (url, server) = capture_one("HTTP/1.1 200 OK").await;

    notifier(&url)
        .send(&report(StepStatus::Failed))
        .await
        .expect("delivery failed");

    let body: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(body["embeds"][0]["color"], FAILURE_COLOR);
}

/// Test: a non-2xx answer is not an error
#[tokio::test]
async fn test_rejection_is_not_an_error() {
    let (url, server) = capture_one("HTTP/1.1 400 Bad Request").await;

    let result = notifier(&url).send(&report(StepStatus::Passed)).await;

    assert!(result.is_ok());
    assert!(!server.await.unwrap().is_empty());
}

/// Test: an unreachable endpoint is a transport error
#[tokio::test]
async fn test_unreachable_endpoint_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/webhook", listener.local_addr().unwrap());
    drop(listener);

    let result = notifier(&url).send(&report(StepStatus::Passed)).await;

    assert!(result.is_err());
}
