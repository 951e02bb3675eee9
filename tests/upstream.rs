use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use pl_predictor::PredictError;
use pl_predictor::config::FetchConfig;
use pl_predictor::football_data::FootballDataClient;

/// Serves one canned HTTP response and returns the base URL.
fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });
    format!("http://{addr}")
}

fn config(base_url: String) -> FetchConfig {
    FetchConfig {
        api_key: "test-token".to_string(),
        base_url,
        competition: "PL".to_string(),
        lower_division: "ELC".to_string(),
        season: 2024,
        timeout_secs: 5,
    }
}

#[test]
fn non_success_status_aborts_with_truncated_body() {
    let base_url = serve_once("403 Forbidden", "x".repeat(1000));
    let api = FootballDataClient::new(&config(base_url)).unwrap();

    let err = api.fetch_standings("PL", 2024).unwrap_err();
    match err.downcast_ref::<PredictError>() {
        Some(PredictError::Upstream { status, body }) => {
            assert_eq!(*status, 403);
            assert_eq!(body.chars().count(), 303);
            assert!(body.ends_with("..."));
        }
        other => panic!("expected Upstream error, got {other:?} ({err:#})"),
    }
}
