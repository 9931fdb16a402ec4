//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tempfile::TempDir;
use tiny_http::{Header, Response, Server, StatusCode};

use studyhub::config::Config;
use studyhub::StudyHub;

/// Config pointing at a database inside a fresh temp dir
pub fn temp_config() -> (TempDir, Config) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.settings.database_path = Some(temp_dir.path().join("studyhub.db"));
    (temp_dir, config)
}

/// A hub backed by a throwaway SQLite file, no task provider
pub fn temp_hub() -> (TempDir, StudyHub) {
    let (temp_dir, config) = temp_config();
    let hub = StudyHub::from_config(&config).expect("Failed to open hub");
    (temp_dir, hub)
}

/// A request as the fake server saw it
#[derive(Debug)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Serve the canned `(status, json)` responses in order, one per request,
/// then stop. Returns the base URL and the recorded requests.
pub fn fake_server(responses: Vec<(u16, &'static str)>) -> (String, Receiver<Recorded>) {
    let server = Server::http("127.0.0.1:0").expect("Failed to bind fake server");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("Fake server is not on an IP socket");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut content = String::new();
            let _ = request.as_reader().read_to_string(&mut content);
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let _ = tx.send(Recorded {
                method: request.method().as_str().to_string(),
                url: request.url().to_string(),
                authorization,
                body: content,
            });

            let header: Header = "Content-Type: application/json"
                .parse()
                .expect("valid header");
            let response = Response::from_string(body)
                .with_status_code(StatusCode(status))
                .with_header(header);
            let _ = request.respond(response);
        }
    });

    (format!("http://{}", addr), rx)
}
