//! Local HTTP server standing in for Consul, etcd or a config document
#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use remote_config::config::Config;
use tiny_http::{Header, Response, Server};

pub struct MockServer {
    server: Arc<Server>,
    requests: Receiver<String>,
    pub endpoint: String,
}

impl MockServer {
    /// Answer every request with `status` and `body`
    pub fn start(status: u16, body: &str) -> Self {
        let (server, port) = bind();

        let (tx, requests) = mpsc::channel();
        let worker = server.clone();
        let body = body.to_string();
        thread::spawn(move || {
            for request in worker.incoming_requests() {
                let _ = tx.send(request.url().to_string());
                let content_type =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("valid header");
                let response = Response::from_string(body.clone())
                    .with_status_code(status)
                    .with_header(content_type);
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            requests,
            endpoint: format!("http://127.0.0.1:{port}"),
        }
    }

    /// Accept requests but never answer them
    pub fn stalled() -> Self {
        let (server, port) = bind();

        let (tx, requests) = mpsc::channel();
        let worker = server.clone();
        thread::spawn(move || {
            let mut pending = Vec::new();
            for request in worker.incoming_requests() {
                let _ = tx.send(request.url().to_string());
                pending.push(request);
            }
        });

        Self {
            server,
            requests,
            endpoint: format!("http://127.0.0.1:{port}"),
        }
    }

    /// Request paths (with query) received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.try_iter().collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

fn bind() -> (Arc<Server>, u16) {
    let server = Arc::new(Server::http("127.0.0.1:0").expect("bind mock server"));
    let port = server
        .server_addr()
        .to_ip()
        .expect("mock server listens on ip")
        .port();
    (server, port)
}

/// An endpoint nothing listens on
pub fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn config(text: &str) -> Config {
    Config::parse(text).expect("valid config text")
}

/// Local configuration with reference defaults, as providers receive it
pub fn settings(text: &str) -> Config {
    config(text).with_fallback(&Config::reference().expect("reference"))
}
