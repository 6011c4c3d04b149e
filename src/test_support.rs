// Shared helpers for unit tests: tier files on disk and a local upstream server

use crate::locale::{Locale, Tier};
use serde_json::Value;
use std::path::Path;
use std::thread;
use tiny_http::{Header, Response, Server};

pub struct UpstreamRoute {
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl UpstreamRoute {
    pub fn ok(path: &str, body: Value) -> Self {
        Self {
            path: path.to_string(),
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(path: &str, status: u16, body: &str) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: body.to_string(),
        }
    }
}

/// Serves fixed responses on 127.0.0.1 until the test process exits. Returns the base URL.
pub fn spawn_upstream(routes: Vec<UpstreamRoute>) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let route = routes.iter().find(|r| r.path == request.url());
            let response = match route {
                Some(route) => Response::from_string(route.body.clone())
                    .with_status_code(route.status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    ),
                None => Response::from_string("not found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    format!("http://{}", addr)
}

pub fn write_tier(root: &Path, locale: Locale, tier: Tier, value: &Value) {
    write_raw(root, locale, tier, &value.to_string());
}

pub fn write_raw(root: &Path, locale: Locale, tier: Tier, content: &str) {
    let dir = root.join(locale.as_str());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(tier.file_name()), content).unwrap();
}
