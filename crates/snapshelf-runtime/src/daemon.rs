//! Read-only client for the snapd REST API.
//!
//! snapd listens on a Unix socket and speaks plain HTTP. Requests are sent as
//! HTTP/1.0 so the daemon answers with an unchunked body and closes the
//! connection, which lets us read the whole response to EOF.

use crate::RuntimeError;
use serde::Deserialize;
use serde_json::Value;
use snapshelf_schema::{InstalledPackage, PackageName};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SOCKET: &str = "/run/snapd.socket";

/// Queries against the package daemon. Nothing here mutates daemon state.
pub trait SnapDaemon: Send + Sync {
    fn list_installed(&self) -> Result<Vec<InstalledPackage>, RuntimeError>;

    fn is_installed(&self, name: &str) -> Result<bool, RuntimeError>;

    /// Packages with an update in the online store, with their download size in bytes.
    fn list_remote_updates(&self) -> Result<BTreeMap<PackageName, u64>, RuntimeError>;

    /// Version string of the daemon itself.
    fn version(&self) -> Result<String, RuntimeError>;
}

pub struct SnapdClient {
    socket_path: PathBuf,
    timeout: Duration,
}

struct HttpResponse {
    status_code: u16,
    body: String,
}

/// The `{"type": ..., "status-code": ..., "result": ...}` wrapper snapd puts
/// around every answer.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct RemoteUpdate {
    name: PackageName,
    #[serde(rename = "download-size", default)]
    download_size: u64,
}

impl Default for SnapdClient {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET)
    }
}

impl SnapdClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request(&self, path: &str) -> Result<HttpResponse, RuntimeError> {
        let fail = |reason: String| RuntimeError::Daemon {
            path: path.to_owned(),
            reason,
        };

        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|e| fail(format!("connect {}: {e}", self.socket_path.display())))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let request = format!("GET {path} HTTP/1.0\r\nHost: localhost\r\nAccept: application/json\r\n\r\n");
        stream.write_all(request.as_bytes())?;

        let mut raw = String::new();
        stream.read_to_string(&mut raw)?;
        parse_http_response(&raw).ok_or_else(|| fail("malformed HTTP response".to_owned()))
    }

    fn get(&self, path: &str) -> Result<(u16, Envelope), RuntimeError> {
        let response = self.request(path)?;
        let envelope: Envelope =
            serde_json::from_str(&response.body).map_err(|e| RuntimeError::Daemon {
                path: path.to_owned(),
                reason: format!("invalid JSON: {e}"),
            })?;
        debug!("GET {path} -> {} ({})", response.status_code, envelope.kind);
        Ok((response.status_code, envelope))
    }

    fn get_sync(&self, path: &str) -> Result<Value, RuntimeError> {
        let (status, envelope) = self.get(path)?;
        if status == 200 && envelope.kind == "sync" {
            Ok(envelope.result)
        } else {
            Err(RuntimeError::Daemon {
                path: path.to_owned(),
                reason: error_message(status, &envelope.result),
            })
        }
    }
}

impl SnapDaemon for SnapdClient {
    fn list_installed(&self) -> Result<Vec<InstalledPackage>, RuntimeError> {
        let result = self.get_sync("/v2/snaps")?;
        serde_json::from_value(result).map_err(|e| RuntimeError::Daemon {
            path: "/v2/snaps".to_owned(),
            reason: e.to_string(),
        })
    }

    fn is_installed(&self, name: &str) -> Result<bool, RuntimeError> {
        let path = format!("/v2/snaps/{name}");
        let (status, envelope) = self.get(&path)?;
        match status {
            200 => Ok(envelope.result.get("name").and_then(Value::as_str) == Some(name)),
            404 => Ok(false),
            _ => Err(RuntimeError::Daemon {
                path,
                reason: error_message(status, &envelope.result),
            }),
        }
    }

    fn list_remote_updates(&self) -> Result<BTreeMap<PackageName, u64>, RuntimeError> {
        let path = "/v2/find?select=refresh";
        let (status, envelope) = self.get(path)?;
        if status == 404 {
            // snapd answers "not found" when nothing needs refreshing.
            return Ok(BTreeMap::new());
        }
        if status != 200 {
            return Err(RuntimeError::Daemon {
                path: path.to_owned(),
                reason: error_message(status, &envelope.result),
            });
        }
        let updates: Vec<RemoteUpdate> = match envelope.result {
            Value::Array(_) => {
                serde_json::from_value(envelope.result).map_err(|e| RuntimeError::Daemon {
                    path: path.to_owned(),
                    reason: e.to_string(),
                })?
            }
            other => {
                warn!("unexpected refresh list from snapd: {other}");
                Vec::new()
            }
        };
        Ok(updates
            .into_iter()
            .map(|u| (u.name, u.download_size))
            .collect())
    }

    fn version(&self) -> Result<String, RuntimeError> {
        let result = self.get_sync("/v2/system-info")?;
        result
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| RuntimeError::Daemon {
                path: "/v2/system-info".to_owned(),
                reason: "no version in response".to_owned(),
            })
    }
}

fn parse_http_response(raw: &str) -> Option<HttpResponse> {
    let (head, body) = raw.split_once("\r\n\r\n")?;
    let status_code = head
        .lines()
        .next()?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;
    Some(HttpResponse {
        status_code,
        body: body.to_owned(),
    })
}

fn error_message(status: u16, result: &Value) -> String {
    let message = result
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message");
    format!("HTTP {status}: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::thread;

    /// Serve one canned response per expected connection.
    fn serve(responses: Vec<(u16, &'static str)>) -> (tempfile::TempDir, PathBuf, thread::JoinHandle<Vec<String>>) {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("snapd.socket");
        let listener = UnixListener::bind(&socket).unwrap();
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut conn, _) = listener.accept().unwrap();
                let mut buf = [0u8; 1024];
                let n = conn.read(&mut buf).unwrap();
                let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                seen.push(request.lines().next().unwrap_or_default().to_owned());
                let reply = format!(
                    "HTTP/1.0 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                    body.len()
                );
                conn.write_all(reply.as_bytes()).unwrap();
            }
            seen
        });
        (dir, socket, handle)
    }

    #[test]
    fn lists_installed_packages() {
        let (_dir, socket, handle) = serve(vec![(
            200,
            r#"{"type":"sync","status-code":200,"result":[{"name":"core18","revision":"1705","summary":"Base","confinement":"strict"},{"name":"atom","revision":"x1","summary":"Editor","confinement":"classic"}]}"#,
        )]);
        let installed = SnapdClient::new(&socket).list_installed().unwrap();
        assert_eq!(installed.len(), 2);
        assert_eq!(installed[0].name, "core18");
        assert_eq!(installed[1].numeric_revision(), None);
        assert_eq!(handle.join().unwrap(), vec!["GET /v2/snaps HTTP/1.0"]);
    }

    #[test]
    fn is_installed_distinguishes_not_found() {
        let (_dir, socket, handle) = serve(vec![
            (
                200,
                r#"{"type":"sync","status-code":200,"result":{"name":"atom","revision":"248"}}"#,
            ),
            (
                404,
                r#"{"type":"error","status-code":404,"result":{"message":"snap not installed","kind":"snap-not-found"}}"#,
            ),
        ]);
        let client = SnapdClient::new(&socket);
        assert!(client.is_installed("atom").unwrap());
        assert!(!client.is_installed("kiwi").unwrap());
        assert_eq!(
            handle.join().unwrap(),
            vec!["GET /v2/snaps/atom HTTP/1.0", "GET /v2/snaps/kiwi HTTP/1.0"]
        );
    }

    #[test]
    fn remote_updates_with_sizes() {
        let (_dir, socket, _handle) = serve(vec![(
            200,
            r#"{"type":"sync","status-code":200,"result":[{"name":"atom","download-size":104857600},{"name":"core","download-size":2048}]}"#,
        )]);
        let updates = SnapdClient::new(&socket).list_remote_updates().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates["atom"], 104_857_600);
        assert_eq!(updates["core"], 2048);
    }

    #[test]
    fn system_version() {
        let (_dir, socket, _handle) = serve(vec![(
            200,
            r#"{"type":"sync","status-code":200,"result":{"series":"16","version":"2.45.1"}}"#,
        )]);
        assert_eq!(SnapdClient::new(&socket).version().unwrap(), "2.45.1");
    }

    #[test]
    fn server_error_is_reported() {
        let (_dir, socket, _handle) = serve(vec![(
            500,
            r#"{"type":"error","status-code":500,"result":{"message":"boom"}}"#,
        )]);
        let err = SnapdClient::new(&socket).list_installed().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn missing_socket_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = SnapdClient::new(dir.path().join("absent.socket"));
        assert!(matches!(
            client.is_installed("atom"),
            Err(RuntimeError::Daemon { .. })
        ));
    }

    #[test]
    fn parses_status_line_and_body() {
        let raw = "HTTP/1.0 404 Not Found\r\nA: b\r\n\r\n{\"x\":1}";
        let resp = parse_http_response(raw).unwrap();
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.body, "{\"x\":1}");
        assert!(parse_http_response("garbage").is_none());
    }
}
