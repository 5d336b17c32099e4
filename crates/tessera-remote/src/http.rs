use crate::api::{ResolutionRequest, ResolutionResponse};
use crate::{PackageClient, RemoteConfig, RemoteError, ResolutionClient};
use std::io::Read;

/// HTTP backend for the resolution and package index services.
///
/// Expects the tessera REST API:
/// - `POST /v1/closures` — negotiate a closure resolution (JSON in/out)
/// - `GET  /v1/packages/<language>/<owner>/<name>/versions/<version>/archive`
///   — download a package archive (`Local` stands in for a missing owner)
pub struct HttpBackend {
    config: RemoteConfig,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(config: RemoteConfig) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self { config, agent }
    }

    fn archive_url(&self, language: &str, owner: Option<&str>, name: &str, version: &str) -> String {
        format!(
            "{}/v1/packages/{}/{}/{}/versions/{}/archive",
            self.config.url,
            language,
            owner.unwrap_or("Local"),
            name,
            version
        )
    }

    fn do_post_json(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, RemoteError> {
        let mut req = self
            .agent
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Tessera-Protocol", &crate::PROTOCOL_VERSION.to_string());
        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        let resp = match req.send(body) {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => {
                return Err(RemoteError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(RemoteError::Http(e.to_string()));
            }
        };
        Self::read_body(resp)
    }

    fn do_get(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let mut req = self
            .agent
            .get(url)
            .header("X-Tessera-Protocol", &crate::PROTOCOL_VERSION.to_string());
        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        let resp = match req.call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(RemoteError::PackageNotFound(url.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(RemoteError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(RemoteError::Http(e.to_string()));
            }
        };
        Self::read_body(resp)
    }

    fn read_body(resp: ureq::http::Response<ureq::Body>) -> Result<Vec<u8>, RemoteError> {
        let status = resp.status().as_u16();
        if status == 404 {
            return Err(RemoteError::PackageNotFound("resource".to_owned()));
        }
        if status >= 400 {
            return Err(RemoteError::Http(format!("HTTP {status}")));
        }
        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        Ok(body)
    }
}

impl ResolutionClient for HttpBackend {
    fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResponse, RemoteError> {
        let url = format!("{}/v1/closures", self.config.url);
        tracing::debug!(
            "POST {url} ({} local, {} public)",
            request.local_packages.len() + 1,
            request.public_packages.len()
        );
        let body = serde_json::to_vec(request).map_err(|e| RemoteError::Serialization(e.to_string()))?;
        let raw = self.do_post_json(&url, &body)?;
        serde_json::from_slice(&raw).map_err(|e| RemoteError::Serialization(e.to_string()))
    }
}

impl PackageClient for HttpBackend {
    fn download(
        &self,
        language: &str,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> Result<Vec<u8>, RemoteError> {
        let url = self.archive_url(language, owner, name, version);
        tracing::debug!("GET {url}");
        self.do_get(&url).map_err(|e| match e {
            RemoteError::PackageNotFound(_) => RemoteError::PackageNotFound(match owner {
                Some(owner) => format!("[{language}]{owner}|{name}@{version}"),
                None => format!("[{language}]{name}@{version}"),
            }),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{LocalRequestPackage, ResolutionOutcome, WireLanguage};
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    /// Canned (status, body) responses keyed by `"METHOD path"`.
    struct MockServer {
        addr: String,
        _handle: std::thread::JoinHandle<()>,
    }

    impl MockServer {
        fn start(routes: HashMap<String, (u16, Vec<u8>)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = format!("http://{}", listener.local_addr().unwrap());
            let routes = Arc::new(Mutex::new(routes));

            let handle = std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    let routes = Arc::clone(&routes);

                    std::thread::spawn(move || {
                        let mut reader = BufReader::new(stream.try_clone().unwrap());
                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).is_err() {
                            return;
                        }
                        let parts: Vec<&str> = request_line.trim().splitn(3, ' ').collect();
                        if parts.len() < 2 {
                            return;
                        }
                        let key = format!("{} {}", parts[0], parts[1]);

                        let mut content_length: usize = 0;
                        loop {
                            let mut line = String::new();
                            if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                                break;
                            }
                            let lower = line.to_lowercase();
                            if let Some(val) = lower.strip_prefix("content-length: ") {
                                content_length = val.trim().parse().unwrap_or(0);
                            }
                        }
                        let mut body = vec![0u8; content_length];
                        if content_length > 0 {
                            let _ = reader.read_exact(&mut body);
                        }

                        let routes = routes.lock().unwrap();
                        let (status, payload) = routes
                            .get(&key)
                            .cloned()
                            .unwrap_or((404, b"not found".to_vec()));
                        let reason = if status == 200 { "OK" } else { "Error" };
                        let head = format!(
                            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            payload.len()
                        );
                        let _ = stream.write_all(head.as_bytes());
                        let _ = stream.write_all(&payload);
                        let _ = stream.flush();
                    });
                }
            });

            MockServer {
                addr,
                _handle: handle,
            }
        }
    }

    fn sample_request() -> ResolutionRequest {
        ResolutionRequest {
            root_package: LocalRequestPackage {
                id: 1,
                language: WireLanguage {
                    name: "Cpp".to_owned(),
                    version: "0.8.0".to_owned(),
                },
                dependencies: std::collections::BTreeMap::new(),
            },
            local_packages: Vec::new(),
            public_packages: Vec::new(),
            preferred_versions: Vec::new(),
        }
    }

    #[test]
    fn resolve_decodes_success_response() {
        let response = br#"{"result": "success", "runtime_closure": [], "build_closures": {}, "tool_closures": {}}"#;
        let server = MockServer::start(HashMap::from([(
            "POST /v1/closures".to_owned(),
            (200, response.to_vec()),
        )]));

        let backend = HttpBackend::new(RemoteConfig::new(&server.addr));
        let decoded = backend.resolve(&sample_request()).unwrap();
        assert_eq!(decoded.result, ResolutionOutcome::Success);
    }

    #[test]
    fn resolve_surfaces_malformed_body_as_serialization_error() {
        let server = MockServer::start(HashMap::from([(
            "POST /v1/closures".to_owned(),
            (200, b"not json".to_vec()),
        )]));

        let backend = HttpBackend::new(RemoteConfig::new(&server.addr));
        let err = backend.resolve(&sample_request()).unwrap_err();
        assert!(matches!(err, RemoteError::Serialization(_)));
    }

    #[test]
    fn resolve_connection_refused_returns_http_error() {
        let backend = HttpBackend::new(RemoteConfig::new("http://127.0.0.1:1"));
        let err = backend.resolve(&sample_request()).unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
    }

    #[test]
    fn download_returns_archive_bytes() {
        let server = MockServer::start(HashMap::from([(
            "GET /v1/packages/Cpp/fred/json/versions/1.2.3/archive".to_owned(),
            (200, b"archive-bytes".to_vec()),
        )]));

        let backend = HttpBackend::new(RemoteConfig::new(&server.addr));
        let data = backend
            .download("Cpp", Some("fred"), "json", "1.2.3")
            .unwrap();
        assert_eq!(data, b"archive-bytes");
    }

    #[test]
    fn download_missing_version_is_package_not_found() {
        let server = MockServer::start(HashMap::new());
        let backend = HttpBackend::new(RemoteConfig::new(&server.addr));

        let err = backend
            .download("Cpp", Some("fred"), "json", "9.9.9")
            .unwrap_err();
        match err {
            RemoteError::PackageNotFound(coordinate) => {
                assert_eq!(coordinate, "[Cpp]fred|json@9.9.9");
            }
            other => panic!("expected PackageNotFound, got {other:?}"),
        }
    }

    #[test]
    fn download_unowned_uses_local_segment() {
        let server = MockServer::start(HashMap::from([(
            "GET /v1/packages/Rune/Local/assert/versions/4.4.4/archive".to_owned(),
            (200, b"data".to_vec()),
        )]));

        let backend = HttpBackend::new(RemoteConfig::new(&server.addr));
        let data = backend.download("Rune", None, "assert", "4.4.4").unwrap();
        assert_eq!(data, b"data");
    }
}
