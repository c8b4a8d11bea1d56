use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

use ghdump_core::error::DumpError;
use ghdump_core::models::repo::{RepositoryRef, UrlProtocol};

use crate::{validate_account, ListOptions, RepositoryLister};

/// Lists an account's repositories through the GitHub REST API.
pub struct GitHubLister {
    client: reqwest::Client,
    api_url: url::Url,
    options: ListOptions,
}

impl GitHubLister {
    pub fn new(api_url: url::Url, options: ListOptions) -> Result<Self, DumpError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("gh-dump/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DumpError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_url,
            options,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.api_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    async fn get_page(&self, path: &str, token: &str, page: u32) -> Result<Vec<GhRepo>, DumpError> {
        let url = format!(
            "{}?per_page={}&page={page}",
            self.url(path),
            self.options.per_page
        );
        tracing::debug!("GET {url}");

        let mut req = self.client.get(&url);
        if !token.is_empty() {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| DumpError::Network {
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| DumpError::Network {
            message: format!("failed to read response body: {e}"),
        })?;

        if status == 401 || status == 403 {
            return Err(DumpError::AuthFailed {
                status,
                message: error_message(&body),
            });
        }
        if !(200..300).contains(&status) {
            return Err(DumpError::ApiError {
                status,
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| DumpError::MalformedResponse {
            message: format!("JSON parse error: {e}"),
        })
    }
}

#[derive(Deserialize)]
struct GhRepo {
    name: String,
    ssh_url: Option<String>,
    clone_url: Option<String>,
}

#[derive(Deserialize)]
struct GhErrorBody {
    message: String,
}

impl GhRepo {
    fn into_ref(self, protocol: UrlProtocol) -> Result<RepositoryRef, DumpError> {
        let url = match protocol {
            UrlProtocol::Ssh => self.ssh_url,
            UrlProtocol::Https => self.clone_url,
        };
        match url {
            Some(url) if !url.is_empty() => Ok(RepositoryRef::new(self.name, url)),
            _ => Err(DumpError::MalformedResponse {
                message: format!("repository {} has no {protocol} clone URL", self.name),
            }),
        }
    }
}

/// GitHub error bodies carry a `message`; fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<GhErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl RepositoryLister for GitHubLister {
    async fn list_repositories(
        &self,
        account: &str,
        token: &str,
    ) -> Result<Vec<RepositoryRef>, DumpError> {
        validate_account(account)?;
        if token.is_empty() {
            tracing::info!("no API token given, listing {account} unauthenticated");
        }

        let path = format!("/users/{account}/repos");
        let per_page = self.options.per_page as usize;
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let items = self.get_page(&path, token, page).await?;
            let count = items.len();
            for item in items {
                all.push(item.into_ref(self.options.protocol)?);
            }

            if count < per_page {
                break;
            }
            if self.options.max_pages.is_some_and(|max| page >= max) {
                tracing::warn!("stopped listing {account} after {page} page(s)");
                break;
            }
            page += 1;
        }

        tracing::info!("{account} has {} repositories", all.len());
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves the canned responses in order, one connection each, and
    /// records the raw request heads.
    async fn serve(responses: Vec<(u16, String)>) -> (url::Url, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = sock.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                log.lock().unwrap().push(String::from_utf8_lossy(&buf).to_string());

                let resp = format!(
                    "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                sock.write_all(resp.as_bytes()).await.unwrap();
                sock.shutdown().await.unwrap();
            }
        });

        let url = url::Url::parse(&format!("http://{addr}")).unwrap();
        (url, seen)
    }

    fn lister(url: url::Url, options: ListOptions) -> GitHubLister {
        GitHubLister::new(url, options).unwrap()
    }

    #[tokio::test]
    async fn test_lists_in_api_order() {
        let body = r#"[
            {"name":"x","ssh_url":"git@host:x.git"},
            {"name":"y","ssh_url":"git@host:y.git"}
        ]"#;
        let (url, seen) = serve(vec![(200, body.to_string())]).await;

        let repos = lister(url, ListOptions::default())
            .list_repositories("octo", "t0k")
            .await
            .unwrap();

        assert_eq!(
            repos,
            vec![
                RepositoryRef::new("x", "git@host:x.git"),
                RepositoryRef::new("y", "git@host:y.git"),
            ]
        );
        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /users/octo/repos?per_page=100&page=1 "));
        assert!(requests[0].to_lowercase().contains("authorization: bearer t0k"));
    }

    #[tokio::test]
    async fn test_empty_token_is_unauthenticated() {
        let (url, seen) = serve(vec![(200, "[]".to_string())]).await;

        let repos = lister(url, ListOptions::default())
            .list_repositories("octo", "")
            .await
            .unwrap();

        assert!(repos.is_empty());
        let requests = seen.lock().unwrap();
        assert!(!requests[0].to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_error() {
        let body = r#"{"message":"Bad credentials"}"#;
        let (url, _) = serve(vec![(401, body.to_string())]).await;

        let err = lister(url, ListOptions::default())
            .list_repositories("octo", "wrong")
            .await
            .unwrap_err();

        match err {
            DumpError::AuthFailed { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("expected AuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forbidden_is_an_error() {
        let (url, _) = serve(vec![(403, "nope".to_string())]).await;
        let err = lister(url, ListOptions::default())
            .list_repositories("octo", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::AuthFailed { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_api_error() {
        let (url, _) = serve(vec![(404, r#"{"message":"Not Found"}"#.to_string())]).await;
        let err = lister(url, ListOptions::default())
            .list_repositories("ghost", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::ApiError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let (url, _) = serve(vec![(200, r#"{"message":"not a list"}"#.to_string())]).await;
        let err = lister(url, ListOptions::default())
            .list_repositories("octo", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_missing_url_field_is_malformed() {
        let body = r#"[{"name":"x","ssh_url":"git@host:x.git"}]"#;
        let (url, _) = serve(vec![(200, body.to_string())]).await;
        let options = ListOptions {
            protocol: UrlProtocol::Https,
            ..ListOptions::default()
        };
        let err = lister(url, options)
            .list_repositories("octo", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_follows_pages_until_short() {
        let page1 = r#"[
            {"name":"a","ssh_url":"git@host:a.git"},
            {"name":"b","ssh_url":"git@host:b.git"}
        ]"#;
        let page2 = r#"[{"name":"c","ssh_url":"git@host:c.git"}]"#;
        let (url, seen) = serve(vec![(200, page1.to_string()), (200, page2.to_string())]).await;
        let options = ListOptions {
            per_page: 2,
            ..ListOptions::default()
        };

        let repos = lister(url, options)
            .list_repositories("octo", "")
            .await
            .unwrap();

        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].starts_with("GET /users/octo/repos?per_page=2&page=2 "));
    }

    #[tokio::test]
    async fn test_max_pages_stops_early() {
        let page1 = r#"[
            {"name":"a","ssh_url":"git@host:a.git"},
            {"name":"b","ssh_url":"git@host:b.git"}
        ]"#;
        let (url, seen) = serve(vec![(200, page1.to_string())]).await;
        let options = ListOptions {
            per_page: 2,
            max_pages: Some(1),
            ..ListOptions::default()
        };

        let repos = lister(url, options)
            .list_repositories("octo", "")
            .await
            .unwrap();

        assert_eq!(repos.len(), 2);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = url::Url::parse(&format!("http://{addr}")).unwrap();

        let err = lister(url, ListOptions::default())
            .list_repositories("octo", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Network { .. }));
    }

    #[tokio::test]
    async fn test_invalid_account_skips_request() {
        let (url, seen) = serve(vec![]).await;
        let err = lister(url, ListOptions::default())
            .list_repositories("", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::InvalidAccount { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }
}
