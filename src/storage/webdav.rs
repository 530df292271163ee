//! Blob store on a WebDAV server

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Method, StatusCode};

use super::store::{check_path, BlobStore, StoreError};
use crate::auth::Credentials;

/// File/directory info from PROPFIND
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Decoded path relative to the base URL
    pub path: String,
    pub is_collection: bool,
}

pub struct WebDavStore {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
  </D:prop>
</D:propfind>"#;

fn propfind_method() -> Method {
    Method::from_bytes(b"PROPFIND").unwrap_or(Method::GET)
}

fn mkcol_method() -> Method {
    Method::from_bytes(b"MKCOL").unwrap_or(Method::PUT)
}

impl WebDavStore {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, StoreError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Full URL for a store path, each segment percent-encoded
    fn url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|p| !p.is_empty())
            .map(|p| urlencoding::encode(p).into_owned())
            .collect();
        if encoded.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, encoded.join("/"))
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    async fn server_error(response: reqwest::Response) -> StoreError {
        StoreError::Status {
            status: response.status().as_u16(),
            message: response.text().await.unwrap_or_default(),
        }
    }

    /// Check that the server accepts the credentials
    pub async fn test_connection(&self) -> Result<(), StoreError> {
        self.propfind("", 0).await.map(|_| ())
    }

    /// PROPFIND - List directory or get resource properties
    pub async fn propfind(&self, path: &str, depth: u32) -> Result<Vec<ResourceInfo>, StoreError> {
        let response = self
            .request(propfind_method(), path)
            .header("Depth", depth.to_string())
            .header("Content-Type", "application/xml")
            .body(PROPFIND_BODY)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(StoreError::AuthFailed),
            StatusCode::NOT_FOUND => return Err(StoreError::NotFound(path.to_string())),
            status if !status.is_success() => return Err(Self::server_error(response).await),
            _ => {}
        }

        let xml = response.text().await?;
        Ok(parse_propfind_response(&xml, &self.base_url))
    }

    async fn mkcol(&self, path: &str) -> Result<(), StoreError> {
        let response = self.request(mkcol_method(), path).send().await?;
        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(()),
            // Already exists
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::AuthFailed),
            _ => Err(Self::server_error(response).await),
        }
    }
}

#[async_trait]
impl BlobStore for WebDavStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_path(path)?;
        let response = self.request(Method::GET, path).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::AuthFailed),
            status if !status.is_success() => Err(Self::server_error(response).await),
            _ => Ok(Some(response.bytes().await?.to_vec())),
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        check_path(path)?;
        let response = self
            .request(Method::PUT, path)
            .header("Content-Type", "application/json")
            .body(data.to_vec())
            .send()
            .await?;
        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT | StatusCode::OK => {
                log::debug!("store: uploaded {} ({} bytes)", path, data.len());
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::AuthFailed),
            _ => Err(Self::server_error(response).await),
        }
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, StoreError> {
        check_path(folder)?;
        let entries = match self.propfind(folder, 1).await {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let folder = folder.trim_matches('/');
        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|e| !e.is_collection)
            .filter_map(|e| {
                let path = e.path.trim_matches('/');
                let (parent, name) = path.rsplit_once('/').unwrap_or(("", path));
                (parent == folder && !name.is_empty()).then(|| name.to_string())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        check_path(path)?;
        let response = self.request(Method::DELETE, path).send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::AuthFailed),
            _ => Err(Self::server_error(response).await),
        }
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), StoreError> {
        check_path(folder)?;
        let mut current = String::new();
        for part in folder.split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            self.mkcol(&current).await?;
        }
        Ok(())
    }
}

struct PropfindPatterns {
    response: Regex,
    href: Regex,
    collection: Regex,
}

fn patterns() -> &'static PropfindPatterns {
    static PATTERNS: OnceLock<PropfindPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PropfindPatterns {
        response: Regex::new(r"(?s)<(?:\w+:)?response(?:\s[^>]*)?>(.*?)</(?:\w+:)?response>")
            .expect("static propfind pattern"),
        href: Regex::new(r"(?s)<(?:\w+:)?href(?:\s[^>]*)?>(.*?)</(?:\w+:)?href>")
            .expect("static propfind pattern"),
        collection: Regex::new(r"<(?:\w+:)?collection\s*/?>").expect("static propfind pattern"),
    })
}

/// Parse a PROPFIND multistatus body.
///
/// Servers return hrefs either as full URLs or as absolute paths; both are
/// made relative to `base_url` and percent-decoded.
fn parse_propfind_response(xml: &str, base_url: &str) -> Vec<ResourceInfo> {
    let patterns = patterns();

    // Path component of the base URL, e.g. "/remote.php/dav/files/user"
    let base_path = base_url
        .find("://")
        .map(|i| &base_url[i + 3..])
        .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or("")
        .trim_end_matches('/');

    let mut resources = Vec::new();
    for block in patterns.response.captures_iter(xml) {
        let body = &block[1];
        let Some(href) = patterns.href.captures(body) else {
            continue;
        };
        let href = href[1].trim();

        let path = if let Some(stripped) = href.strip_prefix(base_url) {
            stripped
        } else {
            href.strip_prefix(base_path).unwrap_or(href)
        };
        let path = path.trim_matches('/');
        let path = urlencoding::decode(path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| path.to_string());

        resources.push(ResourceInfo {
            path,
            is_collection: patterns.collection.is_match(body),
        });
    }

    log::debug!("store: parsed {} PROPFIND entries", resources.len());
    resources
}
