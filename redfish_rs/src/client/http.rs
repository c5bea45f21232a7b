//! Blocking HTTPS transport for Redfish services.
//!
//! Sessions are opened through `SessionService/Sessions` and authenticated
//! with `X-Auth-Token` afterwards. Resource discovery is a bounded crawl of
//! the service root collections, cached for the lifetime of the client.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{
    ClientError, Connector, LoginRequest, Resource, RestClient, SessionRecord, type_matches,
};

const SERVICE_ROOT: &str = "/redfish/v1/";
const SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions/";
const CRAWL_ROOTS: &[&str] = &["Systems", "Managers", "Chassis"];
const MAX_RETRIES: usize = 3;
const MAX_CRAWLED: usize = 256;
const BIOS_PASSWORD_HEADER: &str = "X-HPRESTFULAPI-AuthToken";

/// Opens [`HttpClient`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, request: &LoginRequest) -> Result<Box<dyn RestClient>, ClientError> {
        let mut client = HttpClient::new(
            &normalize_url(&request.url),
            request.proxy.as_deref(),
            self.timeout,
        )?;
        client.username = request.username.clone();
        client.password = request.password.clone();
        client.open_session()?;
        Ok(Box::new(client))
    }

    fn reconnect(
        &self,
        record: &SessionRecord,
        proxy: Option<&str>,
    ) -> Result<Box<dyn RestClient>, ClientError> {
        let mut client = HttpClient::new(&record.url, proxy, self.timeout)?;
        client.username = record.username.clone();
        client.password = record.password.clone();
        client.token = record.token.clone();
        client.session_location = record.session_location.clone();
        Ok(Box::new(client))
    }
}

/// Prefixes `https://` when the user typed a bare host.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

pub struct HttpClient {
    http: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    session_location: Option<String>,
    resources: BTreeMap<String, Value>,
    crawled: bool,
}

impl HttpClient {
    fn new(base_url: &str, proxy: Option<&str>, timeout: Duration) -> Result<Self, ClientError> {
        // Management controllers ship self-signed certificates.
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout);
        if let Some(proxy) = proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| ClientError::Transport(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            username: None,
            password: None,
            token: None,
            session_location: None,
            resources: BTreeMap::new(),
            crawled: false,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    fn open_session(&mut self) -> Result<(), ClientError> {
        let (Some(user), Some(password)) = (self.username.clone(), self.password.clone()) else {
            return Err(ClientError::InvalidCredentials(self.base_url.clone()));
        };
        let body = json!({"UserName": user, "Password": password});
        let response = self.send(|http, url| http.post(url).json(&body), SESSIONS_PATH)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ClientError::InvalidCredentials(self.base_url.clone()));
            }
            status if !status.is_success() => {
                return Err(ClientError::Response {
                    path: SESSIONS_PATH.to_string(),
                    status: status.as_u16(),
                    message: response.text().unwrap_or_default(),
                });
            }
            _ => {}
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let token = header("X-Auth-Token").ok_or_else(|| ClientError::MalformedResponse {
            path: SESSIONS_PATH.to_string(),
            reason: "missing X-Auth-Token header".to_string(),
        })?;
        self.session_location = header("Location").map(|loc| self.relative_path(&loc));
        self.token = Some(token);
        debug!(url = %self.base_url, "opened Redfish session");
        Ok(())
    }

    fn relative_path(&self, location: &str) -> String {
        location
            .strip_prefix(self.base_url.trim_end_matches('/'))
            .unwrap_or(location)
            .to_string()
    }

    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token);
        } else if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }
        request
    }

    /// Sends a request, retrying connection failures.
    fn send<F>(&self, build: F, path: &str) -> Result<reqwest::blocking::Response, ClientError>
    where
        F: Fn(&Client, String) -> RequestBuilder,
    {
        let url = self.url(path);
        let mut last_error = None;
        for attempt in 1..=MAX_RETRIES {
            let request = self.authorize(build(&self.http, url.clone()));
            match request.send() {
                Ok(response) => return Ok(response),
                Err(err) if err.is_connect() || err.is_timeout() => {
                    warn!(%url, attempt, "request failed: {}", err);
                    last_error = Some(err);
                }
                Err(err) => return Err(ClientError::Transport(err.to_string())),
            }
        }
        match last_error {
            Some(err) if err.is_connect() => Err(ClientError::Unreachable {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }),
            _ => Err(ClientError::RetriesExhausted(url)),
        }
    }

    fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError> {
        let digest = bios_password.map(|pw| format!("{:X}", Sha256::digest(pw.as_bytes())));
        let response = self.send(
            |http, url| {
                let mut request = http.request(method.clone(), url);
                if let Some(body) = body {
                    request = request.json(body);
                }
                if let Some(digest) = &digest {
                    request = request.header(BIOS_PASSWORD_HEADER, digest);
                }
                request
            },
            path,
        )?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED && self.token.is_some() {
            return Err(ClientError::SessionExpired);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials(self.base_url.clone()));
        }
        if !status.is_success() {
            return Err(ClientError::Response {
                path: path.to_string(),
                status: status.as_u16(),
                message: extended_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ClientError::MalformedResponse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Walks the service root collections once and caches every member.
    fn crawl(&mut self) -> Result<(), ClientError> {
        if self.crawled {
            return Ok(());
        }
        let mut queue: Vec<String> = Vec::new();
        let root = self.get(SERVICE_ROOT)?;
        for name in CRAWL_ROOTS {
            if let Some(link) = root.body.pointer(&format!("/{}/@odata.id", name)) {
                if let Some(link) = link.as_str() {
                    queue.push(link.to_string());
                }
            }
        }

        let mut seen: BTreeSet<String> = BTreeSet::new();
        while let Some(path) = queue.pop() {
            if seen.len() >= MAX_CRAWLED || !seen.insert(path.clone()) {
                continue;
            }
            let resource = match self.get(&path) {
                Ok(resource) => resource,
                Err(err) => {
                    debug!(%path, "skipping resource during discovery: {}", err);
                    continue;
                }
            };
            if let Some(members) = resource.body.get("Members").and_then(Value::as_array) {
                queue.extend(
                    members
                        .iter()
                        .filter_map(|m| m.get("@odata.id").and_then(Value::as_str))
                        .map(String::from),
                );
            }
            if let Some(bios) = resource.body.pointer("/Bios/@odata.id").and_then(Value::as_str) {
                queue.push(bios.to_string());
            }
        }
        self.crawled = true;
        Ok(())
    }
}

impl RestClient for HttpClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }

    fn set_password(&mut self, password: String) {
        self.password = Some(password);
    }

    fn get(&mut self, path: &str) -> Result<Resource, ClientError> {
        let body = self.request(Method::GET, path, None, None)?;
        self.resources.insert(path.to_string(), body.clone());
        Ok(Resource::new(path, body))
    }

    fn post(&mut self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.request(Method::POST, path, Some(body), None)
    }

    fn put(
        &mut self,
        path: &str,
        body: &Value,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError> {
        self.request(Method::PUT, path, Some(body), bios_password)
    }

    fn patch(
        &mut self,
        path: &str,
        body: &Value,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError> {
        self.request(Method::PATCH, path, Some(body), bios_password)
    }

    fn select(&mut self, selector: &str) -> Result<Vec<Resource>, ClientError> {
        self.crawl()?;
        Ok(self
            .resources
            .iter()
            .filter(|(_, body)| {
                body.get("@odata.type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| type_matches(t, selector))
            })
            .map(|(path, body)| Resource::new(path.clone(), body.clone()))
            .collect())
    }

    fn types(&mut self) -> Result<Vec<String>, ClientError> {
        self.crawl()?;
        let types: BTreeSet<String> = self
            .resources
            .iter()
            .filter_map(|(path, body)| Resource::new(path.clone(), body.clone()).type_name())
            .collect();
        Ok(types.into_iter().collect())
    }

    fn logout(&mut self) -> Result<(), ClientError> {
        if let Some(location) = self.session_location.take() {
            match self.request(Method::DELETE, &location, None, None) {
                Ok(_) | Err(ClientError::Response { status: 404, .. }) => {}
                Err(err) => return Err(err),
            }
        }
        self.token = None;
        self.resources.clear();
        self.crawled = false;
        Ok(())
    }

    fn record(&self) -> SessionRecord {
        SessionRecord {
            url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
            session_location: self.session_location.clone(),
        }
    }
}

/// Pulls the first `@Message.ExtendedInfo` message id out of an error body.
fn extended_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| {
            body.pointer("/error/@Message.ExtendedInfo/0/MessageId")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| text.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(normalize_url("10.0.0.100"), "https://10.0.0.100");
        assert_eq!(normalize_url("https://ilo.local/"), "https://ilo.local");
        assert_eq!(normalize_url("http://127.0.0.1:8000"), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_extended_message_prefers_message_id() {
        let body = r#"{"error":{"@Message.ExtendedInfo":[{"MessageId":"Base.1.0.PropertyNotWritable"}]}}"#;
        assert_eq!(extended_message(body), "Base.1.0.PropertyNotWritable");
        assert_eq!(extended_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_reconnect_restores_record_without_network() {
        let record = SessionRecord {
            url: "https://10.0.0.100".into(),
            username: Some("admin".into()),
            password: Some("secret".into()),
            token: Some("abc".into()),
            session_location: Some("/redfish/v1/SessionService/Sessions/1/".into()),
        };
        let client = HttpConnector::default()
            .reconnect(&record, None)
            .expect("client builds");
        assert_eq!(client.record(), record);
    }
}
