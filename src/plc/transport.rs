use std::{fmt, time::Duration};

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::{Client, Method};
use serde_json::Value;

use crate::config::TransportConfig;

/* === Definitions === */

/// Relays a request to the controller and hands back the parsed JSON body.
///
/// Implementations never error across this boundary: any network, TLS, status
/// or decoding failure is reported as `None`. Payloads are not interpreted.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, url: &str, options: RequestOptions) -> Option<Value>;
}

#[derive(Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

pub struct HttpTransport {
    client: Client,
}

/* === Implementations === */

impl RequestOptions {
    pub const AUTH_HEADER: &str = "X-Auth-Token";

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            headers: vec![("Content-Type", "application/json".to_owned())],
            body,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Header values carry the session token and the body carries the login
/// password, only header names are printed.
impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.headers.iter().map(|(name, _)| *name).collect();

        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("headers", &names)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            tracing::warn!("Certificate validation is disabled for controller connections");
        }

        let timeout = Duration::try_from_secs_f32(config.timeout_s)
            .wrap_err_with(|| format!("Invalid transport.timeout_s: {}", config.timeout_s))?;

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    async fn try_request(&self, url: &str, options: RequestOptions) -> reqwest::Result<Value> {
        let mut request = self.client.request(options.method, url).body(options.body.to_string());

        for (name, value) in options.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?.error_for_status()?;

        response.json().await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, options))]
    async fn request(&self, url: &str, options: RequestOptions) -> Option<Value> {
        match self.try_request(url, options).await {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!("Request failed: {err}");
                None
            }
        }
    }
}
