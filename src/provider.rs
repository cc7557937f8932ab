#![allow(missing_docs)]

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http::{Request, Response};
use realtime::{Config, HttpRequest, Identity};

use crate::config::Settings;

/// Provider backed by `reqwest` and the dashboard settings.
#[derive(Clone, Debug)]
pub struct Provider {
    client: reqwest::Client,
    settings: Arc<Settings>,
}

impl Provider {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.tracker.source.request_timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, settings })
    }
}

impl realtime::Provider for Provider {}

impl HttpRequest for Provider {
    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let request = reqwest::Request::try_from(request).context("converting request")?;
        let url = request.url().to_string();

        let response = self.client.execute(request).await.with_context(|| format!("requesting {url}"))?;
        let mut builder = Response::builder().status(response.status());
        for (name, value) in response.headers() {
            builder = builder.header(name, value);
        }

        let body = response.bytes().await.with_context(|| format!("reading body of {url}"))?;
        builder.body(body).context("building response")
    }
}

impl Config for Provider {
    async fn get(&self, key: &str) -> Result<String> {
        match key {
            "TELEMETRY_URL" => Ok(self.settings.telemetry_url.clone()),
            "TELEMETRY_AUTH_SCHEME" => Ok(self.settings.auth_scheme.clone()),
            _ => env::var(key).map_err(|err| anyhow!("config key `{key}`: {err}")),
        }
    }
}

impl Identity for Provider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.settings.telemetry_token.clone())
    }
}
