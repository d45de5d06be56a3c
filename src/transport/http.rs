//! `reqwest`-backed transport with one pooled client per endpoint.

use super::{Endpoint, FormPart, RawReply, Request, RequestBody, Transport};
use crate::utils::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

/// Base URL plus the connection pool used to reach it.
#[derive(Debug, Clone)]
struct Route {
    base_url: String,
    client: Client,
}

impl Route {
    fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim().to_string(), client })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Transport over HTTP(S). The two pools live as long as the transport and are
/// released when it is dropped.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    cpo: Route,
    cai: Route,
}

impl HttpTransport {
    pub fn new(cpo_url: &str, cai_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self { cpo: Route::new(cpo_url, timeout)?, cai: Route::new(cai_url, timeout)? })
    }

    fn route(&self, endpoint: Endpoint) -> &Route {
        match endpoint {
            | Endpoint::Cpo => &self.cpo,
            | Endpoint::Cai => &self.cai,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<RawReply> {
        let route = self.route(request.endpoint);
        let method = match request.method {
            | super::Method::Get => reqwest::Method::GET,
            | super::Method::Post => reqwest::Method::POST,
        };
        let builder = route.client.request(method, route.url(&request.path));
        let builder = match request.body {
            | RequestBody::Empty => builder,
            | RequestBody::Json(body) => builder.header(CONTENT_TYPE, "application/json").body(body),
            | RequestBody::Multipart(parts) => builder.multipart(form(parts)),
        };

        // The body is read to the end so the connection goes back to the pool
        // on every path, including error statuses.
        let response = builder.send().await.map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| Error::Transport(e.to_string()))?;
        Ok(RawReply { status, body })
    }
}

fn form(parts: Vec<FormPart>) -> Form {
    parts.into_iter().fold(Form::new(), |form, part| match part {
        | FormPart::Text { name, value } => form.text(name, value),
        | FormPart::File { name, file } => {
            form.part(name, Part::bytes(file.bytes).file_name(file.file_name))
        }
    })
}

/// Joins a base URL and a relative path with exactly one `/` between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
