// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! A minimal REST client that signs every request it sends.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_LENGTH};
use http::{HeaderValue, Method, StatusCode};
use log::debug;
use quick_xml::de;
use serde::Deserialize;
use sigv4_core::{Error, Result};

use crate::region::{region_from_host, s3_region_from_host};
use crate::{Config, Credentials, RequestSigner};

/// Client sends signed GET and PUT requests to AWS REST endpoints.
///
/// The region is resolved from the URL host, falling back to the configured
/// region for hosts outside the endpoint tables. The service is fixed per client.
#[derive(Debug, Clone)]
pub struct Client {
    service: String,
    region: Option<String>,
    http: reqwest::Client,
    signer: Arc<RequestSigner>,
}

/// Error information returned in the body of a failed response.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// Error code like `NoSuchKey`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Resource the error is about.
    pub resource: String,
    /// Request id assigned by the service.
    pub request_id: String,
}

impl Client {
    /// Create a client for `service` with a default reqwest client.
    pub fn new(service: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            service: service.into(),
            region: None,
            http: reqwest::Client::new(),
            signer: Arc::new(RequestSigner::new(credentials)),
        }
    }

    /// Create a client for `service` from loaded config.
    ///
    /// `region` of the config is used for hosts that are not known endpoints.
    pub fn from_config(service: impl Into<String>, cfg: &Config) -> Result<Self> {
        let mut client = Self::new(service, Credentials::from_config(cfg)?);
        client.region = cfg.region.clone();
        Ok(client)
    }

    /// Region used when the URL host is not a known endpoint.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Use the given reqwest client to send requests.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Use the given signer, for example one with a custom clock.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    /// Signer used by this client.
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Send a signed GET request.
    pub async fn get(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<http::Response<Bytes>> {
        self.send(Method::GET, url, extra_headers, Bytes::new())
            .await
    }

    /// Send a signed PUT request with `body`.
    ///
    /// `Content-Length` is set from the body unless `extra_headers` overrides it.
    pub async fn put(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
        body: impl Into<Bytes>,
    ) -> Result<http::Response<Bytes>> {
        self.send(Method::PUT, url, extra_headers, body.into())
            .await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        extra_headers: &[(&str, &str)],
        body: Bytes,
    ) -> Result<http::Response<Bytes>> {
        let uri: http::Uri = url
            .parse()
            .map_err(|e| Error::invalid_input(format!("invalid url: {url}")).with_source(e))?;
        let host = uri
            .host()
            .ok_or_else(|| Error::invalid_input(format!("url has no host: {url}")))?;
        let region = self.resolve_region(host).ok_or_else(|| {
            Error::unresolvable_region(format!(
                "url does not appear to be an AWS endpoint and no region is configured: {url}"
            ))
        })?;

        let mut req = http::Request::new(());
        *req.method_mut() = method.clone();
        *req.uri_mut() = uri;
        let (mut parts, ()) = req.into_parts();

        if method == Method::PUT {
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        }
        // Extra headers override the defaults above.
        for (k, v) in extra_headers {
            parts
                .headers
                .insert(HeaderName::from_bytes(k.as_bytes())?, HeaderValue::from_str(v)?);
        }

        let now = self.signer.now();
        self.signer.prepare(&mut parts, &body, now)?;
        self.signer
            .sign(&mut parts, &body, region, &self.service, now)?;

        let req = reqwest::Request::try_from(http::Request::from_parts(parts, body))
            .map_err(|e| Error::unexpected("failed to build http request").with_source(e))?;

        debug!("sending {method} request to {url} in region {region}");
        let resp = self
            .http
            .execute(req)
            .await
            .map_err(|e| Error::unexpected(format!("failed to send request to {url}")).with_source(e))?;

        let status = resp.status();
        let version = resp.version();
        let headers = resp.headers().clone();
        let content = resp
            .bytes()
            .await
            .map_err(|e| Error::unexpected("failed to read response body").with_source(e))?;

        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(parse_error_response(status, &content));
        }

        let mut resp = http::Response::new(content);
        *resp.status_mut() = status;
        *resp.version_mut() = version;
        *resp.headers_mut() = headers;
        Ok(resp)
    }
}

impl Client {
    fn resolve_region(&self, host: &str) -> Option<&str> {
        s3_region_from_host(host)
            .or_else(|| region_from_host(host))
            .or(self.region.as_deref())
            .filter(|region| !region.is_empty())
    }
}

fn parse_error_response(status: StatusCode, content: &[u8]) -> Error {
    let content = String::from_utf8_lossy(content);
    match de::from_str::<ErrorResponse>(&content) {
        Ok(resp) => {
            debug!(
                "request {} for {} failed with {status}",
                resp.request_id, resp.resource
            );
            Error::unexpected(format!(
                "http response error: status: {status}, code: {}, message: {}",
                resp.code, resp.message
            ))
        }
        Err(e) => {
            Error::unexpected(format!("failed to parse error response with status {status}"))
                .with_source(e)
        }
    }
}
