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

use http::header::HeaderName;
use http::uri::Authority;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use percent_encoding::percent_decode;

use crate::Error;
use crate::Result;

/// Signing context for request.
///
/// The context is a staged copy of the request: signers mutate it freely and
/// the caller's request is only touched by [`SigningRequest::apply`].
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority, absent for origin-form URIs like `/path`.
    pub authority: Option<Authority>,
    /// HTTP path, as it appears in the URI.
    pub path: String,
    /// HTTP query parameters, percent decoded to raw bytes.
    ///
    /// Bytes are kept as is, a decoded pair is not required to be UTF-8.
    pub query: Vec<(Vec<u8>, Vec<u8>)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let uri = &parts.uri;

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme().cloned().unwrap_or(Scheme::HTTP),
            authority: uri.authority().cloned(),
            path: uri.path().to_string(),
            query: uri.query().map(decode_query).unwrap_or_default(),
            headers: parts.headers.clone(),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    ///
    /// Only headers are written back, signing never rewrites the URI.
    pub fn apply(self, parts: &mut http::request::Parts) -> Result<()> {
        parts.headers = self.headers;
        Ok(())
    }

    /// Host of the request as it should appear in the `Host` header.
    ///
    /// Userinfo is stripped from the authority, the port is kept.
    pub fn authority_host(&self) -> Option<&str> {
        self.authority
            .as_ref()
            .and_then(|a| a.as_str().rsplit('@').next())
            .filter(|h| !h.is_empty())
    }

    /// Get header value by name as str.
    ///
    /// Returns `None` if header not found.
    pub fn header_get(&self, key: impl http::header::AsHeaderName) -> Result<Option<&str>> {
        match self.headers.get(key) {
            Some(v) => Ok(Some(std::str::from_utf8(v.as_bytes())?)),
            None => Ok(None),
        }
    }

    /// Insert a header, replacing any existing values.
    pub fn header_insert(&mut self, key: HeaderName, value: &str) -> Result<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_input(format!("invalid value for {key}")).with_source(e))?;
        self.headers.insert(key, value);
        Ok(())
    }
}

/// Split a raw query into `key=value` pairs and percent-decode both sides.
///
/// `+` decodes to a space. Empty pairs are skipped and a pair without `=`
/// has an empty value.
fn decode_query(query: &str) -> Vec<(Vec<u8>, Vec<u8>)> {
    let decode = |input: &str| -> Vec<u8> {
        let input = input.replace('+', " ");
        percent_decode(input.as_bytes()).collect()
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;
    use pretty_assertions::assert_eq;

    fn parts(uri: &str) -> http::request::Parts {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0
    }

    #[test]
    fn test_build_decodes_query() -> Result<()> {
        let p = parts("https://user@example.com:8443/a%20b?x=1&y=%2F&x=0&flag&&z=a+b");
        let req = SigningRequest::build(&p)?;

        assert_eq!(req.path, "/a%20b");
        assert_eq!(req.authority_host(), Some("example.com:8443"));
        assert_eq!(
            req.query,
            vec![
                (b"x".to_vec(), b"1".to_vec()),
                (b"y".to_vec(), b"/".to_vec()),
                (b"x".to_vec(), b"0".to_vec()),
                (b"flag".to_vec(), b"".to_vec()),
                (b"z".to_vec(), b"a b".to_vec()),
            ]
        );
        assert_eq!(req.header_get(header::CONTENT_TYPE)?, Some("text/plain"));
        Ok(())
    }

    #[test]
    fn test_build_keeps_non_utf8_query_bytes() -> Result<()> {
        let req = SigningRequest::build(&parts("https://example.com/?a=%FF&%C3%28=b"))?;

        assert_eq!(
            req.query,
            vec![(b"a".to_vec(), vec![0xff]), (vec![0xc3, 0x28], b"b".to_vec())]
        );
        Ok(())
    }

    #[test]
    fn test_build_without_authority() -> Result<()> {
        let req = SigningRequest::build(&parts("/only/path"))?;
        assert_eq!(req.authority_host(), None);
        Ok(())
    }

    #[test]
    fn test_apply_only_touches_headers() -> Result<()> {
        let mut p = parts("https://example.com/hello?a=b");
        let mut req = SigningRequest::build(&p)?;
        req.header_insert(header::HOST, "example.com")?;
        req.path = "/changed".to_string();
        req.apply(&mut p)?;

        assert_eq!(p.uri, "https://example.com/hello?a=b");
        assert_eq!(p.headers[header::HOST], "example.com");
        assert_eq!(p.headers[header::CONTENT_TYPE], "text/plain");
        Ok(())
    }
}
