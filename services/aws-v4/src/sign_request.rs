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

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

use http::header::{self, HeaderName};
use http::request::Parts;
use http::HeaderValue;
use log::debug;
use sigv4_core::hash::{hex_hmac_sha256, hex_sha256};
use sigv4_core::time::{format_date, format_iso8601, Clock, DateTime, SystemClock};
use sigv4_core::{Error, Result, SigningRequest};

use crate::canonical::CanonicalRequest;
use crate::constants::{ALGORITHM, AWS4_REQUEST, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE};
use crate::Credentials;

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
pub struct RequestSigner {
    credentials: Arc<Credentials>,
    clock: Arc<dyn Clock>,

    last: Mutex<Option<Signature>>,
}

impl Debug for RequestSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credentials", &self.credentials)
            .field("clock", &self.clock)
            .finish()
    }
}

/// The artifacts of one signing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    canonical_request: String,
    string_to_sign: String,
    signed_headers: String,
    signature: String,
    authorization: String,
}

impl Signature {
    /// The canonical request that was hashed.
    pub fn canonical_request(&self) -> &str {
        &self.canonical_request
    }

    /// The string to sign.
    pub fn string_to_sign(&self) -> &str {
        &self.string_to_sign
    }

    /// Signed header names joined by `;`.
    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    /// Hex encoded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The value written to the `Authorization` header.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }
}

impl RequestSigner {
    /// Create a new signer for the given credentials.
    pub fn new(credentials: impl Into<Arc<Credentials>>) -> Self {
        Self {
            credentials: credentials.into(),
            clock: Arc::new(SystemClock),
            last: Mutex::new(None),
        }
    }

    /// Specify the clock returned time by [`RequestSigner::now`].
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use a fixed clock for testing.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Credentials used by this signer.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current time according to the signer's clock.
    pub fn now(&self) -> DateTime {
        self.clock.now()
    }

    /// Artifacts of the last successful [`RequestSigner::sign`] call.
    pub fn last_signature(&self) -> Option<Signature> {
        self.last.lock().expect("lock poisoned").clone()
    }

    /// Set `x-amz-content-sha256` to the payload hash and `x-amz-date` to `now`.
    ///
    /// Calling this before [`RequestSigner::sign`] saves `sign` from hashing
    /// the payload again.
    pub fn prepare(&self, req: &mut Parts, payload: &[u8], now: DateTime) -> Result<()> {
        let mut signed_req = SigningRequest::build(req)?;

        signed_req.header_insert(
            HeaderName::from_static(X_AMZ_CONTENT_SHA_256),
            &hex_sha256(payload),
        )?;
        signed_req.header_insert(HeaderName::from_static(X_AMZ_DATE), &format_iso8601(now))?;

        signed_req.apply(req)
    }

    /// Sign the request and set its `Authorization` header.
    ///
    /// `Host` is set from the request URI when missing. On error the request
    /// is left untouched.
    pub fn sign(
        &self,
        req: &mut Parts,
        payload: &[u8],
        region: &str,
        service: &str,
        now: DateTime,
    ) -> Result<Signature> {
        if region.is_empty() {
            return Err(Error::unresolvable_region("region must not be empty"));
        }
        if service.is_empty() {
            return Err(Error::invalid_input("service must not be empty"));
        }

        let mut signed_req = SigningRequest::build(req)?;

        // canonicalize context
        canonicalize_header(&mut signed_req)?;
        let payload_hash = match signed_req.header_get(X_AMZ_CONTENT_SHA_256)? {
            Some(v) => v.trim().to_string(),
            None => hex_sha256(payload),
        };

        // build canonical request and string to sign.
        let creq = CanonicalRequest::build(&signed_req, &payload_hash)?;
        let canonical_request = creq.to_string();
        debug!("calculated canonical request: {canonical_request}");
        let encoded_req = hex_sha256(canonical_request.as_bytes());

        // Scope: "20220313/<region>/<service>/aws4_request"
        let date = format_date(now);
        let scope = format!("{date}/{region}/{service}/{AWS4_REQUEST}");
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{scope}\n{encoded_req}",
            format_iso8601(now)
        );
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = self.credentials.signing_key(&date, region, service, now);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let signed_headers = creq.headers.signed_headers_string();
        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id(),
        );
        let mut value = HeaderValue::from_str(&authorization).map_err(|e| {
            Error::invalid_input("failed to create authorization header").with_source(e)
        })?;
        value.set_sensitive(true);
        signed_req.headers.insert(header::AUTHORIZATION, value);

        // Apply to the request.
        signed_req.apply(req)?;

        let output = Signature {
            canonical_request,
            string_to_sign,
            signed_headers,
            signature,
            authorization,
        };
        *self.last.lock().expect("lock poisoned") = Some(output.clone());
        Ok(output)
    }
}

fn canonicalize_header(ctx: &mut SigningRequest) -> Result<()> {
    // The previous signature must not sign itself.
    ctx.headers.remove(header::AUTHORIZATION);

    // Insert HOST header if not present.
    let has_host = ctx
        .header_get(header::HOST)?
        .is_some_and(|v| !v.trim().is_empty());
    if !has_host {
        let host = ctx
            .authority_host()
            .ok_or_else(|| {
                Error::missing_host_header("request has neither a Host header nor an authority")
            })?
            .to_string();
        ctx.header_insert(header::HOST, &host)?;
    }

    Ok(())
}
