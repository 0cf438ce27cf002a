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

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use http::header::{HeaderName, HeaderValue};
use http::request::Parts;
use http::{Method, Request, Uri};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use pretty_assertions::assert_eq;
use sigv4_aws::{Credentials, RequestSigner};
use sigv4_core::time::{parse_iso8601, FixedClock};
use test_case::test_case;

const ACCESS_KEY: &str = "AKIDEXAMPLE";
const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
const REGION: &str = "us-east-1";
const SERVICE: &str = "service";
const TIME: &str = "20150830T123600Z";

/// Raw request lines keep spaces and UTF-8 in the path, escape them so the
/// line can be parsed as an URI.
const RAW_URI_ESCAPE: &AsciiSet = &CONTROLS.add(b' ');

fn testdata(name: &str, ext: &str) -> Result<String> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata/aws4_testsuite")
        .join(format!("{name}.{ext}"));
    fs::read_to_string(&path).map_err(|e| anyhow!("failed to read {}: {e}", path.display()))
}

/// Parse a `.req` file into request parts and payload.
fn parse_request(content: &str) -> Result<(Parts, Vec<u8>)> {
    let (head, body) = content
        .split_once("\n\n")
        .ok_or_else(|| anyhow!("request has no blank line after headers"))?;
    let mut lines = head.lines();

    let request_line = lines.next().ok_or_else(|| anyhow!("request is empty"))?;
    let (method, rest) = request_line
        .split_once(' ')
        .ok_or_else(|| anyhow!("invalid request line: {request_line}"))?;
    let (raw_uri, _) = rest
        .rsplit_once(' ')
        .ok_or_else(|| anyhow!("invalid request line: {request_line}"))?;

    let uri: Uri = format!(
        "https://example.amazonaws.com{}",
        utf8_percent_encode(raw_uri, RAW_URI_ESCAPE)
    )
    .parse()?;

    let mut req = Request::new(());
    *req.method_mut() = Method::from_bytes(method.as_bytes())?;
    *req.uri_mut() = uri;
    let (mut parts, ()) = req.into_parts();

    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid header line: {line}"))?;
        parts.headers.append(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }

    Ok((parts, body.as_bytes().to_vec()))
}

#[test_case("get-vanilla")]
#[test_case("get-vanilla-query")]
#[test_case("get-vanilla-empty-query-key")]
#[test_case("get-vanilla-query-order-key-case")]
#[test_case("get-vanilla-query-unreserved")]
#[test_case("get-vanilla-query-order-key")]
#[test_case("get-vanilla-query-order-value")]
#[test_case("get-vanilla-utf8-query")]
#[test_case("get-utf8")]
#[test_case("get-space")]
#[test_case("get-slash")]
#[test_case("get-slashes")]
#[test_case("get-relative")]
#[test_case("get-relative-relative")]
#[test_case("get-slash-dot-slash")]
#[test_case("get-slash-pointless-dot")]
#[test_case("post-vanilla")]
#[test_case("post-vanilla-query")]
#[test_case("post-header-key-case")]
#[test_case("post-header-key-sort")]
#[test_case("post-header-value-case")]
#[test_case("post-x-www-form-urlencoded")]
fn test_aws4_testsuite(name: &str) -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let now = parse_iso8601(TIME)?;
    let signer =
        RequestSigner::new(Credentials::new(ACCESS_KEY, SECRET_KEY)).with_clock(FixedClock(now));

    let (mut parts, payload) = parse_request(&testdata(name, "req")?)?;
    let output = signer.sign(&mut parts, &payload, REGION, SERVICE, signer.now())?;

    assert_eq!(output.canonical_request(), testdata(name, "creq")?);
    assert_eq!(output.string_to_sign(), testdata(name, "sts")?);
    assert_eq!(output.authorization(), testdata(name, "authz")?);
    assert_eq!(
        parts.headers[http::header::AUTHORIZATION],
        testdata(name, "authz")?.as_str()
    );
    Ok(())
}

#[test]
fn test_sign_twice_is_stable() -> Result<()> {
    let now = parse_iso8601(TIME)?;
    let signer = RequestSigner::new(Credentials::new(ACCESS_KEY, SECRET_KEY));

    let (mut parts, payload) = parse_request(&testdata("post-vanilla-query", "req")?)?;
    let first = signer.sign(&mut parts, &payload, REGION, SERVICE, now)?;
    // The Authorization header written by the first call must not be signed.
    let second = signer.sign(&mut parts, &payload, REGION, SERVICE, now)?;

    assert_eq!(first, second);
    assert_eq!(second.authorization(), testdata("post-vanilla-query", "authz")?);
    Ok(())
}

#[test]
fn test_prepare_adds_signed_headers() -> Result<()> {
    let now = parse_iso8601(TIME)?;
    let signer = RequestSigner::new(Credentials::new(ACCESS_KEY, SECRET_KEY));

    let (mut parts, payload) = parse_request(&testdata("post-vanilla", "req")?)?;
    signer.prepare(&mut parts, &payload, now)?;
    let output = signer.sign(&mut parts, &payload, REGION, SERVICE, now)?;

    assert_eq!(
        output.signed_headers(),
        "host;x-amz-content-sha256;x-amz-date"
    );
    assert_eq!(parts.headers["x-amz-date"], TIME);
    Ok(())
}
