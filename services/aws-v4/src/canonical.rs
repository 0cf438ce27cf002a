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

//! Canonical forms of paths, queries and headers used as signing input.
//!
//! Every function here is pure: the same input always produces the same bytes.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use http::HeaderMap;
use percent_encoding::{percent_decode_str, percent_encode};
use sigv4_core::{Error, Result, SigningRequest};

use crate::constants::{AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET};

/// Percent-encode every byte outside `[A-Za-z0-9-._~]` as uppercase `%XX`.
///
/// `/` is escaped only when `escape_slash` is set: query keys and values need
/// it, paths must keep it.
pub fn uri_encode(input: &[u8], escape_slash: bool) -> String {
    let set = if escape_slash {
        &AWS_QUERY_ENCODE_SET
    } else {
        &AWS_URI_ENCODE_SET
    };
    percent_encode(input, set).to_string()
}

/// Canonicalize a URI path.
///
/// The path is percent-decoded, lexically cleaned and encoded again. A
/// trailing `/` on the input survives cleaning.
pub fn canonicalize_path(path: &str) -> String {
    let raw: Cow<[u8]> = percent_decode_str(path).into();
    let raw: &[u8] = if raw.is_empty() { b"/" } else { &*raw };

    let mut encoded = uri_encode(&clean_path(raw), false);
    if raw.ends_with(b"/") && !encoded.ends_with('/') {
        encoded.push('/');
    }
    encoded
}

/// Lexical path cleaning with POSIX rules.
///
/// - repeated separators collapse into one
/// - `.` elements are removed
/// - `..` removes the element before it, `..` at the root is dropped
/// - the trailing separator is removed unless the result is the root
fn clean_path(path: &[u8]) -> Vec<u8> {
    let rooted = path.first() == Some(&b'/');

    let mut elems: Vec<&[u8]> = Vec::new();
    for elem in path.split(|b| *b == b'/') {
        match elem {
            b"" | b"." => {}
            b".." => {
                if elems.last().is_some_and(|last| *last != b"..") {
                    elems.pop();
                } else if !rooted {
                    elems.push(elem);
                }
            }
            _ => elems.push(elem),
        }
    }

    let mut out = Vec::with_capacity(path.len());
    if rooted {
        out.push(b'/');
    }
    for (idx, elem) in elems.iter().enumerate() {
        if idx > 0 {
            out.push(b'/');
        }
        out.extend_from_slice(elem);
    }
    if out.is_empty() {
        out.push(b'.');
    }
    out
}

/// Canonicalize decoded query pairs.
///
/// Keys and values are encoded separately, joined as `key=value`, and the
/// resulting strings are sorted bytewise. Duplicate keys keep one pair each.
pub fn canonicalize_query<K, V>(query: &[(K, V)]) -> String
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut pairs: Vec<String> = query
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                uri_encode(k.as_ref(), true),
                uri_encode(v.as_ref(), true)
            )
        })
        .collect();
    pairs.sort_unstable();
    pairs.join("&")
}

/// Canonical headers block and the matching signed header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalHeaders {
    /// One `name:value\n` line per distinct header name, sorted by name.
    pub block: String,
    /// Lower-cased header names, sorted.
    pub signed_headers: Vec<String>,
}

impl CanonicalHeaders {
    /// Signed header names joined by `;`.
    pub fn signed_headers_string(&self) -> String {
        self.signed_headers.join(";")
    }
}

/// Canonicalize headers.
///
/// All values of a name are trimmed, sorted and joined by `,`. Names are
/// already lower-cased by `HeaderName`.
pub fn canonicalize_headers(headers: &HeaderMap) -> Result<CanonicalHeaders> {
    let mut folded: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        let value = std::str::from_utf8(value.as_bytes()).map_err(|e| {
            Error::invalid_input(format!("header {name} is not valid utf-8")).with_source(e)
        })?;
        folded.entry(name.as_str()).or_default().push(value.trim());
    }

    let mut block = String::with_capacity(headers.len() * 32);
    let mut signed_headers = Vec::with_capacity(folded.len());
    for (name, mut values) in folded {
        values.sort_unstable();

        block.push_str(name);
        block.push(':');
        block.push_str(&values.join(","));
        block.push('\n');
        signed_headers.push(name.to_string());
    }

    Ok(CanonicalHeaders {
        block,
        signed_headers,
    })
}

/// The canonical request: the byte-exact representation of a request that
/// gets hashed into the string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// HTTP method.
    pub method: String,
    /// Output of [`canonicalize_path`].
    pub path: String,
    /// Output of [`canonicalize_query`].
    pub query: String,
    /// Output of [`canonicalize_headers`].
    pub headers: CanonicalHeaders,
    /// Hex encoded SHA256 of the payload.
    pub payload_hash: String,
}

impl CanonicalRequest {
    /// Build the canonical request of a staged request.
    pub fn build(req: &SigningRequest, payload_hash: &str) -> Result<Self> {
        Ok(Self {
            method: req.method.to_string(),
            path: canonicalize_path(&req.path),
            query: canonicalize_query(&req.query),
            headers: canonicalize_headers(&req.headers)?,
            payload_hash: payload_hash.to_string(),
        })
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // METHOD\nPATH\nQUERY\nHEADER_LINES\n\nSIGNED_HEADERS\nPAYLOAD_HASH
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.path)?;
        writeln!(f, "{}", self.query)?;
        writeln!(f, "{}", self.headers.block)?;
        writeln!(f, "{}", self.headers.signed_headers_string())?;
        write!(f, "{}", self.payload_hash)
    }
}
