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

//! AWS SigV4 request signer.
//!
//! ## Example
//!
//! ```no_run
//! use sigv4_aws::{Credentials, RequestSigner};
//!
//! # fn main() -> sigv4_core::Result<()> {
//! let signer = RequestSigner::new(Credentials::new("access_key_id", "secret_access_key"));
//!
//! let req = http::Request::get("https://s3.amazonaws.com/bucket/key").body(())?;
//! let (mut parts, _) = req.into_parts();
//!
//! let now = signer.now();
//! signer.prepare(&mut parts, b"", now)?;
//! let signature = signer.sign(&mut parts, b"", "us-east-1", "s3", now)?;
//! println!("{}", signature.authorization());
//! # Ok(())
//! # }
//! ```

mod constants;

pub mod canonical;
pub use canonical::{
    canonicalize_headers, canonicalize_path, canonicalize_query, CanonicalHeaders,
    CanonicalRequest,
};

mod key;
pub use key::{derive_signing_key, DeriveSigningKey, SigningKey, V4KeyDeriver};

mod cache;
pub use cache::SigningKeyCache;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credentials;

mod sign_request;
pub use sign_request::{RequestSigner, Signature};

pub mod region;

mod client;
pub use client::{Client, ErrorResponse};
