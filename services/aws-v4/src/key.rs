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

//! Signing key derivation.

use std::fmt::Debug;

use sigv4_core::hash::hmac_sha256;

use crate::constants::AWS4_REQUEST;

/// A derived SigV4 signing key.
pub type SigningKey = [u8; 32];

/// Derive the signing key scoped to a date, region and service.
///
/// ```text
/// k_date    = HMAC("AWS4" + secret, date)
/// k_region  = HMAC(k_date, region)
/// k_service = HMAC(k_region, service)
/// k_signing = HMAC(k_service, "aws4_request")
/// ```
pub fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> SigningKey {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(&sign_date, region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(&sign_region, service.as_bytes());
    // Sign request
    hmac_sha256(&sign_service, AWS4_REQUEST.as_bytes())
}

/// DeriveSigningKey is the seam the signing key cache derives keys through.
pub trait DeriveSigningKey: Debug + Send + Sync + 'static {
    /// Derive the signing key for the given scope.
    fn derive_signing_key(
        &self,
        secret: &str,
        date: &str,
        region: &str,
        service: &str,
    ) -> SigningKey;
}

/// The standard AWS4-HMAC-SHA256 key derivation.
#[derive(Debug, Default, Clone, Copy)]
pub struct V4KeyDeriver;

impl DeriveSigningKey for V4KeyDeriver {
    fn derive_signing_key(
        &self,
        secret: &str,
        date: &str,
        region: &str,
        service: &str,
    ) -> SigningKey {
        derive_signing_key(secret, date, region, service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_signing_key() {
        let expected: SigningKey = [
            0x98, 0xf1, 0xd8, 0x89, 0xfe, 0xc4, 0xf4, 0x42, 0x1a, 0xdc, 0x52, 0x2b, 0xab, 0x0c,
            0xe1, 0xf8, 0x2e, 0x69, 0x29, 0xc2, 0x62, 0xed, 0x15, 0xe5, 0xa9, 0x4c, 0x90, 0xef,
            0xd1, 0xe3, 0xb0, 0xe7,
        ];

        assert_eq!(
            derive_signing_key(
                "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
                "20110909",
                "us-east-1",
                "iam"
            ),
            expected
        );
    }

    #[test]
    fn test_derive_signing_key_is_scoped() {
        let secret = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
        let base = derive_signing_key(secret, "20150830", "us-east-1", "iam");

        assert_eq!(
            base,
            V4KeyDeriver.derive_signing_key(secret, "20150830", "us-east-1", "iam")
        );
        assert_eq!(
            hex::encode(base),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
        assert_ne!(base, derive_signing_key(secret, "20150831", "us-east-1", "iam"));
        assert_ne!(base, derive_signing_key(secret, "20150830", "us-west-2", "iam"));
        assert_ne!(base, derive_signing_key(secret, "20150830", "us-east-1", "s3"));
    }
}
