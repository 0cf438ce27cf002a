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
use std::time::Duration;

use sigv4_core::time::DateTime;
use sigv4_core::utils::Redact;
use sigv4_core::{Error, OsEnv, Result};

use crate::cache::SigningKeyCache;
use crate::constants::DEFAULT_KEY_LIFETIME_SECS;
use crate::key::{DeriveSigningKey, SigningKey};
use crate::Config;

/// Credentials that hold the access key, the secret key and the cache of
/// signing keys derived from them.
///
/// Construct one per identity and share it (for example behind an `Arc`)
/// between concurrent signing calls.
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    cache: SigningKeyCache,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("cache", &self.cache)
            .finish()
    }
}

impl Credentials {
    /// Create credentials with the default key lifetime of 144 hours.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            cache: SigningKeyCache::new(Duration::from_secs(DEFAULT_KEY_LIFETIME_SECS)),
        }
    }

    /// Build credentials from loaded config.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let (Some(ak), Some(sk)) = (&cfg.access_key_id, &cfg.secret_access_key) else {
            return Err(Error::config_invalid(
                "access_key_id and secret_access_key are required",
            ));
        };

        Ok(Self::new(ak, sk).with_key_lifetime(cfg.key_lifetime))
    }

    /// Load credentials from the process env and the aws profile files.
    pub fn load() -> Result<Self> {
        let cfg = Config::default().from_env(&OsEnv).from_profile(&OsEnv);
        Self::from_config(&cfg)
    }

    /// Set how long a derived signing key is reused.
    ///
    /// Already cached keys are dropped.
    pub fn with_key_lifetime(mut self, lifetime: Duration) -> Self {
        self.cache = self.cache.with_lifetime(lifetime);
        self
    }

    /// Replace the signing key deriver of the cache.
    pub fn with_key_deriver(mut self, deriver: impl DeriveSigningKey) -> Self {
        self.cache = self.cache.with_deriver(deriver);
        self
    }

    /// Access key id for aws services.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Lifetime of cached signing keys.
    pub fn key_lifetime(&self) -> Duration {
        self.cache.lifetime()
    }

    /// The signing key cache owned by these credentials.
    pub fn cache(&self) -> &SigningKeyCache {
        &self.cache
    }

    /// Get the signing key for `date/region/service`, from cache when valid.
    pub fn signing_key(
        &self,
        date: &str,
        region: &str,
        service: &str,
        now: DateTime,
    ) -> SigningKey {
        self.cache
            .get_or_derive(&self.secret_access_key, date, region, service, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_signing_key;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_debug_redacts_secrets() {
        let cred = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        let output = format!("{cred:?}");

        assert!(!output.contains("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"));
        assert!(output.contains("wJa***KEY"));
    }

    #[test]
    fn test_default_key_lifetime() {
        let cred = Credentials::new("ak", "sk");
        assert_eq!(cred.key_lifetime(), Duration::from_secs(144 * 3600));

        let cred = cred.with_key_lifetime(Duration::from_secs(60));
        assert_eq!(cred.key_lifetime(), Duration::from_secs(60));
    }

    #[test]
    fn test_signing_key_is_cached() {
        let now = Utc.with_ymd_and_hms(2011, 9, 9, 23, 36, 0).unwrap();
        let cred = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");

        let key = cred.signing_key("20110909", "us-east-1", "iam", now);
        assert_eq!(
            key,
            derive_signing_key(
                "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
                "20110909",
                "us-east-1",
                "iam"
            )
        );
        assert_eq!(cred.cache().len(), 1);
    }

    #[test]
    fn test_from_config() -> Result<()> {
        let cfg = Config {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            key_lifetime: Duration::from_secs(600),
            ..Default::default()
        };
        let cred = Credentials::from_config(&cfg)?;
        assert_eq!(cred.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(cred.key_lifetime(), Duration::from_secs(600));

        let err = Credentials::from_config(&Config::default()).expect_err("must fail");
        assert_eq!(err.kind(), sigv4_core::ErrorKind::ConfigInvalid);
        Ok(())
    }
}
