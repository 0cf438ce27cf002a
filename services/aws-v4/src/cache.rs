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

//! Time bounded cache of derived signing keys.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::TimeDelta;
use log::debug;
use sigv4_core::time::{format_iso8601, DateTime};

use crate::key::{DeriveSigningKey, SigningKey, V4KeyDeriver};

#[derive(Clone, Copy)]
struct SigningKeyEntry {
    key: SigningKey,
    expires_at: DateTime,
}

/// SigningKeyCache keeps derived signing keys per `region-service` slot.
///
/// The date is not part of the slot: a key derived for one date is reused
/// until it expires, even if callers move on to a new date. Keep the lifetime
/// short enough for your date boundaries.
pub struct SigningKeyCache {
    lifetime: Duration,
    deriver: Arc<dyn DeriveSigningKey>,
    entries: Mutex<HashMap<String, SigningKeyEntry>>,
}

impl Debug for SigningKeyCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyCache")
            .field("lifetime", &self.lifetime)
            .field("deriver", &self.deriver)
            .field("slots", &self.len())
            .finish()
    }
}

impl SigningKeyCache {
    /// Create a new cache whose entries live for `lifetime`.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            deriver: Arc::new(V4KeyDeriver),
            entries: Mutex::default(),
        }
    }

    /// Replace the lifetime, dropping cached entries.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self.entries = Mutex::default();
        self
    }

    /// Replace the key deriver.
    pub fn with_deriver(mut self, deriver: impl DeriveSigningKey) -> Self {
        self.deriver = Arc::new(deriver);
        self
    }

    /// Lifetime of a cached entry.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Number of cached slots.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }

    /// Returns `true` if no key has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached key for `region-service` if it's still valid at
    /// `now`, otherwise derive a fresh one and store it.
    ///
    /// The lookup, the expiry check and the store happen under one lock.
    pub fn get_or_derive(
        &self,
        secret: &str,
        date: &str,
        region: &str,
        service: &str,
        now: DateTime,
    ) -> SigningKey {
        let cache_key = format!("{region}-{service}");

        let mut entries = self.entries.lock().expect("lock poisoned");
        if let Some(entry) = entries.get(&cache_key) {
            if now < entry.expires_at {
                debug!("signing key cache hit for {cache_key}");
                return entry.key;
            }
            debug!(
                "signing key for {cache_key} expired at {}, refreshing",
                format_iso8601(entry.expires_at)
            );
        } else {
            debug!("signing key cache miss for {cache_key}");
        }

        let entry = SigningKeyEntry {
            key: self
                .deriver
                .derive_signing_key(secret, date, region, service),
            expires_at: self.expires_at(now),
        };
        entries.insert(cache_key, entry);
        entry.key
    }

    fn expires_at(&self, now: DateTime) -> DateTime {
        TimeDelta::from_std(self.lifetime)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::MAX_UTC)
    }
}
