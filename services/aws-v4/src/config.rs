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
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use ini::Ini;
use log::debug;
use sigv4_core::{expand_homedir, Env};

use crate::constants::*;

/// Config for aws services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `config_file` will be load from:
    ///
    /// - env value: [`AWS_CONFIG_FILE`]
    /// - default to: `~/.aws/config`
    pub config_file: String,
    /// `shared_credentials_file` will be loaded from:
    ///
    /// - env value: [`AWS_SHARED_CREDENTIALS_FILE`]
    /// - default to: `~/.aws/credentials`
    pub shared_credentials_file: String,
    /// `profile` will be loaded from:
    ///
    /// - env value: [`AWS_PROFILE`]
    /// - default to: `default`
    pub profile: String,

    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`], then [`AWS_DEFAULT_REGION`]
    /// - profile config: `region`
    pub region: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    /// - profile config: `aws_access_key_id`
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    /// - profile config: `aws_secret_access_key`
    pub secret_access_key: Option<String>,
    /// `key_lifetime` will be loaded from:
    ///
    /// - env value: [`SIGV4_KEY_LIFETIME_SECS`]
    /// - default to 144 hours
    pub key_lifetime: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: "~/.aws/config".to_string(),
            shared_credentials_file: "~/.aws/credentials".to_string(),
            profile: "default".to_string(),
            region: None,
            access_key_id: None,
            secret_access_key: None,
            key_lifetime: Duration::from_secs(DEFAULT_KEY_LIFETIME_SECS),
        }
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, env: &impl Env) -> Self {
        if let Some(v) = env.var(AWS_CONFIG_FILE) {
            self.config_file = v;
        }
        if let Some(v) = env.var(AWS_SHARED_CREDENTIALS_FILE) {
            self.shared_credentials_file = v;
        }
        if let Some(v) = env.var(AWS_PROFILE) {
            self.profile = v;
        }
        if let Some(v) = env.var(AWS_REGION).or_else(|| env.var(AWS_DEFAULT_REGION)) {
            self.region = Some(v)
        }
        if let Some(v) = env.var(AWS_ACCESS_KEY_ID) {
            self.access_key_id = Some(v)
        }
        if let Some(v) = env.var(AWS_SECRET_ACCESS_KEY) {
            self.secret_access_key = Some(v)
        }
        if let Some(v) = env.var(SIGV4_KEY_LIFETIME_SECS) {
            match v.parse::<u64>() {
                Ok(secs) => self.key_lifetime = Duration::from_secs(secs),
                Err(err) => debug!("ignore invalid {SIGV4_KEY_LIFETIME_SECS} {v:?}: {err}"),
            }
        }
        self
    }

    /// Load config from profile (and shared profile).
    ///
    /// Values already set on this config win over values in the files.
    pub fn from_profile(mut self, env: &impl Env) -> Self {
        // Ignore all errors happened internally.
        let _ = self.load_via_profile_config_file(env).map_err(|err| {
            debug!("load_via_profile_config_file failed: {err:?}");
        });

        let _ = self
            .load_via_profile_shared_credentials_file(env)
            .map_err(|err| debug!("load_via_profile_shared_credentials_file failed: {err:?}"));

        self
    }

    /// Only the following fields will exist in shared_credentials_file:
    ///
    /// - `aws_access_key_id`
    /// - `aws_secret_access_key`
    fn load_via_profile_shared_credentials_file(&mut self, env: &impl Env) -> Result<()> {
        let path = expand_homedir(env, &self.shared_credentials_file)
            .ok_or_else(|| anyhow!("expand homedir failed"))?;

        let _ = fs::metadata(&path)?;

        let conf = Ini::load_from_file(path)?;

        let props = conf
            .section(Some(&self.profile))
            .ok_or_else(|| anyhow!("section {} is not found", self.profile))?;

        if self.access_key_id.is_none() {
            self.access_key_id = props.get("aws_access_key_id").map(|v| v.to_string());
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = props.get("aws_secret_access_key").map(|v| v.to_string());
        }

        Ok(())
    }

    fn load_via_profile_config_file(&mut self, env: &impl Env) -> Result<()> {
        let path = expand_homedir(env, &self.config_file)
            .ok_or_else(|| anyhow!("expand homedir failed"))?;

        let _ = fs::metadata(&path)?;

        let conf = Ini::load_from_file(path)?;

        let section = match self.profile.as_str() {
            "default" => "default".to_string(),
            x => format!("profile {x}"),
        };
        let props = conf
            .section(Some(section))
            .ok_or_else(|| anyhow!("section {} is not found", self.profile))?;

        if self.region.is_none() {
            self.region = props.get("region").map(|v| v.to_string());
        }
        if self.access_key_id.is_none() {
            self.access_key_id = props.get("aws_access_key_id").map(|v| v.to_string());
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = props.get("aws_secret_access_key").map(|v| v.to_string());
        }

        Ok(())
    }
}
