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

//! Static region tables for resolving the region of an endpoint host.

/// General endpoints, as `(region, endpoint suffix)`.
pub const REGION_ENDPOINTS: &[(&str, &str)] = &[
    ("us-gov-west-1", "fips-us-gov-west-1.amazonaws.com"),
    ("us-east-1", "s3.amazonaws.com"),
    ("us-west-1", "us-west-1.amazonaws.com"),
    ("us-west-2", "us-west-2.amazonaws.com"),
    ("eu-west-1", "eu-west-1.amazonaws.com"),
    ("ap-southeast-1", "ap-southeast-1.amazonaws.com"),
    ("ap-southeast-2", "ap-southeast-2.amazonaws.com"),
    ("ap-northeast-1", "ap-northeast-1.amazonaws.com"),
    ("sa-east-1", "sa-east-1.amazonaws.com"),
    ("cn-north-1", "cn-north-1.amazonaws.com.cn"),
];

/// S3 endpoints, as `(region, endpoint suffix)`.
pub const S3_REGION_ENDPOINTS: &[(&str, &str)] = &[
    ("us-gov-west-1", "s3-fips-us-gov-west-1.amazonaws.com"),
    ("us-east-1", "s3.amazonaws.com"),
    ("us-west-1", "s3-us-west-1.amazonaws.com"),
    ("us-west-2", "s3-us-west-2.amazonaws.com"),
    ("eu-west-1", "s3-eu-west-1.amazonaws.com"),
    ("ap-southeast-1", "s3-ap-southeast-1.amazonaws.com"),
    ("ap-southeast-2", "s3-ap-southeast-2.amazonaws.com"),
    ("ap-northeast-1", "s3-ap-northeast-1.amazonaws.com"),
    ("sa-east-1", "s3-sa-east-1.amazonaws.com"),
    ("cn-north-1", "s3-cn-north-1.amazonaws.com.cn"),
];

/// Resolve the region of a general AWS endpoint host.
///
/// A port suffix is ignored. Returns `None` if the host is not a known endpoint.
pub fn region_from_host(host: &str) -> Option<&'static str> {
    lookup(REGION_ENDPOINTS, host)
}

/// Resolve the region of an S3 endpoint host, including virtual hosted
/// style hosts like `bucket.s3-us-west-2.amazonaws.com`.
pub fn s3_region_from_host(host: &str) -> Option<&'static str> {
    lookup(S3_REGION_ENDPOINTS, host)
}

fn lookup(table: &'static [(&'static str, &'static str)], host: &str) -> Option<&'static str> {
    let host = strip_port(host);

    // Longest suffix wins so that overlapping suffixes resolve the same way every time.
    table
        .iter()
        .filter(|(_, suffix)| host.ends_with(suffix))
        .max_by_key(|(_, suffix)| suffix.len())
        .map(|(region, _)| *region)
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((h, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => h,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("s3.amazonaws.com", Some("us-east-1"); "us east")]
    #[test_case("bucket.s3.amazonaws.com", Some("us-east-1"); "virtual hosted")]
    #[test_case("s3-us-west-2.amazonaws.com", Some("us-west-2"); "us west 2")]
    #[test_case("bucket.s3-eu-west-1.amazonaws.com:443", Some("eu-west-1"); "with port")]
    #[test_case("s3-fips-us-gov-west-1.amazonaws.com", Some("us-gov-west-1"); "fips")]
    #[test_case("s3-cn-north-1.amazonaws.com.cn", Some("cn-north-1"); "china")]
    #[test_case("example.com", None; "unknown")]
    #[test_case("127.0.0.1:9000", None; "local")]
    fn test_s3_region_from_host(host: &str, expected: Option<&str>) {
        assert_eq!(s3_region_from_host(host), expected);
    }

    #[test_case("iam.us-west-1.amazonaws.com", Some("us-west-1"); "us west 1")]
    #[test_case("s3.amazonaws.com", Some("us-east-1"); "us east")]
    #[test_case("ec2.cn-north-1.amazonaws.com.cn", Some("cn-north-1"); "china")]
    #[test_case("ec2.eu-central-1.amazonaws.com", None; "not listed")]
    fn test_region_from_host(host: &str, expected: Option<&str>) {
        assert_eq!(region_from_host(host), expected);
    }

    #[test]
    fn test_every_suffix_resolves_to_itself() {
        for (region, suffix) in REGION_ENDPOINTS {
            assert_eq!(region_from_host(suffix), Some(*region));
        }
        for (region, suffix) in S3_REGION_ENDPOINTS {
            assert_eq!(s3_region_from_host(suffix), Some(*region));
        }
    }
}
