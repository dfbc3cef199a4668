//! CQuery result parsing and lookup.
//!
//! The evaluator answers the line-protocol call with one record per line:
//!
//! ```text
//! label|arch|os[|apex_marker|sdk_version]>>payload
//! ```
//!
//! Every record must name a queued `(label, config)` pair. Records with the
//! same key accumulate in order; how the payloads are read back depends on the
//! [`QueryKind`] the consumer asks for. Records carry no kind, so a key queued
//! under several kinds cannot be answered and fails the parse.

mod types;

pub use types::*;

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::consts::{CQUERY_PAYLOAD_SEPARATOR, KEY_FIELD_SEPARATOR, OUTPUT_FILES_SEPARATOR};
use crate::request::{ConfigKey, CqueryRequest, QueryKind};

/// Frozen cquery answers of one invocation round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CqueryResults {
  requests: HashSet<CqueryRequest>,
  payloads: HashMap<(String, ConfigKey), Vec<String>>,
}

impl CqueryResults {
  /// Results for a round that issued no cquery call.
  pub fn empty(requests: &[CqueryRequest]) -> Self {
    Self {
      requests: requests.iter().cloned().collect(),
      payloads: HashMap::new(),
    }
  }

  /// Decode evaluator output against the requests that were queued for it.
  pub fn parse(output: &str, requests: &[CqueryRequest]) -> Result<Self, CqueryParseError> {
    let mut queued: HashMap<(&str, &ConfigKey), QueryKind> = HashMap::new();
    let mut ambiguous: HashSet<(&str, &ConfigKey)> = HashSet::new();
    for request in requests {
      let key = (request.label.as_str(), &request.config);
      if let Some(kind) = queued.insert(key, request.kind)
        && kind != request.kind
      {
        ambiguous.insert(key);
      }
    }
    let mut payloads: HashMap<(String, ConfigKey), Vec<String>> = HashMap::new();

    for (index, record) in output.lines().enumerate() {
      let line = index + 1;
      let record = record.trim_end_matches('\r');
      if record.trim().is_empty() {
        continue;
      }

      let (key, payload) =
        record
          .split_once(CQUERY_PAYLOAD_SEPARATOR)
          .ok_or_else(|| CqueryParseError::MissingSeparator {
            line,
            record: record.to_string(),
          })?;

      let mut fields = key.split(KEY_FIELD_SEPARATOR);
      let label = fields.next().unwrap_or_default();
      if label.is_empty() {
        return Err(CqueryParseError::EmptyLabel {
          line,
          record: record.to_string(),
        });
      }
      let config_fields: Vec<&str> = fields.collect();
      let config = ConfigKey::from_fields(&config_fields).map_err(|source| CqueryParseError::Config {
        line,
        record: record.to_string(),
        source,
      })?;

      if !queued.contains_key(&(label, &config)) {
        return Err(CqueryParseError::UnknownKey {
          line,
          key: key.to_string(),
        });
      }
      if ambiguous.contains(&(label, &config)) {
        return Err(CqueryParseError::AmbiguousKind {
          line,
          key: key.to_string(),
        });
      }

      debug!(label, config = %config, payload, "cquery record");
      payloads
        .entry((label.to_string(), config))
        .or_default()
        .push(payload.to_string());
    }

    Ok(Self {
      requests: requests.iter().cloned().collect(),
      payloads,
    })
  }

  /// Number of distinct `(label, config)` keys with at least one record.
  pub fn len(&self) -> usize {
    self.payloads.len()
  }

  pub fn is_empty(&self) -> bool {
    self.payloads.is_empty()
  }

  /// Raw payload records for a queued request, in output order.
  pub fn lookup(&self, label: &str, config: &ConfigKey, kind: QueryKind) -> Result<&[String], LookupError> {
    let request = CqueryRequest::new(label, kind, config.clone());
    if !self.requests.contains(&request) {
      return Err(LookupError::NotQueued {
        label: label.to_string(),
        kind,
        config: config.to_string(),
      });
    }

    self
      .payloads
      .get(&(label.to_string(), config.clone()))
      .map(Vec::as_slice)
      .ok_or_else(|| LookupError::NoResult {
        label: label.to_string(),
        config: config.to_string(),
      })
  }

  /// Output files of `label` under `config`.
  pub fn output_files(&self, label: &str, config: &ConfigKey) -> Result<Vec<String>, LookupError> {
    let records = self.lookup(label, config, QueryKind::OutputFiles)?;
    Ok(
      records
        .iter()
        .flat_map(|payload| payload.split(OUTPUT_FILES_SEPARATOR))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  /// APEX metadata of `label` under `config`, decoded from the first record.
  pub fn apex_info(&self, label: &str, config: &ConfigKey) -> Result<ApexInfo, LookupError> {
    let records = self.lookup(label, config, QueryKind::ApexInfo)?;
    let payload = records.first().ok_or_else(|| LookupError::NoResult {
      label: label.to_string(),
      config: config.to_string(),
    })?;
    serde_json::from_str(payload).map_err(|source| LookupError::Payload {
      label: label.to_string(),
      kind: QueryKind::ApexInfo,
      source,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::request::{ApexConfigKey, ConfigKeyError, OsType};

  fn arm64() -> ConfigKey {
    ConfigKey::new("arm64_armv8-a", OsType::Android)
  }

  fn arm64_apex() -> ConfigKey {
    arm64().with_apex(ApexConfigKey::new(true, "29"))
  }

  fn requests() -> Vec<CqueryRequest> {
    vec![
      CqueryRequest::new("@//foo:foo", QueryKind::OutputFiles, arm64_apex()),
      CqueryRequest::new("@//foo:bar", QueryKind::OutputFiles, arm64()),
    ]
  }

  #[test]
  fn parses_plain_and_apex_records() {
    let output = [
      "@//foo:foo|arm64_armv8-a|android|within_apex|29>>out/foo/foo.txt",
      "@//foo:bar|arm64_armv8-a|android>>out/foo/bar.txt",
    ]
    .join("\n");

    let results = CqueryResults::parse(&output, &requests()).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results.output_files("@//foo:bar", &arm64()).unwrap(), vec!["out/foo/bar.txt"]);
    assert_eq!(
      results.output_files("@//foo:foo", &arm64_apex()).unwrap(),
      vec!["out/foo/foo.txt"]
    );
  }

  #[test]
  fn apex_record_only_matches_apex_key() {
    let output = "@//foo:foo|arm64_armv8-a|android|within_apex|29>>out/foo/foo.txt";
    let results = CqueryResults::parse(output, &requests()).unwrap();

    assert!(matches!(
      results.output_files("@//foo:foo", &arm64()),
      Err(LookupError::NotQueued { .. })
    ));
    let other_sdk = arm64().with_apex(ApexConfigKey::new(true, "30"));
    assert!(matches!(
      results.output_files("@//foo:foo", &other_sdk),
      Err(LookupError::NotQueued { .. })
    ));
  }

  #[test]
  fn repeated_and_joined_records_accumulate() {
    let requests = vec![CqueryRequest::new("//multi:m", QueryKind::OutputFiles, arm64())];
    let output = "//multi:m|arm64_armv8-a|android>>a.so, b.so\n//multi:m|arm64_armv8-a|android>>c.so\n";

    let results = CqueryResults::parse(output, &requests).unwrap();

    assert_eq!(
      results.output_files("//multi:m", &arm64()).unwrap(),
      vec!["a.so", "b.so", "c.so"]
    );
  }

  #[test]
  fn unknown_key_is_fatal() {
    let output = "@//foo:baz|arm64_armv8-a|android>>out/foo/baz.txt";
    let err = CqueryResults::parse(output, &requests()).unwrap_err();
    assert!(matches!(err, CqueryParseError::UnknownKey { line: 1, .. }));
  }

  #[test]
  fn malformed_records_are_fatal() {
    let requests = requests();
    assert!(matches!(
      CqueryResults::parse("@//foo:bar|arm64_armv8-a|android", &requests),
      Err(CqueryParseError::MissingSeparator { .. })
    ));
    assert!(matches!(
      CqueryResults::parse("@//foo:bar|arm64_armv8-a>>x", &requests),
      Err(CqueryParseError::Config {
        source: ConfigKeyError::FieldCount(1),
        ..
      })
    ));
    assert!(matches!(
      CqueryResults::parse("@//foo:foo|arm64_armv8-a|android|apexish|29>>x", &requests),
      Err(CqueryParseError::Config {
        source: ConfigKeyError::ApexMarker(_),
        ..
      })
    ));
    assert!(matches!(
      CqueryResults::parse("|arm64_armv8-a|android>>x", &requests),
      Err(CqueryParseError::EmptyLabel { .. })
    ));
  }

  #[test]
  fn blank_lines_are_skipped() {
    let output = "\n@//foo:bar|arm64_armv8-a|android>>out/foo/bar.txt\r\n\n";
    let results = CqueryResults::parse(output, &requests()).unwrap();
    assert_eq!(results.output_files("@//foo:bar", &arm64()).unwrap(), vec!["out/foo/bar.txt"]);
  }

  #[test]
  fn queued_request_without_records() {
    let results = CqueryResults::parse("", &requests()).unwrap();
    assert!(results.is_empty());
    assert!(matches!(
      results.output_files("@//foo:bar", &arm64()),
      Err(LookupError::NoResult { .. })
    ));
  }

  #[test]
  fn apex_info_payload_decodes_json() {
    let requests = vec![CqueryRequest::new("//apex:com.android.foo", QueryKind::ApexInfo, arm64())];
    let output = r#"//apex:com.android.foo|arm64_armv8-a|android>>{"signing_key":"key.pem","package_name":"com.android.foo","provides_native_libs":["libfoo.so"],"extra":1}"#;

    let results = CqueryResults::parse(output, &requests).unwrap();
    let info = results.apex_info("//apex:com.android.foo", &arm64()).unwrap();

    assert_eq!(info.signing_key, "key.pem");
    assert_eq!(info.package_name, "com.android.foo");
    assert_eq!(info.provides_native_libs, vec!["libfoo.so"]);
    assert!(info.requires_native_libs.is_empty());
  }

  #[test]
  fn apex_info_bad_json_is_lookup_error() {
    let requests = vec![CqueryRequest::new("//apex:a", QueryKind::ApexInfo, arm64())];
    let results = CqueryResults::parse("//apex:a|arm64_armv8-a|android>>not json", &requests).unwrap();
    assert!(matches!(
      results.apex_info("//apex:a", &arm64()),
      Err(LookupError::Payload { .. })
    ));
  }

  #[test]
  fn kind_must_match_queued_request() {
    let results = CqueryResults::parse("@//foo:bar|arm64_armv8-a|android>>out/foo/bar.txt", &requests()).unwrap();
    assert!(matches!(
      results.apex_info("@//foo:bar", &arm64()),
      Err(LookupError::NotQueued {
        kind: QueryKind::ApexInfo,
        ..
      })
    ));
  }

  #[test]
  fn key_queued_under_both_kinds_is_fatal() {
    let mut requests = requests();
    requests.push(CqueryRequest::new("@//foo:bar", QueryKind::ApexInfo, arm64()));

    let err = CqueryResults::parse("@//foo:bar|arm64_armv8-a|android>>out/foo/bar.txt", &requests).unwrap_err();

    assert!(matches!(err, CqueryParseError::AmbiguousKind { line: 1, .. }));
    // Unrelated keys still parse.
    assert!(CqueryResults::parse("@//foo:foo|arm64_armv8-a|android|within_apex|29>>a", &requests).is_ok());
  }
}
