use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{KEY_FIELD_SEPARATOR, WITHIN_APEX_MARKER};

/// Errors produced when decoding the textual form of a [`ConfigKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigKeyError {
  #[error("expected 2 or 4 configuration fields, got {0}")]
  FieldCount(usize),

  #[error("unknown os type: {0:?}")]
  UnknownOs(String),

  #[error("unknown apex marker: {0:?}")]
  ApexMarker(String),
}

/// Operating system a build variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsType {
  Android,
  LinuxGlibc,
  LinuxMusl,
  LinuxBionic,
  Darwin,
  Windows,
}

impl OsType {
  /// Returns the name the evaluator reports for this OS.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Android => "android",
      Self::LinuxGlibc => "linux_glibc",
      Self::LinuxMusl => "linux_musl",
      Self::LinuxBionic => "linux_bionic",
      Self::Darwin => "darwin",
      Self::Windows => "windows",
    }
  }
}

impl fmt::Display for OsType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for OsType {
  type Err = ConfigKeyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "android" => Ok(Self::Android),
      "linux_glibc" => Ok(Self::LinuxGlibc),
      "linux_musl" => Ok(Self::LinuxMusl),
      "linux_bionic" => Ok(Self::LinuxBionic),
      "darwin" => Ok(Self::Darwin),
      "windows" => Ok(Self::Windows),
      other => Err(ConfigKeyError::UnknownOs(other.to_string())),
    }
  }
}

/// The kind of answer a request asks the evaluator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueryKind {
  /// The files a target produces.
  #[serde(rename = "getOutputFiles")]
  OutputFiles,
  /// APEX packaging metadata of a target.
  #[serde(rename = "getApexInfo")]
  ApexInfo,
}

impl QueryKind {
  /// Returns the name used for this kind in canonical request strings.
  pub fn name(&self) -> &'static str {
    match self {
      Self::OutputFiles => "getOutputFiles",
      Self::ApexInfo => "getApexInfo",
    }
  }
}

impl fmt::Display for QueryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// APEX context of a build variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApexConfigKey {
  pub within_apex: bool,
  pub apex_sdk_version: String,
}

impl ApexConfigKey {
  pub fn new(within_apex: bool, apex_sdk_version: impl Into<String>) -> Self {
    Self {
      within_apex,
      apex_sdk_version: apex_sdk_version.into(),
    }
  }

  /// Marker written in the key fields; empty outside an APEX.
  pub fn marker(&self) -> &'static str {
    if self.within_apex { WITHIN_APEX_MARKER } else { "" }
  }
}

/// Identifies one build variant.
///
/// Equality and hashing are structural, so separately constructed keys with
/// the same fields address the same cached results. A key with an
/// [`ApexConfigKey`] never equals one without, whatever the apex fields hold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
  pub arch: String,
  pub os: OsType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub apex: Option<ApexConfigKey>,
}

impl ConfigKey {
  pub fn new(arch: impl Into<String>, os: OsType) -> Self {
    Self {
      arch: arch.into(),
      os,
      apex: None,
    }
  }

  pub fn with_apex(mut self, apex: ApexConfigKey) -> Self {
    self.apex = Some(apex);
    self
  }

  /// Decode a key from its already split fields: `arch`, `os`, and
  /// optionally the apex marker and sdk version.
  pub fn from_fields(fields: &[&str]) -> Result<Self, ConfigKeyError> {
    match fields {
      [arch, os] => Ok(Self::new(*arch, os.parse()?)),
      [arch, os, marker, sdk] => {
        let within_apex = match *marker {
          WITHIN_APEX_MARKER => true,
          "" => false,
          other => return Err(ConfigKeyError::ApexMarker(other.to_string())),
        };
        Ok(Self::new(*arch, os.parse()?).with_apex(ApexConfigKey::new(within_apex, *sdk)))
      }
      _ => Err(ConfigKeyError::FieldCount(fields.len())),
    }
  }
}

impl fmt::Display for ConfigKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}{}", self.arch, KEY_FIELD_SEPARATOR, self.os)?;
    if let Some(apex) = &self.apex {
      write!(
        f,
        "{sep}{}{sep}{}",
        apex.marker(),
        apex.apex_sdk_version,
        sep = KEY_FIELD_SEPARATOR
      )?;
    }
    Ok(())
  }
}

impl FromStr for ConfigKey {
  type Err = ConfigKeyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let fields: Vec<&str> = s.split(KEY_FIELD_SEPARATOR).collect();
    Self::from_fields(&fields)
  }
}

/// One question for the evaluator: what is `kind` of `label` under `config`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqueryRequest {
  pub label: String,
  pub kind: QueryKind,
  pub config: ConfigKey,
}

impl CqueryRequest {
  pub fn new(label: impl Into<String>, kind: QueryKind, config: ConfigKey) -> Self {
    Self {
      label: label.into(),
      kind,
      config,
    }
  }

  /// The canonical string form: `label|arch|os[|marker|sdk]#kind`.
  ///
  /// Requests are ordered by this string wherever order matters.
  pub fn canonical(&self) -> String {
    format!("{}{}{}#{}", self.label, KEY_FIELD_SEPARATOR, self.config, self.kind)
  }

  /// The record key the evaluator prints for this request's answers.
  pub fn result_key(&self) -> String {
    format!("{}{}{}", self.label, KEY_FIELD_SEPARATOR, self.config)
  }
}

impl fmt::Display for CqueryRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.canonical())
  }
}
