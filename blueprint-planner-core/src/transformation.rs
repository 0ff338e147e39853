//! Decoding of a scope's raw transformation object.
//!
//! The transformation object mixes two kinds of keys:
//! - free-form rules for the primary plugin, passed through verbatim, and
//! - one nested section per auxiliary plugin (diff tooling, delivery metrics), keyed by
//!   that plugin's name.
//!
//! Sections are decoded independently of each other and all failures are collected, so a
//! typo in one section is reported together with problems in the others. A section key
//! that is missing or `null` means "do not run that plugin"; an empty object means "run it
//! with its own defaults".
//!
//! A decoded section keeps its raw object next to the typed view. The typed view is only
//! used for validation and inspection; the raw object is what reaches the plugin, so
//! explicit `null` fields survive.

use regex::Regex;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::PlannerSettings;
use crate::error::{json_kind, DecodeError, SectionError};

/// Tag-diff settings for the diff-tool plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefdiffRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_pattern: Option<String>,
    /// Whole numbers only; `10.0` is accepted, `"10"` is not.
    #[serde(
        default,
        deserialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_order: Option<String>,
    /// Fields this version does not know about, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployment-environment settings for the delivery-metrics plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoraRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_regex: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One auxiliary section: its validated view and the object as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section<T> {
    pub rules: T,
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationConfig {
    /// Everything except the auxiliary sections; becomes `transformationRules`.
    pub rules: Map<String, Value>,
    pub refdiff: Option<Section<RefdiffRules>>,
    pub dora: Option<Section<DoraRules>>,
}

impl TransformationConfig {
    pub fn decode(raw: &Value, settings: &PlannerSettings) -> Result<Self, DecodeError> {
        let object = match raw {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(DecodeError::NotAnObject {
                    field: "transformation",
                    found: json_kind(other),
                })
            }
        };

        let mut config = Self::default();
        let mut failures = Vec::new();

        for (key, value) in object {
            if *key == settings.diff_plugin {
                match decode_section::<RefdiffRules>(key, value) {
                    Ok(section) => config.refdiff = section,
                    Err(e) => failures.push(e),
                }
            } else if *key == settings.metrics_plugin {
                match decode_section::<DoraRules>(key, value).and_then(|s| validate_dora(key, s)) {
                    Ok(section) => config.dora = section,
                    Err(e) => failures.push(e),
                }
            } else {
                config.rules.insert(key.clone(), value.clone());
            }
        }

        if !failures.is_empty() {
            return Err(DecodeError::Sections(failures));
        }

        debug!(
            rules = config.rules.len(),
            refdiff = config.refdiff.is_some(),
            dora = config.dora.is_some(),
            "Decoded transformation"
        );
        Ok(config)
    }
}

/// `Ok(None)` for an explicit `null`, so it behaves like an absent key.
fn decode_section<T: DeserializeOwned>(
    section: &str,
    value: &Value,
) -> Result<Option<Section<T>>, SectionError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(raw) => serde_json::from_value(value.clone())
            .map(|rules| {
                Some(Section {
                    rules,
                    raw: raw.clone(),
                })
            })
            .map_err(|e| SectionError {
                section: section.to_string(),
                reason: e.to_string(),
            }),
        other => Err(SectionError {
            section: section.to_string(),
            reason: format!("expected an object, got {}", json_kind(other)),
        }),
    }
}

fn validate_dora(
    section: &str,
    decoded: Option<Section<DoraRules>>,
) -> Result<Option<Section<DoraRules>>, SectionError> {
    if let Some(pattern) = decoded.as_ref().and_then(|s| s.rules.environment_regex.as_deref()) {
        Regex::new(pattern).map_err(|e| SectionError {
            section: section.to_string(),
            reason: format!("environmentRegex {pattern:?} does not compile: {e}"),
        })?;
    }
    Ok(decoded)
}

fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 => {
            Ok(Some(n as i64))
        }
        Some(n) => Err(D::Error::custom(format!("expected a whole number, got {n}"))),
    }
}
