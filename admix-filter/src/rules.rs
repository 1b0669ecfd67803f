use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::FilterError;

/// A pre-filter rule, applied at ingestion time in declaration order.
///
/// The tag set is closed: a rule document naming any other `type` fails to
/// parse instead of being silently skipped. Argument maps are ordered so
/// group iteration is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "args")]
pub enum PrefilterRule {
    /// country code -> providers barred from that country's slots.
    #[serde(rename = "excCtr")]
    ExcludeCountry(BTreeMap<String, Vec<String>>),
    /// group name -> providers ordered by priority; at most one of each
    /// group survives per slot.
    #[serde(rename = "mutPri")]
    MutualPriority(BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefilterDoc {
    #[serde(rename = "prefilterMappings")]
    pub prefilter_mappings: Vec<PrefilterRule>,
}

/// Post-filter rules, applied per request: OS/version first, then device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostfilterRules {
    #[serde(rename = "osVersion", default)]
    pub os_version: OsVersionRule,
    #[serde(default)]
    pub device: DeviceRule,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsVersionRule {
    pub args: Vec<OsVersionArgs>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsVersionArgs {
    pub os: String,
    pub versions: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRule {
    pub args: Vec<DeviceArgs>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceArgs {
    #[serde(rename = "type")]
    pub kind: String,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostfilterDoc {
    #[serde(rename = "postfilterMappings")]
    pub postfilter_mappings: PostfilterRules,
}

/// Loads the pre-filter rule document. Malformed documents are fatal at
/// startup, not skipped.
pub fn load_prefilter(path: impl AsRef<Path>) -> Result<Vec<PrefilterRule>, FilterError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| FilterError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let doc: PrefilterDoc = serde_json::from_str(&raw).map_err(|source| FilterError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(doc.prefilter_mappings)
}

/// Loads the post-filter rule document.
pub fn load_postfilter(path: impl AsRef<Path>) -> Result<PostfilterRules, FilterError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| FilterError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let doc: PostfilterDoc = serde_json::from_str(&raw).map_err(|source| FilterError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(doc.postfilter_mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PREFILTER: &str = r#"{
        "prefilterMappings": [
            { "type": "excCtr", "args": { "CN": ["HuaweiAds"] } },
            { "type": "mutPri", "args": { "social": ["Facebook", "Twitter", "Instagram"] } }
        ]
    }"#;

    const POSTFILTER: &str = r#"{
        "postfilterMappings": {
            "osVersion": {
                "args": [
                    { "os": "ios", "versions": ["9.0", "9.1"], "exclude": ["Facebook"] }
                ]
            },
            "device": {
                "args": [ { "type": "tablet", "exclude": ["Vungle"] } ]
            }
        }
    }"#;

    #[test]
    fn loads_prefilter_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PREFILTER.as_bytes()).unwrap();

        let rules = load_prefilter(file.path()).unwrap();
        assert_eq!(rules.len(), 2);
        match &rules[0] {
            PrefilterRule::ExcludeCountry(map) => {
                assert_eq!(map["CN"], vec!["HuaweiAds".to_string()]);
            }
            other => panic!("expected ExcludeCountry, got {other:?}"),
        }
        match &rules[1] {
            PrefilterRule::MutualPriority(groups) => {
                assert_eq!(groups["social"].len(), 3);
            }
            other => panic!("expected MutualPriority, got {other:?}"),
        }
    }

    #[test]
    fn loads_postfilter_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(POSTFILTER.as_bytes()).unwrap();

        let rules = load_postfilter(file.path()).unwrap();
        assert_eq!(rules.os_version.args[0].os, "ios");
        assert_eq!(rules.device.args[0].kind, "tablet");
    }

    #[test]
    fn unknown_rule_kind_is_rejected() {
        let doc = r#"{
            "prefilterMappings": [ { "type": "blocklist", "args": {} } ]
        }"#;
        let err = serde_json::from_str::<PrefilterDoc>(doc).unwrap_err();
        assert!(err.to_string().contains("blocklist") || err.is_data());
    }

    #[test]
    fn missing_rule_file_is_an_error() {
        let err = load_prefilter("/nonexistent/prefilter.json").unwrap_err();
        assert!(matches!(err, FilterError::Read { .. }));
    }

    #[test]
    fn postfilter_sections_default_when_absent() {
        let rules: PostfilterRules =
            serde_json::from_str::<PostfilterDoc>(r#"{ "postfilterMappings": {} }"#)
                .unwrap()
                .postfilter_mappings;
        assert!(rules.os_version.args.is_empty());
        assert!(rules.device.args.is_empty());
    }
}
