//! Track which config pointers a run actually consumed, so stray keys in a
//! layered config (typos, leftover experiments) can be flagged instead of
//! silently ignored.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Which surface of the engine is consuming the config, determining which
/// pointer set is expected to be fully read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Classify,
    Pricing,
}

pub fn consumed_pointers(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Classify => CLASSIFY,
        ConfigMode::Pricing => PRICING,
    }
}

static CLASSIFY: &[&str] = &["/tables/dir", "/classify/sector", "/classify/cluster_mode"];

static PRICING: &[&str] = &["/pricing/file", "/classify/sector"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedKeysReport {
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeysReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

impl fmt::Display for UnusedKeysReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CONFIG_UNUSED_KEYS: {}", self.unused_leaf_pointers.join(", "))
    }
}

impl std::error::Error for UnusedKeysReport {}

fn leaf_pointers(v: &Value, prefix: String, out: &mut BTreeSet<String>) {
    match v {
        Value::Object(map) => {
            for (k, val) in map {
                leaf_pointers(val, format!("{prefix}/{k}"), out);
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                leaf_pointers(val, format!("{prefix}/{i}"), out);
            }
        }
        _ => {
            out.insert(prefix);
        }
    }
}

/// Compare every leaf pointer present in `config` against the pointers
/// `mode` declares it reads, treating anything not an exact match against a
/// declared pointer (or a leaf underneath one) as unused. Returns
/// `Ok(report)` under [`UnusedKeyPolicy::Warn`] (caller decides whether to
/// log it) and `Err(report)` under [`UnusedKeyPolicy::Fail`] when the
/// report is non-empty.
pub fn report_unused_keys(
    mode: ConfigMode,
    config: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeysReport, UnusedKeysReport> {
    let mut leaves = BTreeSet::new();
    leaf_pointers(config, String::new(), &mut leaves);

    let expected = consumed_pointers(mode);
    let unused_leaf_pointers: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !expected.iter().any(|e| leaf == e || leaf.starts_with(&format!("{e}/"))))
        .collect();

    let report = UnusedKeysReport { unused_leaf_pointers };
    if !report.is_clean() && policy == UnusedKeyPolicy::Fail {
        return Err(report);
    }
    Ok(report)
}
