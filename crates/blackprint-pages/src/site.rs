// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;

use blackprint_engine::{Mapping, Value};
use serde::{Deserialize, Serialize};

/// Site-wide settings exposed to every page as `site`.
///
/// Deserializes from camelCase keys; unknown keys are kept in `extra` and
/// exposed alongside the named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub lang: String,
    pub name: String,
    pub description: String,
    pub owner_name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            name: "whitelog".to_string(),
            description: "Nameless blog powered by whitelog".to_string(),
            owner_name: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Parses a site configuration from JSON. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Converts the configuration into the mapping templates see.
    pub fn to_value(&self) -> Value {
        let mut site: Mapping = self
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(value.clone())))
            .collect();
        site.insert("lang".to_string(), Value::from(self.lang.as_str()));
        site.insert("name".to_string(), Value::from(self.name.as_str()));
        site.insert(
            "description".to_string(),
            Value::from(self.description.as_str()),
        );
        site.insert("ownerName".to_string(), Value::from(self.owner_name.as_str()));
        Value::Mapping(site)
    }
}

/// Adds `site` to `data`. Keys already present in `data` win; null data
/// becomes a mapping holding only `site`, other scalars pass through.
pub(crate) fn with_site(data: &Value, site: &SiteConfig) -> Value {
    match data {
        Value::Mapping(mapping) => {
            let mut merged = mapping.clone();
            merged
                .entry("site".to_string())
                .or_insert_with(|| site.to_value());
            Value::Mapping(merged)
        }
        Value::Null => {
            let mut merged = Mapping::new();
            merged.insert("site".to_string(), site.to_value());
            Value::Mapping(merged)
        }
        other => other.clone(),
    }
}
