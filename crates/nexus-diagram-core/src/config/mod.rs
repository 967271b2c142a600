//! Configuration handed to the rendering engine on every render call.
//!
//! [`EngineConfig`] serializes to the engine's JSON option object (camelCase keys). Anything the
//! typed fields do not cover can be supplied through [`EngineConfig::overrides`], which is
//! deep-merged on top of the typed values.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Neutral,
    Dark,
    Forest,
    Base,
}

impl std::str::FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "neutral" => Ok(Self::Neutral),
            "dark" => Ok(Self::Dark),
            "forest" => Ok(Self::Forest),
            "base" => Ok(Self::Base),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Strict,
    #[default]
    Loose,
    Antiscript,
    Sandbox,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramWidth {
    pub use_max_width: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_labels: Option<bool>,
    pub use_max_width: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub start_on_load: bool,
    pub theme: Theme,
    pub security_level: SecurityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// The caller owns error presentation; the engine must not inject its own error markup.
    pub suppress_error_rendering: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flowchart: Option<FlowchartConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub er: Option<DiagramWidth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<DiagramWidth>,
    #[serde(skip, default)]
    pub overrides: Option<Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl EngineConfig {
    /// Settings used by the interactive diagram viewer (retry button, responsive width).
    pub fn interactive() -> Self {
        Self {
            start_on_load: false,
            theme: Theme::Default,
            security_level: SecurityLevel::Loose,
            log_level: Some(1),
            font_family: Some("sans-serif".to_string()),
            suppress_error_rendering: true,
            flowchart: Some(FlowchartConfig {
                html_labels: Some(true),
                use_max_width: true,
            }),
            er: Some(DiagramWidth {
                use_max_width: true,
            }),
            sequence: Some(DiagramWidth {
                use_max_width: true,
            }),
            overrides: None,
        }
    }

    /// Settings used when a diagram is embedded inline in a document page.
    pub fn embedded() -> Self {
        Self {
            start_on_load: true,
            theme: Theme::Neutral,
            security_level: SecurityLevel::Loose,
            log_level: None,
            font_family: None,
            suppress_error_rendering: true,
            flowchart: Some(FlowchartConfig {
                html_labels: None,
                use_max_width: false,
            }),
            er: Some(DiagramWidth {
                use_max_width: false,
            }),
            sequence: None,
            overrides: None,
        }
    }

    /// Minimal settings for the simplified retry attempt.
    pub fn retry() -> Self {
        Self {
            start_on_load: false,
            theme: Theme::Default,
            security_level: SecurityLevel::Loose,
            log_level: Some(1),
            font_family: None,
            suppress_error_rendering: true,
            flowchart: None,
            er: None,
            sequence: None,
            overrides: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Layers free-form engine options on top of the typed fields.
    ///
    /// Repeated calls merge into the previously supplied overrides.
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        match self.overrides.as_mut() {
            Some(existing) => deep_merge_value(existing, &overrides),
            None => self.overrides = Some(overrides),
        }
        self
    }

    /// Parses an override document (e.g. a `--config` file) and merges it.
    pub fn with_overrides_json(self, json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| Error::InvalidConfigJson {
            message: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(Error::InvalidConfigJson {
                message: "expected a JSON object".to_string(),
            });
        }
        Ok(self.with_overrides(value))
    }

    /// Returns the full option object passed to the engine.
    pub fn to_value(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()));
        if let Some(overrides) = &self.overrides {
            deep_merge_value(&mut value, overrides);
        }
        // Overrides may not switch the engine's error markup back on.
        if let Value::Object(obj) = &mut value {
            obj.insert("suppressErrorRendering".to_string(), Value::Bool(true));
        }
        value
    }

    pub fn get_str<'a>(value: &'a Value, dotted_path: &str) -> Option<&'a str> {
        lookup(value, dotted_path)?.as_str()
    }

    pub fn get_bool(value: &Value, dotted_path: &str) -> Option<bool> {
        lookup(value, dotted_path)?.as_bool()
    }
}

fn lookup<'a>(value: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    let mut cur = value;
    for segment in dotted_path.split('.') {
        cur = cur.as_object()?.get(segment)?;
    }
    Some(cur)
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
