//! Device descriptor returned by a successful connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable description of a connected device.
///
/// Built only from the descriptor the engine reports plus the address the
/// session dialled; any field the engine omits is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    name: Option<String>,
    model: Option<String>,
    version: Option<String>,
    ip_address: String,
}

const DESCRIPTOR_FIELDS: [&str; 3] = ["name", "model", "version"];

impl Device {
    pub fn new(
        ip_address: impl Into<String>,
        name: Option<String>,
        model: Option<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            name,
            model,
            version,
            ip_address: ip_address.into(),
        }
    }

    /// Build a device from whatever `get_device_info` returned.
    ///
    /// Understands a JSON object, a JSON string holding an object, or loose
    /// `key: value` / `key=value` text such as a stringified dictionary.
    pub fn from_descriptor(descriptor: &Value, ip_address: &str) -> Self {
        let [name, model, version] = match descriptor {
            Value::Object(map) => DESCRIPTOR_FIELDS.map(|field| {
                map.get(field).and_then(Value::as_str).map(str::to_owned)
            }),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(inner @ Value::Object(_)) => return Self::from_descriptor(&inner, ip_address),
                _ => {
                    let pairs = parse_key_values(text);
                    DESCRIPTOR_FIELDS.map(|field| {
                        pairs
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(field))
                            .map(|(_, v)| v.clone())
                    })
                }
            },
            _ => [None, None, None],
        };
        Self::new(ip_address, name, model, version)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, &self.model) {
            (Some(name), Some(model)) => write!(f, "{name} ({model}) @ {}", self.ip_address),
            (Some(name), None) => write!(f, "{name} @ {}", self.ip_address),
            (None, Some(model)) => write!(f, "{model} @ {}", self.ip_address),
            (None, None) => write!(f, "{}", self.ip_address),
        }
    }
}

/// Split `{'name': 'X', model=Y}` style text into trimmed, unquoted pairs.
fn parse_key_values(text: &str) -> Vec<(String, String)> {
    let body = text.trim().trim_start_matches('{').trim_end_matches('}');
    body.split([',', '\n'])
        .filter_map(|entry| {
            let (key, value) = entry.split_once([':', '='])?;
            let key = unquote(key);
            let value = unquote(value);
            if key.is_empty() || value.is_empty() || value == "None" || value == "null" {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
        .trim()
}
