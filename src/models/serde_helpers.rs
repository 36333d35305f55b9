//! Serde helpers for reading documents written by older editor versions
//!
//! Stored documents may be missing fields, carry `null` where an array is
//! expected, or hold values outside the enumerations this build knows. Each
//! helper substitutes the field default instead of failing the whole load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::elements::{Duration, Element, Modifier, Octave, RestGroup};
use super::settings::{clamp_tempo, DEFAULT_TEMPO};

/// Treat `null` and unrecognised values as `T::default()`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// Accept any JSON number for tempo and clamp it; anything else is the default
pub fn tempo<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_f64)
        .map(|t| clamp_tempo(t.round() as i64))
        .unwrap_or(DEFAULT_TEMPO))
}

/// Measures as written by the editor; `null` measures load as empty ones
/// and each element is read on its own (see [`element`])
pub fn measures<'de, D>(deserializer: D) -> Result<Vec<Vec<Element>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    let measures: Vec<Vec<Element>> = raw
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(measure_index, measure)| match measure {
            Value::Array(elements) => elements.into_iter().filter_map(element).collect(),
            Value::Null => Vec::new(),
            other => {
                log::warn!("measure {} is not an array, loading it empty: {}", measure_index, other);
                Vec::new()
            }
        })
        .collect();
    if measures.is_empty() {
        return Ok(vec![Vec::new()]);
    }
    Ok(measures)
}

/// Read one element. Optional attributes this build does not recognise
/// are stripped; an element whose type or value is unknown is dropped.
pub fn element(value: Value) -> Option<Element> {
    if let Ok(element) = serde_json::from_value::<Element>(value.clone()) {
        return Some(element);
    }

    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            log::warn!("dropping element that is not an object: {}", other);
            return None;
        }
    };

    if let Some(modifiers) = fields.remove("modifiers") {
        let known: Vec<Value> = match modifiers {
            Value::Array(items) => items
                .into_iter()
                .filter(|m| {
                    let ok = serde_json::from_value::<Modifier>(m.clone()).is_ok();
                    if !ok {
                        log::warn!("dropping unknown modifier {}", m);
                    }
                    ok
                })
                .collect(),
            _ => Vec::new(),
        };
        fields.insert("modifiers".to_string(), Value::Array(known));
    }
    strip_unknown::<Octave>(&mut fields, "octave");
    strip_unknown::<Duration>(&mut fields, "duration");
    strip_unknown::<RestGroup>(&mut fields, "restGroup");

    let repaired = Value::Object(fields);
    match serde_json::from_value::<Element>(repaired.clone()) {
        Ok(element) => Some(element),
        Err(err) => {
            log::warn!("dropping unreadable element {}: {}", repaired, err);
            None
        }
    }
}

fn strip_unknown<T: DeserializeOwned>(fields: &mut serde_json::Map<String, Value>, key: &str) {
    let unknown = fields
        .get(key)
        .map(|v| serde_json::from_value::<T>(v.clone()).is_err())
        .unwrap_or(false);
    if unknown {
        if let Some(value) = fields.remove(key) {
            log::warn!("ignoring unknown {} {}", key, value);
        }
    }
}

/// `null` arrays load as empty ones
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty strings load as `None`
pub fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
