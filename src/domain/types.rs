use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperature unit a session prefers for rendered reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Celsius => "Celsius",
            Unit::Fahrenheit => "Fahrenheit",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "Celsius" => Some(Unit::Celsius),
            "Fahrenheit" => Some(Unit::Fahrenheit),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
        }
    }
}

/// Normalized form of a user-supplied place name used for table lookup.
/// Lowercased with all whitespace removed; never persisted independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn normalize(location: &str) -> Self {
        let compact: String = location.chars().filter(|c| !c.is_whitespace()).collect();
        Self(compact.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One weather fact, always stored in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub temperature_celsius: f64,
    pub condition: String,
}

impl WeatherRecord {
    pub fn new(temperature_celsius: f64, condition: impl Into<String>) -> Self {
        Self {
            temperature_celsius,
            condition: condition.into(),
        }
    }
}

/// Tagged outcome of a lookup. Failures are values, never panics; the caller
/// always gets something it can relay to the end user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LookupResult {
    Success { report: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_key_strips_whitespace_and_case() {
        assert_eq!(LocationKey::normalize("New York").as_str(), "newyork");
        assert_eq!(LocationKey::normalize("  ToKyO  ").as_str(), "tokyo");
        assert_eq!(
            LocationKey::normalize("new\tyork"),
            LocationKey::normalize("NEW YORK")
        );
    }

    #[test]
    fn unit_round_trips_through_str() {
        assert_eq!(Unit::from_str(Unit::Celsius.as_str()), Some(Unit::Celsius));
        assert_eq!(
            Unit::from_str(Unit::Fahrenheit.as_str()),
            Some(Unit::Fahrenheit)
        );
        assert_eq!(Unit::from_str("Kelvin"), None);
    }

    #[test]
    fn unit_defaults_to_celsius() {
        assert_eq!(Unit::default(), Unit::Celsius);
    }

    #[test]
    fn lookup_result_serializes_with_status_tag() {
        let success = LookupResult::Success {
            report: "ok".into(),
        };
        let value = serde_json::to_value(&success).expect("serialize");
        assert_eq!(value["status"], "success");
        assert_eq!(value["report"], "ok");

        let error = LookupResult::Error {
            message: "missing".into(),
        };
        let value = serde_json::to_value(&error).expect("serialize");
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "missing");
    }
}
