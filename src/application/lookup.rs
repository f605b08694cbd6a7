use crate::domain::types::{LocationKey, LookupResult, Unit, WeatherRecord};
use crate::session::SessionState;
use std::collections::HashMap;
use tracing::{debug, info};

/// Source of weather facts keyed by normalized location. The static table
/// stands in for what a production deployment would back with a live feed.
pub trait WeatherProvider: Send + Sync {
    fn resolve(&self, key: &LocationKey) -> Option<WeatherRecord>;
}

/// Fixed in-memory table, seeded with the default entries and extensible
/// from configuration.
pub struct StaticWeatherTable {
    records: HashMap<LocationKey, WeatherRecord>,
}

impl StaticWeatherTable {
    pub fn new() -> Self {
        let mut table = Self {
            records: HashMap::new(),
        };
        table.insert("New York", WeatherRecord::new(25.0, "sunny"));
        table.insert("London", WeatherRecord::new(15.0, "cloudy"));
        table.insert("Tokyo", WeatherRecord::new(18.0, "light rain"));
        table
    }

    pub fn empty() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn insert(&mut self, location: &str, record: WeatherRecord) {
        self.records.insert(LocationKey::normalize(location), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for StaticWeatherTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherProvider for StaticWeatherTable {
    fn resolve(&self, key: &LocationKey) -> Option<WeatherRecord> {
        self.records.get(key).cloned()
    }
}

/// Resolves a location name to a formatted report using the caller's session
/// state for the display unit. The only mutation on the success path is
/// `last_location_checked`; misses leave the state untouched.
pub struct LookupService<P> {
    provider: P,
}

impl<P: WeatherProvider> LookupService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn lookup(&self, location: &str, state: &mut SessionState) -> LookupResult {
        let key = LocationKey::normalize(location);
        let unit = state.unit_preference.unwrap_or_default();
        debug!(location, key = %key, unit = unit.as_str(), "Resolving weather lookup");

        let Some(record) = self.provider.resolve(&key) else {
            info!(location, "No weather record for requested location");
            return LookupResult::Error {
                message: format!("Sorry, I don't have weather information for '{location}'."),
            };
        };

        let value = match unit {
            Unit::Celsius => record.temperature_celsius,
            Unit::Fahrenheit => record.temperature_celsius * 9.0 / 5.0 + 32.0,
        };
        // Ties round to even, the same behaviour as `{:.0}` float formatting.
        let display = value.round_ties_even();

        let report = format!(
            "The weather in {} is {} with a temperature of {:.0}{}.",
            capitalize_first(location),
            record.condition,
            display,
            unit.suffix()
        );

        state.last_location_checked = Some(location.to_string());
        info!(location, unit = unit.as_str(), "Weather report composed");
        LookupResult::Success { report }
    }
}

/// Uppercases the first character; the rest of the text is preserved as
/// supplied, so "new york" renders as "New york" and "New York" stays intact.
fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
