mod coastlines;

pub use self::coastlines::{generate_simple_world, load_all_geojson};

use crate::error::{Error, Result};
use crate::format::DEFAULT_ACCENT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Embedded default dataset (cities + continent styles)
const EMBEDDED_CITIES: &str = include_str!("cities.json");

/// One city, as loaded from the dataset. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    pub country: String,
    pub continent: String,
    pub flag: String,
    pub lat: f64,
    pub lon: f64,
    pub population: u64,
    pub language: String,
    pub currency: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded: Option<String>,
    pub description: String,
    /// Comma-separated tag list
    pub best_known_for: String,
    pub top_attractions: Vec<String>,
    #[serde(default)]
    pub fun_facts: Vec<String>,
}

/// Display color and emoji for a continent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinentStyle {
    pub name: String,
    pub color: String,
    pub emoji: String,
}

/// Stable index of a city in the dataset. This is the per-point payload
/// attached to every marker; it serializes as a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub usize);

impl CityId {
    /// Decode an opaque click payload into a city of `dataset`.
    ///
    /// Accepts a bare index (`3` or `"3"`), or a chart click envelope of the
    /// form `{"points": [{"customdata": 3}]}`. Anything else is `None`.
    pub fn decode(payload: &Value, dataset: &Dataset) -> Option<CityId> {
        let idx = match payload {
            Value::Number(n) => n.as_u64()? as usize,
            Value::String(s) => s.trim().parse::<usize>().ok()?,
            Value::Object(map) => {
                if let Some(custom) = map.get("customdata") {
                    return Self::decode(custom, dataset);
                }
                let first = map.get("points")?.as_array()?.first()?;
                return Self::decode(first, dataset);
            }
            _ => return None,
        };
        dataset.get(CityId(idx)).map(|_| CityId(idx))
    }

    /// Payload value carried by a marker
    pub fn to_payload(self) -> Value {
        Value::from(self.0)
    }
}

#[derive(Deserialize)]
struct DatasetFile {
    continents: Vec<ContinentStyle>,
    cities: Vec<CityRecord>,
}

/// Immutable reference data: every city plus the continent style table
#[derive(Debug, Clone)]
pub struct Dataset {
    cities: Vec<CityRecord>,
    continents: Vec<ContinentStyle>,
}

impl Dataset {
    /// Build a dataset, validating every record
    pub fn new(cities: Vec<CityRecord>, continents: Vec<ContinentStyle>) -> Result<Self> {
        for city in &cities {
            validate(city)?;
            if !continents.iter().any(|c| c.name == city.continent) {
                warn!(
                    "city {} has continent {:?} with no style; using default accent",
                    city.name, city.continent
                );
            }
        }
        debug!("dataset ready: {} cities, {} continents", cities.len(), continents.len());
        Ok(Self { cities, continents })
    }

    /// The dataset compiled into the binary
    pub fn embedded() -> Result<Self> {
        let mut bytes = EMBEDDED_CITIES.as_bytes().to_vec();
        Self::from_json_bytes(&mut bytes)
    }

    /// Load a dataset file with the same layout as the embedded one
    pub fn load(path: &Path) -> Result<Self> {
        let mut bytes = fs::read(path)?;
        Self::from_json_bytes(&mut bytes)
    }

    /// Parse JSON in place (simd-json mutates its input buffer)
    pub fn from_json_bytes(bytes: &mut [u8]) -> Result<Self> {
        let file: DatasetFile = simd_json::serde::from_slice(bytes)?;
        Self::new(file.cities, file.continents)
    }

    pub fn cities(&self) -> &[CityRecord] {
        &self.cities
    }

    pub fn continents(&self) -> &[ContinentStyle] {
        &self.continents
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, id: CityId) -> Option<&CityRecord> {
        self.cities.get(id.0)
    }

    /// Cities paired with their ids, in dataset order
    pub fn iter(&self) -> impl Iterator<Item = (CityId, &CityRecord)> + '_ {
        self.cities.iter().enumerate().map(|(i, c)| (CityId(i), c))
    }

    /// Case-insensitive lookup by city name
    pub fn find_by_name(&self, name: &str) -> Option<CityId> {
        self.iter()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name.trim()))
            .map(|(id, _)| id)
    }

    pub fn style(&self, continent: &str) -> Option<&ContinentStyle> {
        self.continents.iter().find(|s| s.name == continent)
    }

    /// Continent color, falling back to the default accent
    pub fn color_for(&self, continent: &str) -> &str {
        self.style(continent).map(|s| s.color.as_str()).unwrap_or(DEFAULT_ACCENT)
    }

    /// Continent emoji, empty when the continent has no style
    pub fn emoji_for(&self, continent: &str) -> &str {
        self.style(continent).map(|s| s.emoji.as_str()).unwrap_or("")
    }

    /// Continents that actually occur among the cities: style-table order
    /// first, then unstyled continents in order of first appearance.
    pub fn continents_present(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .continents
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| self.cities.iter().any(|c| c.continent == *name))
            .collect();
        for city in &self.cities {
            if !out.contains(&city.continent.as_str()) {
                out.push(&city.continent);
            }
        }
        out
    }

    pub fn has_continent(&self, continent: &str) -> bool {
        self.cities.iter().any(|c| c.continent == continent)
    }
}

fn validate(city: &CityRecord) -> Result<()> {
    let invalid = |reason: String| Error::InvalidCity {
        name: city.name.clone(),
        reason,
    };
    if city.name.trim().is_empty() {
        return Err(invalid("empty name".into()));
    }
    if !(-90.0..=90.0).contains(&city.lat) {
        return Err(invalid(format!("latitude {} out of range", city.lat)));
    }
    if !(-180.0..=180.0).contains(&city.lon) {
        return Err(invalid(format!("longitude {} out of range", city.lon)));
    }
    if city.top_attractions.is_empty() {
        return Err(invalid("no top attractions".into()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Minimal record for tests elsewhere in the crate
    pub(crate) fn city(name: &str, continent: &str, population: u64) -> CityRecord {
        CityRecord {
            name: name.to_string(),
            country: "Testland".to_string(),
            continent: continent.to_string(),
            flag: "🏳".to_string(),
            lat: 10.0,
            lon: 20.0,
            population,
            language: "Testish".to_string(),
            currency: "Test Dollar".to_string(),
            timezone: "UTC+1".to_string(),
            founded: None,
            description: "A city used in tests.".to_string(),
            best_known_for: "Testing, Fixtures, Assertions".to_string(),
            top_attractions: vec!["Old Town".to_string(), "Harbour".to_string()],
            fun_facts: Vec::new(),
        }
    }

    pub(crate) fn styles() -> Vec<ContinentStyle> {
        [("Asia", "#ff6b6b", "🌏"), ("Europe", "#4ecdc4", "🌍"), ("Africa", "#ff9f43", "🌍")]
            .into_iter()
            .map(|(name, color, emoji)| ContinentStyle {
                name: name.into(),
                color: color.into(),
                emoji: emoji.into(),
            })
            .collect()
    }

    #[test]
    fn test_embedded_dataset_loads() {
        let ds = Dataset::embedded().unwrap();
        assert!(ds.len() >= 20);
        for (_, c) in ds.iter() {
            assert!(ds.style(&c.continent).is_some(), "{} unstyled", c.name);
            assert!(!c.top_attractions.is_empty());
        }
        assert_eq!(ds.continents_present().len(), ds.continents().len());
    }

    #[test]
    fn test_validation_rejects_bad_coordinates() {
        let mut bad = city("Nowhere", "Asia", 1);
        bad.lat = 91.0;
        assert!(matches!(
            Dataset::new(vec![bad], styles()),
            Err(Error::InvalidCity { .. })
        ));

        let mut bad = city("Nowhere", "Asia", 1);
        bad.lon = -180.5;
        assert!(Dataset::new(vec![bad], styles()).is_err());
    }

    #[test]
    fn test_validation_rejects_missing_attractions() {
        let mut bad = city("Nowhere", "Asia", 1);
        bad.top_attractions.clear();
        assert!(Dataset::new(vec![bad], styles()).is_err());
    }

    #[test]
    fn test_unknown_continent_falls_back() {
        let ds = Dataset::new(vec![city("Atlantis City", "Atlantis", 5)], styles()).unwrap();
        assert_eq!(ds.color_for("Atlantis"), DEFAULT_ACCENT);
        assert_eq!(ds.emoji_for("Atlantis"), "");
        assert_eq!(ds.continents_present(), vec!["Atlantis"]);
    }

    #[test]
    fn test_continents_present_follows_style_order() {
        let ds = Dataset::new(
            vec![city("A", "Africa", 1), city("B", "Asia", 1), city("C", "Mars", 1)],
            styles(),
        )
        .unwrap();
        assert_eq!(ds.continents_present(), vec!["Asia", "Africa", "Mars"]);
    }

    #[test]
    fn test_decode_payload() {
        let ds = Dataset::new(vec![city("A", "Asia", 1), city("B", "Asia", 2)], styles()).unwrap();
        assert_eq!(CityId::decode(&json!(1), &ds), Some(CityId(1)));
        assert_eq!(CityId::decode(&json!("0"), &ds), Some(CityId(0)));
        assert_eq!(
            CityId::decode(&json!({"points": [{"customdata": 1}]}), &ds),
            Some(CityId(1))
        );
        assert_eq!(CityId::decode(&CityId(1).to_payload(), &ds), Some(CityId(1)));

        assert_eq!(CityId::decode(&json!(2), &ds), None);
        assert_eq!(CityId::decode(&json!(-1), &ds), None);
        assert_eq!(CityId::decode(&json!("Tokyo"), &ds), None);
        assert_eq!(CityId::decode(&json!({"points": []}), &ds), None);
        assert_eq!(CityId::decode(&json!(null), &ds), None);
    }

    #[test]
    fn test_dataset_from_json() {
        let mut raw = br##"{
            "continents": [{"name": "Asia", "color": "#ff6b6b", "emoji": "x"}],
            "cities": [{
                "name": "Testopolis", "country": "T", "continent": "Asia", "flag": "f",
                "lat": 1.5, "lon": 2.5, "population": 3400000,
                "language": "L", "currency": "C", "timezone": "UTC",
                "description": "d", "best_known_for": "a, b",
                "top_attractions": ["Gate"]
            }]
        }"##
        .to_vec();
        let ds = Dataset::from_json_bytes(&mut raw).unwrap();
        let c = ds.get(CityId(0)).unwrap();
        assert_eq!(c.name, "Testopolis");
        assert_eq!(c.founded, None);
        assert!(c.fun_facts.is_empty());
        assert_eq!(ds.find_by_name("testopolis"), Some(CityId(0)));
    }
}
