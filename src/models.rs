use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Pollen concentrations in grains/m³
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PollenReading {
    pub alder: f64,
    pub birch: f64,
    pub grass: f64,
    pub mugwort: f64,
    pub olive: f64,
    pub ragweed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindUv {
    pub wind_speed: f64,
    pub uv_index: f64,
}

/// Everything collected during one minute; `None` marks a failed source
#[derive(Debug, Clone, Default)]
pub struct MinuteSample {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_uv: Option<WindUv>,
    pub pollen: Option<PollenReading>,
    pub pressure: Option<f64>,
    pub air_quality: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct WindowAverages {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub uv_index: Option<f64>,
    pub pollen: Option<PollenReading>,
    pub pressure: Option<f64>,
    pub air_quality: Option<f64>,
    pub samples: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortFeatures {
    pub temperature: f64,
    pub humidity: f64,
    pub windspeed: f64,
    pub month: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtmosphereFeatures {
    pub pressure: f64,
    pub uv_index: f64,
    pub air_quality: f64,
    pub month: u8,
}

/// Feature vectors for the two day profile classifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationInput {
    pub profile_1: ComfortFeatures,
    pub profile_2: AtmosphereFeatures,
}

impl ClassificationInput {
    /// `None` if any feature channel had no samples in the window
    pub fn from_averages(averages: &WindowAverages, month: u8) -> Option<Self> {
        Some(ClassificationInput {
            profile_1: ComfortFeatures {
                temperature: averages.temperature?,
                humidity: averages.humidity?,
                windspeed: averages.wind_speed?,
                month,
            },
            profile_2: AtmosphereFeatures {
                pressure: averages.pressure?,
                uv_index: averages.uv_index?,
                air_quality: averages.air_quality?,
                month,
            },
        })
    }
}

/// Labels returned by the classifier, e.g. "Cold - High Humidity - Windy"
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayProfiles {
    pub profile_1: String,
    pub profile_2: String,
}

/// Aggregate pollen alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollenLevel {
    Low,
    Medium,
    High,
}

impl PollenLevel {
    pub fn from_reading(p: &PollenReading) -> Self {
        let high = p.alder > 80.0
            || p.birch > 80.0
            || p.grass > 50.0
            || p.mugwort > 30.0
            || p.olive > 200.0
            || p.ragweed > 50.0;
        if high {
            return PollenLevel::High;
        }

        let between = |v: f64, low: f64, high: f64| low < v && v < high;
        let medium = between(p.alder, 40.0, 80.0)
            || between(p.birch, 40.0, 80.0)
            || between(p.grass, 10.0, 50.0)
            || between(p.mugwort, 20.0, 30.0)
            || between(p.olive, 50.0, 200.0)
            || between(p.ragweed, 10.0, 50.0);
        if medium {
            PollenLevel::Medium
        } else {
            PollenLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PollenLevel::Low => "low",
            PollenLevel::Medium => "medium",
            PollenLevel::High => "high",
        }
    }
}

/// One processed window, ready for storage
#[derive(Debug, Clone)]
pub struct WindowSummary {
    pub time: OffsetDateTime,
    pub location: String,
    pub averages: WindowAverages,
    pub air_quality_category: Option<String>,
    pub pollen: Option<PollenLevel>,
    pub profiles: Option<DayProfiles>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_averages() -> WindowAverages {
        WindowAverages {
            temperature: Some(12.5),
            humidity: Some(81.0),
            wind_speed: Some(14.0),
            uv_index: Some(2.0),
            pollen: Some(PollenReading::default()),
            pressure: Some(1012.0),
            air_quality: Some(38.0),
            samples: 30,
        }
    }

    #[test]
    fn test_classification_input() {
        let input = ClassificationInput::from_averages(&full_averages(), 11).unwrap();
        assert_eq!(input.profile_1.temperature, 12.5);
        assert_eq!(input.profile_1.month, 11);
        assert_eq!(input.profile_2.air_quality, 38.0);

        let mut partial = full_averages();
        partial.pressure = None;
        assert!(ClassificationInput::from_averages(&partial, 11).is_none());
    }

    #[test]
    fn test_pollen_level() {
        let none = PollenReading::default();
        assert_eq!(PollenLevel::from_reading(&none), PollenLevel::Low);

        let grass = PollenReading {
            grass: 20.0,
            ..Default::default()
        };
        assert_eq!(PollenLevel::from_reading(&grass), PollenLevel::Medium);

        let olive = PollenReading {
            olive: 250.0,
            grass: 20.0,
            ..Default::default()
        };
        assert_eq!(PollenLevel::from_reading(&olive), PollenLevel::High);

        // boundaries are exclusive on both tiers
        let edge = PollenReading {
            alder: 80.0,
            mugwort: 20.0,
            ..Default::default()
        };
        assert_eq!(PollenLevel::from_reading(&edge), PollenLevel::Low);
    }
}
