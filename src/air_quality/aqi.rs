//! US EPA PM2.5 air quality index.
//!
//! Maps a µg/m³ concentration onto the 0-500 index by linear interpolation
//! inside the band that contains it.

use crate::error::{MonitorError, Result};

/// One row of the breakpoint table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AqiBreakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: f64,
    pub i_high: f64,
}

const fn bp(c_low: f64, c_high: f64, i_low: f64, i_high: f64) -> AqiBreakpoint {
    AqiBreakpoint {
        c_low,
        c_high,
        i_low,
        i_high,
    }
}

/// Concentrations above this clamp to the top of the scale
pub const MAX_CONCENTRATION: f64 = 500.4;
pub const MAX_AQI: f64 = 500.0;

// Bands do not tile: 12.0..12.1, 35.4..35.5 etc. match nothing
pub const PM25_BREAKPOINTS: [AqiBreakpoint; 7] = [
    bp(0.0, 12.0, 0.0, 50.0),       // Good
    bp(12.1, 35.4, 51.0, 100.0),    // Moderate
    bp(35.5, 55.4, 101.0, 150.0),   // Unhealthy for sensitive groups
    bp(55.5, 150.4, 151.0, 200.0),  // Unhealthy
    bp(150.5, 250.4, 201.0, 300.0), // Very unhealthy
    bp(250.5, 350.4, 301.0, 400.0), // Hazardous
    bp(350.5, 500.4, 401.0, 500.0), // Hazardous
];

/// Convert a PM2.5 concentration in µg/m³ to the AQI scale
///
/// # Errors
///
/// `NoMatchingBreakpoint` when the value lies in a gap between two bands,
/// is negative, or is NaN.
pub fn ugm3_to_aqi(ugm3: f64) -> Result<f64> {
    if ugm3 > MAX_CONCENTRATION {
        return Ok(MAX_AQI);
    }

    PM25_BREAKPOINTS
        .iter()
        .find(|b| b.c_low <= ugm3 && ugm3 <= b.c_high)
        .map(|b| (b.i_high - b.i_low) / (b.c_high - b.c_low) * (ugm3 - b.c_low) + b.i_low)
        .ok_or(MonitorError::NoMatchingBreakpoint(ugm3))
}

/// Health category of an index value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Categorise by the integer part of the index
    pub fn from_aqi(aqi: f64) -> Self {
        match aqi.trunc() as i64 {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for sensitive groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}
