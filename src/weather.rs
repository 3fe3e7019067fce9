// Copyright 2025 Cowboy AI, LLC.

//! Weather provider seam
//!
//! The engine only needs two things from a weather service: a 3-hour
//! bucketed forecast to derive a rain signal, and a current-conditions
//! snapshot stored on new irrigation schedules. Neither is required for a
//! valid deployment; [`NoWeatherProvider`] reports the service as
//! unavailable and every caller degrades to "no rain signal".

use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Rain in a single 3-hour bucket above which rain counts as expected
pub const RAIN_THRESHOLD_MM: f64 = 5.0;

/// How far ahead the rain signal looks
pub const RAIN_LOOKAHEAD_HOURS: i64 = 24;

/// One 3-hour forecast bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    /// Bucket start
    pub timestamp: DateTime<Utc>,
    /// Rain in the bucket, mm
    pub rain_mm_3h: Option<f64>,
}

/// A forecast for a location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    /// Buckets in provider order
    pub entries: Vec<ForecastEntry>,
}

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Air temperature, °C
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Short description, e.g. "light rain"
    pub description: String,
    /// Wind speed, m/s
    pub wind_speed: Option<f64>,
    /// Observation time
    pub observed_at: DateTime<Utc>,
}

/// A weather data source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Forecast for a coordinate
    async fn forecast(&self, latitude: f64, longitude: f64) -> DomainResult<Forecast>;

    /// Current conditions for a coordinate, if the provider has any
    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> DomainResult<Option<CurrentConditions>>;
}

/// Provider used when no weather service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeatherProvider;

#[async_trait]
impl WeatherProvider for NoWeatherProvider {
    async fn forecast(&self, _latitude: f64, _longitude: f64) -> DomainResult<Forecast> {
        Err(DomainError::external("weather", "no weather provider configured"))
    }

    async fn current_conditions(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> DomainResult<Option<CurrentConditions>> {
        Ok(None)
    }
}

/// Whether any bucket up to `now + 24h` carries more than 5 mm of rain
///
/// Buckets already in the past are still counted; providers usually start
/// the forecast at the current bucket.
pub fn rain_expected(forecast: &Forecast, now: DateTime<Utc>) -> bool {
    let horizon = now + Duration::hours(RAIN_LOOKAHEAD_HOURS);
    forecast
        .entries
        .iter()
        .filter(|entry| entry.timestamp <= horizon)
        .any(|entry| entry.rain_mm_3h.is_some_and(|mm| mm > RAIN_THRESHOLD_MM))
}

/// Rain signal outcome as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainOutlook {
    /// Forecast shows rain within the lookahead
    Expected,
    /// Forecast shows no significant rain
    Dry,
    /// Forecast could not be fetched
    Unknown,
}

impl RainOutlook {
    /// Derive the outlook from a forecast fetch
    pub fn from_forecast(forecast: Option<&Forecast>, now: DateTime<Utc>) -> Self {
        match forecast {
            Some(forecast) if rain_expected(forecast, now) => RainOutlook::Expected,
            Some(_) => RainOutlook::Dry,
            None => RainOutlook::Unknown,
        }
    }

    /// Whether rain suppresses irrigation
    pub fn is_rain_expected(&self) -> bool {
        matches!(self, RainOutlook::Expected)
    }

    /// Short human-readable summary
    pub fn summary(&self) -> &'static str {
        match self {
            RainOutlook::Expected => "Rain expected in next 24 hours",
            RainOutlook::Dry => "No significant rain expected",
            RainOutlook::Unknown => "Weather forecast unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(now: DateTime<Utc>, hours: i64, rain: Option<f64>) -> ForecastEntry {
        ForecastEntry {
            timestamp: now + Duration::hours(hours),
            rain_mm_3h: rain,
        }
    }

    #[test]
    fn rain_within_lookahead_counts() {
        let now = Utc::now();
        let forecast = Forecast {
            entries: vec![entry(now, 3, Some(1.0)), entry(now, 21, Some(7.5))],
        };
        assert!(rain_expected(&forecast, now));
    }

    #[test]
    fn rain_after_lookahead_is_ignored() {
        let now = Utc::now();
        let forecast = Forecast {
            entries: vec![entry(now, 27, Some(20.0)), entry(now, 6, None)],
        };
        assert!(!rain_expected(&forecast, now));
    }

    #[test]
    fn threshold_is_exclusive() {
        let now = Utc::now();
        let forecast = Forecast {
            entries: vec![entry(now, 3, Some(5.0))],
        };
        assert!(!rain_expected(&forecast, now));
    }

    #[test]
    fn outlook_summaries() {
        let now = Utc::now();
        let wet = Forecast {
            entries: vec![entry(now, 0, Some(9.0))],
        };
        assert_eq!(RainOutlook::from_forecast(Some(&wet), now), RainOutlook::Expected);
        assert_eq!(
            RainOutlook::from_forecast(Some(&Forecast::default()), now).summary(),
            "No significant rain expected"
        );
        assert!(!RainOutlook::from_forecast(None, now).is_rain_expected());
    }

    #[tokio::test]
    async fn no_provider_is_unavailable() {
        let provider = NoWeatherProvider;
        let err = provider.forecast(12.9, 77.6).await.unwrap_err();
        assert!(err.is_external());
        assert_eq!(provider.current_conditions(12.9, 77.6).await.unwrap(), None);
    }
}
