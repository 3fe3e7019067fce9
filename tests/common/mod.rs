// Copyright 2025 Cowboy AI, LLC.

//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use smart_agri_core::persistence::{
    CropStore, DeviceStore, FarmStore, FarmerStore, SensorStore,
};
use smart_agri_core::weather::{CurrentConditions, Forecast, ForecastEntry};
use smart_agri_core::*;

/// Weather provider returning a fixed forecast
pub struct FixedWeather {
    pub rain_mm: Option<f64>,
}

impl FixedWeather {
    pub fn dry() -> Self {
        Self { rain_mm: None }
    }

    pub fn rainy() -> Self {
        Self {
            rain_mm: Some(12.0),
        }
    }
}

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn forecast(&self, _latitude: f64, _longitude: f64) -> DomainResult<Forecast> {
        Ok(Forecast {
            entries: vec![ForecastEntry {
                timestamp: Utc::now() + Duration::hours(3),
                rain_mm_3h: self.rain_mm,
            }],
        })
    }

    async fn current_conditions(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> DomainResult<Option<CurrentConditions>> {
        Ok(None)
    }
}

/// A farmer with one farm, seeded into an in-memory store
pub struct Farmyard {
    pub store: std::sync::Arc<InMemoryStore>,
    pub farmer: Farmer,
    pub farm: Farm,
}

impl Farmyard {
    pub async fn new() -> Self {
        Self::with_email(None).await
    }

    pub async fn with_email(email: Option<&str>) -> Self {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let farmer = Farmer {
            id: FarmerId::new(),
            name: "Anand".into(),
            phone: "+919811111111".into(),
            email: email.map(str::to_string),
        };
        let farm = Farm {
            id: FarmId::new(),
            farmer_id: farmer.id,
            name: "Canal side".into(),
            latitude: 12.97,
            longitude: 77.59,
        };
        store.upsert_farmer(farmer.clone()).await.unwrap();
        store.upsert_farm(farm.clone()).await.unwrap();
        Self {
            store,
            farmer,
            farm,
        }
    }

    pub async fn plant(&self, crop_type: &str, planted: Option<NaiveDate>, area: Option<f64>) -> Crop {
        let crop = Crop {
            id: CropId::new(),
            farm_id: self.farm.id,
            crop_type: crop_type.into(),
            planted_date: planted,
            area_hectares: area,
            status: CropStatus::Active,
        };
        self.store.upsert_crop(crop.clone()).await.unwrap();
        crop
    }

    pub async fn health(&self, crop: &Crop, score: u8, moisture: Option<f64>) {
        let mut health = CropHealth::from_score(crop.id, Utc::now(), score);
        health.moisture_level = moisture;
        self.store.record_health(health).await.unwrap();
    }

    pub async fn install(&self, device_type: DeviceType, serial: &str) -> IoTDevice {
        let device = IoTDevice {
            id: DeviceId::new(),
            farm_id: self.farm.id,
            serial: serial.into(),
            name: serial.into(),
            device_type,
            status: DeviceStatus::Active,
            last_seen_at: None,
        };
        self.store.upsert_device(device.clone()).await.unwrap();
        device
    }

    pub async fn read(&self, device: &IoTDevice, fill: impl FnOnce(&mut SensorReading)) {
        let mut reading = SensorReading::new(device.id, Utc::now());
        fill(&mut reading);
        self.store.record_reading(reading).await.unwrap();
    }

    pub fn days_ago(days: i64) -> NaiveDate {
        Utc::now().date_naive() - Duration::days(days)
    }
}
