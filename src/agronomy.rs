// Copyright 2025 Cowboy AI, LLC.

//! Static agronomy lookup tables
//!
//! Water bands and NPK requirements by crop type, growth stage bands by
//! days since planting, and fertilizer prices. The tables are loaded once
//! (built-in defaults or configuration) and shared read-only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Daily water requirement band, liters per hectare
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterRequirement {
    /// Lower bound
    pub min: f64,
    /// Target
    pub optimal: f64,
    /// Upper bound
    pub max: f64,
}

/// Seasonal nutrient requirement, kg per hectare
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpkRequirement {
    /// Nitrogen
    pub n: f64,
    /// Phosphorus
    pub p: f64,
    /// Potassium
    pub k: f64,
}

impl NpkRequirement {
    /// Requirement for one nutrient
    pub fn of(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.n,
            Nutrient::Phosphorus => self.p,
            Nutrient::Potassium => self.k,
        }
    }
}

/// One of the three tracked macronutrients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    /// N
    Nitrogen,
    /// P
    Phosphorus,
    /// K
    Potassium,
}

impl Nutrient {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "nitrogen",
            Nutrient::Phosphorus => "phosphorus",
            Nutrient::Potassium => "potassium",
        }
    }

    /// Straight fertilizer that supplies this nutrient
    pub fn fertilizer(&self) -> Fertilizer {
        match self {
            Nutrient::Nitrogen => Fertilizer::Urea,
            Nutrient::Phosphorus => Fertilizer::Dap,
            Nutrient::Potassium => Fertilizer::Mop,
        }
    }
}

/// Nutrient emphasis of a growth stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientFocus {
    /// No single emphasis; fed as nitrogen
    Balanced,
    /// Nitrogen emphasis
    Nitrogen,
    /// Phosphorus emphasis
    Phosphorus,
    /// Potassium emphasis
    Potassium,
}

impl NutrientFocus {
    /// Nutrient to feed for this focus
    pub fn nutrient(&self) -> Nutrient {
        match self {
            NutrientFocus::Balanced | NutrientFocus::Nitrogen => Nutrient::Nitrogen,
            NutrientFocus::Phosphorus => Nutrient::Phosphorus,
            NutrientFocus::Potassium => Nutrient::Potassium,
        }
    }
}

/// Coarse crop lifecycle bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    /// First weeks after planting
    Seedling,
    /// Leaf and stem growth
    Vegetative,
    /// Flowering
    Flowering,
    /// Fruit or grain fill
    Fruiting,
}

/// A growth stage band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    /// Stage
    pub stage: GrowthStage,
    /// Display label
    pub label: String,
    /// Band ends before this many days since planting; `None` is open-ended
    pub until_day: Option<i64>,
    /// Nutrient emphasis
    pub focus: NutrientFocus,
    /// Share of the seasonal requirement applied in this stage
    pub share: f64,
}

/// Straight fertilizers the engine recommends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fertilizer {
    /// 46-0-0
    Urea,
    /// Diammonium phosphate, 18-46-0
    Dap,
    /// Muriate of potash, 0-0-60
    Mop,
}

impl Fertilizer {
    /// Display label including grade
    pub fn label(&self) -> &'static str {
        match self {
            Fertilizer::Urea => "Urea (46-0-0)",
            Fertilizer::Dap => "DAP (18-46-0)",
            Fertilizer::Mop => "MOP (0-0-60)",
        }
    }

    /// N:P:K ratio string
    pub fn npk_ratio(&self) -> &'static str {
        match self {
            Fertilizer::Urea => "46:0:0",
            Fertilizer::Dap => "18:46:0",
            Fertilizer::Mop => "0:0:60",
        }
    }

    /// Mass fraction of the target nutrient
    pub fn nutrient_fraction(&self) -> f64 {
        match self {
            Fertilizer::Urea | Fertilizer::Dap => 0.46,
            Fertilizer::Mop => 0.60,
        }
    }

    /// Key into the price table
    pub fn price_key(&self) -> &'static str {
        match self {
            Fertilizer::Urea => "urea",
            Fertilizer::Dap => "dap",
            Fertilizer::Mop => "mop",
        }
    }
}

/// Immutable lookup tables used by the recommendation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgronomyTables {
    /// Water band by lowercase crop type
    pub water: IndexMap<String, WaterRequirement>,
    /// Water band for unknown crop types
    pub default_water: WaterRequirement,
    /// NPK requirement by lowercase crop type
    pub npk: IndexMap<String, NpkRequirement>,
    /// NPK requirement for unknown crop types
    pub default_npk: NpkRequirement,
    /// Growth stages in ascending day order
    pub stages: Vec<StageProfile>,
    /// Price per kg by fertilizer key
    pub fertilizer_prices: IndexMap<String, f64>,
}

impl Default for AgronomyTables {
    fn default() -> Self {
        let water = [
            ("rice", 800.0, 1200.0, 1500.0),
            ("wheat", 300.0, 450.0, 600.0),
            ("cotton", 400.0, 600.0, 800.0),
            ("sugarcane", 1000.0, 1500.0, 2000.0),
            ("maize", 400.0, 550.0, 700.0),
            ("vegetables", 300.0, 450.0, 600.0),
        ]
        .into_iter()
        .map(|(crop, min, optimal, max)| (crop.to_string(), WaterRequirement { min, optimal, max }))
        .collect();

        let npk = [
            ("rice", 120.0, 60.0, 60.0),
            ("wheat", 120.0, 60.0, 40.0),
            ("cotton", 150.0, 60.0, 60.0),
            ("sugarcane", 250.0, 100.0, 100.0),
            ("maize", 120.0, 60.0, 40.0),
            ("potato", 180.0, 80.0, 100.0),
            ("tomato", 150.0, 100.0, 120.0),
            ("vegetables", 100.0, 50.0, 50.0),
        ]
        .into_iter()
        .map(|(crop, n, p, k)| (crop.to_string(), NpkRequirement { n, p, k }))
        .collect();

        let stages = vec![
            StageProfile {
                stage: GrowthStage::Seedling,
                label: "Seedling Stage".into(),
                until_day: Some(21),
                focus: NutrientFocus::Balanced,
                share: 0.2,
            },
            StageProfile {
                stage: GrowthStage::Vegetative,
                label: "Vegetative Stage".into(),
                until_day: Some(60),
                focus: NutrientFocus::Nitrogen,
                share: 0.4,
            },
            StageProfile {
                stage: GrowthStage::Flowering,
                label: "Flowering Stage".into(),
                until_day: Some(90),
                focus: NutrientFocus::Phosphorus,
                share: 0.25,
            },
            StageProfile {
                stage: GrowthStage::Fruiting,
                label: "Fruiting Stage".into(),
                until_day: None,
                focus: NutrientFocus::Potassium,
                share: 0.15,
            },
        ];

        let fertilizer_prices = [
            ("urea", 6.0),
            ("dap", 27.0),
            ("mop", 17.0),
            ("npk_complex", 25.0),
            ("organic", 15.0),
        ]
        .into_iter()
        .map(|(key, price)| (key.to_string(), price))
        .collect();

        Self {
            water,
            default_water: WaterRequirement {
                min: 350.0,
                optimal: 500.0,
                max: 700.0,
            },
            npk,
            default_npk: NpkRequirement {
                n: 100.0,
                p: 50.0,
                k: 50.0,
            },
            stages,
            fertilizer_prices,
        }
    }
}

impl AgronomyTables {
    /// Water band for a crop type, case-insensitive
    pub fn water_requirement(&self, crop_type: &str) -> WaterRequirement {
        self.water
            .get(&crop_type.to_lowercase())
            .copied()
            .unwrap_or(self.default_water)
    }

    /// NPK requirement for a crop type, case-insensitive
    pub fn npk_requirement(&self, crop_type: &str) -> NpkRequirement {
        self.npk
            .get(&crop_type.to_lowercase())
            .copied()
            .unwrap_or(self.default_npk)
    }

    /// Stage band for a number of days since planting
    ///
    /// `None` (unknown planting date) maps to the vegetative stage.
    pub fn growth_stage(&self, days_since_planting: Option<i64>) -> Option<&StageProfile> {
        match days_since_planting {
            None => self.stage(GrowthStage::Vegetative),
            Some(days) => self
                .stages
                .iter()
                .find(|profile| profile.until_day.map_or(true, |until| days < until)),
        }
    }

    /// Profile for a specific stage
    pub fn stage(&self, stage: GrowthStage) -> Option<&StageProfile> {
        self.stages.iter().find(|profile| profile.stage == stage)
    }

    /// Price per kg for a fertilizer
    pub fn fertilizer_price(&self, fertilizer: Fertilizer) -> Option<f64> {
        self.fertilizer_prices.get(fertilizer.price_key()).copied()
    }
}
