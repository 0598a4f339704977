//! Model configuration
//!
//! Defaults reproduce the baseline market: 50 hospitals, 20 insurers and
//! 10,000 patients, with distribution parameters taken from published
//! California hospital and insurer figures. Every field can be overridden
//! from TOML; missing fields fall back to the baseline.

use crate::error::{ConfigError, Error};
use crate::MAX_ROUNDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Half-open multiplicative noise band `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfferBounds {
    pub low: f64,
    pub high: f64,
}

impl OfferBounds {
    pub fn new(low: f64, high: f64) -> Self {
        OfferBounds { low, high }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalDistribution {
    /// Integer capacity drawn from `capacity_min..capacity_max`
    pub capacity_min: u32,
    pub capacity_max: u32,
    pub quality_min: f64,
    pub quality_max: f64,
    pub cost_per_service_min: f64,
    pub cost_per_service_max: f64,
    pub c_section_probability: f64,
}

impl Default for HospitalDistribution {
    fn default() -> Self {
        HospitalDistribution {
            capacity_min: 200,
            capacity_max: 500,
            quality_min: 5.0,
            quality_max: 9.0,
            cost_per_service_min: 6241.0,
            cost_per_service_max: 60584.0,
            c_section_probability: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsurerDistribution {
    /// Integer client count drawn from `client_count_min..client_count_max`
    pub client_count_min: i64,
    pub client_count_max: i64,
    pub premium_min: f64,
    pub premium_max: f64,
    pub c_section_coverage_probability: f64,
}

impl Default for InsurerDistribution {
    fn default() -> Self {
        InsurerDistribution {
            client_count_min: 900_000,
            client_count_max: 8_000_000,
            premium_min: 350.0,
            premium_max: 7000.0,
            c_section_coverage_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientDistribution {
    pub c_section_need_probability: f64,
}

impl Default for PatientDistribution {
    fn default() -> Self {
        PatientDistribution {
            c_section_need_probability: 0.4,
        }
    }
}

/// Parameters of the per-patient negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BargainingConfig {
    pub max_rounds: usize,
    /// Accept when `offer * acceptance_ratio <= counteroffer`
    pub acceptance_ratio: f64,
    pub min_quality: f64,
    /// Opening reference = quality_weight * quality + capacity_weight * capacity
    pub quality_weight: f64,
    pub capacity_weight: f64,
    /// Hospital's noise around the reference value
    pub offer_bounds: OfferBounds,
    /// Insurer's downward counter relative to the offer
    pub counteroffer_bounds: OfferBounds,
}

impl Default for BargainingConfig {
    fn default() -> Self {
        BargainingConfig {
            max_rounds: MAX_ROUNDS,
            acceptance_ratio: 0.9,
            min_quality: 4.5,
            quality_weight: 0.6,
            capacity_weight: 0.4,
            offer_bounds: OfferBounds::new(0.9, 1.1),
            counteroffer_bounds: OfferBounds::new(0.75, 0.95),
        }
    }
}

impl BargainingConfig {
    /// Checks the round budget and that both noise bands are non-empty and positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        check_range("offer bounds", self.offer_bounds.low, self.offer_bounds.high)?;
        check_range(
            "counteroffer bounds",
            self.counteroffer_bounds.low,
            self.counteroffer_bounds.high,
        )?;
        check_positive("offer bounds low", self.offer_bounds.low)?;
        check_positive("counteroffer bounds low", self.counteroffer_bounds.low)?;
        check_positive("acceptance_ratio", self.acceptance_ratio)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hospital_count: usize,
    pub insurance_company_count: usize,
    pub patient_count: usize,
    pub hospitals: HospitalDistribution,
    pub insurers: InsurerDistribution,
    pub patients: PatientDistribution,
    pub bargaining: BargainingConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::baseline()
    }
}

impl ModelConfig {
    /// Baseline market
    pub fn baseline() -> Self {
        ModelConfig {
            hospital_count: 50,
            insurance_company_count: 20,
            patient_count: 10_000,
            hospitals: HospitalDistribution::default(),
            insurers: InsurerDistribution::default(),
            patients: PatientDistribution::default(),
            bargaining: BargainingConfig::default(),
        }
    }

    /// Small hospitals that run out of beds partway through the patient stream
    pub fn congested() -> Self {
        let mut config = Self::baseline();
        config.hospitals.capacity_min = 5;
        config.hospitals.capacity_max = 40;
        config
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: ModelConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let h = &self.hospitals;
        check_range("hospital capacity", h.capacity_min as f64, h.capacity_max as f64)?;
        check_range("hospital quality", h.quality_min, h.quality_max)?;
        check_range(
            "hospital cost per service",
            h.cost_per_service_min,
            h.cost_per_service_max,
        )?;
        check_probability("c_section_probability", h.c_section_probability)?;

        let i = &self.insurers;
        check_range(
            "insurer client count",
            i.client_count_min as f64,
            i.client_count_max as f64,
        )?;
        check_range("insurer premium", i.premium_min, i.premium_max)?;
        check_probability(
            "c_section_coverage_probability",
            i.c_section_coverage_probability,
        )?;

        check_probability(
            "c_section_need_probability",
            self.patients.c_section_need_probability,
        )?;

        self.bargaining.validate()?;

        if self.patient_count > 0
            && (self.hospital_count == 0 || self.insurance_company_count == 0)
        {
            return Err(ConfigError::EmptyMarket(self.patient_count));
        }

        Ok(())
    }
}

fn check_range(name: &'static str, low: f64, high: f64) -> Result<(), ConfigError> {
    // NaN bounds fail this comparison too
    if low < high {
        Ok(())
    } else {
        Err(ConfigError::EmptyRange { name, low, high })
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_values() {
        let config = ModelConfig::baseline();
        assert_eq!(config.hospital_count, 50);
        assert_eq!(config.insurance_company_count, 20);
        assert_eq!(config.patient_count, 10_000);
        assert_eq!(config.bargaining.max_rounds, 50);
        assert_eq!(config.bargaining.offer_bounds, OfferBounds::new(0.9, 1.1));
        assert_eq!(
            config.bargaining.counteroffer_bounds,
            OfferBounds::new(0.75, 0.95)
        );
        assert!(config.validate().is_ok());
        assert_eq!(ModelConfig::default(), config);
    }

    #[test]
    fn test_congested_is_valid() {
        let config = ModelConfig::congested();
        assert!(config.validate().is_ok());
        assert!(config.hospitals.capacity_max < ModelConfig::baseline().hospitals.capacity_min);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            patient_count = 200

            [bargaining]
            max_rounds = 10

            [hospitals]
            capacity_min = 1
            capacity_max = 3
        "#;
        let config = ModelConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.patient_count, 200);
        assert_eq!(config.hospital_count, 50);
        assert_eq!(config.bargaining.max_rounds, 10);
        assert_eq!(config.bargaining.acceptance_ratio, 0.9);
        assert_eq!(config.hospitals.capacity_max, 3);
        assert_eq!(config.hospitals.quality_min, 5.0);
    }

    #[test]
    fn test_toml_round_trip_of_baseline() {
        let baseline = ModelConfig::baseline();
        let s = toml::to_string(&baseline).unwrap();
        assert_eq!(ModelConfig::from_toml_str(&s).unwrap(), baseline);
    }

    #[test]
    fn test_invalid_toml_values_rejected() {
        let err = ModelConfig::from_toml_str("[bargaining]\nmax_rounds = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NoRounds)));

        let err =
            ModelConfig::from_toml_str("[patients]\nc_section_need_probability = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::Probability { .. })
        ));

        let err = ModelConfig::from_toml_str("patient_count = \"many\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_empty_ranges_rejected() {
        let mut config = ModelConfig::baseline();
        config.hospitals.capacity_min = 10;
        config.hospitals.capacity_max = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyRange {
                name: "hospital capacity",
                ..
            })
        ));

        let mut config = ModelConfig::baseline();
        config.bargaining.counteroffer_bounds = OfferBounds::new(0.95, 0.75);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bargaining_validation() {
        assert!(BargainingConfig::default().validate().is_ok());

        let config = BargainingConfig {
            max_rounds: 0,
            ..BargainingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoRounds));

        let config = BargainingConfig {
            offer_bounds: OfferBounds::new(1.0, 1.0),
            ..BargainingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyRange {
                name: "offer bounds",
                ..
            })
        ));

        let config = BargainingConfig {
            counteroffer_bounds: OfferBounds::new(-0.5, 0.5),
            ..BargainingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { .. })
        ));
    }

    #[test]
    fn test_patients_without_market_rejected() {
        let mut config = ModelConfig::baseline();
        config.hospital_count = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyMarket(10_000)));

        config.patient_count = 0;
        assert!(config.validate().is_ok());
    }
}
