//! Error types for the bargaining market

use crate::{HospitalId, InsurerId, PatientId};
use thiserror::Error;

/// Invalid model configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} range is empty: [{low}, {high})")]
    EmptyRange { name: &'static str, low: f64, high: f64 },

    #[error("{name} must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("max_rounds must be at least 1")]
    NoRounds,

    #[error("{0} patients need at least one hospital and one insurer")]
    EmptyMarket(usize),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Patient {patient} prefers unknown hospital {hospital}")]
    UnknownHospital {
        patient: PatientId,
        hospital: HospitalId,
    },

    #[error("Patient {patient} is insured by unknown insurer {insurer}")]
    UnknownInsurer {
        patient: PatientId,
        insurer: InsurerId,
    },

    #[error("Unknown patient {0}")]
    UnknownPatient(PatientId),

    #[error("Patient {0} has already been dispatched")]
    AlreadyDispatched(PatientId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
