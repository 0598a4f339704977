//! Entity pool: owned hospitals, insurers and patients addressed by typed ids
//!
//! Patients refer to hospitals and insurers by index. References are checked
//! once when the pool is assembled, so lookups during the run only fail for
//! ids that never came from this pool.

use crate::config::ModelConfig;
use crate::error::Error;
use crate::{
    Hospital, HospitalId, InsuranceCompany, InsurerId, MarketSnapshot, Patient, PatientId,
};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

#[derive(Debug, Clone, Default)]
pub struct EntityPool {
    hospitals: Vec<Hospital>,
    insurers: Vec<InsuranceCompany>,
    patients: Vec<Patient>,
}

impl EntityPool {
    /// Assemble a pool from caller-supplied records
    pub fn from_parts(
        hospitals: Vec<Hospital>,
        insurers: Vec<InsuranceCompany>,
        patients: Vec<Patient>,
    ) -> Result<Self, Error> {
        for (i, patient) in patients.iter().enumerate() {
            if patient.preferred_hospital.0 >= hospitals.len() {
                return Err(Error::UnknownHospital {
                    patient: PatientId(i),
                    hospital: patient.preferred_hospital,
                });
            }
            if patient.insurance_company.0 >= insurers.len() {
                return Err(Error::UnknownInsurer {
                    patient: PatientId(i),
                    insurer: patient.insurance_company,
                });
            }
        }

        Ok(EntityPool {
            hospitals,
            insurers,
            patients,
        })
    }

    /// Draw a synthetic market from the configured distributions
    pub fn generate<R: Rng + ?Sized>(config: &ModelConfig, rng: &mut R) -> Result<Self, Error> {
        config.validate()?;

        let h = &config.hospitals;
        let offers_c_section = bernoulli(h.c_section_probability)?;
        let hospitals: Vec<Hospital> = (0..config.hospital_count)
            .map(|_| Hospital {
                capacity: rng.gen_range(h.capacity_min..h.capacity_max),
                quality: rng.gen_range(h.quality_min..h.quality_max),
                cost_per_service: rng.gen_range(h.cost_per_service_min..h.cost_per_service_max),
                c_section_availability: offers_c_section.sample(rng),
            })
            .collect();

        let i = &config.insurers;
        let covers_c_section = bernoulli(i.c_section_coverage_probability)?;
        let insurers: Vec<InsuranceCompany> = (0..config.insurance_company_count)
            .map(|_| InsuranceCompany {
                client_count: rng.gen_range(i.client_count_min..i.client_count_max),
                average_premium: rng.gen_range(i.premium_min..i.premium_max),
                c_section_coverage: covers_c_section.sample(rng),
            })
            .collect();

        let needs_c_section = bernoulli(config.patients.c_section_need_probability)?;
        let patients: Vec<Patient> = (0..config.patient_count)
            .map(|_| {
                let insurer = InsurerId(rng.gen_range(0..config.insurance_company_count));
                let need = needs_c_section.sample(rng);
                let hospital = HospitalId(rng.gen_range(0..config.hospital_count));
                Patient::new(insurer, hospital, need)
            })
            .collect();

        log::info!(
            "generated {} hospitals, {} insurers, {} patients",
            hospitals.len(),
            insurers.len(),
            patients.len()
        );

        Self::from_parts(hospitals, insurers, patients)
    }

    pub fn hospital(&self, id: HospitalId) -> Option<&Hospital> {
        self.hospitals.get(id.0)
    }

    pub fn hospital_mut(&mut self, id: HospitalId) -> Option<&mut Hospital> {
        self.hospitals.get_mut(id.0)
    }

    pub fn insurer(&self, id: InsurerId) -> Option<&InsuranceCompany> {
        self.insurers.get(id.0)
    }

    pub fn insurer_mut(&mut self, id: InsurerId) -> Option<&mut InsuranceCompany> {
        self.insurers.get_mut(id.0)
    }

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(id.0)
    }

    pub fn patient_mut(&mut self, id: PatientId) -> Option<&mut Patient> {
        self.patients.get_mut(id.0)
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn insurers(&self) -> &[InsuranceCompany] {
        &self.insurers
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Patient ids in arrival order
    pub fn patient_ids(&self) -> impl Iterator<Item = PatientId> {
        (0..self.patients.len()).map(PatientId)
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            hospitals: self.hospitals.clone(),
            insurers: self.insurers.clone(),
            patients: self.patients.clone(),
        }
    }
}

fn bernoulli(p: f64) -> Result<Bernoulli, Error> {
    // Probabilities are range-checked by ModelConfig::validate
    Bernoulli::new(p).map_err(|_| {
        Error::Config(crate::ConfigError::Probability {
            name: "bernoulli",
            value: p,
        })
    })
}
