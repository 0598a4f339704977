//! Output hand-off for downstream analysis
//!
//! The dispatched patient table goes to CSV, the run metadata and summary
//! report go to JSON. Unresolved patients never appear in either.

use crate::analysis::SummaryReport;
use crate::config::ModelConfig;
use crate::error::Error;
use crate::scenario::SimulationRun;
use crate::Patient;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationMetadata {
    pub config: ModelConfig,
    pub seed: u64,
    pub timestamp: String,
}

/// One row of the output patient table
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub patient_id: usize,
    pub insurance_company: usize,
    pub preferred_hospital: usize,
    pub need_for_c_section_services: bool,
    pub out_of_pocket_cost: Option<f64>,
    pub wait_time: String,
    pub welfare: Option<f64>,
    pub decision: String,
    pub round_count: usize,
}

impl PatientRecord {
    fn from_patient(patient_id: usize, patient: &Patient) -> Self {
        PatientRecord {
            patient_id,
            insurance_company: patient.insurance_company.0,
            preferred_hospital: patient.preferred_hospital.0,
            need_for_c_section_services: patient.need_for_c_section_services,
            out_of_pocket_cost: patient.out_of_pocket_cost,
            wait_time: patient
                .wait_time
                .map(|w| w.to_string())
                .unwrap_or_default(),
            welfare: patient.welfare,
            decision: patient.decision.label().to_string(),
            round_count: patient.round_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub metadata: SimulationMetadata,
    pub summary: SummaryReport,
    #[serde(skip)]
    pub patients: Vec<PatientRecord>,
}

impl SimulationOutput {
    pub fn from_run(run: &SimulationRun, config: &ModelConfig) -> Self {
        let patients = run
            .snapshot
            .dispatched_patients()
            .map(|(id, p)| PatientRecord::from_patient(id.0, p))
            .collect();

        SimulationOutput {
            metadata: SimulationMetadata {
                config: config.clone(),
                seed: run.seed,
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            summary: SummaryReport::from_snapshot(&run.snapshot),
            patients,
        }
    }

    /// Write the patient table as CSV
    pub fn write_patients_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record([
            "patient_id",
            "insurance_company",
            "preferred_hospital",
            "need_for_c_section_services",
            "out_of_pocket_cost",
            "wait_time",
            "welfare",
            "decision",
            "round_count",
        ])?;

        for record in &self.patients {
            wtr.write_record(&[
                record.patient_id.to_string(),
                record.insurance_company.to_string(),
                record.preferred_hospital.to_string(),
                (record.need_for_c_section_services as u8).to_string(),
                fmt_optional(record.out_of_pocket_cost),
                record.wait_time.clone(),
                fmt_optional(record.welfare),
                record.decision.clone(),
                record.round_count.to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write metadata and summary report as pretty JSON
    pub fn write_summary_json<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write `patients.csv` and `summary.json` into `dir`
    pub fn write_all<P: AsRef<Path>>(&self, dir: P) -> Result<(), Error> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        self.write_patients_csv(BufWriter::new(File::create(dir.join("patients.csv"))?))?;
        self.write_summary_json(BufWriter::new(File::create(dir.join("summary.json"))?))?;

        log::info!("wrote output to {}", dir.display());
        Ok(())
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
