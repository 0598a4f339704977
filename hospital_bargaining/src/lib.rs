//! Hospital / Insurer Bargaining Market ABM
//!
//! Patients needing a C-section are matched to their preferred hospital and
//! their insurer, and the hospital and insurer bargain over the price of the
//! service. Each negotiation runs a bounded number of offer/counteroffer
//! rounds; an accepted deal consumes one unit of hospital capacity and one
//! insurer client slot, and the patient's welfare is what remains of hospital
//! quality after out-of-pocket cost and waiting time.
//!
//! Key pieces:
//! - `offer` / `decision_rule` / `transaction`: the single-round building blocks
//! - `negotiation`: the round loop (`Negotiator` trait, `NashBargaining`)
//! - `simulation_driver`: eligibility, the no-capacity shortcut, write-back
//! - `market_coordinator` / `outcome_collector`: agents for the `des` event loop
//! - `scenario`: wiring a full run from a `ModelConfig` and a seed

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod analysis;
pub mod config;
pub mod decision_rule;
pub mod entity_pool;
pub mod error;
pub mod market_coordinator;
pub mod negotiation;
pub mod offer;
pub mod outcome_collector;
pub mod output;
pub mod scenario;
pub mod simulation_driver;
pub mod transaction;

pub use config::ModelConfig;
pub use error::{ConfigError, Error};

/// Default round budget for a single negotiation
pub const MAX_ROUNDS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HospitalId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsurerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub usize);

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for InsurerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    /// Beds left for new transactions; 0 means unavailable
    pub capacity: u32,
    pub quality: f64,
    /// Carried for analysis, not read by the bargaining logic
    pub cost_per_service: f64,
    pub c_section_availability: bool,
}

impl Hospital {
    pub fn is_available(&self) -> bool {
        self.capacity > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsuranceCompany {
    /// Not clamped: the acceptance check happens before the decrement
    pub client_count: i64,
    pub average_premium: f64,
    pub c_section_coverage: bool,
}

/// Terminal state of a patient's pass through the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decision {
    /// Never dispatched
    Unresolved,
    Accept,
    /// Round budget exhausted without a deal
    NoAgreement,
    /// Preferred hospital had no capacity left at dispatch time
    NoCapacity,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Unresolved => "None",
            Decision::Accept => "accept",
            Decision::NoAgreement => "no agreement",
            Decision::NoCapacity => "no capacity",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Decision::Unresolved)
    }

    /// The three outcomes a dispatched patient can end in
    pub fn terminal() -> [Decision; 3] {
        [Decision::Accept, Decision::NoAgreement, Decision::NoCapacity]
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Waiting time with an explicit sentinel for "never served"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WaitTime {
    Finite(f64),
    Unbounded,
}

impl WaitTime {
    /// Wait implied by the capacity left after a transaction
    pub fn from_capacity(capacity: u32) -> Self {
        if capacity > 0 {
            WaitTime::Finite(1.0 / capacity as f64)
        } else {
            WaitTime::Unbounded
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, WaitTime::Unbounded)
    }

    pub fn finite(&self) -> Option<f64> {
        match self {
            WaitTime::Finite(w) => Some(*w),
            WaitTime::Unbounded => None,
        }
    }

    /// Numeric value for arithmetic; `Unbounded` maps to `+inf`
    pub fn as_f64(&self) -> f64 {
        match self {
            WaitTime::Finite(w) => *w,
            WaitTime::Unbounded => f64::INFINITY,
        }
    }
}

impl fmt::Display for WaitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTime::Finite(w) => write!(f, "{}", w),
            WaitTime::Unbounded => f.write_str("inf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub insurance_company: InsurerId,
    pub preferred_hospital: HospitalId,
    pub need_for_c_section_services: bool,

    // Outcome fields, written only when the patient is dispatched
    pub out_of_pocket_cost: Option<f64>,
    pub wait_time: Option<WaitTime>,
    pub welfare: Option<f64>,
    pub decision: Decision,
    pub round_count: usize,
}

impl Patient {
    pub fn new(
        insurance_company: InsurerId,
        preferred_hospital: HospitalId,
        need_for_c_section_services: bool,
    ) -> Self {
        Patient {
            insurance_company,
            preferred_hospital,
            need_for_c_section_services,
            out_of_pocket_cost: None,
            wait_time: None,
            welfare: None,
            decision: Decision::Unresolved,
            round_count: 0,
        }
    }

    /// Eligible when the patient needs the service and the hospital offers it
    pub fn is_eligible_at(&self, hospital: &Hospital) -> bool {
        self.need_for_c_section_services && hospital.c_section_availability
    }
}

/// All events in the bargaining market simulation
#[derive(Debug, Clone)]
pub enum Event {
    /// Patient enters the market (time = arrival index)
    PatientArrived { patient_id: PatientId },

    /// Patient was not eligible and stays unresolved
    PatientSkipped { patient_id: PatientId },

    /// Patient reached a terminal decision
    NegotiationConcluded {
        patient_id: PatientId,
        hospital_id: HospitalId,
        insurer_id: InsurerId,
        decision: Decision,
        round_count: usize,
        wait_time: Option<WaitTime>,
        welfare: Option<f64>,
    },
}

/// Full state of the entity pool at a point in time
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub hospitals: Vec<Hospital>,
    pub insurers: Vec<InsuranceCompany>,
    pub patients: Vec<Patient>,
}

impl MarketSnapshot {
    /// Patients that reached a terminal decision, with their ids
    pub fn dispatched_patients(&self) -> impl Iterator<Item = (PatientId, &Patient)> {
        self.patients
            .iter()
            .enumerate()
            .filter(|(_, p)| p.decision.is_resolved())
            .map(|(i, p)| (PatientId(i), p))
    }
}

/// Running tallies of negotiation outcomes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketStats {
    pub patients_arrived: usize,
    pub patients_skipped: usize,
    pub decision_counts: HashMap<Decision, usize>,
    pub round_totals: HashMap<Decision, usize>,
    pub unbounded_waits: usize,
    pub finite_wait_total: f64,
    pub finite_wait_count: usize,
    pub welfare_total: f64,
    pub welfare_count: usize,
}

impl MarketStats {
    pub fn dispatched(&self) -> usize {
        self.decision_counts.values().sum()
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.decision_counts.get(&decision).copied().unwrap_or(0)
    }

    pub fn acceptance_rate(&self) -> f64 {
        let dispatched = self.dispatched();
        if dispatched == 0 {
            return 0.0;
        }
        self.count(Decision::Accept) as f64 / dispatched as f64
    }

    pub fn mean_round_count(&self, decision: Decision) -> Option<f64> {
        let n = self.count(decision);
        if n == 0 {
            return None;
        }
        let total = self.round_totals.get(&decision).copied().unwrap_or(0);
        Some(total as f64 / n as f64)
    }

    /// Mean over finite waits only
    pub fn mean_finite_wait(&self) -> Option<f64> {
        if self.finite_wait_count == 0 {
            return None;
        }
        Some(self.finite_wait_total / self.finite_wait_count as f64)
    }

    /// Mean over finite welfare values only
    pub fn mean_welfare(&self) -> Option<f64> {
        if self.welfare_count == 0 {
            return None;
        }
        Some(self.welfare_total / self.welfare_count as f64)
    }
}

/// Unified stats enum for all agents
#[derive(Debug, Clone)]
pub enum Stats {
    Market(MarketSnapshot),
    Outcomes(MarketStats),
}
