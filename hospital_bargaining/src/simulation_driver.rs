//! Simulation driver
//!
//! Walks patients in arrival order. A patient is dispatched only when they
//! need a C-section and their preferred hospital offers one; a dispatched
//! patient whose hospital is already full is turned away without bargaining.
//! Everyone else goes through the negotiator, and the updated hospital,
//! insurer and patient records are written back before the next patient.

use crate::entity_pool::EntityPool;
use crate::error::Error;
use crate::negotiation::{Negotiation, Negotiator};
use crate::{Decision, PatientId, WaitTime};

/// What happened to one patient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not eligible, left unresolved
    Skipped,
    /// Hospital full at dispatch time, negotiator not consulted
    NoCapacity,
    Negotiated {
        decision: Decision,
        round_count: usize,
    },
}

impl Dispatch {
    pub fn decision(&self) -> Decision {
        match self {
            Dispatch::Skipped => Decision::Unresolved,
            Dispatch::NoCapacity => Decision::NoCapacity,
            Dispatch::Negotiated { decision, .. } => *decision,
        }
    }
}

pub struct SimulationDriver<N> {
    negotiator: N,
}

impl<N: Negotiator> SimulationDriver<N> {
    pub fn new(negotiator: N) -> Self {
        SimulationDriver { negotiator }
    }

    pub fn negotiator(&self) -> &N {
        &self.negotiator
    }

    /// Process a single patient against the current state of the pool
    pub fn dispatch(&mut self, pool: &mut EntityPool, patient_id: PatientId) -> Result<Dispatch, Error> {
        let patient = pool
            .patient(patient_id)
            .cloned()
            .ok_or(Error::UnknownPatient(patient_id))?;
        if patient.decision.is_resolved() {
            return Err(Error::AlreadyDispatched(patient_id));
        }

        let hospital_id = patient.preferred_hospital;
        let insurer_id = patient.insurance_company;
        let hospital = *pool.hospital(hospital_id).ok_or(Error::UnknownHospital {
            patient: patient_id,
            hospital: hospital_id,
        })?;
        let insurer = *pool.insurer(insurer_id).ok_or(Error::UnknownInsurer {
            patient: patient_id,
            insurer: insurer_id,
        })?;

        if !patient.is_eligible_at(&hospital) {
            return Ok(Dispatch::Skipped);
        }

        if !hospital.is_available() {
            let record = pool
                .patient_mut(patient_id)
                .ok_or(Error::UnknownPatient(patient_id))?;
            record.wait_time = Some(WaitTime::Unbounded);
            record.welfare = Some(0.0);
            record.decision = Decision::NoCapacity;
            record.round_count = 0;
            log::debug!("patient {}: hospital {} has no capacity", patient_id, hospital_id);
            return Ok(Dispatch::NoCapacity);
        }

        let Negotiation {
            hospital,
            insurer,
            patient,
            decision,
            round_count,
        } = self.negotiator.negotiate(hospital, insurer, patient);

        if let Some(record) = pool.hospital_mut(hospital_id) {
            *record = hospital;
        }
        if let Some(record) = pool.insurer_mut(insurer_id) {
            *record = insurer;
        }
        if let Some(record) = pool.patient_mut(patient_id) {
            *record = patient;
        }

        log::debug!(
            "patient {}: {} after {} rounds (hospital {}, insurer {})",
            patient_id,
            decision,
            round_count,
            hospital_id,
            insurer_id
        );

        Ok(Dispatch::Negotiated {
            decision,
            round_count,
        })
    }

    /// Process every patient in arrival order
    pub fn run(&mut self, pool: &mut EntityPool) -> Result<Vec<Dispatch>, Error> {
        let ids: Vec<PatientId> = pool.patient_ids().collect();
        let mut dispatches = Vec::with_capacity(ids.len());
        for patient_id in ids {
            dispatches.push(self.dispatch(pool, patient_id)?);
        }
        Ok(dispatches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BargainingConfig;
    use crate::negotiation::NashBargaining;
    use crate::{Hospital, HospitalId, InsuranceCompany, InsurerId, Patient};

    /// Accepts everything in round 1 without touching the records
    struct CountingNegotiator {
        calls: usize,
    }

    impl Negotiator for CountingNegotiator {
        fn negotiate(
            &mut self,
            hospital: Hospital,
            insurer: InsuranceCompany,
            mut patient: Patient,
        ) -> Negotiation {
            self.calls += 1;
            patient.decision = Decision::Accept;
            patient.round_count = 1;
            Negotiation {
                hospital,
                insurer,
                patient,
                decision: Decision::Accept,
                round_count: 1,
            }
        }
    }

    fn hospital(capacity: u32, c_section_availability: bool) -> Hospital {
        Hospital {
            capacity,
            quality: 8.0,
            cost_per_service: 15000.0,
            c_section_availability,
        }
    }

    fn insurer() -> InsuranceCompany {
        InsuranceCompany {
            client_count: 100,
            average_premium: 800.0,
            c_section_coverage: true,
        }
    }

    #[test]
    fn test_full_hospital_short_circuits() {
        let mut pool = EntityPool::from_parts(
            vec![hospital(0, true)],
            vec![insurer()],
            vec![Patient::new(InsurerId(0), HospitalId(0), true)],
        )
        .unwrap();
        let mut driver = SimulationDriver::new(CountingNegotiator { calls: 0 });

        let dispatch = driver.dispatch(&mut pool, PatientId(0)).unwrap();

        assert_eq!(dispatch, Dispatch::NoCapacity);
        assert_eq!(driver.negotiator().calls, 0);
        let patient = pool.patient(PatientId(0)).unwrap();
        assert_eq!(patient.decision, Decision::NoCapacity);
        assert_eq!(patient.round_count, 0);
        assert_eq!(patient.welfare, Some(0.0));
        assert_eq!(patient.wait_time, Some(WaitTime::Unbounded));
        assert_eq!(patient.out_of_pocket_cost, None);
    }

    #[test]
    fn test_ineligible_patients_are_skipped() {
        let mut pool = EntityPool::from_parts(
            vec![hospital(10, true), hospital(10, false)],
            vec![insurer()],
            vec![
                Patient::new(InsurerId(0), HospitalId(0), false),
                Patient::new(InsurerId(0), HospitalId(1), true),
            ],
        )
        .unwrap();
        let mut driver = SimulationDriver::new(CountingNegotiator { calls: 0 });

        let dispatches = driver.run(&mut pool).unwrap();

        assert_eq!(dispatches, vec![Dispatch::Skipped, Dispatch::Skipped]);
        assert_eq!(driver.negotiator().calls, 0);
        assert!(pool.patients().iter().all(|p| p.decision == Decision::Unresolved));
    }

    #[test]
    fn test_eligible_patients_reach_negotiator() {
        let mut pool = EntityPool::from_parts(
            vec![hospital(10, true)],
            vec![insurer()],
            vec![
                Patient::new(InsurerId(0), HospitalId(0), true),
                Patient::new(InsurerId(0), HospitalId(0), false),
                Patient::new(InsurerId(0), HospitalId(0), true),
            ],
        )
        .unwrap();
        let mut driver = SimulationDriver::new(CountingNegotiator { calls: 0 });

        let dispatches = driver.run(&mut pool).unwrap();

        assert_eq!(driver.negotiator().calls, 2);
        assert_eq!(dispatches[1], Dispatch::Skipped);
        assert_eq!(dispatches[0].decision(), Decision::Accept);
        assert_eq!(pool.patient(PatientId(2)).unwrap().decision, Decision::Accept);
    }

    #[test]
    fn test_patient_is_dispatched_once() {
        let mut pool = EntityPool::from_parts(
            vec![hospital(0, true)],
            vec![insurer()],
            vec![Patient::new(InsurerId(0), HospitalId(0), true)],
        )
        .unwrap();
        let mut driver = SimulationDriver::new(CountingNegotiator { calls: 0 });

        driver.dispatch(&mut pool, PatientId(0)).unwrap();
        let err = driver.dispatch(&mut pool, PatientId(0)).unwrap_err();
        assert!(matches!(err, Error::AlreadyDispatched(PatientId(0))));

        let err = driver.dispatch(&mut pool, PatientId(9)).unwrap_err();
        assert!(matches!(err, Error::UnknownPatient(PatientId(9))));
    }

    #[test]
    fn test_write_back_drains_capacity() {
        // Three beds, five eligible patients, acceptance guaranteed
        let config = BargainingConfig {
            counteroffer_bounds: crate::config::OfferBounds::new(0.95, 0.99),
            ..BargainingConfig::default()
        };
        let patients = (0..5)
            .map(|_| Patient::new(InsurerId(0), HospitalId(0), true))
            .collect();
        let mut pool =
            EntityPool::from_parts(vec![hospital(3, true)], vec![insurer()], patients).unwrap();
        let mut driver = SimulationDriver::new(NashBargaining::new(&config, 5).unwrap());

        let decisions: Vec<Decision> = driver
            .run(&mut pool)
            .unwrap()
            .iter()
            .map(Dispatch::decision)
            .collect();

        assert_eq!(
            decisions,
            vec![
                Decision::Accept,
                Decision::Accept,
                Decision::Accept,
                Decision::NoCapacity,
                Decision::NoCapacity
            ]
        );
        assert_eq!(pool.hospital(HospitalId(0)).unwrap().capacity, 0);
        assert_eq!(pool.insurer(InsurerId(0)).unwrap().client_count, 97);

        let waits: Vec<Option<WaitTime>> = pool.patients().iter().map(|p| p.wait_time).collect();
        assert_eq!(waits[0], Some(WaitTime::Finite(0.5)));
        assert_eq!(waits[1], Some(WaitTime::Finite(1.0)));
        assert_eq!(waits[2], Some(WaitTime::Unbounded));
    }
}
