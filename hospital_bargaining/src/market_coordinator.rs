//! Market coordinator agent
//!
//! Owns the entity pool and the simulation driver. Each `PatientArrived`
//! event dispatches one patient; the outcome is broadcast at the same time
//! step as `NegotiationConcluded` (or `PatientSkipped`) so other agents can
//! observe it.

use crate::entity_pool::EntityPool;
use crate::negotiation::Negotiator;
use crate::simulation_driver::{Dispatch, SimulationDriver};
use crate::{Event, PatientId, Stats};
use des::{Agent, Response};

pub struct MarketCoordinator<N> {
    pool: EntityPool,
    driver: SimulationDriver<N>,
}

impl<N: Negotiator> MarketCoordinator<N> {
    pub fn new(pool: EntityPool, negotiator: N) -> Self {
        MarketCoordinator {
            pool,
            driver: SimulationDriver::new(negotiator),
        }
    }

    /// Arrival events for every patient, one time step apart
    pub fn arrivals(&self) -> Vec<(usize, Event)> {
        self.pool
            .patient_ids()
            .map(|patient_id| (patient_id.0, Event::PatientArrived { patient_id }))
            .collect()
    }

    fn handle_arrival(&mut self, current_t: usize, patient_id: PatientId) -> Response<Event, Stats> {
        let dispatch = match self.driver.dispatch(&mut self.pool, patient_id) {
            Ok(dispatch) => dispatch,
            Err(e) => {
                log::warn!("t={}: dropping arrival of patient {}: {}", current_t, patient_id, e);
                return Response::new();
            }
        };

        if dispatch == Dispatch::Skipped {
            return Response::event(current_t, Event::PatientSkipped { patient_id });
        }

        match self.pool.patient(patient_id) {
            Some(patient) => Response::event(
                current_t,
                Event::NegotiationConcluded {
                    patient_id,
                    hospital_id: patient.preferred_hospital,
                    insurer_id: patient.insurance_company,
                    decision: patient.decision,
                    round_count: patient.round_count,
                    wait_time: patient.wait_time,
                    welfare: patient.welfare,
                },
            ),
            None => Response::new(),
        }
    }
}

impl<N: Negotiator> Agent<Event, Stats> for MarketCoordinator<N> {
    fn act(&mut self, current_t: usize, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::PatientArrived { patient_id } => self.handle_arrival(current_t, *patient_id),
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Market(self.pool.snapshot())
    }
}
