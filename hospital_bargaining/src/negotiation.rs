//! Negotiation engine
//!
//! One negotiation per dispatched patient. The hospital opens from a
//! reference value built from its quality and remaining capacity, the insurer
//! counters, and the acceptance rule judges the pair. A rejected counter
//! becomes the reference for the next round's offer. The loop ends in one of
//! two terminal states:
//!
//! - accepted in round `r` (`1 <= r <= max_rounds`): the transaction is
//!   applied and welfare is `quality - out_of_pocket_cost - wait_time`
//! - exhausted after `max_rounds` rejections: unbounded wait, zero welfare
//!
//! A hospital with no capacity left is refused outright with a no-capacity
//! outcome and zero rounds.
//!
//! Records go in by value and come back out updated; the caller writes them
//! back into the entity pool.

use crate::config::BargainingConfig;
use crate::error::ConfigError;
use crate::decision_rule::{AcceptanceRule, Verdict};
use crate::offer::OfferProtocol;
use crate::transaction;
use crate::{Decision, Hospital, InsuranceCompany, Patient, WaitTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Updated records and terminal outcome of one negotiation
#[derive(Debug, Clone, PartialEq)]
pub struct Negotiation {
    pub hospital: Hospital,
    pub insurer: InsuranceCompany,
    pub patient: Patient,
    pub decision: Decision,
    pub round_count: usize,
}

pub trait Negotiator {
    fn negotiate(
        &mut self,
        hospital: Hospital,
        insurer: InsuranceCompany,
        patient: Patient,
    ) -> Negotiation;
}

/// Bounded-round offer/counteroffer bargaining with multiplicative noise
pub struct NashBargaining<R = StdRng> {
    protocol: OfferProtocol,
    rule: AcceptanceRule,
    max_rounds: usize,
    quality_weight: f64,
    capacity_weight: f64,
    rng: R,
}

impl NashBargaining<StdRng> {
    pub fn new(config: &BargainingConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NashBargaining<R> {
    /// Fails on an empty round budget or an empty noise band
    pub fn with_rng(config: &BargainingConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(NashBargaining {
            protocol: OfferProtocol::from_config(config),
            rule: AcceptanceRule::from_config(config),
            max_rounds: config.max_rounds,
            quality_weight: config.quality_weight,
            capacity_weight: config.capacity_weight,
            rng,
        })
    }

    /// Round-one reference value
    fn opening_reference(&self, hospital: &Hospital) -> f64 {
        hospital.quality * self.quality_weight + hospital.capacity as f64 * self.capacity_weight
    }
}

impl<R: Rng> Negotiator for NashBargaining<R> {
    fn negotiate(
        &mut self,
        mut hospital: Hospital,
        mut insurer: InsuranceCompany,
        mut patient: Patient,
    ) -> Negotiation {
        if !hospital.is_available() {
            log::debug!("hospital has no capacity, not negotiating");
            patient.wait_time = Some(WaitTime::Unbounded);
            patient.welfare = Some(0.0);
            patient.decision = Decision::NoCapacity;
            patient.round_count = 0;
            return Negotiation {
                hospital,
                insurer,
                patient,
                decision: Decision::NoCapacity,
                round_count: 0,
            };
        }

        let mut reference = self.opening_reference(&hospital);

        for round in 1..=self.max_rounds {
            let offer = self.protocol.make_offer(reference, &mut self.rng);
            let counteroffer = self.protocol.make_counteroffer(offer, &mut self.rng);
            reference = counteroffer;

            match self.rule.decide(offer, counteroffer, &hospital, &insurer) {
                Verdict::Accept => {
                    let settlement =
                        transaction::apply(offer, &mut hospital, &mut insurer, &mut patient);
                    let welfare = hospital.quality
                        - settlement.out_of_pocket_cost
                        - settlement.wait_time.as_f64();
                    patient.welfare = Some(welfare);
                    patient.decision = Decision::Accept;
                    patient.round_count = round;

                    log::debug!(
                        "accepted in round {}: offer={:.3} counter={:.3} welfare={}",
                        round,
                        offer,
                        counteroffer,
                        welfare
                    );

                    return Negotiation {
                        hospital,
                        insurer,
                        patient,
                        decision: Decision::Accept,
                        round_count: round,
                    };
                }
                Verdict::Reject => {
                    log::trace!(
                        "round {} rejected: offer={:.3} counter={:.3}",
                        round,
                        offer,
                        counteroffer
                    );
                }
            }
        }

        log::debug!("no agreement after {} rounds", self.max_rounds);
        patient.wait_time = Some(WaitTime::Unbounded);
        patient.welfare = Some(0.0);
        patient.decision = Decision::NoAgreement;
        patient.round_count = self.max_rounds;

        Negotiation {
            hospital,
            insurer,
            patient,
            decision: Decision::NoAgreement,
            round_count: self.max_rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OfferBounds;
    use crate::{HospitalId, InsurerId};

    fn hospital(capacity: u32, quality: f64) -> Hospital {
        Hospital {
            capacity,
            quality,
            cost_per_service: 25000.0,
            c_section_availability: true,
        }
    }

    fn insurer(client_count: i64, average_premium: f64) -> InsuranceCompany {
        InsuranceCompany {
            client_count,
            average_premium,
            c_section_coverage: true,
        }
    }

    fn patient() -> Patient {
        Patient::new(InsurerId(0), HospitalId(0), true)
    }

    #[test]
    fn test_opening_reference() {
        let engine = NashBargaining::new(&BargainingConfig::default(), 1).unwrap();
        let reference = engine.opening_reference(&hospital(100, 8.0));
        assert!((reference - (8.0 * 0.6 + 100.0 * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_low_quality_hospital_never_agrees() {
        let mut engine = NashBargaining::new(&BargainingConfig::default(), 9).unwrap();
        let result = engine.negotiate(hospital(300, 4.0), insurer(1000, 500.0), patient());

        assert_eq!(result.decision, Decision::NoAgreement);
        assert_eq!(result.round_count, 50);
        assert_eq!(result.patient.wait_time, Some(WaitTime::Unbounded));
        assert_eq!(result.patient.welfare, Some(0.0));
        assert_eq!(result.patient.out_of_pocket_cost, None);
        assert_eq!(result.hospital.capacity, 300);
        assert_eq!(result.insurer.client_count, 1000);
    }

    #[test]
    fn test_custom_round_budget_reported_on_exhaustion() {
        let config = BargainingConfig {
            max_rounds: 7,
            ..BargainingConfig::default()
        };
        let mut engine = NashBargaining::new(&config, 9).unwrap();
        let result = engine.negotiate(hospital(300, 9.0), insurer(0, 500.0), patient());

        assert_eq!(result.decision, Decision::NoAgreement);
        assert_eq!(result.round_count, 7);
        assert_eq!(result.patient.round_count, 7);
    }

    #[test]
    fn test_certain_acceptance_in_round_one() {
        // Counter band sits entirely above the acceptance ratio
        let config = BargainingConfig {
            counteroffer_bounds: OfferBounds::new(0.95, 0.99),
            ..BargainingConfig::default()
        };
        let mut engine = NashBargaining::new(&config, 21).unwrap();
        let result = engine.negotiate(hospital(11, 7.0), insurer(3, 2000.0), patient());

        assert_eq!(result.decision, Decision::Accept);
        assert_eq!(result.round_count, 1);
        assert_eq!(result.hospital.capacity, 10);
        assert_eq!(result.insurer.client_count, 2);
        assert_eq!(result.patient.out_of_pocket_cost, Some(0.0));
        assert_eq!(result.patient.wait_time, Some(WaitTime::Finite(0.1)));
        assert_eq!(result.patient.welfare, Some(7.0 - 0.0 - 0.1));
        assert_eq!(result.patient.decision, Decision::Accept);
    }

    #[test]
    fn test_acceptance_round_within_budget() {
        for seed in 0..200 {
            let mut engine = NashBargaining::new(&BargainingConfig::default(), seed).unwrap();
            let result = engine.negotiate(hospital(250, 6.5), insurer(10, 350.0), patient());

            match result.decision {
                Decision::Accept => {
                    assert!((1..=50).contains(&result.round_count));
                    assert_eq!(result.hospital.capacity, 249);
                    assert_eq!(result.insurer.client_count, 9);
                }
                Decision::NoAgreement => assert_eq!(result.round_count, 50),
                other => panic!("unexpected decision {:?}", other),
            }
        }
    }

    #[test]
    fn test_seeded_engine_is_deterministic() {
        let mut a = NashBargaining::new(&BargainingConfig::default(), 77).unwrap();
        let mut b = NashBargaining::new(&BargainingConfig::default(), 77).unwrap();

        for _ in 0..20 {
            let ra = a.negotiate(hospital(300, 7.0), insurer(100, 400.0), patient());
            let rb = b.negotiate(hospital(300, 7.0), insurer(100, 400.0), patient());
            assert_eq!(ra, rb);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let empty_band = BargainingConfig {
            offer_bounds: OfferBounds::new(1.0, 1.0),
            ..BargainingConfig::default()
        };
        assert!(matches!(
            NashBargaining::new(&empty_band, 1),
            Err(ConfigError::EmptyRange { .. })
        ));

        let no_rounds = BargainingConfig {
            max_rounds: 0,
            ..BargainingConfig::default()
        };
        assert!(matches!(
            NashBargaining::new(&no_rounds, 1),
            Err(ConfigError::NoRounds)
        ));
    }

    #[test]
    fn test_full_hospital_is_refused() {
        let config = BargainingConfig {
            counteroffer_bounds: OfferBounds::new(0.95, 0.99),
            ..BargainingConfig::default()
        };
        let mut engine = NashBargaining::new(&config, 4).unwrap();
        let result = engine.negotiate(hospital(0, 8.0), insurer(5, 500.0), patient());

        assert_eq!(result.decision, Decision::NoCapacity);
        assert_eq!(result.round_count, 0);
        assert_eq!(result.hospital.capacity, 0);
        assert_eq!(result.insurer.client_count, 5);
        assert_eq!(result.patient.decision, Decision::NoCapacity);
        assert_eq!(result.patient.wait_time, Some(WaitTime::Unbounded));
        assert_eq!(result.patient.welfare, Some(0.0));
        assert_eq!(result.patient.out_of_pocket_cost, None);
    }
}
