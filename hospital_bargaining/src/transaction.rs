use crate::{Hospital, InsuranceCompany, Patient, WaitTime};

/// What the patient pays and waits for an accepted deal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub out_of_pocket_cost: f64,
    pub wait_time: WaitTime,
}

/// Settle an accepted offer.
///
/// Consumes one bed and one insurer client slot, then prices the patient's
/// share and waiting time. The wait is computed from the capacity left
/// after this patient's bed is taken, so the last bed yields an unbounded wait.
pub fn apply(
    offer: f64,
    hospital: &mut Hospital,
    insurer: &mut InsuranceCompany,
    patient: &mut Patient,
) -> Settlement {
    hospital.capacity = hospital.capacity.saturating_sub(1);
    insurer.client_count -= 1;

    let settlement = Settlement {
        out_of_pocket_cost: (offer - insurer.average_premium).max(0.0),
        wait_time: WaitTime::from_capacity(hospital.capacity),
    };
    patient.out_of_pocket_cost = Some(settlement.out_of_pocket_cost);
    patient.wait_time = Some(settlement.wait_time);
    settlement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HospitalId, InsurerId};

    fn fixtures(capacity: u32, premium: f64) -> (Hospital, InsuranceCompany, Patient) {
        (
            Hospital {
                capacity,
                quality: 8.0,
                cost_per_service: 30000.0,
                c_section_availability: true,
            },
            InsuranceCompany {
                client_count: 5,
                average_premium: premium,
                c_section_coverage: false,
            },
            Patient::new(InsurerId(0), HospitalId(0), true),
        )
    }

    #[test]
    fn test_decrements_capacity_and_clients() {
        let (mut h, mut i, mut p) = fixtures(5, 1000.0);
        apply(120.0, &mut h, &mut i, &mut p);

        assert_eq!(h.capacity, 4);
        assert_eq!(i.client_count, 4);
        assert_eq!(p.wait_time, Some(WaitTime::Finite(0.25)));
    }

    #[test]
    fn test_premium_covers_offer() {
        let (mut h, mut i, mut p) = fixtures(5, 1000.0);
        apply(120.0, &mut h, &mut i, &mut p);
        assert_eq!(p.out_of_pocket_cost, Some(0.0));
    }

    #[test]
    fn test_offer_above_premium_is_paid_by_patient() {
        let (mut h, mut i, mut p) = fixtures(5, 100.0);
        let settlement = apply(350.0, &mut h, &mut i, &mut p);
        assert_eq!(p.out_of_pocket_cost, Some(250.0));
        assert_eq!(settlement.out_of_pocket_cost, 250.0);
        assert_eq!(p.wait_time, Some(settlement.wait_time));
    }

    #[test]
    fn test_last_bed_gives_unbounded_wait() {
        let (mut h, mut i, mut p) = fixtures(1, 1000.0);
        apply(5.0, &mut h, &mut i, &mut p);

        assert_eq!(h.capacity, 0);
        assert_eq!(p.wait_time, Some(WaitTime::Unbounded));
    }

    #[test]
    fn test_does_not_touch_decision_or_welfare() {
        let (mut h, mut i, mut p) = fixtures(3, 1000.0);
        apply(5.0, &mut h, &mut i, &mut p);

        assert_eq!(p.welfare, None);
        assert!(!p.decision.is_resolved());
    }
}
