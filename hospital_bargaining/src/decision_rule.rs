use crate::config::BargainingConfig;
use crate::{Hospital, InsuranceCompany};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// Acceptance predicate for one offer/counteroffer exchange
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceRule {
    pub acceptance_ratio: f64,
    pub min_quality: f64,
}

impl AcceptanceRule {
    pub fn from_config(config: &BargainingConfig) -> Self {
        AcceptanceRule {
            acceptance_ratio: config.acceptance_ratio,
            min_quality: config.min_quality,
        }
    }

    /// Accept iff the counter is close enough to the offer, the hospital is
    /// good enough and the insurer still has clients to place.
    pub fn decide(
        &self,
        offer: f64,
        counteroffer: f64,
        hospital: &Hospital,
        insurer: &InsuranceCompany,
    ) -> Verdict {
        if offer * self.acceptance_ratio <= counteroffer
            && hospital.quality >= self.min_quality
            && insurer.client_count > 0
        {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}

impl Default for AcceptanceRule {
    fn default() -> Self {
        Self::from_config(&BargainingConfig::default())
    }
}
