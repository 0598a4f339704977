//! Offer protocol
//!
//! The hospital anchors near a reference value and the insurer counters
//! downward. Both moves are multiplicative noise drawn from half-open bands.

use crate::config::{BargainingConfig, OfferBounds};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferProtocol {
    pub offer_bounds: OfferBounds,
    pub counteroffer_bounds: OfferBounds,
}

impl OfferProtocol {
    pub fn new(offer_bounds: OfferBounds, counteroffer_bounds: OfferBounds) -> Self {
        OfferProtocol {
            offer_bounds,
            counteroffer_bounds,
        }
    }

    pub fn from_config(config: &BargainingConfig) -> Self {
        Self::new(config.offer_bounds, config.counteroffer_bounds)
    }

    /// Hospital offer: `reference * U`, `U ~ [offer.low, offer.high)`
    pub fn make_offer<R: Rng + ?Sized>(&self, reference: f64, rng: &mut R) -> f64 {
        reference * perturbation(&self.offer_bounds, rng)
    }

    /// Insurer counteroffer: `offer * U'`, `U' ~ [counter.low, counter.high)`
    pub fn make_counteroffer<R: Rng + ?Sized>(&self, offer: f64, rng: &mut R) -> f64 {
        offer * perturbation(&self.counteroffer_bounds, rng)
    }
}

impl Default for OfferProtocol {
    fn default() -> Self {
        Self::from_config(&BargainingConfig::default())
    }
}

fn perturbation<R: Rng + ?Sized>(bounds: &OfferBounds, rng: &mut R) -> f64 {
    rng.gen_range(bounds.low..bounds.high)
}
