use crate::{Decision, Event, MarketStats, Stats, WaitTime};
use des::{Agent, Response};

/// Tallies negotiation outcomes as they are broadcast
pub struct OutcomeCollector {
    stats: MarketStats,
}

impl OutcomeCollector {
    pub fn new() -> Self {
        OutcomeCollector {
            stats: MarketStats::default(),
        }
    }

    fn record(
        &mut self,
        decision: Decision,
        round_count: usize,
        wait_time: Option<WaitTime>,
        welfare: Option<f64>,
    ) {
        self.stats.patients_arrived += 1;
        *self.stats.decision_counts.entry(decision).or_insert(0) += 1;
        *self.stats.round_totals.entry(decision).or_insert(0) += round_count;

        match wait_time {
            Some(WaitTime::Finite(w)) => {
                self.stats.finite_wait_total += w;
                self.stats.finite_wait_count += 1;
            }
            Some(WaitTime::Unbounded) => self.stats.unbounded_waits += 1,
            None => {}
        }

        // Accepted deals on the last bed carry -inf welfare
        if let Some(w) = welfare.filter(|w| w.is_finite()) {
            self.stats.welfare_total += w;
            self.stats.welfare_count += 1;
        }
    }
}

impl Default for OutcomeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent<Event, Stats> for OutcomeCollector {
    fn act(&mut self, _current_t: usize, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::NegotiationConcluded {
                decision,
                round_count,
                wait_time,
                welfare,
                ..
            } => self.record(*decision, *round_count, *wait_time, *welfare),
            Event::PatientSkipped { .. } => {
                self.stats.patients_arrived += 1;
                self.stats.patients_skipped += 1;
            }
            Event::PatientArrived { .. } => {}
        }
        Response::new()
    }

    fn stats(&self) -> Stats {
        Stats::Outcomes(self.stats.clone())
    }
}
