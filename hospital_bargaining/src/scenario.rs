use des::{Agent, EventLoop};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ModelConfig;
use crate::entity_pool::EntityPool;
use crate::error::Error;
use crate::market_coordinator::MarketCoordinator;
use crate::negotiation::{NashBargaining, Negotiator};
use crate::outcome_collector::OutcomeCollector;
use crate::{Event, MarketSnapshot, MarketStats, Stats};

/// Offset between the market-generation seed and the negotiation seed
const NEGOTIATION_SEED_OFFSET: u64 = 1000;

/// Final state of one simulated market
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub seed: u64,
    pub snapshot: MarketSnapshot,
    pub stats: MarketStats,
}

/// Generate a market from `config` and run every patient through it
pub fn run(config: &ModelConfig, seed: u64) -> Result<SimulationRun, Error> {
    let mut setup_rng = StdRng::seed_from_u64(seed);
    let pool = EntityPool::generate(config, &mut setup_rng)?;
    let negotiator = NashBargaining::new(
        &config.bargaining,
        seed.wrapping_add(NEGOTIATION_SEED_OFFSET),
    )?;

    Ok(run_pool(pool, negotiator, seed))
}

/// Run a prepared pool through the event loop with the given negotiator.
/// `seed` is recorded on the result as the run's label.
pub fn run_pool<N: Negotiator + 'static>(
    pool: EntityPool,
    negotiator: N,
    seed: u64,
) -> SimulationRun {
    let coordinator = MarketCoordinator::new(pool, negotiator);
    let arrivals = coordinator.arrivals();
    let horizon = arrivals.len();

    let agents: Vec<Box<dyn Agent<Event, Stats>>> =
        vec![Box::new(coordinator), Box::new(OutcomeCollector::new())];
    let mut event_loop: EventLoop<Event, Stats> = EventLoop::new(arrivals, agents);

    log::info!("running {} patient arrivals", horizon);
    event_loop.run(horizon);

    let mut snapshot = MarketSnapshot::default();
    let mut stats = MarketStats::default();
    for agent_stats in event_loop.stats() {
        match agent_stats {
            Stats::Market(s) => snapshot = s,
            Stats::Outcomes(s) => stats = s,
        }
    }

    log::info!(
        "run complete: {} dispatched, {} accepted",
        stats.dispatched(),
        stats.count(crate::Decision::Accept)
    );

    SimulationRun {
        seed,
        snapshot,
        stats,
    }
}
