//! Summary statistics over the dispatched patient table
//!
//! Waits and welfare values can be unbounded (a deal on a hospital's last bed
//! leaves an infinite wait and `-inf` welfare). Means are taken over finite
//! values only, and unbounded waits are counted separately.

use crate::{Decision, MarketSnapshot, Patient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregates for one group of patients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub patients: usize,
    pub mean_welfare: Option<f64>,
    pub mean_finite_wait: Option<f64>,
    pub unbounded_waits: usize,
}

/// Per-hospital aggregates with the hospital's quality and remaining beds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalSummary {
    pub hospital: usize,
    pub quality: f64,
    pub capacity: u32,
    pub patients: usize,
    pub mean_welfare: Option<f64>,
    pub mean_finite_wait: Option<f64>,
    pub unbounded_waits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub dispatched: usize,
    pub decision_counts: BTreeMap<String, usize>,
    pub mean_finite_wait: Option<f64>,
    pub unbounded_waits: usize,
    pub mean_welfare: Option<f64>,
    pub mean_rounds_by_decision: BTreeMap<String, f64>,
    pub by_insurer: Vec<GroupSummary>,
    pub by_coverage: Vec<GroupSummary>,
    /// Keyed by whole quality points, e.g. "7" covers [7, 8)
    pub by_quality: Vec<GroupSummary>,
    pub by_hospital: Vec<HospitalSummary>,
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    patients: usize,
    welfare_total: f64,
    welfare_count: usize,
    wait_total: f64,
    wait_count: usize,
    unbounded_waits: usize,
}

impl Accumulator {
    fn add(&mut self, patient: &Patient) {
        self.patients += 1;
        if let Some(w) = patient.welfare.filter(|w| w.is_finite()) {
            self.welfare_total += w;
            self.welfare_count += 1;
        }
        match patient.wait_time.map(|w| w.finite()) {
            Some(Some(w)) => {
                self.wait_total += w;
                self.wait_count += 1;
            }
            Some(None) => self.unbounded_waits += 1,
            None => {}
        }
    }

    fn mean_welfare(&self) -> Option<f64> {
        mean(self.welfare_total, self.welfare_count)
    }

    fn mean_wait(&self) -> Option<f64> {
        mean(self.wait_total, self.wait_count)
    }

    fn into_group(self, key: String) -> GroupSummary {
        GroupSummary {
            key,
            patients: self.patients,
            mean_welfare: self.mean_welfare(),
            mean_finite_wait: self.mean_wait(),
            unbounded_waits: self.unbounded_waits,
        }
    }
}

fn mean(total: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

fn accumulate<K, F>(snapshot: &MarketSnapshot, key: F) -> BTreeMap<K, Accumulator>
where
    K: Ord,
    F: Fn(&Patient) -> Option<K>,
{
    let mut groups: BTreeMap<K, Accumulator> = BTreeMap::new();
    for (_, patient) in snapshot.dispatched_patients() {
        if let Some(k) = key(patient) {
            groups.entry(k).or_default().add(patient);
        }
    }
    groups
}

fn grouped<K, F>(snapshot: &MarketSnapshot, key: F) -> Vec<GroupSummary>
where
    K: Ord + ToString,
    F: Fn(&Patient) -> Option<K>,
{
    accumulate(snapshot, key)
        .into_iter()
        .map(|(k, acc)| acc.into_group(k.to_string()))
        .collect()
}

impl SummaryReport {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let mut overall = Accumulator::default();
        let mut decision_counts = BTreeMap::new();
        let mut round_totals: BTreeMap<Decision, (usize, usize)> = BTreeMap::new();

        for (_, patient) in snapshot.dispatched_patients() {
            overall.add(patient);
            *decision_counts
                .entry(patient.decision.label().to_string())
                .or_insert(0) += 1;
            let entry = round_totals.entry(patient.decision).or_insert((0, 0));
            entry.0 += patient.round_count;
            entry.1 += 1;
        }

        let mean_rounds_by_decision = round_totals
            .into_iter()
            .map(|(d, (total, n))| (d.label().to_string(), total as f64 / n as f64))
            .collect();

        let by_insurer = grouped(snapshot, |p| Some(p.insurance_company.0));
        let by_quality = grouped(snapshot, |p| {
            snapshot
                .hospitals
                .get(p.preferred_hospital.0)
                .map(|h| h.quality.floor() as i64)
        });
        let by_hospital = accumulate(snapshot, |p| Some(p.preferred_hospital.0))
            .into_iter()
            .filter_map(|(id, acc)| {
                snapshot.hospitals.get(id).map(|h| HospitalSummary {
                    hospital: id,
                    quality: h.quality,
                    capacity: h.capacity,
                    patients: acc.patients,
                    mean_welfare: acc.mean_welfare(),
                    mean_finite_wait: acc.mean_wait(),
                    unbounded_waits: acc.unbounded_waits,
                })
            })
            .collect();
        let by_coverage = grouped(snapshot, |p| {
            snapshot
                .insurers
                .get(p.insurance_company.0)
                .map(|i| if i.c_section_coverage { "Yes" } else { "No" })
        });

        SummaryReport {
            dispatched: overall.patients,
            decision_counts,
            mean_finite_wait: overall.mean_wait(),
            unbounded_waits: overall.unbounded_waits,
            mean_welfare: overall.mean_welfare(),
            mean_rounds_by_decision,
            by_insurer,
            by_coverage,
            by_quality,
            by_hospital,
        }
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.decision_counts
            .get(decision.label())
            .copied()
            .unwrap_or(0)
    }

    pub fn print(&self) {
        println!("Dispatched patients: {}", self.dispatched);
        println!("Count of decisions:");
        for (decision, count) in &self.decision_counts {
            println!("  {:<14} {}", decision, count);
        }
        println!(
            "Average finite wait time: {} ({} unbounded)",
            fmt_opt(self.mean_finite_wait),
            self.unbounded_waits
        );
        println!("Average welfare: {}", fmt_opt(self.mean_welfare));

        println!("\nAverage round count by decision:");
        for (decision, rounds) in &self.mean_rounds_by_decision {
            println!("  {:<14} {:.2}", decision, rounds);
        }

        println!("\nBy insurance company:");
        print_groups(&self.by_insurer);
        println!("\nBy C-section coverage:");
        print_groups(&self.by_coverage);
        println!("\nBy hospital quality:");
        print_groups(&self.by_quality);

        println!("\nBy hospital:");
        println!(
            "  {:<6} {:>7} {:>8} {:>8} {:>12} {:>12} {:>10}",
            "id", "quality", "capacity", "patients", "welfare", "wait", "unbounded"
        );
        for h in &self.by_hospital {
            println!(
                "  {:<6} {:>7.2} {:>8} {:>8} {:>12} {:>12} {:>10}",
                h.hospital,
                h.quality,
                h.capacity,
                h.patients,
                fmt_opt(h.mean_welfare),
                fmt_opt(h.mean_finite_wait),
                h.unbounded_waits
            );
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn print_groups(groups: &[GroupSummary]) {
    println!(
        "  {:<6} {:>8} {:>12} {:>12} {:>10}",
        "key", "patients", "welfare", "wait", "unbounded"
    );
    for g in groups {
        println!(
            "  {:<6} {:>8} {:>12} {:>12} {:>10}",
            g.key,
            g.patients,
            fmt_opt(g.mean_welfare),
            fmt_opt(g.mean_finite_wait),
            g.unbounded_waits
        );
    }
}
