//! Pursuit-withdrawal cycle detection for two-person dynamics.
//!
//! A month is flagged when one side opens nearly every session while the
//! other side's responses slow well past their own baseline. Consecutive
//! flagged months with the same roles form a cycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::accumulate::{AccumulatorSet, PersonAccumulator};
use crate::config::{PURSUIT_INITIATION_SHARE, WITHDRAWAL_RESPONSE_FACTOR};
use crate::stats;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PursuitCycle {
    pub pursuer: String,
    pub withdrawer: String,
    /// `YYYY-MM` of the first flagged month.
    pub start_month: String,
    pub end_month: String,
    pub months: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PursuitStats {
    pub cycles: Vec<PursuitCycle>,
    /// Months flagged over months active, 0-1.
    pub flagged_share: f64,
}

pub fn derive(acc: &AccumulatorSet) -> Option<PursuitStats> {
    let ranked = acc.by_activity();
    if ranked.len() < 2 {
        return None;
    }
    let (a, b) = (ranked[0], ranked[1]);

    let a_baseline = stats::median(&a.response_times_ms)?;
    let b_baseline = stats::median(&b.response_times_ms)?;

    let months: BTreeSet<String> = a
        .monthly_messages
        .keys()
        .chain(b.monthly_messages.keys())
        .cloned()
        .collect();
    if months.is_empty() {
        return None;
    }

    // For each month: Some((pursuer, withdrawer)) or None.
    let mut flags: Vec<(String, Option<(String, String)>)> = Vec::new();
    for month in &months {
        let a_push = pursues(a, b, month, b_baseline);
        let b_push = pursues(b, a, month, a_baseline);
        let roles = match (a_push, b_push) {
            (true, false) => Some((a.name.clone(), b.name.clone())),
            (false, true) => Some((b.name.clone(), a.name.clone())),
            // Both or neither pushing is not a pursuit dynamic.
            _ => None,
        };
        flags.push((month.clone(), roles));
    }

    let mut cycles: Vec<PursuitCycle> = Vec::new();
    let mut current: Option<PursuitCycle> = None;
    for (month, roles) in &flags {
        match roles {
            Some((pursuer, withdrawer)) => {
                match current.as_mut() {
                    Some(cycle) if &cycle.pursuer == pursuer => {
                        cycle.end_month = month.clone();
                        cycle.months += 1;
                    }
                    _ => {
                        if let Some(done) = current.take() {
                            cycles.push(done);
                        }
                        current = Some(PursuitCycle {
                            pursuer: pursuer.clone(),
                            withdrawer: withdrawer.clone(),
                            start_month: month.clone(),
                            end_month: month.clone(),
                            months: 1,
                        });
                    }
                }
            }
            None => {
                if let Some(done) = current.take() {
                    cycles.push(done);
                }
            }
        }
    }
    if let Some(done) = current.take() {
        cycles.push(done);
    }

    let flagged = flags.iter().filter(|(_, r)| r.is_some()).count();
    Some(PursuitStats {
        cycles,
        flagged_share: flagged as f64 / months.len() as f64,
    })
}

/// Does `pursuer` chase `withdrawer` in this month: dominant initiation
/// share while the withdrawer's monthly median response sits well above
/// their own overall baseline.
fn pursues(
    pursuer: &PersonAccumulator,
    withdrawer: &PersonAccumulator,
    month: &str,
    withdrawer_baseline_ms: f64,
) -> bool {
    let pursuer_inits = pursuer.monthly_initiations.get(month).copied().unwrap_or(0);
    let withdrawer_inits = withdrawer
        .monthly_initiations
        .get(month)
        .copied()
        .unwrap_or(0);
    let total = pursuer_inits + withdrawer_inits;
    if total == 0 {
        return false;
    }
    let share = pursuer_inits as f64 / total as f64;
    if share < PURSUIT_INITIATION_SHARE {
        return false;
    }

    let withdrawer_monthly = match withdrawer
        .monthly_response_ms
        .get(month)
        .and_then(|samples| stats::median(samples))
    {
        Some(m) => m,
        None => return false,
    };
    withdrawer_baseline_ms > 0.0
        && withdrawer_monthly >= WITHDRAWAL_RESPONSE_FACTOR * withdrawer_baseline_ms
}
