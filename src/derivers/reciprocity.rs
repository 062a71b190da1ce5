//! Reciprocity index: how evenly the two most active participants carry the
//! conversation.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;
use crate::stats;

const MESSAGE_WEIGHT: f64 = 40.0;
const INITIATION_WEIGHT: f64 = 30.0;
const RESPONSE_WEIGHT: f64 = 30.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReciprocityStats {
    pub a: String,
    pub b: String,
    /// 0-100; 100 means perfectly even.
    pub index: f64,
    pub message_balance: f64,
    pub initiation_balance: f64,
    pub response_balance: f64,
}

pub fn derive(acc: &AccumulatorSet) -> Option<ReciprocityStats> {
    let ranked = acc.by_activity();
    if ranked.len() < 2 {
        return None;
    }
    let (a, b) = (ranked[0], ranked[1]);
    if a.total_messages == 0 || b.total_messages == 0 {
        return None;
    }

    let message_balance = stats::balance(a.total_messages as f64, b.total_messages as f64);
    let initiation_balance = if a.initiations + b.initiations == 0 {
        // Nobody ever initiated: a single unbroken session, call it even.
        1.0
    } else {
        stats::balance(a.initiations as f64, b.initiations as f64)
    };
    let response_balance = match (
        stats::median(&a.response_times_ms),
        stats::median(&b.response_times_ms),
    ) {
        (Some(ma), Some(mb)) => stats::balance(ma, mb),
        _ => return None,
    };

    let index = (message_balance * MESSAGE_WEIGHT
        + initiation_balance * INITIATION_WEIGHT
        + response_balance * RESPONSE_WEIGHT)
        .clamp(0.0, 100.0);

    Some(ReciprocityStats {
        a: a.name.clone(),
        b: b.name.clone(),
        index,
        message_balance,
        initiation_balance,
        response_balance,
    })
}
