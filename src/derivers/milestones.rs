//! Calendar-year summaries and ordinal message milestones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrono::Datelike;

use crate::config::AnalysisConfig;
use crate::core::time;
use crate::core::ParsedConversation;

const ORDINALS: &[usize] = &[1_000, 10_000, 100_000];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    pub messages: usize,
    /// `YYYY-MM` of the busiest month in this year.
    pub peak_month: String,
    pub first_message_ms: i64,
    pub last_message_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrdinalMilestone {
    /// The Nth counted message (1-based).
    pub ordinal: usize,
    pub timestamp_ms: i64,
    pub sender: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MilestoneStats {
    pub years: Vec<YearSummary>,
    pub ordinals: Vec<OrdinalMilestone>,
}

pub fn derive(conversation: &ParsedConversation, config: &AnalysisConfig) -> Option<MilestoneStats> {
    let offset = time::local_offset(config.utc_offset_minutes);

    let mut by_year: BTreeMap<i32, YearBuilder> = BTreeMap::new();
    let mut ordinals = Vec::new();
    let mut counted = 0usize;

    for message in conversation.counted_messages() {
        counted += 1;
        if ORDINALS.contains(&counted) {
            ordinals.push(OrdinalMilestone {
                ordinal: counted,
                timestamp_ms: message.timestamp_ms,
                sender: message.sender.clone(),
            });
        }

        let local = time::local_datetime(message.timestamp_ms, offset);
        let month = time::month_key(message.timestamp_ms, offset);
        let year = by_year.entry(local.year()).or_insert_with(|| YearBuilder {
            first_ms: message.timestamp_ms,
            last_ms: message.timestamp_ms,
            months: BTreeMap::new(),
            total: 0,
        });
        year.total += 1;
        year.last_ms = message.timestamp_ms;
        *year.months.entry(month).or_insert(0) += 1;
    }

    if counted == 0 {
        return None;
    }

    let years = by_year
        .into_iter()
        .map(|(year, builder)| {
            let peak_month = builder
                .months
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(month, _)| month.clone())
                .unwrap_or_default();
            YearSummary {
                year,
                messages: builder.total,
                peak_month,
                first_message_ms: builder.first_ms,
                last_message_ms: builder.last_ms,
            }
        })
        .collect();

    Some(MilestoneStats { years, ordinals })
}

struct YearBuilder {
    first_ms: i64,
    last_ms: i64,
    months: BTreeMap<String, usize>,
    total: usize,
}
