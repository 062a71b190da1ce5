//! 7x24 activity heatmaps (day-of-week x hour-of-day, Monday first), per
//! person and combined.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonHeatmap {
    pub name: String,
    pub grid: [[u32; 24]; 7],
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HeatmapStats {
    pub per_person: Vec<PersonHeatmap>,
    pub combined: [[u32; 24]; 7],
    /// (weekday, hour) of the busiest combined cell.
    pub peak_cell: (usize, usize),
}

pub fn derive(acc: &AccumulatorSet) -> Option<HeatmapStats> {
    if acc.total_counted == 0 {
        return None;
    }

    let per_person = acc
        .by_activity()
        .into_iter()
        .map(|person| PersonHeatmap {
            name: person.name.clone(),
            grid: person.heatmap,
        })
        .collect();

    let mut peak_cell = (0usize, 0usize);
    let mut peak = 0u32;
    for (day, row) in acc.combined_heatmap.iter().enumerate() {
        for (hour, &count) in row.iter().enumerate() {
            if count > peak {
                peak = count;
                peak_cell = (day, hour);
            }
        }
    }

    Some(HeatmapStats {
        per_person,
        combined: acc.combined_heatmap,
        peak_cell,
    })
}
