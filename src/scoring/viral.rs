//! Shareable composite scores: interest, ghost risk, compatibility,
//! delusion. Bounded 0-100, built from already-derived bundles with fixed
//! weights. Heuristic summary material, not diagnostics.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;
use crate::config::AnalysisConfig;
use crate::derivers::heatmap::HeatmapStats;
use crate::derivers::timing::TimingStats;
use crate::derivers::trends::{TrendDirection, TrendStats};
use crate::stats;

/// Minimum messages per person before any viral score is computed.
const MIN_MESSAGES_PER_PERSON: usize = 30;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreFactor {
    pub label: String,
    /// Contribution in points, already weighted.
    pub points: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InterestScore {
    pub name: String,
    pub score: f64,
    pub factors: Vec<ScoreFactor>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GhostRiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GhostRisk {
    pub name: String,
    pub score: f64,
    pub level: GhostRiskLevel,
    pub factors: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityScore {
    pub score: f64,
    pub activity_overlap: f64,
    pub response_symmetry: f64,
    pub engagement_balance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DelusionScore {
    /// Magnitude of the interest mismatch, 0-100.
    pub score: f64,
    /// The person carrying the larger interest in the other.
    pub delusion_holder: String,
    pub verdict: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViralScores {
    pub interest: Vec<InterestScore>,
    pub ghost_risk: Vec<GhostRisk>,
    pub compatibility: Option<CompatibilityScore>,
    pub delusion: Option<DelusionScore>,
}

pub fn derive(
    acc: &AccumulatorSet,
    trends: Option<&TrendStats>,
    timing: Option<&TimingStats>,
    heatmap: Option<&HeatmapStats>,
    config: &AnalysisConfig,
) -> Option<ViralScores> {
    let qualified: Vec<&crate::accumulate::PersonAccumulator> = acc
        .by_activity()
        .into_iter()
        .filter(|p| p.total_messages >= MIN_MESSAGES_PER_PERSON)
        .take(2)
        .collect();
    if qualified.len() < 2 {
        return None;
    }
    let (a, b) = (qualified[0], qualified[1]);
    let total_initiations = a.initiations + b.initiations;

    let interest: Vec<InterestScore> = [a, b]
        .into_iter()
        .map(|person| interest_score(person, total_initiations, trends, config))
        .collect();

    let ghost_risk: Vec<GhostRisk> = [a, b]
        .into_iter()
        .map(|person| ghost_risk(&person.name, trends, config))
        .collect();

    let compatibility = compatibility(a, b, timing, heatmap, config);
    let delusion = delusion(&interest);

    Some(ViralScores {
        interest,
        ghost_risk,
        compatibility,
        delusion,
    })
}

fn interest_score(
    person: &crate::accumulate::PersonAccumulator,
    total_initiations: usize,
    trends: Option<&TrendStats>,
    config: &AnalysisConfig,
) -> InterestScore {
    let weights = &config.viral;

    let initiation_share = if total_initiations == 0 {
        0.5
    } else {
        person.initiations as f64 / total_initiations as f64
    };
    let initiation_points = initiation_share * weights.interest_initiation;

    let person_trends = trends.and_then(|t| t.person(&person.name));
    // Faster responses over time read as growing interest.
    let response_points = match person_trends.map(|t| t.response_direction) {
        Some(TrendDirection::Falling) => weights.interest_response_trend,
        Some(TrendDirection::Stable) | None => weights.interest_response_trend * 0.5,
        Some(TrendDirection::Rising) => 0.0,
    };
    let length_points = match person_trends.map(|t| t.length_direction) {
        Some(TrendDirection::Rising) => weights.interest_length_trend,
        Some(TrendDirection::Stable) | None => weights.interest_length_trend * 0.5,
        Some(TrendDirection::Falling) => 0.0,
    };

    InterestScore {
        name: person.name.clone(),
        score: (initiation_points + response_points + length_points).clamp(0.0, 100.0),
        factors: vec![
            ScoreFactor {
                label: "initiation share".to_string(),
                points: initiation_points,
            },
            ScoreFactor {
                label: "response-speed trend".to_string(),
                points: response_points,
            },
            ScoreFactor {
                label: "message-length trend".to_string(),
                points: length_points,
            },
        ],
    }
}

fn ghost_risk(name: &str, trends: Option<&TrendStats>, config: &AnalysisConfig) -> GhostRisk {
    let weights = &config.viral;
    let mut score = 0.0;
    let mut factors = Vec::new();

    if let Some(person) = trends.and_then(|t| t.person(name)) {
        if person.response_direction == TrendDirection::Rising {
            score += weights.ghost_rising_response;
            factors.push("response times are climbing month over month".to_string());
        }
        if person.length_direction == TrendDirection::Falling {
            score += weights.ghost_declining_length;
            factors.push("messages are getting shorter".to_string());
        }
        if person.initiation_direction == TrendDirection::Falling {
            score += weights.ghost_declining_initiation;
            factors.push("starts fewer conversations than before".to_string());
        }
    }

    let score = score.clamp(0.0, 100.0);
    GhostRisk {
        name: name.to_string(),
        score,
        level: ghost_level(score),
        factors,
    }
}

fn ghost_level(score: f64) -> GhostRiskLevel {
    if score >= 85.0 {
        GhostRiskLevel::Severe
    } else if score >= 60.0 {
        GhostRiskLevel::High
    } else if score >= 30.0 {
        GhostRiskLevel::Moderate
    } else {
        GhostRiskLevel::Low
    }
}

fn compatibility(
    a: &crate::accumulate::PersonAccumulator,
    b: &crate::accumulate::PersonAccumulator,
    timing: Option<&TimingStats>,
    heatmap: Option<&HeatmapStats>,
    config: &AnalysisConfig,
) -> Option<CompatibilityScore> {
    let weights = &config.viral;

    let activity_overlap = heatmap.map(|h| {
        let grid_a = h
            .per_person
            .iter()
            .find(|p| p.name == a.name)
            .map(|p| flatten(&p.grid));
        let grid_b = h
            .per_person
            .iter()
            .find(|p| p.name == b.name)
            .map(|p| flatten(&p.grid));
        match (grid_a, grid_b) {
            (Some(ga), Some(gb)) => stats::cosine_similarity(&ga, &gb),
            _ => 0.0,
        }
    })?;

    let timing = timing?;
    let (median_a, median_b) = match (timing.person(&a.name), timing.person(&b.name)) {
        (Some(ta), Some(tb)) => (ta.median_ms, tb.median_ms),
        _ => return None,
    };
    let response_symmetry = stats::balance(median_a, median_b);
    let engagement_balance = stats::balance(a.total_messages as f64, b.total_messages as f64);

    let score = (activity_overlap * weights.compat_activity_overlap
        + response_symmetry * weights.compat_response_symmetry
        + engagement_balance * weights.compat_engagement_balance)
        .clamp(0.0, 100.0);

    Some(CompatibilityScore {
        score,
        activity_overlap,
        response_symmetry,
        engagement_balance,
    })
}

fn flatten(grid: &[[u32; 24]; 7]) -> Vec<f64> {
    grid.iter()
        .flat_map(|row| row.iter().map(|&c| c as f64))
        .collect()
}

fn delusion(interest: &[InterestScore]) -> Option<DelusionScore> {
    if interest.len() < 2 {
        return None;
    }
    let (a, b) = (&interest[0], &interest[1]);
    let gap = (a.score - b.score).abs();
    let holder = if a.score >= b.score { &a.name } else { &b.name };

    let verdict = if gap < 10.0 {
        "interest levels are evenly matched".to_string()
    } else if gap < 25.0 {
        format!("{holder} is slightly more invested")
    } else if gap < 45.0 {
        format!("{holder} is doing most of the wanting here")
    } else {
        format!("{holder} may be reading a different relationship than the other side")
    };

    Some(DelusionScore {
        score: (gap * 2.0).clamp(0.0, 100.0),
        delusion_holder: holder.clone(),
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;
    use crate::derivers::{heatmap as heatmap_deriver, timing as timing_deriver, trends as trends_deriver};

    fn person(name: &str, messages: usize, initiations: usize) -> PersonAccumulator {
        let mut p = PersonAccumulator::default();
        p.name = name.to_string();
        p.total_messages = messages;
        p.initiations = initiations;
        p.response_times_ms = vec![60_000.0; 30];
        p.monthly_response_ms
            .insert("2024-01".to_string(), vec![60_000.0; 15]);
        p.monthly_response_ms
            .insert("2024-02".to_string(), vec![60_000.0; 15]);
        p.monthly_lengths
            .insert("2024-01".to_string(), vec![8.0; 15]);
        p.monthly_lengths
            .insert("2024-02".to_string(), vec![8.0; 15]);
        p.heatmap[2][20] = messages as u32;
        p.hour_histogram[20] = messages as u32;
        p
    }

    fn acc_for(a: PersonAccumulator, b: PersonAccumulator) -> AccumulatorSet {
        let mut acc = AccumulatorSet::default();
        acc.total_counted = a.total_messages + b.total_messages;
        acc.combined_heatmap[2][20] = acc.total_counted as u32;
        acc.persons.insert(a.name.clone(), a);
        acc.persons.insert(b.name.clone(), b);
        acc.total_sessions = 1;
        acc.session_lengths = vec![acc.total_counted as u32];
        acc
    }

    #[test]
    fn lopsided_initiations_split_interest_scores() {
        let acc = acc_for(person("A", 100, 18), person("B", 100, 2));
        let config = AnalysisConfig::default();
        let trends = trends_deriver::derive(&acc, &config);
        let timing = timing_deriver::derive(&acc, &config);
        let heatmap = heatmap_deriver::derive(&acc);
        let scores = derive(&acc, trends.as_ref(), timing.as_ref(), heatmap.as_ref(), &config).unwrap();

        let a = scores.interest.iter().find(|s| s.name == "A").unwrap();
        let b = scores.interest.iter().find(|s| s.name == "B").unwrap();
        assert!(a.score > b.score);

        let delusion = scores.delusion.unwrap();
        assert_eq!(delusion.delusion_holder, "A");
        assert!(delusion.score > 0.0);
    }

    #[test]
    fn identical_twins_are_highly_compatible() {
        let acc = acc_for(person("A", 100, 10), person("B", 100, 10));
        let config = AnalysisConfig::default();
        let trends = trends_deriver::derive(&acc, &config);
        let timing = timing_deriver::derive(&acc, &config);
        let heatmap = heatmap_deriver::derive(&acc);
        let scores = derive(&acc, trends.as_ref(), timing.as_ref(), heatmap.as_ref(), &config).unwrap();

        let compat = scores.compatibility.unwrap();
        assert!(compat.score > 95.0);
        assert!((compat.activity_overlap - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sparse_conversations_get_no_viral_scores() {
        let acc = acc_for(person("A", 10, 2), person("B", 10, 1));
        let config = AnalysisConfig::default();
        assert!(derive(&acc, None, None, None, &config).is_none());
    }

    #[test]
    fn stable_trends_mean_low_ghost_risk() {
        let acc = acc_for(person("A", 100, 10), person("B", 100, 10));
        let config = AnalysisConfig::default();
        let trends = trends_deriver::derive(&acc, &config);
        let scores = derive(&acc, trends.as_ref(), None, None, &config);
        // Compatibility needs timing+heatmap, but ghost risk still computes.
        let scores = scores.unwrap();
        assert!(scores.ghost_risk.iter().all(|g| g.level == GhostRiskLevel::Low));
        assert!(scores.compatibility.is_none());
    }
}
