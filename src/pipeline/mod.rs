//! The analysis pipeline: one accumulation pass, then the independent
//! derivers fanned out in parallel, then the composite scorers over the
//! derived bundles.
//!
//! Every deriver is a pure function of the frozen accumulators and/or the
//! conversation, so the rayon joins below need no synchronization; the only
//! ordering constraints are accumulate-before-derivers and
//! derivers-before-scorers.

use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::accumulate::{accumulate, AccumulatorSet};
use crate::config::AnalysisConfig;
use crate::core::{ConversationMetadata, ParsedConversation, Platform};
use crate::derivers::{
    bids::BidStats, chronotype::ChronotypeStats, conflict::ConflictStats,
    distribution::DistributionStats, engagement::EngagementStats, heatmap::HeatmapStats,
    intimacy::IntimacyStats, milestones::MilestoneStats, narcissism::NarcissismStats,
    network::NetworkGraph, patterns::PatternStats, pursuit::PursuitStats,
    ranking::RankingStats, reciprocity::ReciprocityStats, sentiment::SentimentStats,
    timing::TimingStats, trends::TrendStats,
};
use crate::derivers::{
    bids, chronotype, conflict, distribution, engagement, heatmap, intimacy, milestones,
    narcissism, network, patterns, pursuit, ranking, reciprocity, sentiment, timing, trends,
};
use crate::scoring::badges::{self, BadgeSet};
use crate::scoring::viral::{self, ViralScores};

/// The write-once output record. Absent bundles mean "not enough data",
/// never zero.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuantitativeAnalysis {
    pub platform: Platform,
    pub title: String,
    pub metadata: ConversationMetadata,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<TrendStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<HeatmapStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkGraph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ConflictStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intimacy: Option<IntimacyStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bids: Option<BidStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chronotype: Option<ChronotypeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narcissism: Option<NarcissismStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_distribution: Option<DistributionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reciprocity: Option<ReciprocityStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rankings: Option<RankingStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones: Option<MilestoneStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pursuit: Option<PursuitStats>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<BadgeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viral: Option<ViralScores>,
}

/// Run the whole quantitative pipeline over a decoded conversation.
pub fn analyze(conversation: &ParsedConversation, config: &AnalysisConfig) -> QuantitativeAnalysis {
    let acc = {
        let _span = debug_span!("accumulate", messages = conversation.messages.len()).entered();
        accumulate(conversation, config)
    };
    analyze_with_accumulators(conversation, &acc, config)
}

/// Deriver + scorer stages over pre-built accumulators. Exposed separately
/// so callers that already ran the pass (or tests) can reuse it.
pub fn analyze_with_accumulators(
    conversation: &ParsedConversation,
    acc: &AccumulatorSet,
    config: &AnalysisConfig,
) -> QuantitativeAnalysis {
    let _span = debug_span!("derive", persons = acc.persons.len()).entered();

    // Independent derivers, fanned out. The nesting is just join's pairing;
    // there is no data flow between branches.
    let (
        ((timing, engagement), (patterns, trends)),
        ((heatmap, network), (sentiment, conflicts)),
    ) = rayon::join(
        || {
            rayon::join(
                || (timing::derive(acc, config), engagement::derive(acc)),
                || (patterns::derive(acc, config), trends::derive(acc, config)),
            )
        },
        || {
            rayon::join(
                || (heatmap::derive(acc), network::derive(acc)),
                || (sentiment::derive(acc), conflict::derive(acc)),
            )
        },
    );

    let (
        ((intimacy, bids), (chronotype, narcissism)),
        ((response_distribution, reciprocity), (rankings, (milestones, pursuit))),
    ) = rayon::join(
        || {
            rayon::join(
                || (intimacy::derive(acc), bids::derive(conversation, config)),
                || {
                    (
                        chronotype::derive(acc),
                        narcissism::derive(conversation, config),
                    )
                },
            )
        },
        || {
            rayon::join(
                || (distribution::derive(acc, config), reciprocity::derive(acc)),
                || {
                    (
                        ranking::derive(conversation, acc, config),
                        (
                            milestones::derive(conversation, config),
                            pursuit::derive(acc),
                        ),
                    )
                },
            )
        },
    );

    // Composite scorers read the already-derived bundles.
    let badges = engagement
        .as_ref()
        .and_then(|eng| badges::award(acc, timing.as_ref(), eng, config));
    let viral = viral::derive(acc, trends.as_ref(), timing.as_ref(), heatmap.as_ref(), config);

    log::debug!(
        "analysis complete: {} messages, {} participants, badges: {}",
        conversation.metadata.total_messages,
        acc.persons.len(),
        badges.as_ref().map(|b| b.badges.len()).unwrap_or(0)
    );

    QuantitativeAnalysis {
        platform: conversation.platform,
        title: conversation.title.clone(),
        metadata: conversation.metadata.clone(),
        timing,
        engagement,
        patterns,
        trends,
        heatmap,
        network,
        sentiment,
        conflicts,
        intimacy,
        bids,
        chronotype,
        narcissism,
        response_distribution,
        reciprocity,
        rankings,
        milestones,
        pursuit,
        badges,
        viral,
    }
}
