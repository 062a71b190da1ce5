//! Central configuration for every heuristic threshold in the pipeline.
//!
//! The dismissal-token and disclosure-opener lists, session-gap hours, bid
//! windows, badge cutoffs, and composite-score weights all live here so the
//! exact numbers are auditable and shared with the tests. Several constants
//! are empirically chosen rather than derived; they are configuration, not
//! law.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::core::time::{MS_PER_HOUR, MS_PER_MINUTE};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Offset applied when bucketing timestamps by hour/weekday/month.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub bids: BidConfig,

    #[serde(default)]
    pub badges: BadgeThresholds,

    #[serde(default)]
    pub viral: ViralWeights,

    #[serde(default)]
    pub lexicons: Lexicons,

    #[serde(default)]
    pub rankings: RankingReferences,
}

impl AnalysisConfig {
    /// Validate every threshold group, reporting the first violation.
    pub fn validate(&self) -> Result<(), String> {
        self.session.validate()?;
        self.timing.validate()?;
        self.bids.validate()?;
        self.viral.validate()?;
        Ok(())
    }
}

/// Session and daily-rhythm thresholds (§accumulation pass).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Gap that closes a session and marks a new initiation.
    #[serde(default = "default_session_gap_ms")]
    pub session_gap_ms: i64,

    /// Late-night window start hour, inclusive.
    #[serde(default = "default_late_night_start")]
    pub late_night_start_hour: u32,

    /// Late-night window end hour, exclusive.
    #[serde(default = "default_late_night_end")]
    pub late_night_end_hour: u32,

    /// Trailing window for the burst-detection daily baseline.
    #[serde(default = "default_burst_trailing_days")]
    pub burst_trailing_days: i64,

    /// A day is a burst when its count exceeds this multiple of the baseline.
    #[serde(default = "default_burst_factor")]
    pub burst_factor: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_gap_ms: default_session_gap_ms(),
            late_night_start_hour: default_late_night_start(),
            late_night_end_hour: default_late_night_end(),
            burst_trailing_days: default_burst_trailing_days(),
            burst_factor: default_burst_factor(),
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.session_gap_ms <= 0 {
            return Err("session_gap_ms must be positive".to_string());
        }
        if self.late_night_start_hour > 23 || self.late_night_end_hour > 23 {
            return Err("late-night hours must be within 0-23".to_string());
        }
        if self.burst_factor <= 1.0 {
            return Err("burst_factor must exceed 1.0".to_string());
        }
        Ok(())
    }

    /// Whether a local hour falls inside the late-night window, which wraps
    /// midnight (default [22:00, 04:00)).
    pub fn is_late_night(&self, hour: u32) -> bool {
        if self.late_night_start_hour <= self.late_night_end_hour {
            (self.late_night_start_hour..self.late_night_end_hour).contains(&hour)
        } else {
            hour >= self.late_night_start_hour || hour < self.late_night_end_hour
        }
    }
}

fn default_session_gap_ms() -> i64 {
    6 * MS_PER_HOUR
}

fn default_late_night_start() -> u32 {
    22
}

fn default_late_night_end() -> u32 {
    4
}

fn default_burst_trailing_days() -> i64 {
    14
}

fn default_burst_factor() -> f64 {
    3.0
}

/// Outlier-robust statistics parameters (§timing deriver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Distributions below this sample count carry a low-confidence flag.
    #[serde(default = "default_min_timing_samples")]
    pub min_samples: usize,

    /// Fraction trimmed from each tail for the trimmed mean.
    #[serde(default = "default_trim_fraction")]
    pub trim_fraction: f64,

    /// IQR fence multiplier for outlier removal.
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_timing_samples(),
            trim_fraction: default_trim_fraction(),
            iqr_multiplier: default_iqr_multiplier(),
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..0.5).contains(&self.trim_fraction) {
            return Err("trim_fraction must be in [0.0, 0.5)".to_string());
        }
        if self.iqr_multiplier <= 0.0 {
            return Err("iqr_multiplier must be positive".to_string());
        }
        Ok(())
    }
}

fn default_min_timing_samples() -> usize {
    5
}

fn default_trim_fraction() -> f64 {
    0.10
}

fn default_iqr_multiplier() -> f64 {
    1.5
}

/// Bid-for-connection classifier thresholds (Gottman bid/response model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidConfig {
    /// A reply later than this is a forced "turning away".
    #[serde(default = "default_bid_response_window_ms")]
    pub response_window_ms: i64,

    /// Forward-scan window counted in other-sender messages; the bidder's
    /// own double-texts do not consume it.
    #[serde(default = "default_bid_scan_window")]
    pub scan_window: usize,

    /// Persons below this bid count are left out of the per-person report.
    #[serde(default = "default_min_bids_per_person")]
    pub min_bids_per_person: usize,

    /// Below this conversation-wide total the whole metric is absent.
    #[serde(default = "default_min_total_bids")]
    pub min_total_bids: usize,

    /// A reply at least this long is a "turning toward" on length alone.
    #[serde(default = "default_bid_min_toward_len")]
    pub min_toward_len: usize,

    /// A reply shorter than this (and not a question) is a "turning away".
    #[serde(default = "default_bid_min_reply_len")]
    pub min_reply_len: usize,

    /// Gottman's observed turn-toward rate in stable relationships.
    #[serde(default = "default_gottman_benchmark")]
    pub gottman_benchmark: f64,
}

impl Default for BidConfig {
    fn default() -> Self {
        Self {
            response_window_ms: default_bid_response_window_ms(),
            scan_window: default_bid_scan_window(),
            min_bids_per_person: default_min_bids_per_person(),
            min_total_bids: default_min_total_bids(),
            min_toward_len: default_bid_min_toward_len(),
            min_reply_len: default_bid_min_reply_len(),
            gottman_benchmark: default_gottman_benchmark(),
        }
    }
}

impl BidConfig {
    fn validate(&self) -> Result<(), String> {
        if self.response_window_ms <= 0 {
            return Err("bid response_window_ms must be positive".to_string());
        }
        if self.scan_window == 0 {
            return Err("bid scan_window must be at least 1".to_string());
        }
        if !(0.0..=100.0).contains(&self.gottman_benchmark) {
            return Err("gottman_benchmark must be a percentage".to_string());
        }
        Ok(())
    }
}

fn default_bid_response_window_ms() -> i64 {
    4 * MS_PER_HOUR
}

fn default_bid_scan_window() -> usize {
    5
}

fn default_min_bids_per_person() -> usize {
    5
}

fn default_min_total_bids() -> usize {
    10
}

fn default_bid_min_toward_len() -> usize {
    20
}

fn default_bid_min_reply_len() -> usize {
    5
}

fn default_gottman_benchmark() -> f64 {
    86.0
}

/// Badge eligibility cutoffs. Each badge goes to the single top-scoring
/// eligible participant or nobody; the minimums suppress awards on sparse
/// data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeThresholds {
    #[serde(default = "default_night_owl_min_late")]
    pub night_owl_min_late_night: usize,
    #[serde(default = "default_badge_min_messages")]
    pub night_owl_min_messages: usize,
    #[serde(default = "default_night_owl_min_share")]
    pub night_owl_min_share: f64,

    #[serde(default = "default_early_bird_min_morning")]
    pub early_bird_min_morning: usize,
    #[serde(default = "default_badge_min_messages")]
    pub early_bird_min_messages: usize,
    #[serde(default = "default_early_bird_min_share")]
    pub early_bird_min_share: f64,

    #[serde(default = "default_double_text_min_runs")]
    pub double_text_min_runs: usize,

    #[serde(default = "default_badge_min_samples")]
    pub responder_min_samples: usize,
    /// Median response below this wins "Speed Demon".
    #[serde(default = "default_speed_demon_max_median_ms")]
    pub speed_demon_max_median_ms: f64,
    /// Median response above this wins "Slow Burner".
    #[serde(default = "default_slow_burner_min_median_ms")]
    pub slow_burner_min_median_ms: f64,

    #[serde(default = "default_starter_min_initiations")]
    pub starter_min_initiations: usize,
    #[serde(default = "default_starter_min_share")]
    pub starter_min_share: f64,

    #[serde(default = "default_question_min_count")]
    pub question_min_count: usize,
    #[serde(default = "default_question_min_rate")]
    pub question_min_rate: f64,

    #[serde(default = "default_emoji_min_count")]
    pub emoji_min_count: usize,
    #[serde(default = "default_emoji_min_rate")]
    pub emoji_min_rate: f64,

    #[serde(default = "default_novelist_min_words")]
    pub novelist_min_avg_words: f64,
    #[serde(default = "default_badge_min_messages")]
    pub novelist_min_messages: usize,

    #[serde(default = "default_reactor_min_given")]
    pub reactor_min_given: usize,
    #[serde(default = "default_reactor_min_rate")]
    pub reactor_min_rate: f64,
}

impl Default for BadgeThresholds {
    fn default() -> Self {
        Self {
            night_owl_min_late_night: default_night_owl_min_late(),
            night_owl_min_messages: default_badge_min_messages(),
            night_owl_min_share: default_night_owl_min_share(),
            early_bird_min_morning: default_early_bird_min_morning(),
            early_bird_min_messages: default_badge_min_messages(),
            early_bird_min_share: default_early_bird_min_share(),
            double_text_min_runs: default_double_text_min_runs(),
            responder_min_samples: default_badge_min_samples(),
            speed_demon_max_median_ms: default_speed_demon_max_median_ms(),
            slow_burner_min_median_ms: default_slow_burner_min_median_ms(),
            starter_min_initiations: default_starter_min_initiations(),
            starter_min_share: default_starter_min_share(),
            question_min_count: default_question_min_count(),
            question_min_rate: default_question_min_rate(),
            emoji_min_count: default_emoji_min_count(),
            emoji_min_rate: default_emoji_min_rate(),
            novelist_min_avg_words: default_novelist_min_words(),
            novelist_min_messages: default_badge_min_messages(),
            reactor_min_given: default_reactor_min_given(),
            reactor_min_rate: default_reactor_min_rate(),
        }
    }
}

fn default_night_owl_min_late() -> usize {
    10
}

fn default_badge_min_messages() -> usize {
    20
}

fn default_night_owl_min_share() -> f64 {
    0.15
}

fn default_early_bird_min_morning() -> usize {
    10
}

fn default_early_bird_min_share() -> f64 {
    0.15
}

fn default_double_text_min_runs() -> usize {
    10
}

fn default_badge_min_samples() -> usize {
    20
}

fn default_speed_demon_max_median_ms() -> f64 {
    60_000.0
}

fn default_slow_burner_min_median_ms() -> f64 {
    2.0 * MS_PER_HOUR as f64
}

fn default_starter_min_initiations() -> usize {
    10
}

fn default_starter_min_share() -> f64 {
    0.60
}

fn default_question_min_count() -> usize {
    20
}

fn default_question_min_rate() -> f64 {
    0.20
}

fn default_emoji_min_count() -> usize {
    30
}

fn default_emoji_min_rate() -> f64 {
    0.50
}

fn default_novelist_min_words() -> f64 {
    15.0
}

fn default_reactor_min_given() -> usize {
    20
}

fn default_reactor_min_rate() -> f64 {
    0.10
}

/// Composite "viral" score weights. Empirically chosen; tunable, each group
/// must sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViralWeights {
    #[serde(default = "default_interest_initiation_weight")]
    pub interest_initiation: f64,
    #[serde(default = "default_interest_response_weight")]
    pub interest_response_trend: f64,
    #[serde(default = "default_interest_length_weight")]
    pub interest_length_trend: f64,

    #[serde(default = "default_ghost_response_weight")]
    pub ghost_rising_response: f64,
    #[serde(default = "default_ghost_length_weight")]
    pub ghost_declining_length: f64,
    #[serde(default = "default_ghost_initiation_weight")]
    pub ghost_declining_initiation: f64,

    #[serde(default = "default_compat_overlap_weight")]
    pub compat_activity_overlap: f64,
    #[serde(default = "default_compat_symmetry_weight")]
    pub compat_response_symmetry: f64,
    #[serde(default = "default_compat_balance_weight")]
    pub compat_engagement_balance: f64,
}

impl Default for ViralWeights {
    fn default() -> Self {
        Self {
            interest_initiation: default_interest_initiation_weight(),
            interest_response_trend: default_interest_response_weight(),
            interest_length_trend: default_interest_length_weight(),
            ghost_rising_response: default_ghost_response_weight(),
            ghost_declining_length: default_ghost_length_weight(),
            ghost_declining_initiation: default_ghost_initiation_weight(),
            compat_activity_overlap: default_compat_overlap_weight(),
            compat_response_symmetry: default_compat_symmetry_weight(),
            compat_engagement_balance: default_compat_balance_weight(),
        }
    }
}

impl ViralWeights {
    fn validate(&self) -> Result<(), String> {
        let groups: &[(&str, f64)] = &[
            (
                "interest",
                self.interest_initiation + self.interest_response_trend + self.interest_length_trend,
            ),
            (
                "ghost",
                self.ghost_rising_response
                    + self.ghost_declining_length
                    + self.ghost_declining_initiation,
            ),
            (
                "compatibility",
                self.compat_activity_overlap
                    + self.compat_response_symmetry
                    + self.compat_engagement_balance,
            ),
        ];
        for (name, sum) in groups {
            if (sum - 100.0).abs() > 0.001 {
                return Err(format!("{} weights must sum to 100, got {:.3}", name, sum));
            }
        }
        Ok(())
    }
}

fn default_interest_initiation_weight() -> f64 {
    40.0
}

fn default_interest_response_weight() -> f64 {
    35.0
}

fn default_interest_length_weight() -> f64 {
    25.0
}

fn default_ghost_response_weight() -> f64 {
    40.0
}

fn default_ghost_length_weight() -> f64 {
    30.0
}

fn default_ghost_initiation_weight() -> f64 {
    30.0
}

fn default_compat_overlap_weight() -> f64 {
    40.0
}

fn default_compat_symmetry_weight() -> f64 {
    30.0
}

fn default_compat_balance_weight() -> f64 {
    30.0
}

/// Word lists used by the heuristic classifiers. Defaults cover English and
/// Polish, matching the exports the system is tuned on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicons {
    /// Openers that mark a disclosure bid ("guess what…", "słuchaj…").
    #[serde(default = "default_disclosure_openers")]
    pub disclosure_openers: Vec<String>,

    /// Tokens that mark a reply as a dismissal ("whatever", "nieważne").
    #[serde(default = "default_dismissal_tokens")]
    pub dismissal_tokens: Vec<String>,

    /// Self-referential openers used by the shift-response classifier.
    #[serde(default = "default_self_openers")]
    pub self_referential_openers: Vec<String>,

    /// Terms of endearment counted by the intimacy deriver.
    #[serde(default = "default_affection_terms")]
    pub affection_terms: Vec<String>,
}

impl Default for Lexicons {
    fn default() -> Self {
        Self {
            disclosure_openers: default_disclosure_openers(),
            dismissal_tokens: default_dismissal_tokens(),
            self_referential_openers: default_self_openers(),
            affection_terms: default_affection_terms(),
        }
    }
}

fn default_disclosure_openers() -> Vec<String> {
    [
        "guess what",
        "you know what",
        "listen",
        "i have to tell you",
        "i need to tell you",
        "did you hear",
        "słuchaj",
        "wiesz co",
        "muszę ci powiedzieć",
        "zgadnij",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_dismissal_tokens() -> Vec<String> {
    [
        "whatever", "nevermind", "never mind", "nvm", "idc", "meh", "k", "ok.", "sure.",
        "nieważne", "niewazne", "obojętnie", "wszystko jedno", "spoko.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_self_openers() -> Vec<String> {
    [
        "i ", "i'm", "im ", "me ", "my ", "mine", "well i", "ja ", "mnie ", "mój", "moja", "moje",
        "a ja",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_affection_terms() -> Vec<String> {
    [
        "love you",
        "miss you",
        "babe",
        "baby",
        "honey",
        "sweetheart",
        "darling",
        "cutie",
        "kocham",
        "kocham cię",
        "tęsknię",
        "kochanie",
        "skarbie",
        "misiu",
        "❤️",
        "❤",
        "😘",
        "🥰",
        "💕",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Fixed reference distributions for the ranking-percentile deriver. Values
/// are ascending anchors; a person's metric is placed by interpolation.
/// Empirically chosen tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReferences {
    /// Messages per day anchors.
    #[serde(default = "default_messages_per_day_refs")]
    pub messages_per_day: Vec<f64>,

    /// Median response time anchors in minutes, fastest first.
    #[serde(default = "default_response_minutes_refs")]
    pub median_response_minutes: Vec<f64>,
}

impl Default for RankingReferences {
    fn default() -> Self {
        Self {
            messages_per_day: default_messages_per_day_refs(),
            median_response_minutes: default_response_minutes_refs(),
        }
    }
}

fn default_messages_per_day_refs() -> Vec<f64> {
    vec![0.2, 1.0, 3.0, 8.0, 15.0, 30.0, 60.0, 120.0, 250.0]
}

fn default_response_minutes_refs() -> Vec<f64> {
    vec![0.5, 2.0, 5.0, 15.0, 45.0, 90.0, 180.0, 300.0]
}

/// Minimum non-system messages before the chronotype deriver reports a
/// person.
pub const MIN_CHRONOTYPE_MESSAGES: usize = 20;

/// Minimum classified responses before the shift/support deriver reports a
/// person.
pub const MIN_SHIFT_SUPPORT_RESPONSES: usize = 20;

/// Initiation share above which a month counts toward a pursuit cycle.
pub const PURSUIT_INITIATION_SHARE: f64 = 0.65;

/// Withdrawal multiplier on the withdrawer's own baseline median response.
pub const WITHDRAWAL_RESPONSE_FACTOR: f64 = 1.5;

/// Response-time distribution bucket edges (upper bounds, ms).
pub const RESPONSE_BUCKETS_MS: &[(i64, &str)] = &[
    (MS_PER_MINUTE, "under 1m"),
    (5 * MS_PER_MINUTE, "1-5m"),
    (30 * MS_PER_MINUTE, "5-30m"),
    (2 * MS_PER_HOUR, "30m-2h"),
    (6 * MS_PER_HOUR, "2-6h"),
];

static DEFAULT_CONFIG: OnceLock<AnalysisConfig> = OnceLock::new();

/// Shared default configuration, built once.
pub fn default_config() -> &'static AnalysisConfig {
    DEFAULT_CONFIG.get_or_init(AnalysisConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert_eq!(AnalysisConfig::default().validate(), Ok(()));
    }

    #[test]
    fn late_night_window_wraps_midnight() {
        let session = SessionConfig::default();
        assert!(session.is_late_night(23));
        assert!(session.is_late_night(0));
        assert!(session.is_late_night(3));
        assert!(!session.is_late_night(4));
        assert!(!session.is_late_night(21));
    }

    #[test]
    fn unbalanced_viral_weights_are_rejected() {
        let mut weights = ViralWeights::default();
        weights.interest_initiation = 90.0;
        assert!(weights.validate().is_err());
    }

    #[test]
    fn session_gap_is_six_hours() {
        assert_eq!(SessionConfig::default().session_gap_ms, 21_600_000);
    }

    #[test]
    fn bid_window_is_four_hours() {
        assert_eq!(BidConfig::default().response_window_ms, 14_400_000);
    }
}
