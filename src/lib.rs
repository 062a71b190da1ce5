// Export modules for library usage
pub mod accumulate;
pub mod config;
pub mod core;
pub mod decoders;
pub mod derivers;
pub mod pipeline;
pub mod scoring;
pub mod stats;

// Re-export commonly used types
pub use crate::core::{
    errors::{Error, Result},
    ConversationMetadata, DateRange, MessageKind, ParsedConversation, Participant, Platform,
    Reaction, UnifiedMessage,
};

pub use crate::config::{default_config, AnalysisConfig};

pub use crate::decoders::{
    decode, decode_many, detect_platform, get_decoder, merge, Decoder, RawExport,
};

pub use crate::accumulate::{accumulate, AccumulatorSet, PersonAccumulator};

pub use crate::pipeline::{analyze, analyze_with_accumulators, QuantitativeAnalysis};

pub use crate::scoring::badges::{Badge, BadgeSet};
pub use crate::scoring::viral::ViralScores;
