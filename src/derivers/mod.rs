//! Metric derivers: each module consumes the frozen accumulators (and, for
//! the message-window classifiers, the conversation itself) and produces one
//! independent bundle. No deriver mutates shared state or reads another
//! deriver's output, so the pipeline may run them in any order or in
//! parallel. Composite scorers with cross-bundle inputs live in
//! `crate::scoring` instead.

pub mod bids;
pub mod chronotype;
pub mod conflict;
pub mod distribution;
pub mod engagement;
pub mod heatmap;
pub mod intimacy;
pub mod milestones;
pub mod narcissism;
pub mod network;
pub mod patterns;
pub mod pursuit;
pub mod ranking;
pub mod reciprocity;
pub mod sentiment;
pub mod timing;
pub mod trends;
