//! Composite scorers: badges and viral scores. Unlike the derivers, these
//! declare inputs from already-derived bundles and must run after them.

pub mod badges;
pub mod viral;
