//! SwingSignal Core: price series, indicator classifiers, regime, decision and sizing.
//!
//! This crate is the pure, synchronous part of the signal engine:
//! - Domain types (bars, validated series, read-only windows)
//! - Five indicator classifiers with a uniform reading interface
//! - Regime combiner, entry-quality scorer, decision engine
//! - Trade-plan builder, position sizer, stop/target risk manager
//! - Weighted composite vote model
//! - Single-window [`Analyzer`] wiring all stages together
//!
//! No I/O and no logging happen here; loading, replay and reporting live in
//! `swingsignal-runner`.

pub mod analysis;
pub mod classify;
pub mod composite;
pub mod config;
pub mod decision;
pub mod domain;
pub mod entry;
pub mod plan;
pub mod regime;
pub mod sizing;

pub use analysis::{Analysis, Analyzer, TradeSetup};
pub use config::AnalysisConfig;
