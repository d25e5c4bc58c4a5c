pub mod ai;
pub mod analyzer;
pub mod config;
pub mod links;
pub mod normalize;
pub mod patterns;
pub mod preferences;
pub mod run_log;
pub mod store;
pub mod strategy;
pub mod theme;
pub mod trace;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use normalize::{normalize, signature};
pub use patterns::{match_all, ErrorPattern};
pub use strategy::{ExecutionContext, Explainer, OutputSink, StrategyKind};
pub use trace::{extract_relevant_trace, TraceShape};
