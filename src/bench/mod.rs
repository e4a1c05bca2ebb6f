//! Benchmark harness: dataset discovery, query loading, timed gather
//! loops, and result emission.

pub mod config;
pub mod iostat;
pub mod queries;
pub mod runner;
pub mod sinks;
pub mod stats;
pub mod timer;

pub use config::{QueryFileMode, RunConfig, SamplingParams};
pub use iostat::{IoDeltas, IoSnapshot};
pub use queries::QueryLoader;
pub use runner::Runner;
pub use sinks::{BenchReport, JsonSink, LogSink, ResultSink};
pub use stats::BenchStats;
pub use timer::ScopedTimer;
