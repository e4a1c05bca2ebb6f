use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::bench::config::SamplingParams;
use crate::bench::iostat::IoDeltas;
use crate::bench::stats::BenchStats;
use crate::error::{PlumeError, Result};

/// Everything a sink needs to report one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub dataset: String,
    pub run_id: String,
    pub engine: String,
    pub timestamp_utc: DateTime<Utc>,
    pub sampling: SamplingParams,
    pub stats: BenchStats,
    pub io: IoDeltas,
}

pub trait ResultSink {
    fn report(&self, report: &BenchReport) -> Result<()>;
}

/// Human-readable fixed-width table through the log.
pub struct LogSink;

impl ResultSink for LogSink {
    fn report(&self, report: &BenchReport) -> Result<()> {
        let stats = &report.stats;
        let io = &report.io;
        let bar_heavy = "=".repeat(60);
        let bar_light = "-".repeat(60);

        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(out, "{bar_heavy}");
        let _ = writeln!(out, " {:^58} ", format!("BENCHMARK: {}", report.dataset));
        let _ = writeln!(out, "{bar_heavy}");
        let _ = writeln!(out, " {:<20} : {}", "Run ID", report.run_id);
        let _ = writeln!(out, " {:<20} : {}", "Engine", report.engine);
        let _ = writeln!(
            out,
            " {:<20} : batch={}, hops={}, fanout={}",
            "Sampling",
            report.sampling.batch_size,
            report.sampling.num_hops,
            report.sampling.fan_out
        );
        let _ = writeln!(out, "{bar_light}");
        let _ = writeln!(out, " {:<20} : {:>12} reqs", "Total Queries", stats.total_queries);
        let _ = writeln!(
            out,
            " {:<20} : {:>12.3} MM",
            "Total Tensors",
            stats.total_tensors as f64 / 1e6
        );
        let _ = writeln!(out, "{bar_light}");
        let _ = writeln!(out, " {:<20} : {:>12.2} req/s", "Throughput QPS", stats.qps);
        let _ = writeln!(
            out,
            " {:<20} : {:>12.3} MM/s",
            "Throughput TPS",
            stats.tensors_per_sec / 1e6
        );
        let _ = writeln!(out, " {:<20} : {:>12.2} GiB/s", "Throughput BW", stats.gib_per_sec);
        let _ = writeln!(out, "{bar_light}");
        let _ = writeln!(out, " {:<20} : {:>12.3} ms", "Latency Mean", stats.mean_ms);
        let _ = writeln!(out, " {:<20} : {:>12.3} ms", "Latency StdDev", stats.std_dev_ms);
        let _ = writeln!(out, " {:<20} : {:>12.3} ms", "Latency P50", stats.p50_ms);
        let _ = writeln!(out, " {:<20} : {:>12.3} ms", "Latency P95", stats.p95_ms);
        let _ = writeln!(out, " {:<20} : {:>12.3} ms", "Latency P99", stats.p99_ms);
        let _ = writeln!(out, " {:<20} : {:>12.3} ms", "Latency Max", stats.max_ms);
        let _ = writeln!(out, "{bar_light}");
        let _ = writeln!(out, " {:<20} : {:>12}", "Major Faults", io.major_faults);
        let _ = writeln!(out, " {:<20} : {:>12}", "Minor Faults", io.minor_faults);
        let _ = writeln!(
            out,
            " {:<20} : {:>12} / {}",
            "Ctx Switches (v/i)", io.voluntary_ctx_switches, io.involuntary_ctx_switches
        );
        let _ = writeln!(
            out,
            " {:<20} : {:>12.3} MB",
            "Disk Read",
            io.disk_bytes_read as f64 / (1024.0 * 1024.0)
        );
        let _ = writeln!(out, " {:<20} : {:>12.3} GB", "Peak RSS", io.peak_rss_gb);
        let _ = write!(out, "{bar_heavy}");

        info!("{out}");
        Ok(())
    }
}

/// Writes the full report as a pretty-printed JSON artifact under
/// `out_dir`, one file per (dataset, run, engine) triple.
pub struct JsonSink {
    out_dir: PathBuf,
}

impl JsonSink {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl ResultSink for JsonSink {
    fn report(&self, report: &BenchReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!(
            "{}-{}-{}.json",
            report.dataset, report.run_id, report.engine
        ));
        let body = serde_json::to_vec_pretty(report)
            .map_err(|e| PlumeError::Serialization(e.to_string()))?;
        fs::write(&path, body)?;
        info!(path = %path.display(), "wrote benchmark report");
        Ok(())
    }
}
