use std::path::Path;
use std::process::Command;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::bench::config::RunConfig;
use crate::bench::iostat::{IoDeltas, IoSnapshot};
use crate::bench::queries::{Query, QueryLoader};
use crate::bench::sinks::{BenchReport, ResultSink};
use crate::bench::stats::BenchStats;
use crate::bench::timer::ScopedTimer;
use crate::error::Result;
use crate::ingest::{ingest_edgelist, ingest_features};
use crate::model::{EngineConfig, GraphTopology, NodeId};
use crate::store::{create_builder, FeatureStore};

/// Single-threaded benchmark orchestration: ingest → build → (evict) →
/// timed gather loop → stats → sinks.
pub struct Runner {
    engine_cfg: EngineConfig,
    run_cfg: RunConfig,
    sinks: Vec<Box<dyn ResultSink>>,
}

impl Runner {
    pub fn new(engine_cfg: EngineConfig, run_cfg: RunConfig) -> Self {
        Self {
            engine_cfg,
            run_cfg,
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn ResultSink>) {
        self.sinks.push(sink);
    }

    pub fn run(&mut self) -> Result<BenchReport> {
        info!(
            dataset = %self.run_cfg.dataset_name,
            run_id = %self.run_cfg.run_id,
            "starting benchmark runner"
        );

        let mut builder = create_builder(&self.engine_cfg)?;
        let mut edge_buffer: Vec<(NodeId, NodeId)> = Vec::new();
        {
            let _t = ScopedTimer::named("ingestion");
            ingest_features(&self.run_cfg.node_feat_path, &mut builder)?;
            ingest_edgelist(&self.run_cfg.edge_list_path, &mut edge_buffer)?;
        }

        let store;
        {
            let _t = ScopedTimer::named("build");
            let graph = GraphTopology {
                edges: &edge_buffer,
            };
            store = builder.build(Some(graph))?;
        }
        // The store does not retain the topology; free the RAM before
        // the measurement window.
        drop(edge_buffer);

        let queries = self.load_queries()?;

        if let EngineConfig::FlatMmap { db_path } = &self.engine_cfg {
            evict_page_cache(db_path);
        }

        let start = IoSnapshot::capture();
        let mut latencies_us = Vec::with_capacity(queries.len());
        let mut total_tensors: u64 = 0;
        info!(batches = queries.len(), "running query workload");
        for query in &queries {
            {
                let _t = ScopedTimer::with(|us| latencies_us.push(us));
                let _features = store.get_multi_tensor(query);
            }
            total_tensors += query.len() as u64;
        }
        let end = IoSnapshot::capture();

        let stats = BenchStats::compute(
            &latencies_us,
            total_tensors,
            store.tensor_size().unwrap_or(0),
        );
        let report = BenchReport {
            dataset: self.run_cfg.dataset_name.clone(),
            run_id: self.run_cfg.run_id.clone(),
            engine: store.name().to_string(),
            timestamp_utc: Utc::now(),
            sampling: self.run_cfg.sampling,
            stats,
            io: IoDeltas::between(&start, &end),
        };

        for sink in &self.sinks {
            if let Err(e) = sink.report(&report) {
                error!("result sink failed: {e}");
            }
        }
        Ok(report)
    }

    fn load_queries(&self) -> Result<Vec<Query>> {
        let mut queries = Vec::new();
        for path in self.run_cfg.selected_query_csvs() {
            queries.extend(QueryLoader::from_csv(path)?);
        }
        Ok(queries)
    }
}

/// Asks the OS to drop the store file from the page cache so the gather
/// loop starts cold. Best-effort: a missing utility or non-zero exit is
/// logged and the benchmark proceeds warm.
fn evict_page_cache(db_path: &Path) {
    match Command::new("vmtouch").arg("-e").arg(db_path).status() {
        Ok(status) if status.success() => {
            info!(path = %db_path.display(), "evicted store file from page cache")
        }
        Ok(status) => warn!(
            path = %db_path.display(),
            code = status.code(),
            "page-cache eviction exited non-zero; benchmark runs warm"
        ),
        Err(e) => warn!("page-cache eviction unavailable ({e}); benchmark runs warm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::config::QueryFileMode;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn scaffold_dataset(root: &Path) {
        let dataset = root.join("bench/data/ogbn-tiny");
        let run = dataset.join("run-0001");
        fs::create_dir_all(&run).expect("dirs");
        fs::write(
            dataset.join("node-feat.csv"),
            "1.0,2.0\n3.0,4.0\n5.0,6.0\n",
        )
        .expect("feat");
        fs::write(dataset.join("edge.csv"), "0,1\n1,2\n").expect("edge");
        fs::write(
            run.join("metadata.json"),
            r#"{"seed": 7, "batch_size": 2, "num_hops": 1, "fan_out": 2}"#,
        )
        .expect("metadata");
        fs::write(run.join("queries-7.csv"), "0,1\n2,0\n").expect("queries");
    }

    fn load_cfg(root: &Path) -> RunConfig {
        RunConfig::load_from_root(root, "ogbn-tiny", "run-0001", QueryFileMode::First)
            .expect("run config")
    }

    #[test]
    fn in_memory_end_to_end() {
        let dir = tempdir().expect("tempdir");
        scaffold_dataset(dir.path());

        let mut runner = Runner::new(EngineConfig::InMemory, load_cfg(dir.path()));
        let report = runner.run().expect("run");

        assert_eq!(report.engine, "in_memory");
        assert_eq!(report.stats.total_queries, 2);
        assert_eq!(report.stats.total_tensors, 4);
        assert_eq!(report.sampling.batch_size, 2);
    }

    #[test]
    fn flat_mmap_end_to_end() {
        let dir = tempdir().expect("tempdir");
        scaffold_dataset(dir.path());

        let db_path = dir.path().join("features.bin");
        let mut runner = Runner::new(
            EngineConfig::FlatMmap {
                db_path: db_path.clone(),
            },
            load_cfg(dir.path()),
        );
        let report = runner.run().expect("run");

        assert_eq!(report.engine, "flat_mmap");
        assert_eq!(report.stats.total_queries, 2);
        // Three 2-float tensors on disk.
        assert_eq!(fs::metadata(&db_path).expect("metadata").len(), 24);
    }
}
