use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlumeError, Result};

const NODE_FEAT_FILE: &str = "node-feat.csv";
const EDGE_LIST_FILE: &str = "edge.csv";
const METADATA_FILE: &str = "metadata.json";

/// Compiled-in project root; datasets live under `bench/data/` beneath it.
const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Whether a run consumes only the lexicographically first query CSV or
/// all of them concatenated in sorted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryFileMode {
    #[default]
    First,
    All,
}

/// Sampling parameters recorded by the query generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplingParams {
    pub seed: i64,
    pub batch_size: usize,
    pub num_hops: usize,
    pub fan_out: usize,
}

/// Resolved dataset resources for one benchmark run. Loading is
/// all-or-nothing: any missing file or unreadable metadata fails the
/// whole load with a descriptive error.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dataset_name: String,
    pub run_id: String,
    pub node_feat_path: PathBuf,
    pub edge_list_path: PathBuf,
    pub sampling: SamplingParams,
    pub query_csvs: Vec<PathBuf>,
    pub query_mode: QueryFileMode,
}

impl RunConfig {
    pub fn load(dataset_name: &str, run_id: &str, query_mode: QueryFileMode) -> Result<Self> {
        Self::load_from_root(Path::new(PROJECT_ROOT), dataset_name, run_id, query_mode)
    }

    pub fn load_from_root(
        project_root: &Path,
        dataset_name: &str,
        run_id: &str,
        query_mode: QueryFileMode,
    ) -> Result<Self> {
        let dataset_dir = project_root.join("bench").join("data").join(dataset_name);
        if !dataset_dir.is_dir() {
            return Err(PlumeError::Config(format!(
                "dataset directory not found: {}",
                dataset_dir.display()
            )));
        }

        let node_feat_path = dataset_dir.join(NODE_FEAT_FILE);
        if !node_feat_path.exists() {
            return Err(PlumeError::Config(format!(
                "feature file not found: {}",
                node_feat_path.display()
            )));
        }
        let edge_list_path = dataset_dir.join(EDGE_LIST_FILE);
        if !edge_list_path.exists() {
            return Err(PlumeError::Config(format!(
                "edge-list file not found: {}",
                edge_list_path.display()
            )));
        }

        let run_dir = dataset_dir.join(run_id);
        if !run_dir.is_dir() {
            return Err(PlumeError::Config(format!(
                "run directory not found: {}",
                run_dir.display()
            )));
        }

        let sampling = read_sampling(&run_dir.join(METADATA_FILE))?;

        let mut query_csvs: Vec<PathBuf> = fs::read_dir(&run_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        if query_csvs.is_empty() {
            return Err(PlumeError::Config(format!(
                "no query CSVs found in run directory: {}",
                run_dir.display()
            )));
        }
        // Sort so queries replay in seeded order.
        query_csvs.sort();

        debug!(
            dataset = dataset_name,
            run_id,
            queries = query_csvs.len(),
            "loaded run configuration"
        );
        Ok(Self {
            dataset_name: dataset_name.to_string(),
            run_id: run_id.to_string(),
            node_feat_path,
            edge_list_path,
            sampling,
            query_csvs,
            query_mode,
        })
    }

    /// The query files this run actually consumes, per its mode.
    pub fn selected_query_csvs(&self) -> &[PathBuf] {
        match self.query_mode {
            QueryFileMode::First => &self.query_csvs[..1],
            QueryFileMode::All => &self.query_csvs,
        }
    }

    pub fn dataset_dir(&self) -> &Path {
        self.node_feat_path
            .parent()
            .expect("feature path always has a parent")
    }
}

fn read_sampling(path: &Path) -> Result<SamplingParams> {
    let raw = fs::read_to_string(path).map_err(|e| {
        PlumeError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| PlumeError::Config(format!("invalid metadata in {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const METADATA: &str =
        r#"{"seed": 1337, "batch_size": 1024, "num_hops": 2, "fan_out": 10, "created_at": "2025-11-02T10:00:00Z"}"#;

    fn scaffold(root: &Path, with_metadata: bool) {
        let dataset = root.join("bench/data/ogbn-tiny");
        let run = dataset.join("run-0001");
        fs::create_dir_all(&run).expect("dirs");
        fs::write(dataset.join(NODE_FEAT_FILE), "1.0,2.0\n").expect("feat");
        fs::write(dataset.join(EDGE_LIST_FILE), "0,1\n").expect("edge");
        fs::write(run.join("queries-2.csv"), "0,1\n").expect("q2");
        fs::write(run.join("queries-1.csv"), "1,0\n").expect("q1");
        if with_metadata {
            fs::write(run.join(METADATA_FILE), METADATA).expect("metadata");
        }
    }

    #[test]
    fn loads_and_sorts_query_files() {
        let dir = tempdir().expect("tempdir");
        scaffold(dir.path(), true);

        let cfg = RunConfig::load_from_root(dir.path(), "ogbn-tiny", "run-0001", QueryFileMode::All)
            .expect("load");
        assert_eq!(cfg.sampling.seed, 1337);
        assert_eq!(cfg.sampling.batch_size, 1024);
        let names: Vec<_> = cfg
            .query_csvs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["queries-1.csv", "queries-2.csv"]);
        assert_eq!(cfg.selected_query_csvs().len(), 2);
    }

    #[test]
    fn first_mode_selects_one_file() {
        let dir = tempdir().expect("tempdir");
        scaffold(dir.path(), true);

        let cfg =
            RunConfig::load_from_root(dir.path(), "ogbn-tiny", "run-0001", QueryFileMode::First)
                .expect("load");
        assert_eq!(cfg.selected_query_csvs().len(), 1);
        assert!(cfg.selected_query_csvs()[0].ends_with("queries-1.csv"));
    }

    #[test]
    fn missing_dataset_is_a_config_error() {
        let dir = tempdir().expect("tempdir");
        let err = RunConfig::load_from_root(dir.path(), "nope", "run-0001", QueryFileMode::First)
            .expect_err("must fail");
        assert!(matches!(err, PlumeError::Config(_)));
    }

    #[test]
    fn missing_metadata_fails_the_whole_load() {
        let dir = tempdir().expect("tempdir");
        scaffold(dir.path(), false);

        let err =
            RunConfig::load_from_root(dir.path(), "ogbn-tiny", "run-0001", QueryFileMode::First)
                .expect_err("must fail");
        assert!(matches!(err, PlumeError::Config(_)));
    }
}
