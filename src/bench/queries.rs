use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{PlumeError, Result};
use crate::model::Key;

pub type Query = Vec<Key>;

pub struct QueryLoader;

impl QueryLoader {
    /// Loads one batch of node IDs per non-empty line. Tokens that fail
    /// to parse are skipped with a warning; the rest of the batch is
    /// kept.
    pub fn from_csv(path: &Path) -> Result<Vec<Query>> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PlumeError::Ingest(format!("cannot open {}: {e}", path.display())))?;

        let mut queries = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            let mut query = Query::new();
            for token in line.split(',') {
                match token.trim().parse::<u64>() {
                    Ok(id) => query.push(Key(id)),
                    Err(_) => warn!(
                        token,
                        path = %path.display(),
                        "skipping invalid node id in query file"
                    ),
                }
            }
            queries.push(query);
        }

        info!(batches = queries.len(), path = %path.display(), "loaded query batches");
        Ok(queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn one_batch_per_line() {
        let mut tmp = NamedTempFile::new().expect("temp file");
        tmp.write_all(b"0,1,2\n\n3,4\n").expect("write");
        tmp.flush().expect("flush");

        let queries = QueryLoader::from_csv(tmp.path()).expect("load");
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], vec![Key(0), Key(1), Key(2)]);
        assert_eq!(queries[1], vec![Key(3), Key(4)]);
    }

    #[test]
    fn invalid_tokens_are_skipped() {
        let mut tmp = NamedTempFile::new().expect("temp file");
        tmp.write_all(b"0,x,2\n").expect("write");
        tmp.flush().expect("flush");

        let queries = QueryLoader::from_csv(tmp.path()).expect("load");
        assert_eq!(queries, vec![vec![Key(0), Key(2)]]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(QueryLoader::from_csv(Path::new("/nonexistent/q.csv")).is_err());
    }
}
