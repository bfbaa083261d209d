use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use lokiprobe_domain::{ProbeError, ProbeResult, RunReport};

/// Append-only results file; one block per variant.
#[derive(Debug, Clone)]
pub struct ResultsWriter {
    path: PathBuf,
}

impl ResultsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, report: &RunReport) -> ProbeResult<()> {
        let io_err = |err| ProbeError::io(self.path.display().to_string(), err);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(report.render().as_bytes())
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)
    }
}
