use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Client;

/// File being printed by the current job.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct JobFile {
    /// Name of the file, if a file is selected.
    #[serde(default)]
    pub name: Option<String>,
}

/// Information about the job OctoPrint is working on.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct JobInfo {
    /// Selected file.
    #[serde(default)]
    pub file: JobFile,

    /// Estimated print time for the whole file, in seconds.
    #[serde(default, rename = "estimatedPrintTime")]
    pub estimated_print_time: Option<f64>,
}

/// Progress of the current job. Every field is `null` while idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct JobProgress {
    /// Percentage of the file printed so far, 0 to 100.
    #[serde(default)]
    pub completion: Option<f64>,

    /// Seconds spent printing so far.
    #[serde(default, rename = "printTime")]
    pub print_time: Option<f64>,

    /// Estimated seconds left.
    #[serde(default, rename = "printTimeLeft")]
    pub print_time_left: Option<f64>,
}

/// Response of `GET /api/job`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct JobStatus {
    /// Job information.
    #[serde(default)]
    pub job: JobInfo,

    /// Progress information.
    #[serde(default)]
    pub progress: JobProgress,

    /// Human readable printer state, like `Operational` or `Printing`.
    pub state: String,
}

impl Client {
    /// Get the state of the current job.
    pub async fn job(&self) -> Result<JobStatus> {
        tracing::debug!(base = %self.url_base, "requesting job status");

        let resp: JobStatus = self.get("/api/job").send().await?.error_for_status()?.json().await?;

        Ok(resp)
    }
}
