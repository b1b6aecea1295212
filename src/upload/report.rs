//! Final upload report

use super::UploadOutcome;
use std::fmt;

/// Outcomes partitioned into successes and failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub successful: Vec<String>,
    pub failed: Vec<String>,
}

impl UploadReport {
    pub fn from_outcomes(outcomes: &[UploadOutcome]) -> Self {
        let (successful, failed): (Vec<_>, Vec<_>) =
            outcomes.iter().partition(|o| o.is_success());
        Self {
            successful: successful.into_iter().map(|o| o.asset_path.clone()).collect(),
            failed: failed.into_iter().map(|o| o.asset_path.clone()).collect(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    fn percentage(&self, count: usize) -> f64 {
        match self.attempted() {
            0 => 0.0,
            total => count as f64 / total as f64 * 100.0,
        }
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------------------------------")?;
        writeln!(f, "UPLOAD REPORT")?;
        writeln!(f, "Files attempted to upload: {}", self.attempted())?;
        writeln!(
            f,
            "   Successful uploads: {} ({:.2}%)",
            self.successful.len(),
            self.percentage(self.successful.len())
        )?;
        for path in &self.successful {
            writeln!(f, "       {}", path)?;
        }
        writeln!(
            f,
            "   Failed uploads: {} ({:.2}%)",
            self.failed.len(),
            self.percentage(self.failed.len())
        )?;
        for path in &self.failed {
            writeln!(f, "       {}", path)?;
        }
        Ok(())
    }
}
