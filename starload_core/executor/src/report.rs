use crate::error::ExecutorError;
use crate::state::RunState;
use catalog::{Phase, StatementDescriptor};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Wall clock time of one committed statement.
#[derive(Debug, Clone, Serialize)]
pub struct StatementTiming {
    pub phase: String,
    pub target: String,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl StatementTiming {
    pub fn new(statement: &StatementDescriptor, duration: Duration) -> Self {
        Self {
            phase: statement.phase().to_string(),
            target: statement.target.to_string(),
            duration,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: RunState,
    /// States the run passed through, in order.
    pub states: Vec<RunState>,
    pub statements: Vec<StatementTiming>,
    /// Error text of the statement that stopped the run.
    pub error: Option<String>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            state: RunState::Init,
            states: vec![RunState::Init],
            statements: Vec::new(),
            error: None,
        }
    }

    pub fn record(&mut self, timing: StatementTiming) {
        self.statements.push(timing);
    }

    pub fn finish(&mut self, state: RunState, error: Option<String>) {
        self.state = state;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Close a run that stopped before the pipeline could finish it, such
    /// as a failed connect. A finished report is left untouched.
    pub fn fail_unfinished(&mut self, error: impl ToString) {
        if self.is_finished() {
            return;
        }
        if self.states.last() != Some(&RunState::Failed) {
            self.states.push(RunState::Failed);
        }
        self.finish(RunState::Failed, Some(error.to_string()));
    }

    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &StatementTiming> {
        let phase = phase.to_string();
        self.statements.iter().filter(move |t| t.phase == phase)
    }

    pub fn total_duration(&self) -> Duration {
        self.statements.iter().map(|t| t.duration).sum()
    }

    /// Per table transform durations, one line each.
    pub fn log_summary(&self) {
        let width = self
            .statements
            .iter()
            .map(|t| t.target.len())
            .max()
            .unwrap_or(0);
        for timing in self.phase(Phase::Transform) {
            let elapsed = format!("{:.2?}", timing.duration);
            info!("{:<width$}  {:>10}", timing.target, elapsed, width = width);
        }
        info!(
            "run {} after {} statements in {:.2?}",
            self.state,
            self.statements.len(),
            self.total_duration()
        );
    }

    pub fn to_json(&self) -> Result<String, ExecutorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ExecutorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!("run report written to {}", path.display());
        Ok(())
    }
}
