use crate::error::ExecutorError;
use serde::Serialize;
use std::fmt;

/// Lifecycle of one load run.
///
/// `Init -> StagingLoading -> StagingLoaded -> Transforming -> Done`, with
/// `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Init,
    StagingLoading,
    StagingLoaded,
    Transforming,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Init, StagingLoading)
            | (StagingLoading, StagingLoaded)
            | (StagingLoaded, Transforming)
            | (Transforming, Done) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::StagingLoading => "STAGING_LOADING",
            RunState::StagingLoaded => "STAGING_LOADED",
            RunState::Transforming => "TRANSFORMING",
            RunState::Done => "DONE",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunStateMachine {
    state: RunState,
    history: Vec<RunState>,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            state: RunState::Init,
            history: vec![RunState::Init],
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state visited so far, starting with `Init`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn transition(&mut self, next: RunState) -> Result<(), ExecutorError> {
        if !self.state.can_transition_to(next) {
            return Err(ExecutorError::illegal_transition(format!(
                "{} -> {}",
                self.state, next
            )));
        }
        tracing::debug!("run state {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), ExecutorError> {
        self.transition(RunState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut machine = RunStateMachine::new();
        for next in [
            RunState::StagingLoading,
            RunState::StagingLoaded,
            RunState::Transforming,
            RunState::Done,
        ] {
            machine.transition(next).unwrap();
        }
        assert_eq!(machine.state(), RunState::Done);
        assert_eq!(machine.history().len(), 5);
    }

    #[test]
    fn cannot_skip_staging() {
        let mut machine = RunStateMachine::new();
        let err = machine.transition(RunState::Transforming).unwrap_err();
        assert!(err.to_string().contains("INIT -> TRANSFORMING"));
        assert_eq!(machine.state(), RunState::Init);
    }

    #[test]
    fn failed_and_done_are_terminal() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunState::StagingLoading).unwrap();
        machine.fail().unwrap();
        assert!(machine.fail().is_err());
        assert!(machine.transition(RunState::StagingLoaded).is_err());

        assert!(!RunState::Done.can_transition_to(RunState::Failed));
        assert!(RunState::Init.can_transition_to(RunState::Failed));
    }

    #[test]
    fn serialises_in_upper_snake_case() {
        let json = serde_json::to_string(&RunState::StagingLoaded).unwrap();
        assert_eq!(json, "\"STAGING_LOADED\"");
    }
}
