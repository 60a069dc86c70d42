// linear.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticket_domain::{Decision, ProcessOutcome, Role, TicketProcess, WorkflowTemplate};

use super::{StageOutcome, WorkflowPlugin};

/// Qué hacer cuando un rol rechaza.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionPolicy {
    /// Rejection is recorded and the process still advances.
    #[default]
    Proceed,
    /// Rejection finishes the process with outcome `Rejected`.
    Halt,
}

impl RejectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Halt => "halt",
        }
    }
}

impl fmt::Display for RejectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proceed" => Ok(Self::Proceed),
            "halt" => Ok(Self::Halt),
            other => Err(format!("unknown rejection policy '{other}' (expected proceed|halt)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearWorkflow {
    pub policy: RejectionPolicy,
}

impl LinearWorkflow {
    pub fn new(policy: RejectionPolicy) -> Self {
        Self { policy }
    }
}

impl WorkflowPlugin for LinearWorkflow {
    fn stages(&self, template: Option<&WorkflowTemplate>) -> Vec<Role> {
        match template {
            Some(t) if !t.stages.is_empty() => t.stages_in_order().iter().map(|s| s.role).collect(),
            _ => Role::ALL.to_vec(),
        }
    }

    fn complete_stage(&self,
                      process: &mut TicketProcess,
                      template: Option<&WorkflowTemplate>,
                      decision: Decision,
                      at: DateTime<Utc>)
                      -> Option<StageOutcome> {
        let from = self.current_stage(process, template)?;
        if decision == Decision::Rejected && self.policy == RejectionPolicy::Halt {
            process.finished = Some(at);
            process.outcome = Some(ProcessOutcome::Rejected);
            return Some(StageOutcome::Finished { from,
                                                 outcome: ProcessOutcome::Rejected });
        }
        process.stage_cursor += 1;
        match self.stages(template).get(process.stage_cursor) {
            Some(next) => Some(StageOutcome::Advanced { from, next: *next }),
            None => {
                process.finished = Some(at);
                process.outcome = Some(ProcessOutcome::Completed);
                Some(StageOutcome::Finished { from,
                                              outcome: ProcessOutcome::Completed })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn proceed_policy_walks_all_roles() {
        let wf = LinearWorkflow::default();
        let mut process = TicketProcess::new(Uuid::new_v4(), None);
        let mut seen = Vec::new();
        while let Some(outcome) = wf.complete_stage(&mut process, None, Decision::Rejected, Utc::now()) {
            seen.push(outcome.from_role());
        }
        assert_eq!(seen, Role::ALL.to_vec());
        assert_eq!(process.outcome, Some(ProcessOutcome::Completed));
        assert!(process.is_finished());
    }

    #[test]
    fn halt_policy_stops_on_rejection() {
        let wf = LinearWorkflow::new(RejectionPolicy::Halt);
        let mut process = TicketProcess::new(Uuid::new_v4(), None);
        wf.complete_stage(&mut process, None, Decision::Approved, Utc::now());
        let outcome = wf.complete_stage(&mut process, None, Decision::Rejected, Utc::now());
        assert_eq!(outcome,
                   Some(StageOutcome::Finished { from: Role::Champion,
                                                 outcome: ProcessOutcome::Rejected }));
        assert_eq!(wf.current_stage(&process, None), None);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("HALT".parse::<RejectionPolicy>(), Ok(RejectionPolicy::Halt));
        assert!("loop".parse::<RejectionPolicy>().is_err());
    }
}
