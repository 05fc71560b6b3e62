//! Application pipeline states and the rules for moving between them.
//!
//! ```text
//! Applied ──> Shortlisted ──> Interview ──> Hired
//!    │             │              │
//!    └─────────────┴──────────────┴──────> Rejected
//! ```
//!
//! `Hired` and `Rejected` are terminal. Withdrawal is not a transition: it
//! removes the application, and is refused once an interview is scheduled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Interview,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [Self; 5] = [
        Self::Applied,
        Self::Shortlisted,
        Self::Interview,
        Self::Rejected,
        Self::Hired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Shortlisted => "Shortlisted",
            Self::Interview => "Interview",
            Self::Rejected => "Rejected",
            Self::Hired => "Hired",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }

    /// Whether the applicant may still pull the application.
    pub fn can_withdraw(self) -> bool {
        !matches!(self, Self::Interview | Self::Hired)
    }

    /// Declared outgoing edges of the pipeline graph.
    pub fn successors(self) -> &'static [Self] {
        match self {
            Self::Applied => &[Self::Shortlisted, Self::Rejected],
            Self::Shortlisted => &[Self::Interview, Self::Rejected],
            Self::Interview => &[Self::Hired, Self::Rejected],
            Self::Hired | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("unknown application status '{s}'"))
    }
}

/// How recruiter-issued status writes are checked against the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any known status may be written, matching the legacy API.
    #[default]
    Compatible,
    /// Only declared edges are accepted.
    Strict,
}

/// Outcome of checking a requested status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Changed { from: ApplicationStatus, to: ApplicationStatus },
}

impl StatusPolicy {
    pub fn check(
        self,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<StatusChange, CoreError> {
        if from == to {
            return Ok(StatusChange::Unchanged);
        }
        match self {
            Self::Compatible => Ok(StatusChange::Changed { from, to }),
            Self::Strict if from.can_transition_to(to) => Ok(StatusChange::Changed { from, to }),
            Self::Strict => Err(CoreError::conflict(format!(
                "Cannot move application from {from} to {to}"
            ))),
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatible" => Ok(Self::Compatible),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown status policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn terminal_states_have_no_successors() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.is_terminal(), status.successors().is_empty(), "{status}");
        }
    }

    #[test]
    fn rejected_reachable_from_every_open_state() {
        for status in [Applied, Shortlisted, Interview] {
            assert!(status.can_transition_to(Rejected));
        }
    }

    #[test]
    fn withdrawal_blocked_from_interview_on() {
        assert!(Applied.can_withdraw());
        assert!(Shortlisted.can_withdraw());
        assert!(Rejected.can_withdraw());
        assert!(!Interview.can_withdraw());
        assert!(!Hired.can_withdraw());
    }

    #[test]
    fn strict_policy_follows_declared_edges() {
        let policy = StatusPolicy::Strict;
        assert_eq!(
            policy.check(Applied, Shortlisted),
            Ok(StatusChange::Changed { from: Applied, to: Shortlisted })
        );
        assert!(policy.check(Interview, Hired).is_ok());
        assert!(matches!(policy.check(Applied, Hired), Err(CoreError::Conflict(_))));
        assert!(matches!(policy.check(Hired, Applied), Err(CoreError::Conflict(_))));
        assert!(matches!(policy.check(Rejected, Shortlisted), Err(CoreError::Conflict(_))));
    }

    #[test]
    fn compatible_policy_accepts_any_write() {
        let policy = StatusPolicy::Compatible;
        assert!(policy.check(Applied, Hired).is_ok());
        assert_eq!(
            policy.check(Hired, Applied),
            Ok(StatusChange::Changed { from: Hired, to: Applied })
        );
    }

    #[test]
    fn same_status_is_unchanged_under_both_policies() {
        assert_eq!(StatusPolicy::Strict.check(Hired, Hired), Ok(StatusChange::Unchanged));
        assert_eq!(StatusPolicy::Compatible.check(Applied, Applied), Ok(StatusChange::Unchanged));
    }

    #[test]
    fn parse_is_exact_on_names() {
        assert_eq!("Shortlisted".parse::<ApplicationStatus>(), Ok(Shortlisted));
        assert_eq!(" Hired ".parse::<ApplicationStatus>(), Ok(Hired));
        assert!("hired".parse::<ApplicationStatus>().is_err());
        assert!("Withdrawn".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn policy_parse() {
        assert_eq!("STRICT".parse::<StatusPolicy>(), Ok(StatusPolicy::Strict));
        assert_eq!("compatible".parse::<StatusPolicy>(), Ok(StatusPolicy::Compatible));
        assert!("loose".parse::<StatusPolicy>().is_err());
    }
}
