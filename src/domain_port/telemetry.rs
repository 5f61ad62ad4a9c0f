#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operation {
    Issue,
    Validate,
    Rotate,
    Revoke,
    IssueReset,
    CompleteReset,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Issue => "issue",
            Operation::Validate => "validate",
            Operation::Rotate => "rotate",
            Operation::Revoke => "revoke",
            Operation::IssueReset => "issue_reset",
            Operation::CompleteReset => "complete_reset",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    Start,
    Success,
    /// Carries `TokenError::kind()`.
    Failure(&'static str),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TelemetryEvent {
    pub operation: Operation,
    pub phase: Phase,
}

/// Receives start/success/failure boundaries of the token operations.
pub trait TokenTelemetry: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}
