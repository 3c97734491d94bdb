/// Outcome of the startup verification handshake.
///
/// Purely informational: a mailer with a resolved profile sends regardless of
/// what this reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
    Unconfigured,
}

impl Readiness {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Readiness::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Pending => "pending",
            Readiness::Ready => "ready",
            Readiness::Failed(_) => "failed",
            Readiness::Unconfigured => "unconfigured",
        }
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Readiness::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.as_str()),
        }
    }
}
