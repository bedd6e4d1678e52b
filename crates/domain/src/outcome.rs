use super::{DomainError, ServiceRecord};

/// Records produced by one resolution, in backend order.
///
/// Empty means the name exists without data of the queried type (NODATA).
pub type AnswerSet = Vec<ServiceRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The name does not exist: NXDOMAIN, or fallthrough.
    NameError,
    /// Backend, transport or data failure: SERVFAIL.
    TransientError,
}

/// Result of resolving one query; exactly one per query.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success { records: AnswerSet, truncated: bool },
    NameError,
    TransientError(DomainError),
}

impl Outcome {
    pub fn from_error(err: DomainError) -> Self {
        match classify(&err) {
            FailureClass::NameError => Outcome::NameError,
            FailureClass::TransientError => Outcome::TransientError(err),
        }
    }
}

/// Only an explicit backend "not found" status is a naming failure; decode
/// errors, deadlines and transport faults are all transient.
pub fn classify(err: &DomainError) -> FailureClass {
    match err {
        DomainError::Backend(backend) if backend.is_not_found() => FailureClass::NameError,
        _ => FailureClass::TransientError,
    }
}
