use crate::conflict::ConflictReport;
use crate::dependency::Dependency;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version string `{0}`")]
    Malformed(String),
    #[error("Unsupported index `{0}`")]
    UnsupportedIndex(usize),
    #[error("Identifier `{index}` of `{version}` cannot be bumped any further")]
    Overflow { version: String, index: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("Unsupported operator `{operator}` in requirement `{requirement}`")]
    UnsupportedOperator {
        operator: String,
        requirement: String,
    },
    #[error("Malformed version `{version}` for requirement `{requirement}`")]
    MalformedVersion {
        version: String,
        requirement: String,
    },
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("library `{name}` advertises an invalid version")]
    InvalidVersion {
        name: String,
        #[source]
        source: VersionError,
    },
    #[error("Could not find `{dependency}` in any of the sources (group `{group}`)")]
    NoMatchingVersion {
        group: String,
        dependency: Box<Dependency>,
    },
    #[error("{0}")]
    VersionConflict(ConflictReport),
    #[error("resolution too deep")]
    ResolutionTooDeep(u64),
}

impl ResolutionError {
    /// The conflict report, if resolution failed because of incompatible requirements
    pub fn conflicts(&self) -> Option<&ConflictReport> {
        match self {
            ResolutionError::VersionConflict(report) => Some(report),
            _ => None,
        }
    }
}
