use thiserror::Error;

/// Errors returned by engine transitions.
///
/// None of these leave a partially-applied document behind: every transition
/// either returns a complete new value or an error and the caller's input is
/// untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No text node carries this `entity_id`.
    #[error("entity {0:?} not found")]
    EntityNotFound(String),

    /// No selection-list candidate carries this `entity_id`.
    #[error("selection candidate {0:?} not found")]
    CandidateNotFound(String),

    /// The chapter has no version with this number.
    #[error("version {0} not found")]
    VersionNotFound(u32),

    /// Deleting the only remaining version of a chapter.
    #[error("cannot delete the last remaining version")]
    LastVersion,

    /// Echo suppression was armed while already armed. Nested programmatic
    /// mutations must be coalesced into one.
    #[error("echo suppression is already armed")]
    AlreadySuppressing,
}

impl EngineError {
    /// `true` for the "referenced thing is absent" family, which callers log
    /// and treat as a no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::EntityNotFound(_)
                | EngineError::CandidateNotFound(_)
                | EngineError::VersionNotFound(_)
        )
    }
}
