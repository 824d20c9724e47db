/// Failure reported by a [`crate::HypothesisSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    /// Microphone or recognition service access was refused. Ends the run.
    #[error("not-allowed")]
    PermissionDenied,
    /// Anything else the provider reports (`network`, `no-speech`, ...).
    #[error("{0}")]
    Provider(String),
}

impl RecognitionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Spawn(#[from] ractor::SpawnErr),
    #[error("prompter actor call failed: {0}")]
    Call(String),
}
