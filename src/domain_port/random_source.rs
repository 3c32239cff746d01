#[derive(Debug, thiserror::Error)]
#[error("secure random source failed: {0}")]
pub struct RandomSourceError(pub String);

/// Cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomSourceError>;
}
