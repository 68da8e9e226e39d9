use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
