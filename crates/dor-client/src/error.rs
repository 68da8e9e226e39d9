use thiserror::Error;

use dor_api::ApiError;
use dor_cache::CacheError;
use dor_object::ObjectError;
use dor_query::QueryError;
use dor_types::TypeError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("bad argument: {0}")]
    BadArgument(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
