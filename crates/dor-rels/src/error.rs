use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelsError {
    #[error("malformed RDF/XML: {0}")]
    MalformedXml(String),

    #[error("document has no rdf:Description element")]
    MissingDescription,

    #[error("invalid subject URI: {0}")]
    InvalidSubject(String),
}

pub type RelsResult<T> = Result<T, RelsError>;
