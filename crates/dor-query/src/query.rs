//! The query endpoint front end.

use std::sync::Arc;

use dor_http::{Request, RequestBody, Transport};

use crate::error::{QueryError, QueryResult};
use crate::results::{parse_sparql_results, parse_sql2_results, QueryRow};

/// Resource-index search path.
const RISEARCH_PATH: &str = "/risearch";
/// JCR query path used by generation-4 servers.
const JCR_QUERY_PATH: &str = "/modeshape/repo/fedora/query";

/// Query languages the remote endpoints understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryLanguage {
    Sparql,
    Itql,
    Sql2,
}

impl QueryLanguage {
    fn lang_param(&self) -> &'static str {
        match self {
            Self::Sparql => "sparql",
            Self::Itql => "itql",
            Self::Sql2 => "sql2",
        }
    }
}

/// Issues queries against the repository's query endpoints.
///
/// SPARQL and iTQL go to the resource index as tuple queries; SQL2 goes to
/// the JCR endpoint as a posted query body. Both come back as the same
/// flattened row shape.
#[derive(Clone)]
pub struct RepositoryQuery {
    transport: Arc<dyn Transport>,
}

impl RepositoryQuery {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run a query, optionally limited to the first `limit` rows.
    pub async fn query(
        &self,
        text: &str,
        language: QueryLanguage,
        limit: Option<u32>,
    ) -> QueryResult<Vec<QueryRow>> {
        match language {
            QueryLanguage::Sql2 => self.sql2_query(text).await,
            _ => self.tuple_query(text, language, limit).await,
        }
    }

    /// Convenience wrapper for SPARQL.
    pub async fn sparql(&self, text: &str, limit: Option<u32>) -> QueryResult<Vec<QueryRow>> {
        self.query(text, QueryLanguage::Sparql, limit).await
    }

    /// Convenience wrapper for iTQL.
    pub async fn itql(&self, text: &str, limit: Option<u32>) -> QueryResult<Vec<QueryRow>> {
        self.query(text, QueryLanguage::Itql, limit).await
    }

    async fn tuple_query(
        &self,
        text: &str,
        language: QueryLanguage,
        limit: Option<u32>,
    ) -> QueryResult<Vec<QueryRow>> {
        let request = Request::get(RISEARCH_PATH)
            .query("type", "tuples")
            .query("flush", "true")
            .query("format", "Sparql")
            .query("lang", language.lang_param())
            .query("query", text)
            .query_opt("limit", limit.filter(|l| *l > 0));
        let response = self.transport.execute(request).await?;
        parse_sparql_results(&response.text().map_err(QueryError::from)?)
    }

    async fn sql2_query(&self, text: &str) -> QueryResult<Vec<QueryRow>> {
        let request = Request::post(JCR_QUERY_PATH).body(RequestBody::Text {
            content: text.to_string(),
            content_type: "application/jcr+sql2".into(),
        });
        let response = self.transport.execute(request).await?;
        parse_sql2_results(&response.text().map_err(QueryError::from)?)
    }
}
