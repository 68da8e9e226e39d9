//! Result-set parsing for both query endpoints.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use dor_types::pid::RESOURCE_URI_PREFIX;

use crate::error::{QueryError, QueryResult};

/// Whether a bound value names an object or carries a literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Pid,
    Literal,
}

/// One bound value in a result row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValue {
    pub kind: ValueKind,
    /// The literal text, or a resource URI with the reserved prefix
    /// stripped so object references read as bare pids.
    pub value: String,
    /// The full resource URI, present only for resource bindings.
    pub uri: Option<String>,
}

impl QueryValue {
    fn resource(uri: String) -> Self {
        let value = uri
            .strip_prefix(RESOURCE_URI_PREFIX)
            .unwrap_or(&uri)
            .to_string();
        Self {
            kind: ValueKind::Pid,
            value,
            uri: Some(uri),
        }
    }

    fn literal(value: String) -> Self {
        Self {
            kind: ValueKind::Literal,
            value,
            uri: None,
        }
    }
}

/// One result row: query variable name to bound value.
pub type QueryRow = BTreeMap<String, QueryValue>;

/// Parse a SPARQL tuple-result XML document into its rows.
///
/// Each child element of a `result` is one binding: the element's local
/// name is the variable, a `uri` attribute marks a resource binding, and
/// character data carries a literal.
pub fn parse_sparql_results(xml: &str) -> QueryResult<Vec<QueryRow>> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<QueryRow> = Vec::new();
    let mut in_results = false;
    let mut row: Option<QueryRow> = None;
    // Variable name and accumulated text of an open literal binding.
    let mut open_binding: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "results" {
                    in_results = true;
                } else if in_results && row.is_none() && name == "result" {
                    row = Some(QueryRow::new());
                } else if let Some(current) = row.as_mut() {
                    match binding_uri(&e)? {
                        Some(uri) => {
                            current.insert(name, QueryValue::resource(uri));
                        }
                        None => open_binding = Some((name, String::new())),
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if let Some(current) = row.as_mut() {
                    let value = match binding_uri(&e)? {
                        Some(uri) => QueryValue::resource(uri),
                        None => QueryValue::literal(String::new()),
                    };
                    current.insert(name, value);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = open_binding.as_mut() {
                    let piece = t
                        .unescape()
                        .map_err(|e| QueryError::Parse(e.to_string()))?;
                    text.push_str(&piece);
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if let Some((var, text)) = open_binding.take() {
                    if var == name {
                        if let Some(current) = row.as_mut() {
                            current.insert(var, QueryValue::literal(text));
                        }
                    } else {
                        open_binding = Some((var, text));
                    }
                }
                if name == "result" {
                    if let Some(done) = row.take() {
                        rows.push(done);
                    }
                } else if name == "results" {
                    in_results = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(QueryError::Parse(format!("malformed result XML: {e}"))),
        }
    }
    Ok(rows)
}

fn binding_uri(e: &quick_xml::events::BytesStart<'_>) -> QueryResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| QueryError::Parse(e.to_string()))?;
        if attr.key.local_name().as_ref() == b"uri" {
            let value = attr
                .unescape_value()
                .map_err(|e| QueryError::Parse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a JCR-SQL2 JSON result into the same row shape.
///
/// The JCR endpoint is far less expressive: every column comes back as a
/// literal except `jcr:name`, which names the node and is exposed as a pid
/// binding.
pub fn parse_sql2_results(json: &str) -> QueryResult<Vec<QueryRow>> {
    let document: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| QueryError::Parse(format!("invalid SQL2 result JSON: {e}")))?;
    let rows = document
        .get("rows")
        .and_then(|r| r.as_array())
        .ok_or_else(|| QueryError::Parse("SQL2 result carries no rows array".into()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let object = row
            .as_object()
            .ok_or_else(|| QueryError::Parse("SQL2 row is not an object".into()))?;
        let mut parsed = QueryRow::new();
        for (column, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let bound = if column == "jcr:name" {
                QueryValue {
                    kind: ValueKind::Pid,
                    uri: Some(text.clone()),
                    value: text,
                }
            } else {
                QueryValue::literal(text)
            };
            parsed.insert(column.clone(), bound);
        }
        out.push(parsed);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPARQL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sparql xmlns="http://www.w3.org/2001/sw/DataAccess/rf1/result">
  <head>
    <variable name="object"/>
    <variable name="title"/>
  </head>
  <results>
    <result>
      <object uri="info:fedora/islandora:root"/>
      <title>Top-level Collection</title>
    </result>
    <result>
      <object uri="info:fedora/islandora:sp_basic_image_collection"/>
      <title>Basic Image Collection</title>
    </result>
    <result>
      <object uri="http://example.org/external"/>
      <title>External thing</title>
    </result>
  </results>
</sparql>"#;

    #[test]
    fn row_count_matches_result_count() {
        let rows = parse_sparql_results(SPARQL).unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(
                row.keys().collect::<Vec<_>>(),
                vec!["object", "title"],
                "row keys follow the query's variable names"
            );
        }
    }

    #[test]
    fn reserved_prefix_stripped_in_value_kept_in_uri() {
        let rows = parse_sparql_results(SPARQL).unwrap();
        let object = &rows[0]["object"];
        assert_eq!(object.kind, ValueKind::Pid);
        assert_eq!(object.value, "islandora:root");
        assert_eq!(object.uri.as_deref(), Some("info:fedora/islandora:root"));
    }

    #[test]
    fn foreign_uri_left_untouched() {
        let rows = parse_sparql_results(SPARQL).unwrap();
        let object = &rows[2]["object"];
        assert_eq!(object.value, "http://example.org/external");
        assert_eq!(object.uri.as_deref(), Some("http://example.org/external"));
    }

    #[test]
    fn literals_have_no_uri() {
        let rows = parse_sparql_results(SPARQL).unwrap();
        let title = &rows[0]["title"];
        assert_eq!(title.kind, ValueKind::Literal);
        assert_eq!(title.value, "Top-level Collection");
        assert!(title.uri.is_none());
    }

    #[test]
    fn empty_results_parse_to_no_rows() {
        let xml = r#"<sparql xmlns="http://www.w3.org/2001/sw/DataAccess/rf1/result">
  <head><variable name="x"/></head>
  <results></results>
</sparql>"#;
        assert!(parse_sparql_results(xml).unwrap().is_empty());
    }

    #[test]
    fn escaped_literal_text_unescapes() {
        let xml = r#"<sparql><results><result><title>a &lt; b &amp; c</title></result></results></sparql>"#;
        let rows = parse_sparql_results(xml).unwrap();
        assert_eq!(rows[0]["title"].value, "a < b & c");
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        assert!(matches!(
            parse_sparql_results("<sparql><results><result"),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn sql2_rows_flatten() {
        let json = r#"{"rows": [
            {"jcr:name": "test:1", "jcr:score": "1.0"},
            {"jcr:name": "test:2", "jcr:score": "0.5"}
        ]}"#;
        let rows = parse_sql2_results(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["jcr:name"].kind, ValueKind::Pid);
        assert_eq!(rows[0]["jcr:name"].value, "test:1");
        assert_eq!(rows[0]["jcr:score"].kind, ValueKind::Literal);
    }

    #[test]
    fn sql2_without_rows_is_parse_error() {
        assert!(matches!(
            parse_sql2_results("{}"),
            Err(QueryError::Parse(_))
        ));
    }
}
