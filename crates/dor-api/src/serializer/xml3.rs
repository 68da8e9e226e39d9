//! Parsers for the XML documents generation-3 servers return.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use dor_types::{
    ChecksumKind, ControlGroup, DatastreamBrief, DatastreamProfile, ObjectProfile, ObjectState,
    Pid, RepositoryInfo, Validation,
};

use crate::error::{ApiError, ApiResult};
use crate::options::{FindObjectsResult, SearchSession};
use crate::serializer::{opt_text, parse_datetime};

/// One element of a flattened document: depth, local name, attributes, and
/// accumulated character data.
#[derive(Clone, Debug)]
struct Element {
    depth: usize,
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn text_opt(&self) -> Option<String> {
        opt_text(&self.text)
    }
}

/// Flatten a document into its elements in document order.
///
/// Namespace prefixes are dropped: the documents we parse never reuse a
/// local name across namespaces.
fn flatten(xml: &str) -> ApiResult<Vec<Element>> {
    let mut reader = Reader::from_str(xml);
    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = element_at(open.len(), &e)?;
                elements.push(element);
                open.push(elements.len() - 1);
            }
            Ok(Event::Empty(e)) => {
                let element = element_at(open.len(), &e)?;
                elements.push(element);
            }
            Ok(Event::Text(t)) => {
                if let Some(&idx) = open.last() {
                    let piece = t.unescape().map_err(|e| ApiError::Parse(e.to_string()))?;
                    elements[idx].text.push_str(&piece);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(&idx) = open.last() {
                    elements[idx]
                        .text
                        .push_str(&String::from_utf8_lossy(c.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ApiError::Parse(format!("malformed XML: {e}"))),
        }
    }
    Ok(elements)
}

fn element_at(depth: usize, e: &quick_xml::events::BytesStart<'_>) -> ApiResult<Element> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ApiError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ApiError::Parse(e.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        depth,
        name,
        attrs,
        text: String::new(),
    })
}

/// Parse the `/describe` document.
pub fn describe(xml: &str) -> ApiResult<RepositoryInfo> {
    let elements = flatten(xml)?;
    let mut info = RepositoryInfo::default();
    for el in &elements {
        match el.name.as_str() {
            "repositoryName" => info.name = el.text_opt(),
            "repositoryBaseURL" => info.base_url = el.text_opt(),
            "repositoryVersion" => {
                if let Some(v) = el.text_opt() {
                    info.version = v;
                }
            }
            "PID-namespaceIdentifier" => info.pid_namespace = el.text_opt(),
            "retainPID" => {
                if let Some(ns) = el.text_opt() {
                    info.retain_namespaces.push(ns);
                }
            }
            _ => {}
        }
    }
    if info.version.is_empty() {
        return Err(ApiError::Parse(
            "describe document carries no repositoryVersion".into(),
        ));
    }
    Ok(info)
}

/// Parse an object profile document.
pub fn object_profile(xml: &str) -> ApiResult<ObjectProfile> {
    let elements = flatten(xml)?;
    let mut profile = ObjectProfile::default();
    for el in &elements {
        match el.name.as_str() {
            "objLabel" => profile.label = el.text_opt(),
            "objOwnerId" => profile.owner = el.text_opt(),
            "objState" => {
                if let Some(code) = el.text_opt() {
                    profile.state = ObjectState::from_code(&code)?;
                }
            }
            "objCreateDate" => profile.created = parse_opt_datetime(el)?,
            "objLastModDate" => profile.modified = parse_opt_datetime(el)?,
            "model" => {
                if let Some(model) = el.text_opt() {
                    profile.models.push(model);
                }
            }
            _ => {}
        }
    }
    Ok(profile)
}

fn parse_opt_datetime(el: &Element) -> ApiResult<Option<DateTime<Utc>>> {
    el.text_opt().map(|t| parse_datetime(&t)).transpose()
}

fn datastream_profile_from(fields: &[&Element]) -> ApiResult<DatastreamProfile> {
    let mut profile = DatastreamProfile {
        versionable: true,
        ..Default::default()
    };
    for el in fields {
        match el.name.as_str() {
            "dsLabel" => profile.label = el.text_opt(),
            "dsVersionID" => profile.version_id = el.text_opt(),
            "dsCreateDate" => profile.created = parse_opt_datetime(el)?,
            "dsState" => {
                if let Some(code) = el.text_opt() {
                    profile.state = ObjectState::from_code(&code)?;
                }
            }
            "dsMIME" => profile.mime_type = el.text_opt(),
            "dsFormatURI" => profile.format_uri = el.text_opt(),
            "dsControlGroup" => {
                if let Some(code) = el.text_opt() {
                    profile.control_group = ControlGroup::from_code(&code)?;
                }
            }
            "dsSize" => {
                if let Some(text) = el.text_opt() {
                    profile.size = Some(
                        text.parse()
                            .map_err(|_| ApiError::Parse(format!("invalid dsSize: {text}")))?,
                    );
                }
            }
            "dsVersionable" => {
                if let Some(text) = el.text_opt() {
                    profile.versionable = text == "true";
                }
            }
            "dsChecksumType" => {
                if let Some(text) = el.text_opt() {
                    profile.checksum_kind = Some(ChecksumKind::parse(&text)?);
                }
            }
            "dsChecksum" => {
                profile.checksum = el.text_opt().filter(|c| c != "none");
            }
            "dsLocation" => profile.location = el.text_opt(),
            "dsLocationType" => profile.location_type = el.text_opt(),
            "dsAltID" => {
                if let Some(id) = el.text_opt() {
                    profile.alt_ids.push(id);
                }
            }
            _ => {}
        }
    }
    Ok(profile)
}

/// Parse a datastream profile document.
pub fn datastream_profile(xml: &str) -> ApiResult<DatastreamProfile> {
    let elements = flatten(xml)?;
    let refs: Vec<&Element> = elements.iter().collect();
    datastream_profile_from(&refs)
}

/// Parse a datastream history document: a sequence of profiles, newest
/// first, exactly as the server orders them.
pub fn datastream_history(xml: &str) -> ApiResult<Vec<DatastreamProfile>> {
    let elements = flatten(xml)?;
    let mut groups: Vec<Vec<&Element>> = Vec::new();
    for el in &elements {
        if el.name == "datastreamProfile" {
            groups.push(Vec::new());
        } else if let Some(group) = groups.last_mut() {
            group.push(el);
        }
    }
    groups
        .iter()
        .map(|group| datastream_profile_from(group))
        .collect()
}

/// Parse the list-datastreams document.
pub fn datastream_list(xml: &str) -> ApiResult<Vec<DatastreamBrief>> {
    let elements = flatten(xml)?;
    let mut out = Vec::new();
    for el in &elements {
        if el.name == "datastream" {
            let dsid = el
                .attr("dsid")
                .ok_or_else(|| ApiError::Parse("datastream element without dsid".into()))?;
            out.push(DatastreamBrief {
                dsid: dsid.to_string(),
                label: el.attr("label").and_then(opt_text),
                mime_type: el.attr("mimeType").and_then(opt_text),
            });
        }
    }
    Ok(out)
}

/// Parse the next-pid document.
pub fn pid_list(xml: &str) -> ApiResult<Vec<Pid>> {
    let elements = flatten(xml)?;
    elements
        .iter()
        .filter(|el| el.name == "pid")
        .filter_map(|el| el.text_opt())
        .map(|text| Pid::new(text).map_err(ApiError::from))
        .collect()
}

/// Parse the object history document into its change timestamps.
pub fn object_history(xml: &str) -> ApiResult<Vec<DateTime<Utc>>> {
    let elements = flatten(xml)?;
    elements
        .iter()
        .filter(|el| el.name == "objectChangeDate")
        .filter_map(|el| el.text_opt())
        .map(|text| parse_datetime(&text))
        .collect()
}

/// Parse a find-objects result page.
pub fn find_objects(xml: &str) -> ApiResult<FindObjectsResult> {
    let elements = flatten(xml)?;
    let mut result = FindObjectsResult::default();
    let mut token = None;
    let mut cursor = None;
    let mut expires = None;
    let mut row: Option<BTreeMap<String, Vec<String>>> = None;
    let mut row_depth = 0usize;

    for el in &elements {
        match el.name.as_str() {
            "token" => token = el.text_opt(),
            "cursor" => cursor = el.text_opt().and_then(|t| t.parse().ok()),
            "expirationDate" => expires = el.text_opt(),
            "objectFields" => {
                if let Some(done) = row.take() {
                    result.results.push(done);
                }
                row = Some(BTreeMap::new());
                row_depth = el.depth;
            }
            _ => {
                if let Some(fields) = row.as_mut() {
                    if el.depth == row_depth + 1 {
                        if let Some(value) = el.text_opt() {
                            fields.entry(el.name.clone()).or_default().push(value);
                        }
                    }
                }
            }
        }
    }
    if let Some(done) = row.take() {
        result.results.push(done);
    }
    if let Some(token) = token {
        result.session = Some(SearchSession {
            token,
            cursor,
            expires,
        });
    }
    Ok(result)
}

/// Parse an object validation report.
pub fn validation(xml: &str) -> ApiResult<Validation> {
    let elements = flatten(xml)?;
    let mut report = Validation::default();
    let mut section = String::new();
    let mut current_ds: Option<String> = None;

    for el in &elements {
        match el.name.as_str() {
            "validation" => {
                report.valid = el.attr("valid") == Some("true");
            }
            "contentModels" | "problems" | "datastreamProblems" => {
                section = el.name.clone();
                current_ds = None;
            }
            "model" => {
                if let Some(model) = el.text_opt() {
                    report.content_models.push(model);
                }
            }
            "datastream" => {
                current_ds = el.attr("datastreamID").map(str::to_string);
            }
            "problem" => {
                if let Some(problem) = el.text_opt() {
                    match (&section[..], &current_ds) {
                        ("datastreamProblems", Some(dsid)) => {
                            report
                                .datastream_problems
                                .entry(dsid.clone())
                                .or_default()
                                .push(problem);
                        }
                        _ => report.problems.push(problem),
                    }
                }
            }
            _ => {}
        }
    }
    Ok(report)
}
