//! RDF/XML relationship document parsing and serialization.

use std::collections::BTreeMap;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use dor_types::Pid;

use crate::error::{RelsError, RelsResult};
use crate::triple::{Predicate, Triple, TripleObject};
use crate::RDF_NAMESPACE;

/// An editable RDF/XML relationship document.
///
/// The document keeps its triples in insertion order and remembers which
/// prefix each namespace was registered under so that serialization is
/// stable. Namespaces encountered without a registration are assigned
/// `ns1`, `ns2`, … prefixes at serialization time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipDocument {
    subject_uri: String,
    namespaces: BTreeMap<String, String>,
    triples: Vec<Triple>,
}

impl RelationshipDocument {
    /// Create an empty document about the given object.
    pub fn new(pid: &Pid) -> Self {
        Self {
            subject_uri: pid.to_uri(),
            namespaces: BTreeMap::new(),
            triples: Vec::new(),
        }
    }

    /// Parse an RDF/XML document.
    ///
    /// All `rdf:Description` blocks are read; the first block's `rdf:about`
    /// becomes the document subject.
    pub fn parse(xml: &str) -> RelsResult<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut subject_uri: Option<String> = None;
        let mut current_subject: Option<String> = None;
        let mut triples = Vec::new();
        let mut depth = 0usize;

        // State for an open predicate element whose literal text is pending.
        let mut pending: Option<(Predicate, Option<String>, String)> = None;

        loop {
            match reader.read_resolved_event() {
                Ok((resolve, Event::Start(e))) => {
                    depth += 1;
                    match depth {
                        1 => {} // rdf:RDF root
                        2 => {
                            let about = attribute_value(&e, b"about")?;
                            let about =
                                about.ok_or(RelsError::MissingDescription)?;
                            if subject_uri.is_none() {
                                subject_uri = Some(about.clone());
                            }
                            current_subject = Some(about);
                        }
                        3 => {
                            let predicate = predicate_for(resolve, &e)?;
                            let resource = attribute_value(&e, b"resource")?;
                            let datatype = attribute_value(&e, b"datatype")?;
                            match resource {
                                Some(uri) => triples.push(Triple {
                                    subject: current_subject.clone(),
                                    predicate,
                                    object: TripleObject::Resource(uri),
                                }),
                                None => pending = Some((predicate, datatype, String::new())),
                            }
                        }
                        _ => {}
                    }
                }
                Ok((resolve, Event::Empty(e))) => {
                    if depth == 1 {
                        // Self-closing description with no triples.
                        if let Some(about) = attribute_value(&e, b"about")? {
                            if subject_uri.is_none() {
                                subject_uri = Some(about);
                            }
                        }
                    } else if depth == 2 {
                        let predicate = predicate_for(resolve, &e)?;
                        let resource = attribute_value(&e, b"resource")?;
                        let object = match resource {
                            Some(uri) => TripleObject::Resource(uri),
                            None => TripleObject::literal(""),
                        };
                        triples.push(Triple {
                            subject: current_subject.clone(),
                            predicate,
                            object,
                        });
                    }
                }
                Ok((_, Event::Text(t))) => {
                    if let Some((_, _, text)) = pending.as_mut() {
                        let piece = t
                            .unescape()
                            .map_err(|e| RelsError::MalformedXml(e.to_string()))?;
                        text.push_str(&piece);
                    }
                }
                Ok((_, Event::End(_))) => {
                    if depth == 3 {
                        if let Some((predicate, datatype, value)) = pending.take() {
                            triples.push(Triple {
                                subject: current_subject.clone(),
                                predicate,
                                object: TripleObject::Literal { value, datatype },
                            });
                        }
                    }
                    if depth == 2 {
                        current_subject = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => return Err(RelsError::MalformedXml(e.to_string())),
            }
        }

        let subject_uri = subject_uri.ok_or(RelsError::MissingDescription)?;
        Ok(Self {
            subject_uri,
            namespaces: BTreeMap::new(),
            triples,
        })
    }

    /// The resource URI this document describes.
    pub fn subject_uri(&self) -> &str {
        &self.subject_uri
    }

    /// All triples in insertion order.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Register a serialization prefix for a namespace.
    pub fn register_namespace(&mut self, alias: impl Into<String>, namespace: impl Into<String>) {
        self.namespaces.insert(alias.into(), namespace.into());
    }

    /// Add a triple about the document subject.
    pub fn add(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        object: TripleObject,
    ) {
        let namespace = namespace.into();
        let alias = self.alias_for(&namespace);
        self.triples.push(Triple {
            subject: None,
            predicate: Predicate {
                namespace,
                alias,
                name: name.into(),
            },
            object,
        });
    }

    /// Triples matching the given namespace and/or predicate name.
    /// `None` matches anything.
    pub fn matching(&self, namespace: Option<&str>, name: Option<&str>) -> Vec<&Triple> {
        self.triples
            .iter()
            .filter(|t| namespace.map_or(true, |ns| t.predicate.namespace == ns))
            .filter(|t| name.map_or(true, |n| t.predicate.name == n))
            .collect()
    }

    /// Remove matching triples, returning how many were removed.
    /// `None` filters match anything; `object_value` compares against the
    /// raw object value.
    pub fn remove(
        &mut self,
        namespace: Option<&str>,
        name: Option<&str>,
        object_value: Option<&str>,
    ) -> usize {
        let before = self.triples.len();
        self.triples.retain(|t| {
            let hit = namespace.map_or(true, |ns| t.predicate.namespace == ns)
                && name.map_or(true, |n| t.predicate.name == n)
                && object_value.map_or(true, |v| t.object.value() == v);
            !hit
        });
        before - self.triples.len()
    }

    /// Re-point the document (and every triple about the old subject) at a
    /// different object.
    pub fn change_subject(&mut self, pid: &Pid) {
        let old = std::mem::replace(&mut self.subject_uri, pid.to_uri());
        for triple in &mut self.triples {
            if triple.subject.as_deref() == Some(old.as_str()) {
                triple.subject = None;
            }
        }
    }

    fn alias_for(&self, namespace: &str) -> Option<String> {
        self.namespaces
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(alias, _)| alias.clone())
    }

    /// Serialize back to RDF/XML.
    pub fn to_xml(&self) -> String {
        // Assign prefixes: registered aliases first, then ns1, ns2, … for
        // namespaces only seen on triples.
        let mut prefixes: Vec<(String, String)> = self
            .namespaces
            .iter()
            .map(|(alias, uri)| (alias.clone(), uri.clone()))
            .collect();
        let mut auto = 0usize;
        for triple in &self.triples {
            let ns = &triple.predicate.namespace;
            if !prefixes.iter().any(|(_, uri)| uri == ns) {
                auto += 1;
                prefixes.push((format!("ns{auto}"), ns.clone()));
            }
        }

        let prefix_of = |ns: &str| -> String {
            prefixes
                .iter()
                .find(|(_, uri)| uri == ns)
                .map(|(alias, _)| alias.clone())
                .unwrap_or_else(|| "ns".to_string())
        };

        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!("<rdf:RDF xmlns:rdf=\"{RDF_NAMESPACE}\""));
        for (alias, uri) in &prefixes {
            out.push_str(&format!(" xmlns:{alias}=\"{}\"", escape(uri)));
        }
        out.push_str(">\n");

        // One Description block per distinct subject, document subject first.
        let mut subjects: Vec<&str> = vec![self.subject_uri.as_str()];
        for triple in &self.triples {
            if let Some(s) = triple.subject.as_deref() {
                if !subjects.contains(&s) {
                    subjects.push(s);
                }
            }
        }

        for subject in subjects {
            let block: Vec<&Triple> = self
                .triples
                .iter()
                .filter(|t| t.subject.as_deref().unwrap_or(&self.subject_uri) == subject)
                .collect();
            if block.is_empty() && subject != self.subject_uri {
                continue;
            }
            out.push_str(&format!(
                "  <rdf:Description rdf:about=\"{}\">\n",
                escape(subject)
            ));
            for triple in block {
                let prefix = prefix_of(&triple.predicate.namespace);
                let name = &triple.predicate.name;
                match &triple.object {
                    TripleObject::Resource(uri) => {
                        out.push_str(&format!(
                            "    <{prefix}:{name} rdf:resource=\"{}\"></{prefix}:{name}>\n",
                            escape(uri)
                        ));
                    }
                    TripleObject::Literal { value, datatype } => match datatype {
                        Some(dt) => out.push_str(&format!(
                            "    <{prefix}:{name} rdf:datatype=\"{}\">{}</{prefix}:{name}>\n",
                            escape(dt),
                            escape(value)
                        )),
                        None => out.push_str(&format!(
                            "    <{prefix}:{name}>{}</{prefix}:{name}>\n",
                            escape(value)
                        )),
                    },
                }
            }
            out.push_str("  </rdf:Description>\n");
        }
        out.push_str("</rdf:RDF>\n");
        out
    }
}

fn attribute_value(
    e: &quick_xml::events::BytesStart<'_>,
    local: &[u8],
) -> RelsResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| RelsError::MalformedXml(e.to_string()))?;
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|e| RelsError::MalformedXml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn predicate_for(
    resolve: ResolveResult<'_>,
    e: &quick_xml::events::BytesStart<'_>,
) -> RelsResult<Predicate> {
    let namespace = match resolve {
        ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.into_inner()).into_owned(),
        _ => String::new(),
    };
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let alias = e
        .name()
        .prefix()
        .map(|p| String::from_utf8_lossy(p.into_inner()).into_owned());
    Ok(Predicate {
        namespace,
        alias,
        name,
    })
}
