//! DESCRIBE stage: turn a fetched representation into the subject's triples.

use crate::core::{ChangeEvent, RdfFormat, ResourceDocument};
use crate::error::{Result, SyncError};
use crate::sparql::statements::{describe_query, subject_node};
use oxigraph::io::RdfParser;
use oxigraph::model::{BlankNode, NamedNode, NamedOrBlankNode, Term, Triple};
use std::collections::{HashMap, HashSet};

/// Parsed view of a resource, ready for delete/insert generation.
#[derive(Debug, Clone)]
pub struct Description {
    pub subject: NamedNode,
    /// Query selecting the subject's triples in the triplestore
    pub query: String,
    /// Distinct triples of the fetched document, in document order, with
    /// blank nodes replaced by `<subject#genid-N>` IRIs
    pub triples: Vec<Triple>,
}

impl Description {
    /// Number of triples whose subject is the resource itself.
    pub fn subject_triple_count(&self) -> usize {
        self.triples
            .iter()
            .filter(|t| matches!(&t.subject, NamedOrBlankNode::NamedNode(n) if *n == self.subject))
            .count()
    }
}

/// Replaces blank nodes with hash IRIs of the subject, numbered by first
/// appearance. The same document always yields the same IRIs, and the
/// hash-URI delete removes them with the resource.
struct Skolemizer {
    prefix: String,
    labels: HashMap<BlankNode, NamedNode>,
}

impl Skolemizer {
    fn new(subject: &NamedNode) -> Self {
        Self { prefix: format!("{}#genid-", subject.as_str()), labels: HashMap::new() }
    }

    fn node(&mut self, blank: BlankNode) -> Result<NamedNode> {
        if let Some(node) = self.labels.get(&blank) {
            return Ok(node.clone());
        }
        let node = NamedNode::new(format!("{}{}", self.prefix, self.labels.len()))
            .map_err(|e| SyncError::InvalidIri(e.to_string()))?;
        self.labels.insert(blank, node.clone());
        Ok(node)
    }

    fn triple(&mut self, triple: Triple) -> Result<Triple> {
        let subject = match triple.subject {
            NamedOrBlankNode::BlankNode(blank) => NamedOrBlankNode::from(self.node(blank)?),
            other => other,
        };
        let object = match triple.object {
            Term::BlankNode(blank) => Term::from(self.node(blank)?),
            other => other,
        };
        Ok(Triple::new(subject, triple.predicate, object))
    }
}

/// Parse `document` with the resource URI as base IRI.
///
/// The serialization comes from the document's media type; `fallback` is used
/// when the repository answered with a type we do not recognize.
pub fn describe(
    event: &ChangeEvent,
    document: &ResourceDocument,
    fallback: RdfFormat,
) -> Result<Description> {
    let subject = subject_node(&event.subject_uri())?;
    let format = RdfFormat::from_media_type(&document.media_type).unwrap_or(fallback);

    let parser = RdfParser::from_format(format.to_oxigraph())
        .with_base_iri(subject.as_str())
        .map_err(|e| SyncError::InvalidIri(e.to_string()))?;

    let mut skolemizer = Skolemizer::new(&subject);
    let mut seen = HashSet::new();
    let mut triples = Vec::new();
    for quad in parser.for_reader(document.body.as_slice()) {
        let quad = quad.map_err(|e| {
            SyncError::InvalidDocument(format!(
                "{} ({}): {}",
                event.identifier,
                format.media_type(),
                e
            ))
        })?;
        let triple = skolemizer.triple(Triple::from(quad))?;
        if seen.insert(triple.clone()) {
            triples.push(triple);
        }
    }

    Ok(Description { query: describe_query(&subject), subject, triples })
}
