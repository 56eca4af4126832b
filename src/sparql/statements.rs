//! Builders for the SPARQL query and update strings sent to the triplestore.

use crate::error::{Result, SyncError};
use oxigraph::model::{Literal, NamedNode, Triple};
use std::fmt::Write;

/// Validate a resource URI as a SPARQL IRI.
pub fn subject_node(uri: &str) -> Result<NamedNode> {
    NamedNode::new(uri).map_err(|e| SyncError::InvalidIri(format!("{}: {}", uri, e)))
}

/// Query selecting every triple whose subject is the resource.
pub fn describe_query(subject: &NamedNode) -> String {
    format!("CONSTRUCT {{ {s} ?p ?o }} WHERE {{ {s} ?p ?o }}", s = subject)
}

/// Update removing the resource's triples, including those of its hash URIs
/// (`<uri#part>`), in a single request.
pub fn delete_statement(subject: &NamedNode) -> String {
    let hash_prefix = Literal::new_simple_literal(format!("{}#", subject.as_str()));
    format!(
        "DELETE {{ ?h ?hp ?ho }} WHERE {{ ?h ?hp ?ho . \
         FILTER(isIRI(?h) && STRSTARTS(STR(?h), {prefix})) }} ;\n\
         DELETE WHERE {{ {s} ?p ?o }}",
        s = subject,
        prefix = hash_prefix
    )
}

/// `INSERT DATA` for the given triples, or `None` when there is nothing to insert.
pub fn insert_statement(triples: &[Triple]) -> Option<String> {
    if triples.is_empty() {
        return None;
    }

    let mut statement = String::from("INSERT DATA {\n");
    for triple in triples {
        // Writing to a String cannot fail
        let _ = writeln!(statement, "  {} .", triple);
    }
    statement.push('}');
    Some(statement)
}
