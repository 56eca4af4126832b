//! RDF serializations the repository can be asked for

use serde::{Deserialize, Serialize};

/// RDF serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfFormat {
    Turtle,
    NTriples,
    RdfXml,
}

impl RdfFormat {
    pub fn from_string(format: &str) -> Option<RdfFormat> {
        match format.to_lowercase().as_str() {
            "turtle" | "ttl" => Some(RdfFormat::Turtle),
            "ntriples" | "n-triples" | "nt" => Some(RdfFormat::NTriples),
            "rdfxml" | "rdf" | "xml" => Some(RdfFormat::RdfXml),
            _ => None,
        }
    }

    /// Resolve a `Content-Type`/`Accept` value, ignoring parameters such as charset.
    pub fn from_media_type(media_type: &str) -> Option<RdfFormat> {
        let essence = media_type.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            "text/turtle" | "application/x-turtle" => Some(RdfFormat::Turtle),
            "application/n-triples" | "text/plain" => Some(RdfFormat::NTriples),
            "application/rdf+xml" => Some(RdfFormat::RdfXml),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::RdfXml => "application/rdf+xml",
        }
    }

    pub(crate) fn to_oxigraph(self) -> oxigraph::io::RdfFormat {
        match self {
            RdfFormat::Turtle => oxigraph::io::RdfFormat::Turtle,
            RdfFormat::NTriples => oxigraph::io::RdfFormat::NTriples,
            RdfFormat::RdfXml => oxigraph::io::RdfFormat::RdfXml,
        }
    }
}

impl Default for RdfFormat {
    fn default() -> Self {
        RdfFormat::NTriples
    }
}
