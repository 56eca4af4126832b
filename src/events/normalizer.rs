//! Change Normalizer
//!
//! Maps a header map onto a [`ChangeEvent`]. Two header conventions are in the
//! wild for the same pair of fields: the component-style names
//! (`CamelFcrepoIdentifier`, `CamelFcrepoBaseUrl`) and the message-style names
//! (`org.fcrepo.jms.identifier`, `org.fcrepo.jms.baseURL`). Both are accepted
//! as aliases of the canonical `identifier` / `base_url` / `operation` keys, and
//! they may be mixed within a single event.

use crate::core::{ChangeEvent, Operation};
use crate::error::{Result, SyncError};
use std::collections::HashMap;

pub const IDENTIFIER_HEADERS: &[&str] =
    &["identifier", "CamelFcrepoIdentifier", "org.fcrepo.jms.identifier"];

pub const BASE_URL_HEADERS: &[&str] =
    &["base_url", "baseUrl", "CamelFcrepoBaseUrl", "org.fcrepo.jms.baseURL"];

pub const OPERATION_HEADERS: &[&str] =
    &["operation", "CamelHttpMethod", "org.fcrepo.jms.eventType"];

/// Build a [`ChangeEvent`] from a header map.
///
/// Header names are matched case-insensitively, canonical name first. Blank
/// values count as missing. When no operation header is present the event is
/// an update, i.e. a plain request to re-index the resource.
pub fn normalize(headers: &HashMap<String, String>) -> Result<ChangeEvent> {
    let base_url = find_header(headers, BASE_URL_HEADERS).ok_or(SyncError::MissingBaseUrl)?;
    let identifier =
        find_header(headers, IDENTIFIER_HEADERS).ok_or(SyncError::MissingIdentifier)?;

    let operation = match find_header(headers, OPERATION_HEADERS) {
        Some(raw) => parse_operation(raw)?,
        None => Operation::Update,
    };

    Ok(ChangeEvent::new(identifier, base_url, operation))
}

/// Parse an operation value: a verb, an HTTP method or one or more event types.
///
/// Event types may be given as full URIs; only the fragment (or final path
/// segment) is considered. A comma-separated list resolves to the strongest
/// operation it contains: delete, then create, then update.
pub fn parse_operation(raw: &str) -> Result<Operation> {
    let mut resolved: Option<Operation> = None;

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let operation = operation_for_token(local_name(token))
            .ok_or_else(|| SyncError::UnknownOperation(raw.to_string()))?;
        resolved = Some(match resolved {
            Some(current) if strength(current) >= strength(operation) => current,
            _ => operation,
        });
    }

    resolved.ok_or_else(|| SyncError::UnknownOperation(raw.to_string()))
}

fn find_header<'a>(headers: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(name) && !value.trim().is_empty())
            .map(|(_, value)| value.trim())
    })
}

fn local_name(token: &str) -> &str {
    token.rsplit(|c| c == '#' || c == '/').next().unwrap_or(token)
}

fn operation_for_token(token: &str) -> Option<Operation> {
    match token.to_lowercase().as_str() {
        "create" | "post" | "node_added" | "resourcecreation" => Some(Operation::Create),
        "update" | "put" | "patch" | "property_added" | "property_changed"
        | "property_removed" | "resourcemodification" => Some(Operation::Update),
        "delete" | "node_removed" | "resourcedeletion" => Some(Operation::Delete),
        _ => None,
    }
}

fn strength(operation: Operation) -> u8 {
    match operation {
        Operation::Update => 0,
        Operation::Create => 1,
        Operation::Delete => 2,
    }
}
