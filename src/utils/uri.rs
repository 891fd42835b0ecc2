// ! URI handling utilities
// !
// ! Module provides validation and template matching for the resource URIs
// ! used on the capability-exchange channel. Templates use a single
// ! `{name}` placeholder syntax, one placeholder per path segment, matched
// ! positionally against the concrete URI.

use crate::core::error::{CapError, CapResult};
use std::collections::HashMap;
use url::Url;

/// Validate that a string is usable as a resource URI
pub fn validate_uri(uri: &str) -> CapResult<()> {
    if uri.is_empty() {
        return Err(CapError::InvalidUri("URI cannot be empty".to_string()));
    }

    if uri.contains('\0') || uri.contains('\n') || uri.contains('\r') {
        return Err(CapError::InvalidUri(
            "URI contains invalid characters".to_string(),
        ));
    }

    if !uri.contains("://") {
        return Err(CapError::InvalidUri(format!(
            "URI '{uri}' missing scheme separator"
        )));
    }

    Ok(())
}

/// Extract the scheme from a URI, using the url crate where it parses and
/// falling back to a plain split for scheme-only shapes like `users://all`
pub fn uri_scheme(uri: &str) -> CapResult<String> {
    if let Ok(parsed) = Url::parse(uri) {
        return Ok(parsed.scheme().to_string());
    }
    uri.split_once("://")
        .map(|(scheme, _)| scheme.to_string())
        .ok_or_else(|| CapError::InvalidUri(format!("URI '{uri}' has no scheme")))
}

/// Split a URI into (scheme, path segments after `://`)
fn split_segments(uri: &str) -> CapResult<(&str, Vec<&str>)> {
    let (scheme, rest) = uri
        .split_once("://")
        .ok_or_else(|| CapError::InvalidUri(format!("URI '{uri}' missing scheme separator")))?;
    Ok((scheme, rest.split('/').collect()))
}

/// Whether a template segment is a `{name}` placeholder, returning the name
fn placeholder_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

/// Whether a concrete URI could belong to a template at all: same scheme and
/// every literal segment equal. Used to pick the template before committing
/// to a full match.
pub fn template_covers(template: &str, uri: &str) -> bool {
    let (Ok((template_scheme, template_segments)), Ok((uri_scheme, uri_segments))) =
        (split_segments(template), split_segments(uri))
    else {
        return false;
    };

    if template_scheme != uri_scheme {
        return false;
    }

    // Literal segments must agree for however far both run; a count mismatch
    // is reported later by extract_template_params as UnresolvedTemplate.
    template_segments
        .iter()
        .zip(uri_segments.iter())
        .all(|(t, u)| placeholder_name(t).is_some() || t == u)
}

/// Match a concrete URI against a URI template, extracting placeholder values
/// by position.
///
/// Fails with `UnresolvedTemplate` when the segment counts differ and with
/// `InvalidUri`/`UnresolvedTemplate` on scheme or literal mismatches.
pub fn extract_template_params(template: &str, uri: &str) -> CapResult<HashMap<String, String>> {
    let (template_scheme, template_segments) = split_segments(template)?;
    let (concrete_scheme, uri_segments) = split_segments(uri)?;

    if template_scheme != concrete_scheme {
        return Err(CapError::UnresolvedTemplate(format!(
            "scheme '{concrete_scheme}' does not match template '{template}'"
        )));
    }

    if template_segments.len() != uri_segments.len() {
        return Err(CapError::UnresolvedTemplate(format!(
            "'{uri}' has {} segments, template '{template}' expects {}",
            uri_segments.len(),
            template_segments.len()
        )));
    }

    let mut params = HashMap::new();
    for (template_segment, uri_segment) in template_segments.iter().zip(uri_segments.iter()) {
        match placeholder_name(template_segment) {
            Some(name) => {
                params.insert(name.to_string(), (*uri_segment).to_string());
            }
            None => {
                if template_segment != uri_segment {
                    return Err(CapError::UnresolvedTemplate(format!(
                        "segment '{uri_segment}' does not match '{template_segment}' in '{template}'"
                    )));
                }
            }
        }
    }

    Ok(params)
}
