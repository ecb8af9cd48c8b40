//! DOI → compendium id table
//!
//! The o2r API cannot search compendia by DOI yet, so the DOIs of the
//! published demo compendia are mapped here. Unknown DOIs get the NA badge.
//! TODO: replace with a DOI search once the o2r API offers one.

use crate::pipeline::Halt;

const DOI_PREFIX: &str = "doi:";

const KNOWN_DOIS: &[(&str, &str)] = &[
    ("10.1006/jeem.1994.1031", "yxsYu"),
    ("10.1115/1.2128636", "HcEeP"),
    ("10.1029/jd095id10p16343", "Xa9Ir"),
    ("10.1126/science.1092666", "vAsoV"),
    ("10.1016/s0038-092x(00)00089-x", "yxsYu"),
    ("10.1016/0095-0696(78)90006-2", "GTb0t"),
];

/// Compendium id published under a DOI
pub fn compendium_id_for_doi(doi: &str) -> Option<&'static str> {
    KNOWN_DOIS
        .iter()
        .find(|(known, _)| *known == doi)
        .map(|(_, id)| *id)
}

/// Map a route identifier to a compendium id
///
/// `doi:`-prefixed identifiers go through the table; anything else already
/// is a compendium id.
pub fn resolve_compendium_id(identifier: &str) -> Result<String, Halt> {
    match identifier.strip_prefix(DOI_PREFIX) {
        Some(doi) => compendium_id_for_doi(doi)
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::debug!(doi = %doi, "DOI not found in compendium table");
                Halt::unavailable("doi not found")
            }),
        None => Ok(identifier.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_doi() {
        assert_eq!(compendium_id_for_doi("10.1006/jeem.1994.1031"), Some("yxsYu"));
        assert_eq!(compendium_id_for_doi("10.1016/0095-0696(78)90006-2"), Some("GTb0t"));
    }

    #[test]
    fn test_prefixed_doi_resolves() {
        assert_eq!(
            resolve_compendium_id("doi:10.1006/jeem.1994.1031"),
            Ok("yxsYu".to_string())
        );
    }

    #[test]
    fn test_unknown_doi_is_unavailable() {
        assert_eq!(
            resolve_compendium_id("doi:10.9999/unknown"),
            Err(Halt::unavailable("doi not found"))
        );
    }

    #[test]
    fn test_plain_id_passes_through() {
        assert_eq!(resolve_compendium_id("cUgvE"), Ok("cUgvE".to_string()));
    }
}
