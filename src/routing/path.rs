//! Client path grammar: `<key>[/<remainder>]`, where the remainder may be
//! `links/<alias>/<record...>`.

use crate::schema::SchemaLookup;

/// Leading segment that marks a relationship sub-resource.
pub const LINK_MARKER: &str = "links";

/// Split a client path into its leading segment and the rest.
pub fn split_logical_path(path: &str) -> (&str, Option<&str>) {
    let path = path.trim_start_matches('/');
    match path.split_once('/') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// A remainder of the form `links/<alias>/<rest>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPath<'a> {
    pub alias: &'a str,
    pub rest: &'a str,
}

impl<'a> LinkPath<'a> {
    /// Parse a remainder. Anything short of three segments is not a link path.
    pub fn parse(remainder: &'a str) -> Option<Self> {
        let mut parts = remainder.splitn(3, '/');
        if parts.next()? != LINK_MARKER {
            return None;
        }
        let alias = parts.next()?;
        let rest = parts.next()?;
        Some(Self { alias, rest })
    }

    /// Rebuild the remainder with the alias replaced by a field identifier.
    pub fn rewrite(&self, field_id: &str) -> String {
        format!("{}/{}/{}", LINK_MARKER, field_id, self.rest)
    }
}

/// Resolve a relationship alias on one table.
///
/// The alias is tried verbatim first, then with underscores read as spaces,
/// so an exact match is never shadowed by the normalized form.
pub fn resolve_link_alias(
    lookup: &dyn SchemaLookup,
    table_id: &str,
    alias: &str,
) -> Option<String> {
    if let Some(id) = lookup.resolve_relationship_field(table_id, alias) {
        return Some(id);
    }
    let normalized = alias.replace('_', " ");
    if normalized == alias {
        return None;
    }
    lookup.resolve_relationship_field(table_id, &normalized)
}
