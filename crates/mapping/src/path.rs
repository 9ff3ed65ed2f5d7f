//! A `nom`-based parser for dot-path data selectors.
//!
//! Paths walk a JSON payload by object key and array index:
//! `customer.name`, `orders[0].total`, `lines[2].item.sku`.

use crate::error::MappingError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, char, u64 as nom_u64},
    combinator::{map, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
};
use serde_json::Value;

/// A single step in a dot-path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object key (e.g., `.name`).
    Key(String),
    /// An array index (e.g., `[0]`).
    Index(usize),
}

/// A parsed dot-path selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotPath {
    segments: Vec<PathSegment>,
}

impl DotPath {
    pub fn parse(input: &str) -> Result<Self, MappingError> {
        match full_path(input.trim()) {
            Ok(("", segments)) => Ok(Self { segments }),
            Ok((rem, _)) => Err(MappingError::PathParse(
                input.to_string(),
                format!("Parser did not consume all input. Remainder: '{}'", rem),
            )),
            Err(e) => Err(MappingError::PathParse(input.to_string(), e.to_string())),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walks `root` segment by segment. A missing key, an out-of-range index,
    /// or a non-container midway all yield `None`; absence is never an error.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut cur = root;
        for segment in &self.segments {
            cur = match segment {
                PathSegment::Key(k) => cur.as_object()?.get(k)?,
                PathSegment::Index(i) => cur.as_array()?.get(*i)?,
            };
        }
        Some(cur)
    }
}

/// Parses and looks up in one call. An unparseable selector resolves to
/// `None`, matching the tolerant lookup contract.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    match DotPath::parse(path) {
        Ok(p) => p.lookup(root),
        Err(e) => {
            log::debug!("Ignoring unresolvable selector: {}", e);
            None
        }
    }
}

// --- Combinators ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn key_segment(input: &str) -> IResult<&str, PathSegment> {
    map(preceded(char('.'), identifier), |s| {
        PathSegment::Key(s.to_string())
    })
    .parse(input)
}

fn index_segment(input: &str) -> IResult<&str, PathSegment> {
    map(delimited(char('['), nom_u64, char(']')), |i| {
        PathSegment::Index(i as usize)
    })
    .parse(input)
}

fn full_path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    map(
        pair(identifier, many0(alt((key_segment, index_segment)))),
        |(start, mut rest)| {
            let mut segments = vec![PathSegment::Key(start.to_string())];
            segments.append(&mut rest);
            segments
        },
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_keys() {
        let p = DotPath::parse("customer.name").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Key("customer".into()),
                PathSegment::Key("name".into())
            ]
        );
    }

    #[test]
    fn parses_indexed_segments() {
        let p = DotPath::parse("orders[1].id").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Key("orders".into()),
                PathSegment::Index(1),
                PathSegment::Key("id".into())
            ]
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(DotPath::parse("a.b c").is_err());
        assert!(DotPath::parse("").is_err());
    }

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let data = json!({ "orders": [ { "id": "A" }, { "id": "B" } ] });
        let p = DotPath::parse("orders[1].id").unwrap();
        assert_eq!(p.lookup(&data), Some(&json!("B")));
    }

    #[test]
    fn lookup_missing_node_is_none() {
        let data = json!({ "customer": { "name": "ACME" } });
        assert_eq!(lookup_path(&data, "customer.address.city"), None);
        assert_eq!(lookup_path(&data, "orders[3]"), None);
        assert_eq!(lookup_path(&data, "not a path"), None);
    }
}
