//! Hierarchical, read-only catalog lookup.
//!
//! The index is a tree keyed by the ordered attribute sequence: each branch
//! maps an attribute value to the next level, and the last level maps to a
//! [`CatalogEntry`] (SKU + price basis).
//!
//! ## Invariants
//!
//! - Every path that reaches a leaf corresponds to exactly one catalog record.
//! - Every branch has at least one child (branches are only created while
//!   inserting a record, and records are never removed).
//! - The index is never mutated after [`CatalogIndex::build`]; rebuilding
//!   means constructing a new index and swapping the handle.
//!
//! Because it is immutable, an index behind an `Arc` can be queried from any
//! number of wizard sessions without locking.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use bangler_core::{AttributeValue, DomainError, DomainResult, Sku};

use crate::basis::PriceBasis;
use crate::record::{CatalogEntry, CatalogRecord};

#[derive(Debug, Clone)]
enum Node {
    Branch(BTreeMap<AttributeValue, Node>),
    Leaf(CatalogEntry),
}

impl Node {
    fn children(&self) -> Option<&BTreeMap<AttributeValue, Node>> {
        match self {
            Node::Branch(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }
}

/// Immutable nested mapping from attribute paths to catalog entries.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    levels: Vec<String>,
    root: Node,
    len: usize,
}

impl CatalogIndex {
    /// Build the index from a snapshot of catalog records.
    ///
    /// Fails with [`DomainError::Configuration`] when:
    /// - `levels` or `records` is empty,
    /// - a record has the wrong number of attributes, a blank attribute, a
    ///   blank SKU or an unknown price unit,
    /// - two records share the same full path but disagree on SKU or price unit.
    ///
    /// Exact duplicate rows are collapsed.
    pub fn build<L, S, R>(levels: L, records: R) -> DomainResult<Self>
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = CatalogRecord>,
    {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        if levels.is_empty() {
            return Err(DomainError::configuration("catalog needs at least one attribute level"));
        }

        let mut root = Node::Branch(BTreeMap::new());
        let mut len = 0usize;

        for (row, record) in records.into_iter().enumerate() {
            let entry = parse_record(&levels, row, &record)?;
            if insert(&mut root, entry, row)? {
                len += 1;
            }
        }

        if len == 0 {
            return Err(DomainError::configuration("catalog contains no records"));
        }

        info!(records = len, levels = levels.len(), "catalog index built");
        Ok(Self { levels, root, len })
    }

    /// Attribute names, in path order.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Number of distinct catalog paths.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Valid values for the attribute following `prefix`, sorted.
    ///
    /// Measurements sort by magnitude, everything else lexically. A prefix
    /// that leads nowhere (or is already a full path) yields an empty list;
    /// that is not an error, it means no further combinations exist.
    pub fn options_at(&self, prefix: &[AttributeValue]) -> Vec<AttributeValue> {
        self.node_at(prefix)
            .and_then(Node::children)
            .map(|children| children.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Convenience wrapper over [`options_at`](Self::options_at) for raw strings.
    ///
    /// A blank prefix element can never match, so it yields no options.
    pub fn options_at_labels(&self, prefix: &[&str]) -> Vec<AttributeValue> {
        let parsed: Result<Vec<_>, _> = prefix.iter().map(|s| AttributeValue::parse(s)).collect();
        parsed.map(|p| self.options_at(&p)).unwrap_or_default()
    }

    /// Resolve a complete path to its SKU and price basis.
    ///
    /// On a miss the error carries the options available at the longest
    /// prefix that did match, so the caller can re-prompt instead of
    /// dead-ending.
    pub fn resolve(&self, path: &[AttributeValue]) -> DomainResult<&CatalogEntry> {
        let matched = self.longest_matching_prefix(path);
        if matched == path.len() && path.len() == self.levels.len() {
            if let Some(Node::Leaf(entry)) = self.node_at(path) {
                return Ok(entry);
            }
        }

        let alternatives: Vec<String> = self
            .options_at(&path[..matched])
            .iter()
            .map(|v| v.label().to_string())
            .collect();

        let what = match self.levels.get(matched) {
            Some(level) if matched < path.len() => format!(
                "no catalog entry for {} {:?} after [{}]",
                level,
                path[matched].label(),
                join_labels(&path[..matched])
            ),
            Some(level) => format!(
                "incomplete catalog path [{}]; {} is still required",
                join_labels(path),
                level
            ),
            None => format!(
                "catalog path [{}] has more than {} attributes",
                join_labels(path),
                self.levels.len()
            ),
        };
        debug!(matched, path_len = path.len(), "catalog resolve missed");
        Err(DomainError::not_found(what, alternatives))
    }

    /// Number of leading path elements that exist in the index.
    pub fn longest_matching_prefix(&self, path: &[AttributeValue]) -> usize {
        let mut node = &self.root;
        for (depth, value) in path.iter().enumerate() {
            match node.children().and_then(|c| c.get(value)) {
                Some(next) => node = next,
                None => return depth,
            }
        }
        path.len()
    }

    /// Every distinct value seen at `level` across the catalog, sorted.
    pub fn values_at_level(&self, level: usize) -> BTreeSet<AttributeValue> {
        let mut out = BTreeSet::new();
        collect_level(&self.root, level, &mut out);
        out
    }

    /// All catalog entries in path order.
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut out = Vec::with_capacity(self.len);
        collect_entries(&self.root, &mut out);
        out
    }

    fn node_at(&self, prefix: &[AttributeValue]) -> Option<&Node> {
        let mut node = &self.root;
        for value in prefix {
            node = node.children()?.get(value)?;
        }
        Some(node)
    }
}

fn parse_record(levels: &[String], row: usize, record: &CatalogRecord) -> DomainResult<CatalogEntry> {
    if record.attributes.len() != levels.len() {
        return Err(DomainError::configuration(format!(
            "catalog record {row} ({}) has {} attributes, expected {}",
            record.sku,
            record.attributes.len(),
            levels.len()
        )));
    }

    let path = record
        .attributes
        .iter()
        .zip(levels)
        .map(|(raw, level)| {
            AttributeValue::parse(raw).map_err(|_| {
                DomainError::configuration(format!(
                    "catalog record {row} ({}) has a blank {level}",
                    record.sku
                ))
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;

    let sku = Sku::new(record.sku.as_str())
        .map_err(|_| DomainError::configuration(format!("catalog record {row} has a blank SKU")))?;

    let basis: PriceBasis = record.price_unit.parse().map_err(|e: DomainError| {
        DomainError::configuration(format!("catalog record {row} ({sku}): {e}"))
    })?;

    Ok(CatalogEntry { path, sku, basis })
}

/// Returns `true` when a new path was added, `false` for an exact duplicate.
fn insert(root: &mut Node, entry: CatalogEntry, row: usize) -> DomainResult<bool> {
    let (last, init) = entry
        .path
        .split_last()
        .ok_or_else(|| DomainError::configuration("catalog path cannot be empty"))?;

    let mut node = root;
    for value in init {
        node = match node {
            Node::Branch(children) => children
                .entry(value.clone())
                .or_insert_with(|| Node::Branch(BTreeMap::new())),
            Node::Leaf(_) => return Err(past_terminal(row)),
        };
    }

    let children = match node {
        Node::Branch(children) => children,
        Node::Leaf(_) => return Err(past_terminal(row)),
    };

    if let Some(existing) = children.get(last) {
        return match existing {
            Node::Leaf(prev) if prev.sku == entry.sku && prev.basis == entry.basis => {
                debug!(sku = %entry.sku, row, "duplicate catalog row collapsed");
                Ok(false)
            }
            Node::Leaf(prev) => Err(DomainError::configuration(format!(
                "ambiguous catalog: path [{}] maps to both {} ({}) and {} ({})",
                join_labels(&entry.path),
                prev.sku,
                prev.basis,
                entry.sku,
                entry.basis
            ))),
            Node::Branch(_) => Err(DomainError::configuration(format!(
                "catalog record {row} ends where another path continues"
            ))),
        };
    }

    children.insert(last.clone(), Node::Leaf(entry));
    Ok(true)
}

fn past_terminal(row: usize) -> DomainError {
    DomainError::configuration(format!("catalog record {row} extends past a terminal path"))
}

fn collect_level(node: &Node, level: usize, out: &mut BTreeSet<AttributeValue>) {
    let Some(children) = node.children() else {
        return;
    };
    if level == 0 {
        out.extend(children.keys().cloned());
        return;
    }
    for child in children.values() {
        collect_level(child, level - 1, out);
    }
}

fn collect_entries<'a>(node: &'a Node, out: &mut Vec<&'a CatalogEntry>) {
    match node {
        Node::Leaf(entry) => out.push(entry),
        Node::Branch(children) => {
            for child in children.values() {
                collect_entries(child, out);
            }
        }
    }
}

fn join_labels(values: &[AttributeValue]) -> String {
    values
        .iter()
        .map(AttributeValue::label)
        .collect::<Vec<_>>()
        .join(", ")
}
