//! Hierarchical rollup counts
//!
//! A [`RollupIndex`] mirrors the row area of a pivot table: a tree keyed by
//! the value of each hierarchy column in turn, with a count at every node and
//! the grand total at the root. Children keep first-seen order.

use ahash::{AHashMap, AHashSet};

use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

/// One node of a rollup tree
#[derive(Debug, Clone)]
pub struct RollupNode {
    value: Value,
    count: usize,
    children: Vec<RollupNode>,
    index: AHashMap<Value, usize>,
}

impl RollupNode {
    fn new(value: Value) -> Self {
        Self {
            value,
            count: 0,
            children: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// The hierarchy value this node is keyed by (null for the root)
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Count aggregated at this node
    pub fn count(&self) -> usize {
        self.count
    }

    /// Child nodes in first-seen order
    pub fn children(&self) -> &[RollupNode] {
        &self.children
    }

    /// Child keyed by `value`
    pub fn child(&self, value: &Value) -> Option<&RollupNode> {
        self.index.get(value).map(|&i| &self.children[i])
    }

    /// True for nodes at the last hierarchy level
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn child_mut_or_insert(&mut self, value: &Value) -> usize {
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.children.len();
        self.children.push(RollupNode::new(value.clone()));
        self.index.insert(value.clone(), i);
        i
    }
}

/// Nested counts over an ordered column hierarchy, with grand total
#[derive(Debug, Clone)]
pub struct RollupIndex {
    levels: Vec<String>,
    measure: Option<String>,
    root: RollupNode,
}

impl RollupIndex {
    /// Count rows per hierarchy path
    ///
    /// Every node's count is the number of rows routed through it, so
    /// intermediate nodes hold the sum of their children and the root holds
    /// the row count. Over a deduplicated table whose key includes an
    /// identity column, the counts are distinct identity counts.
    pub fn count_rows<S: AsRef<str>>(table: &Table, hierarchy: &[S]) -> Result<Self> {
        let indices = Self::hierarchy_indices(table, hierarchy)?;
        let mut root = RollupNode::new(Value::Null);

        for row in table.rows() {
            let mut node = &mut root;
            node.count += 1;
            for &col in &indices {
                let value = &row.values()[col];
                let i = node.child_mut_or_insert(value);
                node = &mut node.children[i];
                node.count += 1;
            }
        }

        Ok(Self {
            levels: Self::level_names(hierarchy),
            measure: None,
            root,
        })
    }

    /// Count distinct `measure` values per hierarchy path
    ///
    /// Each node counts the distinct measure values across its whole subtree,
    /// so subtotals are not sums of children when the same value appears
    /// under several children. Null measure values are not counted, but their
    /// rows still create hierarchy nodes.
    pub fn distinct_count<S: AsRef<str>>(
        table: &Table,
        hierarchy: &[S],
        measure: &str,
    ) -> Result<Self> {
        let indices = Self::hierarchy_indices(table, hierarchy)?;
        let measure_idx = table.column_index(measure)?;
        let mut root = RollupNode::new(Value::Null);
        let mut seen: AHashMap<Vec<Value>, AHashSet<Value>> = AHashMap::new();

        for row in table.rows() {
            let values = row.values();
            let measure_value = &values[measure_idx];
            let mut node = &mut root;
            let mut path = Vec::with_capacity(indices.len());

            Self::note_distinct(&mut seen, &path, measure_value, &mut node.count);
            for &col in &indices {
                let i = node.child_mut_or_insert(&values[col]);
                node = &mut node.children[i];
                path.push(values[col].clone());
                Self::note_distinct(&mut seen, &path, measure_value, &mut node.count);
            }
        }

        Ok(Self {
            levels: Self::level_names(hierarchy),
            measure: Some(measure.to_string()),
            root,
        })
    }

    /// Hierarchy column names, outermost first
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Number of hierarchy levels
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Measure column for distinct-count rollups, `None` for row counts
    pub fn measure(&self) -> Option<&str> {
        self.measure.as_deref()
    }

    /// The root node (grand total)
    pub fn root(&self) -> &RollupNode {
        &self.root
    }

    /// Grand total count
    pub fn grand_total(&self) -> usize {
        self.root.count
    }

    /// Node at `path` (outermost value first); the empty path is the root
    pub fn node(&self, path: &[Value]) -> Option<&RollupNode> {
        path.iter()
            .try_fold(&self.root, |node, value| node.child(value))
    }

    /// Count at `path`, `None` if the path was never seen
    pub fn count_at(&self, path: &[Value]) -> Option<usize> {
        self.node(path).map(RollupNode::count)
    }

    /// Leaf paths with their counts, depth-first in first-seen order
    pub fn leaves(&self) -> Vec<(Vec<Value>, usize)> {
        let mut out = Vec::new();
        let mut path = Vec::with_capacity(self.depth());
        Self::collect_leaves(&self.root, &mut path, &mut out);
        out
    }

    /// Sum of all leaf counts
    pub fn leaf_total(&self) -> usize {
        self.leaves().iter().map(|(_, count)| count).sum()
    }

    /// Every non-root node with its level (0 = outermost), depth-first
    pub fn nodes(&self) -> Vec<(usize, &RollupNode)> {
        let mut out = Vec::new();
        Self::collect_nodes(&self.root, 0, &mut out);
        out
    }

    fn collect_leaves(
        node: &RollupNode,
        path: &mut Vec<Value>,
        out: &mut Vec<(Vec<Value>, usize)>,
    ) {
        for child in &node.children {
            path.push(child.value.clone());
            if child.is_leaf() {
                out.push((path.clone(), child.count));
            } else {
                Self::collect_leaves(child, path, out);
            }
            path.pop();
        }
    }

    fn collect_nodes<'a>(
        node: &'a RollupNode,
        level: usize,
        out: &mut Vec<(usize, &'a RollupNode)>,
    ) {
        for child in &node.children {
            out.push((level, child));
            Self::collect_nodes(child, level + 1, out);
        }
    }

    fn note_distinct(
        seen: &mut AHashMap<Vec<Value>, AHashSet<Value>>,
        path: &[Value],
        measure_value: &Value,
        count: &mut usize,
    ) {
        if measure_value.is_null() {
            return;
        }
        let set = seen.entry(path.to_vec()).or_default();
        if set.insert(measure_value.clone()) {
            *count += 1;
        }
    }

    fn hierarchy_indices<S: AsRef<str>>(table: &Table, hierarchy: &[S]) -> Result<Vec<usize>> {
        if hierarchy.is_empty() {
            return Err(Error::NoKeyColumns);
        }
        table.column_indices(hierarchy)
    }

    fn level_names<S: AsRef<str>>(hierarchy: &[S]) -> Vec<String> {
        hierarchy.iter().map(|s| s.as_ref().to_string()).collect()
    }
}
