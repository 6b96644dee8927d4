//! core::index
//!
//! B-Tree ordered index over strings.
//!
//! # Architecture
//!
//! The store keeps two instances: one over stored keys, one over stored
//! values. Both exist to accelerate prefix lookups; the store's mapping is
//! always the source of truth.
//!
//! # Invariants
//!
//! - All leaves are at the same depth
//! - An internal node with `n` keys has exactly `n + 1` children
//! - Every node except the root holds between `t - 1` and `2t - 1` keys
//! - Keys within a node are ordered and separate the ranges of adjacent children
//!
//! # Shallow delete
//!
//! [`OrderedIndex::remove`] only removes keys held by the root node. Keys
//! stored deeper stay in the index (stale) until the index is cleared and
//! rebuilt from the live mapping. Prefix searches can therefore return keys
//! that no longer exist; callers that need exact answers scan the mapping.
//!
//! # Example
//!
//! ```
//! use verdant::core::index::OrderedIndex;
//!
//! let mut index = OrderedIndex::default();
//! for word in ["apple", "app", "apply", "banana"] {
//!     index.insert(word);
//! }
//!
//! let mut hits = index.range_search("app");
//! hits.sort();
//! assert_eq!(hits, vec!["app", "apple", "apply"]);
//! assert_eq!(index.traverse(), vec!["app", "apple", "apply", "banana"]);
//! ```

/// Minimum degree used by the store's indexes.
pub const DEFAULT_MIN_DEGREE: usize = 3;

#[derive(Debug, Clone, Default)]
struct Node {
    keys: Vec<String>,
    /// Empty for leaves.
    children: Vec<Node>,
}

impl Node {
    fn leaf(keys: Vec<String>) -> Self {
        Self {
            keys,
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Insert into a node known to have room for one more key.
    fn insert_non_full(&mut self, key: String, t: usize) {
        let mut i = self.keys.partition_point(|k| *k <= key);
        if self.is_leaf() {
            self.keys.insert(i, key);
            return;
        }

        if self.children[i].keys.len() == 2 * t - 1 {
            self.split_child(i, t);
            if self.keys[i] <= key {
                i += 1;
            }
        }
        self.children[i].insert_non_full(key, t);
    }

    /// Split the full child at `i`, lifting its median into this node.
    fn split_child(&mut self, i: usize, t: usize) {
        let child = &mut self.children[i];
        let right_keys = child.keys.split_off(t);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(t)
        };
        let Some(median) = child.keys.pop() else {
            return;
        };

        self.keys.insert(i, median);
        self.children.insert(
            i + 1,
            Node {
                keys: right_keys,
                children: right_children,
            },
        );
    }

    fn collect_prefixed(&self, prefix: &str, out: &mut Vec<String>) {
        out.extend(self.keys.iter().filter(|k| k.starts_with(prefix)).cloned());
        for child in &self.children {
            child.collect_prefixed(prefix, out);
        }
    }

    fn collect_in_order(&self, out: &mut Vec<String>) {
        if self.is_leaf() {
            out.extend(self.keys.iter().cloned());
            return;
        }
        for (i, key) in self.keys.iter().enumerate() {
            self.children[i].collect_in_order(out);
            out.push(key.clone());
        }
        if let Some(last) = self.children.get(self.keys.len()) {
            last.collect_in_order(out);
        }
    }

    fn count(&self) -> usize {
        self.keys.len() + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Validate the subtree, returning its leaf depth.
    fn check(
        &self,
        t: usize,
        is_root: bool,
        lower: Option<&str>,
        upper: Option<&str>,
    ) -> Result<usize, String> {
        if self.keys.len() > 2 * t - 1 {
            return Err(format!("node holds {} keys, max {}", self.keys.len(), 2 * t - 1));
        }
        if !is_root && self.keys.len() < t - 1 {
            return Err(format!("node holds {} keys, min {}", self.keys.len(), t - 1));
        }
        if self.keys.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!("keys out of order: {:?}", self.keys));
        }
        if let (Some(lo), Some(first)) = (lower, self.keys.first()) {
            if first.as_str() < lo {
                return Err(format!("key '{}' below separator '{}'", first, lo));
            }
        }
        if let (Some(hi), Some(last)) = (upper, self.keys.last()) {
            if last.as_str() > hi {
                return Err(format!("key '{}' above separator '{}'", last, hi));
            }
        }

        if self.is_leaf() {
            return Ok(0);
        }
        if self.children.len() != self.keys.len() + 1 {
            return Err(format!(
                "internal node has {} keys but {} children",
                self.keys.len(),
                self.children.len()
            ));
        }

        let mut depth = None;
        for (i, child) in self.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(self.keys[i - 1].as_str()) };
            let hi = self.keys.get(i).map(String::as_str).or(upper);
            let d = child.check(t, false, lo, hi)?;
            match depth {
                None => depth = Some(d),
                Some(existing) if existing != d => {
                    return Err("leaves at different depths".to_string());
                }
                Some(_) => {}
            }
        }
        Ok(depth.unwrap_or(0) + 1)
    }
}

/// A B-Tree over strings with prefix search.
///
/// Duplicate strings are allowed; each insert adds one occurrence.
#[derive(Debug, Clone)]
pub struct OrderedIndex {
    root: Option<Node>,
    /// Minimum degree.
    t: usize,
}

impl Default for OrderedIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DEGREE)
    }
}

impl OrderedIndex {
    /// Create an empty index with minimum degree `t` (clamped to at least 2).
    pub fn new(t: usize) -> Self {
        Self {
            root: None,
            t: t.max(2),
        }
    }

    /// The minimum degree fixed at construction.
    pub fn min_degree(&self) -> usize {
        self.t
    }

    /// Insert a string.
    ///
    /// A full root is split before descending, growing the tree by one
    /// level; full children are split on the way down.
    pub fn insert(&mut self, key: impl Into<String>) {
        let key = key.into();
        let t = self.t;
        let Some(root) = self.root.as_mut() else {
            self.root = Some(Node::leaf(vec![key]));
            return;
        };

        if root.keys.len() == 2 * t - 1 {
            let old_root = std::mem::take(root);
            root.children.push(old_root);
            root.split_child(0, t);
        }
        root.insert_non_full(key, t);
    }

    /// Every stored string starting with `prefix`.
    ///
    /// Visits every node, so stale entries left by [`Self::remove`] are
    /// reported too. Results follow tree structure, not sort order.
    pub fn range_search(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        if let Some(root) = &self.root {
            root.collect_prefixed(prefix, &mut results);
        }
        results
    }

    /// Shallow delete: remove one occurrence of `key` if the root holds it.
    ///
    /// Keys below the root are never searched for. When the root is an
    /// internal node, the remaining entries are reinserted so that every
    /// internal node keeps `n + 1` children; stale deep entries survive the
    /// rebuild unchanged. That rebuild costs O(n log n) in the number of
    /// stored entries, paid on every removal that hits an internal root.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let Some(pos) = root.keys.iter().position(|k| k == key) else {
            return false;
        };

        if root.is_leaf() {
            root.keys.remove(pos);
            if root.keys.is_empty() {
                self.root = None;
            }
            return true;
        }

        let mut remaining = Vec::with_capacity(root.count());
        root.collect_in_order(&mut remaining);
        if let Some(idx) = remaining.iter().position(|k| k == key) {
            remaining.remove(idx);
        }
        self.rebuild(remaining);
        true
    }

    /// Replace the contents with `keys`.
    pub fn rebuild(&mut self, keys: impl IntoIterator<Item = String>) {
        self.clear();
        for key in keys {
            self.insert(key);
        }
    }

    /// All stored strings in ascending order.
    pub fn traverse(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_in_order(&mut out);
        }
        out
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.root = None;
    }

    /// Number of stored entries (counting duplicates).
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, Node::count)
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of levels; zero for an empty index.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_ref();
        while let Some(n) = node {
            height += 1;
            node = n.children.first();
        }
        height
    }

    /// Check every structural invariant, describing the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        match &self.root {
            Some(root) if root.keys.is_empty() => Err("root has no keys".to_string()),
            Some(root) => root.check(self.t, true, None, None).map(|_| ()),
            None => Ok(()),
        }
    }
}
