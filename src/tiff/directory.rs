//! In-memory directory tree.
//!
//! A [`Directory`] never stores its file position. Offsets exist only on the
//! wire: the decoder resolves them away and the encoder computes fresh ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::values::Value;

/// One directory (IFD): tagged values plus nested sub-directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    /// Tag to value. Iteration order is unspecified; entries are sorted
    /// when written.
    pub entries: HashMap<u16, Value>,

    /// Directories reached through the sub-directory tag.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_directories: Vec<Directory>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_entry(mut self, tag: u16, value: Value) -> Self {
        self.entries.insert(tag, value);
        self
    }

    /// Builder-style sub-directory append.
    pub fn with_sub_directory(mut self, child: Directory) -> Self {
        self.sub_directories.push(child);
        self
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, tag: u16, value: Value) -> Option<Value> {
        self.entries.insert(tag, value)
    }

    pub fn get(&self, tag: u16) -> Option<&Value> {
        self.entries.get(&tag)
    }

    pub fn remove(&mut self, tag: u16) -> Option<Value> {
        self.entries.remove(&tag)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Number of entries (sub-directories not included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags in ascending order, the order they are written in.
    pub fn sorted_tags(&self) -> Vec<u16> {
        let mut tags: Vec<u16> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Total number of directories in this subtree, including `self`.
    pub fn tree_size(&self) -> usize {
        1 + self
            .sub_directories
            .iter()
            .map(Directory::tree_size)
            .sum::<usize>()
    }
}

/// Ordered chain of top-level directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub directories: Vec<Directory>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, directory: Directory) -> Self {
        self.directories.push(directory);
        self
    }

    pub fn push(&mut self, directory: Directory) {
        self.directories.push(directory);
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directory> {
        self.directories.iter()
    }
}

impl From<Vec<Directory>> for Container {
    fn from(directories: Vec<Directory>) -> Self {
        Self { directories }
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Directory;
    type IntoIter = std::slice::Iter<'a, Directory>;

    fn into_iter(self) -> Self::IntoIter {
        self.directories.iter()
    }
}
