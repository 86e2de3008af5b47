//! Prefix tree over command names, used to resolve abbreviated commands.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

/// Searching for the empty string is meaningless.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot search for an empty command prefix")]
pub struct EmptyQuery;

#[derive(Debug, Default)]
struct Node {
    terminal: bool,
    children: BTreeMap<char, Node>,
}

/// Prefix tree of command names.
#[derive(Debug, Default)]
pub struct CommandTrie {
    root: Node,
}

impl CommandTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, lowercased. Empty names are ignored.
    pub fn insert(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for c in name.to_lowercase().chars() {
            node = node.children.entry(c).or_default();
        }
        node.terminal = true;
    }

    /// Every name starting with `query`, compared in lower case.
    ///
    /// A query that is itself a name with no extensions yields just that
    /// name. Otherwise results come breadth-first, alphabetically within a
    /// level, so shorter names are listed first.
    pub fn search(&self, query: &str) -> Result<Vec<String>, EmptyQuery> {
        if query.is_empty() {
            return Err(EmptyQuery);
        }
        let query = query.to_lowercase();

        let mut node = &self.root;
        for c in query.chars() {
            match node.children.get(&c) {
                Some(next) => node = next,
                None => return Ok(Vec::new()),
            }
        }

        let mut matches = Vec::new();
        if node.terminal {
            matches.push(query.clone());
            if node.children.is_empty() {
                return Ok(matches);
            }
        }

        let mut queue: VecDeque<(String, &Node)> = node
            .children
            .iter()
            .map(|(c, child)| (format!("{query}{c}"), child))
            .collect();
        while let Some((name, node)) = queue.pop_front() {
            for (c, child) in &node.children {
                queue.push_back((format!("{name}{c}"), child));
            }
            if node.terminal {
                matches.push(name);
            }
        }
        Ok(matches)
    }
}

impl<S: AsRef<str>> FromIterator<S> for CommandTrie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Self::new();
        for name in iter {
            trie.insert(name.as_ref());
        }
        trie
    }
}
