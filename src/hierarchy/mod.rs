// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Generalization hierarchies for categorical columns.
//!
//! A hierarchy is a rooted tree of named nodes. The root's name equals the
//! column it generalizes; interior nodes are progressively broader
//! classifications and leaves are the literal cell values. Replacing a cell
//! by any of its ancestors is a valid generalization, so `find` returns the
//! whole chain from a node up to (but excluding) the root.
//!
//! Node names must be unique within a tree: lookups are plain depth-first
//! searches, and on a duplicate name the first match in DFS order wins.
//!
//! # File format
//!
//! One rule per non-empty line:
//!
//! ```text
//! Job/Blue Collar: Mechanic, Plumber
//! Job/White Collar: Doctor, Lawyer
//! ```
//!
//! Each rule adds one path per leaf, creating missing interior nodes on the
//! way down, like `mkdir -p`. Rules sharing a root accumulate into a single
//! hierarchy per root name. Whitespace around segments and leaves is
//! stripped. A line without a colon is malformed.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// A node in a generalization hierarchy; the tree is the root node.
///
/// Children are stored inline, so the whole tree is one self-containing
/// value with no back-pointers and no possibility of cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    name: String,
    children: Vec<Hierarchy>,
}

impl Hierarchy {
    /// Create an empty hierarchy rooted at `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            children: Vec::new(),
        }
    }

    /// The node's name; for the root this is the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a path below the root, creating every missing node along the way.
    ///
    /// The path is consumed head-first and excludes the root itself.
    /// Whitespace around each segment is stripped.
    pub fn add(&mut self, path: &[&str]) {
        let mut current = self;
        for segment in path {
            current = current.child(segment.trim());
        }
    }

    /// Get or create the direct child named `name`.
    fn child(&mut self, name: &str) -> &mut Hierarchy {
        // Indexed to satisfy the borrow checker across the find-or-push.
        let position = self.children.iter().position(|c| c.name == name);
        let index = match position {
            Some(index) => index,
            None => {
                self.children.push(Hierarchy::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Find a node by name and return the chain from the node up to (but
    /// excluding) the root: the node itself first, broadest ancestor last.
    ///
    /// Returns an empty chain when the name is absent from the tree.
    pub fn find(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        self.find_into(name, &mut chain);
        chain
    }

    fn find_into<'a>(&'a self, name: &str, chain: &mut Vec<&'a str>) -> bool {
        for child in &self.children {
            if child.name == name || child.find_into(name, chain) {
                chain.push(&child.name);
                return true;
            }
        }
        false
    }

    /// The branching factor at the named node's level: the number of
    /// siblings plus the node itself, as seen by its parent.
    ///
    /// Returns 0 when the name is absent from the tree.
    pub fn breadth(&self, name: &str) -> usize {
        for child in &self.children {
            if child.name == name {
                return self.children.len();
            }
            let below = child.breadth(name);
            if below != 0 {
                return below;
            }
        }
        0
    }

    /// Parse every hierarchy defined in a rules string.
    pub fn parse_rules(input: &str) -> Result<Vec<Hierarchy>> {
        let mut hierarchies: Vec<Hierarchy> = Vec::new();

        for line in input.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let (path_part, leaves_part) = line
                .split_once(':')
                .ok_or_else(|| Error::Parse(format!("hierarchy rule {:?} has no colon", line)))?;

            let mut path: Vec<&str> = path_part.split('/').map(str::trim).collect();
            if path.is_empty() || path[0].is_empty() {
                return Err(Error::Parse(format!("hierarchy rule {:?} has no root", line)));
            }
            let root = path.remove(0);

            // Accumulate rules that share a root into one tree.
            let position = hierarchies.iter().position(|h| h.name() == root);
            let hierarchy = match position {
                Some(index) => &mut hierarchies[index],
                None => {
                    hierarchies.push(Hierarchy::new(root));
                    let last = hierarchies.len() - 1;
                    &mut hierarchies[last]
                }
            };

            for leaf in leaves_part.split(',') {
                let mut full = path.clone();
                full.push(leaf.trim());
                hierarchy.add(&full);
            }
        }

        debug!(count = hierarchies.len(), "parsed hierarchy rules");
        Ok(hierarchies)
    }

    /// Load every hierarchy defined in a rules file.
    pub fn load(path: &Path) -> Result<Vec<Hierarchy>> {
        let input = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_rules(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_RULES: &str = "Job/Blue Collar: Mechanic, Plumber\nJob/White Collar: Doctor, Lawyer\n";

    #[test]
    fn test_add_creates_missing_nodes() {
        let mut hierarchy = Hierarchy::new("Job");
        hierarchy.add(&["Blue Collar", "Mechanic"]);
        hierarchy.add(&["Blue Collar", "Plumber"]);

        assert_eq!(hierarchy.find("Mechanic"), vec!["Mechanic", "Blue Collar"]);
        assert_eq!(hierarchy.find("Plumber"), vec!["Plumber", "Blue Collar"]);
    }

    #[test]
    fn test_find_excludes_root() {
        let hierarchies = Hierarchy::parse_rules(JOB_RULES).unwrap();
        let job = &hierarchies[0];

        let chain = job.find("Doctor");
        assert_eq!(chain, vec!["Doctor", "White Collar"]);
        assert!(!chain.contains(&"Job"));
    }

    #[test]
    fn test_find_absent_is_empty() {
        let hierarchies = Hierarchy::parse_rules(JOB_RULES).unwrap();
        assert!(hierarchies[0].find("Astronaut").is_empty());
    }

    #[test]
    fn test_breadth() {
        let hierarchies = Hierarchy::parse_rules(JOB_RULES).unwrap();
        let job = &hierarchies[0];

        // Two trades below Blue Collar.
        assert_eq!(job.breadth("Mechanic"), 2);
        // Two collars below the root.
        assert_eq!(job.breadth("Blue Collar"), 2);
        assert_eq!(job.breadth("Astronaut"), 0);
    }

    #[test]
    fn test_rules_accumulate_per_root() {
        let hierarchies = Hierarchy::parse_rules(JOB_RULES).unwrap();
        assert_eq!(hierarchies.len(), 1);
        assert_eq!(hierarchies[0].name(), "Job");
    }

    #[test]
    fn test_rules_multiple_roots() {
        let input = "Job/Blue Collar: Mechanic\nCity/North: Oslo\n";
        let hierarchies = Hierarchy::parse_rules(input).unwrap();
        assert_eq!(hierarchies.len(), 2);
        assert_eq!(hierarchies[1].name(), "City");
        assert_eq!(hierarchies[1].find("Oslo"), vec!["Oslo", "North"]);
    }

    #[test]
    fn test_whitespace_stripped() {
        let input = " Job / Blue Collar :  Mechanic , Plumber \n";
        let hierarchies = Hierarchy::parse_rules(input).unwrap();
        assert_eq!(hierarchies[0].name(), "Job");
        assert_eq!(
            hierarchies[0].find("Mechanic"),
            vec!["Mechanic", "Blue Collar"]
        );
    }

    #[test]
    fn test_missing_colon_is_an_error() {
        assert!(Hierarchy::parse_rules("Job/Blue Collar Mechanic\n").is_err());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = Hierarchy::parse_rules(JOB_RULES).unwrap();
        let second = Hierarchy::parse_rules(JOB_RULES).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let input = "\nJob/Blue Collar: Mechanic\n\n";
        let hierarchies = Hierarchy::parse_rules(input).unwrap();
        assert_eq!(hierarchies.len(), 1);
    }
}
