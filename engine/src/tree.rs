//! Directory tree visualization for the artifact header
//!
//! The tree depends only on the set of paths: input order and duplicates do
//! not change the result.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct TreeNode {
    dirs: BTreeMap<String, TreeNode>,
    files: BTreeSet<String>,
}

impl TreeNode {
    fn insert(&mut self, segments: &[&str]) {
        match segments {
            [] => {},
            [name] => {
                // a name used as both a file and a directory renders once, as a directory
                if !self.dirs.contains_key(*name) {
                    self.files.insert((*name).to_owned());
                }
            },
            [name, rest @ ..] => {
                self.files.remove(*name);
                self.dirs.entry((*name).to_owned()).or_default().insert(rest);
            },
        }
    }

    fn render(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        for (name, child) in &self.dirs {
            out.push_str(&indent);
            out.push_str(name);
            out.push_str("/\n");
            child.render(depth + 1, out);
        }
        for name in &self.files {
            out.push_str(&indent);
            out.push_str(name);
            out.push('\n');
        }
    }
}

/// Render a nested tree of `paths`
///
/// Directories come first at each level, then files, each group sorted
/// lexicographically. Directories carry a trailing `/` and each level is
/// indented by two spaces.
pub fn generate_tree_string<S: AsRef<str>>(paths: &[S]) -> String {
    let mut root = TreeNode::default();
    for path in paths {
        let normalized = path.as_ref().replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        root.insert(&segments);
    }

    let mut out = String::new();
    root.render(0, &mut out);
    out
}

#[cfg(test)]
#[allow(clippy::str_to_string)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nested_tree() {
        let paths = ["src/main.rs", "README.md", "src/core/file.rs", "src/core/a.rs", "Cargo.toml"];
        let expected = "\
src/
  core/
    a.rs
    file.rs
  main.rs
Cargo.toml
README.md
";
        assert_eq!(generate_tree_string(&paths), expected);
    }

    #[test]
    fn test_empty() {
        let paths: [&str; 0] = [];
        assert_eq!(generate_tree_string(&paths), "");
    }

    #[test]
    fn test_duplicates_and_separators() {
        let a = generate_tree_string(&["src/lib.rs", "src\\lib.rs", "/src//lib.rs"]);
        assert_eq!(a, "src/\n  lib.rs\n");
    }

    #[test]
    fn test_file_and_dir_with_same_name() {
        let tree = generate_tree_string(&["docs", "docs/index.md"]);
        assert_eq!(tree, "docs/\n  index.md\n");
        let tree = generate_tree_string(&["docs/index.md", "docs"]);
        assert_eq!(tree, "docs/\n  index.md\n");
    }

    #[test]
    fn test_idempotent() {
        let paths = vec!["b/c.txt".to_string(), "a.txt".to_string()];
        assert_eq!(generate_tree_string(&paths), generate_tree_string(&paths));
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            paths in prop::collection::vec("[a-c]{1,2}(/[a-c]{1,2}){0,3}", 0..20),
            seed in any::<u64>(),
        ) {
            let mut shuffled = paths.clone();
            // deterministic permutation derived from the seed
            let len = shuffled.len();
            if len > 1 {
                for i in (1..len).rev() {
                    let j = (seed.wrapping_mul(i as u64 + 7) % (i as u64 + 1)) as usize;
                    shuffled.swap(i, j);
                }
            }
            shuffled.reverse();
            prop_assert_eq!(generate_tree_string(&paths), generate_tree_string(&shuffled));
        }
    }
}
