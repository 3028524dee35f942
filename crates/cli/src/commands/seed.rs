//! Seed the category tree.
//!
//! The tree comes from a YAML file or, without one, from the built-in
//! default. Seeding is skipped when any category already exists, so the
//! command is safe to rerun.
//!
//! ```yaml
//! - name: Men
//!   children:
//!     - name: Shoes
//!     - name: Clothing
//! - name: Accessories
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use strive_api::db::categories::CategoryRepository;
use strive_core::CategoryId;

use super::{CliError, connect};

/// The tree used when no file is given.
const DEFAULT_TREE: &str = "\
- name: Men
  children:
    - name: Shoes
      children:
        - name: Running
        - name: Training
    - name: Clothing
- name: Women
  children:
    - name: Shoes
      children:
        - name: Running
        - name: Training
    - name: Clothing
- name: Kids
- name: Accessories
  children:
    - name: Bags
    - name: Socks
";

/// One category in a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub children: Vec<Self>,
}

/// Parse a seed tree, rejecting blank names.
///
/// # Errors
///
/// Returns `CliError::SeedFormat` for malformed YAML or a blank name.
pub fn parse_tree(content: &str) -> Result<Vec<SeedCategory>, CliError> {
    let tree: Vec<SeedCategory> = serde_yaml::from_str(content)?;
    if let Some(blank) = walk(&tree).into_iter().find(|(_, c)| c.name.trim().is_empty()) {
        return Err(CliError::SeedFormat(serde::de::Error::custom(format!(
            "blank category name at depth {}",
            blank.0
        ))));
    }
    Ok(tree)
}

/// Seed categories from `file`, or the default tree.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails.
pub async fn categories(file: Option<&str>) -> Result<(), CliError> {
    let content = match file {
        Some(path) => {
            info!(path, "Loading category tree from file");
            tokio::fs::read_to_string(Path::new(path)).await?
        }
        None => DEFAULT_TREE.to_owned(),
    };
    let tree = parse_tree(&content)?;

    let pool = connect().await?;
    let repo = CategoryRepository::new(&pool);

    let existing = repo.list_all().await?;
    if !existing.is_empty() {
        info!(count = existing.len(), "Categories already exist, nothing seeded");
        return Ok(());
    }

    // Parents are created before their children.
    let mut pending: Vec<(Option<CategoryId>, &SeedCategory)> =
        tree.iter().rev().map(|c| (None, c)).collect();
    let mut created = 0usize;
    while let Some((parent_id, seed)) = pending.pop() {
        let category = repo.create(seed.name.trim(), parent_id, None).await?;
        created += 1;
        pending.extend(seed.children.iter().rev().map(|c| (Some(category.id), c)));
    }

    info!(created, "Category seeding complete!");
    Ok(())
}

/// Every node with its depth, parents first.
fn walk(tree: &[SeedCategory]) -> Vec<(usize, &SeedCategory)> {
    let mut out = Vec::new();
    let mut stack: Vec<(usize, &SeedCategory)> = tree.iter().rev().map(|c| (0, c)).collect();
    while let Some((depth, node)) = stack.pop() {
        out.push((depth, node));
        stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tree_parses() {
        let tree = parse_tree(DEFAULT_TREE).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree[0].name, "Men");
        assert_eq!(tree[0].children[0].children.len(), 2);
        assert_eq!(walk(&tree).len(), 14);
    }

    #[test]
    fn test_walk_visits_parents_first() {
        let tree = parse_tree("- name: A\n  children:\n    - name: B\n- name: C\n").unwrap();
        let names: Vec<(usize, &str)> = walk(&tree)
            .into_iter()
            .map(|(depth, c)| (depth, c.name.as_str()))
            .collect();
        assert_eq!(names, vec![(0, "A"), (1, "B"), (0, "C")]);
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = parse_tree("- name: A\n  children:\n    - name: '  '\n").unwrap_err();
        assert!(matches!(err, CliError::SeedFormat(_)));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        assert!(parse_tree("name: [unclosed").is_err());
    }
}
