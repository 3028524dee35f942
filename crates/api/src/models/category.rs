//! Category tree.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use strive_core::CategoryId;

use super::{StoredImage, require_text};

/// Separator used when rendering a category's ancestry.
pub const PATH_SEPARATOR: &str = " → ";

const MAX_NAME_LENGTH: usize = 100;

/// A catalog category as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub image: Option<StoredImage>,
}

/// JSON view of a category with its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub image_base64: Option<String>,
    pub image_type: Option<String>,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// A node without children.
    #[must_use]
    pub fn leaf(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            parent_id: category.parent_id,
            image_base64: category.image.as_ref().map(StoredImage::to_base64),
            image_type: category
                .image
                .as_ref()
                .and_then(|image| image.content_type.clone()),
            children: Vec::new(),
        }
    }
}

/// Build the forest of root categories from a flat list.
///
/// Children keep the order of `categories`. Rows caught in a parent cycle are
/// unreachable from any root and are left out.
#[must_use]
pub fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let mut children: HashMap<CategoryId, Vec<&Category>> = HashMap::new();
    for category in categories {
        if let Some(parent) = category.parent_id {
            children.entry(parent).or_default().push(category);
        }
    }

    categories
        .iter()
        .filter(|c| c.parent_id.is_none())
        .map(|root| subtree(root, &children))
        .collect()
}

fn subtree(category: &Category, children: &HashMap<CategoryId, Vec<&Category>>) -> CategoryNode {
    let mut node = CategoryNode::leaf(category);
    node.children = children
        .get(&category.id)
        .map(|kids| kids.iter().map(|kid| subtree(kid, children)).collect())
        .unwrap_or_default();
    node
}

/// Names from the root down to `id` itself, joined with [`PATH_SEPARATOR`].
///
/// Returns `None` when `id` has no parent or is unknown.
#[must_use]
pub fn ancestor_path(categories: &[Category], id: CategoryId) -> Option<String> {
    let by_id: HashMap<CategoryId, &Category> = categories.iter().map(|c| (c.id, c)).collect();
    let start = by_id.get(&id)?;
    start.parent_id?;

    let mut names = vec![start.name.as_str()];
    let mut seen = HashSet::from([start.id]);
    let mut current = start.parent_id;
    while let Some(parent_id) = current {
        if !seen.insert(parent_id) {
            break;
        }
        let Some(parent) = by_id.get(&parent_id) else {
            break;
        };
        names.push(parent.name.as_str());
        current = parent.parent_id;
    }

    names.reverse();
    Some(names.join(PATH_SEPARATOR))
}

/// Whether `candidate` is `id` itself or one of its descendants.
#[must_use]
pub fn is_within(categories: &[Category], id: CategoryId, candidate: CategoryId) -> bool {
    let parents: HashMap<CategoryId, Option<CategoryId>> =
        categories.iter().map(|c| (c.id, c.parent_id)).collect();
    let mut seen = HashSet::new();
    let mut current = Some(candidate);
    while let Some(node) = current {
        if node == id {
            return true;
        }
        if !seen.insert(node) {
            return false;
        }
        current = parents.get(&node).copied().flatten();
    }
    false
}

/// Create/update body. Sent as JSON, or as the `category` part of a
/// multipart request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub remove_image: bool,
}

impl CategoryInput {
    /// # Errors
    ///
    /// Returns a message when the name is blank or too long.
    pub fn validate(&self) -> Result<(), String> {
        require_text(&self.name, "Name", MAX_NAME_LENGTH)
    }
}

/// How an update treats the stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Remove,
    Replace(StoredImage),
}

impl ImageChange {
    /// Removal wins over an uploaded file; no file keeps the old image.
    #[must_use]
    pub fn resolve(remove: bool, upload: Option<StoredImage>) -> Self {
        match (remove, upload) {
            (true, _) => Self::Remove,
            (false, Some(image)) => Self::Replace(image),
            (false, None) => Self::Keep,
        }
    }
}
