//! Category registry for the containment hierarchy.
//!
//! ## Summary
//! Every stored entity belongs to exactly one [`Category`]. The category decides
//! which table holds the row, how deep it sits in the hierarchy, and which
//! categories may legally be its parent. [`HierarchyRules`] carries the parent
//! table so it can be overridden from configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Entity category, ordered by containment depth (item = 0 ... building = 5).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Item,
    Container,
    Shelf,
    ShelvingUnit,
    Room,
    Building,
}

impl Category {
    /// All categories from the root down to the leaves.
    pub const ALL: [Self; 6] = [
        Self::Building,
        Self::Room,
        Self::ShelvingUnit,
        Self::Shelf,
        Self::Container,
        Self::Item,
    ];

    /// Returns the wire and storage name of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Container => "container",
            Self::Shelf => "shelf",
            Self::ShelvingUnit => "shelving_unit",
            Self::Room => "room",
            Self::Building => "building",
        }
    }

    /// Returns the table that stores entities of this category.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Item => "items",
            Self::Container => "containers",
            Self::Shelf => "shelves",
            Self::ShelvingUnit => "shelving_units",
            Self::Room => "rooms",
            Self::Building => "buildings",
        }
    }

    /// Containment depth: 0 for items, 5 for buildings.
    #[must_use]
    pub const fn depth(self) -> u8 {
        match self {
            Self::Item => 0,
            Self::Container => 1,
            Self::Shelf => 2,
            Self::ShelvingUnit => 3,
            Self::Room => 4,
            Self::Building => 5,
        }
    }

    /// Returns `true` for the root category, which never has a parent.
    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Building)
    }

    /// Default legal parents. Some categories skip a level (an item may sit
    /// directly in a room), so this is a fixed table rather than "one up".
    #[must_use]
    pub const fn legal_parents(self) -> &'static [Self] {
        match self {
            Self::Item => &[Self::Container, Self::Shelf, Self::Room],
            Self::Container => &[Self::Shelf, Self::Room],
            Self::Shelf => &[Self::ShelvingUnit],
            Self::ShelvingUnit => &[Self::Room],
            Self::Room => &[Self::Building],
            Self::Building => &[],
        }
    }

    /// Categories that may sit directly inside this one under the default
    /// rules, root first.
    #[must_use]
    pub fn child_categories(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|child| child.legal_parents().contains(&self))
            .collect()
    }

    /// Every category that storage allows directly inside this one, root
    /// first. Any rule set only picks parents from shallower categories, so
    /// rows written under earlier `[hierarchy]` overrides are covered too.
    #[must_use]
    pub fn deeper_categories(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|child| child.depth() < self.depth())
            .collect()
    }

    /// Name of the cached parent-lookup function for this category,
    /// e.g. `GetItemParents` or `GetShelving_unitParents`.
    #[must_use]
    pub fn parents_cache_function(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        let capitalized = chars.next().map_or_else(String::new, |first| {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        });
        format!("Get{capitalized}Parents")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "item" => Ok(Self::Item),
            "container" => Ok(Self::Container),
            "shelf" => Ok(Self::Shelf),
            "shelving_unit" => Ok(Self::ShelvingUnit),
            "room" => Ok(Self::Room),
            "building" => Ok(Self::Building),
            other => Err(CoreError::CategoryUnknown(other.to_string())),
        }
    }
}

/// Returns `true` if `name` is one of the six category names.
#[must_use]
pub fn is_known_category(name: &str) -> bool {
    Category::from_str(name).is_ok()
}

/// Legal parent table for every category.
///
/// ## Summary
/// Starts from [`Category::legal_parents`] and can be overridden per category.
/// Overrides are only accepted when the root stays parentless and every parent
/// is strictly deeper than its child, which rules out cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyRules {
    parents: BTreeMap<Category, Vec<Category>>,
}

impl Default for HierarchyRules {
    fn default() -> Self {
        let parents = Category::ALL
            .iter()
            .map(|category| (*category, category.legal_parents().to_vec()))
            .collect();
        Self { parents }
    }
}

impl HierarchyRules {
    /// ## Summary
    /// Builds rules from the defaults with the given per-category overrides.
    ///
    /// ## Errors
    /// Returns `CategoryUnknown` for unknown names and `InvalidHierarchy` if the
    /// resulting table gives the root a parent, lets a category be parented by
    /// something not deeper than itself, or leaves a category without parents.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> CoreResult<Self> {
        let mut rules = Self::default();

        for (child_name, parent_names) in overrides {
            let child = Category::from_str(child_name)?;
            let mut parents = parent_names
                .iter()
                .map(|name| Category::from_str(name))
                .collect::<CoreResult<Vec<_>>>()?;
            parents.sort_by_key(|p| std::cmp::Reverse(p.depth()));
            parents.dedup();

            if child.is_root() && !parents.is_empty() {
                return Err(CoreError::InvalidHierarchy(format!(
                    "{child} is the root category and cannot have parents"
                )));
            }

            if let Some(bad) = parents.iter().find(|p| p.depth() <= child.depth()) {
                return Err(CoreError::InvalidHierarchy(format!(
                    "{bad} cannot parent {child}: parents must sit higher in the hierarchy"
                )));
            }

            if !child.is_root() && parents.is_empty() {
                return Err(CoreError::InvalidHierarchy(format!(
                    "{child} needs at least one legal parent"
                )));
            }

            rules.parents.insert(child, parents);
        }

        Ok(rules)
    }

    /// Legal parent categories for `category`.
    #[must_use]
    pub fn legal_parents(&self, category: Category) -> &[Category] {
        self.parents.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `parent` may hold entities of `category`.
    #[must_use]
    pub fn is_legal_parent(&self, category: Category, parent: Category) -> bool {
        self.legal_parents(category).contains(&parent)
    }
}
