//! Create and edit payloads as sent by the web frontend.
//!
//! Every field arrives as a string. Ids are parsed here so malformed numbers
//! are rejected before any hierarchy or store work.

use std::str::FromStr;

use serde::Deserialize;

use organize_core::category::Category;
use organize_core::model::{EntityFields, EntityId, ParentRef};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "parentID")]
    pub parent_id: Option<String>,
    #[serde(default, rename = "parentCategory")]
    pub parent_category: Option<String>,
}

/// A validated create or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCommand {
    pub category: Category,
    /// Present for edits.
    pub id: Option<EntityId>,
    pub fields: EntityFields,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(field: &str, raw: &str) -> ServiceResult<EntityId> {
    raw.parse::<EntityId>()
        .map_err(|e| ServiceError::ValidationFailed(format!("{field} '{raw}' is not an integer: {e}")))
}

impl EntityForm {
    /// ## Summary
    /// Parses the form into an [`EntityCommand`]. Parent legality is not
    /// checked here.
    ///
    /// ## Errors
    /// `CategoryUnknown` for unknown category names and `ValidationFailed`
    /// for a blank name, a non-integer id, or a half-specified parent.
    pub fn into_command(self) -> ServiceResult<EntityCommand> {
        let category = non_blank(self.category.as_deref())
            .ok_or_else(|| ServiceError::ValidationFailed("category is required".to_string()))
            .and_then(|name| Category::from_str(name).map_err(ServiceError::from))?;

        let name = non_blank(self.name.as_deref())
            .ok_or_else(|| ServiceError::ValidationFailed("name must not be empty".to_string()))?
            .to_string();

        let id = non_blank(self.id.as_deref())
            .map(|raw| parse_id("id", raw))
            .transpose()?;

        let parent = match (
            non_blank(self.parent_id.as_deref()),
            non_blank(self.parent_category.as_deref()),
        ) {
            (None, None) => None,
            (Some(raw_id), Some(raw_category)) => Some(ParentRef::new(
                parse_id("parentID", raw_id)?,
                Category::from_str(raw_category)?,
            )),
            _ => {
                return Err(ServiceError::ValidationFailed(
                    "parentID and parentCategory must be given together".to_string(),
                ));
            }
        };

        let notes = non_blank(self.notes.as_deref()).map(str::to_string);
        let address = if category.is_root() {
            non_blank(self.address.as_deref()).map(str::to_string)
        } else {
            None
        };

        Ok(EntityCommand {
            category,
            id,
            fields: EntityFields {
                name,
                notes,
                parent,
                address,
            },
        })
    }
}
