//! Database enum types with Diesel serialization.
//!
//! `parent_category` columns and the synthetic `category` column of union
//! queries hold category names as text. [`DbCategory`] converts them.

use std::io::Write;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;

use organize_core::category::Category;

/// Text-mapped wrapper around [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct DbCategory(pub Category);

impl ToSql<Text, Pg> for DbCategory {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.0.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for DbCategory {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let text = std::str::from_utf8(bytes.as_bytes())?;
        Category::from_str(text)
            .map(Self)
            .map_err(|e| e.to_string().into())
    }
}

impl From<Category> for DbCategory {
    fn from(category: Category) -> Self {
        Self(category)
    }
}

impl From<DbCategory> for Category {
    fn from(category: DbCategory) -> Self {
        category.0
    }
}
