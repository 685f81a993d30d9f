//! Raw SQL assembly for queries whose table set is only known at runtime.
//!
//! Table names are spliced from [`Category`](organize_core::category::Category)
//! and never from user input; every user-supplied value goes through a bind.

use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Nullable, Text};

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    NullableText(Option<String>),
    BigInt(i64),
}

/// Accumulates SQL text and its bind values in placeholder order.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    binds: Vec<BindValue>,
}

impl SqlBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw SQL text.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Registers a bind and returns its placeholder. The placeholder may be
    /// referenced any number of times in the final statement.
    pub fn bind(&mut self, value: BindValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    /// ## Summary
    /// Turns the accumulated text and binds into an executable query.
    #[must_use]
    pub fn into_query(self) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
        let mut query = diesel::sql_query(self.sql).into_boxed::<Pg>();
        for value in self.binds {
            query = match value {
                BindValue::Text(v) => query.bind::<Text, _>(v),
                BindValue::NullableText(v) => query.bind::<Nullable<Text>, _>(v),
                BindValue::BigInt(v) => query.bind::<BigInt, _>(v),
            };
        }
        query
    }
}
