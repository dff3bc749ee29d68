//! Category model. One row per node at any depth of the catalog tree;
//! products point at up to three of them (category, sub-category,
//! sub-sub-category) and the rate resolver walks them most-specific
//! first.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::categories;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Commission override in percent; `None` or `<= 0` means no
    /// override at this level.
    pub commission_rate: Option<f64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub id: String,
    pub name: String,
    pub commission_rate: Option<f64>,
}

impl NewCategory {
    pub fn new(name: &str, commission_rate: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            commission_rate,
        }
    }
}

impl Category {
    pub fn create(conn: &mut SqliteConnection, new: NewCategory) -> QueryResult<Self> {
        diesel::insert_into(categories::table)
            .values(&new)
            .execute(conn)?;
        categories::table.find(new.id).first(conn)
    }

    pub fn find(conn: &mut SqliteConnection, category_id: &str) -> QueryResult<Option<Self>> {
        categories::table.find(category_id).first(conn).optional()
    }

    pub fn set_rate(
        conn: &mut SqliteConnection,
        category_id: &str,
        rate: Option<f64>,
    ) -> QueryResult<usize> {
        diesel::update(categories::table.find(category_id))
            .set(categories::commission_rate.eq(rate))
            .execute(conn)
    }
}
