//! Product read model: owner seller plus the category chain used by
//! the commission rate cascade.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::products;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = products)]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    pub sub_sub_category_id: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    pub sub_sub_category_id: Option<String>,
}

impl NewProduct {
    pub fn new(seller_id: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seller_id: seller_id.to_string(),
            name: name.to_string(),
            category_id: None,
            sub_category_id: None,
            sub_sub_category_id: None,
        }
    }
}

impl Product {
    pub fn create(conn: &mut SqliteConnection, new: NewProduct) -> QueryResult<Self> {
        diesel::insert_into(products::table)
            .values(&new)
            .execute(conn)?;
        products::table.find(new.id).first(conn)
    }

    pub fn find(conn: &mut SqliteConnection, product_id: &str) -> QueryResult<Option<Self>> {
        products::table.find(product_id).first(conn).optional()
    }
}
