//! Operational settings singleton: global commission defaults and the
//! delivery pay configuration. Lazily created with the env-backed
//! floor defaults from `config::commission`.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::schema::settings;

const SINGLETON_ID: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = settings)]
pub struct Settings {
    pub id: i32,
    /// Global seller commission default (percent).
    pub default_seller_commission: f64,
    /// Global delivery-agent commission default (percent of subtotal).
    pub default_delivery_commission: f64,
    /// When non-zero, agents are paid per kilometre instead of a
    /// percentage of the subtotal.
    pub distance_based_delivery: i32,
    pub delivery_km_rate: f64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = settings)]
struct NewSettings {
    id: i32,
    default_seller_commission: f64,
    default_delivery_commission: f64,
    distance_based_delivery: i32,
    delivery_km_rate: f64,
    updated_at: String,
}

impl Settings {
    /// Read-only lookup. The breakdown/rate paths use this so that a
    /// pure computation never creates the singleton as a side effect;
    /// absent settings fall back to the `config` defaults in memory.
    pub fn try_get(conn: &mut SqliteConnection) -> QueryResult<Option<Self>> {
        settings::table.find(SINGLETON_ID).first(conn).optional()
    }

    pub fn get_or_create(conn: &mut SqliteConnection) -> QueryResult<Self> {
        if let Some(row) = settings::table.find(SINGLETON_ID).first(conn).optional()? {
            return Ok(row);
        }
        let new = NewSettings {
            id: SINGLETON_ID,
            default_seller_commission: config::seller_commission_default(),
            default_delivery_commission: config::delivery_commission_default(),
            distance_based_delivery: 0,
            delivery_km_rate: 0.0,
            updated_at: super::timestamp(),
        };
        diesel::insert_into(settings::table)
            .values(&new)
            .execute(conn)?;
        settings::table.find(SINGLETON_ID).first(conn)
    }

    pub fn set_defaults(
        conn: &mut SqliteConnection,
        seller_percent: f64,
        delivery_percent: f64,
    ) -> QueryResult<usize> {
        Self::get_or_create(conn)?;
        diesel::update(settings::table.find(SINGLETON_ID))
            .set((
                settings::default_seller_commission.eq(seller_percent),
                settings::default_delivery_commission.eq(delivery_percent),
                settings::updated_at.eq(super::timestamp()),
            ))
            .execute(conn)
    }

    pub fn set_distance_based(
        conn: &mut SqliteConnection,
        enabled: bool,
        km_rate: f64,
    ) -> QueryResult<usize> {
        Self::get_or_create(conn)?;
        diesel::update(settings::table.find(SINGLETON_ID))
            .set((
                settings::distance_based_delivery.eq(if enabled { 1 } else { 0 }),
                settings::delivery_km_rate.eq(km_rate),
                settings::updated_at.eq(super::timestamp()),
            ))
            .execute(conn)
    }

    pub fn is_distance_based(&self) -> bool {
        self.distance_based_delivery != 0
    }
}
