//! Platform wallet singleton aggregate.
//!
//! A cache of platform-wide earning and liability counters, lazily
//! created on first need and always mutated inside the same transaction
//! as the ledger/wallet writes it reflects. The dashboard fallback in
//! `services::dashboard` recomputes the same figures from raw rows,
//! which is what keeps this a cache rather than a second source of
//! truth.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::wallet_transaction::PartyType;
use crate::schema::platform_wallet;

const SINGLETON_ID: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = platform_wallet)]
pub struct PlatformWallet {
    pub id: i32,
    pub total_platform_earning: f64,
    pub current_platform_balance: f64,
    pub total_admin_earning: f64,
    /// COD cash collected by agents and not yet remitted.
    pub pending_from_delivery_boy: f64,
    /// Mirrors the sum of seller balances.
    pub seller_pending_payouts: f64,
    /// Mirrors the sum of delivery-agent balances.
    pub delivery_boy_pending_payouts: f64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = platform_wallet)]
struct NewPlatformWallet {
    id: i32,
    total_platform_earning: f64,
    current_platform_balance: f64,
    total_admin_earning: f64,
    pending_from_delivery_boy: f64,
    seller_pending_payouts: f64,
    delivery_boy_pending_payouts: f64,
    updated_at: String,
}

impl PlatformWallet {
    pub fn try_get(conn: &mut SqliteConnection) -> QueryResult<Option<Self>> {
        platform_wallet::table
            .find(SINGLETON_ID)
            .first(conn)
            .optional()
    }

    pub fn get_or_create(conn: &mut SqliteConnection) -> QueryResult<Self> {
        if let Some(wallet) = Self::try_get(conn)? {
            return Ok(wallet);
        }
        let new = NewPlatformWallet {
            id: SINGLETON_ID,
            total_platform_earning: 0.0,
            current_platform_balance: 0.0,
            total_admin_earning: 0.0,
            pending_from_delivery_boy: 0.0,
            seller_pending_payouts: 0.0,
            delivery_boy_pending_payouts: 0.0,
            updated_at: super::timestamp(),
        };
        diesel::insert_into(platform_wallet::table)
            .values(&new)
            .execute(conn)?;
        platform_wallet::table.find(SINGLETON_ID).first(conn)
    }

    /// Recognize admin earning for a settled order (prepaid
    /// distribution or a matched COD remittance).
    pub fn record_admin_earning(conn: &mut SqliteConnection, amount: f64) -> QueryResult<usize> {
        Self::get_or_create(conn)?;
        diesel::update(platform_wallet::table.find(SINGLETON_ID))
            .set((
                platform_wallet::total_platform_earning
                    .eq(platform_wallet::total_platform_earning + amount),
                platform_wallet::total_admin_earning
                    .eq(platform_wallet::total_admin_earning + amount),
                platform_wallet::current_platform_balance
                    .eq(platform_wallet::current_platform_balance + amount),
                platform_wallet::updated_at.eq(super::timestamp()),
            ))
            .execute(conn)
    }

    /// Back out previously recognized earning (order reversal).
    pub fn unwind_admin_earning(conn: &mut SqliteConnection, amount: f64) -> QueryResult<usize> {
        Self::record_admin_earning(conn, -amount)
    }

    /// The platform is owed `amount` from an agent's COD collection.
    pub fn add_cod_liability(conn: &mut SqliteConnection, amount: f64) -> QueryResult<usize> {
        Self::get_or_create(conn)?;
        diesel::update(platform_wallet::table.find(SINGLETON_ID))
            .set((
                platform_wallet::pending_from_delivery_boy
                    .eq(platform_wallet::pending_from_delivery_boy + amount),
                platform_wallet::updated_at.eq(super::timestamp()),
            ))
            .execute(conn)
    }

    /// A verified remittance reduces the outstanding COD liability,
    /// clamped at zero (overpayment is the caller's policy question).
    pub fn settle_cod_liability(conn: &mut SqliteConnection, amount: f64) -> QueryResult<usize> {
        let wallet = Self::get_or_create(conn)?;
        let pending = (wallet.pending_from_delivery_boy - amount).max(0.0);
        diesel::update(platform_wallet::table.find(SINGLETON_ID))
            .set((
                platform_wallet::pending_from_delivery_boy.eq(pending),
                platform_wallet::updated_at.eq(super::timestamp()),
            ))
            .execute(conn)
    }

    /// Keep the per-party pending-payout counters in lockstep with the
    /// wallet balances (called by the wallet writer on every mutation).
    pub fn adjust_party_pending(
        conn: &mut SqliteConnection,
        party_type: PartyType,
        delta: f64,
    ) -> QueryResult<usize> {
        let wallet = Self::get_or_create(conn)?;
        match party_type {
            PartyType::Seller => {
                let value = (wallet.seller_pending_payouts + delta).max(0.0);
                diesel::update(platform_wallet::table.find(SINGLETON_ID))
                    .set((
                        platform_wallet::seller_pending_payouts.eq(value),
                        platform_wallet::updated_at.eq(super::timestamp()),
                    ))
                    .execute(conn)
            }
            PartyType::DeliveryBoy => {
                let value = (wallet.delivery_boy_pending_payouts + delta).max(0.0);
                diesel::update(platform_wallet::table.find(SINGLETON_ID))
                    .set((
                        platform_wallet::delivery_boy_pending_payouts.eq(value),
                        platform_wallet::updated_at.eq(super::timestamp()),
                    ))
                    .execute(conn)
            }
        }
    }
}
