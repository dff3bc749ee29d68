//! Wallet writer: the only code path that moves party money.
//!
//! Each call appends exactly one immutable `wallet_transactions` row
//! and adjusts the party's balance by the same amount, plus the
//! platform aggregate's matching pending-payout counter. Callers own
//! the surrounding transaction; these helpers never begin or commit
//! one, which is what makes a crash between ledger update and wallet
//! update impossible.

use diesel::SqliteConnection;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Result, SettlementError};
use crate::models::{
    DeliveryAgent, NewWalletTransaction, PartyType, PlatformWallet, Seller, TxnType,
    WalletTransaction,
};
use crate::money;

/// Parameters for one wallet mutation.
#[derive(Debug)]
pub struct WalletEntry<'a> {
    pub party_id: &'a str,
    pub party_type: PartyType,
    pub amount: Decimal,
    pub description: String,
    pub order_id: Option<&'a str>,
    pub commission_id: Option<&'a str>,
    pub reference: Option<String>,
}

pub fn credit(conn: &mut SqliteConnection, entry: WalletEntry<'_>) -> Result<WalletTransaction> {
    apply(conn, entry, TxnType::Credit)
}

pub fn debit(conn: &mut SqliteConnection, entry: WalletEntry<'_>) -> Result<WalletTransaction> {
    apply(conn, entry, TxnType::Debit)
}

fn apply(
    conn: &mut SqliteConnection,
    entry: WalletEntry<'_>,
    txn_type: TxnType,
) -> Result<WalletTransaction> {
    let amount = money::to_f64(entry.amount);
    let signed = match txn_type {
        TxnType::Credit => amount,
        TxnType::Debit => -amount,
    };

    let touched = match entry.party_type {
        PartyType::Seller => Seller::adjust_balance(conn, entry.party_id, signed)?,
        PartyType::DeliveryBoy => DeliveryAgent::adjust_balance(conn, entry.party_id, signed)?,
    };
    if touched == 0 {
        return Err(SettlementError::PartyNotFound {
            kind: match entry.party_type {
                PartyType::Seller => "seller",
                PartyType::DeliveryBoy => "delivery agent",
            },
            id: entry.party_id.to_string(),
        });
    }

    let txn = WalletTransaction::create(
        conn,
        NewWalletTransaction::new(
            entry.party_id,
            entry.party_type,
            amount,
            txn_type,
            entry.description,
            entry.order_id,
            entry.commission_id,
            entry.reference,
        ),
    )?;

    PlatformWallet::adjust_party_pending(conn, entry.party_type, signed)?;

    debug!(
        party_id = entry.party_id,
        party_type = entry.party_type.as_str(),
        amount,
        txn_type = txn_type.as_str(),
        "wallet mutation applied"
    );
    Ok(txn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::establish_in_memory;
    use crate::models::{NewSeller, Seller};
    use rust_decimal_macros::dec as d;

    fn entry<'a>(seller_id: &'a str, amount: Decimal) -> WalletEntry<'a> {
        WalletEntry {
            party_id: seller_id,
            party_type: PartyType::Seller,
            amount,
            description: "test credit".to_string(),
            order_id: None,
            commission_id: None,
            reference: None,
        }
    }

    #[test]
    fn credit_updates_balance_and_appends_transaction() {
        let mut conn = establish_in_memory().unwrap();
        let seller = Seller::create(&mut conn, NewSeller::new("shop", None)).unwrap();

        credit(&mut conn, entry(&seller.id, d!(270.00))).unwrap();
        credit(&mut conn, entry(&seller.id, d!(29.995))).unwrap();
        debit(&mut conn, entry(&seller.id, d!(100.00))).unwrap();

        let seller = Seller::find(&mut conn, &seller.id).unwrap().unwrap();
        assert_eq!(seller.balance, 200.0);

        // Reconciliation invariant: signed transaction sum == balance.
        let txns = WalletTransaction::for_party(&mut conn, &seller.id, PartyType::Seller).unwrap();
        let sum: f64 = txns
            .iter()
            .map(|t| if t.txn_type == "CREDIT" { t.amount } else { -t.amount })
            .sum();
        assert_eq!(sum, seller.balance);

        let wallet = PlatformWallet::try_get(&mut conn).unwrap().unwrap();
        assert_eq!(wallet.seller_pending_payouts, 200.0);
    }

    #[test]
    fn unknown_party_is_rejected_without_a_transaction_row() {
        let mut conn = establish_in_memory().unwrap();
        let err = credit(&mut conn, entry("ghost", d!(10))).unwrap_err();
        assert!(matches!(err, SettlementError::PartyNotFound { .. }));
        let txns = WalletTransaction::for_party(&mut conn, "ghost", PartyType::Seller).unwrap();
        assert!(txns.is_empty());
    }
}
