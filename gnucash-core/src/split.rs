use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use crate::slots::SlotMap;
use crate::{AccountId, TransactionId};

/// One debit or credit line within a transaction.
///
/// A split belongs to exactly one account and exactly one transaction; both
/// collections hold its id, and the split itself lives in the book's split
/// arena.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Split {
    pub guid: String,

    #[builder(default)]
    pub memo: Option<String>,

    pub reconciled_state: ReconciledState,

    #[builder(default)]
    pub reconcile_date: Option<NaiveDateTime>,

    /// Signed amount in the transaction's currency.
    pub value: Decimal,

    /// Signed amount in the account's own commodity.  Equals
    /// [`value`](Self::value) whenever the account commodity and the
    /// transaction currency coincide.
    pub quantity: Decimal,

    pub account: AccountId,

    pub transaction: TransactionId,

    /// Action tag, e.g. `Buy` or `Dividend`.
    #[builder(default)]
    pub action: Option<String>,

    #[builder(default)]
    pub slots: SlotMap,
}

/// Whether a split has been matched against an external statement.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReconciledState {
    NotReconciled,
    Cleared,
    Reconciled,
}

impl Default for ReconciledState {
    fn default() -> Self {
        ReconciledState::NotReconciled
    }
}

impl<'a> From<&'a str> for ReconciledState {
    /// Maps the wire flags `y` and `c`; anything else counts as not
    /// reconciled.
    fn from(flag: &'a str) -> Self {
        match flag {
            "y" => ReconciledState::Reconciled,
            "c" => ReconciledState::Cleared,
            _ => ReconciledState::NotReconciled,
        }
    }
}
