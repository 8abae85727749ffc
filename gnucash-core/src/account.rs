use std::convert::TryFrom;

use typed_builder::TypedBuilder;

use crate::slots::SlotMap;
use crate::{AccountId, CommodityId, SplitId};

/// A node in the account tree.
///
/// Accounts form a tree anchored at the single `ROOT` account; every other
/// account has exactly one parent.  Parent and child links are stored as ids
/// into the owning book's account arena, so the child never owns its parent
/// and the whole tree is dropped together with the book.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Account {
    /// Short name, the last component of the colon-joined path.
    pub name: String,

    /// Globally unique identifier.
    pub guid: String,

    pub kind: AccountKind,

    #[builder(default)]
    pub description: Option<String>,

    /// Parent account; `None` only for the `ROOT` account.
    #[builder(default)]
    pub parent: Option<AccountId>,

    /// Direct children in document order.
    #[builder(default)]
    pub children: Vec<AccountId>,

    /// The commodity amounts in this account are denominated in; absent only
    /// for the `ROOT` account.
    #[builder(default)]
    pub commodity: Option<CommodityId>,

    /// Smallest currency unit the account tracks.
    #[builder(default)]
    pub commodity_scu: Option<u32>,

    /// Splits posted to this account, in document order.
    #[builder(default)]
    pub splits: Vec<SplitId>,

    #[builder(default)]
    pub slots: SlotMap,
}

/// The fixed set of account type tags GNU Cash writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AccountKind {
    Root,
    Asset,
    Bank,
    Cash,
    Credit,
    Currency,
    Equity,
    Expense,
    Income,
    Liability,
    Mutual,
    Payable,
    Receivable,
    Stock,
    Trading,
}

impl<'a> TryFrom<&'a str> for AccountKind {
    type Error = ();

    fn try_from(tag: &'a str) -> Result<Self, Self::Error> {
        use AccountKind::*;
        Ok(match tag {
            "ROOT" => Root,
            "ASSET" => Asset,
            "BANK" => Bank,
            "CASH" => Cash,
            "CREDIT" => Credit,
            "CURRENCY" => Currency,
            "EQUITY" => Equity,
            "EXPENSE" => Expense,
            "INCOME" => Income,
            "LIABILITY" => Liability,
            "MUTUAL" => Mutual,
            "PAYABLE" => Payable,
            "RECEIVABLE" => Receivable,
            "STOCK" => Stock,
            "TRADING" => Trading,
            _ => return Err(()),
        })
    }
}
