use std::collections::VecDeque;

use typed_builder::TypedBuilder;

use crate::account::Account;
use crate::commodity::Commodity;
use crate::price::Price;
use crate::slots::SlotMap;
use crate::split::Split;
use crate::transaction::Transaction;
use crate::{AccountId, CommodityId, SplitId, TransactionId};

/// The main container for GNU Cash data.
///
/// A book owns flat arenas for every entity kind; all cross-references are
/// ids into those arenas, so the whole object graph is dropped as a unit and
/// is read-only once built.  The arenas preserve document order.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Book {
    pub guid: String,

    /// The unique parent-less account anchoring the account tree.
    pub root_account: AccountId,

    /// Account arena, document order.  Includes the `ROOT` account.
    pub accounts: Vec<Account>,

    /// Commodity arena: every commodity referenced anywhere in the book.
    pub commodities: Vec<Commodity>,

    /// The commodities declared at the top level of the document, in order.
    /// This may diverge from the referenced set in either direction: prices
    /// can name commodities that were never declared, and declarations are
    /// not required to be used.  The two collections are intentionally kept
    /// separate.
    #[builder(default)]
    pub declared_commodities: Vec<CommodityId>,

    #[builder(default)]
    pub transactions: Vec<Transaction>,

    #[builder(default)]
    pub splits: Vec<Split>,

    #[builder(default)]
    pub prices: Vec<Price>,

    #[builder(default)]
    pub slots: SlotMap,
}

/// An entity found by guid lookup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Entity {
    Account(AccountId),
    Transaction(TransactionId),
}

impl Book {
    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.index()]
    }

    pub fn commodity(&self, id: CommodityId) -> &Commodity {
        &self.commodities[id.index()]
    }

    pub fn transaction(&self, id: TransactionId) -> &Transaction {
        &self.transactions[id.index()]
    }

    pub fn split(&self, id: SplitId) -> &Split {
        &self.splits[id.index()]
    }

    /// Ids of all accounts in document order, `ROOT` included.
    pub fn account_ids(&self) -> impl Iterator<Item = AccountId> {
        (0..self.accounts.len()).map(AccountId::new)
    }

    /// Ids of all transactions in document order.
    pub fn transaction_ids(&self) -> impl Iterator<Item = TransactionId> {
        (0..self.transactions.len()).map(TransactionId::new)
    }

    /// Colon-joined path from the root (exclusive) down to `id`.  The root
    /// account itself has an empty fullname.
    pub fn fullname(&self, id: AccountId) -> String {
        let mut parts = Vec::new();
        let mut current = id;
        while let Some(parent) = self.account(current).parent {
            parts.push(self.account(current).name.as_str());
            current = parent;
        }
        parts.reverse();
        parts.join(":")
    }

    /// Breadth-first traversal of the whole account tree, starting at the
    /// root.  See [`walk_from`](Self::walk_from).
    pub fn walk(&self) -> Walk<'_> {
        self.walk_from(self.root_account)
    }

    /// Breadth-first traversal of the subtree rooted at `start`.
    ///
    /// Each step yields `(account, children, splits)`.  The children vector
    /// is a snapshot the caller may reorder or filter freely without
    /// affecting the tree; the splits slice is shared book state.  A parent
    /// is always yielded before any of its children, and every account in
    /// the subtree is yielded exactly once.
    pub fn walk_from(&self, start: AccountId) -> Walk<'_> {
        Walk {
            book: self,
            queue: VecDeque::from(vec![start]),
        }
    }

    /// First account in traversal order whose short name matches.
    ///
    /// Matching is by name, not full path, so trees with duplicate leaf
    /// names are ambiguous; the breadth-first first match wins.
    pub fn find_account(&self, name: &str) -> Option<AccountId> {
        self.find_account_under(self.root_account, name)
    }

    /// Like [`find_account`](Self::find_account), restricted to the subtree
    /// rooted at `start`.
    pub fn find_account_under(&self, start: AccountId, name: &str) -> Option<AccountId> {
        self.walk_from(start)
            .map(|(id, _, _)| id)
            .find(|&id| self.account(id).name == name)
    }

    /// Guid lookup across accounts and transactions.
    pub fn find_guid(&self, guid: &str) -> Option<Entity> {
        if let Some(id) = self.account_ids().find(|&id| self.account(id).guid == guid) {
            return Some(Entity::Account(id));
        }
        self.transaction_ids()
            .find(|&id| self.transaction(id).guid == guid)
            .map(Entity::Transaction)
    }

    /// Every split in the subtree rooted at `start`, ordered by the posting
    /// date of the owning transaction (stable over document order).
    pub fn all_splits_under(&self, start: AccountId) -> Vec<SplitId> {
        let mut ids: Vec<SplitId> = self
            .walk_from(start)
            .flat_map(|(_, _, splits)| splits.iter().copied().collect::<Vec<_>>())
            .collect();
        ids.sort_by_key(|&id| self.transaction(self.split(id).transaction).date);
        ids
    }
}

/// Worklist-driven breadth-first iterator over an account subtree.
///
/// Restartable in the sense that calling [`Book::walk`] again yields a fresh
/// traversal; each iterator instance is finite and purely computational.
pub struct Walk<'b> {
    book: &'b Book,
    queue: VecDeque<AccountId>,
}

impl<'b> Iterator for Walk<'b> {
    type Item = (AccountId, Vec<AccountId>, &'b [SplitId]);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let account = self.book.account(id);
        let children = account.children.clone();
        self.queue.extend(account.children.iter().copied());
        Some((id, children, &account.splits))
    }
}
