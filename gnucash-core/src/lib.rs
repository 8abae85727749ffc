pub use account::{Account, AccountKind};
pub use book::{Book, Entity, Walk};
pub use commodity::Commodity;
pub use price::Price;
pub use slots::{SlotMap, SlotValue};
pub use split::{ReconciledState, Split};
pub use transaction::Transaction;

pub mod account;
pub mod book;
pub mod commodity;
pub mod price;
pub mod slots;
pub mod split;
pub mod transaction;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// Ids are only meaningful for the [`Book`](crate::Book) whose arena
        /// they index; two ids compare equal exactly when they name the same
        /// entity instance within that book.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub const fn new(index: usize) -> Self {
                $name(index)
            }

            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

entity_id! {
    /// Index of an [`Account`] in its book's account arena.
    AccountId
}
entity_id! {
    /// Index of a [`Commodity`] in its book's commodity arena.
    CommodityId
}
entity_id! {
    /// Index of a [`Transaction`] in its book's transaction arena.
    TransactionId
}
entity_id! {
    /// Index of a [`Split`] in its book's split arena.
    SplitId
}
