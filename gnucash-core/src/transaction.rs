use chrono::NaiveDateTime;
use typed_builder::TypedBuilder;

use crate::slots::SlotMap;
use crate::{CommodityId, SplitId};

/// A balanced group of splits.
///
/// The splits, summed as signed values in [`currency`](Self::currency),
/// balance to zero; that invariant is maintained by the writing application
/// and is not re-validated here.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Transaction {
    pub guid: String,

    /// The commodity all split values are denominated in.
    pub currency: CommodityId,

    /// Posting date.
    pub date: NaiveDateTime,

    /// When the transaction was recorded; may differ from the posting date.
    pub date_entered: NaiveDateTime,

    #[builder(default)]
    pub description: Option<String>,

    /// Reference number, e.g. a cheque number.  Rarely present.
    #[builder(default)]
    pub num: Option<String>,

    /// Splits in document order.
    #[builder(default)]
    pub splits: Vec<SplitId>,

    #[builder(default)]
    pub slots: SlotMap,
}
