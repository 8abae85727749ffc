use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use crate::CommodityId;

/// A recorded exchange rate: one unit of `commodity` was worth `value`
/// units of `currency` at `date`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Price {
    pub guid: String,

    /// The commodity being priced.
    pub commodity: CommodityId,

    /// The commodity the price is quoted in.
    pub currency: CommodityId,

    pub date: NaiveDateTime,

    pub value: Decimal,
}
