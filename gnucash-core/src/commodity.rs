use typed_builder::TypedBuilder;

/// A currency or tradable security that accounts accumulate.
///
/// Commodities are identified by their `(space, name)` pair, e.g.
/// `("CURRENCY", "USD")` or `("NASDAQ", "HOOL")`.  Within one parsed book the
/// pair maps to exactly one [`CommodityId`](crate::CommodityId), so identity
/// checks are plain id comparisons.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Commodity {
    /// Identifier within the namespace, e.g. `USD`.
    pub name: String,

    /// Namespace, e.g. `CURRENCY` or an exchange name.
    pub space: String,

    /// Number of sub-units per whole unit, e.g. 100 for cent-denominated
    /// currencies.
    #[builder(default = 100)]
    pub fraction: u32,
}

impl Commodity {
    /// Number of decimal digits implied by [`fraction`](Self::fraction):
    /// 100 sub-units mean amounts are meaningful to 2 places.
    pub fn precision(&self) -> usize {
        self.fraction.to_string().len() - 1
    }
}
