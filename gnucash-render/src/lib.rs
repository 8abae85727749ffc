//! Plain-text ledger reports over a built [`Book`].
//!
//! Two reports are produced: [`render`] writes a ledger-style listing of
//! commodities, accounts and date-sorted transactions, and
//! [`render_price_db`] writes the recorded exchange rates grouped by date.
//! Both are pure formatting passes; they assume the book is internally
//! consistent and do no validation of their own.

use std::io::{self, Write};

use gnucash_core::{
    Account, AccountId, Book, Commodity, CommodityId, Price, ReconciledState, SlotValue,
    TransactionId,
};
use rust_decimal::Decimal;
use thiserror::Error;


#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct LedgerRenderer {}

impl LedgerRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Writes the ledger report for `book` to `w`.
pub fn render<W: Write>(w: &mut W, book: &Book) -> Result<(), LedgerRenderError> {
    LedgerRenderer::default().render(book, w)
}

/// Writes the price-database report for `book` to `w`.
pub fn render_price_db<W: Write>(w: &mut W, book: &Book) -> Result<(), LedgerRenderError> {
    let renderer = LedgerRenderer::default();
    let mut prices: Vec<&Price> = book.prices.iter().collect();
    prices.sort_by_key(|price| price.date);

    let mut previous_date = None;
    for price in prices {
        if let Some(previous) = previous_date {
            writeln!(w)?;
            if previous != price.date {
                writeln!(w)?;
            }
        }
        previous_date = Some(price.date);
        renderer.render((book, price), w)?;
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum LedgerRenderError {
    #[error("an io error occurred")]
    Io(#[from] io::Error),
    #[error("book is internally inconsistent: {0}")]
    Inconsistent(&'static str),
}

pub trait Renderer<T, W: Write> {
    type Error;
    fn render(&self, renderable: T, write: &mut W) -> Result<(), Self::Error>;
}

impl<'a, W: Write> Renderer<&'a Book, W> for LedgerRenderer {
    type Error = LedgerRenderError;
    fn render(&self, book: &'a Book, write: &mut W) -> Result<(), Self::Error> {
        // Blocks are separated by a single blank line; nothing trails the
        // final block.
        let mut first = true;
        let mut separate = |write: &mut W| -> io::Result<()> {
            if !first {
                writeln!(write)?;
            }
            first = false;
            Ok(())
        };

        for &commodity in &book.declared_commodities {
            separate(write)?;
            self.render((book, commodity), write)?;
        }
        for account in book.account_ids() {
            if account == book.root_account {
                continue;
            }
            separate(write)?;
            self.render((book, account), write)?;
        }
        let mut transactions: Vec<TransactionId> = book.transaction_ids().collect();
        transactions.sort_by_key(|&id| book.transaction(id).date);
        for transaction in transactions {
            separate(write)?;
            self.render((book, transaction), write)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<(&'a Book, CommodityId), W> for LedgerRenderer {
    type Error = LedgerRenderError;
    fn render(&self, (book, id): (&'a Book, CommodityId), w: &mut W) -> Result<(), Self::Error> {
        let commodity = book.commodity(id);
        writeln!(w, "commodity {}", commodity.name)?;
        writeln!(w, "\tnamespace {}", commodity.space)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<(&'a Book, AccountId), W> for LedgerRenderer {
    type Error = LedgerRenderError;
    fn render(&self, (book, id): (&'a Book, AccountId), w: &mut W) -> Result<(), Self::Error> {
        let account = book.account(id);
        writeln!(w, "account {}", book.fullname(id))?;
        if let Some(description) = &account.description {
            writeln!(w, "\tnote {}", description)?;
        }
        let commodity = account_commodity(book, account)?;
        writeln!(w, "\tcheck commodity == \"{}\"", commodity.name)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<(&'a Book, TransactionId), W> for LedgerRenderer {
    type Error = LedgerRenderError;
    fn render(&self, (book, id): (&'a Book, TransactionId), w: &mut W) -> Result<(), Self::Error> {
        let transaction = book.transaction(id);
        let reconciled = transaction
            .splits
            .iter()
            .all(|&split| book.split(split).reconciled_state == ReconciledState::Reconciled);

        write!(w, "{}", transaction.date.format("%Y/%m/%d"))?;
        if reconciled {
            write!(w, " *")?;
        }
        if let Some(description) = &transaction.description {
            write!(w, " {}", description)?;
        }
        if let Some(SlotValue::Text(notes)) = transaction.slots.get("notes") {
            write!(w, " ; {}", notes)?;
        }
        writeln!(w)?;

        for &split_id in &transaction.splits {
            let split = book.split(split_id);
            let account = book.account(split.account);
            let commodity = account_commodity(book, account)?;

            let marker = if reconciled {
                ""
            } else {
                match split.reconciled_state {
                    ReconciledState::Reconciled => "* ",
                    ReconciledState::Cleared => "! ",
                    ReconciledState::NotReconciled => "",
                }
            };
            let mut symbol = commodity.name.clone();
            if symbol.chars().any(|c| !c.is_alphabetic()) {
                symbol = format!("\"{}\"", symbol);
            }
            let price = if account.commodity != Some(transaction.currency) {
                let rate = split
                    .value
                    .checked_div(split.quantity)
                    .ok_or(LedgerRenderError::Inconsistent(
                        "split with a zero quantity in a foreign commodity",
                    ))?
                    .abs();
                format!(
                    " @ {} {}",
                    fixed(rate, 8, 12),
                    book.commodity(transaction.currency).name
                )
            } else {
                String::new()
            };
            let memo = match &split.memo {
                Some(memo) if !memo.is_empty() => format!(" ; {}", memo),
                _ => String::new(),
            };
            writeln!(
                w,
                "\t{}{:<50}  {} {}{}{}",
                marker,
                book.fullname(split.account),
                fixed(split.quantity, commodity.precision(), 12),
                symbol,
                price,
                memo
            )?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<(&'a Book, &'a Price), W> for LedgerRenderer {
    type Error = LedgerRenderError;
    fn render(&self, (book, price): (&'a Book, &'a Price), w: &mut W) -> Result<(), Self::Error> {
        let commodity = &book.commodity(price.commodity).name;
        let quoted;
        let commodity = if commodity.contains(' ') {
            quoted = format!("\"{}\"", commodity);
            &quoted
        } else {
            commodity
        };
        write!(
            w,
            "P {} {} {} {}",
            price.date.format("%Y/%m/%d %H:%M:%S"),
            commodity,
            price.value,
            book.commodity(price.currency).name
        )?;
        Ok(())
    }
}

fn account_commodity<'b>(
    book: &'b Book,
    account: &Account,
) -> Result<&'b Commodity, LedgerRenderError> {
    account
        .commodity
        .map(|id| book.commodity(id))
        .ok_or(LedgerRenderError::Inconsistent(
            "non-ROOT account without a commodity",
        ))
}

/// Rounds half-to-even to `precision` decimal places, then right-aligns in a
/// field of `width` characters.
fn fixed(value: Decimal, precision: usize, width: usize) -> String {
    let digits = format!("{:.*}", precision, value.round_dp(precision as u32));
    format!("{:>width$}", digits, width = width)
}
