//! Parser for GNU Cash v2 XML files.
//!
//! The input byte stream may be gzip-compressed or raw XML; gzip is tried
//! first and raw XML is the fallback.  A successful parse yields a
//! [`gnucash_core::Book`] whose entities are wired together through arena
//! ids; a failed parse yields a [`ParseError`] and no partial book.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use flate2::read::GzDecoder;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;

use gnucash_core as gc;

pub use error::{ParseError, ParseResult};

pub mod error;

/// The namespace URIs a GNU Cash v2 document binds.  Consumers must match
/// these exact strings; prefix spellings in the document are irrelevant.
mod ns {
    pub const GNC: &str = "http://www.gnucash.org/XML/gnc";
    pub const ACT: &str = "http://www.gnucash.org/XML/act";
    pub const BOOK: &str = "http://www.gnucash.org/XML/book";
    pub const CMDTY: &str = "http://www.gnucash.org/XML/cmdty";
    pub const PRICE: &str = "http://www.gnucash.org/XML/price";
    pub const SLOT: &str = "http://www.gnucash.org/XML/slot";
    pub const SPLIT: &str = "http://www.gnucash.org/XML/split";
    pub const TRN: &str = "http://www.gnucash.org/XML/trn";
    pub const TS: &str = "http://www.gnucash.org/XML/ts";
}

/// Parses the GNU Cash file at `path`.
pub fn from_path<P: AsRef<Path>>(path: P) -> ParseResult<gc::Book> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

/// Parses a GNU Cash file from an arbitrary reader.
pub fn from_reader<R: Read>(mut reader: R) -> ParseResult<gc::Book> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse(&bytes)
}

/// Parses a byte stream that is either gzip-compressed XML or raw XML.
pub fn parse(bytes: &[u8]) -> ParseResult<gc::Book> {
    let text = decode_stream(bytes)?;
    parse_str(&text)
}

/// Parses an already-decoded XML document.
pub fn parse_str(text: &str) -> ParseResult<gc::Book> {
    let document = Document::parse(text)?;
    let root = document.root_element();
    if root.tag_name().name() != "gnc-v2" {
        return Err(ParseError::format("root element is not `gnc-v2`"));
    }
    let book = child(root, ns::GNC, "book")
        .ok_or_else(|| ParseError::format("document has no `gnc:book` element"))?;
    book_from_node(book)
}

fn decode_stream(bytes: &[u8]) -> ParseResult<String> {
    let mut decompressed = Vec::new();
    let plain = match GzDecoder::new(bytes).read_to_end(&mut decompressed) {
        Ok(_) => decompressed,
        // Not gzip; take the stream as raw XML.
        Err(_) => bytes.to_vec(),
    };
    String::from_utf8(plain).map_err(|_| ParseError::format("input is not valid UTF-8"))
}

fn book_from_node(book: Node) -> ParseResult<gc::Book> {
    let guid = require_text(book, ns::BOOK, "id", "gnc:book")?.to_string();
    let slots = slots_from_node(child(book, ns::BOOK, "slots"))?;

    let mut builder = BookBuilder::new();
    for node in children(book, ns::GNC, "commodity") {
        builder.declare_commodity(node)?;
    }
    if let Some(pricedb) = child(book, ns::GNC, "pricedb") {
        for node in plain_children(pricedb, "price") {
            builder.add_price(node)?;
        }
    }
    for node in children(book, ns::GNC, "account") {
        builder.add_account(node)?;
    }
    builder.link_parents()?;
    for node in children(book, ns::GNC, "transaction") {
        builder.add_transaction(node)?;
    }
    builder.finish(guid, slots)
}

/// Per-parse commodity store keyed by `(space, name)`.
///
/// Seeded from the top-level declarations, then extended lazily whenever an
/// account, transaction or price names a pair not yet seen (price records in
/// particular may quote commodities absent from the declaration list).
/// Every builder resolves commodities through here, so equal pairs always
/// resolve to the identical [`gc::CommodityId`].
struct CommodityRegistry {
    by_key: HashMap<(String, String), gc::CommodityId>,
    arena: Vec<gc::Commodity>,
}

impl CommodityRegistry {
    fn new() -> Self {
        CommodityRegistry {
            by_key: HashMap::new(),
            arena: Vec::new(),
        }
    }

    /// Records a top-level declaration, replacing any placeholder created
    /// for the same pair.
    fn declare(&mut self, commodity: gc::Commodity) -> gc::CommodityId {
        let key = (commodity.space.clone(), commodity.name.clone());
        match self.by_key.get(&key) {
            Some(&id) => {
                self.arena[id.index()] = commodity;
                id
            }
            None => {
                let id = gc::CommodityId::new(self.arena.len());
                self.arena.push(commodity);
                self.by_key.insert(key, id);
                id
            }
        }
    }

    fn get_or_create(&mut self, space: &str, name: &str) -> gc::CommodityId {
        let key = (space.to_string(), name.to_string());
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = gc::CommodityId::new(self.arena.len());
        self.arena.push(
            gc::Commodity::builder()
                .name(name.to_string())
                .space(space.to_string())
                .build(),
        );
        self.by_key.insert(key, id);
        id
    }

    /// Resolves a nested commodity reference (`cmdty:space` + `cmdty:id`).
    fn resolve(&mut self, node: Node, parent: &'static str) -> ParseResult<gc::CommodityId> {
        let space = require_text(node, ns::CMDTY, "space", parent)?;
        let name = require_text(node, ns::CMDTY, "id", parent)?;
        Ok(self.get_or_create(space, name))
    }

    fn into_arena(self) -> Vec<gc::Commodity> {
        self.arena
    }
}

/// Accumulates entity arenas while walking the document.
///
/// Accounts are linked to their parents in a second pass once every account
/// exists, since the schema does not guarantee parent elements appear before
/// their children in document order.  Transactions are built afterwards in a
/// single pass, by which point every account they can reference exists.
struct BookBuilder {
    registry: CommodityRegistry,
    declared_commodities: Vec<gc::CommodityId>,
    accounts: Vec<gc::Account>,
    account_ids: HashMap<String, gc::AccountId>,
    parent_guids: Vec<Option<String>>,
    root_account: Option<gc::AccountId>,
    transactions: Vec<gc::Transaction>,
    splits: Vec<gc::Split>,
    prices: Vec<gc::Price>,
}

impl BookBuilder {
    fn new() -> Self {
        BookBuilder {
            registry: CommodityRegistry::new(),
            declared_commodities: Vec::new(),
            accounts: Vec::new(),
            account_ids: HashMap::new(),
            parent_guids: Vec::new(),
            root_account: None,
            transactions: Vec::new(),
            splits: Vec::new(),
            prices: Vec::new(),
        }
    }

    fn declare_commodity(&mut self, node: Node) -> ParseResult<()> {
        let name = require_text(node, ns::CMDTY, "id", "gnc:commodity")?.to_string();
        let space = require_text(node, ns::CMDTY, "space", "gnc:commodity")?.to_string();
        let builder = gc::Commodity::builder().name(name).space(space);
        let commodity = match child_text(node, ns::CMDTY, "fraction") {
            Some(text) => builder.fraction(parse_int(text, "cmdty:fraction")?).build(),
            None => builder.build(),
        };
        let id = self.registry.declare(commodity);
        self.declared_commodities.push(id);
        Ok(())
    }

    fn add_price(&mut self, node: Node) -> ParseResult<()> {
        let guid = require_text(node, ns::PRICE, "id", "price")?.to_string();
        let commodity = self
            .registry
            .resolve(require_child(node, ns::PRICE, "commodity", "price")?, "price:commodity")?;
        let currency = self
            .registry
            .resolve(require_child(node, ns::PRICE, "currency", "price")?, "price:currency")?;
        let time = require_child(node, ns::PRICE, "time", "price")?;
        let date = parse_timestamp(require_text(time, ns::TS, "date", "price:time")?)?;
        let value = parse_rational(require_text(node, ns::PRICE, "value", "price")?)?;
        self.prices.push(
            gc::Price::builder()
                .guid(guid)
                .commodity(commodity)
                .currency(currency)
                .date(date)
                .value(value)
                .build(),
        );
        Ok(())
    }

    fn add_account(&mut self, node: Node) -> ParseResult<()> {
        let name = require_text(node, ns::ACT, "name", "gnc:account")?.to_string();
        let guid = require_text(node, ns::ACT, "id", "gnc:account")?.to_string();
        let tag = require_text(node, ns::ACT, "type", "gnc:account")?;
        let kind = gc::AccountKind::try_from(tag).map_err(|_| ParseError::UnsupportedSchema {
            what: "account type",
            value: tag.to_string(),
        })?;
        let description = child_text(node, ns::ACT, "description").map(str::to_string);
        let slots = slots_from_node(child(node, ns::ACT, "slots"))?;

        let builder = gc::Account::builder()
            .name(name)
            .guid(guid.clone())
            .kind(kind)
            .description(description)
            .slots(slots);
        let (account, parent_guid) = if kind == gc::AccountKind::Root {
            (builder.build(), None)
        } else {
            let parent_guid = require_text(node, ns::ACT, "parent", "gnc:account")?.to_string();
            let commodity = self.registry.resolve(
                require_child(node, ns::ACT, "commodity", "gnc:account")?,
                "act:commodity",
            )?;
            let scu = parse_int(
                require_text(node, ns::ACT, "commodity-scu", "gnc:account")?,
                "act:commodity-scu",
            )?;
            (
                builder
                    .commodity(Some(commodity))
                    .commodity_scu(Some(scu))
                    .build(),
                Some(parent_guid),
            )
        };

        let id = gc::AccountId::new(self.accounts.len());
        if kind == gc::AccountKind::Root {
            if self.root_account.is_some() {
                return Err(ParseError::format("book declares more than one ROOT account"));
            }
            self.root_account = Some(id);
        }
        self.account_ids.insert(guid, id);
        self.accounts.push(account);
        self.parent_guids.push(parent_guid);
        Ok(())
    }

    fn link_parents(&mut self) -> ParseResult<()> {
        for index in 0..self.accounts.len() {
            let parent_guid = match &self.parent_guids[index] {
                Some(guid) => guid,
                None => continue,
            };
            let parent = *self
                .account_ids
                .get(parent_guid.as_str())
                .ok_or_else(|| ParseError::unresolved("account parent", parent_guid))?;
            self.accounts[index].parent = Some(parent);
            self.accounts[parent.index()]
                .children
                .push(gc::AccountId::new(index));
        }
        Ok(())
    }

    fn add_transaction(&mut self, node: Node) -> ParseResult<()> {
        let guid = require_text(node, ns::TRN, "id", "gnc:transaction")?.to_string();
        let currency = self.registry.resolve(
            require_child(node, ns::TRN, "currency", "gnc:transaction")?,
            "trn:currency",
        )?;
        let posted = require_child(node, ns::TRN, "date-posted", "gnc:transaction")?;
        let date = parse_timestamp(require_text(posted, ns::TS, "date", "trn:date-posted")?)?;
        let entered = require_child(node, ns::TRN, "date-entered", "gnc:transaction")?;
        let date_entered =
            parse_timestamp(require_text(entered, ns::TS, "date", "trn:date-entered")?)?;
        let description = child_text(node, ns::TRN, "description").map(str::to_string);
        let num = child_text(node, ns::TRN, "num").map(str::to_string);
        let slots = slots_from_node(child(node, ns::TRN, "slots"))?;

        let transaction_id = gc::TransactionId::new(self.transactions.len());
        self.transactions.push(
            gc::Transaction::builder()
                .guid(guid)
                .currency(currency)
                .date(date)
                .date_entered(date_entered)
                .description(description)
                .num(num)
                .slots(slots)
                .build(),
        );
        if let Some(splits) = child(node, ns::TRN, "splits") {
            for split in children(splits, ns::TRN, "split") {
                self.add_split(split, transaction_id)?;
            }
        }
        Ok(())
    }

    /// Builds one split and threads its id into both the owning transaction
    /// and the referenced account.
    fn add_split(&mut self, node: Node, transaction: gc::TransactionId) -> ParseResult<()> {
        let guid = require_text(node, ns::SPLIT, "id", "trn:split")?.to_string();
        let memo = child_text(node, ns::SPLIT, "memo").map(str::to_string);
        let reconciled_state =
            gc::ReconciledState::from(require_text(node, ns::SPLIT, "reconciled-state", "trn:split")?);
        let reconcile_date = match child(node, ns::SPLIT, "reconcile-date") {
            Some(date) => Some(parse_timestamp(require_text(
                date,
                ns::TS,
                "date",
                "split:reconcile-date",
            )?)?),
            None => None,
        };
        let value = parse_rational(require_text(node, ns::SPLIT, "value", "trn:split")?)?;
        let quantity = parse_rational(require_text(node, ns::SPLIT, "quantity", "trn:split")?)?;
        let account_guid = require_text(node, ns::SPLIT, "account", "trn:split")?;
        let account = *self
            .account_ids
            .get(account_guid)
            .ok_or_else(|| ParseError::unresolved("split account", account_guid))?;
        let action = child_text(node, ns::SPLIT, "action").map(str::to_string);
        let slots = slots_from_node(child(node, ns::SPLIT, "slots"))?;

        let id = gc::SplitId::new(self.splits.len());
        self.splits.push(
            gc::Split::builder()
                .guid(guid)
                .memo(memo)
                .reconciled_state(reconciled_state)
                .reconcile_date(reconcile_date)
                .value(value)
                .quantity(quantity)
                .account(account)
                .transaction(transaction)
                .action(action)
                .slots(slots)
                .build(),
        );
        self.accounts[account.index()].splits.push(id);
        self.transactions[transaction.index()].splits.push(id);
        Ok(())
    }

    fn finish(self, guid: String, slots: gc::SlotMap) -> ParseResult<gc::Book> {
        let root_account = self
            .root_account
            .ok_or_else(|| ParseError::missing("gnc:book", "ROOT account"))?;
        Ok(gc::Book::builder()
            .guid(guid)
            .root_account(root_account)
            .accounts(self.accounts)
            .commodities(self.registry.into_arena())
            .declared_commodities(self.declared_commodities)
            .transactions(self.transactions)
            .splits(self.splits)
            .prices(self.prices)
            .slots(slots)
            .build())
    }
}

fn slots_from_node(node: Option<Node>) -> ParseResult<gc::SlotMap> {
    let mut slots = gc::SlotMap::new();
    let node = match node {
        Some(node) => node,
        None => return Ok(slots),
    };
    for slot in plain_children(node, "slot") {
        let key = require_text(slot, ns::SLOT, "key", "slot")?.to_string();
        let value = require_child(slot, ns::SLOT, "value", "slot")?;
        slots.insert(key, slot_value(value)?);
    }
    Ok(slots)
}

fn slot_value(value: Node) -> ParseResult<gc::SlotValue> {
    let kind = value.attribute("type").unwrap_or("string");
    Ok(match kind {
        "integer" | "double" => {
            gc::SlotValue::Integer(parse_int(scalar_text(value)?, "slot value")?)
        }
        "numeric" => gc::SlotValue::Numeric(parse_rational(scalar_text(value)?)?),
        "string" | "guid" => gc::SlotValue::Text(value.text().unwrap_or_default().to_string()),
        "gdate" => {
            let date = plain_children(value, "gdate")
                .next()
                .and_then(|node| node.text())
                .ok_or_else(|| ParseError::missing("slot:value", "gdate"))?;
            gc::SlotValue::Date(parse_gdate(date)?)
        }
        "timespec" => {
            let date = child_text(value, ns::TS, "date")
                .ok_or_else(|| ParseError::missing("slot:value", "ts:date"))?;
            gc::SlotValue::Timestamp(parse_timestamp(date)?)
        }
        "frame" => gc::SlotValue::Frame(slots_from_node(Some(value))?),
        other => {
            return Err(ParseError::UnsupportedSchema {
                what: "slot value type",
                value: other.to_string(),
            })
        }
    })
}

/// Parses a serialized rational (`"num/denom"`) into an exact decimal.
pub fn parse_rational(text: &str) -> ParseResult<Decimal> {
    let text = text.trim();
    let (numerator, denominator) = text
        .split_once('/')
        .ok_or_else(|| ParseError::format(format!("expected `num/denom`, got `{}`", text)))?;
    if denominator.contains('/') {
        return Err(ParseError::format(format!(
            "expected exactly one `/` in rational `{}`",
            text
        )));
    }
    let numerator = parse_decimal_int(numerator)?;
    let denominator = parse_decimal_int(denominator)?;
    numerator
        .checked_div(denominator)
        .ok_or_else(|| ParseError::format(format!("rational `{}` has no finite value", text)))
}

fn parse_decimal_int(text: &str) -> ParseResult<Decimal> {
    let integer = i128::from_str(text)
        .map_err(|_| ParseError::format(format!("`{}` is not an integer", text)))?;
    Decimal::try_from_i128_with_scale(integer, 0)
        .map_err(|_| ParseError::format(format!("integer `{}` is out of range", text)))
}

/// Renders a decimal back into the `"num/denom"` form accepted by
/// [`parse_rational`]; the round-trip is exact.
pub fn format_rational(value: Decimal) -> String {
    let mut denominator = String::from("1");
    denominator.extend(std::iter::repeat('0').take(value.scale() as usize));
    format!("{}/{}", value.mantissa(), denominator)
}

/// Parses a GNU Cash timestamp: `YYYY-MM-DD HH:MM:SS` with an optional
/// trailing zone offset, or a bare date.  The local clock time is kept; zone
/// offsets are not normalized away from it.
pub fn parse_timestamp(text: &str) -> ParseResult<NaiveDateTime> {
    let text = text.trim();
    if let Ok(stamped) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(stamped.naive_local());
    }
    if let Ok(plain) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(plain);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(ParseError::format(format!(
        "unparseable timestamp `{}`",
        text
    )))
}

fn parse_gdate(text: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ParseError::format(format!("unparseable date `{}`", text.trim())))
}

fn parse_int<T: FromStr>(text: &str, what: &'static str) -> ParseResult<T> {
    text.trim()
        .parse()
        .map_err(|_| ParseError::format(format!("invalid integer for {}: `{}`", what, text.trim())))
}

fn child<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((ns, name)))
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name((ns, name)))
}

/// Children carrying `name` with no namespace at all (`<price>`, `<slot>`,
/// `<gdate>` are written unprefixed).
fn plain_children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn child_text<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> Option<&'a str> {
    child(node, ns, name).and_then(|n| n.text())
}

fn require_child<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
    parent: &'static str,
) -> ParseResult<Node<'a, 'input>> {
    child(node, ns, name).ok_or_else(|| ParseError::missing(parent, name))
}

fn require_text<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
    parent: &'static str,
) -> ParseResult<&'a str> {
    require_child(node, ns, name, parent)?
        .text()
        .ok_or_else(|| ParseError::missing(parent, name))
}

fn scalar_text<'a>(value: Node<'a, '_>) -> ParseResult<&'a str> {
    value
        .text()
        .ok_or_else(|| ParseError::missing("slot", "value"))
}
