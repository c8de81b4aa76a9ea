//! Order book domain types.
//!
//! The order store hands back opaque JSON documents. `Order::from_record`
//! decomposes one into its offer and consideration items; anything that
//! does not decompose is a `MalformedOrder` and is skipped by the matcher.
//!
//! Item lists are accepted either as JSON arrays or as objects keyed by
//! index (the shape document stores use when they flatten arrays).

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::address::parse_address;
use super::error::MalformedOrder;

/// Order identifier as assigned by the order store.
pub type OrderId = String;

/// Seaport item type (numbering matches the on-chain enum).
///
/// Stores carry other values too; those decode as `Unrecognized` and
/// still match by contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Native,
    Erc20,
    Erc721,
    Erc1155,
    Erc721WithCriteria,
    Erc1155WithCriteria,
    /// Missing, non-numeric, or outside 0-5.
    Unrecognized,
}

impl ItemType {
    /// Whether `identifierOrCriteria` is a merkle root rather than a token id.
    pub const fn is_criteria_based(self) -> bool {
        matches!(self, Self::Erc721WithCriteria | Self::Erc1155WithCriteria)
    }

    /// Whether the item names individual token ids.
    pub const fn is_identified(self) -> bool {
        matches!(self, Self::Erc721 | Self::Erc1155)
    }
}

impl ItemType {
    /// Lenient decode of a stored `itemType` field.
    pub fn from_field(value: Option<&Value>) -> Self {
        value
            .and_then(parse_uint)
            .and_then(|raw| u64::try_from(raw).ok())
            .and_then(|v| Self::try_from(v).ok())
            .unwrap_or(Self::Unrecognized)
    }
}

impl TryFrom<u64> for ItemType {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Native),
            1 => Ok(Self::Erc20),
            2 => Ok(Self::Erc721),
            3 => Ok(Self::Erc1155),
            4 => Ok(Self::Erc721WithCriteria),
            5 => Ok(Self::Erc1155WithCriteria),
            other => Err(other),
        }
    }
}

/// One entry of an order's offer or consideration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier_or_criteria: Option<U256>,
    pub amount: Option<U256>,
}

impl OrderItem {
    /// Decode an item from its stored JSON form.
    ///
    /// Only a non-object item or a token address that does not parse is
    /// an error. An absent token is the native currency (zero address).
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let item = value.as_object().ok_or("item is not an object")?;

        let token = match item.get("token").or_else(|| item.get("tokenAddress")) {
            None | Some(Value::Null) => Address::ZERO,
            Some(Value::String(raw)) => {
                parse_address(raw).ok_or_else(|| format!("malformed token address {raw:?}"))?
            }
            Some(other) => return Err(format!("malformed token address {other}")),
        };

        Ok(Self {
            item_type: ItemType::from_field(item.get("itemType")),
            token,
            identifier_or_criteria: item.get("identifierOrCriteria").and_then(parse_uint),
            amount: item
                .get("startAmount")
                .or_else(|| item.get("amount"))
                .and_then(parse_uint),
        })
    }
}

/// Integer field stored as a JSON number, decimal string, or `0x` string.
fn parse_uint(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => U256::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// An order exactly as the store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

/// An order decomposed into item lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub offer: Vec<OrderItem>,
    pub consideration: Vec<OrderItem>,
    /// Remaining order metadata, echoed back untouched.
    pub document: Map<String, Value>,
}

impl Order {
    /// Decompose a stored record.
    ///
    /// Items are read from `parameters.offer` / `parameters.consideration`,
    /// falling back to top-level `offer` / `consideration`.
    pub fn from_record(record: OrderRecord) -> Result<Self, MalformedOrder> {
        let OrderRecord { id, document } = record;
        let malformed = |reason: String| MalformedOrder {
            order_id: id.clone(),
            reason,
        };

        let params = match document.get("parameters") {
            Some(Value::Object(params)) => params,
            Some(_) => return Err(malformed("parameters is not an object".into())),
            None => &document,
        };

        let offer = item_list(params, "offer").map_err(&malformed)?;
        let consideration = item_list(params, "consideration").map_err(&malformed)?;

        Ok(Self {
            id,
            offer,
            consideration,
            document,
        })
    }

    /// Offer items followed by consideration items.
    pub fn items(&self) -> impl Iterator<Item = &OrderItem> {
        self.offer.iter().chain(self.consideration.iter())
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = MalformedOrder;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

fn item_list(params: &Map<String, Value>, side: &str) -> Result<Vec<OrderItem>, String> {
    let raw = params.get(side).ok_or_else(|| format!("missing {side} items"))?;

    let values: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(indexed) => {
            let mut entries: Vec<(&String, &Value)> = indexed.iter().collect();
            entries.sort_by(|(a, _), (b, _)| {
                let key = |k: &str| k.parse::<u64>().unwrap_or(u64::MAX);
                key(a).cmp(&key(b)).then_with(|| a.cmp(b))
            });
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => return Err(format!("{side} items are not a list")),
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| OrderItem::from_value(v).map_err(|reason| format!("{side}[{i}]: {reason}")))
        .collect()
}

/// A matched order: the stored document with its id attached as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevantOrder {
    #[serde(rename = "_id")]
    pub order_id: OrderId,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

impl From<&Order> for RelevantOrder {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            document: order.document.clone(),
        }
    }
}
