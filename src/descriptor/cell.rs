// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{count, get_count, get_str, letters::*};
use crate::{digest::Digest, value::Value};
use std::collections::BTreeMap;

/// Per-bucket control structure in the sub-record layout directory.
///
/// A cell starts `Empty`, collects members inline as a `List`, and is
/// promoted to a single sub-record (`Digest`) when the inline list would
/// exceed the configured cell limit. `Tree` is the declared next stage for
/// cells whose single sub-record overflows; it has no write paths, and the
/// engine reports an internal error if one is ever encountered.
#[derive(Clone, Debug, PartialEq)]
pub enum CellAnchor {
    /// No members hash to this cell
    Empty,

    /// Members held inline
    List(Vec<Value>),

    /// Members held in one sub-record
    Digest {
        /// The sub-record holding this cell's members
        digest: Digest,

        /// Number of members in the sub-record's list
        item_count: u64,
    },

    /// Members spread over multiple sub-records (reserved)
    Tree(Vec<Digest>),
}

impl CellAnchor {
    /// Number of members anchored at this cell.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        match self {
            Self::Empty | Self::Tree(_) => 0,
            Self::List(items) => items.len() as u64,
            Self::Digest { item_count, .. } => *item_count,
        }
    }

    /// Number of sub-records anchored at this cell.
    #[must_use]
    pub fn subrec_count(&self) -> u64 {
        match self {
            Self::Empty | Self::List(_) => 0,
            Self::Digest { .. } => 1,
            Self::Tree(digests) => digests.len() as u64,
        }
    }

    /// Encodes into the persisted letter-keyed map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();

        match self {
            Self::Empty => {
                map.insert(CELL_STATE.into(), count(0));
            }
            Self::List(items) => {
                map.insert(CELL_STATE.into(), count(1));
                map.insert(CELL_LIST.into(), Value::List(items.clone()));
            }
            Self::Digest { digest, item_count } => {
                map.insert(CELL_STATE.into(), count(2));
                map.insert(CELL_DIGEST.into(), Value::String(digest.to_string()));
                map.insert(CELL_COUNT.into(), count(*item_count));
            }
            Self::Tree(digests) => {
                map.insert(CELL_STATE.into(), count(3));
                map.insert(
                    CELL_TREE.into(),
                    Value::List(
                        digests
                            .iter()
                            .map(|d| Value::String(d.to_string()))
                            .collect(),
                    ),
                );
            }
        }

        Value::Map(map)
    }

    /// Decodes a persisted cell anchor.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        let map = value
            .as_map()
            .ok_or(crate::Error::BinDamaged("cell anchor is not a map"))?;

        match get_count(map, CELL_STATE) {
            Some(0) => Ok(Self::Empty),

            Some(1) => Ok(Self::List(
                map.get(CELL_LIST)
                    .and_then(Value::as_list)
                    .ok_or(crate::Error::BinDamaged("cell list missing"))?
                    .to_vec(),
            )),

            Some(2) => Ok(Self::Digest {
                digest: get_str(map, CELL_DIGEST)
                    .ok_or(crate::Error::BinDamaged("cell digest missing"))?
                    .parse()?,
                item_count: get_count(map, CELL_COUNT)
                    .ok_or(crate::Error::BinDamaged("cell count missing"))?,
            }),

            Some(3) => {
                let digests = map
                    .get(CELL_TREE)
                    .and_then(Value::as_list)
                    .ok_or(crate::Error::BinDamaged("cell tree missing"))?;

                Ok(Self::Tree(
                    digests
                        .iter()
                        .map(|d| {
                            d.as_str()
                                .ok_or(crate::Error::BinDamaged("cell tree digest"))?
                                .parse()
                        })
                        .collect::<crate::Result<Vec<_>>>()?,
                ))
            }

            _ => Err(crate::Error::BinDamaged("unknown cell state")),
        }
    }
}
