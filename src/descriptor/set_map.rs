// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{cell::CellAnchor, count, get_count, get_str, letters::*};
use crate::value::Value;
use std::collections::BTreeMap;

/// Default bucket count (a prime spreads better, but any non-zero count works).
pub const DEFAULT_MODULO: u32 = 128;

/// Default compact-to-regular rehash trigger.
pub const DEFAULT_THRESHOLD: u64 = 101;

/// Default inline-list-to-sub-record promotion size per hash cell.
pub const DEFAULT_HASH_CELL_MAX_LIST: usize = 4;

/// Default sub-record entry budget hint.
pub const DEFAULT_LDR_ENTRY_COUNT_MAX: u64 = 100;

/// Persistence scheme for the regular (hashed) state, chosen at create time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreType {
    /// Buckets live in numbered hidden bins of the top record
    Record,

    /// Buckets live in a hash directory with sub-record overflow
    SubRecord,
}

/// Storage phase of the set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreState {
    /// All members in a single inline list
    Compact,

    /// Members hashed across `modulo` buckets
    Regular,
}

/// Bucket content representation.
///
/// Binary packing is declared for wire compatibility but has no write
/// paths; requesting it is refused at create time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreMode {
    /// Value lists
    List,

    /// Packed byte arrays (reserved)
    Binary,
}

/// Shape of the extracted member keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyType {
    /// Scalar keys (number or string)
    Atomic,

    /// Structured values keyed through a function or canonical rendering
    Complex,
}

macro_rules! code_enum {
    ($name:ident, { $($variant:ident => $code:literal | $symbol:literal),+ $(,)? }) => {
        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $code),+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ();

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(Self::$variant)),+,
                    _ => Err(()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $symbol)),+
                }
            }
        }
    };
}

code_enum!(StoreType, {
    Record => 0 | "ST_RECORD",
    SubRecord => 1 | "ST_SUBRECORD",
});

code_enum!(StoreState, {
    Compact => 0 | "SS_COMPACT",
    Regular => 1 | "SS_REGULAR",
});

code_enum!(StoreMode, {
    List => 0 | "SM_LIST",
    Binary => 1 | "SM_BINARY",
});

code_enum!(KeyType, {
    Atomic => 0 | "KT_ATOMIC",
    Complex => 1 | "KT_COMPLEX",
});

/// The LSET-specific half of the control descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct SetMap {
    /// Persistence scheme for the regular state
    pub store_type: StoreType,

    /// Current storage phase
    pub store_state: StoreState,

    /// Bucket content representation
    pub store_mode: StoreMode,

    /// Key shape, recorded on the first insert when not set explicitly
    pub key_type: Option<KeyType>,

    /// Bucket count for the regular state
    pub modulo: u32,

    /// Compact-to-regular rehash trigger
    pub threshold: u64,

    /// Inline-list-to-sub-record promotion size per hash cell
    pub hash_cell_max_list: usize,

    /// Inline member list (sub-record layout, compact state only)
    pub compact_list: Option<Vec<Value>>,

    /// Cell directory (sub-record layout, regular state only)
    pub hash_directory: Option<Vec<CellAnchor>>,

    /// Name of the settings module applied at create time
    pub user_module: Option<String>,

    /// Name of the key-extraction function
    pub key_function: Option<String>,

    /// Name of the write-side transform
    pub transform: Option<String>,

    /// Name of the read-side untransform
    pub untransform: Option<String>,

    /// Insertions performed over the set's lifetime (removals not deducted)
    pub total_count: u64,

    /// Advisory capacity ceiling; zero means unbounded
    pub store_limit: u64,

    /// Sub-record entry budget hint
    pub ldr_entry_count_max: u64,

    /// Fixed entry size hint for binary packing (reserved)
    pub ldr_byte_entry_size: u64,

    /// Byte budget hint for binary packing (reserved)
    pub ldr_byte_count_max: u64,

    /// Byte-bin size for binary packing (reserved)
    pub binary_store_size: u64,
}

impl Default for SetMap {
    fn default() -> Self {
        Self {
            store_type: StoreType::SubRecord,
            store_state: StoreState::Compact,
            store_mode: StoreMode::List,
            key_type: None,
            modulo: DEFAULT_MODULO,
            threshold: DEFAULT_THRESHOLD,
            hash_cell_max_list: DEFAULT_HASH_CELL_MAX_LIST,
            compact_list: None,
            hash_directory: None,
            user_module: None,
            key_function: None,
            transform: None,
            untransform: None,
            total_count: 0,
            store_limit: 0,
            ldr_entry_count_max: DEFAULT_LDR_ENTRY_COUNT_MAX,
            ldr_byte_entry_size: 0,
            ldr_byte_count_max: 0,
            binary_store_size: 0,
        }
    }
}

impl SetMap {
    /// Encodes into the persisted letter-keyed map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();

        map.insert(
            SM_STORE_TYPE.into(),
            count(u64::from(u8::from(self.store_type))),
        );
        map.insert(
            SM_STORE_STATE.into(),
            count(u64::from(u8::from(self.store_state))),
        );
        map.insert(
            SM_STORE_MODE.into(),
            count(u64::from(u8::from(self.store_mode))),
        );
        map.insert(SM_MODULO.into(), count(u64::from(self.modulo)));
        map.insert(SM_THRESHOLD.into(), count(self.threshold));
        map.insert(
            SM_HASH_CELL_MAX_LIST.into(),
            count(self.hash_cell_max_list as u64),
        );
        map.insert(SM_TOTAL_COUNT.into(), count(self.total_count));
        map.insert(SM_STORE_LIMIT.into(), count(self.store_limit));
        map.insert(
            SM_LDR_ENTRY_COUNT_MAX.into(),
            count(self.ldr_entry_count_max),
        );
        map.insert(
            SM_LDR_BYTE_ENTRY_SIZE.into(),
            count(self.ldr_byte_entry_size),
        );
        map.insert(SM_LDR_BYTE_COUNT_MAX.into(), count(self.ldr_byte_count_max));
        map.insert(SM_BINARY_STORE_SIZE.into(), count(self.binary_store_size));

        if let Some(key_type) = self.key_type {
            map.insert(SM_KEY_TYPE.into(), count(u64::from(u8::from(key_type))));
        }

        if let Some(list) = &self.compact_list {
            map.insert(SM_COMPACT_LIST.into(), Value::List(list.clone()));
        }

        if let Some(cells) = &self.hash_directory {
            map.insert(
                SM_HASH_DIRECTORY.into(),
                Value::List(cells.iter().map(CellAnchor::to_value).collect()),
            );
        }

        for (letter, name) in [
            (SM_USER_MODULE, &self.user_module),
            (SM_KEY_FUNCTION, &self.key_function),
            (SM_TRANSFORM, &self.transform),
            (SM_UNTRANSFORM, &self.untransform),
        ] {
            if let Some(name) = name {
                map.insert(letter.into(), Value::String(name.clone()));
            }
        }

        Value::Map(map)
    }

    /// Decodes a persisted set map.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        let map = value
            .as_map()
            .ok_or(crate::Error::BinDamaged("set map is not a map"))?;

        let compact_list = match map.get(SM_COMPACT_LIST) {
            Some(value) => Some(
                value
                    .as_list()
                    .ok_or(crate::Error::BinDamaged("compact list is not a list"))?
                    .to_vec(),
            ),
            None => None,
        };

        let hash_directory = match map.get(SM_HASH_DIRECTORY) {
            Some(value) => {
                let cells = value
                    .as_list()
                    .ok_or(crate::Error::BinDamaged("hash directory is not a list"))?;

                Some(
                    cells
                        .iter()
                        .map(CellAnchor::from_value)
                        .collect::<crate::Result<Vec<_>>>()?,
                )
            }
            None => None,
        };

        Ok(Self {
            store_type: decode_code(map, SM_STORE_TYPE, "bad store type")?,
            store_state: decode_code(map, SM_STORE_STATE, "bad store state")?,
            store_mode: decode_code(map, SM_STORE_MODE, "bad store mode")?,
            key_type: match map.get(SM_KEY_TYPE) {
                Some(_) => Some(decode_code(map, SM_KEY_TYPE, "bad key type")?),
                None => None,
            },
            modulo: get_count(map, SM_MODULO)
                .and_then(|x| u32::try_from(x).ok())
                .filter(|x| *x > 0)
                .ok_or(crate::Error::BinDamaged("bad modulo"))?,
            threshold: get_count(map, SM_THRESHOLD)
                .ok_or(crate::Error::BinDamaged("bad threshold"))?,
            hash_cell_max_list: get_count(map, SM_HASH_CELL_MAX_LIST)
                .and_then(|x| usize::try_from(x).ok())
                .filter(|x| *x > 0)
                .ok_or(crate::Error::BinDamaged("bad hash cell list limit"))?,
            compact_list,
            hash_directory,
            user_module: get_str(map, SM_USER_MODULE).map(Into::into),
            key_function: get_str(map, SM_KEY_FUNCTION).map(Into::into),
            transform: get_str(map, SM_TRANSFORM).map(Into::into),
            untransform: get_str(map, SM_UNTRANSFORM).map(Into::into),
            total_count: get_count(map, SM_TOTAL_COUNT)
                .ok_or(crate::Error::BinDamaged("bad total count"))?,
            store_limit: get_count(map, SM_STORE_LIMIT)
                .ok_or(crate::Error::BinDamaged("bad store limit"))?,
            ldr_entry_count_max: get_count(map, SM_LDR_ENTRY_COUNT_MAX).unwrap_or(0),
            ldr_byte_entry_size: get_count(map, SM_LDR_BYTE_ENTRY_SIZE).unwrap_or(0),
            ldr_byte_count_max: get_count(map, SM_LDR_BYTE_COUNT_MAX).unwrap_or(0),
            binary_store_size: get_count(map, SM_BINARY_STORE_SIZE).unwrap_or(0),
        })
    }
}

fn decode_code<T: TryFrom<u8>>(
    map: &BTreeMap<String, Value>,
    letter: &str,
    reason: &'static str,
) -> crate::Result<T> {
    get_count(map, letter)
        .and_then(|x| u8::try_from(x).ok())
        .and_then(|x| T::try_from(x).ok())
        .ok_or(crate::Error::BinDamaged(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn round_trip_defaults() -> crate::Result<()> {
        let map = SetMap::default();
        assert_eq!(map, SetMap::from_value(&map.to_value())?);
        Ok(())
    }

    #[test]
    fn round_trip_regular_state() -> crate::Result<()> {
        let mut map = SetMap {
            store_state: StoreState::Regular,
            key_type: Some(KeyType::Atomic),
            user_module: Some("mymod".into()),
            total_count: 9,
            ..SetMap::default()
        };
        map.hash_directory = Some(vec![
            CellAnchor::Empty,
            CellAnchor::List(vec![Value::from(1)]),
        ]);

        assert_eq!(map, SetMap::from_value(&map.to_value())?);
        Ok(())
    }

    #[test]
    fn rejects_zero_modulo() {
        let map = SetMap {
            modulo: 1,
            ..SetMap::default()
        };

        let Value::Map(mut encoded) = map.to_value() else {
            unreachable!()
        };
        encoded.insert(SM_MODULO.into(), Value::Integer(0));

        assert!(matches!(
            SetMap::from_value(&Value::Map(encoded)),
            Err(crate::Error::BinDamaged(_)),
        ));
    }
}
