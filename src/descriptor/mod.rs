// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

pub mod cell;
pub(crate) mod letters;
pub mod property_map;
pub mod set_map;

use crate::value::Value;
use self::property_map::PropertyMap;
use self::set_map::SetMap;
use std::collections::BTreeMap;

/// Integrity sentinel stored in every property map ("LSET" in ASCII).
pub const MAGIC: i64 = 0x4C53_4554;

/// LDT kind discriminator stored in every property map.
pub const LDT_TYPE: &str = "LSET";

/// On-disk schema version written by this engine.
///
/// Records written by a newer engine are refused, never reinterpreted.
pub const LDT_VERSION: u16 = 2;

/// Host limit on bin name length.
pub const MAX_BIN_NAME_LEN: usize = 14;

/// The LDT control descriptor: the two-map header stored in the user bin.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    /// Fields common to every LDT kind
    pub props: PropertyMap,

    /// LSET-specific fields
    pub map: SetMap,
}

impl Descriptor {
    /// Fresh descriptor with default settings.
    #[must_use]
    pub fn new(bin_name: &str, create_time: u64) -> Self {
        Self {
            props: PropertyMap::new_top(bin_name, create_time),
            map: SetMap::default(),
        }
    }

    /// Encodes into the persisted bin value: a list of the two maps.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::List(vec![self.props.to_value(), self.map.to_value()])
    }

    /// Decodes and validates a persisted bin value.
    ///
    /// Checks the two-map shape, the magic sentinel, the LDT type
    /// discriminator, and refuses descriptors written by a newer engine.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        let parts = value
            .as_list()
            .filter(|parts| parts.len() == 2)
            .ok_or(crate::Error::BinDamaged("descriptor is not a two-map list"))?;

        let props = PropertyMap::from_value(&parts[0])?;
        let map = SetMap::from_value(&parts[1])?;

        if props.version > LDT_VERSION {
            return Err(crate::Error::VersionMismatch(props.version, LDT_VERSION));
        }

        Ok(Self { props, map })
    }
}

/// Checks the user-supplied bin name against the host's bin rules.
pub(crate) fn check_bin_name(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(crate::Error::BinNameNull);
    }

    if name.len() > MAX_BIN_NAME_LEN {
        return Err(crate::Error::BinNameTooLong(name.len()));
    }

    Ok(())
}

/// Encodes a count as a persisted integer.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn count(x: u64) -> Value {
    Value::Integer(x as i64)
}

/// Reads a non-negative integer field.
pub(crate) fn get_count(map: &BTreeMap<String, Value>, letter: &str) -> Option<u64> {
    map.get(letter)
        .and_then(Value::as_integer)
        .and_then(|x| u64::try_from(x).ok())
}

/// Reads a string field.
pub(crate) fn get_str<'a>(map: &'a BTreeMap<String, Value>, letter: &str) -> Option<&'a str> {
    map.get(letter).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn bin_name_rules() {
        assert!(check_bin_name("myset").is_ok());
        assert!(check_bin_name("a_full_14_char").is_ok());

        assert!(matches!(
            check_bin_name(""),
            Err(crate::Error::BinNameNull),
        ));
        assert!(matches!(
            check_bin_name("fifteen_chars__"),
            Err(crate::Error::BinNameTooLong(15)),
        ));
    }

    #[test]
    fn descriptor_round_trip() -> crate::Result<()> {
        let desc = Descriptor::new("myset", 42);
        assert_eq!(desc, Descriptor::from_value(&desc.to_value())?);
        Ok(())
    }

    #[test]
    fn refuses_newer_version() {
        let mut desc = Descriptor::new("myset", 0);
        desc.props.version = LDT_VERSION + 1;

        assert!(matches!(
            Descriptor::from_value(&desc.to_value()),
            Err(crate::Error::VersionMismatch(v, LDT_VERSION)) if v == LDT_VERSION + 1,
        ));
    }

    #[test]
    fn refuses_non_descriptor_values() {
        assert!(matches!(
            Descriptor::from_value(&Value::from(1)),
            Err(crate::Error::BinDamaged(_)),
        ));
        assert!(matches!(
            Descriptor::from_value(&Value::List(vec![Value::from(1)])),
            Err(crate::Error::BinDamaged(_)),
        ));
    }
}
