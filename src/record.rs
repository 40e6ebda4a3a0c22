// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    descriptor::{count, get_count, letters::*, LDT_VERSION, MAGIC},
    digest::Digest,
    value::Value,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Bin is hidden from normal record reads.
pub const BIN_FLAG_HIDDEN: u8 = 0b001;

/// Bin rejects direct user writes.
pub const BIN_FLAG_RESTRICTED: u8 = 0b010;

/// Bin carries engine control data.
pub const BIN_FLAG_CONTROL: u8 = 0b100;

/// Name of the hidden record-wide LDT bookkeeping bin, shared by all LDTs
/// in one record.
pub const LDT_CONTROL_BIN: &str = "LDTCONTROLBIN";

#[derive(Clone, Debug)]
struct Bin {
    value: Value,
    flags: u8,
}

/// The open image of the user's primary database record.
///
/// The engine mutates this image exclusively for the duration of one call;
/// nothing reaches storage until the host commits it. Bin flags do not
/// survive value replacement in the host, so every write path re-asserts
/// them.
#[derive(Clone, Debug)]
pub struct TopRecord {
    digest: Digest,
    stored: bool,
    ldt_record: bool,
    bins: FxHashMap<String, Bin>,
}

impl TopRecord {
    /// Creates the image of a record that does not exist in storage yet.
    #[must_use]
    pub fn new(digest: Digest) -> Self {
        Self {
            digest,
            stored: false,
            ldt_record: false,
            bins: FxHashMap::default(),
        }
    }

    /// The record's digest.
    #[must_use]
    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Whether the record exists in storage.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.stored
    }

    /// Marks the record as existing in storage. Called by the host when the
    /// record is first committed.
    pub fn mark_stored(&mut self) {
        self.stored = true;
    }

    /// Whether the record has been flagged as holding LDTs.
    #[must_use]
    pub fn is_ldt_record(&self) -> bool {
        self.ldt_record
    }

    /// Flags the record as holding LDTs.
    pub fn set_ldt_record(&mut self) {
        self.ldt_record = true;
    }

    /// Reads a bin value.
    #[must_use]
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name).map(|bin| &bin.value)
    }

    /// Reads a bin's flag byte.
    #[must_use]
    pub fn bin_flags(&self, name: &str) -> Option<u8> {
        self.bins.get(name).map(|bin| bin.flags)
    }

    /// Writes a bin, re-asserting the given flags.
    pub fn set_bin(&mut self, name: &str, value: Value, flags: u8) {
        self.bins.insert(name.into(), Bin { value, flags });
    }

    /// Removes a bin.
    pub fn remove_bin(&mut self, name: &str) {
        self.bins.remove(name);
    }

    /// Iterates over the record's bin names.
    pub fn bin_names(&self) -> impl Iterator<Item = &str> {
        self.bins.keys().map(String::as_str)
    }

    /// Number of bins.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

/// Registers one more LDT in the record's hidden bookkeeping bin,
/// creating the bin on first use.
pub(crate) fn ldt_control_attach(top: &mut TopRecord) {
    let ldt_count = top
        .bin(LDT_CONTROL_BIN)
        .and_then(Value::as_map)
        .and_then(|map| get_count(map, CTRL_LDT_COUNT))
        .unwrap_or(0);

    let mut map = BTreeMap::new();
    map.insert(CTRL_LDT_COUNT.into(), count(ldt_count + 1));
    map.insert(CTRL_VINFO.into(), count(u64::from(LDT_VERSION)));
    map.insert(CTRL_MAGIC.into(), Value::Integer(MAGIC));
    map.insert(
        CTRL_SELF_DIGEST.into(),
        Value::String(top.digest().to_string()),
    );

    top.set_bin(
        LDT_CONTROL_BIN,
        Value::Map(map),
        BIN_FLAG_HIDDEN | BIN_FLAG_CONTROL,
    );
}

/// Unregisters one LDT from the bookkeeping bin; the bin goes away with the
/// last one.
pub(crate) fn ldt_control_release(top: &mut TopRecord) {
    let ldt_count = top
        .bin(LDT_CONTROL_BIN)
        .and_then(Value::as_map)
        .and_then(|map| get_count(map, CTRL_LDT_COUNT))
        .unwrap_or(0);

    if ldt_count <= 1 {
        top.remove_bin(LDT_CONTROL_BIN);
        return;
    }

    let mut map = BTreeMap::new();
    map.insert(CTRL_LDT_COUNT.into(), count(ldt_count - 1));
    map.insert(CTRL_VINFO.into(), count(u64::from(LDT_VERSION)));
    map.insert(CTRL_MAGIC.into(), Value::Integer(MAGIC));
    map.insert(
        CTRL_SELF_DIGEST.into(),
        Value::String(top.digest().to_string()),
    );

    top.set_bin(
        LDT_CONTROL_BIN,
        Value::Map(map),
        BIN_FLAG_HIDDEN | BIN_FLAG_CONTROL,
    );
}
