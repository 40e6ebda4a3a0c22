// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Record-layout driver: hash buckets stored as numbered hidden bins of the
//! top record itself.
//!
//! Compact state keeps every member in bucket bin 0. Crossing the rehash
//! threshold spreads the members over `modulo` bucket bins. Total capacity
//! is bounded by the host's record size, and the bucket bin names are
//! reserved record-wide, so a record can hold at most one set in this
//! layout.

use crate::{
    descriptor::{set_map::StoreState, Descriptor},
    functions::FunctionContext,
    hash,
    key::{self, Key},
    record::{TopRecord, BIN_FLAG_HIDDEN, BIN_FLAG_RESTRICTED},
    search,
    value::Value,
};

/// Name prefix reserved for bucket bins.
pub(crate) const BUCKET_BIN_PREFIX: &str = "LSetBin_";

fn bucket_bin(idx: usize) -> String {
    format!("{BUCKET_BIN_PREFIX}{idx}")
}

fn read_bucket(top: &TopRecord, idx: usize) -> Vec<Value> {
    top.bin(&bucket_bin(idx))
        .and_then(Value::as_list)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

fn write_bucket(top: &mut TopRecord, idx: usize, items: Vec<Value>) {
    top.set_bin(
        &bucket_bin(idx),
        Value::List(items),
        BIN_FLAG_HIDDEN | BIN_FLAG_RESTRICTED,
    );
}

/// Reserves the bucket bin namespace for a new set.
///
/// Only one record-layout set fits in a record; a second create collides on
/// the reserved names.
pub(crate) fn reserve(top: &mut TopRecord) -> crate::Result<()> {
    if let Some(name) = top
        .bin_names()
        .find(|name| name.starts_with(BUCKET_BIN_PREFIX))
    {
        return Err(crate::Error::BinExists(name.into()));
    }

    write_bucket(top, 0, Vec::new());
    Ok(())
}

/// Inserts a stored value, rehashing into the regular state when the
/// compact bucket crosses the threshold.
pub(crate) fn insert(
    desc: &mut Descriptor,
    top: &mut TopRecord,
    fx: &FunctionContext,
    stored: Value,
    key: &Key,
) -> crate::Result<()> {
    if desc.map.store_state == StoreState::Compact {
        let items = read_bucket(top, 0);

        if search::position(&items, key, fx)?.is_some() {
            return Err(crate::Error::UniqueKeyViolation);
        }

        if desc.map.total_count + 1 < desc.map.threshold {
            let mut items = items;
            items.push(stored);
            write_bucket(top, 0, items);
            return Ok(());
        }

        rehash(desc, top, fx)?;
    }

    regular_insert(desc, top, fx, stored, key, true)
}

fn regular_insert(
    desc: &Descriptor,
    top: &mut TopRecord,
    fx: &FunctionContext,
    stored: Value,
    key: &Key,
    check_unique: bool,
) -> crate::Result<()> {
    let idx = hash::bucket(key, desc.map.modulo);
    let mut items = read_bucket(top, idx);

    if check_unique && search::position(&items, key, fx)?.is_some() {
        return Err(crate::Error::UniqueKeyViolation);
    }

    items.push(stored);
    write_bucket(top, idx, items);
    Ok(())
}

/// Spreads the compact bucket over `modulo` bucket bins.
///
/// The snapshot members are already stored (and unique), so they are
/// reinserted verbatim with uniqueness checks and statistics suppressed.
fn rehash(
    desc: &mut Descriptor,
    top: &mut TopRecord,
    fx: &FunctionContext,
) -> crate::Result<()> {
    let snapshot = read_bucket(top, 0);

    log::debug!(
        "Rehashing {} members of bin {:?} into {} bucket bins",
        snapshot.len(),
        desc.props.bin_name,
        desc.map.modulo,
    );

    for idx in 0..desc.map.modulo as usize {
        write_bucket(top, idx, Vec::new());
    }

    desc.map.store_state = StoreState::Regular;

    for stored in snapshot {
        let stored_key = key::extract(&fx.reveal(&stored)?, fx)?;
        regular_insert(desc, top, fx, stored, &stored_key, false)?;
    }

    Ok(())
}

fn bucket_of(desc: &Descriptor, key: &Key) -> usize {
    if desc.map.store_state == StoreState::Compact {
        0
    } else {
        hash::bucket(key, desc.map.modulo)
    }
}

/// Looks a key up. Returns the raw stored value.
pub(crate) fn search(
    desc: &Descriptor,
    top: &TopRecord,
    fx: &FunctionContext,
    key: &Key,
) -> crate::Result<Option<Value>> {
    let items = read_bucket(top, bucket_of(desc, key));

    Ok(search::position(&items, key, fx)?
        .and_then(|pos| items.get(pos))
        .cloned())
}

/// Removes a key and returns the revealed member.
///
/// The vacated slot is filled by the last element; member order is not part
/// of the set contract.
pub(crate) fn remove(
    desc: &Descriptor,
    top: &mut TopRecord,
    fx: &FunctionContext,
    key: &Key,
) -> crate::Result<Value> {
    let idx = bucket_of(desc, key);
    let mut items = read_bucket(top, idx);

    let pos = search::position(&items, key, fx)?.ok_or(crate::Error::NotFound)?;

    let revealed = fx.reveal(
        items
            .get(pos)
            .ok_or(crate::Error::Internal("search position out of bounds"))?,
    )?;

    if !fx.accepts(&revealed)? {
        return Err(crate::Error::NotFound);
    }

    items.swap_remove(pos);
    write_bucket(top, idx, items);

    Ok(revealed)
}

/// Collects every raw stored value.
pub(crate) fn scan(desc: &Descriptor, top: &TopRecord) -> crate::Result<Vec<Value>> {
    let buckets = if desc.map.store_state == StoreState::Compact {
        1
    } else {
        desc.map.modulo as usize
    };

    let mut out = Vec::new();

    for idx in 0..buckets {
        out.extend(read_bucket(top, idx));
    }

    Ok(out)
}

/// Removes every bucket bin.
pub(crate) fn destroy(top: &mut TopRecord) {
    let buckets: Vec<String> = top
        .bin_names()
        .filter(|name| name.starts_with(BUCKET_BIN_PREFIX))
        .map(Into::into)
        .collect();

    for name in buckets {
        top.remove_bin(&name);
    }
}
