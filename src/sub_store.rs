// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Sub-record-layout driver: a hash directory in the top record, with
//! per-bucket overflow into child sub-records.
//!
//! Compact state keeps every member in the descriptor's inline compact
//! list. Crossing the rehash threshold replaces the list with a directory
//! of `modulo` cell anchors; each cell then runs the
//! [`hash_cell`](crate::hash_cell) state machine, so a bucket spills into a
//! sub-record only once it outgrows its inline allowance.

use crate::{
    descriptor::{cell::CellAnchor, set_map::StoreState, Descriptor},
    functions::FunctionContext,
    hash, hash_cell,
    host::Host,
    key::{self, Key},
    record::TopRecord,
    search,
    subrec::SubRecContext,
    value::Value,
};

/// Inserts a stored value, rehashing into the regular state when the
/// compact list crosses the threshold.
pub(crate) fn insert<H: Host>(
    desc: &mut Descriptor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    stored: Value,
    key: &Key,
) -> crate::Result<()> {
    if desc.map.store_state == StoreState::Compact {
        let list = desc
            .map
            .compact_list
            .as_mut()
            .ok_or(crate::Error::Internal("compact list missing"))?;

        if search::position(list, key, fx)?.is_some() {
            return Err(crate::Error::UniqueKeyViolation);
        }

        if desc.map.total_count + 1 < desc.map.threshold {
            list.push(stored);
            return Ok(());
        }

        rehash(desc, top, ctx, fx)?;
    }

    regular_insert(desc, top, ctx, fx, stored, key)
}

fn regular_insert<H: Host>(
    desc: &mut Descriptor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    stored: Value,
    key: &Key,
) -> crate::Result<()> {
    let max_list = desc.map.hash_cell_max_list;
    let idx = hash::bucket(key, desc.map.modulo);

    let cell = desc
        .map
        .hash_directory
        .as_mut()
        .and_then(|cells| cells.get_mut(idx))
        .ok_or(crate::Error::Internal("hash directory missing a cell"))?;

    hash_cell::insert(cell, max_list, &mut desc.props, top, ctx, fx, stored, key)
}

/// Replaces the compact list with a cell directory and respreads the
/// members.
///
/// The snapshot members are already stored (and unique), so statistics stay
/// untouched while they are reinserted.
fn rehash<H: Host>(
    desc: &mut Descriptor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
) -> crate::Result<()> {
    let snapshot = desc.map.compact_list.take().unwrap_or_default();

    log::debug!(
        "Rehashing {} members of bin {:?} into a {}-cell directory",
        snapshot.len(),
        desc.props.bin_name,
        desc.map.modulo,
    );

    desc.map.hash_directory = Some(vec![CellAnchor::Empty; desc.map.modulo as usize]);
    desc.map.store_state = StoreState::Regular;

    for stored in snapshot {
        let stored_key = key::extract(&fx.reveal(&stored)?, fx)?;
        regular_insert(desc, top, ctx, fx, stored, &stored_key)?;
    }

    Ok(())
}

/// Looks a key up. Returns the raw stored value.
pub(crate) fn search<H: Host>(
    desc: &Descriptor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    key: &Key,
) -> crate::Result<Option<Value>> {
    if desc.map.store_state == StoreState::Compact {
        let list = desc
            .map
            .compact_list
            .as_deref()
            .ok_or(crate::Error::Internal("compact list missing"))?;

        return Ok(search::position(list, key, fx)?
            .and_then(|pos| list.get(pos))
            .cloned());
    }

    let cell = cell_of(desc, key)?;
    hash_cell::search(cell, top, ctx, fx, key)
}

/// Removes a key and returns the revealed member.
pub(crate) fn remove<H: Host>(
    desc: &mut Descriptor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    key: &Key,
) -> crate::Result<Value> {
    if desc.map.store_state == StoreState::Compact {
        let list = desc
            .map
            .compact_list
            .as_mut()
            .ok_or(crate::Error::Internal("compact list missing"))?;

        let pos = search::position(list, key, fx)?.ok_or(crate::Error::NotFound)?;

        let revealed = fx.reveal(
            list.get(pos)
                .ok_or(crate::Error::Internal("search position out of bounds"))?,
        )?;

        if !fx.accepts(&revealed)? {
            return Err(crate::Error::NotFound);
        }

        list.swap_remove(pos);
        return Ok(revealed);
    }

    let idx = hash::bucket(key, desc.map.modulo);

    let cell = desc
        .map
        .hash_directory
        .as_mut()
        .and_then(|cells| cells.get_mut(idx))
        .ok_or(crate::Error::Internal("hash directory missing a cell"))?;

    hash_cell::remove(cell, top, ctx, fx, key)
}

/// Collects every raw stored value, opening sub-records as needed.
pub(crate) fn scan<H: Host>(
    desc: &Descriptor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
) -> crate::Result<Vec<Value>> {
    if desc.map.store_state == StoreState::Compact {
        return Ok(desc.map.compact_list.clone().unwrap_or_default());
    }

    let cells = desc
        .map
        .hash_directory
        .as_deref()
        .ok_or(crate::Error::Internal("hash directory missing"))?;

    let mut out = Vec::new();

    for cell in cells {
        hash_cell::scan_into(cell, top, ctx, &mut out)?;
    }

    Ok(out)
}

/// Tears down the sub-record side of the set.
///
/// Removing the existence sub-record makes the host cascade removal of
/// every data sub-record; the directory itself goes away with the user bin.
pub(crate) fn destroy<H: Host>(
    desc: &Descriptor,
    ctx: &mut SubRecContext<'_, H>,
) -> crate::Result<()> {
    if let Some(esr) = desc.props.esr_digest {
        log::debug!("Removing existence sub-record {esr} of bin {:?}", desc.props.bin_name);
        ctx.remove(&esr)?;
    }

    Ok(())
}

fn cell_of<'a>(desc: &'a Descriptor, key: &Key) -> crate::Result<&'a CellAnchor> {
    let idx = hash::bucket(key, desc.map.modulo);

    desc.map
        .hash_directory
        .as_deref()
        .and_then(|cells| cells.get(idx))
        .ok_or(crate::Error::Internal("hash directory missing a cell"))
}
