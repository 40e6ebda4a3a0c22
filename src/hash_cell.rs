// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Per-cell state machine for the sub-record layout.
//!
//! ```text
//! Empty --insert--> List (inline list of 1)
//! List  --insert, len < max--> List (append)
//! List  --insert, len = max--> Digest (inline list moves into a sub-record)
//! Digest --insert--> Digest (append to the sub-record's list)
//! ```
//!
//! The declared `Tree` follow-up stage (one cell, several sub-records) has
//! no write paths: a Digest cell grows its sub-record without bound, and
//! meeting a Tree cell in stored data is an internal error.

use crate::{
    descriptor::{cell::CellAnchor, property_map::PropertyMap, property_map::RecordRole},
    functions::FunctionContext,
    host::Host,
    key::Key,
    record::TopRecord,
    search,
    subrec::{self, SubRecContext},
    value::Value,
};

/// Inserts a stored value into a cell, enforcing unique keys.
#[allow(clippy::too_many_arguments)]
pub(crate) fn insert<H: Host>(
    cell: &mut CellAnchor,
    max_list: usize,
    props: &mut PropertyMap,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    stored: Value,
    key: &Key,
) -> crate::Result<()> {
    match cell {
        CellAnchor::Empty => {
            *cell = CellAnchor::List(vec![stored]);
            Ok(())
        }

        CellAnchor::List(items) => {
            if search::position(items, key, fx)?.is_some() {
                return Err(crate::Error::UniqueKeyViolation);
            }

            if items.len() < max_list {
                items.push(stored);
                return Ok(());
            }

            // The inline list is full: move it, together with the new
            // value, into a fresh sub-record.
            let esr = subrec::ensure_esr(props, top, ctx)?;
            let digest = ctx.create(top, RecordRole::Sub, &props.bin_name, esr)?;

            let mut list = std::mem::take(items);
            list.push(stored);
            let item_count = list.len() as u64;

            ctx.open_dirty(top, &digest)?.list = list;
            props.subrec_count += 1;

            log::trace!("Promoted cell to sub-record {digest} with {item_count} members");

            *cell = CellAnchor::Digest { digest, item_count };
            Ok(())
        }

        CellAnchor::Digest { digest, item_count } => {
            let sub = ctx.open_dirty(top, digest)?;

            if search::position(&sub.list, key, fx)?.is_some() {
                return Err(crate::Error::UniqueKeyViolation);
            }

            sub.list.push(stored);
            *item_count += 1;
            Ok(())
        }

        CellAnchor::Tree(_) => Err(crate::Error::Internal("tree cells have no write paths")),
    }
}

/// Looks a key up in a cell. Returns the raw stored value.
pub(crate) fn search<H: Host>(
    cell: &CellAnchor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    key: &Key,
) -> crate::Result<Option<Value>> {
    match cell {
        CellAnchor::Empty => Ok(None),

        CellAnchor::List(items) => Ok(search::position(items, key, fx)?
            .and_then(|pos| items.get(pos))
            .cloned()),

        CellAnchor::Digest { digest, .. } => {
            let sub = ctx.open(top, digest)?;

            Ok(search::position(&sub.list, key, fx)?
                .and_then(|pos| sub.list.get(pos))
                .cloned())
        }

        CellAnchor::Tree(_) => Err(crate::Error::Internal("tree cells have no read paths")),
    }
}

/// Removes a key from a cell and returns the revealed member.
///
/// Removal swaps the last element into the vacated slot; member order is
/// not part of the set contract. A sub-record whose list drains to empty is
/// kept: its cell stays in Digest state and the record itself lives until
/// the existence sub-record is destroyed.
pub(crate) fn remove<H: Host>(
    cell: &mut CellAnchor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    key: &Key,
) -> crate::Result<Value> {
    match cell {
        CellAnchor::Empty => Err(crate::Error::NotFound),

        CellAnchor::List(items) => {
            let pos = search::position(items, key, fx)?.ok_or(crate::Error::NotFound)?;

            let revealed = fx.reveal(items.get(pos).ok_or(crate::Error::Internal(
                "search position out of bounds",
            ))?)?;

            if !fx.accepts(&revealed)? {
                return Err(crate::Error::NotFound);
            }

            items.swap_remove(pos);

            if items.is_empty() {
                *cell = CellAnchor::Empty;
            }

            Ok(revealed)
        }

        CellAnchor::Digest { digest, item_count } => {
            let sub = ctx.open_dirty(top, digest)?;

            let pos = search::position(&sub.list, key, fx)?.ok_or(crate::Error::NotFound)?;

            let revealed = fx.reveal(sub.list.get(pos).ok_or(crate::Error::Internal(
                "search position out of bounds",
            ))?)?;

            if !fx.accepts(&revealed)? {
                return Err(crate::Error::NotFound);
            }

            sub.list.swap_remove(pos);
            *item_count -= 1;

            Ok(revealed)
        }

        CellAnchor::Tree(_) => Err(crate::Error::Internal("tree cells have no write paths")),
    }
}

/// Appends a cell's raw stored values to `out`.
pub(crate) fn scan_into<H: Host>(
    cell: &CellAnchor,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    out: &mut Vec<Value>,
) -> crate::Result<()> {
    match cell {
        CellAnchor::Empty => Ok(()),

        CellAnchor::List(items) => {
            out.extend(items.iter().cloned());
            Ok(())
        }

        CellAnchor::Digest { digest, .. } => {
            let sub = ctx.open(top, digest)?;
            out.extend(sub.list.iter().cloned());
            Ok(())
        }

        CellAnchor::Tree(_) => Err(crate::Error::Internal("tree cells have no read paths")),
    }
}
