// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{functions::FunctionContext, key::Key, value::Value};

/// Linear scan of a stored value list, comparing by extracted key.
///
/// Each slot is untransformed before key extraction, so the list may hold
/// either raw or transformed representations. Returns the position of the
/// first match.
pub(crate) fn position(
    list: &[Value],
    key: &Key,
    fx: &FunctionContext,
) -> crate::Result<Option<usize>> {
    for (idx, stored) in list.iter().enumerate() {
        let visible = fx.reveal(stored)?;

        if *key == crate::key::extract(&visible, fx)? {
            return Ok(Some(idx));
        }
    }

    Ok(None)
}
