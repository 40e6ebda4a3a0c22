// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A record-embedded large set (LSET) engine.
//!
//! ##### NOTE
//!
//! > This crate only provides the set engine, not a database. The host
//! > runtime that owns records, sub-records, digests and user-defined
//! > functions is consumed through the [`Host`] and [`ModuleRegistry`]
//! > traits; the crate itself performs no I/O.
//!
//! ##### About
//!
//! An LSET lives inside a single *top record* of a host key-value store,
//! under a user-chosen bin name, and provides unique-membership semantics
//! over arbitrarily typed values (scalars or structured objects).
//!
//! Small sets are stored *compact* (a single inline list). When the set
//! crosses a configurable threshold it is rehashed into a *regular*
//! bucketed layout, using one of two persistence schemes chosen at create
//! time:
//!
//! - **Record layout** — hash buckets are hidden bins of the top record
//!   itself, so total capacity is bounded by the record size.
//! - **Sub-record layout** — a hash directory in the top record, with
//!   per-bucket overflow into child *sub-records* keyed by content digest,
//!   giving effectively unbounded capacity.
//!
//! # Example usage
//!
//! ```
//! use lset::{Lset, Value};
//! # use lset::testing::MemoryHost;
//! #
//! # let mut host = MemoryHost::default();
//! # let mut top = host.fresh_record();
//!
//! // Attach to a bin; the set is created by the first write
//! let mut set = Lset::new(&mut top, &mut host, "myset")?;
//!
//! set.add(&Value::from("my_value"), None)?;
//!
//! assert!(set.exists(&Value::from("my_value"))?);
//! assert_eq!(1, set.size()?);
//!
//! // Members come back out through a full scan
//! let members = set.scan(None)?;
//! assert_eq!(1, members.len());
//!
//! // Duplicate inserts are rejected
//! assert!(set.add(&Value::from("my_value"), None).is_err());
//! #
//! # Ok::<(), lset::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]

mod descriptor;
mod digest;
mod error;
mod functions;
mod hash;
mod hash_cell;
mod host;
mod key;
mod lset;
mod record;
mod search;
mod settings;
mod sub_store;
mod subrec;

#[doc(hidden)]
pub mod testing;

mod top_store;
mod value;

pub use {
    descriptor::{
        cell::CellAnchor,
        property_map::{PropertyMap, RecordRole},
        set_map::{KeyType, SetMap, StoreMode, StoreState, StoreType},
        Descriptor, LDT_TYPE, LDT_VERSION, MAGIC, MAX_BIN_NAME_LEN,
    },
    digest::Digest,
    error::{Error, Result},
    functions::{Filter, FilterFn, MapFn, ModuleRegistry, UserModule},
    host::Host,
    key::Key,
    lset::Lset,
    record::{
        TopRecord, BIN_FLAG_CONTROL, BIN_FLAG_HIDDEN, BIN_FLAG_RESTRICTED, LDT_CONTROL_BIN,
    },
    subrec::{SubRecord, LDR_CTRL_BIN, LDR_LIST_BIN, SR_PROP_BIN},
    value::Value,
};
