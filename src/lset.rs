// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    descriptor::{
        self,
        set_map::{KeyType, StoreState, StoreType},
        Descriptor,
    },
    functions::{Filter, FunctionContext},
    host::Host,
    key,
    record::{self, TopRecord, BIN_FLAG_CONTROL, BIN_FLAG_RESTRICTED},
    settings, sub_store,
    subrec::SubRecContext,
    top_store,
    value::Value,
};
use std::collections::BTreeMap;

/// A large set living in one bin of a top record.
///
/// The handle borrows the open record image and the host for the duration
/// of a batch of calls; every call re-validates the stored descriptor, so a
/// handle carries no set state of its own. Mutating calls commit the record
/// through the host before returning; on any error the record is left
/// untouched.
pub struct Lset<'a, H: Host> {
    top: &'a mut TopRecord,
    host: &'a mut H,
    bin: String,
}

impl<'a, H: Host> Lset<'a, H> {
    /// Attaches to a set bin, existing or not.
    ///
    /// # Errors
    ///
    /// Fails if the bin name is empty or exceeds the host's limit.
    pub fn new(top: &'a mut TopRecord, host: &'a mut H, bin: &str) -> crate::Result<Self> {
        descriptor::check_bin_name(bin)?;

        Ok(Self {
            top,
            host,
            bin: bin.into(),
        })
    }

    /// Creates the set explicitly, with an optional settings spec
    /// (see [`crate::SetMap`] for the tunables).
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::BinExists`] if the bin already holds a
    /// set.
    pub fn create(&mut self, spec: Option<&Value>) -> crate::Result<()> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        if validate_optional(top, &self.bin)?.is_some() {
            return Err(crate::Error::BinExists(self.bin.clone()));
        }

        let desc = create_descriptor(top, host, &self.bin, spec)?;

        write_descriptor(top, &self.bin, &desc);
        commit(host, top)
    }

    /// Adds a value to the set.
    ///
    /// The set is created on first use; `spec` is only consulted then.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::UniqueKeyViolation`] if a member with the
    /// same extracted key already exists.
    pub fn add(&mut self, value: &Value, spec: Option<&Value>) -> crate::Result<()> {
        self.add_all(std::slice::from_ref(value), spec)
    }

    /// Adds a batch of values to the set.
    ///
    /// Elements are inserted in order and the first failure aborts the
    /// rest; everything inserted before the failure stays in the set.
    pub fn add_all(&mut self, values: &[Value], spec: Option<&Value>) -> crate::Result<()> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let mut desc = match validate_optional(top, &self.bin)? {
            Some(desc) => desc,
            None => create_descriptor(top, host, &self.bin, spec)?,
        };

        let fx = FunctionContext::build(host.registry(), &desc.map, None)?;
        let mut ctx = SubRecContext::new(&mut *host);

        let mut inserted = 0usize;
        let mut failure = None;

        for (idx, value) in values.iter().enumerate() {
            match insert_one(&mut desc, top, &mut ctx, &fx, value) {
                Ok(()) => inserted += 1,
                Err(e) => {
                    log::warn!("add_all aborted at element {idx}: {e}");
                    failure = Some(e);
                    break;
                }
            }
        }

        if inserted > 0 {
            write_descriptor(top, &self.bin, &desc);
            ctx.flush()?;
            commit(host, top)?;
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fetches the member matching a key.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::NotFound`] on a miss, or when the
    /// caller's filter rejects the match.
    pub fn get(&mut self, key_value: &Value, filter: Option<&Filter>) -> crate::Result<Value> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let desc = validate_existing(top, &self.bin)?;
        let fx = FunctionContext::build(host.registry(), &desc.map, filter)?;
        let key = key::extract(key_value, &fx)?;

        let mut ctx = SubRecContext::new(&mut *host);

        let raw = match desc.map.store_type {
            StoreType::Record => top_store::search(&desc, top, &fx, &key)?,
            StoreType::SubRecord => sub_store::search(&desc, top, &mut ctx, &fx, &key)?,
        };

        let revealed = fx.reveal(&raw.ok_or(crate::Error::NotFound)?)?;

        if !fx.accepts(&revealed)? {
            return Err(crate::Error::NotFound);
        }

        Ok(revealed)
    }

    /// Tests membership of a key. Never fails on a miss.
    pub fn exists(&mut self, key_value: &Value) -> crate::Result<bool> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let desc = validate_existing(top, &self.bin)?;
        let fx = FunctionContext::build(host.registry(), &desc.map, None)?;
        let key = key::extract(key_value, &fx)?;

        let mut ctx = SubRecContext::new(&mut *host);

        let raw = match desc.map.store_type {
            StoreType::Record => top_store::search(&desc, top, &fx, &key)?,
            StoreType::SubRecord => sub_store::search(&desc, top, &mut ctx, &fx, &key)?,
        };

        Ok(raw.is_some())
    }

    /// Returns every member, optionally narrowed by a filter.
    ///
    /// Order is unspecified; a set only promises membership.
    pub fn scan(&mut self, filter: Option<&Filter>) -> crate::Result<Vec<Value>> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let desc = validate_existing(top, &self.bin)?;
        let fx = FunctionContext::build(host.registry(), &desc.map, filter)?;

        let mut ctx = SubRecContext::new(&mut *host);

        let raws = match desc.map.store_type {
            StoreType::Record => top_store::scan(&desc, top)?,
            StoreType::SubRecord => sub_store::scan(&desc, top, &mut ctx)?,
        };

        let mut out = Vec::with_capacity(raws.len());

        for raw in &raws {
            let revealed = fx.reveal(raw)?;

            if fx.accepts(&revealed)? {
                out.push(revealed);
            }
        }

        Ok(out)
    }

    /// Removes the member matching a key.
    ///
    /// Returns the removed member when `return_value` is set.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::NotFound`] on a miss, or when the
    /// caller's filter rejects the match; the set is unchanged then.
    pub fn remove(
        &mut self,
        key_value: &Value,
        filter: Option<&Filter>,
        return_value: bool,
    ) -> crate::Result<Option<Value>> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let mut desc = validate_existing(top, &self.bin)?;
        let fx = FunctionContext::build(host.registry(), &desc.map, filter)?;
        let key = key::extract(key_value, &fx)?;

        let mut ctx = SubRecContext::new(&mut *host);

        let removed = match desc.map.store_type {
            StoreType::Record => top_store::remove(&desc, top, &fx, &key)?,
            StoreType::SubRecord => sub_store::remove(&mut desc, top, &mut ctx, &fx, &key)?,
        };

        desc.props.item_count = desc
            .props
            .item_count
            .checked_sub(1)
            .ok_or(crate::Error::Internal("item count underflow"))?;

        write_descriptor(top, &self.bin, &desc);
        ctx.flush()?;
        commit(host, top)?;

        Ok(return_value.then_some(removed))
    }

    /// Destroys the whole set: the user bin, every bucket bin, and (through
    /// the existence sub-record) every sub-record.
    pub fn destroy(&mut self) -> crate::Result<()> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let desc = validate_existing(top, &self.bin)?;

        log::debug!(
            "Destroying LSET bin {:?} with {} members",
            self.bin,
            desc.props.item_count,
        );

        match desc.map.store_type {
            StoreType::Record => top_store::destroy(top),
            StoreType::SubRecord => {
                let mut ctx = SubRecContext::new(&mut *host);
                sub_store::destroy(&desc, &mut ctx)?;
            }
        }

        top.remove_bin(&self.bin);
        record::ldt_control_release(top);

        commit(host, top)
    }

    /// Number of members.
    pub fn size(&mut self) -> crate::Result<u64> {
        Ok(validate_existing(self.top, &self.bin)?.props.item_count)
    }

    /// Snapshot of the set's settings and statistics, keyed by full field
    /// names.
    pub fn config(&mut self) -> crate::Result<Value> {
        let desc = validate_existing(self.top, &self.bin)?;

        let mut out = BTreeMap::new();

        out.insert("BinName".into(), Value::String(desc.props.bin_name.clone()));
        out.insert(
            "ItemCount".into(),
            Value::Integer(to_i64(desc.props.item_count)),
        );
        out.insert(
            "SubRecCount".into(),
            Value::Integer(to_i64(desc.props.subrec_count)),
        );
        out.insert(
            "TotalCount".into(),
            Value::Integer(to_i64(desc.map.total_count)),
        );
        out.insert(
            "Version".into(),
            Value::Integer(i64::from(desc.props.version)),
        );
        out.insert(
            "CreateTime".into(),
            Value::Integer(to_i64(desc.props.create_time)),
        );
        out.insert(
            "SetTypeStore".into(),
            Value::String(desc.map.store_type.to_string()),
        );
        out.insert(
            "StoreState".into(),
            Value::String(desc.map.store_state.to_string()),
        );
        out.insert(
            "StoreMode".into(),
            Value::String(desc.map.store_mode.to_string()),
        );
        out.insert(
            "Modulo".into(),
            Value::Integer(i64::from(desc.map.modulo)),
        );
        out.insert(
            "Threshold".into(),
            Value::Integer(to_i64(desc.map.threshold)),
        );
        out.insert(
            "HashCellMaxList".into(),
            Value::Integer(to_i64(desc.map.hash_cell_max_list as u64)),
        );
        out.insert(
            "StoreLimit".into(),
            Value::Integer(to_i64(desc.map.store_limit)),
        );

        if let Some(key_type) = desc.map.key_type {
            out.insert("KeyType".into(), Value::String(key_type.to_string()));
        }

        for (name, slot) in [
            ("UserModule", &desc.map.user_module),
            ("KeyFunction", &desc.map.key_function),
            ("Transform", &desc.map.transform),
            ("UnTransform", &desc.map.untransform),
        ] {
            if let Some(value) = slot {
                out.insert(name.into(), Value::String(value.clone()));
            }
        }

        Ok(Value::Map(out))
    }

    /// Current capacity ceiling; zero means unbounded.
    pub fn get_capacity(&mut self) -> crate::Result<u64> {
        Ok(validate_existing(self.top, &self.bin)?.map.store_limit)
    }

    /// Sets the capacity ceiling; zero means unbounded.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::InputParam`] if the new ceiling is below
    /// the current member count.
    pub fn set_capacity(&mut self, capacity: u64) -> crate::Result<()> {
        let top = &mut *self.top;
        let host = &mut *self.host;

        let mut desc = validate_existing(top, &self.bin)?;

        if capacity != 0 && capacity < desc.props.item_count {
            return Err(crate::Error::InputParam(format!(
                "capacity {capacity} is below the current size {}",
                desc.props.item_count,
            )));
        }

        desc.map.store_limit = capacity;

        write_descriptor(top, &self.bin, &desc);
        commit(host, top)
    }

    /// Renders the descriptor and every bucket into a diagnostic string.
    pub fn dump(&mut self) -> crate::Result<String> {
        use std::fmt::Write;

        let top = &mut *self.top;
        let host = &mut *self.host;

        let desc = validate_existing(top, &self.bin)?;
        let mut ctx = SubRecContext::new(&mut *host);

        let mut out = String::new();

        let _ = writeln!(out, "LSET bin {:?}", self.bin);
        let _ = writeln!(
            out,
            "  {} / {} / {}, modulo={}, threshold={}, cell max={}",
            desc.map.store_type,
            desc.map.store_state,
            desc.map.store_mode,
            desc.map.modulo,
            desc.map.threshold,
            desc.map.hash_cell_max_list,
        );
        let _ = writeln!(
            out,
            "  items={}, total={}, subrecs={}, limit={}",
            desc.props.item_count,
            desc.map.total_count,
            desc.props.subrec_count,
            desc.map.store_limit,
        );

        if let Some(esr) = desc.props.esr_digest {
            let _ = writeln!(out, "  esr={esr}");
        }

        match desc.map.store_type {
            StoreType::Record => {
                let buckets = if desc.map.store_state == StoreState::Compact {
                    1
                } else {
                    desc.map.modulo as usize
                };

                for idx in 0..buckets {
                    let name = format!("{}{idx}", top_store::BUCKET_BIN_PREFIX);
                    let items = top.bin(&name).and_then(Value::as_list).unwrap_or(&[]);

                    if !items.is_empty() {
                        let _ = writeln!(out, "  bucket {idx}: {}", Value::List(items.to_vec()));
                    }
                }
            }

            StoreType::SubRecord => {
                if let Some(list) = &desc.map.compact_list {
                    let _ = writeln!(out, "  compact: {}", Value::List(list.clone()));
                }

                if let Some(cells) = &desc.map.hash_directory {
                    for (idx, cell) in cells.iter().enumerate() {
                        match cell {
                            crate::CellAnchor::Empty => {}
                            crate::CellAnchor::List(items) => {
                                let _ = writeln!(
                                    out,
                                    "  cell {idx} (list): {}",
                                    Value::List(items.clone()),
                                );
                            }
                            crate::CellAnchor::Digest { digest, item_count } => {
                                let _ = write!(out, "  cell {idx} (subrec {digest}, {item_count} items)");

                                match ctx.open(top, digest) {
                                    Ok(sub) => {
                                        let _ = writeln!(out, ": {}", Value::List(sub.list.clone()));
                                    }
                                    Err(_) => {
                                        let _ = writeln!(out, ": <unopenable>");
                                    }
                                }
                            }
                            crate::CellAnchor::Tree(digests) => {
                                let _ = writeln!(out, "  cell {idx} (tree): {} subrecs", digests.len());
                            }
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

fn insert_one<H: Host>(
    desc: &mut Descriptor,
    top: &mut TopRecord,
    ctx: &mut SubRecContext<'_, H>,
    fx: &FunctionContext,
    value: &Value,
) -> crate::Result<()> {
    // The key shape is pinned by the first member when the settings left
    // it open.
    if desc.map.key_type.is_none() {
        desc.map.key_type = Some(if value.is_scalar() {
            KeyType::Atomic
        } else {
            KeyType::Complex
        });
    }

    let key = key::extract(value, fx)?;
    let stored = fx.conceal(value)?;

    match desc.map.store_type {
        StoreType::Record => top_store::insert(desc, top, fx, stored, &key)?,
        StoreType::SubRecord => sub_store::insert(desc, top, ctx, fx, stored, &key)?,
    }

    desc.props.item_count += 1;
    desc.map.total_count += 1;
    Ok(())
}

fn create_descriptor<H: Host>(
    top: &mut TopRecord,
    host: &mut H,
    bin: &str,
    spec: Option<&Value>,
) -> crate::Result<Descriptor> {
    let mut desc = Descriptor::new(bin, host.now());

    settings::apply(&mut desc.map, spec, host.registry())?;

    match desc.map.store_type {
        StoreType::Record => top_store::reserve(top)?,
        StoreType::SubRecord => desc.map.compact_list = Some(Vec::new()),
    }

    record::ldt_control_attach(top);

    log::debug!("Created LSET bin {bin:?} ({} layout)", desc.map.store_type);

    Ok(desc)
}

/// Full validation for entry points that require a live set.
fn validate_existing(top: &TopRecord, bin: &str) -> crate::Result<Descriptor> {
    descriptor::check_bin_name(bin)?;

    if !top.exists() {
        return Err(crate::Error::TopRecordNotFound);
    }

    let value = top
        .bin(bin)
        .ok_or_else(|| crate::Error::BinNotFound(bin.into()))?;

    Descriptor::from_value(value)
}

/// Validation for entry points that may create the set: an absent bin is
/// fine, a present-but-corrupt one is not.
fn validate_optional(top: &TopRecord, bin: &str) -> crate::Result<Option<Descriptor>> {
    descriptor::check_bin_name(bin)?;

    match top.bin(bin) {
        None => Ok(None),
        Some(value) => Descriptor::from_value(value).map(Some),
    }
}

/// Writes the descriptor back into the user bin, re-asserting the LDT bin
/// flags and the record-level LDT marker (the host does not persist either
/// across value replacement).
fn write_descriptor(top: &mut TopRecord, bin: &str, desc: &Descriptor) {
    top.set_bin(
        bin,
        desc.to_value(),
        BIN_FLAG_RESTRICTED | BIN_FLAG_CONTROL,
    );
    top.set_ldt_record();
}

fn commit<H: Host>(host: &mut H, top: &mut TopRecord) -> crate::Result<()> {
    if top.exists() {
        host.update(top)
    } else {
        host.create(top)
    }
}

#[allow(clippy::cast_possible_wrap)]
fn to_i64(x: u64) -> i64 {
    x as i64
}
