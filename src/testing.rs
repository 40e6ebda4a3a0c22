// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! In-memory reference host, used by the test suite and doc examples.
//!
//! Models the host contract the way a real runtime would: opening a
//! sub-record hands out a copy of the stored image, saving writes the copy
//! back, and removing an existence sub-record cascades removal of every
//! child linked to it. Nothing created inside a call becomes durable until
//! the engine's commit path saves it.

use crate::{
    descriptor::property_map::{PropertyMap, RecordRole},
    digest::Digest,
    functions::{FilterFn, MapFn, ModuleRegistry, UserModule},
    host::Host,
    record::TopRecord,
    subrec::SubRecord,
};
use rustc_hash::FxHashMap;

/// A [`ModuleRegistry`] backed by plain lookup tables.
#[derive(Default)]
pub struct MemoryRegistry {
    modules: Vec<(String, Box<dyn UserModule>)>,
    functions: Vec<(String, MapFn)>,
    filters: Vec<(String, FilterFn)>,
}

impl MemoryRegistry {
    /// Registers a user module.
    pub fn register_module<N: Into<String>>(&mut self, name: N, module: Box<dyn UserModule>) {
        self.modules.push((name.into(), module));
    }

    /// Registers a bare value function.
    pub fn register_function<N: Into<String>>(&mut self, name: N, f: MapFn) {
        self.functions.push((name.into(), f));
    }

    /// Registers a bare filter.
    pub fn register_filter<N: Into<String>>(&mut self, name: N, f: FilterFn) {
        self.filters.push((name.into(), f));
    }
}

impl ModuleRegistry for MemoryRegistry {
    fn module(&self, name: &str) -> Option<&dyn UserModule> {
        self.modules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.as_ref())
    }

    fn function(&self, name: &str) -> Option<MapFn> {
        self.functions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
    }

    fn filter(&self, name: &str) -> Option<FilterFn> {
        self.filters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
    }
}

/// An in-memory [`Host`].
pub struct MemoryHost {
    clock: u64,
    next_digest: u64,
    subrecs: FxHashMap<Digest, SubRecord>,
    registry: Option<MemoryRegistry>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self {
            clock: 1_600_000_000_000,
            next_digest: 0,
            subrecs: FxHashMap::default(),
            registry: None,
        }
    }
}

impl MemoryHost {
    /// Mints the image of a record that does not exist in storage yet.
    pub fn fresh_record(&mut self) -> TopRecord {
        TopRecord::new(self.mint())
    }

    /// Installs a function registry.
    pub fn set_registry(&mut self, registry: MemoryRegistry) {
        self.registry = Some(registry);
    }

    /// Number of durable sub-records (existence sub-records included).
    #[must_use]
    pub fn subrec_count(&self) -> usize {
        self.subrecs.len()
    }

    /// Reads back a durable sub-record.
    #[must_use]
    pub fn subrec(&self, digest: &Digest) -> Option<&SubRecord> {
        self.subrecs.get(digest)
    }

    fn mint(&mut self) -> Digest {
        self.next_digest += 1;

        let mut bytes = [0u8; 20];
        bytes[..8].copy_from_slice(&self.next_digest.to_be_bytes());
        bytes[8..16].copy_from_slice(&self.next_digest.rotate_left(17).to_be_bytes());

        Digest::from_bytes(bytes)
    }
}

impl Host for MemoryHost {
    fn create(&mut self, top: &mut TopRecord) -> crate::Result<()> {
        top.mark_stored();
        Ok(())
    }

    fn update(&mut self, top: &mut TopRecord) -> crate::Result<()> {
        if !top.exists() {
            return Err(crate::Error::TopRecordUpdate);
        }

        Ok(())
    }

    fn remove(&mut self, top: &mut TopRecord) -> crate::Result<()> {
        let names: Vec<String> = top.bin_names().map(Into::into).collect();

        for name in names {
            top.remove_bin(&name);
        }

        Ok(())
    }

    fn create_subrec(&mut self, top: &TopRecord) -> crate::Result<SubRecord> {
        let digest = self.mint();

        // The engine replaces these properties before the record is saved.
        let props = PropertyMap::new_child(
            RecordRole::Sub,
            "",
            top.digest(),
            digest,
            Digest::from_bytes([0u8; 20]),
        );

        Ok(SubRecord::new(digest, props))
    }

    fn open_subrec(&mut self, _top: &TopRecord, digest: &Digest) -> crate::Result<SubRecord> {
        self.subrecs
            .get(digest)
            .cloned()
            .ok_or(crate::Error::SubRecOpen(*digest))
    }

    fn save_subrec(&mut self, sub: &SubRecord) -> crate::Result<()> {
        self.subrecs.insert(sub.digest, sub.clone());
        Ok(())
    }

    fn remove_subrec(&mut self, digest: &Digest) -> crate::Result<()> {
        self.subrecs
            .remove(digest)
            .ok_or(crate::Error::SubRecDelete(*digest))?;

        // Children die with their existence sub-record.
        self.subrecs
            .retain(|_, rec| rec.props.esr_digest != Some(*digest));

        Ok(())
    }

    fn now(&self) -> u64 {
        self.clock
    }

    fn registry(&self) -> Option<&dyn ModuleRegistry> {
        self.registry
            .as_ref()
            .map(|registry| registry as &dyn ModuleRegistry)
    }
}
