// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    descriptor::property_map::{PropertyMap, RecordRole},
    digest::Digest,
    host::Host,
    record::TopRecord,
    value::Value,
};
use rustc_hash::FxHashMap;

/// Name of the property-map bin in a child record.
pub const SR_PROP_BIN: &str = "SR_PROP_BIN";

/// Name of the reserved control bin in a child record.
pub const LDR_CTRL_BIN: &str = "LdrControlBin";

/// Name of the segment-list bin in a child record.
pub const LDR_LIST_BIN: &str = "LdrListBin";

/// A child record carrying one segment of the set.
///
/// Sub-records are created on demand during cell promotion and destroyed
/// only when their existence sub-record goes away.
#[derive(Clone, Debug)]
pub struct SubRecord {
    /// Host-minted digest identifying this record
    pub digest: Digest,

    /// The record's property map (`SR_PROP_BIN`)
    pub props: PropertyMap,

    /// The segment of the overall set held here (`LdrListBin`)
    pub list: Vec<Value>,
}

impl SubRecord {
    /// Builds the image of a freshly allocated child record.
    #[must_use]
    pub fn new(digest: Digest, props: PropertyMap) -> Self {
        Self {
            digest,
            props,
            list: Vec::new(),
        }
    }
}

struct OpenSub {
    rec: SubRecord,
    dirty: bool,
}

/// Per-call open-handle tracker for sub-records.
///
/// Batches opens and writes so one logical operation touches each
/// sub-record once, and so the host observes a single write set at commit.
/// On an error path the context is simply dropped: handles are released and
/// nothing is persisted.
pub(crate) struct SubRecContext<'a, H: Host> {
    host: &'a mut H,
    open: FxHashMap<Digest, OpenSub>,
}

impl<'a, H: Host> SubRecContext<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self {
            host,
            open: FxHashMap::default(),
        }
    }

    /// Allocates a new child record, registered dirty from the start.
    pub fn create(
        &mut self,
        top: &TopRecord,
        role: RecordRole,
        bin_name: &str,
        esr: Digest,
    ) -> crate::Result<Digest> {
        let mut rec = self.host.create_subrec(top)?;
        let digest = rec.digest;

        rec.props = PropertyMap::new_child(role, bin_name, top.digest(), digest, esr);

        self.open.insert(digest, OpenSub { rec, dirty: true });
        Ok(digest)
    }

    /// Opens a child record for reading, reusing an already open handle.
    pub fn open(&mut self, top: &TopRecord, digest: &Digest) -> crate::Result<&SubRecord> {
        self.open_entry(top, digest).map(|open| &open.rec)
    }

    /// Opens a child record for writing; the handle is flushed on commit.
    pub fn open_dirty(
        &mut self,
        top: &TopRecord,
        digest: &Digest,
    ) -> crate::Result<&mut SubRecord> {
        let open = self.open_entry(top, digest)?;
        open.dirty = true;
        Ok(&mut open.rec)
    }

    /// Removes a child record through the host, dropping any open handle.
    ///
    /// Removing an existence sub-record makes the host cascade removal of
    /// every child linked to it.
    pub fn remove(&mut self, digest: &Digest) -> crate::Result<()> {
        self.open.remove(digest);
        self.host.remove_subrec(digest)
    }

    /// Writes every dirty handle back through the host and releases all of
    /// them. Called on the success path only.
    pub fn flush(self) -> crate::Result<()> {
        let Self { host, open } = self;

        for open in open.values() {
            if open.dirty {
                host.save_subrec(&open.rec)?;
            }
        }

        Ok(())
    }

    fn open_entry(&mut self, top: &TopRecord, digest: &Digest) -> crate::Result<&mut OpenSub> {
        use std::collections::hash_map::Entry;

        match self.open.entry(*digest) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let rec = self.host.open_subrec(top, digest)?;

                Ok(entry.insert(OpenSub { rec, dirty: false }))
            }
        }
    }
}

/// Returns the existing ESR digest, or creates the existence sub-record on
/// first use and records it in the top record's property map.
pub(crate) fn ensure_esr<H: Host>(
    props: &mut PropertyMap,
    top: &TopRecord,
    ctx: &mut SubRecContext<'_, H>,
) -> crate::Result<Digest> {
    if let Some(digest) = props.esr_digest {
        return Ok(digest);
    }

    // The ESR is its own existence anchor; its digest is only known after
    // the host mints it, so it is patched into its own property map.
    let placeholder = Digest::from_bytes([0u8; 20]);
    let digest = ctx.create(top, RecordRole::Esr, &props.bin_name, placeholder)?;

    let esr = ctx.open_dirty(top, &digest)?;
    esr.props.esr_digest = Some(digest);

    props.esr_digest = Some(digest);
    props.subrec_count += 1;

    log::debug!("Created existence sub-record {digest} for bin {:?}", props.bin_name);

    Ok(digest)
}
