// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{
    count, get_count, get_str, letters::*, LDT_TYPE, LDT_VERSION, MAGIC,
};
use crate::{digest::Digest, value::Value};
use std::collections::BTreeMap;

/// Role of a record within one LDT.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecordRole {
    /// The user's primary record, holding the control descriptor
    Top,

    /// A child record holding an overflow segment
    Sub,

    /// The existence sub-record tying all children to their parent
    Esr,
}

impl From<RecordRole> for u8 {
    fn from(value: RecordRole) -> Self {
        match value {
            RecordRole::Top => 0,
            RecordRole::Sub => 1,
            RecordRole::Esr => 2,
        }
    }
}

impl TryFrom<u8> for RecordRole {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Top),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Esr),
            _ => Err(()),
        }
    }
}

/// Fields common to every LDT record (top records and sub-records alike).
///
/// The magic sentinel and the `LSET` type discriminator are emitted and
/// checked by the codec but are not carried as struct fields.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyMap {
    /// Logical number of set members
    pub item_count: u64,

    /// Number of live sub-records (existence sub-record included)
    pub subrec_count: u64,

    /// On-disk schema version the record was written with
    pub version: u16,

    /// User-supplied bin name
    pub bin_name: String,

    /// Role of this record
    pub rec_type: RecordRole,

    /// Digest of the existence sub-record, once the first sub-record exists
    pub esr_digest: Option<Digest>,

    /// Digest of the owning top record (sub-records only)
    pub parent_digest: Option<Digest>,

    /// Own digest (sub-records only)
    pub self_digest: Option<Digest>,

    /// Creation timestamp (host milliseconds)
    pub create_time: u64,
}

impl PropertyMap {
    /// Fresh property map for a new top-record descriptor.
    #[must_use]
    pub fn new_top(bin_name: &str, create_time: u64) -> Self {
        Self {
            item_count: 0,
            subrec_count: 0,
            version: LDT_VERSION,
            bin_name: bin_name.into(),
            rec_type: RecordRole::Top,
            esr_digest: None,
            parent_digest: None,
            self_digest: None,
            create_time,
        }
    }

    /// Fresh property map for a child record.
    ///
    /// Sub-records are written with a zeroed creation time; their lifetime
    /// is tied to the existence sub-record, not to a clock.
    #[must_use]
    pub fn new_child(
        role: RecordRole,
        bin_name: &str,
        parent: Digest,
        own: Digest,
        esr: Digest,
    ) -> Self {
        Self {
            item_count: 0,
            subrec_count: 0,
            version: LDT_VERSION,
            bin_name: bin_name.into(),
            rec_type: role,
            esr_digest: Some(esr),
            parent_digest: Some(parent),
            self_digest: Some(own),
            create_time: 0,
        }
    }

    /// Encodes into the persisted letter-keyed map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();

        map.insert(PM_MAGIC.into(), Value::Integer(MAGIC));
        map.insert(PM_LDT_TYPE.into(), Value::String(LDT_TYPE.into()));
        map.insert(PM_ITEM_COUNT.into(), count(self.item_count));
        map.insert(PM_SUBREC_COUNT.into(), count(self.subrec_count));
        map.insert(PM_VERSION.into(), count(u64::from(self.version)));
        map.insert(PM_BIN_NAME.into(), Value::String(self.bin_name.clone()));
        map.insert(
            PM_REC_TYPE.into(),
            count(u64::from(u8::from(self.rec_type))),
        );
        map.insert(PM_CREATE_TIME.into(), count(self.create_time));

        if let Some(digest) = self.esr_digest {
            map.insert(PM_ESR_DIGEST.into(), Value::String(digest.to_string()));
        }
        if let Some(digest) = self.parent_digest {
            map.insert(PM_PARENT_DIGEST.into(), Value::String(digest.to_string()));
        }
        if let Some(digest) = self.self_digest {
            map.insert(PM_SELF_DIGEST.into(), Value::String(digest.to_string()));
        }

        Value::Map(map)
    }

    /// Decodes a persisted property map, verifying the integrity sentinel
    /// and the LDT type discriminator.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        let map = value
            .as_map()
            .ok_or(crate::Error::BinDamaged("property map is not a map"))?;

        if map.get(PM_MAGIC).and_then(Value::as_integer) != Some(MAGIC) {
            return Err(crate::Error::BinDamaged("magic sentinel mismatch"));
        }

        if get_str(map, PM_LDT_TYPE) != Some(LDT_TYPE) {
            return Err(crate::Error::BinDamaged("not an LSET bin"));
        }

        let version = get_count(map, PM_VERSION)
            .and_then(|x| u16::try_from(x).ok())
            .ok_or(crate::Error::BinDamaged("bad version field"))?;

        let rec_type = get_count(map, PM_REC_TYPE)
            .and_then(|x| u8::try_from(x).ok())
            .and_then(|x| RecordRole::try_from(x).ok())
            .ok_or(crate::Error::BinDamaged("bad record role"))?;

        Ok(Self {
            item_count: get_count(map, PM_ITEM_COUNT)
                .ok_or(crate::Error::BinDamaged("bad item count"))?,
            subrec_count: get_count(map, PM_SUBREC_COUNT)
                .ok_or(crate::Error::BinDamaged("bad sub-record count"))?,
            version,
            bin_name: get_str(map, PM_BIN_NAME)
                .ok_or(crate::Error::BinDamaged("missing bin name"))?
                .into(),
            rec_type,
            esr_digest: parse_digest(map, PM_ESR_DIGEST)?,
            parent_digest: parse_digest(map, PM_PARENT_DIGEST)?,
            self_digest: parse_digest(map, PM_SELF_DIGEST)?,
            create_time: get_count(map, PM_CREATE_TIME)
                .ok_or(crate::Error::BinDamaged("bad create time"))?,
        })
    }
}

fn parse_digest(
    map: &BTreeMap<String, Value>,
    letter: &str,
) -> crate::Result<Option<Digest>> {
    get_str(map, letter).map(str::parse::<Digest>).transpose()
}
