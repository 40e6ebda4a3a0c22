// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Single-letter field keys for persisted maps.
//!
//! Records are size-sensitive, so every map the engine stores uses
//! one-letter keys. This table is the wire format; renaming a letter is a
//! breaking change to every record written so far.

// Property map (shared by top records and sub-records)
pub const PM_ITEM_COUNT: &str = "C";
pub const PM_SUBREC_COUNT: &str = "S";
pub const PM_VERSION: &str = "V";
pub const PM_LDT_TYPE: &str = "T";
pub const PM_MAGIC: &str = "Z";
pub const PM_BIN_NAME: &str = "B";
pub const PM_REC_TYPE: &str = "R";
pub const PM_ESR_DIGEST: &str = "E";
pub const PM_PARENT_DIGEST: &str = "P";
pub const PM_SELF_DIGEST: &str = "D";
pub const PM_CREATE_TIME: &str = "G";

// Set map
pub const SM_STORE_TYPE: &str = "t";
pub const SM_STORE_STATE: &str = "s";
pub const SM_STORE_MODE: &str = "m";
pub const SM_KEY_TYPE: &str = "k";
pub const SM_MODULO: &str = "o";
pub const SM_THRESHOLD: &str = "h";
pub const SM_HASH_CELL_MAX_LIST: &str = "x";
pub const SM_COMPACT_LIST: &str = "c";
pub const SM_HASH_DIRECTORY: &str = "d";
pub const SM_USER_MODULE: &str = "u";
pub const SM_KEY_FUNCTION: &str = "f";
pub const SM_TRANSFORM: &str = "w";
pub const SM_UNTRANSFORM: &str = "r";
pub const SM_TOTAL_COUNT: &str = "n";
pub const SM_STORE_LIMIT: &str = "l";
pub const SM_LDR_ENTRY_COUNT_MAX: &str = "e";
pub const SM_LDR_BYTE_ENTRY_SIZE: &str = "b";
pub const SM_LDR_BYTE_COUNT_MAX: &str = "y";
pub const SM_BINARY_STORE_SIZE: &str = "z";

// Cell anchor
pub const CELL_STATE: &str = "S";
pub const CELL_LIST: &str = "L";
pub const CELL_DIGEST: &str = "D";
pub const CELL_TREE: &str = "T";
pub const CELL_COUNT: &str = "C";

// Record-wide LDT control bin
pub const CTRL_LDT_COUNT: &str = "C";
pub const CTRL_VINFO: &str = "V";
pub const CTRL_MAGIC: &str = "Z";
pub const CTRL_SELF_DIGEST: &str = "D";
