// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Create-time configuration.
//!
//! `create` accepts an optional spec value. A string names a user module,
//! whose `adjust_settings` hook overrides defaults and may register
//! function names. A map may carry a `Package` entry (a name into the
//! packaged-settings table below) plus individual option overrides; unknown
//! entries are ignored so callers can share one spec across LDT kinds.

use crate::{
    descriptor::set_map::{KeyType, SetMap, StoreMode, StoreType},
    functions::ModuleRegistry,
    value::Value,
};

/// Applies a create-time spec to a fresh set map, then sanity-checks the
/// result.
pub(crate) fn apply(
    map: &mut SetMap,
    spec: Option<&Value>,
    registry: Option<&dyn ModuleRegistry>,
) -> crate::Result<()> {
    match spec {
        None => {}

        Some(Value::String(module)) => {
            map.user_module = Some(module.clone());

            registry
                .and_then(|r| r.module(module))
                .ok_or_else(|| crate::Error::UserModuleNotFound(module.clone()))?
                .adjust_settings(map);
        }

        Some(Value::Map(entries)) => {
            if let Some(package) = entries.get("Package") {
                let name = package
                    .as_str()
                    .ok_or_else(|| {
                        crate::Error::InputParam("package name must be a string".into())
                    })?;

                packaged(name).ok_or_else(|| {
                    crate::Error::InputParam(format!("unknown settings package {name:?}"))
                })?(map);
            }

            for (option, value) in entries {
                apply_option(map, option, value)?;
            }
        }

        Some(other) => {
            return Err(crate::Error::InputParam(format!(
                "settings spec must be a module name or a map, got {}",
                other.kind(),
            )));
        }
    }

    check(map)
}

/// The packaged-settings table: named presets over the set map.
fn packaged(name: &str) -> Option<fn(&mut SetMap)> {
    match name {
        "StandardList" => Some(|_| {}),

        "TestModeNumber" => Some(|map| {
            map.modulo = 13;
            map.threshold = 4;
            map.key_type = Some(KeyType::Atomic);
        }),

        "TestModeList" => Some(|map| {
            map.modulo = 13;
            map.threshold = 4;
        }),

        "TestModeObject" => Some(|map| {
            map.modulo = 13;
            map.threshold = 4;
            map.key_type = Some(KeyType::Complex);
        }),

        "ListMediumObject" => Some(|map| {
            map.threshold = 10;
            map.ldr_entry_count_max = 100;
        }),

        _ => None,
    }
}

fn apply_option(map: &mut SetMap, option: &str, value: &Value) -> crate::Result<()> {
    match option {
        "Modulo" => {
            map.modulo = value
                .as_integer()
                .and_then(|x| u32::try_from(x).ok())
                .filter(|x| *x > 0)
                .ok_or_else(|| bad_option(option, value))?;
        }

        "Threshold" => {
            map.threshold = value
                .as_integer()
                .and_then(|x| u64::try_from(x).ok())
                .filter(|x| *x > 0)
                .ok_or_else(|| bad_option(option, value))?;
        }

        "HashCellMaxList" => {
            map.hash_cell_max_list = value
                .as_integer()
                .and_then(|x| usize::try_from(x).ok())
                .filter(|x| *x > 0)
                .ok_or_else(|| bad_option(option, value))?;
        }

        "SetTypeStore" => {
            map.store_type = match value.as_str() {
                Some("ST_RECORD") => StoreType::Record,
                Some("ST_SUBRECORD") => StoreType::SubRecord,
                _ => return Err(bad_option(option, value)),
            };
        }

        "KeyType" => {
            map.key_type = match value.as_str() {
                Some("KT_ATOMIC") => Some(KeyType::Atomic),
                Some("KT_COMPLEX") => Some(KeyType::Complex),
                _ => return Err(bad_option(option, value)),
            };
        }

        "StoreLimit" => {
            map.store_limit = value
                .as_integer()
                .and_then(|x| u64::try_from(x).ok())
                .ok_or_else(|| bad_option(option, value))?;
        }

        "UserModule" => {
            map.user_module = Some(named(option, value)?);
        }

        "KeyFunction" => {
            map.key_function = Some(named(option, value)?);
        }

        "Transform" => {
            map.transform = Some(named(option, value)?);
        }

        "UnTransform" => {
            map.untransform = Some(named(option, value)?);
        }

        // Unknown entries (including "Package", handled above) are ignored.
        _ => {}
    }

    Ok(())
}

fn named(option: &str, value: &Value) -> crate::Result<String> {
    value
        .as_str()
        .map(Into::into)
        .ok_or_else(|| bad_option(option, value))
}

fn bad_option(option: &str, value: &Value) -> crate::Error {
    crate::Error::InputParam(format!("bad value for option {option}: {value}"))
}

fn check(map: &SetMap) -> crate::Result<()> {
    if map.store_mode == StoreMode::Binary {
        return Err(crate::Error::InputParam(
            "binary store mode is not implemented".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::set_map::StoreState;
    use std::collections::BTreeMap;
    use test_log::test;

    #[test]
    fn defaults_pass() -> crate::Result<()> {
        let mut map = SetMap::default();
        apply(&mut map, None, None)?;

        assert_eq!(StoreState::Compact, map.store_state);
        assert_eq!(128, map.modulo);
        Ok(())
    }

    #[test]
    fn options_override_defaults() -> crate::Result<()> {
        let mut spec = BTreeMap::new();
        spec.insert("Modulo".into(), Value::from(7));
        spec.insert("Threshold".into(), Value::from(3));
        spec.insert("SetTypeStore".into(), Value::from("ST_RECORD"));
        spec.insert("SomethingElse".into(), Value::from("ignored"));

        let mut map = SetMap::default();
        apply(&mut map, Some(&Value::Map(spec)), None)?;

        assert_eq!(7, map.modulo);
        assert_eq!(3, map.threshold);
        assert_eq!(StoreType::Record, map.store_type);
        Ok(())
    }

    #[test]
    fn package_applies_presets() -> crate::Result<()> {
        let mut spec = BTreeMap::new();
        spec.insert("Package".into(), Value::from("TestModeObject"));

        let mut map = SetMap::default();
        apply(&mut map, Some(&Value::Map(spec)), None)?;

        assert_eq!(13, map.modulo);
        assert_eq!(4, map.threshold);
        assert_eq!(Some(KeyType::Complex), map.key_type);
        Ok(())
    }

    #[test]
    fn unknown_package_is_refused() {
        let mut spec = BTreeMap::new();
        spec.insert("Package".into(), Value::from("NoSuchPackage"));

        let mut map = SetMap::default();

        assert!(matches!(
            apply(&mut map, Some(&Value::Map(spec)), None),
            Err(crate::Error::InputParam(_)),
        ));
    }

    #[test]
    fn bad_option_value_is_refused() {
        let mut spec = BTreeMap::new();
        spec.insert("Modulo".into(), Value::from("many"));

        let mut map = SetMap::default();

        assert!(matches!(
            apply(&mut map, Some(&Value::Map(spec)), None),
            Err(crate::Error::InputParam(_)),
        ));
    }

    #[test]
    fn missing_module_is_refused() {
        let mut map = SetMap::default();

        assert!(matches!(
            apply(&mut map, Some(&Value::from("nope")), None),
            Err(crate::Error::UserModuleNotFound(_)),
        ));
    }
}
