// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{descriptor::set_map::SetMap, value::Value};

/// A registered value-to-value user function.
///
/// Used for key extraction, transform and untransform slots.
pub type MapFn = fn(&Value) -> crate::Result<Value>;

/// A registered predicate over a set member, with caller-supplied arguments.
pub type FilterFn = fn(&Value, &[Value]) -> crate::Result<bool>;

/// A user module, resolved by name through a [`ModuleRegistry`].
///
/// Modules can override create-time settings and carry the functions that
/// settings refer to by name.
pub trait UserModule {
    /// Applies the module's settings overrides to a freshly created set.
    fn adjust_settings(&self, settings: &mut SetMap) {
        let _ = settings;
    }

    /// Resolves a value function by name.
    fn function(&self, name: &str) -> Option<MapFn> {
        let _ = name;
        None
    }

    /// Resolves a filter by name.
    fn filter(&self, name: &str) -> Option<FilterFn> {
        let _ = name;
        None
    }
}

/// The host's user-defined function registry.
///
/// The engine never owns function code; settings store *names*, and every
/// call resolves those names freshly through this trait.
pub trait ModuleRegistry {
    /// Resolves a module by name.
    fn module(&self, name: &str) -> Option<&dyn UserModule>;

    /// Resolves a bare function name registered outside any module.
    fn function(&self, name: &str) -> Option<MapFn> {
        let _ = name;
        None
    }

    /// Resolves a bare filter name registered outside any module.
    fn filter(&self, name: &str) -> Option<FilterFn> {
        let _ = name;
        None
    }
}

/// A per-call filter reference: function name plus its arguments.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// Name of the filter function.
    pub name: String,

    /// Arguments forwarded to every filter invocation.
    pub args: Vec<Value>,
}

impl Filter {
    /// Creates a filter reference.
    pub fn new<N: Into<String>>(name: N, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Per-call resolved function slots.
///
/// Built once at the top of every public API call from the names stored in
/// the descriptor plus the caller's filter, then passed explicitly through
/// the search/insert/scan/remove paths. No state survives between calls.
pub(crate) struct FunctionContext {
    pub key_fn: Option<MapFn>,
    pub transform: Option<MapFn>,
    pub untransform: Option<MapFn>,
    pub filter: Option<FilterFn>,
    pub filter_args: Vec<Value>,
}

impl FunctionContext {
    /// Resolves all function slots for one call.
    pub fn build(
        registry: Option<&dyn ModuleRegistry>,
        settings: &SetMap,
        filter: Option<&Filter>,
    ) -> crate::Result<Self> {
        let module = settings.user_module.as_deref();

        let key_fn = settings
            .key_function
            .as_deref()
            .map(|name| resolve_map_fn(registry, module, name))
            .transpose()?;

        let transform = settings
            .transform
            .as_deref()
            .map(|name| resolve_map_fn(registry, module, name))
            .transpose()?;

        let untransform = settings
            .untransform
            .as_deref()
            .map(|name| resolve_map_fn(registry, module, name))
            .transpose()?;

        let (filter, filter_args) = match filter {
            Some(spec) => (
                Some(resolve_filter(registry, module, &spec.name)?),
                spec.args.clone(),
            ),
            None => (None, Vec::new()),
        };

        Ok(Self {
            key_fn,
            transform,
            untransform,
            filter,
            filter_args,
        })
    }

    /// Applies the write-side transform, if registered.
    pub fn conceal(&self, value: &Value) -> crate::Result<Value> {
        match self.transform {
            Some(f) => f(value),
            None => Ok(value.clone()),
        }
    }

    /// Applies the read-side untransform, if registered.
    pub fn reveal(&self, stored: &Value) -> crate::Result<Value> {
        match self.untransform {
            Some(f) => f(stored),
            None => Ok(stored.clone()),
        }
    }

    /// Runs the caller's filter over a revealed member.
    pub fn accepts(&self, value: &Value) -> crate::Result<bool> {
        match self.filter {
            Some(f) => f(value, &self.filter_args),
            None => Ok(true),
        }
    }
}

fn resolve_module<'a>(
    registry: Option<&'a dyn ModuleRegistry>,
    module: &str,
) -> crate::Result<&'a dyn UserModule> {
    registry
        .and_then(|r| r.module(module))
        .ok_or_else(|| crate::Error::UserModuleNotFound(module.into()))
}

fn resolve_map_fn(
    registry: Option<&dyn ModuleRegistry>,
    module: Option<&str>,
    name: &str,
) -> crate::Result<MapFn> {
    if let Some(module) = module {
        if let Some(f) = resolve_module(registry, module)?.function(name) {
            return Ok(f);
        }
    }

    registry
        .and_then(|r| r.function(name))
        .ok_or_else(|| crate::Error::UserModuleBad(name.into()))
}

fn resolve_filter(
    registry: Option<&dyn ModuleRegistry>,
    module: Option<&str>,
    name: &str,
) -> crate::Result<FilterFn> {
    if let Some(module) = module {
        if let Some(f) = resolve_module(registry, module)?.filter(name) {
            return Ok(f);
        }
    }

    registry
        .and_then(|r| r.filter(name))
        .ok_or_else(|| crate::Error::UserModuleBad(name.into()))
}
