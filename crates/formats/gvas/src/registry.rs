//! Struct registry: which struct types bypass property-list encoding.
//!
//! A struct named in a tag is either serialized generically as a nested
//! property list, or has a fixed binary layout that needs a native
//! serializer. The wire format does not say which, so native layouts are
//! registered up front by type name. Aliases map wrapper types onto an
//! existing entry and, through `<field>:<role>` keys, give a type to the
//! struct elements of specific map and set properties.
//!
//! The registry is built once, before any decode or encode, and is
//! read-only afterwards.

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::cursor::Archive;
use crate::error::{Error, Result};
use crate::natives;
use crate::value::Value;

/// An [`Archive`] that can also recurse into tagged property lists.
///
/// Implemented by the decoder and the encoder, so a native serializer is
/// written once and runs in both directions.
pub trait PropertyArchive: Archive {
    fn registry(&self) -> &Registry;

    /// Tagged property list, terminated by "None". A top-level list
    /// (`trailer`) is followed by four extra bytes.
    fn property_list(&mut self, slot: &mut Value, trailer: bool) -> Result<()>;
}

/// Native serializer for a fixed-layout struct.
pub type NativeFn = fn(&mut dyn PropertyArchive, &mut Value) -> Result<()>;

#[derive(Clone, Copy)]
enum Entry {
    Native(NativeFn),
    Alias(&'static str),
}

static GLOBAL: OnceCell<Registry> = OnceCell::new();

#[derive(Default, Clone)]
pub struct Registry {
    entries: HashMap<String, Entry>,
    /// Top-level structures, selectable by name.
    entry_points: HashMap<String, NativeFn>,
}

impl Registry {
    /// An empty registry. Every struct decodes as a property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the engine's built-in native structs.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        natives::register_core(&mut registry);
        registry
    }

    /// Declare that `name` has a native layout serialized by `f`.
    pub fn register_native(&mut self, name: impl Into<String>, f: NativeFn) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(Error::Registry(format!("{name} is already registered")));
        }
        self.entries.insert(name, Entry::Native(f));
        Ok(())
    }

    /// Make `from` resolve to the native entry `to`.
    ///
    /// Resolution is single-hop, so `to` must be a native entry rather than
    /// another alias.
    pub fn register_alias(&mut self, from: impl Into<String>, to: &'static str) -> Result<()> {
        let from = from.into();
        match self.entries.get(to) {
            Some(Entry::Native(_)) => {}
            Some(Entry::Alias(_)) => {
                return Err(Error::Registry(format!(
                    "{from} -> {to}: {to} is itself an alias"
                )))
            }
            None => {
                return Err(Error::Registry(format!(
                    "{from} -> {to}: {to} is not registered"
                )))
            }
        }
        if self.entries.contains_key(&from) {
            return Err(Error::Registry(format!("{from} is already registered")));
        }
        self.entries.insert(from, Entry::Alias(to));
        Ok(())
    }

    /// Core registration, where names are known not to collide.
    pub(crate) fn insert_native(&mut self, name: &str, f: NativeFn) {
        self.entries.insert(name.to_string(), Entry::Native(f));
    }

    pub(crate) fn insert_alias(&mut self, from: &str, to: &'static str) {
        self.entries.insert(from.to_string(), Entry::Alias(to));
    }

    /// Native serializer for `name`, following at most one alias.
    pub fn resolve(&self, name: &str) -> Option<NativeFn> {
        match self.entries.get(name)? {
            Entry::Native(f) => Some(*f),
            Entry::Alias(to) => match self.entries.get(*to)? {
                Entry::Native(f) => Some(*f),
                Entry::Alias(_) => None,
            },
        }
    }

    /// Register a named top-level structure.
    pub fn register_entry_point(&mut self, name: impl Into<String>, f: NativeFn) -> Result<()> {
        let name = name.into();
        if self.entry_points.contains_key(&name) {
            return Err(Error::Registry(format!("entry point {name} is already registered")));
        }
        self.entry_points.insert(name, f);
        Ok(())
    }

    pub fn entry_point(&self, name: &str) -> Option<NativeFn> {
        self.entry_points.get(name).copied()
    }

    /// Registered entry point names, sorted.
    pub fn entry_point_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entry_points.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make this the process-wide registry. Fails if one is already in use.
    pub fn install(self) -> Result<&'static Registry> {
        GLOBAL
            .set(self)
            .map_err(|_| Error::Registry("a global registry is already installed".into()))?;
        GLOBAL
            .get()
            .ok_or_else(|| Error::Registry("global registry vanished after install".into()))
    }

    /// The process-wide registry, defaulting to [`Registry::with_core`].
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::with_core)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Registry")
            .field("entries", &names)
            .field("entry_points", &self.entry_point_names())
            .finish()
    }
}
