// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! An image held in memory and persisted as a JSON snapshot.
//!
//! ```json
//! {
//!   "classes": {
//!     "Account": {
//!       "superclass": "Object",
//!       "package": "Banking",
//!       "instance_methods": {
//!         "balance": { "source": "balance\n    ^balance", "category": "accessing" }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ImageSession, MethodRef, OccurrenceKind, SessionError, Side, TestRunReport};
use crate::send_detection::detect_sends;
use crate::source_analysis::{ClassifiedSource, MethodHeader, split_header};

/// One stored method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub source: String,
    pub category: String,
}

/// One stored class with both method dictionaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassEntry {
    pub superclass: Option<EcoString>,
    pub package: EcoString,
    pub definition: String,
    /// Compiling into or deleting from a read-only class fails.
    pub read_only: bool,
    pub instance_methods: BTreeMap<EcoString, MethodEntry>,
    pub class_methods: BTreeMap<EcoString, MethodEntry>,
}

impl ClassEntry {
    fn methods(&self, side: Side) -> &BTreeMap<EcoString, MethodEntry> {
        match side {
            Side::Instance => &self.instance_methods,
            Side::Class => &self.class_methods,
        }
    }

    fn methods_mut(&mut self, side: Side) -> &mut BTreeMap<EcoString, MethodEntry> {
        match side {
            Side::Instance => &mut self.instance_methods,
            Side::Class => &mut self.class_methods,
        }
    }
}

/// In-memory [`ImageSession`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryImage {
    #[serde(default)]
    classes: BTreeMap<EcoString, ClassEntry>,
}

impl MemoryImage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the image as a pretty-printed snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Adds (or replaces) an empty class.
    pub fn define_class(&mut self, name: &str, superclass: Option<&str>, package: &str) -> &mut ClassEntry {
        let entry = self.classes.entry(name.into()).or_default();
        entry.superclass = superclass.map(EcoString::from);
        entry.package = package.into();
        entry
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    fn class_entry(&self, name: &str) -> Result<&ClassEntry, SessionError> {
        self.classes
            .get(name)
            .ok_or_else(|| SessionError::ClassNotFound(name.into()))
    }

    fn method_entry(&self, method: &MethodRef) -> Result<&MethodEntry, SessionError> {
        self.class_entry(&method.class_name)?
            .methods(method.side)
            .get(&method.selector)
            .ok_or_else(|| SessionError::MethodNotFound(method.clone()))
    }

    fn writable_class(&mut self, name: &str) -> Result<&mut ClassEntry, SessionError> {
        let entry = self
            .classes
            .get_mut(name)
            .ok_or_else(|| SessionError::ClassNotFound(name.into()))?;
        if entry.read_only {
            return Err(SessionError::Operation(format!("class `{name}` is read-only")));
        }
        Ok(entry)
    }

    fn all_methods(&self) -> impl Iterator<Item = (MethodRef, &MethodEntry)> {
        self.classes.iter().flat_map(|(class_name, entry)| {
            [Side::Instance, Side::Class].into_iter().flat_map(move |side| {
                entry
                    .methods(side)
                    .iter()
                    .map(move |(selector, method)| (MethodRef::new(class_name.clone(), side, selector.clone()), method))
            })
        })
    }
}

impl ImageSession for MemoryImage {
    fn get_method_source(&self, method: &MethodRef) -> Result<String, SessionError> {
        Ok(self.method_entry(method)?.source.clone())
    }

    fn get_method_category(&self, method: &MethodRef) -> Result<String, SessionError> {
        Ok(self.method_entry(method)?.category.clone())
    }

    fn list_methods(&self, class_name: &str, side: Side) -> Result<Vec<EcoString>, SessionError> {
        Ok(self.class_entry(class_name)?.methods(side).keys().cloned().collect())
    }

    fn list_method_categories(&self, class_name: &str, side: Side) -> Result<Vec<String>, SessionError> {
        let categories: BTreeSet<_> = self
            .class_entry(class_name)?
            .methods(side)
            .values()
            .map(|method| method.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    fn list_classes(&self, package: Option<&str>) -> Result<Vec<EcoString>, SessionError> {
        Ok(self
            .classes
            .iter()
            .filter(|(_, entry)| package.is_none_or(|package| entry.package == package))
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn list_packages(&self) -> Result<Vec<EcoString>, SessionError> {
        let packages: BTreeSet<_> = self
            .classes
            .values()
            .map(|entry| entry.package.clone())
            .filter(|package| !package.is_empty())
            .collect();
        Ok(packages.into_iter().collect())
    }

    fn compile_method(
        &mut self,
        class_name: &str,
        side: Side,
        source: &str,
        category: &str,
    ) -> Result<MethodRef, SessionError> {
        let (header_line, _) = split_header(source);
        let header = MethodHeader::parse(header_line).ok_or_else(|| SessionError::CompileFailed {
            class_name: class_name.into(),
            reason: format!("cannot read a selector from `{header_line}`"),
        })?;
        let entry = self.writable_class(class_name)?;
        entry.methods_mut(side).insert(
            header.selector.clone(),
            MethodEntry {
                source: source.to_string(),
                category: category.to_string(),
            },
        );
        let method = MethodRef::new(class_name, side, header.selector);
        debug!(%method, "Compiled method");
        Ok(method)
    }

    fn delete_method(&mut self, method: &MethodRef) -> Result<(), SessionError> {
        let entry = self.writable_class(&method.class_name)?;
        if entry.methods_mut(method.side).remove(&method.selector).is_none() {
            return Err(SessionError::MethodNotFound(method.clone()));
        }
        debug!(%method, "Deleted method");
        Ok(())
    }

    fn selector_occurrences(&self, selector: &str, kind: OccurrenceKind) -> Result<Vec<MethodRef>, SessionError> {
        let found = self
            .all_methods()
            .filter(|(method, entry)| match kind {
                OccurrenceKind::Implementors => method.selector == selector,
                OccurrenceKind::Senders => detect_sends(&ClassifiedSource::new(&entry.source))
                    .iter()
                    .any(|send| send.selector == selector),
            })
            .map(|(method, _)| method)
            .collect();
        Ok(found)
    }

    fn class_inherits_from(&self, class_name: &str, ancestor: &str) -> Result<bool, SessionError> {
        let mut current = self.class_entry(class_name)?.superclass.clone();
        let mut hops = 0;
        while let Some(name) = current {
            if name == ancestor {
                return Ok(true);
            }
            hops += 1;
            if hops > self.classes.len() {
                return Err(SessionError::Operation(format!(
                    "superclass chain of `{class_name}` is cyclic"
                )));
            }
            current = self.classes.get(&name).and_then(|entry| entry.superclass.clone());
        }
        Ok(false)
    }

    fn get_class_definition(&self, class_name: &str) -> Result<String, SessionError> {
        let entry = self.class_entry(class_name)?;
        if !entry.definition.is_empty() {
            return Ok(entry.definition.clone());
        }
        let superclass = entry.superclass.as_deref().unwrap_or("nil");
        Ok(format!(
            "{superclass} subclass: #{class_name}\n    instanceVariableNames: ''\n    category: '{}'",
            entry.package
        ))
    }

    fn run_code(&mut self, _source: &str) -> Result<String, SessionError> {
        Err(unsupported("code evaluation"))
    }

    fn run_test_method(&mut self, _class_name: &str, _selector: &str) -> Result<TestRunReport, SessionError> {
        Err(unsupported("running tests"))
    }

    fn run_tests_in_class_or_package(&mut self, _name: &str) -> Result<TestRunReport, SessionError> {
        Err(unsupported("running tests"))
    }
}

fn unsupported(what: &str) -> SessionError {
    SessionError::Operation(format!("{what} needs a live image; a snapshot cannot execute code"))
}
