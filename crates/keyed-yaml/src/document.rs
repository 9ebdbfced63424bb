/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Load/save lifecycle and key-path access.
//!
//! A [`Document`] keeps two section lists:
//!
//! - the **edit** sections, which the application obtained through
//!   `get`/`put`/`add` and which persist across loads;
//! - the **loaded** sections, rebuilt from the source by every `load()`.
//!
//! Loading refreshes the edit sections in place, so handles stay valid.
//! Saving merges both lists with [`unify`] and writes the result.

use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::{LockRegistry, PathLock};
use crate::reader::{Reader, refresh_edits};
use crate::reconcile::unify;
use crate::section::{Section, SectionRef, detach, format_path, link_child};
use crate::source::{FileSource, MemorySource, Source};
use crate::writer::Writer;

/// A configuration document backed by a [`Source`].
#[derive(Debug)]
pub struct Document<S> {
    source: S,
    config: Config,
    edit_sections: Vec<SectionRef>,
    loaded_sections: Vec<SectionRef>,
    loaded: bool,
}

impl Document<FileSource> {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSource::new(path), Config::default())
    }

    /// Block until no other holder of `registry` uses this document's file.
    pub fn lock<'r>(&self, registry: &'r LockRegistry) -> PathLock<'r> {
        registry.lock(self.source.path())
    }
}

impl Document<MemorySource> {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(MemorySource::new(text), Config::default())
    }
}

impl<S: Source> Document<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self {
            source,
            config,
            edit_sections: Vec::new(),
            loaded_sections: Vec::new(),
            loaded: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the toggles; the default fallback setting is applied to every
    /// known section.
    pub fn set_config(&mut self, config: Config) {
        for section in self.edit_sections.iter().chain(&self.loaded_sections) {
            section
                .borrow_mut()
                .set_return_default_when_null(config.return_default_when_null);
        }
        self.config = config;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Whether `load()` has succeeded at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn edit_sections(&self) -> &[SectionRef] {
        &self.edit_sections
    }

    pub fn loaded_sections(&self) -> &[SectionRef] {
        &self.loaded_sections
    }

    /// Re-read the source.
    ///
    /// On failure the previous loaded sections and the edit sections are
    /// left untouched.
    pub fn load(&mut self) -> Result<()> {
        let text = self.source.read().map_err(Error::Read)?;
        let edits: Vec<(Vec<String>, SectionRef)> = self
            .edit_sections
            .iter()
            .map(|section| (section.borrow().path(), Rc::clone(section)))
            .collect();

        let fresh = Reader::new(&self.config).parse(&text)?;

        let orphans = refresh_edits(&edits, &fresh);
        // Keep the previous tree alive until the orphans are relinked.
        let previous = mem::replace(&mut self.loaded_sections, fresh);
        self.loaded = true;
        for orphan in orphans {
            let parent_keys: Vec<&str> = orphan.path[..orphan.path.len() - 1]
                .iter()
                .map(String::as_str)
                .collect();
            let parent = self.put(&parent_keys)?;
            link_child(&parent, &orphan.section);
            // Keep the orphan after its recreated ancestors.
            self.edit_sections
                .retain(|section| !Rc::ptr_eq(section, &orphan.section));
            self.edit_sections.push(orphan.section);
        }
        drop(previous);

        debug!(
            source = %self.source.describe(),
            loaded = self.loaded_sections.len(),
            edits = self.edit_sections.len(),
            "Loaded document"
        );
        Ok(())
    }

    /// Merge the edit sections into the loaded ones and write the result.
    pub fn save(&mut self) -> Result<()> {
        self.save_with(false)
    }

    /// Like [`Document::save`]; with `overwrite` the source is replaced by
    /// the edit sections alone, ignoring what was loaded.
    ///
    /// Loads first if the document was never loaded.
    pub fn save_with(&mut self, overwrite: bool) -> Result<()> {
        if !self.loaded {
            self.load()?;
        }

        let sections = if overwrite {
            self.edit_sections.clone()
        } else {
            unify(&self.edit_sections, &self.loaded_sections)
        };
        if sections.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let text = Writer::new(&self.config).write(&sections);
        self.source.write(&text).map_err(Error::Write)?;

        debug!(
            source = %self.source.describe(),
            sections = sections.len(),
            overwrite,
            "Saved document"
        );
        Ok(())
    }

    /// The text `save()` would write, without writing it.
    pub fn to_text(&self) -> String {
        let sections = unify(&self.edit_sections, &self.loaded_sections);
        Writer::new(&self.config).write(&sections)
    }

    pub fn contains(&self, keys: &[&str]) -> bool {
        find(&self.edit_sections, keys)
            .or_else(|| find(&self.loaded_sections, keys))
            .is_some()
    }

    /// Look up a section, edit sections first.
    ///
    /// A loaded section found here joins the edit sections.
    pub fn get(&mut self, keys: &[&str]) -> Option<SectionRef> {
        if let Some(section) = find(&self.edit_sections, keys) {
            return Some(section);
        }
        let section = find(&self.loaded_sections, keys)?;
        self.edit_sections.push(Rc::clone(&section));
        Some(section)
    }

    /// Get the section at `keys`, creating it and any missing ancestors.
    pub fn put(&mut self, keys: &[&str]) -> Result<SectionRef> {
        self.ensure_loaded()?;
        validate_keys(keys)?;
        match self.get(keys) {
            Some(section) => Ok(section),
            None => self.create(keys),
        }
    }

    /// Create a new section at `keys`, failing if the path exists.
    pub fn add(&mut self, keys: &[&str]) -> Result<SectionRef> {
        self.ensure_loaded()?;
        validate_keys(keys)?;
        if self.contains(keys) {
            return Err(Error::DuplicateKey {
                path: format_path(keys),
            });
        }
        self.create(keys)
    }

    /// Remove the section at `keys` and its descendants from the document.
    ///
    /// Returns the removed section, preferring the edit section.
    pub fn remove(&mut self, keys: &[&str]) -> Option<SectionRef> {
        let edit = find(&self.edit_sections, keys);
        let loaded = find(&self.loaded_sections, keys);

        let is_inside = |section: &SectionRef| {
            let path = section.borrow().path();
            path.len() >= keys.len() && path.iter().zip(keys).all(|(a, b)| a == b)
        };
        self.edit_sections.retain(|section| !is_inside(section));
        self.loaded_sections.retain(|section| !is_inside(section));
        for section in edit.iter().chain(&loaded) {
            detach(section);
        }

        edit.or(loaded)
    }

    /// Swap the edit section `old` for `new`, keeping its position.
    pub fn replace(&mut self, old: &SectionRef, new: SectionRef) -> bool {
        match self
            .edit_sections
            .iter()
            .position(|section| Rc::ptr_eq(section, old))
        {
            Some(index) => {
                self.edit_sections[index] = new;
                true
            }
            None => false,
        }
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(Error::NotLoaded)
        }
    }

    fn create(&mut self, keys: &[&str]) -> Result<SectionRef> {
        let (key, parent_keys) = keys
            .split_last()
            .ok_or_else(|| Error::illegal_key("empty key path"))?;

        let section = Section::new_ref(*key);
        section
            .borrow_mut()
            .set_return_default_when_null(self.config.return_default_when_null);
        if !parent_keys.is_empty() {
            let parent = self.put(parent_keys)?;
            link_child(&parent, &section);
        }
        self.edit_sections.push(Rc::clone(&section));
        Ok(section)
    }
}

fn find(sections: &[SectionRef], keys: &[&str]) -> Option<SectionRef> {
    sections
        .iter()
        .find(|section| section.borrow().path_eq(keys))
        .cloned()
}

/// Reject paths the writer could not reproduce.
fn validate_keys(keys: &[&str]) -> Result<()> {
    if keys.is_empty() {
        return Err(Error::illegal_key("empty key path"));
    }
    for key in keys {
        if key.is_empty() {
            return Err(Error::illegal_key(format!(
                "empty segment in {}",
                format_path(keys)
            )));
        }
        let unwritable = key.trim() != *key
            || key.contains('\n')
            || key.contains(": ")
            || key.ends_with(':')
            || key.contains(" #")
            || key.starts_with('#')
            || key.starts_with("- ")
            || *key == "-";
        if unwritable {
            return Err(Error::illegal_key(format!("unwritable segment {key:?}")));
        }
    }
    Ok(())
}
