/*
 * section.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tree nodes of a document.
//!
//! A [`Section`] stores only its local key. The full key path is computed by
//! walking the weak `parent` links, so reparenting a subtree never leaves a
//! stale path behind. Parents own their children; children only point back
//! weakly.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::value::Value;

/// Shared handle to a section.
///
/// Handles stay valid across `load()` calls: a reload refreshes the data
/// behind a handle instead of replacing it.
pub type SectionRef = Rc<RefCell<Section>>;

/// One keyed entry of a document.
#[derive(Debug)]
pub struct Section {
    key: String,

    /// One entry means a scalar, several mean a list.
    pub values: Vec<Value>,
    pub default_values: Vec<Value>,

    /// Comment lines written above the key.
    pub top_comments: Vec<String>,

    /// Written instead of `top_comments` when those are empty and the
    /// corresponding toggle is set.
    pub default_comments: Vec<String>,

    /// Empty lines reproduced above this section.
    pub blank_lines_before: u32,

    return_default_when_null: bool,
    parent: Weak<RefCell<Section>>,
    children: Vec<SectionRef>,
}

impl Section {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: Vec::new(),
            default_values: Vec::new(),
            top_comments: Vec::new(),
            default_comments: Vec::new(),
            blank_lines_before: 0,
            return_default_when_null: true,
            parent: Weak::new(),
            children: Vec::new(),
        }
    }

    pub fn new_ref(key: impl Into<String>) -> SectionRef {
        Rc::new(RefCell::new(Self::new(key)))
    }

    /// The last component of the key path.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<SectionRef> {
        self.parent.upgrade()
    }

    pub fn children(&self) -> &[SectionRef] {
        &self.children
    }

    pub fn child(&self, key: &str) -> Option<SectionRef> {
        self.children
            .iter()
            .find(|child| child.borrow().key == key)
            .cloned()
    }

    /// Full key path from the document root down to this section.
    pub fn path(&self) -> Vec<String> {
        let mut keys = vec![self.key.clone()];
        let mut current = self.parent.upgrade();
        while let Some(section) = current {
            let next = {
                let section = section.borrow();
                keys.push(section.key.clone());
                section.parent.upgrade()
            };
            current = next;
        }
        keys.reverse();
        keys
    }

    /// Number of ancestors; a root section has depth 0.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.upgrade();
        while let Some(section) = current {
            depth += 1;
            current = section.borrow().parent.upgrade();
        }
        depth
    }

    pub fn path_eq<K: AsRef<str>>(&self, keys: &[K]) -> bool {
        let path = self.path();
        path.len() == keys.len() && path.iter().zip(keys).all(|(a, b)| a == b.as_ref())
    }

    pub fn return_default_when_null(&self) -> bool {
        self.return_default_when_null
    }

    pub fn set_return_default_when_null(&mut self, enabled: bool) {
        self.return_default_when_null = enabled;
    }

    /// The first value, see [`Section::value_at`].
    pub fn value(&self) -> Value {
        self.value_at(0)
    }

    /// The value at `index`.
    ///
    /// When the value is missing or null and default fallback is enabled,
    /// returns the default value at the same index, or an empty value if
    /// there is none.
    pub fn value_at(&self, index: usize) -> Value {
        match self.values.get(index) {
            Some(value) if value.text.is_some() => value.clone(),
            _ if self.return_default_when_null => self
                .default_values
                .get(index)
                .cloned()
                .unwrap_or_default(),
            other => other.cloned().unwrap_or_default(),
        }
    }

    /// Every value with default fallback applied position by position.
    pub fn resolved_values(&self) -> Vec<Value> {
        let len = if self.return_default_when_null {
            self.values.len().max(self.default_values.len())
        } else {
            self.values.len()
        };
        (0..len).map(|index| self.value_at(index)).collect()
    }

    /// True when at least one value carries text.
    pub fn has_values(&self) -> bool {
        self.values.iter().any(|value| value.text.is_some())
    }

    pub fn set_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values = vec![value.into()];
        self
    }

    pub fn set_values<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    pub fn set_default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default_values = vec![value.into()];
        self
    }

    pub fn set_default_values<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.default_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_comments<I, S>(&mut self, comments: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.top_comments = comments.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.top_comments.push(comment.into());
        self
    }

    pub fn set_default_comments<I, S>(&mut self, comments: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_comments = comments.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn set_parent(&mut self, parent: Weak<RefCell<Section>>) {
        self.parent = parent;
    }

    pub(crate) fn set_children(&mut self, children: Vec<SectionRef>) {
        self.children = children;
    }

    pub(crate) fn parent_weak(&self) -> Weak<RefCell<Section>> {
        self.parent.clone()
    }
}

/// Make `child` a child of `parent`, detaching it from any previous parent.
pub fn link_child(parent: &SectionRef, child: &SectionRef) {
    detach(child);
    child.borrow_mut().parent = Rc::downgrade(parent);
    parent.borrow_mut().children.push(Rc::clone(child));
}

/// Remove `section` from its parent's children.
pub fn detach(section: &SectionRef) {
    let parent = section.borrow().parent.upgrade();
    if let Some(parent) = parent {
        parent
            .borrow_mut()
            .children
            .retain(|child| !Rc::ptr_eq(child, section));
    }
    section.borrow_mut().parent = Weak::new();
}

/// Dotted rendering of a key path, for messages.
pub fn format_path<K: AsRef<str>>(keys: &[K]) -> String {
    keys.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_follows_parent_chain() {
        let root = Section::new_ref("server");
        let child = Section::new_ref("http");
        let leaf = Section::new_ref("port");
        link_child(&root, &child);
        link_child(&child, &leaf);

        assert_eq!(leaf.borrow().path(), vec!["server", "http", "port"]);
        assert_eq!(leaf.borrow().depth(), 2);
        assert!(leaf.borrow().path_eq(&["server", "http", "port"]));
        assert!(root.borrow().child("http").is_some());
    }

    #[test]
    fn test_relinking_moves_the_subtree() {
        let a = Section::new_ref("a");
        let b = Section::new_ref("b");
        let c = Section::new_ref("c");
        link_child(&a, &c);
        link_child(&b, &c);

        assert!(a.borrow().children().is_empty());
        assert_eq!(c.borrow().path(), vec!["b", "c"]);
    }

    #[test]
    fn test_parent_does_not_outlive_its_owners() {
        let child = Section::new_ref("child");
        {
            let parent = Section::new_ref("parent");
            link_child(&parent, &child);
            assert!(child.borrow().parent().is_some());
        }
        assert!(child.borrow().parent().is_none());
        assert_eq!(child.borrow().path(), vec!["child"]);
    }

    #[test]
    fn test_default_fallback() {
        let mut section = Section::new("k");
        section.values = vec![Value::null()];
        section.default_values = vec![Value::new("x")];

        assert_eq!(section.value_at(0).text(), Some("x"));

        section.set_return_default_when_null(false);
        assert_eq!(section.value_at(0).text(), None);
    }

    #[test]
    fn test_fallback_without_default_is_empty() {
        let section = Section::new("k");
        assert_eq!(section.value_at(3), Value::null());
    }

    #[test]
    fn test_resolved_values_mix_values_and_defaults() {
        let mut section = Section::new("k");
        section.set_values([Value::new("a"), Value::null()]);
        section.set_default_values(["x", "y", "z"]);

        let texts: Vec<_> = section
            .resolved_values()
            .into_iter()
            .map(|value| value.text)
            .collect();
        assert_eq!(
            texts,
            vec![Some("a".into()), Some("y".into()), Some("z".into())]
        );
    }

    #[test]
    fn test_format_path() {
        assert_eq!(format_path(&["a", "b"]), "a.b");
    }
}
