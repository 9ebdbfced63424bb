/*
 * reconcile.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Merge of the edit sections with the loaded sections.
//!
//! The loaded sections are the backbone: they are emitted in file order,
//! with an edit section of the same key path standing in for its loaded
//! counterpart. Edit sections without a counterpart are new and are placed
//! afterwards:
//!
//! - a new root section is inserted at the very beginning;
//! - a deeper section goes right after the emitted section sharing the
//!   longest leading run of keys with it, the last such section on ties, so
//!   it lands at the end of its sibling group;
//! - when that match does not reach the parent level, filler sections are
//!   synthesized for the missing levels.
//!
//! `unify` only reads its inputs: fillers hang off the emitted sections
//! through their weak parent link alone.

use std::rc::Rc;

use tracing::debug;

use crate::section::{Section, SectionRef};

struct Placed {
    path: Vec<String>,
    section: SectionRef,
}

/// Merge `edit` into `loaded`, producing one ordered list ready for the writer.
pub fn unify(edit: &[SectionRef], loaded: &[SectionRef]) -> Vec<SectionRef> {
    if loaded.is_empty() {
        return edit.to_vec();
    }

    let mut remaining: Vec<Placed> = edit
        .iter()
        .map(|section| Placed {
            path: section.borrow().path(),
            section: Rc::clone(section),
        })
        .collect();

    let mut result: Vec<Placed> = Vec::with_capacity(loaded.len() + remaining.len());
    for section in loaded {
        let path = section.borrow().path();
        match remaining.iter().position(|placed| placed.path == path) {
            Some(index) => result.push(remaining.remove(index)),
            None => result.push(Placed {
                path,
                section: Rc::clone(section),
            }),
        }
    }

    debug!(
        loaded = loaded.len(),
        new = remaining.len(),
        "Unifying edit and loaded sections"
    );

    for placed in remaining {
        if placed.path.len() == 1 {
            result.insert(0, placed);
        } else {
            insert_nested(&mut result, placed);
        }
    }

    result.into_iter().map(|placed| placed.section).collect()
}

fn insert_nested(result: &mut Vec<Placed>, placed: Placed) {
    let parent_len = placed.path.len() - 1;
    let (mut at, matched) = match best_match(result, &placed.path) {
        Some((index, matched)) => (index + 1, matched.min(parent_len)),
        None => (0, 0),
    };

    // Fillers point up to the emitted ancestor but are not registered among
    // its children, so neither the loaded tree nor `placed` is modified.
    let mut parent = find_by_path(result, &placed.path[..matched]);
    for level in matched..parent_len {
        let filler = Section::new_ref(placed.path[level].as_str());
        if let Some(parent) = &parent {
            filler.borrow_mut().set_parent(Rc::downgrade(parent));
        }
        result.insert(
            at,
            Placed {
                path: placed.path[..=level].to_vec(),
                section: Rc::clone(&filler),
            },
        );
        at += 1;
        parent = Some(filler);
    }

    result.insert(at, placed);
}

/// Index of the emitted section sharing the longest leading run of keys
/// with `path` (the last one on ties), and the length of that run.
fn best_match(result: &[Placed], path: &[String]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (index, placed) in result.iter().enumerate() {
        let matched = placed
            .path
            .iter()
            .zip(path)
            .take_while(|(a, b)| a == b)
            .count();
        if matched > 0 && best.is_none_or(|(_, current)| matched >= current) {
            best = Some((index, matched));
        }
    }
    best
}

fn find_by_path(result: &[Placed], path: &[String]) -> Option<SectionRef> {
    if path.is_empty() {
        return None;
    }
    result
        .iter()
        .rev()
        .find(|placed| placed.path == path)
        .map(|placed| Rc::clone(&placed.section))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::reader::Reader;
    use crate::section::link_child;

    fn parse(text: &str) -> Vec<SectionRef> {
        Reader::new(&Config::default()).parse(text).unwrap()
    }

    fn paths(sections: &[SectionRef]) -> Vec<String> {
        sections
            .iter()
            .map(|section| section.borrow().path().join("."))
            .collect()
    }

    /// A detached section with the given path, kept alive by the returned chain.
    fn chain(keys: &[&str]) -> Vec<SectionRef> {
        let mut chain: Vec<SectionRef> = Vec::new();
        for key in keys {
            let section = Section::new_ref(*key);
            if let Some(parent) = chain.last() {
                link_child(parent, &section);
            }
            chain.push(section);
        }
        chain
    }

    #[test]
    fn test_first_save_returns_edits_unchanged() {
        let edits = vec![Section::new_ref("b"), Section::new_ref("a")];
        assert_eq!(paths(&unify(&edits, &[])), vec!["b", "a"]);
    }

    #[test]
    fn test_edit_section_replaces_loaded_counterpart() {
        let loaded = parse("a: 1\nb: 2\n");
        let edit = Section::new_ref("b");
        edit.borrow_mut().set_value("20");

        let unified = unify(&[Rc::clone(&edit)], &loaded);
        assert_eq!(paths(&unified), vec!["a", "b"]);
        assert!(Rc::ptr_eq(&unified[1], &edit));
    }

    #[test]
    fn test_new_root_sections_are_prepended() {
        let loaded = parse("a: 1\n");
        let edits = vec![Section::new_ref("x"), Section::new_ref("y")];

        assert_eq!(paths(&unify(&edits, &loaded)), vec!["y", "x", "a"]);
    }

    #[test]
    fn test_new_child_lands_after_the_last_sibling() {
        let loaded = parse("p:\n  a: 1\n  b:\n    deep: 2\nq: 3\n");
        let edit = chain(&["p", "n"]);

        let unified = unify(&edit[1..], &loaded);
        assert_eq!(paths(&unified), vec!["p", "p.a", "p.b", "p.b.deep", "p.n", "q"]);
    }

    #[test]
    fn test_fillers_complete_missing_levels() {
        let loaded = parse("p:\n  a: 1\nq: 2\n");
        let edit = chain(&["p", "x", "y", "z"]);

        let unified = unify(&edit[3..], &loaded);
        assert_eq!(paths(&unified), vec!["p", "p.a", "p.x", "p.x.y", "p.x.y.z", "q"]);

        // the fillers hang off the loaded parent without being adopted by it
        let filler = &unified[2];
        assert!(Rc::ptr_eq(&filler.borrow().parent().unwrap(), &loaded[0]));
        assert!(Rc::ptr_eq(&unified[3].borrow().parent().unwrap(), filler));
        assert!(!Rc::ptr_eq(filler, &edit[1]));
    }

    #[test]
    fn test_unify_leaves_inputs_untouched() {
        let loaded = parse("p:\n  a: 1\n");
        let edit = chain(&["p", "x", "y"]);

        for _ in 0..3 {
            let unified = unify(&edit[2..], &loaded);
            assert_eq!(paths(&unified), vec!["p", "p.a", "p.x", "p.x.y"]);
        }

        assert_eq!(loaded[0].borrow().children().len(), 1);
        assert_eq!(edit[1].borrow().children().len(), 1);
        assert!(Rc::ptr_eq(&edit[2].borrow().parent().unwrap(), &edit[1]));
        assert_eq!(edit[2].borrow().path(), vec!["p", "x", "y"]);
    }

    #[test]
    fn test_fillers_without_any_match_start_the_document() {
        let loaded = parse("a: 1\n");
        let edit = chain(&["m", "n"]);

        let unified = unify(&edit[1..], &loaded);
        assert_eq!(paths(&unified), vec!["m", "m.n", "a"]);
    }

    #[test]
    fn test_new_parent_and_child_stay_together() {
        let loaded = parse("a: 1\n");
        let edit = chain(&["x", "c"]);

        let unified = unify(&edit, &loaded);
        assert_eq!(paths(&unified), vec!["x", "x.c", "a"]);
    }
}
