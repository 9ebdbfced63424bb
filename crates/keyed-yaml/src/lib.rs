/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Comment-preserving reader and writer for indentation-structured
//! configuration files.
//!
//! The format is a small subset of YAML:
//!
//! - `key: value` lines, nested two spaces per level
//! - `- item` lines forming the list value of the key above them
//! - `# comment` lines and ` # side comments`, kept across a round trip
//! - plain lines continuing the previous value as a multi-line scalar
//!
//! A [`Document`] loads the file into a flat list of tree-linked
//! [`Section`]s, hands out shared handles through key paths, and on save
//! merges the edited sections back into the layout it read, so comments,
//! blank lines and ordering of untouched entries survive.
//!
//! # Example
//!
//! ```
//! use keyed_yaml::Document;
//!
//! let mut document = Document::from_text("# Port to bind\nport: 8080\n");
//! document.load()?;
//!
//! let port = document.put(&["port"])?;
//! assert_eq!(port.borrow().value().as_i32()?, 8080);
//! port.borrow_mut().set_value("9090");
//!
//! document.put(&["server", "host"])?.borrow_mut().set_value("localhost");
//! document.save()?;
//!
//! assert_eq!(
//!     document.source().text(),
//!     "server:\n  host: localhost\n# Port to bind\nport: 9090\n"
//! );
//! # Ok::<(), keyed_yaml::Error>(())
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod lock;
pub mod reader;
pub mod reconcile;
pub mod scanner;
pub mod section;
pub mod source;
pub mod value;
pub mod writer;

pub use config::Config;
pub use document::Document;
pub use error::{ConversionError, Error, Result};
pub use lock::{LockRegistry, PathLock};
pub use reader::Reader;
pub use reconcile::unify;
pub use scanner::{Line, scan_line};
pub use section::{Section, SectionRef, detach, format_path, link_child};
pub use source::{FileSource, MemorySource, Source, StreamSource};
pub use value::Value;
pub use writer::Writer;
