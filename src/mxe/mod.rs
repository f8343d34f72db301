//! MXE Main Table engine
//!
//! An MXE file holds a table of contents (the Main Table) whose entries
//! point to fixed-layout records. The layout of each record comes from the
//! template named by the entry's type name.
//!
//! ## Format Overview
//!
//! - Entry count and TOC start address at fixed offsets (see [`MxeLayout`])
//! - TOC entries of a fixed stride: id, type code, type name address,
//!   record address
//! - Records, type names and strings elsewhere in the file
//!
//! Stored addresses are relative; [`MxeLayout::follow`] turns them into file
//! offsets.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mxe::config::Settings;
//! use mxe::mxe::{MainTable, WriteOptions};
//! use mxe::template::TemplateRegistry;
//!
//! let settings = Settings::default();
//! let templates = TemplateRegistry::load("VlMx_entry_templates.csv")?;
//! let outcome = MainTable::open("game_info.mxe", &templates, &settings.layout, &settings.policy)?;
//! for entry in outcome.table.entries() {
//!     println!("{} {}", entry.id, entry.type_name.name);
//! }
//! outcome.table.write("game_info.mxe", &templates, &settings.layout, WriteOptions::default())?;
//! # Ok::<(), mxe::Error>(())
//! ```
//!
//! [`MxeLayout`]: crate::config::MxeLayout
//! [`MxeLayout::follow`]: crate::config::MxeLayout::follow

mod reader;
mod types;
mod writer;

pub use types::*;
pub use writer::{WriteOptions, WriteReport};
