// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # crossmap
//!
//! Cross-namespace symbol remapping for JVM class files.
//!
//! Compiled code written against one naming scheme has to run against a runtime whose classes
//! use another. `crossmap` composes two mapping files that share a common (obfuscated) pivot
//! namespace into a direct `intermediate -> final` translation table, and rewrites the symbolic
//! references inside binary class units at load time.
//!
//! ## Features
//!
//! - **📄 Two mapping formats** - Tiny v1 (pivot -> intermediate) and TSRG v1 (pivot -> final)
//! - **🔗 Pivot join** - A soft left join into per-kind `intermediate -> final` maps
//! - **🔍 Total lookup** - Unknown names pass through unchanged, with an optional host channel
//! - **🛡️ Namespace guard** - Only names under configured prefixes are ever touched
//! - **🔧 Class file rewriting** - Constant pool, member declarations, descriptors and generic
//!   signatures, without renumbering a single existing pool entry
//! - **⚡ Parallel batches** - Independent units are rewritten concurrently with `rayon`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crossmap::prelude::*;
//!
//! let environment = EnvironmentLoader::new()
//!     .intermediate_file("mappings/mappings.tiny")
//!     .final_file("mappings/joined.tsrg")
//!     .with_config(RemapConfig::production())
//!     .build();
//!
//! let class_bytes: Vec<u8> = std::fs::read("build/classes/Entity.class")?;
//! let targets = TargetSet::from_class_files([&class_bytes]);
//! let transformer = RemapTransformer::new(environment, targets);
//!
//! let name = ClassUnit::peek_name(&class_bytes)?;
//! if let Some(rewritten) = transformer.transform(&name, &class_bytes)? {
//!     println!("Rewrote {} ({} bytes)", name, rewritten.len());
//! }
//! # Ok::<(), crossmap::Error>(())
//! ```
//!
//! ### Looking names up directly
//!
//! ```rust
//! use std::sync::Arc;
//! use crossmap::{
//!     lookup::LookupService,
//!     mappings::{table::CompositeTable, tiny, tsrg, SymbolKind},
//!     RemapConfig,
//! };
//!
//! let intermediate = tiny::parse("v1\tofficial\tintermediary\nMETHOD\tpkg/Owner\t()V\tfoo\tbar\n");
//! let finals = tsrg::parse("pkg/Owner pkg2/Owner2\n\tfoo\t()V\tbaz\n");
//! let table = Arc::new(CompositeTable::build(&intermediate, &finals));
//!
//! let lookup = LookupService::new(table, &RemapConfig::production(), None);
//! assert_eq!(lookup.translate(SymbolKind::Method, "bar"), "baz");
//! assert_eq!(lookup.translate(SymbolKind::Method, "unknown"), "unknown");
//! ```
//!
//! ## Logging
//!
//! All diagnostics go through [`tracing`]. The crate never installs a subscriber. Orphaned
//! mapping records are reported on the `crossmap::mappings` target at warn level, and the full
//! table is dumped at debug level on `crossmap::dump`.
//!
//! ## Error Handling
//!
//! Mapping problems never abort loading; they are logged and the affected line or file is
//! skipped. Class units that cannot be decoded fail individually:
//!
//! ```rust
//! use crossmap::{pipeline::{EnvironmentLoader, RemapTransformer, TargetSet}, Error};
//!
//! let transformer = RemapTransformer::new(EnvironmentLoader::new().build(), TargetSet::from_names(["a/B"]));
//! match transformer.transform("a/B", &[0xCA, 0xFE, 0xBA]) {
//!     Err(Error::UnitFailed { unit, source }) => println!("{unit} failed: {source}"),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench remap
//!
//! # Fuzz the class file decoder
//! cargo +nightly fuzz run classunit --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use crossmap::prelude::*;
///
/// let environment = EnvironmentLoader::new().with_config(RemapConfig::development()).build();
/// assert_eq!(environment.config().mode, TranslationMode::HostDelegated);
/// ```
pub mod prelude;

/// Resource access (memory-mapped files and in-memory buffers) and the big-endian parser.
pub mod file;

/// Encoding helpers.
pub mod utils;

/// Remapping configuration and presets.
pub mod config;

/// Mapping file loaders and the composite translation table.
///
/// # Key Components
///
/// - [`mappings::tiny`] - Tiny v1 loader (pivot -> intermediate)
/// - [`mappings::tsrg`] - TSRG v1 loader (pivot -> final)
/// - [`mappings::table::CompositeTable`] - The joined `intermediate -> final` maps
pub mod mappings;

/// Name translation over the composite table and host channels.
pub mod lookup;

/// Decoding and encoding of JVM class files.
pub mod classfile;

/// Scope filtering, descriptor and signature remapping, and the class rewriter.
pub mod remapper;

/// Environment building and load-time transformation entry points.
pub mod pipeline;

/// `crossmap` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `crossmap` Error type
///
/// Covers class file decoding, mapping parsing, I/O and per-unit pipeline failures.
pub use error::Error;

/// A decoded JVM class unit.
pub use classfile::ClassUnit;

/// Remapping configuration.
pub use config::{RemapConfig, TranslationMode};

/// Low-level resource access and parsing.
pub use file::{parser::Parser, Resource};
