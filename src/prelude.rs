//! # crossmap Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the crossmap library.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all crossmap operations
pub use crate::Error;

/// The result type used throughout crossmap
pub use crate::Result;

/// Remapping configuration and mode
pub use crate::{RemapConfig, TranslationMode};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Environment building and load-time transformation
pub use crate::pipeline::{
    result::{TransformReport, UnitOutcome},
    EnvironmentLoader, RemapEnvironment, RemapTransformer, TargetSet,
};

/// Class file model
pub use crate::classfile::ClassUnit;

// ================================================================================================
// Mappings and Lookup
// ================================================================================================

/// Mapping records and the composite table
pub use crate::mappings::{table::CompositeTable, MappingRecord, PivotKey, SymbolKind};

/// Name lookup and host channels
pub use crate::lookup::{HostChannels, LookupService, NamingFunction};

// ================================================================================================
// Remapping
// ================================================================================================

/// Symbol mapping hooks and the class rewriter
pub use crate::remapper::{rewriter::ClassRewriter, scope::ScopeFilter, NameMapper, ScopedRemapper};

/// Low-level file parsing utilities
pub use crate::{Parser, Resource};
