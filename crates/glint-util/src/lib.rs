//! glint-util - Core Utilities and Foundation Types
//!
//! Foundation types shared by every phase of the toolchain: interned
//! identifiers (`symbol`), typed arena indices (`index_vec`), source
//! locations (`span`), diagnostic collection (`diagnostic`), definition
//! identity (`def_id`), and infrastructural error types (`error`).

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span, SourceMap};
pub use symbol::Symbol;

// Re-export commonly used hash-map/set aliases so downstream crates do not
// need their own `rustc-hash` dependency just to name these types.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
