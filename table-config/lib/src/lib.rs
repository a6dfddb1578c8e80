//! Table configuration generator for `@pentops/react-table-state-psm`.
//!
//! Given the schema graph of an API, this crate emits TypeScript declarations
//! describing how each list operation's table can be filtered, searched and
//! sorted, then merges them into the files that already exist on disk without
//! destroying hand-written content.
//!
//! ## Pipeline
//!
//! ```text
//! ApiSource ─► dispatch ─► builders ─► assemble ─► output ─► merge ─► file
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use table_config_lib::{ApiSource, FsReader, ProjectConfig, generate_and_write};
//!
//! let api = ApiSource::from_json(&std::fs::read_to_string("api.json")?)?;
//! let project = ProjectConfig::default();
//! let outcomes = generate_and_write(
//!     &api,
//!     &project.output_files(),
//!     &project.table_config(),
//!     Path::new("src/generated"),
//!     &FsReader,
//!     false,
//! )
//! .await?;
//! ```

pub mod assemble;
pub mod builders;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod merge;
pub mod naming;
pub mod output;
pub mod schema;
pub mod ts;

pub use assemble::{Assembled, assemble_operation};
pub use builders::{BuildContext, Built, DefinitionBuilders, DependencySet};
pub use config::{
    DefinitionHook, DefinitionWriter, FileConfig, FilterConfig, ProjectConfig, SearchConfig, SortConfig, TableConfig,
};
pub use dispatch::{FieldVariant, classify};
pub use error::TableConfigError;
pub use merge::{ConflictPolicy, ConflictResolver, ExistingFileReader, FsReader, Statement, StatementKey, reconcile};
pub use output::{FileOutcome, GeneratedFile, generate, generate_and_write, owned_keys};
pub use schema::ApiSource;
