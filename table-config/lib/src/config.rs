//! Generator configuration.
//!
//! [`TableConfig`] is the programmatic surface: every naming, labelling and
//! building decision is a replaceable function with a default. [`ProjectConfig`]
//! is the subset that can live in a `table-config.toml` next to the project.
//!
//! ```toml
//! types_import_path = "../types"
//! conflict = "prefer-generated"
//!
//! [[files]]
//! path = "src/table-config/books.ts"
//! operations = ["listBooks"]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assemble;
use crate::builders::{BuildContext, Built, DefinitionBuilders};
use crate::error::TableConfigError;
use crate::merge::{ConflictPolicy, ConflictResolver};
use crate::naming::{self, LabelWriter, NameWriter};
use crate::schema::{ClientOperation, EnumRef};
use crate::ts::{Declaration, ImportSet, TypeNode};

pub const REACT_TABLE_STATE_PSM_IMPORT_PATH: &str = "@pentops/react-table-state-psm";
pub const DEFAULT_TYPES_IMPORT_PATH: &str = "./types";
pub const DEFAULT_OUTPUT_FILE: &str = "table-config.ts";

/// The declared type of an emitted declaration, plus the imports it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    pub type_node: TypeNode,
    pub imports: ImportSet,
}

pub type TypeReferenceWriter =
    Arc<dyn Fn(&ClientOperation, EnumRef<'_>) -> TypeReference + Send + Sync>;

/// Builds the element one field contributes to a definitions array.
///
/// Dependencies injected into the returned [`Built`] turn the whole
/// declaration into a factory.
pub type DefinitionWriter = Arc<dyn Fn(&BuildContext<'_>) -> Built + Send + Sync>;

/// Runs after a field's element was written. The hook may rewrite the
/// element, inject dependencies or add imports; returning a [`Built`] without
/// a definition discards the field.
pub type DefinitionHook = Arc<dyn Fn(&BuildContext<'_>, Built) -> Built + Send + Sync>;

/// Transforms or discards an assembled default-values declaration.
pub type InitialValuesHook =
    Arc<dyn Fn(&ClientOperation, Declaration) -> Option<Declaration> + Send + Sync>;

#[derive(Clone)]
pub struct FilterConfig {
    pub definition_name: NameWriter,
    pub initial_values_name: NameWriter,
    pub label_writer: LabelWriter,
    pub builders: DefinitionBuilders,
    pub definition_writer: DefinitionWriter,
    pub type_reference: TypeReferenceWriter,
    pub after_build_definition: Option<DefinitionHook>,
    pub after_build_initial_values: Option<InitialValuesHook>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            definition_name: naming::default_name_writer(naming::filter_definitions_name),
            initial_values_name: naming::default_name_writer(naming::default_filters_name),
            label_writer: naming::default_label_writer(),
            builders: DefinitionBuilders::default(),
            definition_writer: Arc::new(assemble::filter_definition),
            type_reference: Arc::new(filter_type_reference),
            after_build_definition: None,
            after_build_initial_values: None,
        }
    }
}

#[derive(Clone)]
pub struct SearchConfig {
    pub definition_name: NameWriter,
    pub label_writer: LabelWriter,
    /// Available to search definition writers; the default writer emits
    /// `{ id, label }` and does not consult them.
    pub builders: DefinitionBuilders,
    pub definition_writer: DefinitionWriter,
    pub type_reference: TypeReferenceWriter,
    pub after_build_definition: Option<DefinitionHook>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            definition_name: naming::default_name_writer(naming::search_definitions_name),
            label_writer: naming::default_label_writer(),
            builders: DefinitionBuilders::default(),
            definition_writer: Arc::new(assemble::search_definition),
            type_reference: Arc::new(search_type_reference),
            after_build_definition: None,
        }
    }
}

#[derive(Clone)]
pub struct SortConfig {
    pub initial_values_name: NameWriter,
    pub after_build_initial_values: Option<InitialValuesHook>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            initial_values_name: naming::default_name_writer(naming::default_sorts_name),
            after_build_initial_values: None,
        }
    }
}

/// Everything the generator can be told.
#[derive(Clone)]
pub struct TableConfig {
    pub filter: FilterConfig,
    pub search: SearchConfig,
    pub sort: SortConfig,
    /// Module the host's generated types are imported from.
    pub types_import_path: String,
    pub conflict_resolver: Arc<dyn ConflictResolver>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            search: SearchConfig::default(),
            sort: SortConfig::default(),
            types_import_path: DEFAULT_TYPES_IMPORT_PATH.to_string(),
            conflict_resolver: Arc::new(ConflictPolicy::default()),
        }
    }
}

impl fmt::Debug for TableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableConfig")
            .field("types_import_path", &self.types_import_path)
            .field("filter_builders", &self.filter.builders)
            .finish_non_exhaustive()
    }
}

impl TableConfig {
    pub fn with_types_import_path(mut self, path: impl Into<String>) -> Self {
        self.types_import_path = path.into();
        self
    }

    pub fn with_conflict_resolver(mut self, resolver: impl ConflictResolver + 'static) -> Self {
        self.conflict_resolver = Arc::new(resolver);
        self
    }
}

/// `BaseTableFilter<Fields, string, BaseFilterType>[]`
pub fn filter_type_reference(_operation: &ClientOperation, fields: EnumRef<'_>) -> TypeReference {
    TypeReference {
        type_node: TypeNode::array(TypeNode::generic(
            "BaseTableFilter",
            vec![
                TypeNode::reference(fields.generated_name),
                TypeNode::keyword("string"),
                TypeNode::reference("BaseFilterType"),
            ],
        )),
        imports: ImportSet::new()
            .with_type(REACT_TABLE_STATE_PSM_IMPORT_PATH, "BaseTableFilter")
            .with_type(REACT_TABLE_STATE_PSM_IMPORT_PATH, "BaseFilterType"),
    }
}

/// `BaseTableSearch<Fields>[]`
pub fn search_type_reference(_operation: &ClientOperation, fields: EnumRef<'_>) -> TypeReference {
    TypeReference {
        type_node: TypeNode::array(TypeNode::generic(
            "BaseTableSearch",
            vec![TypeNode::reference(fields.generated_name)],
        )),
        imports: ImportSet::new().with_type(REACT_TABLE_STATE_PSM_IMPORT_PATH, "BaseTableSearch"),
    }
}

/// The on-disk project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub types_import_path: Option<String>,
    pub conflict: ConflictPolicy,
    pub files: Vec<FileConfig>,
}

/// One output file and the operations that feed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub path: PathBuf,
    /// Generated operation names; every operation when absent.
    #[serde(default)]
    pub operations: Option<Vec<String>>,
}

impl FileConfig {
    pub fn includes(&self, operation: &ClientOperation) -> bool {
        self.operations
            .as_ref()
            .is_none_or(|names| names.iter().any(|name| *name == operation.generated_name))
    }
}

impl ProjectConfig {
    /// Parses a TOML project configuration.
    ///
    /// ## Errors
    /// Returns an error for malformed TOML or unknown conflict policies.
    pub fn from_toml(text: &str) -> Result<Self, TableConfigError> {
        let config: Self = toml::from_str(text)?;

        if config.files.iter().any(|file| file.path.as_os_str().is_empty()) {
            return Err(TableConfigError::Config("file entries need a non-empty `path`".to_string()));
        }

        Ok(config)
    }

    /// Loads the configuration at `path`.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, TableConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TableConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_toml(&text)
    }

    /// Output files, defaulting to a single file fed by every operation.
    pub fn output_files(&self) -> Vec<FileConfig> {
        if self.files.is_empty() {
            return vec![FileConfig {
                path: PathBuf::from(DEFAULT_OUTPUT_FILE),
                operations: None,
            }];
        }

        self.files.clone()
    }

    /// Builds the programmatic configuration this file describes.
    pub fn table_config(&self) -> TableConfig {
        let config = TableConfig::default().with_conflict_resolver(self.conflict);

        match &self.types_import_path {
            Some(path) => config.with_types_import_path(path.clone()),
            None => config,
        }
    }
}
