//! Output assembly and file writing.
//!
//! Each configured output file collects the declarations of the operations
//! that feed it. Files are rendered with a heading comment, one import line
//! per module and the declarations in operation order, then reconciled with
//! whatever is already on disk and written atomically.
//!
//! ## Output structure
//!
//! ```text
//! // Generated by table-config. Generated declarations are replaced on every run.
//!
//! import { ListBooksFilterFields, ListBooksSortFields } from './types';
//! import type { FilterState, SortingState } from '@pentops/react-table-state-psm';
//!
//! export const LIST_BOOKS_DEFAULT_SORTS: SortingState<ListBooksSortFields> = [...];
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::assemble::{Assembled, assemble_operation};
use crate::config::{FileConfig, REACT_TABLE_STATE_PSM_IMPORT_PATH, TableConfig};
use crate::error::TableConfigError;
use crate::merge::{ExistingFileReader, StatementKey, reconcile_file, render_blocks};
use crate::schema::{ApiSource, ClientOperation};
use crate::ts::{Declaration, ImportSet};

pub const HEADING: &str =
    "// Generated by table-config. Generated declarations are replaced on every run.";

/// The freshly generated content of one output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub imports: ImportSet,
    pub declarations: Vec<Declaration>,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// A file has content once at least one declaration was emitted.
    pub fn has_content(&self) -> bool {
        !self.declarations.is_empty()
    }

    pub fn add(&mut self, assembled: Assembled) {
        self.imports.extend(assembled.imports);
        self.declarations.extend(assembled.declarations);
    }

    /// Renders the file; empty when nothing was emitted.
    pub fn render(&self) -> String {
        if !self.has_content() {
            return String::new();
        }

        let imports = self.imports.render();
        let declarations: Vec<String> = self.declarations.iter().map(Declaration::render).collect();

        render_blocks(
            std::iter::once((HEADING, false))
                .chain(imports.iter().map(|import| (import.as_str(), true)))
                .chain(declarations.iter().map(|declaration| (declaration.as_str(), false))),
        )
    }
}

/// Generates the content of every configured file.
///
/// ## Errors
/// Returns an error if the schema graph is malformed.
pub fn generate(
    api: &ApiSource,
    files: &[FileConfig],
    config: &TableConfig,
) -> Result<Vec<GeneratedFile>, TableConfigError> {
    files
        .iter()
        .map(|file| {
            if let Some(names) = &file.operations {
                for name in names {
                    if !api.operations.iter().any(|operation| operation.generated_name == *name) {
                        warn!(path = %file.path.display(), operation = %name, "configured operation does not exist");
                    }
                }
            }

            let mut generated = GeneratedFile::new(&file.path);
            for operation in api.operations.iter().filter(|operation| file.includes(operation)) {
                generated.add(assemble_operation(api, operation, config)?);
            }
            Ok(generated)
        })
        .collect()
}

/// Every identity the generator can emit for `operations`: the names of all
/// four declaration categories, both as constants and as factories, and the
/// modules it imports from.
///
/// Existing statements with one of these identities are treated as earlier
/// generated output during reconciliation.
pub fn owned_keys<'a>(
    operations: impl IntoIterator<Item = &'a ClientOperation>,
    config: &TableConfig,
) -> HashSet<StatementKey> {
    let mut keys: HashSet<StatementKey> = [REACT_TABLE_STATE_PSM_IMPORT_PATH, config.types_import_path.as_str()]
        .into_iter()
        .map(|module| StatementKey::Import(module.to_string()))
        .collect();

    let writers = [
        &config.sort.initial_values_name,
        &config.search.definition_name,
        &config.filter.initial_values_name,
        &config.filter.definition_name,
    ];

    for operation in operations {
        for writer in writers {
            for is_factory in [false, true] {
                keys.insert(StatementKey::Value(writer(operation, is_factory)));
            }
        }
    }

    keys
}

/// Result of processing one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub content: String,
    pub declarations: usize,
    pub written: bool,
}

/// Writes content to a file atomically (temp file + rename).
///
/// ## Errors
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub async fn write_atomic(path: &Path, content: &str) -> Result<(), TableConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TableConfigError::WriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|e| TableConfigError::WriteError {
            path: temp_path.display().to_string(),
            source: e,
        })?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| TableConfigError::WriteError {
            path: path.display().to_string(),
            source: e,
        })?;

    Ok(())
}

/// Generates, reconciles and writes every configured file.
///
/// Paths in `files` are relative to `output_dir`. Files without any emitted
/// declaration are skipped and left untouched on disk.
///
/// ## Arguments
///
/// * `reader` - Supplies the previous content of each file
/// * `dry_run` - If true, reconcile but do not write
///
/// ## Errors
/// Returns an error if the schema graph is malformed or a write fails.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), dry_run = dry_run))]
pub async fn generate_and_write<R: ExistingFileReader>(
    api: &ApiSource,
    files: &[FileConfig],
    config: &TableConfig,
    output_dir: &Path,
    reader: &R,
    dry_run: bool,
) -> Result<Vec<FileOutcome>, TableConfigError> {
    let mut outcomes = Vec::new();

    for (file, generated) in files.iter().zip(generate(api, files, config)?) {
        let path = output_dir.join(&generated.path);

        if !generated.has_content() {
            debug!(path = %path.display(), "no declarations, skipping file");
            continue;
        }

        let owned = owned_keys(api.operations.iter().filter(|operation| file.includes(operation)), config);
        let content = reconcile_file(
            reader,
            &path,
            &generated.render(),
            &owned,
            config.conflict_resolver.as_ref(),
        )
        .await?;

        if !dry_run {
            write_atomic(&path, &content).await?;
        }

        info!(
            path = %path.display(),
            declarations = generated.declarations.len(),
            written = !dry_run,
            "table config generated"
        );

        outcomes.push(FileOutcome {
            path,
            content,
            declarations: generated.declarations.len(),
            written: !dry_run,
        });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::merge::FsReader;
    use crate::ts::{Expr, TypeNode};

    fn file_with_declaration() -> GeneratedFile {
        let mut file = GeneratedFile::new("books.ts");
        file.add(Assembled {
            declarations: vec![Declaration::constant(
                "X",
                Some(TypeNode::keyword("number")),
                Expr::number("1"),
            )],
            imports: ImportSet::new().with_type("psm", "S"),
        });
        file
    }

    // === render tests ===

    #[test]
    fn empty_file_renders_nothing() {
        assert_eq!(GeneratedFile::new("x.ts").render(), "");
    }

    #[test]
    fn render_starts_with_heading() {
        assert_eq!(
            file_with_declaration().render(),
            format!("{HEADING}\n\nimport type {{ S }} from 'psm';\n\nexport const X: number = 1;\n")
        );
    }

    // === write_atomic tests ===

    #[tokio::test]
    async fn write_atomic_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deep/out.ts");

        write_atomic(&path, "// content\n").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "// content\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn write_atomic_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.ts");
        tokio::fs::write(&path, "old").await.unwrap();

        write_atomic(&path, "new").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "new");
    }

    // === owned_keys tests ===

    #[test]
    fn owned_keys_cover_every_category_and_module() {
        let operation = ClientOperation {
            generated_name: "listBooks".to_string(),
            root_entity: None,
            list: None,
        };
        let keys = owned_keys([&operation], &TableConfig::default());

        for name in [
            "LIST_BOOKS_DEFAULT_SORTS",
            "ListBooksSearchFields",
            "getListBooksSearchFields",
            "LIST_BOOKS_DEFAULT_FILTERS",
            "ListBooksFilters",
            "getListBooksFilters",
        ] {
            assert!(keys.contains(&StatementKey::Value(name.to_string())), "missing {name}");
        }
        assert!(keys.contains(&StatementKey::Import("./types".to_string())));
        assert!(keys.contains(&StatementKey::Import(REACT_TABLE_STATE_PSM_IMPORT_PATH.to_string())));
        assert!(!keys.contains(&StatementKey::Value("ListShelvesFilters".to_string())));
    }

    // === generate_and_write tests ===

    #[tokio::test]
    async fn operations_without_lists_write_nothing() {
        let dir = TempDir::new().unwrap();
        let api = ApiSource::from_json(r#"{ "operations": [{ "generatedName": "getBook" }] }"#).unwrap();
        let files = vec![FileConfig {
            path: PathBuf::from("books.ts"),
            operations: None,
        }];

        let outcomes = generate_and_write(&api, &files, &TableConfig::default(), dir.path(), &FsReader, false)
            .await
            .unwrap();

        assert!(outcomes.is_empty());
        assert!(!dir.path().join("books.ts").exists());
    }
}
