//! End-to-end generation against the library fixture.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use table_config_lib::builders::{BuildContext, Built, DefinitionBuilders};
use table_config_lib::dispatch::FieldVariant;
use table_config_lib::ts::{Expr, TypeNode};
use table_config_lib::{
    ApiSource, ConflictPolicy, FileConfig, FsReader, ProjectConfig, TableConfig, generate, generate_and_write,
    owned_keys, reconcile,
};
use tempfile::TempDir;

const API: &str = include_str!("fixtures/library.json");
const EXPECTED: &str = include_str!("fixtures/library.ts");

fn api() -> ApiSource {
    ApiSource::from_json(API).unwrap()
}

fn single_file() -> Vec<FileConfig> {
    vec![FileConfig {
        path: PathBuf::from("books.ts"),
        operations: None,
    }]
}

fn render(config: &TableConfig) -> String {
    let files = generate(&api(), &single_file(), config).unwrap();
    files[0].render()
}

fn merge(existing: &str, policy: ConflictPolicy) -> String {
    reconcile_with(EXPECTED, existing, policy)
}

fn reconcile_with(generated: &str, existing: &str, policy: ConflictPolicy) -> String {
    let owned = owned_keys(&api().operations, &TableConfig::default());
    reconcile(Path::new("books.ts"), generated, Some(existing), &owned, &policy).unwrap()
}

// === generation tests ===

#[test]
fn generates_expected_declarations() {
    assert_eq!(render(&TableConfig::default()), EXPECTED);
}

#[test]
fn custom_types_import_path_is_used() {
    let output = render(&TableConfig::default().with_types_import_path("../api/types"));
    assert!(output.contains("} from '../api/types';"));
    assert!(!output.contains("'./types'"));
}

#[test]
fn injected_dependencies_turn_definitions_into_factories() {
    let mut config = TableConfig::default();
    config.filter.builders = DefinitionBuilders::default()
        .with(FieldVariant::Enum, |_: &BuildContext<'_>| {
            Built::new(Expr::raw("{ enum: { options: foo.statuses } }")).inject("foo", "T1")
        })
        .with(FieldVariant::String, |_: &BuildContext<'_>| {
            Built::new(Expr::object([("string", Expr::empty_object())]))
                .inject("bar", "T2")
                .inject("foo", "T1")
        });

    let output = render(&config);

    assert!(output.contains(
        "export const getListBooksFilters: (foo: T1, bar: T2) => BaseTableFilter<ListBooksFilterableFields, string, BaseFilterType>[] = (foo: T1, bar: T2) => [\n"
    ));
    assert!(output.contains("type: { enum: { options: foo.statuses } },"));
    // Search definitions request nothing and stay constant.
    assert!(output.contains("export const ListBooksSearchFields: "));
}

#[test]
fn label_writers_can_be_replaced() {
    let mut config = TableConfig::default();
    config.filter.label_writer = Arc::new(|ctx: &BuildContext<'_>| {
        (ctx.field.name != "id").then(|| format!("{} {}", ctx.operation.generated_name, ctx.field.name.to_uppercase()))
    });
    config.search.label_writer = Arc::new(|ctx: &BuildContext<'_>| {
        ctx.schema.map(|_| format!("Search {}", ctx.field.name))
    });

    let output = render(&config);

    assert!(output.contains("label: 'listBooks UPDATEDAT',"));
    // A declined label falls back to the field id.
    assert!(output.contains("id: ListBooksFilterableFields.Id,\n    label: ListBooksFilterableFields.Id,"));
    assert!(output.contains("id: 'author.name',\n    label: 'Search author.name',"));
}

#[test]
fn definition_hook_can_discard_fields() {
    let mut config = TableConfig::default();
    config.filter.after_build_definition = Some(Arc::new(|ctx: &BuildContext<'_>, built: Built| {
        if ctx.field.name == "format" { Built::declined() } else { built }
    }));

    let output = render(&config);

    assert!(!output.contains("ListBooksFilterableFields.Format"));
    assert!(!output.contains("BookFormatType"));
    assert!(output.contains("ListBooksFilterableFields.Status"));
}

#[test]
fn search_definition_writers_can_request_dependencies() {
    let mut config = TableConfig::default();
    config.search.definition_writer = Arc::new(|ctx: &BuildContext<'_>| {
        let Some(id) = ctx.id_expression() else {
            return Built::declined();
        };
        let label = Expr::raw(format!("locale.t('{}')", ctx.field.name));
        Built::new(Expr::object_multiline([("id", id), ("label", label)])).inject("locale", "Locale")
    });

    let output = render(&config);

    assert!(output.contains(
        "export const getListBooksSearchFields: (locale: Locale) => BaseTableSearch<ListBooksSearchableFields>[] = (locale: Locale) => [\n"
    ));
    assert!(output.contains("label: locale.t('author.name'),"));
    assert!(!output.contains("export const ListBooksSearchFields"));
    // Filter definitions are unaffected.
    assert!(output.contains("export const ListBooksFilters: "));
}

#[test]
fn definition_hooks_can_inject_dependencies() {
    let mut config = TableConfig::default();
    config.filter.after_build_definition = Some(Arc::new(|ctx: &BuildContext<'_>, built: Built| {
        if ctx.field.name == "price" {
            built.inject("currency", TypeNode::keyword("string"))
        } else {
            built
        }
    }));

    let output = render(&config);

    assert!(output.contains("export const getListBooksFilters: (currency: string) => "));
    assert!(output.contains("export const ListBooksSearchFields: "));
}

#[test]
fn search_builders_are_separate_from_filter_builders() {
    let mut config = TableConfig::default();
    config.search.builders = DefinitionBuilders::default().with(FieldVariant::String, |_: &BuildContext<'_>| {
        Built::new(Expr::raw("'text'"))
    });
    config.search.definition_writer = Arc::new(|ctx: &BuildContext<'_>| {
        let (Some(id), Some(schema)) = (ctx.id_expression(), ctx.schema) else {
            return Built::declined();
        };
        let Some(variant) = table_config_lib::classify(schema) else {
            return Built::declined();
        };
        let mode = ctx.builders.build(variant, ctx).definition.unwrap_or_else(|| Expr::raw("'none'"));
        Built::new(Expr::object_multiline([("id", id), ("mode", mode)]))
    });

    let output = render(&config);

    assert!(output.contains("id: 'title',\n    mode: 'text',"));
    // Filter definitions still use the default string builder.
    assert!(output.contains("label: 'Name',\n    type: { string: {} },"));
}

#[test]
fn date_default_filters_are_kept() {
    let mut api = api();
    api.operations[0]
        .list
        .as_mut()
        .unwrap()
        .default_filters
        .insert("published".to_string(), vec!["2024-01-01".to_string()]);

    let output = generate(&api, &single_file(), &TableConfig::default()).unwrap()[0].render();

    assert!(output.contains("filters: [{ id: ListBooksFilterableFields.Published, value: { exact: '2024-01-01' } }],"));
}

#[test]
fn files_only_receive_their_operations() {
    let project = ProjectConfig::from_toml(
        r#"
        [[files]]
        path = "books.ts"
        operations = ["listBooks"]

        [[files]]
        path = "single.ts"
        operations = ["getBook", "listShelves"]
        "#,
    )
    .unwrap();

    let files = generate(&api(), &project.output_files(), &project.table_config()).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].render(), EXPECTED);
    assert!(!files[1].has_content());
}

// === reconciliation tests ===

#[test]
fn outdated_declarations_are_replaced() {
    let existing = EXPECTED.replace("desc: true", "desc: false");
    assert_eq!(merge(&existing, ConflictPolicy::PreferGenerated), EXPECTED);
}

#[test]
fn hand_written_declarations_survive() {
    let existing = format!("{EXPECTED}\n// Columns shown by default.\nexport const visibleColumns = ['title'];\n");
    assert_eq!(merge(&existing, ConflictPolicy::PreferGenerated), existing);
}

#[test]
fn regenerate_drops_everything_not_generated() {
    let existing = format!("{EXPECTED}\nexport const visibleColumns = ['title'];\n");
    assert_eq!(merge(&existing, ConflictPolicy::Regenerate), EXPECTED);
}

#[test]
fn prefer_existing_keeps_local_edits() {
    let existing = EXPECTED.replace("label: 'In stock'", "label: 'Available'");
    assert_eq!(merge(&existing, ConflictPolicy::PreferExisting), existing);
}

#[test]
fn removed_declarations_keep_the_remaining_order() {
    let mut config = TableConfig::default();
    config.search.after_build_definition = Some(Arc::new(|_: &BuildContext<'_>, _: Built| Built::declined()));
    let generated = render(&config);
    assert!(!generated.contains("ListBooksSearchFields:"));

    let merged = reconcile_with(&generated, EXPECTED, ConflictPolicy::Regenerate);

    assert_eq!(merged, generated);
    let sorts = merged.find("LIST_BOOKS_DEFAULT_SORTS").unwrap();
    let defaults = merged.find("LIST_BOOKS_DEFAULT_FILTERS").unwrap();
    let filters = merged.find("export const ListBooksFilters").unwrap();
    assert!(sorts < defaults && defaults < filters);
}

#[test]
fn removed_default_filter_disappears_from_existing_output() {
    let mut api = api();
    api.operations[0].list.as_mut().unwrap().default_filters.remove("pages");
    let generated = generate(&api, &single_file(), &TableConfig::default()).unwrap()[0].render();

    let merged = reconcile_with(&generated, EXPECTED, ConflictPolicy::default());

    assert_eq!(merged, generated);
    assert!(!merged.contains("exact: '100'"));
}

#[test]
fn cleared_default_filters_disappear_from_existing_output() {
    let mut api = api();
    api.operations[0].list.as_mut().unwrap().default_filters.clear();
    let generated = generate(&api, &single_file(), &TableConfig::default()).unwrap()[0].render();
    assert!(!generated.contains("LIST_BOOKS_DEFAULT_FILTERS"));

    let merged = reconcile_with(&generated, EXPECTED, ConflictPolicy::default());

    assert!(!merged.contains("LIST_BOOKS_DEFAULT_FILTERS"));
    assert!(!merged.contains("FilterState"));
    assert_eq!(merged, generated);
}

#[test]
fn stale_factory_is_dropped_when_definitions_become_constant() {
    let existing = EXPECTED.replace("export const ListBooksFilters: ", "export const getListBooksFilters: ");
    let merged = merge(&existing, ConflictPolicy::PreferGenerated);

    assert!(!merged.contains("getListBooksFilters"));
    assert_eq!(merged, EXPECTED);
}

#[test]
fn hand_written_imports_survive_regeneration() {
    let existing = format!(
        "{}\nexport const cols = [Foo.A];\n",
        EXPECTED.replace("BookStatus, ListBooksFilterableFields", "BookStatus, Foo, ListBooksFilterableFields")
    );

    let merged = merge(&existing, ConflictPolicy::PreferGenerated);

    assert!(merged.contains(
        "import { BookFormatType, BookStatus, Foo, ListBooksFilterableFields, type ListBooksSearchableFields, ListBooksSortableFields } from './types';"
    ));
    assert!(merged.ends_with("export const cols = [Foo.A];\n"));
    assert_eq!(merged, existing);
    assert_eq!(merge(&merged, ConflictPolicy::PreferGenerated), merged);
}

#[test]
fn timestamp_strings_are_date_filters() {
    let output = render(&TableConfig::default());
    assert!(output.contains("label: 'Updated at',\n    type: {\n      date: { allowTime: true },"));
}

#[test]
fn unparseable_existing_file_is_regenerated() {
    assert_eq!(merge("export const = [", ConflictPolicy::PreferGenerated), EXPECTED);
}

// === file tests ===

#[tokio::test]
async fn writes_new_file_verbatim() {
    let dir = TempDir::new().unwrap();

    let outcomes = generate_and_write(&api(), &single_file(), &TableConfig::default(), dir.path(), &FsReader, false)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].declarations, 4);
    assert!(outcomes[0].written);
    assert_eq!(tokio::fs::read_to_string(dir.path().join("books.ts")).await.unwrap(), EXPECTED);
}

#[tokio::test]
async fn regeneration_is_a_fixed_point() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.ts");
    let config = TableConfig::default();

    generate_and_write(&api(), &single_file(), &config, dir.path(), &FsReader, false)
        .await
        .unwrap();
    let first = tokio::fs::read_to_string(&path).await.unwrap();

    generate_and_write(&api(), &single_file(), &config, dir.path(), &FsReader, false)
        .await
        .unwrap();
    let second = tokio::fs::read_to_string(&path).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn dry_run_leaves_disk_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.ts");
    tokio::fs::write(&path, "export const visibleColumns = ['title'];\n").await.unwrap();

    let outcomes = generate_and_write(&api(), &single_file(), &TableConfig::default(), dir.path(), &FsReader, true)
        .await
        .unwrap();

    assert!(!outcomes[0].written);
    assert!(outcomes[0].content.starts_with(EXPECTED));
    assert!(outcomes[0].content.ends_with("export const visibleColumns = ['title'];\n"));
    assert_eq!(
        tokio::fs::read_to_string(&path).await.unwrap(),
        "export const visibleColumns = ['title'];\n"
    );
}
