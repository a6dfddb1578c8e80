//! Declaration assembly for one generated client operation.
//!
//! Each operation contributes up to four declarations, emitted in this order:
//!
//! | category | default name | type |
//! |---|---|---|
//! | default sorts | `LIST_BOOKS_DEFAULT_SORTS` | `SortingState<Fields>` |
//! | search definitions | `ListBooksSearchFields` | `BaseTableSearch<Fields>[]` |
//! | default filters | `LIST_BOOKS_DEFAULT_FILTERS` | `FilterState<Fields>` |
//! | filter definitions | `ListBooksFilters` | `BaseTableFilter<Fields, string, BaseFilterType>[]` |
//!
//! A category whose field set yields no element emits nothing. Definition
//! declarations become factories (`getListBooksFilters`) as soon as any
//! definition writer, builder or hook injects a runtime dependency.

mod defaults;
mod filter;
mod search;
mod sort;

use tracing::{debug, warn};

pub use filter::filter_definition;
pub use search::search_definition;

use crate::builders::{BuildContext, DefinitionBuilders, DependencySet};
use crate::config::{DefinitionHook, DefinitionWriter, TableConfig, TypeReferenceWriter};
use crate::error::TableConfigError;
use crate::naming::{LabelWriter, NameWriter};
use crate::schema::{
    ApiSource, ClientOperation, EnumOption, EnumRef, GeneratedEnum, ListOptions, NamedSchema, ResolvedField,
};
use crate::ts::{Declaration, Expr, ImportSet};

/// Declarations and imports produced for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    pub declarations: Vec<Declaration>,
    pub imports: ImportSet,
}

impl Assembled {
    fn push(&mut self, emitted: Option<Emitted>) {
        if let Some(emitted) = emitted {
            self.declarations.push(emitted.declaration);
            self.imports.extend(emitted.imports);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// The per-field functions of one definitions category.
#[derive(Clone, Copy)]
struct Writers<'a> {
    category: &'static str,
    builders: &'a DefinitionBuilders,
    label_writer: &'a LabelWriter,
    definition_writer: &'a DefinitionWriter,
    hook: Option<&'a DefinitionHook>,
}

/// Elements of a definitions array and what they need.
#[derive(Default)]
struct Elements {
    elements: Vec<Expr>,
    dependencies: DependencySet,
    imports: ImportSet,
}

/// One declaration with the imports it needs.
struct Emitted {
    declaration: Declaration,
    imports: ImportSet,
}

/// What every category needs to know about the operation being assembled.
struct Scope<'a> {
    api: &'a ApiSource,
    operation: &'a ClientOperation,
    root: &'a NamedSchema,
    list: &'a ListOptions,
    config: &'a TableConfig,
}

impl<'a> Scope<'a> {
    /// Resolves a field path against the root entity, warning when it does
    /// not exist.
    fn resolve(&self, field: &EnumOption) -> Result<Option<ResolvedField<'a>>, TableConfigError> {
        let resolved = self.api.resolve_field(self.root, &field.name)?;

        if resolved.is_none() {
            warn!(
                operation = %self.operation.generated_name,
                field = %field.name,
                "field path not found on root entity"
            );
        }

        Ok(resolved)
    }

    fn types_import_path(&self) -> &'a str {
        &self.config.types_import_path
    }

    /// Writes one element per field of `fields`, then runs the hook on it.
    fn elements(&self, fields: &GeneratedEnum, writers: Writers<'_>) -> Result<Elements, TableConfigError> {
        let mut out = Elements::default();

        for field in &fields.options {
            let resolved = self.resolve(field)?;
            let ctx = BuildContext {
                operation: self.operation,
                field_enum: fields.view(),
                field,
                schema: resolved.map(|resolved| resolved.schema),
                generated: resolved.and_then(|resolved| resolved.generated),
                types_import_path: self.types_import_path(),
                builders: writers.builders,
                label_writer: writers.label_writer,
            };

            let mut built = (writers.definition_writer)(&ctx);
            if built.definition.is_none() {
                continue;
            }

            if let Some(hook) = writers.hook {
                built = hook(&ctx, built);
            }
            let Some(definition) = built.definition else {
                debug!(field = %field.name, category = writers.category, "definition discarded by hook");
                continue;
            };

            out.elements.push(definition);
            out.dependencies.extend(built.dependencies);
            out.imports.extend(built.imports);
        }

        Ok(out)
    }

    /// Wraps definition elements into a constant or, when dependencies were
    /// injected, a factory declaration.
    fn definitions(
        &self,
        name_writer: &NameWriter,
        type_reference: &TypeReferenceWriter,
        fields: EnumRef<'_>,
        elements: Elements,
    ) -> Emitted {
        let Elements {
            elements,
            dependencies,
            mut imports,
        } = elements;
        let is_factory = !dependencies.is_empty();
        let name = name_writer(self.operation, is_factory);
        let reference = type_reference(self.operation, fields);

        imports.extend(reference.imports);
        import_generated(&mut imports, self.types_import_path(), fields);

        let value = Expr::array_multiline(elements);
        let declaration = if is_factory {
            Declaration::factory(name, dependencies.into_parameters(), Some(reference.type_node), value)
        } else {
            Declaration::constant(name, Some(reference.type_node), value)
        };

        Emitted {
            declaration,
            imports,
        }
    }
}

/// Imports a generated enum: as a value when members are accessed through
/// it, type-only for string-literal unions.
fn import_generated(imports: &mut ImportSet, types_import_path: &str, generated: EnumRef<'_>) {
    if generated.is_declaration() {
        imports.add_value(types_import_path, generated.generated_name);
    } else {
        imports.add_type(types_import_path, generated.generated_name);
    }
}

/// Assembles every declaration of one operation.
///
/// ## Returns
/// An empty [`Assembled`] for operations without a root entity or list
/// options.
///
/// ## Errors
/// Returns an error if the operation's root entity or a field reference is
/// malformed.
pub fn assemble_operation(
    api: &ApiSource,
    operation: &ClientOperation,
    config: &TableConfig,
) -> Result<Assembled, TableConfigError> {
    let mut assembled = Assembled::default();

    let Some(list) = operation.list.as_ref() else {
        return Ok(assembled);
    };
    let Some(root) = api.root_entity(operation)? else {
        return Ok(assembled);
    };

    let scope = Scope {
        api,
        operation,
        root,
        list,
        config,
    };

    assembled.push(sort::default_sorts(&scope));
    assembled.push(search::search_definitions(&scope)?);
    assembled.push(defaults::default_filters(&scope)?);
    assembled.push(filter::filter_definitions(&scope)?);

    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const API: &str = r#"{
        "schemas": {
            "Book": {
                "generatedName": "Book",
                "schema": { "object": { "properties": [
                    { "name": "title", "schema": { "string": {} } },
                    { "name": "updatedAt", "schema": { "timestamp": {} } }
                ] } }
            }
        },
        "operations": [{
            "generatedName": "listBooks",
            "rootEntity": "Book",
            "list": {
                "filterableFields": {
                    "generatedName": "ListBooksFilterFields",
                    "options": [{ "name": "title" }, { "name": "shelf" }],
                    "generatedValueNames": { "title": "Title", "shelf": "Shelf" }
                },
                "sortableFields": {
                    "generatedName": "ListBooksSortFields",
                    "options": [{ "name": "updatedAt" }],
                    "generatedValueNames": { "updatedAt": "UpdatedAt" }
                },
                "defaultSorts": { "updatedAt": "asc" }
            }
        }]
    }"#;

    fn names(assembled: &Assembled) -> Vec<&str> {
        assembled.declarations.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    #[tracing_test::traced_test]
    fn missing_field_paths_are_skipped_with_a_warning() {
        let api = ApiSource::from_json(API).unwrap();
        let assembled = assemble_operation(&api, &api.operations[0], &TableConfig::default()).unwrap();

        assert_eq!(names(&assembled), vec!["LIST_BOOKS_DEFAULT_SORTS", "ListBooksFilters"]);
        let filters = assembled.declarations[1].render();
        assert!(filters.contains("ListBooksFilterFields.Title"));
        assert!(!filters.contains("Shelf"));
        assert!(logs_contain("field path not found on root entity"));
    }

    #[test]
    fn operations_without_lists_assemble_nothing() {
        let api = ApiSource::from_json(
            r#"{ "operations": [{ "generatedName": "getBook", "rootEntity": "Book" }] }"#,
        )
        .unwrap();

        let assembled = assemble_operation(&api, &api.operations[0], &TableConfig::default()).unwrap();
        assert!(assembled.is_empty());
    }

    #[test]
    fn discarding_hook_removes_the_declaration_and_its_imports() {
        let api = ApiSource::from_json(API).unwrap();
        let mut config = TableConfig::default();
        config.sort.after_build_initial_values = Some(std::sync::Arc::new(
            |_: &ClientOperation, _: Declaration| -> Option<Declaration> { None },
        ));

        let assembled = assemble_operation(&api, &api.operations[0], &config).unwrap();

        assert_eq!(names(&assembled), vec!["ListBooksFilters"]);
        assert!(!assembled.imports.contains(crate::config::REACT_TABLE_STATE_PSM_IMPORT_PATH, "SortingState"));
        assert!(!assembled.imports.contains("./types", "ListBooksSortFields"));
    }
}
