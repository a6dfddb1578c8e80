use tracing::debug;

use super::{Emitted, Scope, import_generated};
use crate::config::REACT_TABLE_STATE_PSM_IMPORT_PATH;
use crate::dispatch::{FieldVariant, classify};
use crate::error::TableConfigError;
use crate::schema::{EnumRef, NamedSchema, ResolvedField};
use crate::ts::{Declaration, Expr, ImportSet, TypeNode};

/// `{ exact: v }` for a single value, `{ in: [...] }` for several.
fn exact_or_in(mut values: Vec<Expr>) -> Option<Expr> {
    match values.len() {
        0 => None,
        1 => values.pop().map(|value| Expr::object([("exact", value)])),
        _ => Some(Expr::object([("in", Expr::array(values))])),
    }
}

/// Resolves raw default tokens into the filter value of a field.
///
/// Tokens that do not resolve are dropped.
///
/// ## Returns
/// The value expression plus the generated enum it references, or `None`
/// when the field's kind takes no default or no token resolved.
pub(super) fn default_value<'a>(
    field: ResolvedField<'a>,
    tokens: &[String],
) -> Option<(Expr, Option<EnumRef<'a>>)> {
    let variant = classify(field.schema)?;

    match variant {
        FieldVariant::String
        | FieldVariant::Key
        | FieldVariant::Date
        | FieldVariant::Timestamp
        | FieldVariant::Decimal
        | FieldVariant::Integer
        | FieldVariant::Float => {
            exact_or_in(tokens.iter().map(Expr::string).collect()).map(|value| (value, None))
        }
        FieldVariant::Boolean => {
            let token = tokens.first()?;
            let value = Expr::boolean(token.eq_ignore_ascii_case("true"));
            Some((Expr::object([("exact", value)]), None))
        }
        FieldVariant::Enum | FieldVariant::OneOf => {
            let source = if variant == FieldVariant::Enum {
                field.generated.and_then(NamedSchema::as_enum)
            } else {
                field.generated.and_then(NamedSchema::one_of_type_enum)
            }?;

            let values: Vec<Expr> = tokens
                .iter()
                .filter_map(|token| {
                    let value = source.resolve(token);
                    if value.is_none() {
                        debug!(token = %token, source = %source.generated_name, "dropping unresolved default token");
                    }
                    value
                })
                .collect();

            exact_or_in(values).map(|value| (value, Some(source)))
        }
        FieldVariant::Any | FieldVariant::Polymorphic => None,
    }
}

/// `export const LIST_BOOKS_DEFAULT_FILTERS: FilterState<Fields> = [...]`,
/// one element per filterable field with default tokens.
pub(super) fn default_filters(scope: &Scope<'_>) -> Result<Option<Emitted>, TableConfigError> {
    let Some(fields) = scope.list.filterable_fields.as_ref() else {
        return Ok(None);
    };
    let config = &scope.config.filter;

    let mut elements = Vec::new();
    let mut imports = ImportSet::new();

    for field in &fields.options {
        let Some(tokens) = scope.list.default_filters.get(&field.name) else {
            continue;
        };
        if tokens.is_empty() {
            continue;
        }

        let Some(id) = fields.view().resolve(&field.name) else {
            continue;
        };
        let Some(resolved) = scope.resolve(field)? else {
            continue;
        };
        let Some((value, source)) = default_value(resolved, tokens) else {
            debug!(field = %field.name, "no default filter value");
            continue;
        };

        if let Some(source) = source {
            import_generated(&mut imports, scope.types_import_path(), source);
        }

        let filter = Expr::object([("id", id), ("value", value)]);
        elements.push(Expr::object_multiline([(
            "type",
            Expr::object_multiline([("filters", Expr::array([filter]))]),
        )]));
    }

    if elements.is_empty() {
        return Ok(None);
    }

    let declaration = Declaration::constant(
        (config.initial_values_name)(scope.operation, false),
        Some(TypeNode::generic(
            "FilterState",
            vec![TypeNode::reference(&fields.generated_name)],
        )),
        Expr::array_multiline(elements),
    );

    let declaration = match &config.after_build_initial_values {
        Some(hook) => match hook(scope.operation, declaration) {
            Some(declaration) => declaration,
            None => return Ok(None),
        },
        None => declaration,
    };

    imports.add_type(REACT_TABLE_STATE_PSM_IMPORT_PATH, "FilterState");
    import_generated(&mut imports, scope.types_import_path(), fields.view());

    Ok(Some(Emitted {
        declaration,
        imports,
    }))
}
