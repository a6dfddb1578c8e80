use tracing::debug;

use super::{Emitted, Scope, Writers};
use crate::builders::{BuildContext, Built};
use crate::dispatch::classify;
use crate::error::TableConfigError;
use crate::ts::Expr;

/// `{ id, label, type: { <kind>: ... } }` for one filterable field.
///
/// The `type` payload comes from the builder registered for the field's
/// variant. The label falls back to the id expression when the label writer
/// declines.
pub fn filter_definition(ctx: &BuildContext<'_>) -> Built {
    let Some(id) = ctx.id_expression() else {
        debug!(field = %ctx.field.name, "no generated member for filterable field");
        return Built::declined();
    };
    let Some(schema) = ctx.schema else {
        return Built::declined();
    };
    let Some(variant) = classify(schema) else {
        debug!(field = %ctx.field.name, "filterable field has no filter kind");
        return Built::declined();
    };

    let built = ctx.builders.build(variant, ctx);
    let Some(filter_type) = built.definition else {
        debug!(field = %ctx.field.name, ?variant, "builder declined field");
        return Built::declined();
    };

    let label = ctx.label_expression().unwrap_or_else(|| id.clone());

    Built {
        definition: Some(Expr::object_multiline([
            ("id", id),
            ("label", label),
            ("type", filter_type),
        ])),
        dependencies: built.dependencies,
        imports: built.imports,
    }
}

pub(super) fn filter_definitions(scope: &Scope<'_>) -> Result<Option<Emitted>, TableConfigError> {
    let Some(fields) = scope.list.filterable_fields.as_ref() else {
        return Ok(None);
    };
    let config = &scope.config.filter;

    let elements = scope.elements(
        fields,
        Writers {
            category: "filter",
            builders: &config.builders,
            label_writer: &config.label_writer,
            definition_writer: &config.definition_writer,
            hook: config.after_build_definition.as_ref(),
        },
    )?;

    if elements.elements.is_empty() {
        return Ok(None);
    }

    Ok(Some(scope.definitions(
        &config.definition_name,
        &config.type_reference,
        fields.view(),
        elements,
    )))
}
