use tracing::debug;

use super::{Emitted, Scope, Writers};
use crate::builders::{BuildContext, Built};
use crate::error::TableConfigError;
use crate::ts::Expr;

/// `{ id, label }` for one searchable field.
pub fn search_definition(ctx: &BuildContext<'_>) -> Built {
    let Some(id) = ctx.id_expression() else {
        debug!(field = %ctx.field.name, "no generated member for searchable field");
        return Built::declined();
    };
    let label = ctx.label_expression().unwrap_or_else(|| id.clone());

    Built::new(Expr::object_multiline([("id", id), ("label", label)]))
}

pub(super) fn search_definitions(scope: &Scope<'_>) -> Result<Option<Emitted>, TableConfigError> {
    let Some(fields) = scope.list.searchable_fields.as_ref() else {
        return Ok(None);
    };
    let config = &scope.config.search;

    let elements = scope.elements(
        fields,
        Writers {
            category: "search",
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
