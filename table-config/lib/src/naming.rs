//! Naming policy for emitted declarations and default label text.
//!
//! Every output category gets its own [`NameWriter`] so projects can rename
//! one category without touching the others. Writers are pure: the same
//! operation and factory flag always produce the same identifier.

use std::sync::Arc;

use convert_case::{Case, Casing};

use crate::builders::BuildContext;
use crate::schema::{ClientOperation, EnumOption};

/// Maps an operation and its "is a factory" flag to a declaration name.
pub type NameWriter = Arc<dyn Fn(&ClientOperation, bool) -> String + Send + Sync>;

/// Produces the label of a filterable or searchable field. `None` makes the
/// definition fall back to the field's id expression.
pub type LabelWriter = Arc<dyn Fn(&BuildContext<'_>) -> Option<String> + Send + Sync>;

/// Produces the label of an enum or `oneOf` option.
pub type OptionLabelWriter = Arc<dyn Fn(&EnumOption) -> Option<String> + Send + Sync>;

/// `ListBooksFilters`, or `getListBooksFilters` when the declaration is a
/// factory.
pub fn filter_definitions_name(operation: &ClientOperation, is_factory: bool) -> String {
    category_name(operation, "Filters", is_factory)
}

/// `ListBooksSearchFields`, or `getListBooksSearchFields` for factories.
pub fn search_definitions_name(operation: &ClientOperation, is_factory: bool) -> String {
    category_name(operation, "Search-Fields", is_factory)
}

/// `LIST_BOOKS_DEFAULT_FILTERS`
pub fn default_filters_name(operation: &ClientOperation, _is_factory: bool) -> String {
    format!("{}-Default-Filters", operation.generated_name).to_case(Case::Constant)
}

/// `LIST_BOOKS_DEFAULT_SORTS`
pub fn default_sorts_name(operation: &ClientOperation, _is_factory: bool) -> String {
    format!("{}-Default-Sorts", operation.generated_name).to_case(Case::Constant)
}

fn category_name(operation: &ClientOperation, suffix: &str, is_factory: bool) -> String {
    if is_factory {
        format!("get-{}-{suffix}", operation.generated_name).to_case(Case::Camel)
    } else {
        format!("{}-{suffix}", operation.generated_name).to_case(Case::Pascal)
    }
}

/// Sentence-cases the last segment of a dotted field path:
/// `author.birth_date` becomes `Birth date`.
pub fn field_label(field_name: &str) -> Option<String> {
    let segment = field_name.rsplit('.').next().unwrap_or(field_name);

    if segment.is_empty() {
        return None;
    }

    Some(segment.to_case(Case::Sentence))
}

/// Sentence-cases an option name: `OUT_OF_PRINT` becomes `Out of print`.
pub fn option_label(option: &EnumOption) -> Option<String> {
    field_label(&option.name)
}

pub(crate) fn default_name_writer(
    writer: fn(&ClientOperation, bool) -> String,
) -> NameWriter {
    Arc::new(writer)
}

pub(crate) fn default_label_writer() -> LabelWriter {
    Arc::new(|ctx: &BuildContext<'_>| field_label(&ctx.field.name))
}

pub(crate) fn default_option_label_writer() -> OptionLabelWriter {
    Arc::new(option_label)
}
