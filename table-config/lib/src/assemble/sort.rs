use super::{Emitted, Scope, import_generated};
use crate::config::REACT_TABLE_STATE_PSM_IMPORT_PATH;
use crate::schema::SortDirection;
use crate::ts::{Declaration, Expr, ImportSet, TypeNode};

/// `export const LIST_BOOKS_DEFAULT_SORTS: SortingState<Fields> = [{ id, desc }];`
pub(super) fn default_sorts(scope: &Scope<'_>) -> Option<Emitted> {
    let fields = scope.list.sortable_fields.as_ref()?;
    let config = &scope.config.sort;

    let elements: Vec<Expr> = fields
        .options
        .iter()
        .filter_map(|field| {
            let direction = scope.list.default_sorts.get(&field.name)?;
            let id = fields.view().resolve(&field.name)?;

            Some(Expr::object_multiline([
                ("id", id),
                ("desc", Expr::boolean(*direction == SortDirection::Desc)),
            ]))
        })
        .collect();

    if elements.is_empty() {
        return None;
    }

    let declaration = Declaration::constant(
        (config.initial_values_name)(scope.operation, false),
        Some(TypeNode::generic(
            "SortingState",
            vec![TypeNode::reference(&fields.generated_name)],
        )),
        Expr::array_multiline(elements),
    );

    let declaration = match &config.after_build_initial_values {
        Some(hook) => hook(scope.operation, declaration)?,
        None => declaration,
    };

    let mut imports = ImportSet::new().with_type(REACT_TABLE_STATE_PSM_IMPORT_PATH, "SortingState");
    import_generated(&mut imports, scope.types_import_path(), fields.view());

    Some(Emitted {
        declaration,
        imports,
    })
}
