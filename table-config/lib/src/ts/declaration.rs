use super::expr::{Expr, Parameter, TypeNode};
use super::print::{print_expr, print_type};

/// One exported `const` declaration of a generated file.
///
/// A declaration is either a constant (`body` is the value itself) or a
/// factory: an arrow function taking the collected runtime dependencies and
/// returning the value. Factories carry a function type annotation built
/// from the same parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub is_factory: bool,
    pub parameters: Vec<Parameter>,
    pub type_annotation: Option<TypeNode>,
    pub body: Expr,
}

impl Declaration {
    /// `export const name: value_type = value;`
    pub fn constant(name: impl Into<String>, value_type: Option<TypeNode>, value: Expr) -> Self {
        Self {
            name: name.into(),
            is_factory: false,
            parameters: Vec::new(),
            type_annotation: value_type,
            body: value,
        }
    }

    /// `export const name: (params) => value_type = (params) => value;`
    pub fn factory(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        value_type: Option<TypeNode>,
        value: Expr,
    ) -> Self {
        let type_annotation =
            value_type.map(|returns| TypeNode::function(parameters.clone(), returns));

        Self {
            name: name.into(),
            is_factory: true,
            body: Expr::arrow(parameters.clone(), value),
            parameters,
            type_annotation,
        }
    }

    /// The value produced by the declaration: the body itself for constants,
    /// the arrow function's return value for factories.
    pub fn value(&self) -> &Expr {
        match &self.body {
            Expr::Arrow { body, .. } if self.is_factory => body,
            other => other,
        }
    }

    /// Renders the declaration as a single top-level statement.
    pub fn render(&self) -> String {
        let mut out = format!("export const {}", self.name);

        if let Some(type_annotation) = &self.type_annotation {
            out.push_str(": ");
            out.push_str(&print_type(type_annotation));
        }

        out.push_str(" = ");
        out.push_str(&print_expr(&self.body));
        out.push(';');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_constant() {
        let declaration = Declaration::constant(
            "LIST_BOOKS_DEFAULT_SORTS",
            Some(TypeNode::generic(
                "SortingState",
                vec![TypeNode::reference("ListBooksSortFields")],
            )),
            Expr::array_multiline([Expr::object_multiline([
                ("id", Expr::member("ListBooksSortFields", "Title")),
                ("desc", Expr::boolean(false)),
            ])]),
        );

        assert_eq!(
            declaration.render(),
            "export const LIST_BOOKS_DEFAULT_SORTS: SortingState<ListBooksSortFields> = [\n  {\n    id: ListBooksSortFields.Title,\n    desc: false,\n  },\n];"
        );
    }

    #[test]
    fn renders_factory_with_parameters() {
        let declaration = Declaration::factory(
            "getListBooksFilters",
            vec![Parameter::new("locale", TypeNode::keyword("string"))],
            Some(TypeNode::array(TypeNode::reference("Filter"))),
            Expr::array([Expr::identifier("locale")]),
        );

        assert!(declaration.is_factory);
        assert_eq!(declaration.value(), &Expr::array([Expr::identifier("locale")]));
        assert_eq!(
            declaration.render(),
            "export const getListBooksFilters: (locale: string) => Filter[] = (locale: string) => [locale];"
        );
    }
}
