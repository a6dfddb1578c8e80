//! Expression and type nodes for the emitted TypeScript.

/// A TypeScript expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Identifier(String),
    /// `object.property`
    PropertyAccess { object: Box<Expr>, property: String },
    String(String),
    Number(String),
    Boolean(bool),
    Object {
        properties: Vec<Property>,
        multiline: bool,
    },
    Array {
        elements: Vec<Expr>,
        multiline: bool,
    },
    /// `(a: A, b: B) => body`
    Arrow {
        parameters: Vec<Parameter>,
        body: Box<Expr>,
    },
    /// Verbatim source text, used by hooks and custom builders.
    Raw(String),
}

/// A `name: value` pair inside an object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: Expr,
}

/// A typed parameter of an arrow function or function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_node: TypeNode,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_node: TypeNode) -> Self {
        Self {
            name: name.into(),
            type_node,
        }
    }
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Builds `object.property` where `object` is a plain identifier.
    pub fn member(object: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyAccess {
            object: Box::new(Self::Identifier(object.into())),
            property: property.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::Number(value.into())
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// An object literal printed on a single line.
    pub fn object<N: Into<String>>(properties: impl IntoIterator<Item = (N, Expr)>) -> Self {
        Self::Object {
            properties: collect_properties(properties),
            multiline: false,
        }
    }

    /// An object literal printed with one property per line.
    pub fn object_multiline<N: Into<String>>(
        properties: impl IntoIterator<Item = (N, Expr)>,
    ) -> Self {
        Self::Object {
            properties: collect_properties(properties),
            multiline: true,
        }
    }

    /// The empty object literal `{}`.
    pub fn empty_object() -> Self {
        Self::Object {
            properties: Vec::new(),
            multiline: false,
        }
    }

    pub fn array(elements: impl IntoIterator<Item = Expr>) -> Self {
        Self::Array {
            elements: elements.into_iter().collect(),
            multiline: false,
        }
    }

    pub fn array_multiline(elements: impl IntoIterator<Item = Expr>) -> Self {
        Self::Array {
            elements: elements.into_iter().collect(),
            multiline: true,
        }
    }

    pub fn arrow(parameters: Vec<Parameter>, body: Expr) -> Self {
        Self::Arrow {
            parameters,
            body: Box::new(body),
        }
    }

    /// Looks up a property of an object literal by name.
    pub fn property(&self, name: &str) -> Option<&Expr> {
        match self {
            Self::Object { properties, .. } => properties
                .iter()
                .find(|property| property.name == name)
                .map(|property| &property.value),
            _ => None,
        }
    }

    /// Returns the elements of an array literal.
    pub fn elements(&self) -> Option<&[Expr]> {
        match self {
            Self::Array { elements, .. } => Some(elements),
            _ => None,
        }
    }
}

fn collect_properties<N: Into<String>>(
    properties: impl IntoIterator<Item = (N, Expr)>,
) -> Vec<Property> {
    properties
        .into_iter()
        .map(|(name, value)| Property {
            name: name.into(),
            value,
        })
        .collect()
}

/// A TypeScript type annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    /// `Name` or `Name<A, B>`
    Reference {
        name: String,
        arguments: Vec<TypeNode>,
    },
    /// Built-in keyword types such as `string` or `boolean`.
    Keyword(String),
    /// `T[]`
    Array(Box<TypeNode>),
    /// `(a: A) => R`
    Function {
        parameters: Vec<Parameter>,
        returns: Box<TypeNode>,
    },
}

impl TypeNode {
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, arguments: Vec<TypeNode>) -> Self {
        Self::Reference {
            name: name.into(),
            arguments,
        }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::Keyword(name.into())
    }

    pub fn array(element: TypeNode) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn function(parameters: Vec<Parameter>, returns: TypeNode) -> Self {
        Self::Function {
            parameters,
            returns: Box::new(returns),
        }
    }
}

impl From<&str> for TypeNode {
    fn from(name: &str) -> Self {
        Self::reference(name)
    }
}

impl From<String> for TypeNode {
    fn from(name: String) -> Self {
        Self::reference(name)
    }
}
