//! The schema graph handed over by the host framework.
//!
//! The host parses the raw API description and generates the TypeScript
//! types; this module only mirrors the parts of its output the table
//! configuration needs: named schemas with their generated names, and the
//! list options (filterable/searchable/sortable fields, defaults) of every
//! generated client operation.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "schemas": {
//!     "library.v1.Book": {
//!       "generatedName": "Book",
//!       "schema": { "object": { "properties": [
//!         { "name": "status", "schema": { "ref": "library.v1.BookStatus" } }
//!       ] } }
//!     }
//!   },
//!   "operations": [{ "generatedName": "listBooks", "rootEntity": "library.v1.Book" }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TableConfigError;
use crate::ts::Expr;

/// Everything the generator reads from the host framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSource {
    #[serde(default)]
    pub schemas: BTreeMap<String, NamedSchema>,
    #[serde(default)]
    pub operations: Vec<ClientOperation>,
}

/// A schema the host generated a named TypeScript declaration for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedSchema {
    pub generated_name: String,
    #[serde(default)]
    pub representation: EnumRepresentation,
    /// Raw enum value name to generated member name.
    #[serde(default)]
    pub generated_value_names: BTreeMap<String, String>,
    /// The implicit enum of tag values of a `oneOf` schema.
    #[serde(default)]
    pub derived_one_of_type_enum: Option<GeneratedEnum>,
    pub schema: Schema,
}

/// How a generated enum is declared in TypeScript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumRepresentation {
    /// `enum Name { Member = 'VALUE' }`; members are referenced as `Name.Member`.
    #[default]
    Enum,
    /// `type Name = 'A' | 'B'`; members are referenced as string literals.
    Union,
}

/// A generated enum that is not itself a field schema: field sets and derived
/// `oneOf` discriminants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedEnum {
    pub generated_name: String,
    #[serde(default)]
    pub representation: EnumRepresentation,
    #[serde(default)]
    pub options: Vec<EnumOption>,
    #[serde(default)]
    pub generated_value_names: BTreeMap<String, String>,
}

/// One declared option of an enum, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumOption {
    pub name: String,
}

impl EnumOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A field schema variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Schema {
    String {
        #[serde(default)]
        format: Option<String>,
    },
    Key {
        #[serde(default)]
        format: Option<String>,
    },
    Bool {},
    Integer {
        #[serde(default)]
        format: Option<String>,
    },
    Float {
        #[serde(default)]
        format: Option<String>,
    },
    Decimal {},
    Date {},
    Timestamp {},
    Enum {
        #[serde(default)]
        options: Vec<EnumOption>,
    },
    OneOf {
        #[serde(default)]
        properties: Vec<ObjectProperty>,
    },
    Polymorph {
        #[serde(default)]
        types: Vec<String>,
    },
    Any {},
    Object {
        #[serde(default)]
        properties: Vec<ObjectProperty>,
    },
    Array {
        items: Box<Schema>,
    },
    /// Reference to an entry of [`ApiSource::schemas`] by full name.
    Ref(String),
}

impl Schema {
    pub fn string() -> Self {
        Self::String { format: None }
    }

    pub fn string_with_format(format: impl Into<String>) -> Self {
        Self::String {
            format: Some(format.into()),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    /// The `format` annotation of a string-like schema.
    pub fn format(&self) -> Option<&str> {
        match self {
            Self::String { format }
            | Self::Key { format }
            | Self::Integer { format }
            | Self::Float { format } => format.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectProperty {
    pub name: String,
    pub schema: Schema,
}

impl ObjectProperty {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// A generated client function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOperation {
    /// The generated function name, e.g. `listBooks`.
    pub generated_name: String,
    /// Full name of the entity schema the operation lists.
    #[serde(default)]
    pub root_entity: Option<String>,
    #[serde(default)]
    pub list: Option<ListOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(default)]
    pub filterable_fields: Option<GeneratedEnum>,
    #[serde(default)]
    pub searchable_fields: Option<GeneratedEnum>,
    #[serde(default)]
    pub sortable_fields: Option<GeneratedEnum>,
    /// Field name to raw default tokens.
    #[serde(default)]
    pub default_filters: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub default_sorts: BTreeMap<String, SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A borrowed view over any generated enum, whichever structure it came from.
#[derive(Debug, Clone, Copy)]
pub struct EnumRef<'a> {
    pub generated_name: &'a str,
    pub representation: EnumRepresentation,
    pub options: &'a [EnumOption],
    pub generated_value_names: &'a BTreeMap<String, String>,
}

impl<'a> EnumRef<'a> {
    /// Whether the enum is a TypeScript enum declaration that must be imported
    /// as a value.
    pub fn is_declaration(&self) -> bool {
        self.representation == EnumRepresentation::Enum
    }

    /// Builds the expression referencing the generated member `key_name`.
    pub fn id_expression(&self, key_name: &str) -> Expr {
        match self.representation {
            EnumRepresentation::Enum => Expr::member(self.generated_name, key_name),
            EnumRepresentation::Union => Expr::string(key_name),
        }
    }

    /// Resolves a raw option name to the expression of its generated member.
    pub fn resolve(&self, raw_name: &str) -> Option<Expr> {
        self.generated_value_names
            .get(raw_name)
            .map(|key_name| self.id_expression(key_name))
    }
}

impl GeneratedEnum {
    pub fn view(&self) -> EnumRef<'_> {
        EnumRef {
            generated_name: &self.generated_name,
            representation: self.representation,
            options: &self.options,
            generated_value_names: &self.generated_value_names,
        }
    }
}

impl NamedSchema {
    /// Views this schema as an enum, if it is one.
    pub fn as_enum(&self) -> Option<EnumRef<'_>> {
        match &self.schema {
            Schema::Enum { options } => Some(EnumRef {
                generated_name: &self.generated_name,
                representation: self.representation,
                options,
                generated_value_names: &self.generated_value_names,
            }),
            _ => None,
        }
    }

    /// The derived discriminant enum of a `oneOf` schema.
    pub fn one_of_type_enum(&self) -> Option<EnumRef<'_>> {
        match &self.schema {
            Schema::OneOf { .. } => self.derived_one_of_type_enum.as_ref().map(GeneratedEnum::view),
            _ => None,
        }
    }
}

/// A field path resolved against an operation's root entity.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    /// The field's schema with references followed.
    pub schema: &'a Schema,
    /// The named schema the field refers to, when the host generated one.
    pub generated: Option<&'a NamedSchema>,
}

impl ApiSource {
    /// Parses the host's JSON representation.
    ///
    /// ## Errors
    /// Returns an error if the JSON does not match the schema graph format.
    pub fn from_json(text: &str) -> Result<Self, TableConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Looks up a named schema by full name.
    ///
    /// ## Errors
    /// Returns [`TableConfigError::UnknownSchema`] for names not in the graph.
    pub fn schema(&self, name: &str) -> Result<&NamedSchema, TableConfigError> {
        self.schemas
            .get(name)
            .ok_or_else(|| TableConfigError::UnknownSchema {
                name: name.to_string(),
            })
    }

    /// Returns the root entity of an operation.
    ///
    /// ## Returns
    /// `None` when the operation does not list an entity.
    ///
    /// ## Errors
    /// Returns an error if the root entity is undefined or not an object.
    pub fn root_entity(
        &self,
        operation: &ClientOperation,
    ) -> Result<Option<&NamedSchema>, TableConfigError> {
        let Some(name) = operation.root_entity.as_deref() else {
            return Ok(None);
        };

        let named = self.schema(name)?;
        let (schema, _) = self.follow_refs(&named.schema, Some(named))?;

        match schema {
            Schema::Object { .. } => Ok(Some(named)),
            _ => Err(TableConfigError::InvalidRootEntity {
                operation: operation.generated_name.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Resolves a dotted field path (e.g. `author.name`) against `root`.
    ///
    /// References are followed and repeated fields resolve to their element
    /// schema.
    ///
    /// ## Returns
    /// `None` when the path does not exist in the graph.
    ///
    /// ## Errors
    /// Returns an error if a reference along the path is dangling or cyclic.
    pub fn resolve_field<'a>(
        &'a self,
        root: &'a NamedSchema,
        path: &str,
    ) -> Result<Option<ResolvedField<'a>>, TableConfigError> {
        let mut current: &Schema = &root.schema;
        let mut generated: Option<&NamedSchema> = Some(root);

        for segment in path.split('.') {
            let (schema, _) = self.element_schema(current, generated)?;

            let properties = match schema {
                Schema::Object { properties } | Schema::OneOf { properties } => properties,
                _ => return Ok(None),
            };

            let Some(property) = properties.iter().find(|property| property.name == segment)
            else {
                return Ok(None);
            };

            current = &property.schema;
            generated = None;
        }

        let (schema, generated) = self.element_schema(current, generated)?;

        Ok(Some(ResolvedField { schema, generated }))
    }

    /// Follows references, then unwraps arrays down to their element type.
    fn element_schema<'a>(
        &'a self,
        schema: &'a Schema,
        generated: Option<&'a NamedSchema>,
    ) -> Result<(&'a Schema, Option<&'a NamedSchema>), TableConfigError> {
        let (mut schema, mut generated) = self.follow_refs(schema, generated)?;

        while let Schema::Array { items } = schema {
            (schema, generated) = self.follow_refs(items, None)?;
        }

        Ok((schema, generated))
    }

    fn follow_refs<'a>(
        &'a self,
        schema: &'a Schema,
        generated: Option<&'a NamedSchema>,
    ) -> Result<(&'a Schema, Option<&'a NamedSchema>), TableConfigError> {
        let mut schema = schema;
        let mut generated = generated;
        let mut hops = 0;

        while let Schema::Ref(name) = schema {
            if hops > self.schemas.len() {
                return Err(TableConfigError::CyclicReference { name: name.clone() });
            }

            let named = self.schema(name)?;
            schema = &named.schema;
            generated = Some(named);
            hops += 1;
        }

        Ok((schema, generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> ApiSource {
        ApiSource::from_json(
            r#"{
              "schemas": {
                "library.v1.Book": {
                  "generatedName": "Book",
                  "schema": { "object": { "properties": [
                    { "name": "title", "schema": { "string": {} } },
                    { "name": "status", "schema": { "ref": "library.v1.BookStatus" } },
                    { "name": "author", "schema": { "ref": "library.v1.Author" } },
                    { "name": "tags", "schema": { "array": { "items": { "ref": "library.v1.BookStatus" } } } }
                  ] } }
                },
                "library.v1.Author": {
                  "generatedName": "Author",
                  "schema": { "object": { "properties": [
                    { "name": "born", "schema": { "string": { "format": "date" } } }
                  ] } }
                },
                "library.v1.BookStatus": {
                  "generatedName": "BookStatus",
                  "generatedValueNames": { "ACTIVE": "Active" },
                  "schema": { "enum": { "options": [{ "name": "ACTIVE" }] } }
                },
                "library.v1.Broken": {
                  "generatedName": "Broken",
                  "schema": { "object": { "properties": [
                    { "name": "missing", "schema": { "ref": "library.v1.Nope" } }
                  ] } }
                }
              },
              "operations": [
                { "generatedName": "listBooks", "rootEntity": "library.v1.Book" },
                { "generatedName": "listStatuses", "rootEntity": "library.v1.BookStatus" }
              ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn deserializes_operations() {
        let api = library();
        assert_eq!(api.operations.len(), 2);
        assert_eq!(api.operations[0].generated_name, "listBooks");
        assert!(api.operations[0].list.is_none());
    }

    #[test]
    fn resolves_nested_path_through_refs() {
        let api = library();
        let root = api.root_entity(&api.operations[0]).unwrap().unwrap();

        let field = api.resolve_field(root, "author.born").unwrap().unwrap();
        assert_eq!(field.schema.format(), Some("date"));
        assert!(field.generated.is_none());
    }

    #[test]
    fn resolved_enum_carries_generated_schema() {
        let api = library();
        let root = api.root_entity(&api.operations[0]).unwrap().unwrap();

        let field = api.resolve_field(root, "status").unwrap().unwrap();
        let generated = field.generated.unwrap();
        assert_eq!(generated.generated_name, "BookStatus");
        assert_eq!(
            generated.as_enum().unwrap().resolve("ACTIVE"),
            Some(Expr::member("BookStatus", "Active"))
        );
    }

    #[test]
    fn repeated_fields_resolve_to_element_type() {
        let api = library();
        let root = api.root_entity(&api.operations[0]).unwrap().unwrap();

        let field = api.resolve_field(root, "tags").unwrap().unwrap();
        assert!(matches!(field.schema, Schema::Enum { .. }));
    }

    #[test]
    fn missing_path_is_not_an_error() {
        let api = library();
        let root = api.root_entity(&api.operations[0]).unwrap().unwrap();

        assert!(api.resolve_field(root, "publisher").unwrap().is_none());
        assert!(api.resolve_field(root, "title.length").unwrap().is_none());
    }

    #[test]
    fn dangling_reference_is_fatal() {
        let api = library();
        let root = api.schema("library.v1.Broken").unwrap();

        let err = api.resolve_field(root, "missing").unwrap_err();
        assert!(matches!(err, TableConfigError::UnknownSchema { name } if name == "library.v1.Nope"));
    }

    #[test]
    fn non_object_root_entity_is_fatal() {
        let api = library();
        let err = api.root_entity(&api.operations[1]).unwrap_err();
        assert!(matches!(err, TableConfigError::InvalidRootEntity { .. }));
    }

    #[test]
    fn union_enums_reference_string_literals() {
        let fields = GeneratedEnum {
            generated_name: "Fields".to_string(),
            representation: EnumRepresentation::Union,
            options: vec![EnumOption::new("title")],
            generated_value_names: BTreeMap::from([("title".to_string(), "title".to_string())]),
        };

        assert_eq!(fields.view().resolve("title"), Some(Expr::string("title")));
        assert_eq!(fields.view().resolve("other"), None);
    }
}
