//! Definition builders: one per [`FieldVariant`].
//!
//! A builder turns a classified field into the `type` payload of a filter
//! definition, e.g. `{ date: { allowTime: true } }`. Builders never mutate
//! shared state. Everything a builder needs beyond the literal itself (runtime
//! dependencies, imports) is returned alongside it in a [`Built`], and the
//! assembler folds those into the declaration.
//!
//! ## Overriding a builder
//!
//! ```ignore
//! let builders = DefinitionBuilders::default().with(FieldVariant::Enum, |ctx| {
//!     Built::new(Expr::raw("{ enum: { options: locale.options } }"))
//!         .inject("locale", TypeNode::reference("Locale"))
//! });
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::FieldVariant;
use crate::naming::{self, LabelWriter, OptionLabelWriter};
use crate::schema::{ClientOperation, EnumOption, EnumRef, NamedSchema, Schema};
use crate::ts::{Expr, ImportSet, Parameter, TypeNode};

/// Filter type keys understood by `@pentops/react-table-state-psm`.
pub const FILTER_TYPE_ENUM: &str = "enum";
pub const FILTER_TYPE_ONE_OF: &str = "oneOf";
pub const FILTER_TYPE_DATE: &str = "date";
pub const FILTER_TYPE_NUMERIC: &str = "numeric";
pub const FILTER_TYPE_STRING: &str = "string";
pub const FILTER_TYPE_BOOLEAN: &str = "boolean";

/// Everything known about one field while its definition is built.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub operation: &'a ClientOperation,
    /// The field set (filterable or searchable fields) the field belongs to.
    pub field_enum: EnumRef<'a>,
    pub field: &'a EnumOption,
    /// The field's schema, when the path resolved.
    pub schema: Option<&'a Schema>,
    /// The named schema the field refers to, e.g. the enum of a status field.
    pub generated: Option<&'a NamedSchema>,
    pub types_import_path: &'a str,
    pub builders: &'a DefinitionBuilders,
    pub label_writer: &'a LabelWriter,
}

impl BuildContext<'_> {
    /// The expression identifying this field in the field set.
    pub fn id_expression(&self) -> Option<Expr> {
        self.field_enum.resolve(&self.field.name)
    }

    /// The field's label as a string literal, or its id expression when the
    /// label writer declines.
    pub fn label_expression(&self) -> Option<Expr> {
        (self.label_writer)(self)
            .map(Expr::string)
            .or_else(|| self.id_expression())
    }
}

/// The output of a builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Built {
    /// `None` when the builder declines the field.
    pub definition: Option<Expr>,
    pub dependencies: DependencySet,
    pub imports: ImportSet,
}

impl Built {
    pub fn new(definition: Expr) -> Self {
        Self {
            definition: Some(definition),
            ..Self::default()
        }
    }

    pub fn declined() -> Self {
        Self::default()
    }

    /// Requests a runtime value `name: type_node` from the caller of the
    /// emitted declaration, turning it into a factory.
    pub fn inject(mut self, name: impl Into<String>, type_node: impl Into<TypeNode>) -> Self {
        self.dependencies.insert(name, type_node);
        self
    }

    pub fn with_imports(mut self, imports: ImportSet) -> Self {
        self.imports.extend(imports);
        self
    }
}

/// Runtime parameters requested by builders, in first-injection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    parameters: Vec<Parameter>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. Re-injecting a name keeps its position and takes the
    /// latest type.
    pub fn insert(&mut self, name: impl Into<String>, type_node: impl Into<TypeNode>) {
        let name = name.into();
        let type_node = type_node.into();

        match self.parameters.iter_mut().find(|parameter| parameter.name == name) {
            Some(existing) => existing.type_node = type_node,
            None => self.parameters.push(Parameter::new(name, type_node)),
        }
    }

    pub fn extend(&mut self, other: DependencySet) {
        for parameter in other.parameters {
            self.insert(parameter.name, parameter.type_node);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }
}

pub type DefinitionBuilder = Arc<dyn Fn(&BuildContext<'_>) -> Built + Send + Sync>;

/// The builder table plus the label writers builders use for options.
#[derive(Clone)]
pub struct DefinitionBuilders {
    builders: BTreeMap<FieldVariant, DefinitionBuilder>,
    pub enum_option_label: OptionLabelWriter,
    pub one_of_option_label: OptionLabelWriter,
}

impl Default for DefinitionBuilders {
    fn default() -> Self {
        let mut builders: BTreeMap<FieldVariant, DefinitionBuilder> = BTreeMap::new();

        builders.insert(FieldVariant::Any, Arc::new(|_: &BuildContext<'_>| string_filter()));
        builders.insert(FieldVariant::Polymorphic, Arc::new(|_: &BuildContext<'_>| string_filter()));
        builders.insert(FieldVariant::Date, Arc::new(|_: &BuildContext<'_>| date_filter(false)));
        builders.insert(FieldVariant::Timestamp, Arc::new(|_: &BuildContext<'_>| date_filter(true)));
        builders.insert(FieldVariant::Decimal, Arc::new(|_: &BuildContext<'_>| numeric_filter()));
        builders.insert(FieldVariant::String, Arc::new(|_: &BuildContext<'_>| string_filter()));
        builders.insert(FieldVariant::Key, Arc::new(|_: &BuildContext<'_>| string_filter()));
        builders.insert(FieldVariant::OneOf, Arc::new(one_of_filter));
        builders.insert(FieldVariant::Enum, Arc::new(enum_filter));
        builders.insert(FieldVariant::Boolean, Arc::new(|_: &BuildContext<'_>| boolean_filter()));
        builders.insert(FieldVariant::Integer, Arc::new(|_: &BuildContext<'_>| numeric_filter()));
        builders.insert(FieldVariant::Float, Arc::new(|_: &BuildContext<'_>| numeric_filter()));

        Self {
            builders,
            enum_option_label: naming::default_option_label_writer(),
            one_of_option_label: naming::default_option_label_writer(),
        }
    }
}

impl fmt::Debug for DefinitionBuilders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionBuilders")
            .field("variants", &self.builders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DefinitionBuilders {
    /// Replaces the builder of a single variant.
    pub fn with<F>(mut self, variant: FieldVariant, builder: F) -> Self
    where
        F: Fn(&BuildContext<'_>) -> Built + Send + Sync + 'static,
    {
        self.builders.insert(variant, Arc::new(builder));
        self
    }

    pub fn with_enum_option_label<F>(mut self, writer: F) -> Self
    where
        F: Fn(&EnumOption) -> Option<String> + Send + Sync + 'static,
    {
        self.enum_option_label = Arc::new(writer);
        self
    }

    pub fn with_one_of_option_label<F>(mut self, writer: F) -> Self
    where
        F: Fn(&EnumOption) -> Option<String> + Send + Sync + 'static,
    {
        self.one_of_option_label = Arc::new(writer);
        self
    }

    /// Runs the builder registered for `variant`.
    pub fn build(&self, variant: FieldVariant, ctx: &BuildContext<'_>) -> Built {
        match self.builders.get(&variant) {
            Some(builder) => builder(ctx),
            None => Built::declined(),
        }
    }
}

/// `{ <kind>: {} }`
fn marker(kind: &str) -> Built {
    Built::new(Expr::object([(kind, Expr::empty_object())]))
}

fn string_filter() -> Built {
    marker(FILTER_TYPE_STRING)
}

fn numeric_filter() -> Built {
    marker(FILTER_TYPE_NUMERIC)
}

fn boolean_filter() -> Built {
    marker(FILTER_TYPE_BOOLEAN)
}

fn date_filter(allow_time: bool) -> Built {
    Built::new(Expr::object_multiline([(
        FILTER_TYPE_DATE,
        Expr::object([("allowTime", Expr::boolean(allow_time))]),
    )]))
}

fn enum_filter(ctx: &BuildContext<'_>) -> Built {
    let source = ctx.generated.and_then(NamedSchema::as_enum);
    options_filter(ctx, FILTER_TYPE_ENUM, source, &ctx.builders.enum_option_label)
}

fn one_of_filter(ctx: &BuildContext<'_>) -> Built {
    let source = ctx.generated.and_then(NamedSchema::one_of_type_enum);
    options_filter(ctx, FILTER_TYPE_ONE_OF, source, &ctx.builders.one_of_option_label)
}

/// `{ <kind>: { options: [{ value, label }, ...] } }` in declaration order.
///
/// Options without a generated member or a label are skipped.
fn options_filter(
    ctx: &BuildContext<'_>,
    kind: &str,
    source: Option<EnumRef<'_>>,
    label_writer: &OptionLabelWriter,
) -> Built {
    let mut options = Vec::new();
    let mut imports = ImportSet::new();

    if let Some(source) = source {
        for option in source.options {
            let Some(value) = source.resolve(&option.name) else {
                tracing::debug!(option = %option.name, source = %source.generated_name, "skipping option without a generated member");
                continue;
            };
            let Some(label) = label_writer(option) else {
                continue;
            };

            if source.is_declaration() {
                imports.add_value(ctx.types_import_path, source.generated_name);
            }

            options.push(Expr::object([
                ("value", value),
                ("label", Expr::string(label)),
            ]));
        }
    }

    Built::new(Expr::object_multiline([(
        kind,
        Expr::object_multiline([("options", Expr::array_multiline(options))]),
    )]))
    .with_imports(imports)
}
