//! Field classification.
//!
//! A field schema is matched against [`DISPATCH_ORDER`] top to bottom and the
//! first predicate that accepts it decides the [`FieldVariant`]. Date,
//! timestamp and decimal values arrive as strings with a `format` annotation,
//! so their predicates must run before the plain string predicate.

use crate::schema::Schema;

/// The semantic kind of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldVariant {
    Any,
    Polymorphic,
    Date,
    Timestamp,
    Decimal,
    String,
    Key,
    OneOf,
    Enum,
    Boolean,
    Integer,
    Float,
}

pub type Predicate = fn(&Schema) -> bool;

/// Predicates in precedence order.
pub const DISPATCH_ORDER: [(FieldVariant, Predicate); 12] = [
    (FieldVariant::Any, is_any),
    (FieldVariant::Polymorphic, is_polymorphic),
    (FieldVariant::Date, is_date),
    (FieldVariant::Timestamp, is_timestamp),
    (FieldVariant::Decimal, is_decimal),
    (FieldVariant::String, is_string),
    (FieldVariant::Key, is_key),
    (FieldVariant::OneOf, is_one_of),
    (FieldVariant::Enum, is_enum),
    (FieldVariant::Boolean, is_boolean),
    (FieldVariant::Integer, is_integer),
    (FieldVariant::Float, is_float),
];

/// Returns the variant of the first matching predicate.
///
/// ## Returns
/// `None` for schemas no predicate accepts (objects, arrays, unresolved
/// references); such fields are left out of the output.
pub fn classify(schema: &Schema) -> Option<FieldVariant> {
    DISPATCH_ORDER
        .iter()
        .find(|(_, predicate)| predicate(schema))
        .map(|(variant, _)| *variant)
}

fn is_any(schema: &Schema) -> bool {
    matches!(schema, Schema::Any {})
}

fn is_polymorphic(schema: &Schema) -> bool {
    matches!(schema, Schema::Polymorph { .. })
}

fn is_date(schema: &Schema) -> bool {
    match schema {
        Schema::Date {} => true,
        Schema::String { format } => format.as_deref() == Some("date"),
        _ => false,
    }
}

fn is_timestamp(schema: &Schema) -> bool {
    match schema {
        Schema::Timestamp {} => true,
        Schema::String { format } => format.as_deref() == Some("date-time"),
        _ => false,
    }
}

fn is_decimal(schema: &Schema) -> bool {
    match schema {
        Schema::Decimal {} => true,
        Schema::String { format } => format.as_deref() == Some("decimal"),
        _ => false,
    }
}

fn is_string(schema: &Schema) -> bool {
    matches!(schema, Schema::String { .. })
}

fn is_key(schema: &Schema) -> bool {
    matches!(schema, Schema::Key { .. })
}

fn is_one_of(schema: &Schema) -> bool {
    matches!(schema, Schema::OneOf { .. })
}

fn is_enum(schema: &Schema) -> bool {
    matches!(schema, Schema::Enum { .. })
}

fn is_boolean(schema: &Schema) -> bool {
    matches!(schema, Schema::Bool {})
}

fn is_integer(schema: &Schema) -> bool {
    matches!(schema, Schema::Integer { .. })
}

fn is_float(schema: &Schema) -> bool {
    matches!(schema, Schema::Float { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_strings_are_not_plain_strings() {
        assert_eq!(
            classify(&Schema::string_with_format("date-time")),
            Some(FieldVariant::Timestamp)
        );
        assert_eq!(classify(&Schema::string_with_format("date")), Some(FieldVariant::Date));
        assert_eq!(
            classify(&Schema::string_with_format("decimal")),
            Some(FieldVariant::Decimal)
        );
        assert_eq!(
            classify(&Schema::string_with_format("email")),
            Some(FieldVariant::String)
        );
        assert_eq!(classify(&Schema::string()), Some(FieldVariant::String));
    }

    #[test]
    fn dedicated_schemas_classify_directly() {
        assert_eq!(classify(&Schema::Timestamp {}), Some(FieldVariant::Timestamp));
        assert_eq!(classify(&Schema::Bool {}), Some(FieldVariant::Boolean));
        assert_eq!(
            classify(&Schema::Integer { format: Some("int64".to_string()) }),
            Some(FieldVariant::Integer)
        );
        assert_eq!(classify(&Schema::Key { format: None }), Some(FieldVariant::Key));
        assert_eq!(classify(&Schema::Any {}), Some(FieldVariant::Any));
        assert_eq!(
            classify(&Schema::Polymorph {
                types: vec!["Hardcover".to_string(), "Ebook".to_string()]
            }),
            Some(FieldVariant::Polymorphic)
        );
    }

    #[test]
    fn containers_are_unclassifiable() {
        assert_eq!(classify(&Schema::Object { properties: vec![] }), None);
        assert_eq!(
            classify(&Schema::Array {
                items: Box::new(Schema::string())
            }),
            None
        );
        assert_eq!(classify(&Schema::reference("x.Y")), None);
    }

    #[test]
    fn table_is_in_precedence_order() {
        let order: Vec<FieldVariant> = DISPATCH_ORDER.iter().map(|(variant, _)| *variant).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(order.first(), Some(&FieldVariant::Any));
        assert_eq!(order.last(), Some(&FieldVariant::Float));
    }
}
