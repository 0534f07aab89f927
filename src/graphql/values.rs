//! Conversions between domain values and dynamic GraphQL values.

use async_graphql::dynamic::{FieldValue, ResolverContext};
use async_graphql::{Result, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::StructuredError;
use crate::errors::Lookup;

pub const NOT_FOUND_TYPE: &str = "NotFound";

/// Serialize a domain value into an object the default resolver can read.
pub fn object<T: Serialize>(value: &T) -> Result<FieldValue<'static>> {
    Ok(FieldValue::value(async_graphql::to_value(value)?))
}

/// Like [`object`], tagged with its concrete type for union positions.
pub fn typed<T: Serialize>(value: &T, type_name: &'static str) -> Result<FieldValue<'static>> {
    Ok(object(value)?.with_type(type_name))
}

pub fn list<T: Serialize>(values: &[T]) -> Result<FieldValue<'static>> {
    let items = values.iter().map(object).collect::<Result<Vec<_>>>()?;
    Ok(FieldValue::list(items))
}

/// A lookup in a `<Type> | NotFound` union position.
pub fn lookup<T: Serialize>(
    lookup: &Lookup<T>,
    type_name: &'static str,
) -> Result<FieldValue<'static>> {
    match lookup {
        Lookup::Found(value) => typed(value, type_name),
        Lookup::NotFound(marker) => typed(marker, NOT_FOUND_TYPE),
    }
}

/// Object with no properties; every field of it resolves to null.
pub fn empty_object() -> FieldValue<'static> {
    FieldValue::value(Value::Object(Default::default()))
}

/// Deserialize an input object argument.
pub fn input<T: DeserializeOwned>(ctx: &ResolverContext<'_>, name: &str) -> Result<T> {
    let value = ctx.args.try_get(name)?.as_value().clone();
    Ok(async_graphql::from_value(value)?)
}

/// Read an `ID` argument, which clients may send as a string or a number.
pub fn id(ctx: &ResolverContext<'_>, name: &str) -> Result<String> {
    match ctx.args.try_get(name)?.as_value() {
        Value::String(id) => Ok(id.clone()),
        Value::Number(id) => Ok(id.to_string()),
        _ => Err(StructuredError::bad_request(format!(
            "'{}' must be an ID",
            name
        ))),
    }
}

/// Read an identifier property off the parent object value; blank counts as absent.
pub fn parent_id(ctx: &ResolverContext<'_>, property: &str) -> Option<String> {
    let Some(Value::Object(map)) = ctx.parent_value.as_value() else {
        return None;
    };
    match map.get(property)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NotFound;
    use serde_json::json;

    #[test]
    fn test_object_keeps_field_names() {
        let value = object(&json!({ "id": "p1", "createdAt": "2024-01-01T00:00:00Z" })).unwrap();
        let Some(Value::Object(map)) = value.as_value() else {
            panic!("expected object");
        };
        assert_eq!(map.get("id"), Some(&Value::from("p1")));
        assert!(map.contains_key("createdAt"));
    }

    #[test]
    fn test_not_found_marker_fields() {
        let value = object(&NotFound::entity("Post")).unwrap();
        let Some(Value::Object(map)) = value.as_value() else {
            panic!("expected object");
        };
        assert_eq!(map.get("failed"), Some(&Value::from(true)));
        assert_eq!(map.get("message"), Some(&Value::from("Post not found")));
    }
}
