use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, FieldViolation, Result};

const MAX_SCHEMA_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum FieldKind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Nullable(Box<FieldKind>),
    Array(Box<FieldKind>),
    Object(ObjectSchema),
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Any => "any value",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Nullable(inner) => inner.type_name(),
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    fn validate(&self, path: &str, value: &Value, violations: &mut Vec<FieldViolation>) {
        let matches = match (self, value) {
            (Self::Any, _) => true,
            (Self::Nullable(_), Value::Null) => true,
            (Self::Nullable(inner), value) => {
                inner.validate(path, value, violations);
                true
            }
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Array(items), Value::Array(values)) => {
                for (i, item) in values.iter().enumerate() {
                    items.validate(&format!("{path}[{i}]"), item, violations);
                }
                true
            }
            (Self::Object(object), Value::Object(map)) => {
                object.validate_map(path, map, violations);
                true
            }
            _ => false,
        };

        if !matches {
            violations.push(FieldViolation::new(
                path,
                format!("expected {}, found {}", self.type_name(), describe(value)),
            ));
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSchema {
    name: String,
    kind: FieldKind,
    required: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    /// Accepts the subset schemars emits: `type` (string or array with `"null"`),
    /// `properties`, `required`, `items`, local `$ref`s and `anyOf`/`oneOf` with a null arm.
    pub fn from_json_schema(root: &Value) -> Result<Self> {
        SchemaReader { root }.object(root, "$", 0)
    }

    /// Checks `value` against the schema, collecting every violation before failing.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let mut violations = Vec::new();
        match value {
            Value::Object(map) => self.validate_map("", map, &mut violations),
            other => violations.push(FieldViolation::new(
                "$",
                format!("expected object, found {}", describe(other)),
            )),
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(DomainError::SchemaViolation(violations))
        }
    }

    fn validate_map(
        &self,
        prefix: &str,
        map: &Map<String, Value>,
        violations: &mut Vec<FieldViolation>,
    ) {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };

            match map.get(&field.name) {
                None if field.required => {
                    violations.push(FieldViolation::new(path, "missing required field"))
                }
                None => {}
                Some(value) => field.kind.validate(&path, value, violations),
            }
        }
    }
}

struct SchemaReader<'a> {
    root: &'a Value,
}

impl<'a> SchemaReader<'a> {
    fn resolve(&self, mut schema: &'a Value, path: &str) -> Result<&'a Value> {
        for _ in 0..MAX_SCHEMA_DEPTH {
            if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
                schema = reference
                    .strip_prefix('#')
                    .and_then(|pointer| self.root.pointer(pointer))
                    .ok_or_else(|| {
                        DomainError::validation(format!(
                            "unresolvable schema reference `{reference}` at {path}"
                        ))
                    })?;
                continue;
            }
            match schema.get("allOf").and_then(Value::as_array).map(Vec::as_slice) {
                Some([single]) => schema = single,
                _ => return Ok(schema),
            }
        }
        Err(DomainError::validation(format!(
            "schema references nest too deeply at {path}"
        )))
    }

    fn object(&self, schema: &'a Value, path: &str, depth: usize) -> Result<ObjectSchema> {
        let schema = self.resolve(schema, path)?;
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let fields = match schema.get("properties") {
            Some(Value::Object(properties)) => properties
                .iter()
                .map(|(name, property)| {
                    Ok(FieldSchema {
                        name: name.clone(),
                        kind: self.kind(property, &format!("{path}.{name}"), depth + 1)?,
                        required: required.contains(&name.as_str()),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(ObjectSchema { fields })
    }

    fn kind(&self, schema: &'a Value, path: &str, depth: usize) -> Result<FieldKind> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(DomainError::validation(format!(
                "schema nests too deeply at {path}"
            )));
        }
        let schema = self.resolve(schema, path)?;

        let variants = schema
            .get("anyOf")
            .or_else(|| schema.get("oneOf"))
            .and_then(Value::as_array);
        if let Some(variants) = variants {
            let (nulls, others): (Vec<&Value>, Vec<&Value>) =
                variants.iter().partition(|v| is_null_schema(v));
            let kind = match others.as_slice() {
                [single] => self.kind(*single, path, depth + 1)?,
                _ => FieldKind::Any,
            };
            return Ok(nullable_if(kind, !nulls.is_empty()));
        }

        let (type_name, nullable) = match schema.get("type") {
            Some(Value::String(name)) => (Some(name.as_str()), false),
            Some(Value::Array(names)) => {
                let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
                let non_null: Vec<&str> = names.iter().copied().filter(|n| *n != "null").collect();
                let single = match non_null.as_slice() {
                    [name] => Some(*name),
                    _ => None,
                };
                (single, names.len() != non_null.len())
            }
            _ => (None, false),
        };

        let kind = match type_name {
            Some("string") => FieldKind::String,
            Some("number") => FieldKind::Number,
            Some("integer") => FieldKind::Integer,
            Some("boolean") => FieldKind::Boolean,
            Some("array") => {
                let items = match schema.get("items") {
                    Some(items) => self.kind(items, &format!("{path}[]"), depth + 1)?,
                    None => FieldKind::Any,
                };
                FieldKind::Array(Box::new(items))
            }
            Some("object") => FieldKind::Object(self.object(schema, path, depth + 1)?),
            None if schema.get("properties").is_some() => {
                FieldKind::Object(self.object(schema, path, depth + 1)?)
            }
            _ => FieldKind::Any,
        };

        Ok(nullable_if(kind, nullable))
    }
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn nullable_if(kind: FieldKind, nullable: bool) -> FieldKind {
    match kind {
        FieldKind::Any | FieldKind::Nullable(_) => kind,
        kind if nullable => FieldKind::Nullable(Box::new(kind)),
        kind => kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde_json::json;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Ingredient {
        ingredient: String,
        amount: f64,
        measure: String,
    }

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Recipe {
        recipe: String,
        ingredients: Vec<Ingredient>,
        servings: Option<u32>,
    }

    fn recipe_schema() -> ObjectSchema {
        ObjectSchema::from_json_schema(&schemars::schema_for!(Recipe).to_value()).unwrap()
    }

    fn sorted_paths(err: DomainError) -> Vec<String> {
        let DomainError::SchemaViolation(violations) = err else {
            panic!("expected schema violation, got {err:?}");
        };
        let mut paths: Vec<String> = violations.into_iter().map(|v| v.path).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_valid_value() {
        let value = json!({
            "recipe": "bread",
            "ingredients": [
                { "ingredient": "flour", "amount": 100, "measure": "grams" },
                { "ingredient": "water", "amount": 200.5, "measure": "litres" }
            ],
            "servings": null
        });

        assert!(recipe_schema().validate(&value).is_ok());
    }

    #[test]
    fn test_collects_all_violations() {
        let value = json!({
            "ingredients": [
                { "ingredient": "flour", "amount": "a lot", "measure": "grams" },
                { "ingredient": 7, "amount": 1 }
            ],
            "servings": "four"
        });

        assert_eq!(
            sorted_paths(recipe_schema().validate(&value).unwrap_err()),
            vec![
                "ingredients[0].amount",
                "ingredients[1].ingredient",
                "ingredients[1].measure",
                "recipe",
                "servings",
            ]
        );
    }

    #[test]
    fn test_nullable_fields_accept_null() {
        let schema = ObjectSchema::from_json_schema(&json!({
            "type": "object",
            "properties": {
                "occupation": { "type": ["string", "null"] },
                "name": { "type": "string" },
                "employer": { "anyOf": [{ "$ref": "#/$defs/Company" }, { "type": "null" }] }
            },
            "required": ["occupation", "name", "employer"],
            "$defs": {
                "Company": { "type": "object", "properties": { "title": { "type": "string" } } }
            }
        }))
        .unwrap();

        assert!(schema
            .validate(&json!({ "occupation": null, "name": "Felix", "employer": null }))
            .is_ok());
        assert_eq!(
            sorted_paths(
                schema
                    .validate(&json!({ "occupation": null, "name": null, "employer": { "title": 3 } }))
                    .unwrap_err()
            ),
            vec!["employer.title", "name"]
        );
    }

    #[test]
    fn test_non_object_root() {
        let err = recipe_schema().validate(&json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("$: expected object, found array"));
    }

    #[test]
    fn test_unresolvable_reference() {
        let err = ObjectSchema::from_json_schema(&json!({
            "type": "object",
            "properties": { "item": { "$ref": "#/$defs/Missing" } }
        }))
        .unwrap_err();

        assert!(err.to_string().contains("#/$defs/Missing"));
    }
}
