//! Coercion of command-line text and JSON values to declared WDL types

use serde_json::{Map, Number, Value};

use crate::wdl::{StructDef, TypeKind, WdlType};

const URI_SCHEMES: [&str; 2] = ["s3://", "omics://"];

/// Resolves struct names to their definitions.
pub(crate) struct TypeContext<'a> {
    structs: &'a [StructDef],
}

impl<'a> TypeContext<'a> {
    pub(crate) fn new(structs: &'a [StructDef]) -> Self {
        Self { structs }
    }

    fn lookup(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Coerce a single command-line value. Scalars are read from the text
    /// directly; compound types must be written as JSON.
    pub(crate) fn coerce_text(&self, text: &str, ty: &WdlType) -> Result<Value, String> {
        match &ty.kind {
            TypeKind::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("expected true or false, got {text:?}")),
            },
            TypeKind::Int => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected an integer, got {text:?}")),
            TypeKind::Float => text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected a number, got {text:?}")),
            TypeKind::String => Ok(Value::String(text.to_string())),
            TypeKind::File | TypeKind::Directory => {
                check_uri(text)?;
                Ok(Value::String(text.to_string()))
            }
            _ => {
                let value: Value = serde_json::from_str(text)
                    .map_err(|e| format!("expected JSON for {ty}: {e}"))?;
                self.check_json(&value, ty)
            }
        }
    }

    /// Check a JSON value against `ty`, returning the normalized value.
    pub(crate) fn check_json(&self, value: &Value, ty: &WdlType) -> Result<Value, String> {
        if value.is_null() {
            return if ty.optional {
                Ok(Value::Null)
            } else {
                Err(format!("null is not allowed for {ty}"))
            };
        }

        match (&ty.kind, value) {
            (TypeKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (TypeKind::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            (TypeKind::Float, Value::Number(_)) => Ok(value.clone()),
            (TypeKind::String, Value::String(_)) => Ok(value.clone()),
            (TypeKind::File | TypeKind::Directory, Value::String(s)) => {
                check_uri(s)?;
                Ok(value.clone())
            }
            (TypeKind::Array { item, non_empty }, Value::Array(items)) => {
                if *non_empty && items.is_empty() {
                    return Err(format!("{ty} requires at least one element"));
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| self.check_json(v, item).map_err(|e| format!("[{i}]: {e}")))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            (TypeKind::Map { key, value: value_ty }, Value::Object(entries)) => {
                let mut out = Map::new();
                for (k, v) in entries {
                    self.coerce_text(k, key)
                        .map_err(|e| format!("map key {k:?}: {e}"))?;
                    out.insert(
                        k.clone(),
                        self.check_json(v, value_ty)
                            .map_err(|e| format!("{k}: {e}"))?,
                    );
                }
                Ok(Value::Object(out))
            }
            (TypeKind::Pair { left, right }, Value::Object(entries)) => {
                if entries.len() != 2 {
                    return Err(format!("{ty} must have exactly `left` and `right`"));
                }
                let side = |name: &str, side_ty: &WdlType| {
                    entries
                        .get(name)
                        .ok_or_else(|| format!("{ty} is missing `{name}`"))
                        .and_then(|v| self.check_json(v, side_ty))
                };
                let mut out = Map::new();
                out.insert("left".to_string(), side("left", left)?);
                out.insert("right".to_string(), side("right", right)?);
                Ok(Value::Object(out))
            }
            (TypeKind::Object, Value::Object(_)) => Ok(value.clone()),
            (TypeKind::Struct(name), Value::Object(entries)) => match self.lookup(name) {
                Some(def) => self.check_struct(def, entries),
                None => Ok(value.clone()),
            },
            _ => Err(format!("expected {ty}, got {}", json_kind(value))),
        }
    }

    fn check_struct(&self, def: &StructDef, entries: &Map<String, Value>) -> Result<Value, String> {
        if let Some(extra) = entries
            .keys()
            .find(|k| !def.members.iter().any(|(name, _)| name == *k))
        {
            return Err(format!("struct {} has no member `{extra}`", def.name));
        }

        let mut out = Map::new();
        for (name, member_ty) in &def.members {
            match entries.get(name) {
                Some(v) => {
                    let checked = self
                        .check_json(v, member_ty)
                        .map_err(|e| format!("{}.{name}: {e}", def.name))?;
                    out.insert(name.clone(), checked);
                }
                None if member_ty.optional => {}
                None => return Err(format!("struct {} is missing member `{name}`", def.name)),
            }
        }
        Ok(Value::Object(out))
    }
}

fn check_uri(text: &str) -> Result<(), String> {
    if URI_SCHEMES.iter().any(|scheme| text.starts_with(scheme)) {
        Ok(())
    } else {
        Err(format!("expected an s3:// or omics:// URI, got {text:?}"))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ty(kind: TypeKind) -> WdlType {
        WdlType::new(kind)
    }

    fn sample_struct() -> Vec<StructDef> {
        vec![StructDef {
            name: "Sample".into(),
            members: vec![
                ("id".into(), ty(TypeKind::String)),
                ("reads".into(), ty(TypeKind::File)),
                ("notes".into(), WdlType::optional(TypeKind::String)),
            ],
        }]
    }

    #[test]
    fn test_scalar_text() {
        let ctx = TypeContext::new(&[]);
        assert_eq!(ctx.coerce_text("42", &ty(TypeKind::Int)).unwrap(), json!(42));
        assert_eq!(ctx.coerce_text("2.5", &ty(TypeKind::Float)).unwrap(), json!(2.5));
        assert_eq!(ctx.coerce_text("TRUE", &ty(TypeKind::Boolean)).unwrap(), json!(true));
        assert_eq!(ctx.coerce_text("hi", &ty(TypeKind::String)).unwrap(), json!("hi"));
        assert!(ctx.coerce_text("4.5", &ty(TypeKind::Int)).is_err());
        assert!(ctx.coerce_text("yes", &ty(TypeKind::Boolean)).is_err());
    }

    #[test]
    fn test_files_must_be_service_uris() {
        let ctx = TypeContext::new(&[]);
        assert!(ctx.coerce_text("s3://bucket/in.txt", &ty(TypeKind::File)).is_ok());
        assert!(ctx
            .coerce_text("omics://123.storage.us-east-1.amazonaws.com/ref", &ty(TypeKind::File))
            .is_ok());
        let err = ctx
            .coerce_text("/home/me/in.txt", &ty(TypeKind::File))
            .unwrap_err();
        assert!(err.contains("s3://"));
    }

    #[test]
    fn test_compound_text_is_json() {
        let ctx = TypeContext::new(&[]);
        let map = ty(TypeKind::Map {
            key: Box::new(ty(TypeKind::String)),
            value: Box::new(ty(TypeKind::Int)),
        });
        assert_eq!(
            ctx.coerce_text(r#"{"a": 1}"#, &map).unwrap(),
            json!({"a": 1})
        );
        assert!(ctx.coerce_text(r#"{"a": "x"}"#, &map).is_err());
        assert!(ctx.coerce_text("not json", &map).is_err());
    }

    #[test]
    fn test_non_empty_array() {
        let ctx = TypeContext::new(&[]);
        let tags = ty(TypeKind::Array {
            item: Box::new(ty(TypeKind::String)),
            non_empty: true,
        });
        assert!(ctx.check_json(&json!([]), &tags).is_err());
        assert!(ctx.check_json(&json!(["a"]), &tags).is_ok());
        assert!(ctx.check_json(&json!(["a", 1]), &tags).is_err());
    }

    #[test]
    fn test_null_only_for_optional() {
        let ctx = TypeContext::new(&[]);
        assert!(ctx.check_json(&Value::Null, &ty(TypeKind::Int)).is_err());
        assert_eq!(
            ctx.check_json(&Value::Null, &WdlType::optional(TypeKind::Int))
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_pair_requires_left_and_right() {
        let ctx = TypeContext::new(&[]);
        let pair = ty(TypeKind::Pair {
            left: Box::new(ty(TypeKind::Int)),
            right: Box::new(ty(TypeKind::String)),
        });
        assert!(ctx.check_json(&json!({"left": 1, "right": "x"}), &pair).is_ok());
        assert!(ctx.check_json(&json!({"left": 1}), &pair).is_err());
    }

    #[test]
    fn test_struct_members_checked() {
        let structs = sample_struct();
        let ctx = TypeContext::new(&structs);
        let sample = ty(TypeKind::Struct("Sample".into()));

        assert!(ctx
            .check_json(&json!({"id": "s1", "reads": "s3://b/r.fq"}), &sample)
            .is_ok());

        let missing = ctx.check_json(&json!({"id": "s1"}), &sample).unwrap_err();
        assert!(missing.contains("reads"));

        let extra = ctx
            .check_json(&json!({"id": "s1", "reads": "s3://b/r", "lane": 1}), &sample)
            .unwrap_err();
        assert!(extra.contains("lane"));

        let bad_file = ctx
            .check_json(&json!({"id": "s1", "reads": "r.fq"}), &sample)
            .unwrap_err();
        assert!(bad_file.starts_with("Sample.reads"));
    }

    #[test]
    fn test_unknown_struct_accepts_any_object() {
        let ctx = TypeContext::new(&[]);
        let other = ty(TypeKind::Struct("Other".into()));
        assert!(ctx.check_json(&json!({"anything": [1, 2]}), &other).is_ok());
        assert!(ctx.check_json(&json!("text"), &other).is_err());
    }
}
