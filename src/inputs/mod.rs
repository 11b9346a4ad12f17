//! Workflow input parsing and validation
//!
//! Inputs arrive as positional `key=value` tokens, an optional JSON document,
//! and `--empty` / `--none` flags. [`InputValidator`] merges them against the
//! executable's declared inputs and reports every problem in one
//! [`ValidationError`].

mod coerce;

use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::wdl::{Executable, StructDef, TypeKind};
use coerce::TypeContext;

/// What is wrong with one input key.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    Unknown,
    Invalid(String),
    Missing,
    NotNullable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputIssue {
    pub key: String,
    pub kind: IssueKind,
}

impl InputIssue {
    pub fn new(key: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

impl fmt::Display for InputIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Unknown => write!(f, "{}: unknown input", self.key),
            IssueKind::Invalid(reason) => write!(f, "{}: {reason}", self.key),
            IssueKind::Missing => write!(f, "{}: missing required input", self.key),
            IssueKind::NotNullable => {
                write!(f, "{}: input is not optional and cannot be none", self.key)
            }
        }
    }
}

/// Every problem found with a set of workflow inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    issues: Vec<InputIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<InputIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[InputIssue] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input validation failed:")?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Raw, unvalidated inputs collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    /// `key=value` assignments in command-line order.
    pub assignments: Vec<(String, String)>,
    /// Parsed `-i/--input` document.
    pub document: Option<Map<String, Value>>,
    pub empty: Vec<String>,
    pub none: Vec<String>,
}

impl RawInputs {
    /// Parse positional `key=value` tokens. A token ending in `=` takes its
    /// value from the following token.
    pub fn parse_assignments(tokens: &[String]) -> Result<Vec<(String, String)>> {
        let mut assignments = Vec::new();
        let mut iter = tokens.iter().peekable();
        while let Some(token) = iter.next() {
            let Some((key, value)) = token.split_once('=') else {
                return Err(Error::Usage(format!(
                    "invalid input assignment {token:?} (expected key=value)"
                )));
            };
            if key.is_empty() {
                return Err(Error::Usage(format!(
                    "invalid input assignment {token:?} (empty key)"
                )));
            }
            let value = if value.is_empty() {
                match iter.next_if(|next| !next.contains('=')) {
                    Some(next) => next.clone(),
                    None => String::new(),
                }
            } else {
                value.to_string()
            };
            assignments.push((key.to_string(), value));
        }
        Ok(assignments)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
            && self.document.as_ref().is_none_or(Map::is_empty)
            && self.empty.is_empty()
            && self.none.is_empty()
    }
}

/// Load the `-i/--input` argument: `-` reads standard input, text starting
/// with `{` is a literal JSON object, anything else is a file path.
pub fn load_input_document(arg: &str) -> Result<Map<String, Value>> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(Path::new(arg))
            .map_err(|e| Error::Usage(format!("cannot read input file {arg}: {e}")))?
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Usage(format!("input {arg} must be a JSON object"))),
        Err(e) => Err(Error::Usage(format!("input {arg} is not valid JSON: {e}"))),
    }
}

/// Validates raw inputs against one executable's declarations.
pub struct InputValidator<'a> {
    executable: &'a Executable,
    types: TypeContext<'a>,
}

impl<'a> InputValidator<'a> {
    pub fn new(executable: &'a Executable, structs: &'a [StructDef]) -> Self {
        Self {
            executable,
            types: TypeContext::new(structs),
        }
    }

    /// Accept both `key` and `<executable>.key`.
    fn bare_key<'k>(&self, key: &'k str) -> &'k str {
        key.strip_prefix(self.executable.name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(key)
    }

    /// Merge and check all raw inputs. Command-line assignments override the
    /// JSON document; repeating an array key appends.
    pub fn validate(&self, raw: &RawInputs) -> std::result::Result<Map<String, Value>, ValidationError> {
        let mut values = Map::new();
        let mut issues = Vec::new();
        let mut reported: BTreeSet<String> = BTreeSet::new();
        let mut unknown = |key: &str, issues: &mut Vec<InputIssue>| {
            if reported.insert(key.to_string()) {
                issues.push(InputIssue::new(key, IssueKind::Unknown));
            }
        };

        if let Some(document) = &raw.document {
            for (key, value) in document {
                let name = self.bare_key(key);
                let Some(decl) = self.executable.input(name) else {
                    unknown(key, &mut issues);
                    continue;
                };
                match self.types.check_json(value, &decl.ty) {
                    Ok(v) => {
                        values.insert(name.to_string(), v);
                    }
                    Err(reason) => issues.push(InputIssue::new(name, IssueKind::Invalid(reason))),
                }
            }
        }

        let mut from_cli: BTreeSet<&str> = BTreeSet::new();
        for (key, text) in &raw.assignments {
            let name = self.bare_key(key);
            let Some(decl) = self.executable.input(name) else {
                unknown(key, &mut issues);
                continue;
            };

            let first = from_cli.insert(decl.name.as_str());
            let result = match &decl.ty.kind {
                TypeKind::Array { item, .. } => {
                    let element = if item.is_scalar() {
                        self.types.coerce_text(text, item)
                    } else {
                        serde_json::from_str::<Value>(text)
                            .map_err(|e| format!("expected JSON for {item}: {e}"))
                            .and_then(|v| self.types.check_json(&v, item))
                    };
                    element.map(|element| match values.get_mut(&decl.name) {
                        Some(Value::Array(items)) if !first => items.push(element),
                        _ => {
                            values.insert(decl.name.clone(), Value::Array(vec![element]));
                        }
                    })
                }
                _ if !first => Err("specified more than once".to_string()),
                _ => self.types.coerce_text(text, &decl.ty).map(|v| {
                    values.insert(decl.name.clone(), v);
                }),
            };
            if let Err(reason) = result {
                issues.push(InputIssue::new(name, IssueKind::Invalid(reason)));
            }
        }

        for key in &raw.empty {
            let name = self.bare_key(key);
            let Some(decl) = self.executable.input(name) else {
                unknown(key, &mut issues);
                continue;
            };
            let value = match &decl.ty.kind {
                TypeKind::Array { non_empty: true, .. } => {
                    Err(format!("{} requires at least one element", decl.ty))
                }
                TypeKind::Array { .. } => Ok(Value::Array(Vec::new())),
                TypeKind::String => Ok(Value::String(String::new())),
                _ => Err(format!("--empty does not apply to {}", decl.ty)),
            };
            match value {
                Ok(v) => {
                    values.insert(decl.name.clone(), v);
                }
                Err(reason) => issues.push(InputIssue::new(name, IssueKind::Invalid(reason))),
            }
        }

        for key in &raw.none {
            let name = self.bare_key(key);
            let Some(decl) = self.executable.input(name) else {
                unknown(key, &mut issues);
                continue;
            };
            if decl.ty.optional {
                values.insert(decl.name.clone(), Value::Null);
            } else {
                issues.push(InputIssue::new(name, IssueKind::NotNullable));
            }
        }

        for decl in self.executable.required_inputs() {
            let invalid = issues.iter().any(|i| i.key == decl.name);
            if !values.contains_key(&decl.name) && !invalid {
                issues.push(InputIssue::new(&decl.name, IssueKind::Missing));
            }
        }

        if issues.is_empty() {
            debug!("validated {} inputs for {}", values.len(), self.executable.name);
            Ok(values)
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

/// Human-readable listing of declared inputs, required first.
pub fn describe_inputs(executable: &Executable) -> String {
    let mut out = String::new();
    let mut section = |title: &str, inputs: Vec<String>| {
        if inputs.is_empty() {
            return;
        }
        out.push_str(title);
        out.push_str(":\n");
        for line in inputs {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    };

    section(
        "required inputs",
        executable
            .required_inputs()
            .map(|i| describe_decl(&i.ty.to_string(), &i.name, None, i.description.as_deref()))
            .collect(),
    );
    section(
        "optional inputs",
        executable
            .optional_inputs()
            .map(|i| {
                describe_decl(
                    &i.ty.to_string(),
                    &i.name,
                    i.default.as_deref(),
                    i.description.as_deref(),
                )
            })
            .collect(),
    );

    if out.is_empty() {
        out.push_str(&format!("{} declares no inputs\n", executable.name));
    }
    out
}

fn describe_decl(ty: &str, name: &str, default: Option<&str>, description: Option<&str>) -> String {
    let mut line = format!("{ty} {name}");
    if let Some(default) = default {
        line.push_str(&format!(" = {default}"));
    }
    if let Some(description) = description {
        line.push_str(&format!("  # {description}"));
    }
    line
}
