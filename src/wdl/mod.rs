//! WDL document facade over the `wdl-ast` toolkit
//!
//! Parsing, import discovery and input declarations all come from `wdl-ast`;
//! this module copies the parts the rest of the crate needs (imports,
//! executables, declared inputs, struct definitions) into owned values.

pub mod types;

use std::ops::Range;

use tracing::debug;
use wdl_ast::v1::{
    Decl, ImportSource, InputSection, MetadataValue, ParameterMetadataSection, TaskDefinition,
    WorkflowDefinition,
};
use wdl_ast::{Ast, AstNode, AstToken, Document};

use crate::error::{Error, Result};
pub use types::{TypeKind, WdlType};

/// An `import` statement whose source is a quoted URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// The literal text between the quotes.
    pub uri: String,
    /// Byte range of the quoted literal (quotes included) in the source.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableKind {
    Workflow,
    Task,
}

/// A declaration in an executable's `input` section.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDecl {
    pub name: String,
    pub ty: WdlType,
    /// Source text of the default expression, if the declaration is bound.
    pub default: Option<String>,
    /// `help` or `description` from `parameter_meta`.
    pub description: Option<String>,
}

impl InputDecl {
    pub fn required(&self) -> bool {
        self.default.is_none() && !self.ty.optional
    }
}

/// A workflow or task that can be registered and run.
#[derive(Debug, Clone, PartialEq)]
pub struct Executable {
    pub kind: ExecutableKind,
    pub name: String,
    pub inputs: Vec<InputDecl>,
}

impl Executable {
    pub fn input(&self, name: &str) -> Option<&InputDecl> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn required_inputs(&self) -> impl Iterator<Item = &InputDecl> {
        self.inputs.iter().filter(|i| i.required())
    }

    pub fn optional_inputs(&self) -> impl Iterator<Item = &InputDecl> {
        self.inputs.iter().filter(|i| !i.required())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<(String, WdlType)>,
}

/// The owned summary of one parsed WDL document.
#[derive(Debug, Clone, PartialEq)]
pub struct WdlDocument {
    pub imports: Vec<ImportRef>,
    pub workflow: Option<Executable>,
    pub tasks: Vec<Executable>,
    pub structs: Vec<StructDef>,
}

impl WdlDocument {
    /// Parse `source`, failing on any error diagnostic. `origin` names the
    /// document in error messages.
    pub fn parse(source: &str, origin: &str) -> Result<Self> {
        let (document, diagnostics) = Document::parse(source, None);

        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.severity().is_error())
            .map(|d| d.message().to_string())
            .collect();
        if !errors.is_empty() {
            return Err(Error::Parse(format!("{origin}: {}", errors.join("; "))));
        }

        let Ast::V1(ast) = document.ast() else {
            return Err(Error::Parse(format!(
                "{origin}: missing or unsupported WDL version statement"
            )));
        };

        let mut imports = Vec::new();
        for statement in ast.imports() {
            match statement.source() {
                ImportSource::Uri(uri) => {
                    let text = uri.text().ok_or_else(|| {
                        Error::Parse(format!("{origin}: import URI cannot be interpolated"))
                    })?;
                    let span = uri.span();
                    imports.push(ImportRef {
                        uri: text.text().to_string(),
                        span: span.start()..span.end(),
                    });
                }
                ImportSource::ModulePath(path) => {
                    return Err(Error::Fetch(format!(
                        "{origin}: symbolic module import `{}` is not supported",
                        path.text()
                    )));
                }
            }
        }

        let workflow = ast.workflows().next().map(|w| workflow_executable(&w));
        let tasks = ast.tasks().map(|t| task_executable(&t)).collect();
        let structs = ast
            .structs()
            .map(|s| StructDef {
                name: s.name().text().to_string(),
                members: s
                    .members()
                    .map(|m| (m.name().text().to_string(), WdlType::from_ast(&m.ty())))
                    .collect(),
            })
            .collect();

        debug!("parsed {} ({} imports)", origin, imports.len());

        Ok(Self {
            imports,
            workflow,
            tasks,
            structs,
        })
    }

    /// The executable a run targets: the workflow, or else the only task.
    pub fn executable(&self) -> Result<&Executable> {
        if let Some(workflow) = &self.workflow {
            return Ok(workflow);
        }
        match self.tasks.as_slice() {
            [task] => Ok(task),
            _ => Err(Error::Usage(
                "main WDL file must have a workflow or a single task".to_string(),
            )),
        }
    }
}

fn workflow_executable(workflow: &WorkflowDefinition) -> Executable {
    Executable {
        kind: ExecutableKind::Workflow,
        name: workflow.name().text().to_string(),
        inputs: input_decls(workflow.input(), workflow.parameter_metadata()),
    }
}

fn task_executable(task: &TaskDefinition) -> Executable {
    Executable {
        kind: ExecutableKind::Task,
        name: task.name().text().to_string(),
        inputs: input_decls(task.input(), task.parameter_metadata()),
    }
}

fn input_decls(
    section: Option<InputSection>,
    meta: Option<ParameterMetadataSection>,
) -> Vec<InputDecl> {
    let Some(section) = section else {
        return Vec::new();
    };

    section
        .declarations()
        .map(|decl| {
            let name = decl.name().text().to_string();
            let default = match &decl {
                Decl::Bound(bound) => Some(bound.expr().text().to_string().trim().to_string()),
                Decl::Unbound(_) => None,
            };
            let description = meta.as_ref().and_then(|m| parameter_description(m, &name));
            InputDecl {
                ty: WdlType::from_ast(&decl.ty()),
                name,
                default,
                description,
            }
        })
        .collect()
}

fn parameter_description(meta: &ParameterMetadataSection, name: &str) -> Option<String> {
    let item = meta.items().find(|item| item.name().text() == name)?;
    match item.value() {
        MetadataValue::String(s) => s.text().map(|t| t.text().to_string()),
        MetadataValue::Object(obj) => obj
            .items()
            .filter(|i| matches!(i.name().text(), "help" | "description"))
            .find_map(|i| match i.value() {
                MetadataValue::String(s) => s.text().map(|t| t.text().to_string()),
                _ => None,
            }),
        _ => None,
    }
}
