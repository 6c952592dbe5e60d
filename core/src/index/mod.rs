//! Global symbol index built from every registered module.
//!
//! The index is rebuilt from scratch on each settle; nothing is patched in
//! place. Class and method completions are merged by name across all files,
//! first occurrence winning. Methods are not namespaced by class.

mod walk;


use serde::Serialize;
use tracing::warn;

use crate::ast::{ClassStmt, Method, MethodKind, Stmt};
use crate::registry::SourceRegistry;
use crate::util::fast_map::{FastHashMap, FastHashSet, fast_hash_set_new};

pub use walk::{BodyWalkError, DEFAULT_WALK_BUDGET};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Class,
    Method,
    Function,
    Variable,
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Completion {
    pub name: String,
    pub kind: CompletionKind,
}

impl Completion {
    pub fn new(name: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    /// Lookup key: `name`, `name=`, `[]`, `[]=` or the operator.
    pub method: String,
    pub label: String,
    pub parameters: Vec<String>,
    /// Identity of the unit declaring the method.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileVariables {
    pub identity: String,
    pub variables: Vec<Completion>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SymbolIndex {
    completions: Vec<Completion>,
    signatures: Vec<Signature>,
    files: Vec<FileVariables>,
    #[serde(skip)]
    signatures_by_name: FastHashMap<String, Vec<usize>>,
    #[serde(skip)]
    files_by_identity: FastHashMap<String, usize>,
    #[serde(skip)]
    walk_errors: Vec<BodyWalkError>,
}

/// `[construct ][foreign ][static ]Class.name(params)`. Getters drop the
/// parentheses, setters read `Class.name=(v)`, subscripts `Class[a, b]`.
pub fn signature_label(class: &str, method: &Method) -> String {
    let mut label = String::new();
    if method.is_construct {
        label.push_str("construct ");
    }
    if method.is_foreign {
        label.push_str("foreign ");
    }
    if method.is_static {
        label.push_str("static ");
    }
    label.push_str(class);

    let parameters = method.parameter_names();
    match method.kind {
        MethodKind::Named | MethodKind::Operator => {
            label.push('.');
            label.push_str(&method.name.text);
            if method.parameters.is_some() {
                label.push_str(&format!("({})", parameters.join(", ")));
            }
        }
        MethodKind::Setter => {
            label.push_str(&format!(".{}=({})", method.name.text, parameters.join(", ")));
        }
        MethodKind::Subscript => {
            label.push_str(&format!("[{}]", parameters.join(", ")));
        }
        MethodKind::SubscriptSetter => {
            let (subscript, value) = match parameters.split_last() {
                Some((value, subscript)) => (subscript.join(", "), value.as_str()),
                None => (String::new(), ""),
            };
            label.push_str(&format!("[{}]=({})", subscript, value));
        }
    }
    label
}

/// Name a method contributes to completions, if any. Setters complete as
/// their property name; subscripts and operators are not completable.
fn completion_name(method: &Method) -> Option<&str> {
    match method.kind {
        MethodKind::Named | MethodKind::Setter => Some(method.name.text.as_str()),
        MethodKind::Operator | MethodKind::Subscript | MethodKind::SubscriptSetter => None,
    }
}

#[derive(Default)]
struct IndexBuilder {
    index: SymbolIndex,
    class_names: FastHashSet<String>,
    method_names: FastHashSet<String>,
}

impl IndexBuilder {
    fn add_class(&mut self, source: &str, class: &ClassStmt, budget: usize, file: &mut FileBindings) {
        let class_name = class.name.text.as_str();
        if self.class_names.insert(class_name.to_string()) {
            self.index
                .completions
                .push(Completion::new(class_name, CompletionKind::Class));
        }

        for method in &class.methods {
            let key = method.display_name();
            let position = self.index.signatures.len();
            self.index.signatures.push(Signature {
                method: key.clone(),
                label: signature_label(class_name, method),
                parameters: method.parameter_names(),
                source: source.to_string(),
            });
            self.index.signatures_by_name.entry(key).or_default().push(position);

            if let Some(name) = completion_name(method)
                && self.method_names.insert(name.to_string())
            {
                let kind = if method.is_static {
                    CompletionKind::Function
                } else {
                    CompletionKind::Method
                };
                self.index.completions.push(Completion::new(name, kind));
            }

            match walk::method_bindings(source, class, method, budget) {
                Ok(bindings) => file.extend(bindings),
                Err(error) => {
                    warn!(target: "wrena::index", %error, "skipping method bindings");
                    self.index.walk_errors.push(error);
                }
            }
        }
    }
}

/// Per-file bindings, de-duplicated by name; the first kind seen wins.
struct FileBindings {
    seen: FastHashSet<String>,
    variables: Vec<Completion>,
}

impl FileBindings {
    fn new() -> Self {
        Self {
            seen: fast_hash_set_new(),
            variables: Vec::new(),
        }
    }

    fn extend(&mut self, bindings: impl IntoIterator<Item = Completion>) {
        for binding in bindings {
            if self.seen.insert(binding.name.clone()) {
                self.variables.push(binding);
            }
        }
    }
}

impl SymbolIndex {
    pub fn rebuild(registry: &SourceRegistry) -> Self {
        Self::rebuild_with_budget(registry, DEFAULT_WALK_BUDGET)
    }

    /// Pure function of the registry's ready modules; never fails.
    pub fn rebuild_with_budget(registry: &SourceRegistry, budget: usize) -> Self {
        let mut builder = IndexBuilder::default();

        for (identity, module) in registry.iter() {
            let mut file = FileBindings::new();
            for stmt in &module.statements {
                match stmt {
                    Stmt::Class(class) => builder.add_class(identity, class, budget, &mut file),
                    Stmt::Var(var) => file.extend([Completion::new(&var.name.text, CompletionKind::Variable)]),
                    _ => {}
                }
            }

            let position = builder.index.files.len();
            builder.index.files_by_identity.insert(identity.to_string(), position);
            builder.index.files.push(FileVariables {
                identity: identity.to_string(),
                variables: file.variables,
            });
        }

        builder.index
    }

    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.completions
            .iter()
            .filter(|c| c.kind == CompletionKind::Class)
            .map(|c| c.name.as_str())
    }

    /// Every signature, in registry then declaration order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Signatures whose method name matches `name` exactly.
    pub fn signatures_for(&self, name: &str) -> Vec<&Signature> {
        self.signatures_by_name
            .get(name)
            .map(|positions| positions.iter().map(|&i| &self.signatures[i]).collect())
            .unwrap_or_default()
    }

    pub fn variables_in(&self, identity: &str) -> &[Completion] {
        self.files_by_identity
            .get(identity)
            .map(|&i| self.files[i].variables.as_slice())
            .unwrap_or_default()
    }

    pub fn files(&self) -> &[FileVariables] {
        &self.files
    }

    pub fn walk_errors(&self) -> &[BodyWalkError] {
        &self.walk_errors
    }
}
