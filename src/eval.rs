//! Tree-walking interpreter.
//!
//! Rendering never fails: missing data renders as the empty string, a
//! non-array `each` source renders nothing, and unknown helpers or partials
//! are logged and skipped.

use crate::ast::*;
use crate::registry::{HelperArgs, HelperRegistry, PartialRegistry};
use crate::value::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Data a template is rendered against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    vars: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object. Anything other than an object
    /// yields an empty context.
    pub fn from_json(json: serde_json::Value) -> Self {
        match Value::from(json) {
            Value::Map(vars) => Self { vars },
            _ => Self::default(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(vars: HashMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One frame of the scope chain. Frames live on the interpreter's stack.
#[derive(Debug)]
pub enum Scope<'a> {
    /// The caller's context; no parent, no `this`.
    Root(&'a Context),
    /// One iteration of an `each` block.
    Loop {
        this: &'a Value,
        index: Value,
        parent: &'a Scope<'a>,
    },
}

impl<'a> Scope<'a> {
    pub fn root(ctx: &'a Context) -> Self {
        Scope::Root(ctx)
    }

    pub fn child<'s>(&'s self, this: &'s Value, index: usize) -> Scope<'s> {
        Scope::Loop {
            this,
            index: Value::from(index),
            parent: self,
        }
    }

    /// Keys bound directly on this frame.
    fn direct(&self, key: &str) -> Option<&Value> {
        match self {
            Scope::Root(ctx) => ctx.get(key),
            Scope::Loop { this, index, .. } => match key {
                "this" => Some(*this),
                "index" => Some(index),
                _ => None,
            },
        }
    }

    fn this(&self) -> Option<&Value> {
        match self {
            Scope::Root(_) => None,
            Scope::Loop { this, .. } => Some(*this),
        }
    }

    fn parent(&self) -> Option<&Scope<'a>> {
        match self {
            Scope::Root(_) => None,
            Scope::Loop { parent, .. } => Some(*parent),
        }
    }

    /// Resolve a dotted path against the chain.
    ///
    /// Each frame is tried innermost first: a direct key wins, then a key of
    /// the frame's `this` when it is a map or array. The first frame that
    /// knows the leading segment decides the result, even if the rest of the
    /// path then misses; only a frame that knows nothing defers to its
    /// parent.
    ///
    /// Computed properties such as `length` come back owned; everything
    /// else borrows from the context.
    pub fn lookup(&self, path: &Path) -> Option<Cow<'_, Value>> {
        let (first, rest) = path.segments().split_first()?;
        let mut frame = self;
        loop {
            if let Some(value) = frame.direct(first) {
                return resolve(Cow::Borrowed(value), rest);
            }
            if let Some(value) = frame
                .this()
                .filter(|this| this.is_object())
                .and_then(|this| this.get(first))
            {
                return resolve(value, rest);
            }
            frame = frame.parent()?;
        }
    }
}

/// Follow the remaining segments; a null or missing step ends in `None`.
fn resolve<'v>(value: Cow<'v, Value>, rest: &[String]) -> Option<Cow<'v, Value>> {
    rest.iter()
        .try_fold(value, |v, segment| match v {
            Cow::Borrowed(v) => v.get(segment),
            Cow::Owned(v) => v.get(segment).map(|c| Cow::Owned(c.into_owned())),
        })
}

/// Deepest partial inclusion chain followed unless configured otherwise.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 16;

pub struct Evaluator<'r> {
    helpers: &'r dyn HelperRegistry,
    partials: &'r dyn PartialRegistry,
    max_partial_depth: usize,
}

impl<'r> Evaluator<'r> {
    pub fn new(helpers: &'r dyn HelperRegistry, partials: &'r dyn PartialRegistry) -> Self {
        Self {
            helpers,
            partials,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }

    pub fn with_max_partial_depth(mut self, max_partial_depth: usize) -> Self {
        self.max_partial_depth = max_partial_depth;
        self
    }

    pub fn render(&self, program: &Program, ctx: &Context) -> String {
        let scope = Scope::root(ctx);
        let mut output = String::new();
        self.render_nodes(&program.body, &scope, 0, &mut output);
        tracing::debug!(bytes = output.len(), "rendered template");
        output
    }

    fn render_nodes(&self, nodes: &[Node], scope: &Scope<'_>, depth: usize, out: &mut String) {
        for node in nodes {
            self.render_node(node, scope, depth, out);
        }
    }

    /// `depth` counts partial inclusions, not blocks.
    fn render_node(&self, node: &Node, scope: &Scope<'_>, depth: usize, out: &mut String) {
        match node {
            Node::Text(s) => out.push_str(s),
            Node::Variable { path, .. } | Node::RawVariable { path, .. } => {
                if let Some(value) = scope.lookup(path) {
                    out.push_str(&value.to_string());
                }
            }
            Node::If { test, body, .. } => {
                if scope.lookup(test).is_some_and(|v| v.is_truthy()) {
                    self.render_nodes(body, scope, depth, out);
                }
            }
            Node::Each { source, body, .. } => {
                let Some(value) = scope.lookup(source) else {
                    return;
                };
                match value.as_array() {
                    Some(items) => {
                        for (i, item) in items.iter().enumerate() {
                            let child = scope.child(item, i);
                            self.render_nodes(body, &child, depth, out);
                        }
                    }
                    None => {
                        tracing::debug!(%source, found = value.type_name(), "each over a non-array");
                    }
                }
            }
            Node::Helper {
                name,
                args_raw,
                args,
                span,
            } => {
                let Some(helper) = self.helpers.helper(name) else {
                    tracing::warn!(helper = %name, offset = span.offset(), "unknown helper");
                    return;
                };
                let params = args
                    .iter()
                    .map(|arg| match arg {
                        Arg::Literal(value) => value.clone(),
                        Arg::Path(path) => scope.lookup(path).map(Cow::into_owned).unwrap_or_default(),
                    })
                    .collect();
                let call = HelperArgs {
                    name,
                    raw: args_raw,
                    params,
                    scope,
                };
                out.push_str(&helper.call(&call));
            }
            Node::Partial { name, span } => {
                if depth >= self.max_partial_depth {
                    tracing::warn!(
                        partial = %name,
                        limit = self.max_partial_depth,
                        "partial nesting limit reached"
                    );
                    return;
                }
                match self.partials.partial(name) {
                    Some(template) => {
                        tracing::trace!(partial = %name, "including partial");
                        self.render_nodes(&template.program().body, scope, depth + 1, out);
                    }
                    None => {
                        tracing::warn!(partial = %name, offset = span.offset(), "unknown partial");
                    }
                }
            }
        }
    }
}
