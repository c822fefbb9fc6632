//! Helper and partial lookup.
//!
//! Both are resolved while rendering, never while compiling, so a registry
//! can change between two renders of the same [`Template`].

use crate::ast::Path;
use crate::error::Result;
use crate::eval::Scope;
use crate::value::Value;
use crate::Template;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// What a helper sees when it is called.
pub struct HelperArgs<'a> {
    pub name: &'a str,
    /// The argument text exactly as written after the helper name.
    pub raw: &'a str,
    /// Arguments evaluated against the current scope; missing paths are null.
    pub params: Vec<Value>,
    pub scope: &'a Scope<'a>,
}

impl<'a> HelperArgs<'a> {
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }

    /// Resolve any other dotted path from the call site.
    pub fn lookup(&self, path: &str) -> Option<Cow<'a, Value>> {
        self.scope.lookup(&Path::parse(path))
    }
}

pub trait Helper: Send + Sync {
    fn call(&self, args: &HelperArgs<'_>) -> String;
}

impl<F> Helper for F
where
    F: Fn(&HelperArgs<'_>) -> String + Send + Sync,
{
    fn call(&self, args: &HelperArgs<'_>) -> String {
        self(args)
    }
}

pub trait HelperRegistry {
    fn helper(&self, name: &str) -> Option<&dyn Helper>;
}

pub trait PartialRegistry {
    fn partial(&self, name: &str) -> Option<&Template>;
}

impl HelperRegistry for HashMap<String, Box<dyn Helper>> {
    fn helper(&self, name: &str) -> Option<&dyn Helper> {
        self.get(name).map(|h| &**h)
    }
}

impl PartialRegistry for HashMap<String, Template> {
    fn partial(&self, name: &str) -> Option<&Template> {
        self.get(name)
    }
}

/// In-memory helpers and partials.
#[derive(Default)]
pub struct Registry {
    helpers: HashMap<String, Box<dyn Helper>>,
    partials: HashMap<String, Template>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("helpers", &format!("<{} helpers>", self.helpers.len()))
            .field("partials", &self.partials.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_helper<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&HelperArgs<'_>) -> String + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Box::new(helper));
    }

    pub fn register_boxed_helper(&mut self, name: impl Into<String>, helper: Box<dyn Helper>) {
        self.helpers.insert(name.into(), helper);
    }

    pub fn unregister_helper(&mut self, name: &str) -> bool {
        self.helpers.remove(name).is_some()
    }

    /// Compile `source` and register it as a partial.
    pub fn register_partial(&mut self, name: impl Into<String>, source: &str) -> Result<()> {
        let template = Template::compile(source)?;
        self.partials.insert(name.into(), template);
        Ok(())
    }

    pub fn register_template(&mut self, name: impl Into<String>, template: Template) {
        self.partials.insert(name.into(), template);
    }

    pub fn unregister_partial(&mut self, name: &str) -> bool {
        self.partials.remove(name).is_some()
    }
}

impl HelperRegistry for Registry {
    fn helper(&self, name: &str) -> Option<&dyn Helper> {
        self.helpers.helper(name)
    }
}

impl PartialRegistry for Registry {
    fn partial(&self, name: &str) -> Option<&Template> {
        self.partials.partial(name)
    }
}
