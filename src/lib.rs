//! shimmybars: minimal Handlebars-like template engine.
//!
//! A template is compiled once (tokenize, then parse into a tree) and can
//! then be rendered any number of times, from any number of threads,
//! against different contexts. All syntax errors surface at compile time;
//! rendering never fails.
//!
//! Supported tags:
//! - `{{ path }}` and `{{{ path }}}`: interpolate a dotted path such as
//!   `user.name`, `this` or `this.name`. No escaping is applied by either.
//! - `{{#if path}} ... {{/if}}`: render the body when the value is truthy.
//! - `{{#each path}} ... {{/each}}`: render the body once per array element,
//!   with `this` bound to the element and `index` to its position.
//! - `{{> name}}`: include a partial from a [`PartialRegistry`].
//! - `{{name args...}}`: call a helper from a [`HelperRegistry`].
//! - `{{}}`: passes through as the literal text `{{}}`.
//!
//! Not supported:
//! - `{{else}}` or any block besides `if` and `each`.
//! - HTML escaping.
//! - Whitespace control.
//!
//! Lookup rules:
//! - Missing data renders as the empty string, never an error.
//! - Inside `each`, each frame first checks its own `this`/`index`
//!   bindings, then the keys of `this`, before deferring to the enclosing
//!   frame.
//!
//! Nesting:
//! - Blocks may nest [`Config::max_depth`] levels deep (64 by default);
//!   deeper templates are rejected at compile time.
//! - Partials may include partials up to [`Config::max_partial_depth`]
//!   levels (16 by default); deeper inclusions render nothing.
//!
//! ```
//! use shimmybars::{Context, Template};
//!
//! let template = Template::compile("Hello, {{#each names}}{{this}} {{/each}}!").unwrap();
//! let mut ctx = Context::new();
//! ctx.set("names", vec!["Ann", "Bo"]);
//! assert_eq!(template.render(&ctx), "Hello, Ann Bo !");
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

pub use ast::{Node, Program};
pub use error::{ParseError, Result, TemplateError, UnclosedTagError};
pub use eval::{Context, Scope};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;
pub use registry::{Helper, HelperArgs, HelperRegistry, PartialRegistry, Registry};
pub use value::Value;

use eval::{Evaluator, DEFAULT_MAX_PARTIAL_DEPTH};
use parser::{Parser, DEFAULT_MAX_DEPTH};

/// Limits applied when compiling and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest allowed `if`/`each` nesting.
    pub max_depth: usize,
    /// Deepest allowed chain of partials including partials.
    pub max_partial_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    program: Program,
    config: Config,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self> {
        Self::compile_with(source, &Config::default())
    }

    pub fn compile_with(source: &str, config: &Config) -> Result<Self> {
        let tokens = tokenize(source)?;
        let program = Parser::new(&tokens)
            .with_max_depth(config.max_depth)
            .parse()?;
        tracing::debug!(
            tokens = tokens.len(),
            nodes = program.body.len(),
            "compiled template"
        );
        Ok(Self {
            program,
            config: *config,
        })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Render without helpers or partials; such tags produce nothing.
    pub fn render(&self, ctx: &Context) -> String {
        self.render_with(ctx, &Registry::new())
    }

    pub fn render_with<R>(&self, ctx: &Context, registry: &R) -> String
    where
        R: HelperRegistry + PartialRegistry,
    {
        self.render_with_registries(ctx, registry, registry)
    }

    pub fn render_with_registries(
        &self,
        ctx: &Context,
        helpers: &dyn HelperRegistry,
        partials: &dyn PartialRegistry,
    ) -> String {
        Evaluator::new(helpers, partials)
            .with_max_partial_depth(self.config.max_partial_depth)
            .render(&self.program, ctx)
    }

    /// The template as a plain render function.
    pub fn renderer(&self) -> impl Fn(&Context) -> String + '_ {
        move |ctx: &Context| self.render(ctx)
    }
}

/// Turn a parsed program into a renderable template.
pub fn compile(program: Program) -> Template {
    Template {
        program,
        config: Config::default(),
    }
}

/// Compile and render in one step.
pub fn render(source: &str, ctx: &Context) -> Result<String> {
    Ok(Template::compile(source)?.render(ctx))
}
