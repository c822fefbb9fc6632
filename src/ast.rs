use crate::value::Value;
use miette::SourceSpan;
use std::fmt;

/// A dotted lookup path, split once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    raw: String,
    segments: Vec<String>,
}

impl Path {
    pub fn parse(raw: &str) -> Self {
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('.').map(str::to_string).collect()
        };
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One argument of a helper call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Value), // 'text', "text", 12, true, null
    Path(Path),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable {
        path: Path,
        span: SourceSpan,
    },
    /// `{{{ path }}}`; renders exactly like `Variable` since no escaping is applied.
    RawVariable {
        path: Path,
        span: SourceSpan,
    },
    Helper {
        name: String,
        args_raw: String,
        args: Vec<Arg>,
        span: SourceSpan,
    },
    Partial {
        name: String,
        span: SourceSpan,
    },
    If {
        test: Path,
        body: Vec<Node>,
        span: SourceSpan, // the opening tag
    },
    Each {
        source: Path,
        body: Vec<Node>,
        span: SourceSpan,
    },
}

/// The root of a parsed template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Node>,
}
