use crate::error::{Result, UnclosedTagError};
use miette::SourceSpan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text(String),
    Variable(String),    // {{ user.name }}
    RawVariable(String), // {{{ user.name }}}
    BlockStart {
        block: String,      // "if", "each", ...
        expression: String, // unparsed, words joined by single spaces
    },
    BlockEnd {
        block: String,
    },
    Partial {
        name: String, // {{> header }}
    },
    Helper {
        name: String,
        args: String, // unparsed
    },
}

/// One lexical unit with its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn span(&self) -> SourceSpan {
        (self.start..self.end).into()
    }

    /// Short human-readable form used in parse errors.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::Variable(path) => format!("variable `{path}`"),
            TokenKind::RawVariable(path) => format!("raw variable `{path}`"),
            TokenKind::BlockStart { block, .. } => format!("`{{{{#{block}}}}}`"),
            TokenKind::BlockEnd { block } => format!("`{{{{/{block}}}}}`"),
            TokenKind::Partial { name } => format!("partial `{name}`"),
            TokenKind::Helper { name, .. } => format!("helper `{name}`"),
        }
    }
}

/// Splits template source into tokens. The cursor only moves forward.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    /// Emit a token covering the next `len` bytes and move past them.
    fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.cursor;
        self.cursor += len;
        Token {
            kind,
            start,
            end: self.cursor,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let rest = self.remaining();
        if rest.is_empty() {
            return Ok(None);
        }

        let token = match rest.find("{{") {
            Some(0) => self.lex_tag()?,
            Some(idx) => self.emit(TokenKind::Text(rest[..idx].to_string()), idx),
            None => self.emit(TokenKind::Text(rest.to_string()), rest.len()),
        };
        tracing::trace!(kind = ?token.kind, start = token.start, end = token.end, "token");
        Ok(Some(token))
    }

    /// Lex a tag; the cursor sits on its `{{`.
    fn lex_tag(&mut self) -> Result<Token> {
        let open = self.cursor;
        let rest = self.remaining();

        if let Some(after) = rest.strip_prefix("{{{") {
            let close = after
                .find("}}}")
                .ok_or_else(|| UnclosedTagError::triple_stash(open))?;
            let inner = after[..close].trim();
            return Ok(self.emit(TokenKind::RawVariable(inner.to_string()), 3 + close + 3));
        }

        let after = &rest[2..];
        let close = after
            .find("}}")
            .ok_or_else(|| UnclosedTagError::tag(open))?;
        let kind = classify(after[..close].trim());
        Ok(self.emit(kind, 2 + close + 2))
    }
}

/// Classify the trimmed inner text of a `{{ ... }}` tag.
fn classify(inner: &str) -> TokenKind {
    if inner.is_empty() {
        // Empty tags pass through as literal text.
        return TokenKind::Text("{{}}".to_string());
    }

    if let Some(rest) = inner.strip_prefix('#') {
        let mut words = rest.split_whitespace();
        let block = words.next().unwrap_or_default().to_string();
        let expression = words.collect::<Vec<_>>().join(" ");
        return TokenKind::BlockStart { block, expression };
    }
    if let Some(rest) = inner.strip_prefix('/') {
        return TokenKind::BlockEnd {
            block: rest.trim().to_string(),
        };
    }
    if let Some(rest) = inner.strip_prefix('>') {
        return TokenKind::Partial {
            name: rest.trim().to_string(),
        };
    }

    match inner.find(' ') {
        Some(space) => TokenKind::Helper {
            name: inner[..space].trim().to_string(),
            args: inner[space + 1..].trim().to_string(),
        },
        None => TokenKind::Variable(inner.to_string()),
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                // Nothing sensible follows an unclosed tag.
                self.cursor = self.input.len();
                Some(Err(e))
            }
        }
    }
}

/// Tokenize a whole template.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let tokens = Tokenizer::new(input).collect::<Result<Vec<_>>>()?;
    tracing::debug!(bytes = input.len(), tokens = tokens.len(), "tokenized template");
    Ok(tokens)
}
