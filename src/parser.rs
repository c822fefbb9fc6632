use crate::ast::*;
use crate::error::{ParseError, Result};
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

/// Deepest block nesting accepted unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One-pass recursive-descent parser over a token slice.
pub struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.cursor)
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.walk()?);
        }
        Ok(Program { body })
    }

    /// Parse one statement. The caller guarantees a current token.
    fn walk(&mut self) -> Result<Node> {
        let Some(token) = self.peek() else {
            return Err(ParseError::UnexpectedToken {
                found: "end of template".to_string(),
                span: self.end_span(),
            }
            .into());
        };

        let node = match &token.kind {
            TokenKind::Text(s) => Node::Text(s.clone()),
            TokenKind::Variable(path) => Node::Variable {
                path: Path::parse(path),
                span: token.span(),
            },
            TokenKind::RawVariable(path) => Node::RawVariable {
                path: Path::parse(path),
                span: token.span(),
            },
            TokenKind::Helper { name, args } => Node::Helper {
                name: name.clone(),
                args_raw: args.clone(),
                args: parse_args(args),
                span: token.span(),
            },
            TokenKind::Partial { name } => Node::Partial {
                name: name.clone(),
                span: token.span(),
            },
            TokenKind::BlockStart { block, expression } => {
                return self.parse_block(token, block, expression);
            }
            TokenKind::BlockEnd { .. } => {
                return Err(ParseError::UnexpectedToken {
                    found: token.describe(),
                    span: token.span(),
                }
                .into());
            }
        };
        self.cursor += 1;
        Ok(node)
    }

    fn parse_block(&mut self, start: &Token, block: &str, expression: &str) -> Result<Node> {
        if block != "if" && block != "each" {
            return Err(ParseError::UnknownBlock {
                block: block.to_string(),
                span: start.span(),
            }
            .into());
        }

        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                span: start.span(),
            }
            .into());
        }
        self.cursor += 1;

        let mut body = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::UnclosedBlock {
                        block: block.to_string(),
                        span: start.span(),
                    }
                    .into());
                }
                Some(Token {
                    kind: TokenKind::BlockEnd { block: end },
                    ..
                }) if end == block => {
                    self.cursor += 1;
                    break;
                }
                Some(_) => body.push(self.walk()?),
            }
        }
        self.depth -= 1;

        let path = Path::parse(expression);
        let span = start.span();
        Ok(if block == "if" {
            Node::If {
                test: path,
                body,
                span,
            }
        } else {
            Node::Each {
                source: path,
                body,
                span,
            }
        })
    }

    fn end_span(&self) -> miette::SourceSpan {
        let end = self.tokens.last().map_or(0, |t| t.end);
        (end, 0).into()
    }
}

/// Parse a token stream into a program with the default nesting limit.
pub fn parse(tokens: &[Token]) -> Result<Program> {
    let program = Parser::new(tokens).parse()?;
    tracing::debug!(nodes = program.body.len(), "parsed template");
    Ok(program)
}

/// Split a helper's raw argument string into literals and paths.
///
/// Quoted strings may contain spaces; an unterminated quote runs to the end.
pub fn parse_args(raw: &str) -> Vec<Arg> {
    let mut args = Vec::new();
    let mut chars = raw.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let mut s = String::new();
            for (_, ch) in chars.by_ref() {
                if ch == c {
                    break;
                }
                s.push(ch);
            }
            args.push(Arg::Literal(Value::String(s)));
            continue;
        }

        let mut end = raw.len();
        while let Some(&(i, ch)) = chars.peek() {
            if ch.is_whitespace() {
                end = i;
                break;
            }
            chars.next();
        }
        args.push(classify_word(&raw[start..end]));
    }

    args
}

fn classify_word(word: &str) -> Arg {
    match word {
        "true" => return Arg::Literal(Value::Bool(true)),
        "false" => return Arg::Literal(Value::Bool(false)),
        "null" => return Arg::Literal(Value::Null),
        _ => {}
    }
    // Only digit-led words are numbers, so `inf` or `NaN` stay paths.
    let numeric = word
        .trim_start_matches('-')
        .starts_with(|c: char| c.is_ascii_digit() || c == '.');
    match word.parse::<f64>() {
        Ok(n) if numeric => Arg::Literal(Value::Number(n)),
        _ => Arg::Path(Path::parse(word)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::lexer::tokenize;

    fn parse_str(src: &str) -> Result<Program> {
        parse(&tokenize(src)?)
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_str(src).unwrap_err() {
            TemplateError::Parse(e) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn nested_blocks_build_a_tree() {
        let program = parse_str("{{#each users}}{{#if active}}{{name}}{{/if}}{{/each}}").unwrap();
        assert_eq!(program.body.len(), 1);
        let Node::Each { source, body, .. } = &program.body[0] else {
            panic!("expected each, got {:?}", program.body[0]);
        };
        assert_eq!(source.as_str(), "users");
        let Node::If { test, body, .. } = &body[0] else {
            panic!("expected if");
        };
        assert_eq!(test.segments(), ["active".to_string()]);
        assert!(matches!(&body[0], Node::Variable { path, .. } if path.as_str() == "name"));
    }

    #[test]
    fn leaf_tags_become_nodes() {
        let program = parse_str("{{{raw}}}{{> footer}}{{fmt price 'USD'}}").unwrap();
        assert!(matches!(&program.body[0], Node::RawVariable { path, .. } if path.as_str() == "raw"));
        assert!(matches!(&program.body[1], Node::Partial { name, .. } if name == "footer"));
        match &program.body[2] {
            Node::Helper { name, args_raw, args, .. } => {
                assert_eq!(name, "fmt");
                assert_eq!(args_raw, "price 'USD'");
                assert_eq!(
                    args,
                    &vec![
                        Arg::Path(Path::parse("price")),
                        Arg::Literal(Value::from("USD"))
                    ]
                );
            }
            other => panic!("expected helper, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_end_is_rejected() {
        let err = parse_err("{{#if x}}..{{/each}}");
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "`{{/each}}`"));
        assert_eq!(err.span().offset(), 11);
    }

    #[test]
    fn stray_end_is_rejected() {
        assert!(matches!(
            parse_err("text{{/if}}"),
            ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn missing_end_is_rejected() {
        let err = parse_err("a{{#each items}}{{this}}");
        assert!(matches!(err, ParseError::UnclosedBlock { ref block, .. } if block == "each"));
        assert_eq!(err.span().offset(), 1);
    }

    #[test]
    fn unknown_block_fails_loudly() {
        assert!(matches!(
            parse_err("{{#with user}}{{name}}{{/with}}"),
            ParseError::UnknownBlock { ref block, .. } if block == "with"
        ));
    }

    #[test]
    fn empty_block_name_is_unknown() {
        let err = parse_err("{{#}}x{{/}}");
        assert!(matches!(err, ParseError::UnknownBlock { ref block, .. } if block.is_empty()));
        assert_eq!(err.span().offset(), 0);
    }

    #[test]
    fn empty_block_expression_parses_to_empty_path() {
        let program = parse_str("{{#if}}x{{/if}}").unwrap();
        let Node::If { test, body, .. } = &program.body[0] else {
            panic!("expected if, got {:?}", program.body[0]);
        };
        assert!(test.segments().is_empty());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn nesting_limit() {
        let deep = "{{#if a}}".repeat(3) + &"{{/if}}".repeat(3);
        let tokens = tokenize(&deep).unwrap();
        assert!(Parser::new(&tokens).with_max_depth(3).parse().is_ok());
        let err = Parser::new(&tokens).with_max_depth(2).parse().unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Parse(ParseError::TooDeep { limit: 2, .. })
        ));
    }

    #[test]
    fn helper_arguments() {
        assert_eq!(
            parse_args(r#" user.name "two words" 'x' -1.5 3 true null inf "#),
            vec![
                Arg::Path(Path::parse("user.name")),
                Arg::Literal(Value::from("two words")),
                Arg::Literal(Value::from("x")),
                Arg::Literal(Value::Number(-1.5)),
                Arg::Literal(Value::Number(3.0)),
                Arg::Literal(Value::Bool(true)),
                Arg::Literal(Value::Null),
                Arg::Path(Path::parse("inf")),
            ]
        );
        assert!(parse_args("   ").is_empty());
        assert_eq!(parse_args("'open"), vec![Arg::Literal(Value::from("open"))]);
    }

    #[test]
    fn empty_path_has_no_segments() {
        assert!(Path::parse("").segments().is_empty());
        assert_eq!(Path::parse("this.name").segments().len(), 2);
    }
}
