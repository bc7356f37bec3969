use thiserror::Error;
use crate::ast::{CommandTree, Operator, SimpleCommand, Word};
use crate::lexer::{LexError, Lexer, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },
    #[error("Input is empty")]
    EmptyInput,
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Parse one command line.
pub fn parse_line(line: &str) -> Result<CommandTree, ParseError> {
    let tokens = Lexer::tokenize(line)?;
    Parser::new(&tokens).parse()
}

/// Recursive descent over the token list. Loosest binding first:
/// `;`, `&`, `&&`/`||`, `|`. Every level is left-associative.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<CommandTree, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let tree = self.parse_sequence()?;
        match self.peek() {
            None => Ok(tree),
            Some(tok) => Err(unexpected(tok)),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_sequence(&mut self) -> Result<CommandTree, ParseError> {
        let mut node = self.parse_parallel()?;
        while self.consume(&TokenKind::Semicolon) {
            // A trailing `;` ends the line.
            if self.peek().is_none() {
                break;
            }
            let rhs = self.parse_parallel()?;
            node = CommandTree::compound(Operator::Sequential, node, rhs);
        }
        Ok(node)
    }

    fn parse_parallel(&mut self) -> Result<CommandTree, ParseError> {
        let mut node = self.parse_and_or()?;
        while self.consume(&TokenKind::Amp) {
            // A trailing `&` runs the left side alone; branches are always reaped.
            if self.peek().is_none_or(|t| t.kind == TokenKind::Semicolon) {
                break;
            }
            let rhs = self.parse_and_or()?;
            node = CommandTree::compound(Operator::Parallel, node, rhs);
        }
        Ok(node)
    }

    fn parse_and_or(&mut self) -> Result<CommandTree, ParseError> {
        let mut node = self.parse_pipeline()?;
        loop {
            let op = if self.consume(&TokenKind::And) {
                Operator::ConditionalZero
            } else if self.consume(&TokenKind::Or) {
                Operator::ConditionalNonZero
            } else {
                break;
            };
            let rhs = self.parse_pipeline()?;
            node = CommandTree::compound(op, node, rhs);
        }
        Ok(node)
    }

    fn parse_pipeline(&mut self) -> Result<CommandTree, ParseError> {
        let mut node = self.parse_simple()?;
        while self.consume(&TokenKind::Pipe) {
            let rhs = self.parse_simple()?;
            node = CommandTree::compound(Operator::Pipe, node, rhs);
        }
        Ok(node)
    }

    /// Words and redirections in any order; the first word is the verb.
    fn parse_simple(&mut self) -> Result<CommandTree, ParseError> {
        let mut cmd: Option<SimpleCommand> = None;
        let mut pending = Vec::new();

        while let Some(tok) = self.peek() {
            if tok.kind == TokenKind::Word {
                self.pos += 1;
                match cmd.as_mut() {
                    Some(c) => c.args.push(tok.lexeme.clone()),
                    None => cmd = Some(SimpleCommand::with_verb(verb_word(&tok.lexeme))),
                }
            } else if tok.kind.is_redirect() {
                self.pos += 1;
                let target = self.expect_word()?;
                pending.push((tok.kind.clone(), target));
            } else {
                break;
            }
        }

        let Some(mut cmd) = cmd else {
            return Err(match self.peek() {
                Some(tok) => unexpected(tok),
                None => ParseError::UnexpectedEof,
            });
        };
        for (kind, target) in pending {
            apply_redirect(&mut cmd, &kind, target);
        }
        Ok(CommandTree::Simple(cmd))
    }

    fn expect_word(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Word => {
                self.pos += 1;
                Ok(tok.lexeme.clone())
            }
            Some(tok) => Err(unexpected(tok)),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}

fn unexpected(tok: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        found: tok.lexeme.clone(),
        pos: tok.span.0,
    }
}

/// `NAME=VALUE` in verb position becomes the chain `[NAME, "=", VALUE]`.
fn verb_word(text: &str) -> Word {
    match text.split_once('=') {
        Some((name, value)) if is_name(name) => {
            if value.is_empty() {
                Word::from_parts([name, "="])
            } else {
                Word::from_parts([name, "=", value])
            }
        }
        _ => Word::new(text),
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn apply_redirect(cmd: &mut SimpleCommand, kind: &TokenKind, target: String) {
    match kind {
        TokenKind::RedirectIn => cmd.stdin = Some(target),
        TokenKind::RedirectOut | TokenKind::RedirectAppend => {
            cmd.append_stdout = *kind == TokenKind::RedirectAppend;
            cmd.stdout = Some(target);
        }
        TokenKind::RedirectErr | TokenKind::RedirectErrAppend => {
            cmd.append_stderr = *kind == TokenKind::RedirectErrAppend;
            cmd.stderr = Some(target);
        }
        TokenKind::RedirectBoth => {
            cmd.append_stdout = false;
            cmd.append_stderr = false;
            cmd.stdout = Some(target.clone());
            cmd.stderr = Some(target);
        }
        _ => {}
    }
}
