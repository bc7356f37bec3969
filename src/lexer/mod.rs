pub mod token;

use thiserror::Error;
pub use token::{Token, TokenKind};

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexError {
    #[error("Unterminated quote '{0}' starting at position {1}")]
    UnterminatedQuote(char, usize),
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        while self.peek_at(0).is_some_and(is_blank) {
            self.pos += 1;
        }
        let Some(ch) = self.peek_at(0) else {
            return Ok(None);
        };
        let start = self.pos;

        let operator = match ch {
            ';' => Some((TokenKind::Semicolon, 1)),
            '|' if self.peek_at(1) == Some('|') => Some((TokenKind::Or, 2)),
            '|' => Some((TokenKind::Pipe, 1)),
            '&' if self.peek_at(1) == Some('&') => Some((TokenKind::And, 2)),
            '&' if self.peek_at(1) == Some('>') => Some((TokenKind::RedirectBoth, 2)),
            '&' => Some((TokenKind::Amp, 1)),
            '<' => Some((TokenKind::RedirectIn, 1)),
            '>' if self.peek_at(1) == Some('>') => Some((TokenKind::RedirectAppend, 2)),
            '>' => Some((TokenKind::RedirectOut, 1)),
            // `2>` only counts at the start of a token.
            '2' if self.peek_at(1) == Some('>') => {
                if self.peek_at(2) == Some('>') {
                    Some((TokenKind::RedirectErrAppend, 3))
                } else {
                    Some((TokenKind::RedirectErr, 2))
                }
            }
            _ => None,
        };

        if let Some((kind, len)) = operator {
            self.pos += len;
            return Ok(Some(Token {
                kind,
                lexeme: self.chars[start..self.pos].iter().collect(),
                span: (start, self.pos),
            }));
        }

        self.read_word(start).map(Some)
    }

    fn read_word(&mut self, start: usize) -> Result<Token, LexError> {
        let mut buf = String::new();
        while let Some(ch) = self.peek_at(0) {
            match ch {
                c if is_blank(c) || is_operator_char(c) => break,
                '"' | '\'' => {
                    let quote_pos = self.pos;
                    self.pos += 1;
                    loop {
                        match self.peek_at(0) {
                            Some(c) if c == ch => {
                                self.pos += 1;
                                break;
                            }
                            Some(c) => {
                                buf.push(c);
                                self.pos += 1;
                            }
                            None => return Err(LexError::UnterminatedQuote(ch, quote_pos)),
                        }
                    }
                }
                c => {
                    buf.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Token {
            kind: TokenKind::Word,
            lexeme: buf,
            span: (start, self.pos),
        })
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_operator_char(c: char) -> bool {
    matches!(c, ';' | '|' | '&' | '<' | '>')
}
