#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word,               // Command name, argument or file name
    Semicolon,          // ;
    Amp,                // &
    And,                // &&
    Or,                 // ||
    Pipe,               // |
    RedirectIn,         // <
    RedirectOut,        // >
    RedirectAppend,     // >>
    RedirectErr,        // 2>
    RedirectErrAppend,  // 2>>
    RedirectBoth,       // &>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,       // Word text with quotes removed, or the operator
    pub span: (usize, usize), // Position info [start, end)
}

impl TokenKind {
    pub fn is_redirect(&self) -> bool {
        matches!(
            self,
            TokenKind::RedirectIn
                | TokenKind::RedirectOut
                | TokenKind::RedirectAppend
                | TokenKind::RedirectErr
                | TokenKind::RedirectErrAppend
                | TokenKind::RedirectBoth
        )
    }
}
