use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    String,

    // Operators
    Assign,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Bang,
    Lt,
    Gt,
    Eq,
    NotEq,

    // Delimiters
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    Declare,
    Return,
    If,
    Else,
    Print,
    Function,
    True,
    False,
    Length,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("buat", TokenKind::Declare),
        ("kembalikan", TokenKind::Return),
        ("jika", TokenKind::If),
        ("lainnya", TokenKind::Else),
        ("cetak", TokenKind::Print),
        ("fungsi", TokenKind::Function),
        ("benar", TokenKind::True),
        ("salah", TokenKind::False),
        ("panjang", TokenKind::Length),
    ])
});

/// Resolves a scanned word to its keyword kind, or `Ident` for user names.
pub fn lookup_ident(word: &str) -> TokenKind {
    KEYWORDS.get(word).copied().unwrap_or(TokenKind::Ident)
}

impl fmt::Display for TokenKind {
    /// The human-facing category name used in parser diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Int => "BILANGAN_BULAT",
            TokenKind::String => "STRING",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Asterisk => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Bang => "'!'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Eq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Declare => "BUAT",
            TokenKind::Return => "KEMBALIKAN",
            TokenKind::If => "JIKA",
            TokenKind::Else => "LAINNYA",
            TokenKind::Print => "CETAK",
            TokenKind::Function => "FUNGSI",
            TokenKind::True => "BENAR",
            TokenKind::False => "SALAH",
            TokenKind::Length => "PANJANG",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            literal: literal.into(),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Token::new(TokenKind::Eof, "", line)
    }
}

/// Anything the parser can pull tokens from, one at a time.
///
/// Once exhausted, a source keeps yielding `Eof` tokens.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;
}

/// A source over tokens that were scanned ahead of time. Once the tokens run
/// out, `Eof` carries the line of the last token seen.
pub struct TokenStream {
    tokens: std::vec::IntoIter<Token>,
    line: usize,
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        TokenStream {
            tokens: tokens.into_iter(),
            line: 1,
        }
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> Token {
        match self.tokens.next() {
            Some(token) => {
                self.line = token.line;
                token
            }
            None => Token::eof(self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    #[test]
    fn keywords_resolve_to_their_kinds() {
        init_test_logging();
        assert_eq!(lookup_ident("buat"), TokenKind::Declare);
        assert_eq!(lookup_ident("kembalikan"), TokenKind::Return);
        assert_eq!(lookup_ident("panjang"), TokenKind::Length);
        assert_eq!(lookup_ident("benar"), TokenKind::True);
    }

    #[test]
    fn non_keywords_are_identifiers() {
        init_test_logging();
        assert_eq!(lookup_ident("buatan"), TokenKind::Ident);
        assert_eq!(lookup_ident("x"), TokenKind::Ident);
    }

    #[test]
    fn exhausted_vector_source_yields_eof_forever() {
        init_test_logging();
        let mut source = TokenStream::from(vec![Token::new(TokenKind::Int, "1", 1)]);
        assert_eq!(source.next_token().kind, TokenKind::Int);
        assert_eq!(source.next_token().kind, TokenKind::Eof);
        assert_eq!(source.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn exhausted_stream_keeps_the_last_line() {
        init_test_logging();
        let mut source = TokenStream::from(vec![
            Token::new(TokenKind::Declare, "buat", 1),
            Token::new(TokenKind::Ident, "x", 3),
        ]);
        source.next_token();
        source.next_token();
        assert_eq!(source.next_token(), Token::eof(3));
    }
}
