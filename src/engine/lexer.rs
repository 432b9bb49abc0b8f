use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, digit1, multispace1, satisfy},
    combinator::{recognize, value},
    sequence::{delimited, pair},
};
use tracing::{instrument, trace};

use crate::engine::token::{Token, TokenKind, TokenSource, lookup_ident};

fn whitespace(input: &str) -> IResult<&str, &str> {
    multispace1(input)
}

// `// ...` up to, but not including, the newline.
fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), take_till(|c| c == '\n'))).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn integer(input: &str) -> IResult<&str, &str> {
    digit1(input)
}

fn string_literal(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c| c != '"'), char('"')).parse(input)
}

fn operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Eq, tag("==")),
        value(TokenKind::NotEq, tag("!=")),
        value(TokenKind::Assign, tag("=")),
        value(TokenKind::Plus, tag("+")),
        value(TokenKind::Minus, tag("-")),
        value(TokenKind::Asterisk, tag("*")),
        value(TokenKind::Slash, tag("/")),
        value(TokenKind::Bang, tag("!")),
        value(TokenKind::Lt, tag("<")),
        value(TokenKind::Gt, tag(">")),
    ))
    .parse(input)
}

fn delimiter(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Comma, tag(",")),
        value(TokenKind::Semicolon, tag(";")),
        value(TokenKind::LParen, tag("(")),
        value(TokenKind::RParen, tag(")")),
        value(TokenKind::LBrace, tag("{")),
        value(TokenKind::RBrace, tag("}")),
        value(TokenKind::LBracket, tag("[")),
        value(TokenKind::RBracket, tag("]")),
    ))
    .parse(input)
}

/// Single-pass scanner over kusmala source text.
pub struct Lexer<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            rest: input,
            line: 1,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            if let Ok((rest, spaces)) = whitespace(self.rest) {
                self.line += spaces.matches('\n').count();
                self.rest = rest;
            } else if let Ok((rest, _)) = comment(self.rest) {
                self.rest = rest;
            } else {
                break;
            }
        }
    }

    fn advance(&mut self, rest: &'a str, kind: TokenKind, literal: &str) -> Token {
        let token = Token::new(kind, literal, self.line);
        self.line += literal.matches('\n').count();
        self.rest = rest;
        trace!(?token, "Scanned token");
        token
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let input = self.rest;
        if input.is_empty() {
            return Token::eof(self.line);
        }

        if let Ok((rest, word)) = identifier(input) {
            return self.advance(rest, lookup_ident(word), word);
        }
        if let Ok((rest, digits)) = integer(input) {
            return self.advance(rest, TokenKind::Int, digits);
        }
        if let Ok((rest, kind)) = operator(input) {
            let literal = &input[..input.len() - rest.len()];
            return self.advance(rest, kind, literal);
        }
        if let Ok((rest, kind)) = delimiter(input) {
            let literal = &input[..input.len() - rest.len()];
            return self.advance(rest, kind, literal);
        }
        if input.starts_with('"') {
            return match string_literal(input) {
                Ok((rest, content)) => self.advance(rest, TokenKind::String, content),
                // Unterminated: swallow the remainder so the next call sees Eof.
                Err(_) => self.advance("", TokenKind::Illegal, input),
            };
        }

        let width = input.chars().next().map_or(1, char::len_utf8);
        let (illegal, rest) = input.split_at(width);
        self.advance(rest, TokenKind::Illegal, illegal)
    }
}

/// Scans the whole input, ending with exactly one `Eof` token.
#[instrument(level = "debug", skip(input))]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_declaration() {
        init_test_logging();
        assert_eq!(
            kinds("buat x = 5;"),
            vec![
                TokenKind::Declare,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_two_character_operators() {
        init_test_logging();
        assert_eq!(
            kinds("a == b != !c = d"),
            vec![
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
                TokenKind::NotEq,
                TokenKind::Bang,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_keeps_raw_content() {
        init_test_logging();
        let tokens = tokenize(r#"cetak("halo dunia")"#);
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].literal, "halo dunia");
    }

    #[test]
    fn tracks_lines_across_newlines_and_comments() {
        init_test_logging();
        let tokens = tokenize("buat x = 1;\n// komentar\n\nx");
        let x = tokens.iter().rev().find(|t| t.kind == TokenKind::Ident);
        assert_eq!(x.map(|t| t.line), Some(4));
        assert_eq!(tokens[0].line, 1);
    }

    #[test]
    fn multi_line_string_advances_line_counter() {
        init_test_logging();
        let tokens = tokenize("\"a\nb\" x");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unknown_character_is_illegal() {
        init_test_logging();
        let tokens = tokenize("1 @ 2");
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].literal, "@");
        assert_eq!(tokens[2].kind, TokenKind::Int);
    }

    #[test]
    fn unterminated_string_is_illegal_then_eof() {
        init_test_logging();
        assert_eq!(
            kinds("\"tidak selesai"),
            vec![TokenKind::Illegal, TokenKind::Eof]
        );
    }

    #[test]
    fn identifiers_may_contain_digits_and_underscores() {
        init_test_logging();
        let tokens = tokenize("_nilai2 fungsi");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].literal, "_nilai2");
        assert_eq!(tokens[1].kind, TokenKind::Function);
    }
}
