use crate::error::LexError;
use crate::token::{lookup_keyword, Span, Token, TokenKind};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    pub errors: Vec<LexError>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_token(&self, kind: TokenKind, start: usize, start_line: usize, start_col: usize, lexeme: impl Into<String>) -> Token {
        Token::new(kind, Span::new(start_line, start_col, start, self.pos), lexeme)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Drives the whole pass, collecting tokens until (and including) Eof.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let ch = match self.advance() {
            None => return self.make_token(TokenKind::Eof, start, start_line, start_col, ""),
            Some(c) => c,
        };

        let kind = match ch {
            '=' => {
                if self.match_char('=') {
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '"' => return self.lex_string(start, start_line, start_col),
            c if c.is_ascii_digit() => return self.lex_number(start, start_line, start_col),
            c if is_ident_start(c) => return self.lex_identifier(start, start_line, start_col),
            c => {
                self.errors.push(LexError::UnexpectedCharacter {
                    ch: c,
                    span: Span::new(start_line, start_col, start, self.pos),
                });
                TokenKind::Illegal(c)
            }
        };

        let lexeme: String = self.source[start..self.pos].iter().collect();
        self.make_token(kind, start, start_line, start_col, lexeme)
    }

    fn lex_string(&mut self, start: usize, start_line: usize, start_col: usize) -> Token {
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    self.errors.push(LexError::UnterminatedString {
                        span: Span::new(start_line, start_col, start, self.pos),
                    });
                    break;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let esc_start = self.pos;
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('0') => value.push('\0'),
                        Some(other) => {
                            let seq: String = self.source[esc_start..self.pos].iter().collect();
                            self.errors.push(LexError::InvalidEscapeSequence {
                                seq,
                                span: Span::new(start_line, start_col, esc_start, self.pos),
                            });
                            value.push(other);
                        }
                        None => {
                            self.errors.push(LexError::UnterminatedString {
                                span: Span::new(start_line, start_col, start, self.pos),
                            });
                            break;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        self.make_token(TokenKind::Str(value.clone()), start, start_line, start_col, value)
    }

    fn lex_number(&mut self, start: usize, start_line: usize, start_col: usize) -> Token {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
        let raw: String = self.source[start..self.pos].iter().collect();
        match raw.parse::<i64>() {
            Ok(n) => self.make_token(TokenKind::Int(n), start, start_line, start_col, raw),
            Err(_) => {
                self.errors.push(LexError::InvalidNumber {
                    raw: raw.clone(),
                    span: Span::new(start_line, start_col, start, self.pos),
                });
                self.make_token(TokenKind::Int(0), start, start_line, start_col, raw)
            }
        }
    }

    fn lex_identifier(&mut self, start: usize, start_line: usize, start_col: usize) -> Token {
        while self.peek().map_or(false, is_ident_continue) {
            self.advance();
        }
        let raw: String = self.source[start..self.pos].iter().collect();
        let kind = lookup_keyword(&raw).unwrap_or_else(|| TokenKind::Ident(raw.clone()));
        self.make_token(kind, start, start_line, start_col, raw)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
