pub mod error;
pub mod lexer;
pub mod token;

pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use token::{lookup_keyword, Span, Token, TokenKind};

pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    (tokens, lexer.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn t_empty_source() {
        let (tokens, errors) = tokenize("");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn t_integer_literals() {
        let k = kinds("5 10 123456789");
        assert_eq!(k[0], TokenKind::Int(5));
        assert_eq!(k[1], TokenKind::Int(10));
        assert_eq!(k[2], TokenKind::Int(123456789));
    }

    #[test]
    fn t_string_literal() {
        let (tokens, errors) = tokenize(r#""hello world""#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Str("hello world".to_string()));
    }

    #[test]
    fn t_escape_sequences() {
        let (tokens, errors) = tokenize(r#""foo\nbar\t\"baz\"""#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Str("foo\nbar\t\"baz\"".to_string()));
    }

    #[test]
    fn t_unterminated_string_error() {
        let (_tokens, errors) = tokenize("\"hello");
        assert!(!errors.is_empty());
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn t_bool_literals() {
        let k = kinds("true false");
        assert_eq!(k[0], TokenKind::True);
        assert_eq!(k[1], TokenKind::False);
    }

    #[test]
    fn t_keywords() {
        let k = kinds("fn let if else return macro");
        assert_eq!(k[0], TokenKind::Function);
        assert_eq!(k[1], TokenKind::Let);
        assert_eq!(k[2], TokenKind::If);
        assert_eq!(k[3], TokenKind::Else);
        assert_eq!(k[4], TokenKind::Return);
        assert_eq!(k[5], TokenKind::Macro);
    }

    #[test]
    fn t_identifiers() {
        let k = kinds("foo bar_baz _private x5");
        assert_eq!(k[0], TokenKind::Ident("foo".to_string()));
        assert_eq!(k[1], TokenKind::Ident("bar_baz".to_string()));
        assert_eq!(k[2], TokenKind::Ident("_private".to_string()));
        assert_eq!(k[3], TokenKind::Ident("x5".to_string()));
    }

    #[test]
    fn t_operators() {
        let k = kinds("= + - ! * / < > == !=");
        assert_eq!(
            k,
            vec![
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Bang,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::NotEq,
            ]
        );
    }

    #[test]
    fn t_delimiters() {
        let k = kinds(",;:(){}[]");
        assert_eq!(
            k,
            vec![
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn t_comment_skipped() {
        let k = kinds("let x = 5; // a comment\nlet y = 6;");
        assert_eq!(k[0], TokenKind::Let);
        assert!(k.contains(&TokenKind::Ident("y".to_string())));
    }

    #[test]
    fn t_illegal_character() {
        let (tokens, _errors) = tokenize("@");
        assert_eq!(tokens[0].kind, TokenKind::Illegal('@'));
    }

    #[test]
    fn t_let_statement_program() {
        let src = "let five = 5;\nlet ten = 10;\n\nlet add = fn(x, y) {\n  x + y;\n};\n\nlet result = add(five, ten);\n";
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Function));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn t_array_and_hash_literals() {
        let k = kinds(r#"[1, 2]; {"one": 1}"#);
        assert_eq!(k[0], TokenKind::LBracket);
        assert!(k.contains(&TokenKind::LBrace));
        assert!(k.contains(&TokenKind::Colon));
    }
}
