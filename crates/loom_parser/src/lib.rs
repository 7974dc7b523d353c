pub mod ast;
pub mod error;
pub mod modify;
pub mod parser;
pub mod trace;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use parser::Parser;

use loom_lexer::tokenize as lex;

pub fn parse(source: &str) -> (Program, Vec<loom_lexer::LexError>, Vec<ParseError>) {
    let (tokens, lex_errors) = lex(source);
    let mut parser = Parser::new(tokens);
    let program = parser.parse();
    (program, lex_errors, parser.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, lex_errors, parse_errors) = parse(src);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
        program
    }

    fn first_stmt(src: &str) -> StmtKind {
        parse_ok(src).statements.into_iter().next().unwrap().inner
    }

    fn first_expr(src: &str) -> ExprKind {
        match first_stmt(src) {
            StmtKind::Expression { expression } => expression.inner,
            StmtKind::Let { value, .. } => value.inner,
            other => panic!("expected expression/let, got {:?}", other),
        }
    }

    #[test]
    fn t_let_statements() {
        let tests = [("let x = 5;", "x"), ("let y = true;", "y"), ("let foobar = y;", "foobar")];
        for (src, name) in tests {
            match first_stmt(src) {
                StmtKind::Let { name: n, .. } => assert_eq!(n.name, name),
                other => panic!("expected let, got {:?}", other),
            }
        }
    }

    #[test]
    fn t_return_statements() {
        for src in ["return 5;", "return true;", "return foobar;"] {
            assert!(matches!(first_stmt(src), StmtKind::Return { .. }));
        }
    }

    #[test]
    fn t_identifier_expression() {
        assert_eq!(first_expr("foobar;"), ExprKind::Identifier("foobar".to_string()));
    }

    #[test]
    fn t_integer_literal_expression() {
        assert_eq!(first_expr("5;"), ExprKind::IntegerLiteral(5));
    }

    #[test]
    fn t_string_literal_expression() {
        assert_eq!(first_expr(r#""hello world";"#), ExprKind::StringLiteral("hello world".to_string()));
    }

    #[test]
    fn t_boolean_expression() {
        assert_eq!(first_expr("true;"), ExprKind::Boolean(true));
        assert_eq!(first_expr("false;"), ExprKind::Boolean(false));
    }

    #[test]
    fn t_prefix_expressions() {
        match first_expr("!5;") {
            ExprKind::Prefix { operator, right } => {
                assert_eq!(operator, "!");
                assert_eq!(right.inner, ExprKind::IntegerLiteral(5));
            }
            other => panic!("expected prefix, got {:?}", other),
        }
        match first_expr("-15;") {
            ExprKind::Prefix { operator, right } => {
                assert_eq!(operator, "-");
                assert_eq!(right.inner, ExprKind::IntegerLiteral(15));
            }
            other => panic!("expected prefix, got {:?}", other),
        }
    }

    #[test]
    fn t_infix_expressions() {
        let tests = [
            ("5 + 5;", 5, "+", 5),
            ("5 - 5;", 5, "-", 5),
            ("5 * 5;", 5, "*", 5),
            ("5 / 5;", 5, "/", 5),
            ("5 > 5;", 5, ">", 5),
            ("5 < 5;", 5, "<", 5),
            ("5 == 5;", 5, "==", 5),
            ("5 != 5;", 5, "!=", 5),
        ];
        for (src, left, op, right) in tests {
            match first_expr(src) {
                ExprKind::Infix { left: l, operator, right: r } => {
                    assert_eq!(l.inner, ExprKind::IntegerLiteral(left));
                    assert_eq!(operator, op);
                    assert_eq!(r.inner, ExprKind::IntegerLiteral(right));
                }
                other => panic!("expected infix, got {:?}", other),
            }
        }
    }

    #[test]
    fn t_operator_precedence() {
        let tests = [
            ("-a * b", "((-a) * b)\n"),
            ("a + b + c", "((a + b) + c)\n"),
            ("a + b - c", "((a + b) - c)\n"),
            ("a * b * c", "((a * b) * c)\n"),
            ("a + b * c", "(a + (b * c))\n"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)\n"),
            ("3 + 4; -5 * 5", "(3 + 4)\n((-5) * 5)\n"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))\n"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))\n"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))\n"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)\n"),
            ("(5 + 5) * 2", "((5 + 5) * 2)\n"),
            ("-(5 + 5)", "(-(5 + 5))\n"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)\n"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))\n",
            ),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)\n"),
            ("add(a * b[2], b[1], 2 * [1, 2][1])", "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))\n"),
        ];
        for (src, expected) in tests {
            let program = parse_ok(src);
            assert_eq!(program.to_string(), expected, "source: {}", src);
        }
    }

    #[test]
    fn t_if_expression() {
        match first_expr("if (x < y) { x }") {
            ExprKind::If { alternative, .. } => assert!(alternative.is_none()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn t_if_else_expression() {
        match first_expr("if (x < y) { x } else { y }") {
            ExprKind::If { alternative, .. } => assert!(alternative.is_some()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn t_function_literal() {
        match first_expr("fn(x, y) { x + y; }") {
            ExprKind::FunctionLiteral { parameters, .. } => {
                assert_eq!(parameters.len(), 2);
                assert_eq!(parameters[0].name, "x");
                assert_eq!(parameters[1].name, "y");
            }
            other => panic!("expected function literal, got {:?}", other),
        }
    }

    #[test]
    fn t_function_literal_names_itself_when_let_bound() {
        match first_stmt("let myFunction = fn() { };") {
            StmtKind::Let { value, .. } => match value.inner {
                ExprKind::FunctionLiteral { name, .. } => assert_eq!(name, Some("myFunction".to_string())),
                other => panic!("expected function literal, got {:?}", other),
            },
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn t_call_expression() {
        match first_expr("add(1, 2 * 3, 4 + 5);") {
            ExprKind::Call { arguments, .. } => assert_eq!(arguments.len(), 3),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn t_array_literal() {
        match first_expr("[1, 2 * 2, 3 + 3]") {
            ExprKind::ArrayLiteral(items) => assert_eq!(items.len(), 3),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn t_empty_array_literal() {
        match first_expr("[]") {
            ExprKind::ArrayLiteral(items) => assert!(items.is_empty()),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn t_index_expression() {
        match first_expr("myArray[1 + 1]") {
            ExprKind::Index { index, .. } => match index.inner {
                ExprKind::Infix { operator, .. } => assert_eq!(operator, "+"),
                other => panic!("expected infix index, got {:?}", other),
            },
            other => panic!("expected index, got {:?}", other),
        }
    }

    #[test]
    fn t_hash_literal_string_keys() {
        match first_expr(r#"{"one": 1, "two": 2, "three": 3}"#) {
            ExprKind::HashLiteral(pairs) => assert_eq!(pairs.len(), 3),
            other => panic!("expected hash, got {:?}", other),
        }
    }

    #[test]
    fn t_empty_hash_literal() {
        match first_expr("{}") {
            ExprKind::HashLiteral(pairs) => assert!(pairs.is_empty()),
            other => panic!("expected hash, got {:?}", other),
        }
    }

    #[test]
    fn t_macro_literal() {
        match first_expr("macro(x, y) { x + y; }") {
            ExprKind::MacroLiteral { parameters, .. } => assert_eq!(parameters.len(), 2),
            other => panic!("expected macro literal, got {:?}", other),
        }
    }

    #[test]
    fn t_parser_error_recovery_continues() {
        let (program, _, parse_errors) = parse("let = 5; let y = 10;");
        assert!(!parse_errors.is_empty());
        assert!(!program.statements.is_empty());
    }
}
