use crate::ast::*;

/// Generic bottom-up AST rewrite: recurses into every child expression
/// first, then applies `f` to the (already-rewritten) node itself. Used by
/// the macro-expansion pass to splice `unquote`d fragments back into call
/// sites.
pub fn modify(expr: Expr, f: &mut dyn FnMut(Expr) -> Expr) -> Expr {
    let span = expr.span;
    let inner = match expr.inner {
        ExprKind::Prefix { operator, right } => ExprKind::Prefix {
            operator,
            right: Box::new(modify(*right, f)),
        },
        ExprKind::Infix { left, operator, right } => ExprKind::Infix {
            left: Box::new(modify(*left, f)),
            operator,
            right: Box::new(modify(*right, f)),
        },
        ExprKind::Index { left, index } => ExprKind::Index {
            left: Box::new(modify(*left, f)),
            index: Box::new(modify(*index, f)),
        },
        ExprKind::ArrayLiteral(items) => {
            ExprKind::ArrayLiteral(items.into_iter().map(|e| modify(e, f)).collect())
        }
        ExprKind::HashLiteral(pairs) => ExprKind::HashLiteral(
            pairs
                .into_iter()
                .map(|(k, v)| (modify(k, f), modify(v, f)))
                .collect(),
        ),
        ExprKind::If { condition, consequence, alternative } => ExprKind::If {
            condition: Box::new(modify(*condition, f)),
            consequence: modify_block(consequence, f),
            alternative: alternative.map(|b| modify_block(b, f)),
        },
        ExprKind::FunctionLiteral { parameters, body, name } => ExprKind::FunctionLiteral {
            parameters,
            body: modify_block(body, f),
            name,
        },
        ExprKind::Call { function, arguments } => ExprKind::Call {
            function: Box::new(modify(*function, f)),
            arguments: arguments.into_iter().map(|a| modify(a, f)).collect(),
        },
        other => other,
    };
    f(Node::new(inner, span))
}

fn modify_block(block: BlockStatement, f: &mut dyn FnMut(Expr) -> Expr) -> BlockStatement {
    BlockStatement {
        statements: block.statements.into_iter().map(|s| modify_stmt(s, f)).collect(),
        span: block.span,
    }
}

fn modify_stmt(stmt: Stmt, f: &mut dyn FnMut(Expr) -> Expr) -> Stmt {
    let span = stmt.span;
    let inner = match stmt.inner {
        StmtKind::Let { name, value } => StmtKind::Let { name, value: modify(value, f) },
        StmtKind::Return { value } => StmtKind::Return { value: modify(value, f) },
        StmtKind::Expression { expression } => {
            StmtKind::Expression { expression: modify(expression, f) }
        }
    };
    Node::new(inner, span)
}

pub fn modify_program(program: Program, f: &mut dyn FnMut(Expr) -> Expr) -> Program {
    Program { statements: program.statements.into_iter().map(|s| modify_stmt(s, f)).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_lexer::Span;

    fn dummy_span() -> Span {
        Span::new(1, 1, 0, 0)
    }

    fn one() -> Expr {
        Node::new(ExprKind::IntegerLiteral(1), dummy_span())
    }

    fn two() -> Expr {
        Node::new(ExprKind::IntegerLiteral(2), dummy_span())
    }

    fn turn_one_into_two(expr: Expr) -> Expr {
        match expr.inner {
            ExprKind::IntegerLiteral(1) => two(),
            _ => expr,
        }
    }

    #[test]
    fn t_modify_replaces_literal() {
        let result = modify(one(), &mut turn_one_into_two);
        assert_eq!(result.inner, ExprKind::IntegerLiteral(2));
    }

    #[test]
    fn t_modify_recurses_into_infix() {
        let expr = Node::new(
            ExprKind::Infix { left: Box::new(one()), operator: "+".to_string(), right: Box::new(one()) },
            dummy_span(),
        );
        let result = modify(expr, &mut turn_one_into_two);
        match result.inner {
            ExprKind::Infix { left, right, .. } => {
                assert_eq!(left.inner, ExprKind::IntegerLiteral(2));
                assert_eq!(right.inner, ExprKind::IntegerLiteral(2));
            }
            _ => panic!("expected infix"),
        }
    }

    #[test]
    fn t_modify_recurses_into_array() {
        let expr = Node::new(ExprKind::ArrayLiteral(vec![one(), one()]), dummy_span());
        let result = modify(expr, &mut turn_one_into_two);
        match result.inner {
            ExprKind::ArrayLiteral(items) => {
                assert!(items.iter().all(|e| e.inner == ExprKind::IntegerLiteral(2)));
            }
            _ => panic!("expected array"),
        }
    }
}
