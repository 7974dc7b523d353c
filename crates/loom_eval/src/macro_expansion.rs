use std::collections::HashMap;

use loom_parser::modify::{modify, modify_program};
use loom_parser::{BlockStatement, Expr, ExprKind, Identifier, Program, StmtKind};

/// A `macro(...) { ... }` literal bound by a top-level `let`, captured before
/// the rest of the program ever sees it — grounded on
/// `original_source/monkey/eval/macro_expansion.go`'s `DefineMacros`.
#[derive(Clone)]
pub struct MacroDef {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

/// Strips every top-level `let name = macro(...) { ... };` out of `program`
/// and returns them keyed by name. Only top-level definitions count, the
/// same restriction the original imposes.
pub fn define_macros(program: &mut Program) -> HashMap<String, MacroDef> {
    let mut macros = HashMap::new();
    let mut definition_indices = Vec::new();
    for (i, stmt) in program.statements.iter().enumerate() {
        if let StmtKind::Let { name, value } = &stmt.inner {
            if let ExprKind::MacroLiteral { parameters, body } = &value.inner {
                macros.insert(name.name.clone(), MacroDef { parameters: parameters.clone(), body: body.clone() });
                definition_indices.push(i);
            }
        }
    }
    for &i in definition_indices.iter().rev() {
        program.statements.remove(i);
    }
    macros
}

/// Walks the program replacing every call to a known macro with the quoted
/// AST fragment its body produces — grounded on `macro_expansion.go`'s
/// `ExpandMacros`.
pub fn expand_macros(program: Program, macros: &HashMap<String, MacroDef>) -> Program {
    if macros.is_empty() {
        return program;
    }
    modify_program(program, &mut |expr| expand_call(expr, macros))
}

fn expand_call(expr: Expr, macros: &HashMap<String, MacroDef>) -> Expr {
    let ExprKind::Call { function, arguments } = &expr.inner else {
        return expr;
    };
    let ExprKind::Identifier(name) = &function.inner else {
        return expr;
    };
    let Some(mac) = macros.get(name) else {
        return expr;
    };
    let mut macro_env: HashMap<String, Expr> = HashMap::new();
    for (param, arg) in mac.parameters.iter().zip(arguments.iter()) {
        macro_env.insert(param.name.clone(), arg.clone());
    }
    eval_macro_body(&mac.body, &macro_env)
}

/// A macro body is expected to end in a single `quote(...)` call — every
/// example in the book is shaped this way. `unquote(...)` calls inside the
/// quoted node get spliced per `quote_unqoute.go`'s `evalUnquoteCalls`.
fn eval_macro_body(body: &BlockStatement, macro_env: &HashMap<String, Expr>) -> Expr {
    let last = match body.statements.last() {
        Some(stmt) => stmt,
        None => return Expr::new(ExprKind::Error, body.span),
    };
    let quoted = match &last.inner {
        StmtKind::Expression { expression } => match &expression.inner {
            ExprKind::Call { function, arguments } if arguments.len() == 1 => match &function.inner {
                ExprKind::Identifier(name) if name == "quote" => arguments[0].clone(),
                _ => return Expr::new(ExprKind::Error, expression.span),
            },
            _ => return Expr::new(ExprKind::Error, expression.span),
        },
        _ => return Expr::new(ExprKind::Error, last.span),
    };
    modify(quoted, &mut |node| splice_unquote(node, macro_env))
}

fn splice_unquote(expr: Expr, macro_env: &HashMap<String, Expr>) -> Expr {
    let ExprKind::Call { function, arguments } = &expr.inner else {
        return expr;
    };
    if arguments.len() != 1 {
        return expr;
    }
    let ExprKind::Identifier(name) = &function.inner else {
        return expr;
    };
    if name != "unquote" {
        return expr;
    }
    let arg = &arguments[0];
    if let ExprKind::Identifier(param) = &arg.inner {
        if let Some(bound) = macro_env.get(param) {
            return bound.clone();
        }
    }
    const_fold(arg)
}

/// Best-effort constant folding for `unquote(<arithmetic>)` where the
/// argument isn't just a bare macro parameter — e.g. `unquote(4 + 4)`.
/// Anything that doesn't reduce to an integer/boolean literal is left as-is.
fn const_fold(expr: &Expr) -> Expr {
    match &expr.inner {
        ExprKind::IntegerLiteral(_) | ExprKind::Boolean(_) => expr.clone(),
        ExprKind::Prefix { operator, right } => {
            let right = const_fold(right);
            match (operator.as_str(), &right.inner) {
                ("-", ExprKind::IntegerLiteral(v)) => Expr::new(ExprKind::IntegerLiteral(-v), expr.span),
                ("!", ExprKind::Boolean(b)) => Expr::new(ExprKind::Boolean(!b), expr.span),
                _ => expr.clone(),
            }
        }
        ExprKind::Infix { left, operator, right } => {
            let left = const_fold(left);
            let right = const_fold(right);
            match (&left.inner, operator.as_str(), &right.inner) {
                (ExprKind::IntegerLiteral(l), "+", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::IntegerLiteral(l + r), expr.span)
                }
                (ExprKind::IntegerLiteral(l), "-", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::IntegerLiteral(l - r), expr.span)
                }
                (ExprKind::IntegerLiteral(l), "*", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::IntegerLiteral(l * r), expr.span)
                }
                (ExprKind::IntegerLiteral(l), "<", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::Boolean(l < r), expr.span)
                }
                (ExprKind::IntegerLiteral(l), ">", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::Boolean(l > r), expr.span)
                }
                (ExprKind::IntegerLiteral(l), "==", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::Boolean(l == r), expr.span)
                }
                (ExprKind::IntegerLiteral(l), "!=", ExprKind::IntegerLiteral(r)) => {
                    Expr::new(ExprKind::Boolean(l != r), expr.span)
                }
                _ => expr.clone(),
            }
        }
        _ => expr.clone(),
    }
}
