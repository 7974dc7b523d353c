use loom_lexer::Span;
use std::fmt;

/// Wraps an AST payload with the span it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub inner: T,
    pub span: Span,
}

impl<T> Node<T> {
    pub fn new(inner: T, span: Span) -> Self {
        Node { inner, span }
    }
}

pub type Expr = Node<ExprKind>;
pub type Stmt = Node<StmtKind>;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let { name: Identifier, value: Expr },
    Return { value: Expr },
    Expression { expression: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(String),
    IntegerLiteral(i64),
    Boolean(bool),
    StringLiteral(String),
    ArrayLiteral(Vec<Expr>),
    HashLiteral(Vec<(Expr, Expr)>),
    Prefix {
        operator: String,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    FunctionLiteral {
        parameters: Vec<Identifier>,
        body: BlockStatement,
        name: Option<String>,
    },
    MacroLiteral {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    /// Stands in for a malformed expression so the parser can keep
    /// recovering instead of aborting the whole program.
    Error,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt.inner)?;
        }
        Ok(())
    }
}

impl fmt::Display for StmtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtKind::Let { name, value } => write!(f, "let {} = {};", name.name, value.inner),
            StmtKind::Return { value } => write!(f, "return {};", value.inner),
            StmtKind::Expression { expression } => write!(f, "{}", expression.inner),
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Identifier(name) => write!(f, "{}", name),
            ExprKind::IntegerLiteral(v) => write!(f, "{}", v),
            ExprKind::Boolean(v) => write!(f, "{}", v),
            ExprKind::StringLiteral(s) => write!(f, "{}", s),
            ExprKind::ArrayLiteral(items) => {
                let parts: Vec<String> = items.iter().map(|e| e.inner.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ExprKind::HashLiteral(pairs) => {
                let parts: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}:{}", k.inner, v.inner))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            ExprKind::Prefix { operator, right } => write!(f, "({}{})", operator, right.inner),
            ExprKind::Infix { left, operator, right } => {
                write!(f, "({} {} {})", left.inner, operator, right.inner)
            }
            ExprKind::If { condition, consequence, alternative } => {
                write!(f, "if {} {{ {} }}", condition.inner, fmt_block(consequence))?;
                if let Some(alt) = alternative {
                    write!(f, " else {{ {} }}", fmt_block(alt))?;
                }
                Ok(())
            }
            ExprKind::FunctionLiteral { parameters, body, .. } => {
                let params: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
                write!(f, "fn({}) {{ {} }}", params.join(", "), fmt_block(body))
            }
            ExprKind::MacroLiteral { parameters, body } => {
                let params: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
                write!(f, "macro({}) {{ {} }}", params.join(", "), fmt_block(body))
            }
            ExprKind::Call { function, arguments } => {
                let args: Vec<String> = arguments.iter().map(|a| a.inner.to_string()).collect();
                write!(f, "{}({})", function.inner, args.join(", "))
            }
            ExprKind::Index { left, index } => write!(f, "({}[{}])", left.inner, index.inner),
            ExprKind::Error => write!(f, "<error>"),
        }
    }
}

fn fmt_block(block: &BlockStatement) -> String {
    block
        .statements
        .iter()
        .map(|s| s.inner.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
