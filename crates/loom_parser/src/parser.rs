use crate::ast::*;
use crate::error::ParseError;
use crate::trace::Tracer;
use loom_lexer::{Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest = 0,
    Equals = 1,
    LessGreater = 2,
    Sum = 3,
    Product = 4,
    Prefix = 5,
    Call = 6,
    Index = 7,
}

fn precedence_of(kind: &TokenKind) -> Prec {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Prec::Equals,
        TokenKind::Lt | TokenKind::Gt => Prec::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Prec::Sum,
        TokenKind::Slash | TokenKind::Asterisk => Prec::Product,
        TokenKind::LParen => Prec::Call,
        TokenKind::LBracket => Prec::Index,
        _ => Prec::Lowest,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub errors: Vec<ParseError>,
    tracer: Tracer,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, errors: Vec::new(), tracer: Tracer::new(false) }
    }

    /// Turns on the enter/exit trace printed to stderr while descending the
    /// Pratt parser; off by default, useful only when debugging grammar
    /// changes.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracer = Tracer::new(enabled);
        self
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_ahead_kind(&self) -> &TokenKind {
        let i = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: &TokenKind, label: &str) -> bool {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            self.errors.push(ParseError::UnexpectedToken {
                expected: label.to_string(),
                found: self.peek_kind().clone(),
                span: self.current_span(),
            });
            false
        }
    }

    pub fn parse(&mut self) -> Program {
        self.tracer.enter("Program");
        let mut statements = Vec::new();
        while *self.peek_kind() != TokenKind::Eof {
            statements.push(self.parse_statement());
        }
        self.tracer.exit("Program");
        Program { statements }
    }

    fn parse_statement(&mut self) -> Stmt {
        match self.peek_kind() {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Stmt {
        self.tracer.enter("LetStatement");
        let span = self.current_span();
        self.advance();

        let name = match self.peek_kind().clone() {
            TokenKind::Ident(s) => {
                let name_span = self.current_span();
                self.advance();
                Identifier { name: s, span: name_span }
            }
            _ => {
                self.errors.push(ParseError::UnexpectedToken {
                    expected: "identifier".to_string(),
                    found: self.peek_kind().clone(),
                    span: self.current_span(),
                });
                self.tracer.exit("LetStatement");
                return self.error_statement(span);
            }
        };

        if !self.expect(&TokenKind::Assign, "'='") {
            self.tracer.exit("LetStatement");
            return self.error_statement(span);
        }
        self.advance();

        let mut value = self.parse_expression(Prec::Lowest);
        if let ExprKind::FunctionLiteral { name: fn_name, .. } = &mut value.inner {
            *fn_name = Some(name.name.clone());
        }

        if *self.peek_kind() == TokenKind::Semicolon {
            self.advance();
        }

        self.tracer.exit("LetStatement");
        Node::new(StmtKind::Let { name, value }, span)
    }

    fn parse_return_statement(&mut self) -> Stmt {
        self.tracer.enter("ReturnStatement");
        let span = self.current_span();
        self.advance();

        let value = self.parse_expression(Prec::Lowest);

        if *self.peek_kind() == TokenKind::Semicolon {
            self.advance();
        }

        self.tracer.exit("ReturnStatement");
        Node::new(StmtKind::Return { value }, span)
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        self.tracer.enter("ExpressionStatement");
        let span = self.current_span();
        let expression = self.parse_expression(Prec::Lowest);

        if *self.peek_kind() == TokenKind::Semicolon {
            self.advance();
        }

        self.tracer.exit("ExpressionStatement");
        Node::new(StmtKind::Expression { expression }, span)
    }

    fn error_statement(&mut self, span: Span) -> Stmt {
        while !matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::Eof) {
            self.advance();
        }
        if *self.peek_kind() == TokenKind::Semicolon {
            self.advance();
        }
        Node::new(StmtKind::Expression { expression: Node::new(ExprKind::Error, span) }, span)
    }

    fn parse_expression(&mut self, prec: Prec) -> Expr {
        self.tracer.enter("Expression");
        let mut left = self.parse_prefix();

        while *self.peek_kind() != TokenKind::Semicolon && prec < precedence_of(self.peek_kind()) {
            left = match self.peek_kind() {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Asterisk
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt => self.parse_infix_expression(left),
                TokenKind::LParen => self.parse_call_expression(left),
                TokenKind::LBracket => self.parse_index_expression(left),
                _ => break,
            };
        }

        self.tracer.exit("Expression");
        left
    }

    fn parse_prefix(&mut self) -> Expr {
        let span = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Node::new(ExprKind::Identifier(name), span)
            }
            TokenKind::Int(n) => {
                self.advance();
                Node::new(ExprKind::IntegerLiteral(n), span)
            }
            TokenKind::Str(s) => {
                self.advance();
                Node::new(ExprKind::StringLiteral(s), span)
            }
            TokenKind::True => {
                self.advance();
                Node::new(ExprKind::Boolean(true), span)
            }
            TokenKind::False => {
                self.advance();
                Node::new(ExprKind::Boolean(false), span)
            }
            TokenKind::Bang | TokenKind::Minus => {
                let operator = self.advance().lexeme;
                let right = self.parse_expression(Prec::Prefix);
                Node::new(ExprKind::Prefix { operator, right: Box::new(right) }, span)
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Prec::Lowest);
                self.expect(&TokenKind::RParen, "')'");
                expr
            }
            TokenKind::LBracket => self.parse_array_literal(span),
            TokenKind::LBrace => self.parse_hash_literal(span),
            TokenKind::If => self.parse_if_expression(span),
            TokenKind::Function => self.parse_function_literal(span),
            TokenKind::Macro => self.parse_macro_literal(span),
            other => {
                self.errors.push(ParseError::NoPrefixParseFn { found: other, span });
                self.advance();
                Node::new(ExprKind::Error, span)
            }
        }
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Expr {
        let span = left.span;
        let prec = precedence_of(self.peek_kind());
        let operator = self.advance().lexeme;
        let right = self.parse_expression(prec);
        Node::new(ExprKind::Infix { left: Box::new(left), operator, right: Box::new(right) }, span)
    }

    fn parse_call_expression(&mut self, function: Expr) -> Expr {
        let span = function.span;
        self.advance();
        let arguments = self.parse_expression_list(&TokenKind::RParen);
        Node::new(ExprKind::Call { function: Box::new(function), arguments }, span)
    }

    fn parse_index_expression(&mut self, left: Expr) -> Expr {
        let span = left.span;
        self.advance();
        let index = self.parse_expression(Prec::Lowest);
        self.expect(&TokenKind::RBracket, "']'");
        Node::new(ExprKind::Index { left: Box::new(left), index: Box::new(index) }, span)
    }

    fn parse_expression_list(&mut self, end: &TokenKind) -> Vec<Expr> {
        let mut list = Vec::new();
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(end) {
            self.advance();
            return list;
        }
        list.push(self.parse_expression(Prec::Lowest));
        while *self.peek_kind() == TokenKind::Comma {
            self.advance();
            list.push(self.parse_expression(Prec::Lowest));
        }
        self.expect(end, "closing delimiter");
        list
    }

    fn parse_array_literal(&mut self, span: Span) -> Expr {
        self.advance();
        let elements = self.parse_expression_list(&TokenKind::RBracket);
        Node::new(ExprKind::ArrayLiteral(elements), span)
    }

    fn parse_hash_literal(&mut self, span: Span) -> Expr {
        self.advance();
        let mut pairs = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            let key = self.parse_expression(Prec::Lowest);
            self.expect(&TokenKind::Colon, "':'");
            let value = self.parse_expression(Prec::Lowest);
            pairs.push((key, value));
            if *self.peek_kind() != TokenKind::RBrace {
                self.expect(&TokenKind::Comma, "','");
            }
        }
        self.expect(&TokenKind::RBrace, "'}'");
        Node::new(ExprKind::HashLiteral(pairs), span)
    }

    fn parse_if_expression(&mut self, span: Span) -> Expr {
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let condition = self.parse_expression(Prec::Lowest);
        self.expect(&TokenKind::RParen, "')'");
        self.expect(&TokenKind::LBrace, "'{'");
        let consequence = self.parse_block_statement();

        let alternative = if *self.peek_kind() == TokenKind::Else {
            self.advance();
            self.expect(&TokenKind::LBrace, "'{'");
            Some(self.parse_block_statement())
        } else {
            None
        };

        Node::new(ExprKind::If { condition: Box::new(condition), consequence, alternative }, span)
    }

    fn parse_block_statement(&mut self) -> BlockStatement {
        let span = self.current_span();
        let mut statements = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace && *self.peek_kind() != TokenKind::Eof {
            statements.push(self.parse_statement());
        }
        self.expect(&TokenKind::RBrace, "'}'");
        BlockStatement { statements, span }
    }

    fn parse_function_literal(&mut self, span: Span) -> Expr {
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let parameters = self.parse_function_parameters();
        self.expect(&TokenKind::LBrace, "'{'");
        let body = self.parse_block_statement();
        Node::new(ExprKind::FunctionLiteral { parameters, body, name: None }, span)
    }

    fn parse_macro_literal(&mut self, span: Span) -> Expr {
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let parameters = self.parse_function_parameters();
        self.expect(&TokenKind::LBrace, "'{'");
        let body = self.parse_block_statement();
        Node::new(ExprKind::MacroLiteral { parameters, body }, span)
    }

    fn parse_function_parameters(&mut self) -> Vec<Identifier> {
        let mut params = Vec::new();
        if *self.peek_kind() == TokenKind::RParen {
            self.advance();
            return params;
        }

        loop {
            let span = self.current_span();
            match self.peek_kind().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    params.push(Identifier { name, span });
                }
                _ => {
                    self.errors.push(ParseError::UnexpectedToken {
                        expected: "parameter name".to_string(),
                        found: self.peek_kind().clone(),
                        span,
                    });
                    break;
                }
            }
            if *self.peek_kind() != TokenKind::Comma {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RParen, "')'");
        params
    }
}
