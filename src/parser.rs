//! Recursive-descent parser over the lexer's token cursor.
//!
//! Classes are resolved while parsing: a `NewInstance` node references its
//! class descriptor directly, so `Foo(...)` is only valid once `class Foo`
//! has been seen, and `class B(A)` requires `A` to name a known class.

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{ArithmeticOp, Comparator, Statement};
use crate::lexer::Lexer;
use crate::runtime::class::{Class, Method};
use crate::runtime::value::Value;
use crate::token::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected {expected}, got {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("Unknown class '{name}'")]
    UnknownClass { name: String },
    #[error("Unknown base class '{name}'")]
    UnknownBaseClass { name: String },
    #[error("Cannot assign to this expression")]
    InvalidAssignmentTarget,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a complete program into a `Compound` root node.
pub fn parse(lexer: Lexer) -> ParseResult<Statement> {
    Parser::new(lexer).parse_program()
}

struct Parser {
    lexer: Lexer,
    classes: HashMap<String, Rc<Class>>,
}

impl Parser {
    fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            classes: HashMap::new(),
        }
    }

    fn parse_program(mut self) -> ParseResult<Statement> {
        let mut statements = Vec::new();
        while !matches!(self.current(), Token::Eof) {
            if self.consume_newlines() {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Statement::Compound { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current() {
            Token::Class => self.parse_class_def(),
            Token::If => self.parse_if(),
            Token::Print => self.parse_print(),
            Token::Return => self.parse_return(),
            _ => self.parse_simple(),
        }
    }

    /// Assignment, field assignment, or a bare expression statement.
    fn parse_simple(&mut self) -> ParseResult<Statement> {
        let expr = self.parse_expression()?;
        if !matches!(self.current(), Token::Char('=')) {
            self.expect_newline()?;
            return Ok(expr);
        }
        self.advance();
        let rv = Box::new(self.parse_expression()?);
        let statement = match expr {
            Statement::VariableValue { mut dotted_ids } => {
                let last = dotted_ids.pop().expect("a dotted chain is never empty");
                if dotted_ids.is_empty() {
                    Statement::Assignment { var: last, rv }
                } else {
                    Statement::FieldAssignment {
                        object: dotted_ids,
                        field: last,
                        rv,
                    }
                }
            }
            _ => return Err(ParseError::InvalidAssignmentTarget),
        };
        self.expect_newline()?;
        Ok(statement)
    }

    fn parse_class_def(&mut self) -> ParseResult<Statement> {
        self.advance(); // class
        let name = self.expect_id()?;
        let parent = if matches!(self.current(), Token::Char('(')) {
            self.advance();
            let base = self.expect_id()?;
            self.expect_char(')')?;
            let class = self
                .classes
                .get(&base)
                .cloned()
                .ok_or(ParseError::UnknownBaseClass { name: base })?;
            Some(class)
        } else {
            None
        };
        self.expect_char(':')?;
        self.expect_newline()?;
        self.expect_indent()?;

        let mut methods = Vec::new();
        while !matches!(self.current(), Token::Dedent | Token::Eof) {
            if self.consume_newlines() {
                continue;
            }
            methods.push(self.parse_method_def()?);
        }
        self.expect_dedent()?;

        let class = Class::new(name, methods, parent);
        self.classes.insert(class.name().to_string(), Rc::clone(&class));
        Ok(Statement::ClassDefinition { class })
    }

    fn parse_method_def(&mut self) -> ParseResult<Method> {
        if !matches!(self.current(), Token::Def) {
            return Err(self.unexpected("'def'"));
        }
        self.advance();
        let name = self.expect_id()?;
        self.expect_char('(')?;
        let mut formal_params = Vec::new();
        if !matches!(self.current(), Token::Char(')')) {
            loop {
                formal_params.push(self.expect_id()?);
                if matches!(self.current(), Token::Char(',')) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_char(')')?;
        self.expect_char(':')?;
        let body = self.parse_suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Statement::MethodBody {
                body: Box::new(body),
            },
        })
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.advance(); // if
        let condition = Box::new(self.parse_expression()?);
        self.expect_char(':')?;
        let if_body = Box::new(self.parse_suite()?);
        let else_body = if matches!(self.current(), Token::Else) {
            self.advance();
            self.expect_char(':')?;
            Some(Box::new(self.parse_suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition,
            if_body,
            else_body,
        })
    }

    fn parse_print(&mut self) -> ParseResult<Statement> {
        self.advance(); // print
        let mut args = Vec::new();
        if !matches!(self.current(), Token::Newline | Token::Eof) {
            loop {
                args.push(self.parse_expression()?);
                if matches!(self.current(), Token::Char(',')) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_newline()?;
        Ok(Statement::Print { args })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.advance(); // return
        let rv = if matches!(self.current(), Token::Newline | Token::Eof) {
            Box::new(Statement::Constant(Value::None))
        } else {
            Box::new(self.parse_expression()?)
        };
        self.expect_newline()?;
        Ok(Statement::Return { rv })
    }

    /// An indented block: `NEWLINE INDENT statement+ DEDENT`.
    fn parse_suite(&mut self) -> ParseResult<Statement> {
        self.expect_newline()?;
        self.expect_indent()?;
        let mut statements = Vec::new();
        while !matches!(self.current(), Token::Dedent | Token::Eof) {
            if self.consume_newlines() {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        self.expect_dedent()?;
        Ok(Statement::Compound { statements })
    }

    fn parse_expression(&mut self) -> ParseResult<Statement> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_and()?;
        while matches!(self.current(), Token::Or) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Statement::Or {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_not()?;
        while matches!(self.current(), Token::And) {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Statement::And {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> ParseResult<Statement> {
        if matches!(self.current(), Token::Not) {
            self.advance();
            let arg = self.parse_not()?;
            return Ok(Statement::Not { arg: Box::new(arg) });
        }
        self.parse_comparison()
    }

    /// A single, non-associative comparison.
    fn parse_comparison(&mut self) -> ParseResult<Statement> {
        let lhs = self.parse_arith()?;
        let cmp = match self.current() {
            Token::Eq => Comparator::Eq,
            Token::NotEq => Comparator::NotEq,
            Token::LessOrEq => Comparator::LessOrEq,
            Token::GreaterOrEq => Comparator::GreaterOrEq,
            Token::Char('<') => Comparator::Less,
            Token::Char('>') => Comparator::Greater,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_arith()?;
        Ok(Statement::Comparison {
            cmp,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_arith(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current() {
                Token::Char('+') => ArithmeticOp::Add,
                Token::Char('-') => ArithmeticOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Statement::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_term(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current() {
                Token::Char('*') => ArithmeticOp::Mul,
                Token::Char('/') => ArithmeticOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Statement::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Statement> {
        if matches!(self.current(), Token::Char('-')) {
            self.advance();
            let operand = self.parse_unary()?;
            // Unary minus lowers to a subtraction from zero.
            return Ok(Statement::Arithmetic {
                op: ArithmeticOp::Sub,
                lhs: Box::new(Statement::Constant(Value::Number(0))),
                rhs: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    /// Method calls chained onto an already-parsed receiver expression, such
    /// as `B().g()`. Field reads are only available on dotted identifier
    /// chains, which `parse_primary` consumes whole.
    fn parse_postfix(&mut self) -> ParseResult<Statement> {
        let mut expr = self.parse_primary()?;
        while matches!(self.current(), Token::Char('.')) {
            self.advance();
            let method = self.expect_id()?;
            self.expect_char('(')?;
            let args = self.parse_args()?;
            expr = Statement::MethodCall {
                object: Box::new(expr),
                method,
                args,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Statement> {
        match self.current().clone() {
            Token::Number(value) => {
                self.advance();
                Ok(Statement::Constant(Value::Number(value)))
            }
            Token::String(value) => {
                self.advance();
                Ok(Statement::Constant(Value::String(value)))
            }
            Token::True => {
                self.advance();
                Ok(Statement::Constant(Value::Bool(true)))
            }
            Token::False => {
                self.advance();
                Ok(Statement::Constant(Value::Bool(false)))
            }
            Token::None => {
                self.advance();
                Ok(Statement::Constant(Value::None))
            }
            Token::Char('(') => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_char(')')?;
                Ok(expr)
            }
            Token::Id(name) => self.parse_name_expression(name),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// An identifier chain, optionally ending in a call: a variable or field
    /// path, a method call on that path, the `str(...)` coercion, or an
    /// instantiation of a declared class.
    fn parse_name_expression(&mut self, first: String) -> ParseResult<Statement> {
        self.advance();

        if first == "str" && matches!(self.current(), Token::Char('(')) {
            self.advance();
            let arg = self.parse_expression()?;
            self.expect_char(')')?;
            return Ok(Statement::Stringify { arg: Box::new(arg) });
        }

        let mut dotted_ids = vec![first];
        while matches!(self.current(), Token::Char('.')) {
            self.advance();
            dotted_ids.push(self.expect_id()?);
        }

        if !matches!(self.current(), Token::Char('(')) {
            return Ok(Statement::VariableValue { dotted_ids });
        }
        self.advance();
        let args = self.parse_args()?;

        if dotted_ids.len() == 1 {
            let name = dotted_ids.pop().expect("a dotted chain is never empty");
            let class = self
                .classes
                .get(&name)
                .cloned()
                .ok_or(ParseError::UnknownClass { name })?;
            return Ok(Statement::NewInstance { class, args });
        }
        let method = dotted_ids.pop().expect("a dotted chain is never empty");
        Ok(Statement::MethodCall {
            object: Box::new(Statement::VariableValue { dotted_ids }),
            method,
            args,
        })
    }

    /// Comma-separated argument list; the opening parenthesis has already
    /// been consumed.
    fn parse_args(&mut self) -> ParseResult<Vec<Statement>> {
        let mut args = Vec::new();
        if !matches!(self.current(), Token::Char(')')) {
            loop {
                args.push(self.parse_expression()?);
                if matches!(self.current(), Token::Char(',')) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_char(')')?;
        Ok(args)
    }

    fn current(&self) -> &Token {
        self.lexer.current()
    }

    fn advance(&mut self) {
        self.lexer.next();
    }

    fn consume_newlines(&mut self) -> bool {
        let mut consumed = false;
        while matches!(self.current(), Token::Newline) {
            consumed = true;
            self.advance();
        }
        consumed
    }

    fn expect_id(&mut self) -> ParseResult<String> {
        match self.current() {
            Token::Id(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_char(&mut self, c: char) -> ParseResult<()> {
        match self.current() {
            Token::Char(actual) if *actual == c => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected(&format!("'{c}'"))),
        }
    }

    fn expect_newline(&mut self) -> ParseResult<()> {
        if matches!(self.current(), Token::Newline) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("a line break"))
        }
    }

    fn expect_indent(&mut self) -> ParseResult<()> {
        if matches!(self.current(), Token::Indent) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("an indented block"))
        }
    }

    fn expect_dedent(&mut self) -> ParseResult<()> {
        if matches!(self.current(), Token::Dedent) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("the end of the block"))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current().to_string(),
        }
    }
}
