use log::debug;

use crate::bytecode::tokenizer::{Token, TokenKind, Tokenizer};
use crate::bytecode::{Binder, CompareOp, Instruction, Operator, Program};
use crate::error::{ExpressionError, Result};
use crate::functions::Builtin;

const INITIAL_CAPACITY: usize = 16;

/// Precedence-climbing parser that writes a post-order instruction buffer
/// directly; no syntax tree is kept.
///
/// Ladder, lowest to highest: `and`/`or`, comparisons, `+ -`, `* /`,
/// unary `-`, `^`, atoms (numbers, variables, groups, function calls).
pub(crate) struct Compiler<'a> {
    source: &'a str,
    tokenizer: Tokenizer<'a>,
    current: Token<'a>,
    last_kind: TokenKind,
    binder: Binder<'a>,
    instructions: Vec<Instruction>,
    constant: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a str, binder: Binder<'a>) -> Self {
        let mut tokenizer = Tokenizer::new(source);
        let current = tokenizer.next_token();
        Self {
            source,
            tokenizer,
            current,
            // the start of input counts as the start of a subexpression
            last_kind: TokenKind::Unknown,
            binder,
            instructions: Vec::with_capacity(INITIAL_CAPACITY),
            constant: true,
        }
    }

    pub fn compile(mut self) -> Result<Program> {
        debug!("Compiling expression: {}", self.source);
        let empty = self.source.trim().is_empty();

        if !empty {
            self.parse_logical()?;
            match self.current {
                Token::Stop => {}
                Token::Operator(')') | Token::Operator('}') => {
                    return Err(self.error("unbalanced number of parentheses"));
                }
                token => {
                    return Err(self.error(format!("unexpected {}", describe(&token))));
                }
            }
        }
        self.emit(Instruction::Stop);

        let (locals, last_error) = self.binder.into_parts();
        let program = Program {
            instructions: self.instructions,
            locals,
            constant: self.constant,
            empty,
            last_error,
        };
        debug!("Compiled program:\n{}", program);
        Ok(program)
    }

    fn advance(&mut self) {
        self.last_kind = self.current.kind();
        self.current = self.tokenizer.next_token();
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::syntax(
            self.source,
            format!("{} (at position {})", message.into(), self.tokenizer.position()),
        )
    }

    fn parse_logical(&mut self) -> Result<()> {
        self.parse_comparison()?;
        while let Token::Logical(op) = self.current {
            self.advance();
            self.parse_comparison()?;
            self.emit(Instruction::Logical(op));
        }
        Ok(())
    }

    fn parse_comparison(&mut self) -> Result<()> {
        self.parse_additive()?;
        while let Token::Compare(text) = self.current {
            let op = CompareOp::try_from(text).map_err(|e| self.error(e))?;
            self.advance();
            self.parse_additive()?;
            self.emit(Instruction::Compare(op));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> Result<()> {
        self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Token::Operator('+') => Operator::Add,
                Token::Operator('-') => Operator::Sub,
                _ => return Ok(()),
            };
            self.advance();
            self.parse_multiplicative()?;
            self.emit(Instruction::Operator(op));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<()> {
        self.parse_unary()?;
        loop {
            let op = match self.current {
                Token::Operator('*') => Operator::Mul,
                Token::Operator('/') => Operator::Div,
                _ => return Ok(()),
            };
            self.advance();
            self.parse_unary()?;
            self.emit(Instruction::Operator(op));
        }
    }

    /// A `-` is unary only at the start of a subexpression, so `3-2` stays
    /// binary while `-2`, `a*-2` and `min(1,-2)` negate.
    fn at_unary_minus(&self) -> bool {
        self.current == Token::Operator('-')
            && matches!(
                self.last_kind,
                TokenKind::Operator
                    | TokenKind::Compare
                    | TokenKind::Logical
                    | TokenKind::Function
                    | TokenKind::Delimiter
                    | TokenKind::Unknown
            )
    }

    fn parse_unary(&mut self) -> Result<()> {
        if self.at_unary_minus() {
            self.advance();
            self.parse_unary()?;
            self.emit(Instruction::Operator(Operator::Negate));
            return Ok(());
        }
        self.parse_power()
    }

    /// `^` folds left to right: `2^3^2` is `(2^3)^2`.
    fn parse_power(&mut self) -> Result<()> {
        self.parse_atom()?;
        while self.current == Token::Operator('^') {
            self.advance();
            self.parse_exponent()?;
            self.emit(Instruction::Operator(Operator::Pow));
        }
        Ok(())
    }

    fn parse_exponent(&mut self) -> Result<()> {
        if self.at_unary_minus() {
            self.advance();
            self.parse_exponent()?;
            self.emit(Instruction::Operator(Operator::Negate));
            return Ok(());
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<()> {
        match self.current {
            Token::Number(value) => {
                self.emit(Instruction::Number(value));
                self.advance();
            }
            Token::Variable(name) => {
                let slot = self.binder.resolve(name)?;
                self.emit(Instruction::Variable(slot));
                self.constant = false;
                self.advance();
            }
            Token::Operator('(') | Token::Operator('{') => {
                self.advance();
                self.parse_logical()?;
                self.expect_closing()?;
            }
            Token::Function(name) => self.parse_function(name)?,
            Token::Stop => return Err(self.error("unexpected end of expression")),
            token => return Err(self.error(format!("unexpected {}", describe(&token)))),
        }
        Ok(())
    }

    fn parse_function(&mut self, name: &str) -> Result<()> {
        let function = Builtin::from_name(name)
            .ok_or_else(|| self.error(format!("function '{}' is not defined", name)))?;
        self.advance();

        let mut args = 0;
        if !self.at_closing() {
            loop {
                self.parse_logical()?;
                args += 1;
                match self.current {
                    Token::Delimiter => self.advance(),
                    Token::Operator(')') | Token::Operator('}') => break,
                    Token::Stop => return Err(self.error("unbalanced number of parentheses")),
                    token => {
                        return Err(self.error(format!(
                            "unexpected {} in arguments of '{}'",
                            describe(&token),
                            name
                        )))
                    }
                }
            }
        }

        function.check_args(self.source, args)?;
        self.emit(Instruction::Function { function, args });
        self.expect_closing()
    }

    fn at_closing(&self) -> bool {
        matches!(self.current, Token::Operator(')') | Token::Operator('}'))
    }

    fn expect_closing(&mut self) -> Result<()> {
        if !self.at_closing() {
            return Err(self.error("unbalanced number of parentheses"));
        }
        self.advance();
        Ok(())
    }
}

fn describe(token: &Token<'_>) -> String {
    match token {
        Token::Delimiter => "','".to_string(),
        Token::Operator(c) => format!("operator '{}'", c),
        Token::Compare(op) => format!("comparison '{}'", op),
        Token::Number(n) => format!("number {}", n),
        Token::Function(name) => format!("function '{}'", name),
        Token::Logical(op) => format!("logical operator {:?}", op),
        Token::Variable(name) => format!("variable '{}'", name),
        Token::Stop => "end of expression".to_string(),
        Token::Unknown(c) => format!("character '{}'", c),
    }
}
