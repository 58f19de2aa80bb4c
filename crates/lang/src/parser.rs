//! Recursive-descent parser for the alpha DSL
//!
//! The grammar (unambiguous, one comparison per level, ternary at the
//! top):
//!
//! ```text
//! expr      := ternary
//! ternary   := logic_or ('?' expr ':' expr)?
//! logic_or  := logic_and ('||' logic_and)*
//! logic_and := compare   ('&&' compare)*
//! compare   := sum (('==' | '!=' | '<' | '>' | '<=' | '>=') sum)?
//! sum       := product (('+' | '-') product)*
//! product   := power   (('*' | '/') power)*
//! power     := unary ('^' unary)*
//! unary     := '-'? atom
//! atom      := NUMBER | call | NAME | dotted | '(' expr ')'
//! call      := NAME '(' (expr (',' expr)*)? ')'
//! dotted    := NAME ('.' NAME)+
//! ```

use crate::ast::{BinOp, Expr};
use crate::lexer::{tokenize, Token, TokenKind};
use alpha_core::{Error, Result};

/// Parse one expression; trailing input is an error.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    match parser.peek().kind {
        TokenKind::Eof => Ok(expr),
        _ => Err(parser.unexpected("end of input")),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        Error::parse(
            token.line,
            token.column,
            format!("expected {expected}, found {:?}", token.kind),
        )
    }

    fn expr(&mut self) -> Result<Expr> {
        let cond = self.logic_or()?;
        if self.eat(&TokenKind::Question) {
            let then = self.expr()?;
            self.expect(&TokenKind::Colon, "`:`")?;
            let otherwise = self.expr()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    fn logic_or(&mut self) -> Result<Expr> {
        let mut lhs = self.logic_and()?;
        while self.eat(&TokenKind::OrOr) {
            let rhs = self.logic_and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn logic_and(&mut self) -> Result<Expr> {
        let mut lhs = self.compare()?;
        while self.eat(&TokenKind::AndAnd) {
            let rhs = self.compare()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn compare(&mut self) -> Result<Expr> {
        let lhs = self.sum()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.sum()?;
        Ok(binary(op, lhs, rhs))
    }

    fn sum(&mut self) -> Result<Expr> {
        let mut lhs = self.product()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.product()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn product(&mut self) -> Result<Expr> {
        let mut lhs = self.power()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.power()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn power(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while self.eat(&TokenKind::Caret) {
            let rhs = self.unary()?;
            lhs = binary(BinOp::Pow, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::Minus) {
            let inner = self.atom()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.peek().kind.clone() {
            TokenKind::Number(text) => {
                self.bump();
                Ok(Expr::Number(text))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Name(name) => {
                self.bump();
                if self.eat(&TokenKind::LParen) {
                    let args = self.arguments()?;
                    self.expect(&TokenKind::RParen, "`)`")?;
                    return Ok(Expr::Call { name, args });
                }
                if self.peek().kind == TokenKind::Dot {
                    let mut parts = vec![name];
                    while self.eat(&TokenKind::Dot) {
                        match self.peek().kind.clone() {
                            TokenKind::Name(part) => {
                                self.bump();
                                parts.push(part);
                            }
                            _ => return Err(self.unexpected("identifier after `.`")),
                        }
                    }
                    return Ok(Expr::Dotted(parts));
                }
                Ok(Expr::Name(name))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(args);
            }
        }
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_product_over_sum() {
        let e = parse("1 + 2 * 3").unwrap();
        match e {
            Expr::Binary { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn power_binds_tighter_than_product() {
        let e = parse("2 * a ^ 3").unwrap();
        match e {
            Expr::Binary { op: BinOp::Mul, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Pow, .. }));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn ternary_wraps_comparison() {
        let e = parse("a > b ? 1 : 0").unwrap();
        match e {
            Expr::Ternary { cond, .. } => {
                assert!(matches!(*cond, Expr::Binary { op: BinOp::Gt, .. }));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn calls_and_dotted_names() {
        let e = parse("MA(a.b, 3)").unwrap();
        match e {
            Expr::Call { name, args } => {
                assert_eq!(name, "MA");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0], Expr::Dotted(vec!["a".into(), "b".into()]));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn nested_calls() {
        let e = parse("RANK(MA(CLOSE, 5) - DELAY(CLOSE, 1))").unwrap();
        assert!(matches!(e, Expr::Call { .. }));
    }

    #[test]
    fn single_comparison_only() {
        assert!(parse("a < b < c").is_err());
    }

    #[test]
    fn error_carries_position() {
        let err = parse("MA(close,").unwrap_err();
        assert!(err.is_parse());
        assert!(err.position().is_some());
    }

    #[test]
    fn trailing_tokens_rejected() {
        assert!(parse("a b").is_err());
    }

    #[test]
    fn unary_minus() {
        let e = parse("-a + b").unwrap();
        match e {
            Expr::Binary { op: BinOp::Add, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Neg(_)));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }
}
