//! Evaluator for problem display text
//!
//! Grammar (conventional precedence, left associative):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('×' | '*' | '÷' | '/') unary)*
//! unary   := ('√' | '∛' | '-') unary | postfix
//! postfix := primary ('²' | '³' | '⁴')*
//! primary := number | '(' expr ')'
//! ```

use std::iter::Peekable;
use std::str::Chars;

/// Evaluate a display expression. Returns `None` on malformed text or
/// division by zero.
pub fn evaluate(text: &str) -> Option<f64> {
    let mut parser = Parser {
        chars: text.chars().peekable(),
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.chars.peek().is_some() {
        return None;
    }
    value.is_finite().then_some(value)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.peek().copied()
    }

    fn expr(&mut self) -> Option<f64> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.chars.next();
                    acc += self.term()?;
                }
                Some('-') => {
                    self.chars.next();
                    acc -= self.term()?;
                }
                _ => return Some(acc),
            }
        }
    }

    fn term(&mut self) -> Option<f64> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some('×' | '*') => {
                    self.chars.next();
                    acc *= self.unary()?;
                }
                Some('÷' | '/') => {
                    self.chars.next();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return None;
                    }
                    acc /= rhs;
                }
                _ => return Some(acc),
            }
        }
    }

    fn unary(&mut self) -> Option<f64> {
        match self.peek() {
            Some('√') => {
                self.chars.next();
                let v = self.unary()?;
                (v >= 0.0).then(|| v.sqrt())
            }
            Some('∛') => {
                self.chars.next();
                Some(self.unary()?.cbrt())
            }
            Some('-') => {
                self.chars.next();
                Some(-self.unary()?)
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Option<f64> {
        let mut value = self.primary()?;
        // Superscripts bind directly to the preceding operand
        while let Some(&c) = self.chars.peek() {
            let exp = match c {
                '²' => 2,
                '³' => 3,
                '⁴' => 4,
                _ => break,
            };
            self.chars.next();
            value = value.powi(exp);
        }
        Some(value)
    }

    fn primary(&mut self) -> Option<f64> {
        match self.peek()? {
            '(' => {
                self.chars.next();
                let v = self.expr()?;
                (self.peek() == Some(')')).then(|| {
                    self.chars.next();
                    v
                })
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(d) = self.chars.next_if(|d| d.is_ascii_digit() || *d == '.') {
                    literal.push(d);
                }
                literal.parse().ok()
            }
            _ => None,
        }
    }
}
