//! Lexical analysis: yields one token at a time from the normalized
//! expression text, advancing a byte cursor.

use log::trace;

use crate::bytecode::LogicalOp;

/// Kinds of tokens, used by the parser to remember what came before the
/// current token (unary minus detection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Delimiter,
    Operator,
    Compare,
    Number,
    Function,
    Logical,
    Variable,
    Stop,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Token<'a> {
    /// `,`
    Delimiter,
    /// One of `+-*/(){}^`.
    Operator(char),
    /// `=`, `<`, `>` optionally followed by `=` or `>`.
    Compare(&'a str),
    Number(f64),
    /// An identifier directly followed by `(` or `{`; the bracket is consumed.
    Function(&'a str),
    Logical(LogicalOp),
    Variable(&'a str),
    Stop,
    Unknown(char),
}

impl Token<'_> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Delimiter => TokenKind::Delimiter,
            Token::Operator(_) => TokenKind::Operator,
            Token::Compare(_) => TokenKind::Compare,
            Token::Number(_) => TokenKind::Number,
            Token::Function(_) => TokenKind::Function,
            Token::Logical(_) => TokenKind::Logical,
            Token::Variable(_) => TokenKind::Variable,
            Token::Stop => TokenKind::Stop,
            Token::Unknown(_) => TokenKind::Unknown,
        }
    }
}

pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next_token(&mut self) -> Token<'a> {
        let token = self.scan();
        trace!("token at {}: {:?}", self.pos, token);
        token
    }

    fn scan(&mut self) -> Token<'a> {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }

        let Some(&c) = bytes.get(self.pos) else {
            return Token::Stop;
        };

        match c {
            b',' => {
                self.pos += 1;
                Token::Delimiter
            }
            b'+' | b'-' | b'*' | b'/' | b'(' | b')' | b'{' | b'}' | b'^' => {
                self.pos += 1;
                Token::Operator(c as char)
            }
            b'=' | b'<' | b'>' => {
                let start = self.pos;
                self.pos += 1;
                if matches!(bytes.get(self.pos), Some(b'>') | Some(b'=')) {
                    self.pos += 1;
                }
                Token::Compare(&self.input[start..self.pos])
            }
            b'0'..=b'9' => self.scan_number(),
            b'a'..=b'z' | b'A'..=b'Z' => self.scan_identifier(),
            _ => {
                // step over a whole (possibly multi-byte) character
                let ch = self.input[self.pos..].chars().next().unwrap_or('\0');
                self.pos += ch.len_utf8().max(1);
                Token::Unknown(ch)
            }
        }
    }

    /// Consumes the run of digits and dots; a second dot ends the literal
    /// value but not the run.
    fn scan_number(&mut self) -> Token<'a> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_digit() || bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }

        let run = &self.input[start..self.pos];
        let literal = match run.match_indices('.').nth(1) {
            Some((second_dot, _)) => &run[..second_dot],
            None => run,
        };

        match literal.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_) => Token::Unknown(run.chars().next().unwrap_or('0')),
        }
    }

    fn scan_identifier(&mut self) -> Token<'a> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_alphanumeric()
                || bytes[self.pos] == b'_'
                || bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        let name = &self.input[start..self.pos];

        if matches!(bytes.get(self.pos), Some(b'(') | Some(b'{')) {
            self.pos += 1;
            return Token::Function(name);
        }

        if let Ok(op) = LogicalOp::try_from(name) {
            return Token::Logical(op);
        }

        match name {
            "true" => Token::Number(1.0),
            "false" => Token::Number(0.0),
            _ => Token::Variable(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token<'_>> {
        let mut tokenizer = Tokenizer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token();
            tokens.push(token);
            if token == Token::Stop {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_operators_and_numbers() {
        assert_eq!(
            tokenize("0.5*dbh^2"),
            vec![
                Token::Number(0.5),
                Token::Operator('*'),
                Token::Variable("dbh"),
                Token::Operator('^'),
                Token::Number(2.0),
                Token::Stop,
            ]
        );
    }

    #[test]
    fn test_compare_tokens() {
        assert_eq!(
            tokenize("a<=b <> c >= d = e < f > g"),
            vec![
                Token::Variable("a"),
                Token::Compare("<="),
                Token::Variable("b"),
                Token::Compare("<>"),
                Token::Variable("c"),
                Token::Compare(">="),
                Token::Variable("d"),
                Token::Compare("="),
                Token::Variable("e"),
                Token::Compare("<"),
                Token::Variable("f"),
                Token::Compare(">"),
                Token::Variable("g"),
                Token::Stop,
            ]
        );
    }

    #[test]
    fn test_function_consumes_bracket() {
        assert_eq!(
            tokenize("if(species=1,10,0)"),
            vec![
                Token::Function("if"),
                Token::Variable("species"),
                Token::Compare("="),
                Token::Number(1.0),
                Token::Delimiter,
                Token::Number(10.0),
                Token::Delimiter,
                Token::Number(0.0),
                Token::Operator(')'),
                Token::Stop,
            ]
        );
        assert_eq!(
            tokenize("max{1}"),
            vec![
                Token::Function("max"),
                Token::Number(1.0),
                Token::Operator('}'),
                Token::Stop
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokenize("true AND false or x"),
            vec![
                Token::Number(1.0),
                Token::Logical(LogicalOp::And),
                Token::Number(0.0),
                Token::Logical(LogicalOp::Or),
                Token::Variable("x"),
                Token::Stop,
            ]
        );
    }

    #[test]
    fn test_identifier_characters() {
        assert_eq!(
            tokenize("tree.dbh_max2"),
            vec![Token::Variable("tree.dbh_max2"), Token::Stop]
        );
    }

    #[test]
    fn test_number_with_extra_dots() {
        // the whole run is consumed, the value stops at the second dot
        assert_eq!(tokenize("1.5.3"), vec![Token::Number(1.5), Token::Stop]);
        assert_eq!(tokenize("7."), vec![Token::Number(7.0), Token::Stop]);
    }

    #[test]
    fn test_unknown_character() {
        let tokens = tokenize("3 @ 4");
        assert_eq!(tokens[1], Token::Unknown('@'));
        assert_eq!(tokens[1].kind(), TokenKind::Unknown);
    }

    #[test]
    fn test_empty_input_is_stop() {
        assert_eq!(tokenize("   "), vec![Token::Stop]);
    }
}
