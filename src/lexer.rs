use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Tabs are not supported for indentation at position {position}")]
    TabIndentation { position: usize },
    #[error("Invalid integer literal '{literal}' at position {position}")]
    InvalidIntegerLiteral { literal: String, position: usize },
    #[error("Unterminated string literal at position {position}")]
    UnterminatedString { position: usize },
    #[error("Unrecognized escape sequence '\\{escape}' at position {position}")]
    UnknownEscape { escape: char, position: usize },
}

pub type LexResult<T> = Result<T, LexError>;

/// Tokenizes a complete source text.
///
/// Indentation is two spaces per level. Each non-blank line contributes its
/// tokens plus a single trailing `Newline`; blank and comment-only lines
/// contribute nothing, so no two `Newline` tokens are ever adjacent. At end
/// of input every open indentation level is closed with a `Dedent` before
/// the final `Eof`.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Scanner::new(input).run()
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    indent: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            indent: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> LexResult<Vec<Token>> {
        while self.begin_line()? {
            self.lex_line()?;
        }
        while self.indent > 0 {
            self.tokens.push(Token::Dedent);
            self.indent -= 1;
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    /// Consumes leading whitespace, blank lines, and comment-only lines,
    /// emitting `Indent`/`Dedent` tokens once a line with content is found.
    /// Returns `false` at end of input.
    fn begin_line(&mut self) -> LexResult<bool> {
        loop {
            let spaces = self.consume_while(|c| c == ' ');
            match self.peek_char() {
                Some('\t') => {
                    return Err(LexError::TabIndentation { position: self.pos });
                }
                Some('\n') => {
                    self.consume_char();
                }
                Some('#') => {
                    self.skip_comment();
                }
                None => return Ok(false),
                Some(_) => {
                    let observed = spaces / 2;
                    if observed > self.indent {
                        // One level at a time; the parser rejects over-indents.
                        self.tokens.push(Token::Indent);
                        self.indent += 1;
                    } else {
                        while observed < self.indent {
                            self.tokens.push(Token::Dedent);
                            self.indent -= 1;
                        }
                    }
                    return Ok(true);
                }
            }
        }
    }

    /// Lexes tokens until the end of the current line, then emits `Newline`.
    fn lex_line(&mut self) -> LexResult<()> {
        loop {
            self.consume_while(|c| c == ' ');
            let Some(c) = self.peek_char() else {
                self.tokens.push(Token::Newline);
                return Ok(());
            };
            match c {
                '\n' => {
                    self.consume_char();
                    self.tokens.push(Token::Newline);
                    return Ok(());
                }
                '#' => {
                    self.skip_comment();
                }
                '0'..='9' => {
                    let token = self.read_number()?;
                    self.tokens.push(token);
                }
                '\'' | '"' => {
                    let token = self.read_string(c)?;
                    self.tokens.push(token);
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let token = self.read_identifier();
                    self.tokens.push(token);
                }
                '+' | '-' | '*' | '/' | ':' | '(' | ')' | ',' | '.' => {
                    self.consume_char();
                    self.tokens.push(Token::Char(c));
                }
                '=' | '!' | '<' | '>' => {
                    self.consume_char();
                    let token = if self.peek_char() == Some('=') {
                        self.consume_char();
                        match c {
                            '=' => Token::Eq,
                            '!' => Token::NotEq,
                            '<' => Token::LessOrEq,
                            _ => Token::GreaterOrEq,
                        }
                    } else {
                        Token::Char(c)
                    };
                    self.tokens.push(token);
                }
                other => {
                    return Err(LexError::UnexpectedCharacter {
                        character: other,
                        position: self.pos,
                    });
                }
            }
        }
    }

    fn read_number(&mut self) -> LexResult<Token> {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_digit());
        let literal = &self.input[start..self.pos];
        let value = literal
            .parse::<i64>()
            .map_err(|_| LexError::InvalidIntegerLiteral {
                literal: literal.to_string(),
                position: start,
            })?;
        Ok(Token::Number(value))
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
        match &self.input[start..self.pos] {
            "class" => Token::Class,
            "return" => Token::Return,
            "if" => Token::If,
            "else" => Token::Else,
            "def" => Token::Def,
            "print" => Token::Print,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "None" => Token::None,
            "True" => Token::True,
            "False" => Token::False,
            ident => Token::Id(ident.to_string()),
        }
    }

    /// Reads a string literal delimited by `quote`. The other quote kind and
    /// raw newlines pass through unchanged.
    fn read_string(&mut self, quote: char) -> LexResult<Token> {
        let start = self.pos;
        self.consume_char();
        let mut value = String::new();
        loop {
            let Some(c) = self.consume_char() else {
                return Err(LexError::UnterminatedString { position: start });
            };
            if c == quote {
                return Ok(Token::String(value));
            }
            if c != '\\' {
                value.push(c);
                continue;
            }
            let Some(escaped) = self.consume_char() else {
                return Err(LexError::UnterminatedString { position: start });
            };
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '"' => value.push('"'),
                '\'' => value.push('\''),
                '\\' => value.push('\\'),
                other => {
                    return Err(LexError::UnknownEscape {
                        escape: other,
                        position: self.pos,
                    });
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        self.consume_while(|c| c != '\n');
    }

    fn consume_while<P>(&mut self, keep: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !keep(c) {
                break;
            }
            self.consume_char();
        }
        self.pos - start
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

/// Pre-tokenized stream with a positional cursor, as consumed by the parser.
pub struct Lexer {
    tokens: Vec<Token>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> LexResult<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    /// The token under the cursor.
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Advances the cursor and returns the new current token. The cursor
    /// clamps at `Eof`; calling `next` there is a no-op.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &Token {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[self.pos]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
