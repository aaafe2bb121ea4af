//! Lexical analysis: turns source text into a flat, position-carrying token
//! stream.
//!
//! Tokens are matched via [`Lexikon`], a table of `(Regex, fn(Match, Span) ->
//! Token)` pairs generated by `#[derive(Token)]` on [`Token`] from the
//! `#[terminal(..)]`/`#[literal(..)]` attributes on each variant. At every
//! position the lexer tries every pattern and keeps the longest match,
//! which is what makes keywords win over identifiers (a keyword's terminal
//! pattern and the identifier regex both match the same text; insertion
//! order — terminals first — breaks length ties in the keyword's favour)
//! and makes `<=` win over a lone `<` followed by `=`.
//!
//! Whitespace and newlines are ordinary tokens here, not skipped: the lexer
//! round-trip property (concatenating every token's raw text reproduces the
//! source exactly) depends on it. The parser is the one that filters them
//! out of the stream it walks.

mod token;

pub use token::*;

use std::{error::Error, fmt::Display};

#[derive(Debug, Clone)]
pub struct LexError {
    pub position: Span,
    pub message: String,
}

pub type LexResult<T> = Result<T, LexError>;

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.position.to_string(&self.message))
    }
}

impl Error for LexError {}

pub struct Lexer<'a> {
    tokens: Vec<Token>,
    lexikon: Lexikon,
    position: usize,
    col: usize,
    line: usize,
    input: &'a str,
    file: String,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file: impl Into<String>) -> Self {
        Self {
            tokens: vec![],
            lexikon: Lexikon::new(),
            position: 0,
            col: 0,
            line: 0,
            input,
            file: file.into(),
        }
    }

    /// Produces the complete token sequence for the source this lexer was
    /// constructed with, including trailing whitespace/comments but with no
    /// terminating end-of-input marker — callers that need one (the parser)
    /// append it themselves once trivia has been filtered.
    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        while self.position != self.input.len() {
            let (len, res) = self.lexikon.find_longest_match(
                &self.input[self.position..],
                (self.line, self.col),
                self.input.to_string(),
            );

            let Some(token) = res else {
                let position = Span {
                    start: (self.line, self.col),
                    end: (self.line, self.col + 1),
                    source: self.input.to_string(),
                };
                return Err(LexError {
                    position,
                    message: format!(
                        "unexpected character while lexing {}: '{}'",
                        self.file,
                        &self.input[self.position..].chars().next().unwrap_or(' ')
                    ),
                });
            };

            if self.input[self.position..].starts_with("/*")
                && !matches!(token, Token::BlockComment { .. })
            {
                let position = Span {
                    start: (self.line, self.col),
                    end: (self.line, self.col + 2),
                    source: self.input.to_string(),
                };
                return Err(LexError {
                    position,
                    message: "unterminated block comment".to_string(),
                });
            }

            if matches!(token, Token::Newline { .. }) {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += len;
            }

            self.tokens.push(token);
            self.position += len;
        }

        Ok(self.tokens)
    }
}

/// Lexes `input` and drops whitespace/newline/comment tokens, the view the
/// parser actually consumes.
pub fn lex_significant(input: &str, file: impl Into<String>) -> LexResult<Vec<Token>> {
    let tokens = Lexer::new(input, file).lex()?;
    Ok(tokens.into_iter().filter(|t| !t.is_trivia()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input, "test").lex().expect("lex failed")
    }

    #[test]
    fn lexes_identifier() {
        let tokens = lex("letter");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::Id { .. }));
    }

    #[test]
    fn lexes_integer() {
        let tokens = lex("1337");
        assert!(matches!(tokens[0], Token::Integer { value: 1337, .. }));
    }

    #[test]
    fn lexes_floating_point() {
        let tokens = lex("3.14");
        assert!(matches!(tokens[0], Token::FloatingPoint { .. }));
    }

    #[test]
    fn keyword_wins_over_identifier() {
        let tokens = lex("fun");
        assert!(matches!(tokens[0], Token::Fun { .. }));
    }

    #[test]
    fn boolean_wins_over_identifier() {
        let tokens = lex("true");
        assert!(matches!(tokens[0], Token::Boolean { value: true, .. }));
        let tokens = lex("false");
        assert!(matches!(tokens[0], Token::Boolean { value: false, .. }));
    }

    #[test]
    fn longest_match_for_operators() {
        let tokens: Vec<_> = lex("<=").into_iter().filter(|t| !t.is_trivia()).collect();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::LessEqual { .. }));

        let tokens: Vec<_> = lex("==").into_iter().filter(|t| !t.is_trivia()).collect();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::EqualEqual { .. }));
    }

    #[test]
    fn whitespace_and_newlines_are_tokens() {
        let tokens = lex("a b\nc");
        let kinds: Vec<_> = tokens
            .iter()
            .map(|t| match t {
                Token::Id { .. } => "id",
                Token::Whitespace { .. } => "ws",
                Token::Newline { .. } => "nl",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["id", "ws", "id", "nl", "id"]);
    }

    #[test]
    fn round_trip_reproduces_source() {
        let source = "fun add(x: Int, y: Int): Int {\n  x + y // sum\n}";
        let tokens = lex(source);
        let reconstructed: String = tokens.iter().map(|t| t.text()).collect();
        assert_eq!(reconstructed, source);
    }

    #[test]
    fn line_comment_runs_to_newline() {
        let tokens = lex("// hi\nx");
        assert!(matches!(tokens[0], Token::LineComment { .. }));
    }

    #[test]
    fn block_comment_does_not_nest() {
        let tokens = lex("/* a /* b */ c */");
        let comment = &tokens[0];
        assert!(matches!(comment, Token::BlockComment { .. }));
        assert_eq!(comment.text(), "/* a /* b */");
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(Lexer::new("@", "test").lex().is_err());
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let err = Lexer::new("/* never closed", "test").lex().unwrap_err();
        assert!(err.message.contains("unterminated block comment"));
    }
}
