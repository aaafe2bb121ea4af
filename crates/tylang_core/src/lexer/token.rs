//! Token definitions for the tylang lexer.
//!
//! Every token carries its exact matched source text (`text`) in addition to
//! its `position`, so the lexer round-trip property (concatenating the raw
//! text of all tokens reproduces the original source) and diagnostic
//! rendering can be built directly off the token stream without re-slicing
//! the source string.

use colored::Colorize;

use lex_derive::{LooseEq, Token as ParseToken};
use regex::{Match, Regex};

#[derive(Default, Debug, Clone, Eq)]
pub struct Span {
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub source: String,
}

impl Span {
    pub fn to_string(&self, msg: impl ToString) -> String {
        let Span { start, end, source } = self;
        let line = start.0;
        let lines = source.lines().collect::<Vec<_>>();
        let prev_line = if line > 0 { lines[line - 1] } else { "" };
        let line_str = lines[line];

        // margin _before_ left border
        let left_margin = format!("{}", end.0).len();
        let left_margin_fill = vec![' '; left_margin].iter().collect::<String>();

        // split right at the start of the error in the first line
        let (left, right) = line_str.split_at(start.1);

        // some case magic
        let (left, right) = if start.0 != end.0 {
            // if the error ranges over more than a single line, we can just mark rest of the line
            // as an error
            (left.to_string(), right.to_string().red().to_string())
        } else {
            // however, if the lines does not range beyond this line, we need to split at the end
            // again
            let (err_str, after_err) = right.split_at(end.1 - start.1);

            // now, just color the error part red
            (
                left.to_string(),
                format!("{err_str}{after_err}", err_str = err_str.to_string().red()),
            )
        };

        // and concatentate both together
        let line_str = format!("{left}{right}");

        // padding between border and squiggles
        let left_padding_fill = vec![' '; end.1.saturating_sub(1)]
            .iter()
            .collect::<String>();

        // the error with the first line
        let mut error_string = format!(
            "{left_margin_fill} |\n{left_margin_fill} |{prev_line} \n{line} |{line_str}",
            line = line + 1
        );

        // iterate over all lines of the error and make them shine red
        ((start.0 + 1)..(end.0 + 1)).for_each(|line_number| {
            error_string = format!(
                "{error_string}\n{left_margin_fill} |{}",
                lines[line_number].to_string().red()
            );
        });

        // actually add error message at bottom
        error_string = format!(
            "{error_string}\n{} |{left_padding_fill}^--- {}\n{left_margin_fill} |",
            end.0 + 2,
            msg.to_string()
        );

        error_string
    }

    pub fn merge(&self, other: &Span) -> Span {
        let Span { start, source, .. } = self.clone();
        let Span { end, .. } = other.clone();

        Span { start, end, source }
    }
}

impl PartialEq<Span> for Span {
    fn eq(&self, _other: &Span) -> bool {
        // positional metadata, not part of AST identity
        true
    }
}

/// Every reserved word, operator and delimiter, plus literal, identifier,
/// comment, whitespace and newline tokens. `#[terminal(..)]` variants match
/// an exact literal string; `#[literal(..)]` variants match a regex and
/// parse the match into `value`. Both always carry `text`, the raw matched
/// source slice, and `position`, its `Span`.
#[derive(Clone, ParseToken, LooseEq)]
pub enum Token {
    // literals (declared before `Id` so a length tie with "true"/"false"
    // resolves in favour of `Boolean`)
    #[literal("true|false")]
    Boolean {
        position: Span,
        text: String,
        value: bool,
    },
    #[literal("[0-9]+\\.[0-9]+")]
    FloatingPoint {
        position: Span,
        text: String,
        value: f64,
    },
    #[literal("[0-9]+")]
    Integer {
        position: Span,
        text: String,
        value: u64,
    },
    #[literal("\"(\\\\.|[^\"\\\\])*\"")]
    StringLiteral {
        position: Span,
        text: String,
        value: String,
    },

    // keywords (must precede `Id` so a reserved word wins the length tie)
    #[terminal("fun")]
    Fun { position: Span, text: String },
    #[terminal("class")]
    Class { position: Span, text: String },
    #[terminal("trait")]
    Trait { position: Span, text: String },
    #[terminal("object")]
    Object { position: Span, text: String },
    #[terminal("val")]
    Val { position: Span, text: String },
    #[terminal("var")]
    Var { position: Span, text: String },
    #[terminal("def")]
    Def { position: Span, text: String },
    #[terminal("extension")]
    Extension { position: Span, text: String },
    #[terminal("if")]
    If { position: Span, text: String },
    #[terminal("else")]
    Else { position: Span, text: String },
    #[terminal("while")]
    While { position: Span, text: String },
    #[terminal("for")]
    For { position: Span, text: String },
    #[terminal("match")]
    Match { position: Span, text: String },
    #[terminal("case")]
    Case { position: Span, text: String },
    #[terminal("try")]
    Try { position: Span, text: String },
    #[terminal("catch")]
    Catch { position: Span, text: String },
    #[terminal("finally")]
    Finally { position: Span, text: String },
    #[terminal("import")]
    Import { position: Span, text: String },
    #[terminal("package")]
    Package { position: Span, text: String },
    #[terminal("extends")]
    Extends { position: Span, text: String },
    #[terminal("with")]
    With { position: Span, text: String },
    #[terminal("override")]
    Override { position: Span, text: String },
    #[terminal("abstract")]
    Abstract { position: Span, text: String },
    #[terminal("final")]
    Final { position: Span, text: String },
    #[terminal("private")]
    Private { position: Span, text: String },
    #[terminal("protected")]
    Protected { position: Span, text: String },
    #[terminal("public")]
    Public { position: Span, text: String },
    #[terminal("sealed")]
    Sealed { position: Span, text: String },
    #[terminal("implicit")]
    Implicit { position: Span, text: String },
    #[terminal("explicit")]
    Explicit { position: Span, text: String },
    #[terminal("null")]
    Null { position: Span, text: String },
    #[terminal("this")]
    This { position: Span, text: String },
    #[terminal("super")]
    Super { position: Span, text: String },
    #[terminal("new")]
    New { position: Span, text: String },
    #[terminal("return")]
    Return { position: Span, text: String },
    #[terminal("throw")]
    Throw { position: Span, text: String },
    #[terminal("Int")]
    IntType { position: Span, text: String },
    #[terminal("Double")]
    DoubleType { position: Span, text: String },
    #[terminal("String")]
    StringType { position: Span, text: String },
    #[terminal("Boolean")]
    BooleanType { position: Span, text: String },
    #[terminal("Unit")]
    UnitType { position: Span, text: String },
    #[terminal("Any")]
    AnyType { position: Span, text: String },
    #[terminal("AnyRef")]
    AnyRefType { position: Span, text: String },
    #[terminal("Nothing")]
    NothingType { position: Span, text: String },

    #[literal("[a-zA-Z_][a-zA-Z0-9_]*")]
    Id {
        position: Span,
        text: String,
        value: String,
    },

    // operators (longest-match selection is `Lexikon::find_longest_match`'s job)
    #[terminal("**")]
    StarStar { position: Span, text: String },
    #[terminal(":::")]
    ColonColonColon { position: Span, text: String },
    #[terminal("::")]
    ColonColon { position: Span, text: String },
    #[terminal("++")]
    PlusPlus { position: Span, text: String },
    #[terminal("--")]
    MinusMinus { position: Span, text: String },
    #[terminal("==")]
    EqualEqual { position: Span, text: String },
    #[terminal("!=")]
    NotEqual { position: Span, text: String },
    #[terminal("<=")]
    LessEqual { position: Span, text: String },
    #[terminal(">=")]
    GreaterEqual { position: Span, text: String },
    #[terminal("&&")]
    AndAnd { position: Span, text: String },
    #[terminal("||")]
    OrOr { position: Span, text: String },
    #[terminal("+=")]
    PlusAssign { position: Span, text: String },
    #[terminal("-=")]
    MinusAssign { position: Span, text: String },
    #[terminal("*=")]
    StarAssign { position: Span, text: String },
    #[terminal("/=")]
    SlashAssign { position: Span, text: String },
    #[terminal("%=")]
    PercentAssign { position: Span, text: String },
    #[terminal("=>")]
    FatArrow { position: Span, text: String },
    #[terminal("->")]
    Arrow { position: Span, text: String },
    #[terminal("<-")]
    LeftArrow { position: Span, text: String },
    #[terminal("<:")]
    UpperBound { position: Span, text: String },
    #[terminal(">:")]
    LowerBound { position: Span, text: String },
    #[terminal("+")]
    Plus { position: Span, text: String },
    #[terminal("-")]
    Minus { position: Span, text: String },
    #[terminal("*")]
    Star { position: Span, text: String },
    #[terminal("/")]
    Slash { position: Span, text: String },
    #[terminal("%")]
    Percent { position: Span, text: String },
    #[terminal("<")]
    LessThan { position: Span, text: String },
    #[terminal(">")]
    GreaterThan { position: Span, text: String },
    #[terminal("!")]
    Bang { position: Span, text: String },
    #[terminal("=")]
    Assign { position: Span, text: String },
    #[terminal(".")]
    Dot { position: Span, text: String },

    // delimiters
    #[terminal("(")]
    LParen { position: Span, text: String },
    #[terminal(")")]
    RParen { position: Span, text: String },
    #[terminal("[")]
    LBracket { position: Span, text: String },
    #[terminal("]")]
    RBracket { position: Span, text: String },
    #[terminal("{")]
    LBrace { position: Span, text: String },
    #[terminal("}")]
    RBrace { position: Span, text: String },
    #[terminal(",")]
    Comma { position: Span, text: String },
    #[terminal(";")]
    Semicolon { position: Span, text: String },
    #[terminal(":")]
    Colon { position: Span, text: String },
    #[terminal("_")]
    Underscore { position: Span, text: String },

    // comments
    #[literal("//[^\\n]*")]
    LineComment {
        position: Span,
        text: String,
        value: String,
    },
    #[literal("(?s)/\\*.*?\\*/")]
    BlockComment {
        position: Span,
        text: String,
        value: String,
    },

    // whitespace is split from newlines so callers can filter one without
    // dropping the other
    #[literal("\\n")]
    Newline {
        position: Span,
        text: String,
        value: String,
    },
    #[literal("[ \\t\\r]+")]
    Whitespace {
        position: Span,
        text: String,
        value: String,
    },
}

/// Dispatches to a named field shared by every `Token` variant, sparing one
/// hand-written match arm per variant for every accessor.
macro_rules! token_field {
    ($self:expr, $field:ident) => {
        match $self {
            Token::Boolean { $field, .. }
            | Token::FloatingPoint { $field, .. }
            | Token::Integer { $field, .. }
            | Token::StringLiteral { $field, .. }
            | Token::Fun { $field, .. }
            | Token::Class { $field, .. }
            | Token::Trait { $field, .. }
            | Token::Object { $field, .. }
            | Token::Val { $field, .. }
            | Token::Var { $field, .. }
            | Token::Def { $field, .. }
            | Token::Extension { $field, .. }
            | Token::If { $field, .. }
            | Token::Else { $field, .. }
            | Token::While { $field, .. }
            | Token::For { $field, .. }
            | Token::Match { $field, .. }
            | Token::Case { $field, .. }
            | Token::Try { $field, .. }
            | Token::Catch { $field, .. }
            | Token::Finally { $field, .. }
            | Token::Import { $field, .. }
            | Token::Package { $field, .. }
            | Token::Extends { $field, .. }
            | Token::With { $field, .. }
            | Token::Override { $field, .. }
            | Token::Abstract { $field, .. }
            | Token::Final { $field, .. }
            | Token::Private { $field, .. }
            | Token::Protected { $field, .. }
            | Token::Public { $field, .. }
            | Token::Sealed { $field, .. }
            | Token::Implicit { $field, .. }
            | Token::Explicit { $field, .. }
            | Token::Null { $field, .. }
            | Token::This { $field, .. }
            | Token::Super { $field, .. }
            | Token::New { $field, .. }
            | Token::Return { $field, .. }
            | Token::Throw { $field, .. }
            | Token::IntType { $field, .. }
            | Token::DoubleType { $field, .. }
            | Token::StringType { $field, .. }
            | Token::BooleanType { $field, .. }
            | Token::UnitType { $field, .. }
            | Token::AnyType { $field, .. }
            | Token::AnyRefType { $field, .. }
            | Token::NothingType { $field, .. }
            | Token::Id { $field, .. }
            | Token::StarStar { $field, .. }
            | Token::ColonColonColon { $field, .. }
            | Token::ColonColon { $field, .. }
            | Token::PlusPlus { $field, .. }
            | Token::MinusMinus { $field, .. }
            | Token::EqualEqual { $field, .. }
            | Token::NotEqual { $field, .. }
            | Token::LessEqual { $field, .. }
            | Token::GreaterEqual { $field, .. }
            | Token::AndAnd { $field, .. }
            | Token::OrOr { $field, .. }
            | Token::PlusAssign { $field, .. }
            | Token::MinusAssign { $field, .. }
            | Token::StarAssign { $field, .. }
            | Token::SlashAssign { $field, .. }
            | Token::PercentAssign { $field, .. }
            | Token::FatArrow { $field, .. }
            | Token::Arrow { $field, .. }
            | Token::LeftArrow { $field, .. }
            | Token::UpperBound { $field, .. }
            | Token::LowerBound { $field, .. }
            | Token::Plus { $field, .. }
            | Token::Minus { $field, .. }
            | Token::Star { $field, .. }
            | Token::Slash { $field, .. }
            | Token::Percent { $field, .. }
            | Token::LessThan { $field, .. }
            | Token::GreaterThan { $field, .. }
            | Token::Bang { $field, .. }
            | Token::Assign { $field, .. }
            | Token::Dot { $field, .. }
            | Token::LParen { $field, .. }
            | Token::RParen { $field, .. }
            | Token::LBracket { $field, .. }
            | Token::RBracket { $field, .. }
            | Token::LBrace { $field, .. }
            | Token::RBrace { $field, .. }
            | Token::Comma { $field, .. }
            | Token::Semicolon { $field, .. }
            | Token::Colon { $field, .. }
            | Token::Underscore { $field, .. }
            | Token::LineComment { $field, .. }
            | Token::BlockComment { $field, .. }
            | Token::Newline { $field, .. }
            | Token::Whitespace { $field, .. } => $field,
        }
    };
}
use token_field;

impl Token {
    pub fn text(&self) -> &str {
        token_field!(self, text)
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace { .. }
                | Token::Newline { .. }
                | Token::LineComment { .. }
                | Token::BlockComment { .. }
        )
    }

    pub fn is_plus(&self) -> bool {
        matches!(self, Token::Plus { .. })
    }

    pub fn is_minus(&self) -> bool {
        matches!(self, Token::Minus { .. })
    }

    pub fn is_colon(&self) -> bool {
        matches!(self, Token::Colon { .. })
    }

    pub fn is_comma(&self) -> bool {
        matches!(self, Token::Comma { .. })
    }

    pub fn is_lparen(&self) -> bool {
        matches!(self, Token::LParen { .. })
    }

    pub fn is_rparen(&self) -> bool {
        matches!(self, Token::RParen { .. })
    }

    pub fn is_lbracket(&self) -> bool {
        matches!(self, Token::LBracket { .. })
    }

    pub fn is_rbracket(&self) -> bool {
        matches!(self, Token::RBracket { .. })
    }

    pub fn is_lbrace(&self) -> bool {
        matches!(self, Token::LBrace { .. })
    }

    pub fn is_rbrace(&self) -> bool {
        matches!(self, Token::RBrace { .. })
    }

    pub fn is_semicolon(&self) -> bool {
        matches!(self, Token::Semicolon { .. })
    }

    pub fn is_assign(&self) -> bool {
        matches!(self, Token::Assign { .. })
    }

    pub fn is_dot(&self) -> bool {
        matches!(self, Token::Dot { .. })
    }

    pub fn is_arrow(&self) -> bool {
        matches!(self, Token::Arrow { .. })
    }

    pub fn is_fat_arrow(&self) -> bool {
        matches!(self, Token::FatArrow { .. })
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("text", &self.text())
            .finish()
    }
}
