//! A generic parser-combinator engine, kept as general-purpose parsing
//! infrastructure. The actual grammar is driven by hand-written
//! [`super::FromTokens`] implementations built on
//! [`super::direct_parsing::DirectParser`] instead, since this engine's
//! point-free `>> | ! ^ %` operators compose poorly with tylang's
//! lookahead-heavy constructs (lambda disambiguation, trailing-lambda
//! sugar, operator precedence climbing).

use std::ops::{BitOr, BitXor, Not, Rem, Shr};

use super::{ParseError, ParseState};
use crate::lexer::GetPosition;

#[derive(Clone)]
pub enum Comb<'a, Tok, Term, Node> {
    /// Combinator for parsing a non terminal symbol. Therefore, we utilize the parsing function of
    /// this respective non-terminal.
    Node {
        parser: &'a dyn Fn(&mut ParseState<Tok>) -> Result<Node, ParseError>,
    },
    /// Combinator for matching a terminal.
    Terminal { token: Term },
    /// Combinator for matching a sequence of two other combinators.
    ///
    /// Note: This will nest arbitrary deep
    Sequence {
        current: Box<Comb<'a, Tok, Term, Node>>,
        next: Box<Comb<'a, Tok, Term, Node>>,
    },
    /// Combinator for parsing either the left or the right combinator.
    ///
    /// Note: It will try to parse the left combinator FIRST.
    Either {
        left: Box<Comb<'a, Tok, Term, Node>>,
        right: Box<Comb<'a, Tok, Term, Node>>,
    },
    /// Combinator for optinally parsing another combinator. If the contained combinator does not
    /// match, it is just ignored (and the tokens are not touched).
    Optional {
        inner: Box<Comb<'a, Tok, Term, Node>>,
    },
    /// Combinator for parsing an arbitrary repitition of another combinator. If amount is 0, the
    /// combinator will consume as many tokens as the inner combinator matches.
    Repitition {
        inner: Box<Comb<'a, Tok, Term, Node>>,
        amount: Option<usize>,
    },
    /// Combinator for parsing an repititions of another combinator until "closing" matches.
    RepeatUntil {
        repeated: Box<Comb<'a, Tok, Term, Node>>,
        closing: Box<Comb<'a, Tok, Term, Node>>,
    },
}

impl<Tok, Term, Node> PartialEq for Comb<'_, Tok, Term, Node>
where
    Term: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node { .. }, Self::Node { .. }) => false,
            (Self::Terminal { token: l_token }, Self::Terminal { token: r_token }) => {
                l_token == r_token
            }
            (
                Self::Sequence {
                    current: l_current,
                    next: l_next,
                },
                Self::Sequence {
                    current: r_current,
                    next: r_next,
                },
            ) => l_current == r_current && l_next == r_next,
            (
                Self::Either {
                    left: l_left,
                    right: l_right,
                },
                Self::Either {
                    left: r_left,
                    right: r_right,
                },
            ) => l_left == r_left && l_right == r_right,
            (Self::Optional { inner: l_inner }, Self::Optional { inner: r_inner }) => {
                l_inner == r_inner
            }
            (
                Self::Repitition {
                    inner: l_inner,
                    amount: l_amount,
                },
                Self::Repitition {
                    inner: r_inner,
                    amount: r_amount,
                },
            ) => l_inner == r_inner && l_amount == r_amount,
            _ => false,
        }
    }
}

impl<Tok, Term, Node> std::fmt::Debug for Comb<'_, Tok, Term, Node>
where
    Term: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node { .. } => f
                .debug_struct("Node")
                .field("parser", &"() -> {}".to_string())
                .finish(),
            Self::Terminal { token } => f.debug_struct("Single").field("token", token).finish(),
            Self::Sequence { current, next } => f
                .debug_struct("Sequence")
                .field("current", current)
                .field("next", next)
                .finish(),
            Self::Either { left, right } => f
                .debug_struct("Either")
                .field("left", left)
                .field("right", right)
                .finish(),
            Self::Optional { inner } => f.debug_struct("Optional").field("inner", inner).finish(),
            Self::Repitition { inner, amount } => f
                .debug_struct("Repitition")
                .field("inner", inner)
                .field("amount", amount)
                .finish(),
            Self::RepeatUntil { repeated, closing } => f
                .debug_struct("RepeatUntil")
                .field("repeated", repeated)
                .field("closing", closing)
                .finish(),
        }
    }
}

impl<Tok, Term, Node> Comb<'_, Tok, Term, Node>
where
    Tok: Clone + std::fmt::Debug + GetPosition,
    Term: PartialEq<Tok> + std::fmt::Debug,
    Node: std::fmt::Debug,
{
    pub fn parse(&self, tokens: &mut ParseState<Tok>) -> Result<Vec<Node>, ParseError> {
        let mut matched = vec![];
        match self {
            Comb::Terminal { token } => {
                let Some(t) = tokens.next() else {
                    return Err(ParseError {
                        message: "Unexpected EOF!".into(),
                        position: tokens.last_token().map(|token| token.position()),
                    });
                };

                // try to parse the terminal
                if *token != t {
                    return Err(ParseError {
                        message: format!("Unexpected {t:?} while trying to parse {token:?}"),
                        position: Some(t.position()),
                    });
                }
            }
            Comb::Sequence { current, next } => {
                let mut current_matches = current.parse(tokens)?;
                matched.append(&mut current_matches);

                let mut next_matches = next.parse(tokens)?;
                matched.append(&mut next_matches);
            }
            Comb::Either { left, right } => {
                let current_index = tokens.get_index();

                if let Ok(mut left_matches) = left.parse(tokens) {
                    matched.append(&mut left_matches);
                } else {
                    tokens.set_index(current_index);
                    let mut right_matches = right.parse(tokens)?;
                    matched.append(&mut right_matches);
                }
            }
            Comb::Node { parser } => {
                let matches = parser(tokens)?;
                matched.push(matches);
            }
            Comb::Optional { inner } => {
                let current_index = tokens.get_index();
                if let Ok(mut result) = inner.parse(tokens) {
                    matched.append(&mut result);
                } else {
                    tokens.set_index(current_index);
                }
            }
            Comb::Repitition { inner, amount } => {
                // make a case distinction on the amount
                if let Some(amount) = amount {
                    // match exactly the specified amount of tokens
                    for _ in 0..*amount {
                        let mut result = inner.parse(tokens)?;
                        matched.append(&mut result);
                    }
                } else {
                    // match an arbitrary amount of tokens
                    let mut current_index = tokens.get_index();
                    while let Ok(mut result) = inner.parse(tokens) {
                        matched.append(&mut result);
                        current_index = tokens.get_index();
                    }
                    tokens.set_index(current_index);
                }
            }
            Comb::RepeatUntil { repeated, closing } => {
                let mut current_index = tokens.get_index();
                while let Ok(mut result) = repeated.parse(tokens) {
                    matched.append(&mut result);
                    current_index = tokens.get_index();
                }
                tokens.set_index(current_index);

                let mut result = closing.parse(tokens).inspect_err(|e| {
                    tokens.add_error(e.clone());
                })?;
                matched.append(&mut result);
            }
        }

        Ok(matched)
    }
}

impl<Tok, Term, Node> Shr for Comb<'_, Tok, Term, Node> {
    type Output = Self;

    fn shr(self, rhs: Self) -> Self::Output {
        Comb::Sequence {
            current: Box::new(self),
            next: Box::new(rhs),
        }
    }
}

impl<Tok, Term, Node> BitOr for Comb<'_, Tok, Term, Node> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Comb::Either {
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }
}

impl<Tok, Term, Node> Not for Comb<'_, Tok, Term, Node> {
    type Output = Self;

    fn not(self) -> Self::Output {
        Comb::Optional {
            inner: Box::new(self),
        }
    }
}

impl<Tok, Term, Node> BitXor<()> for Comb<'_, Tok, Term, Node> {
    type Output = Self;

    fn bitxor(self, _rhs: ()) -> Self::Output {
        Comb::Repitition {
            inner: Box::new(self),
            amount: None,
        }
    }
}

impl<Tok, Term, Node> BitXor<usize> for Comb<'_, Tok, Term, Node> {
    type Output = Self;

    fn bitxor(self, rhs: usize) -> Self::Output {
        Comb::Repitition {
            inner: Box::new(self),
            amount: Some(rhs),
        }
    }
}

impl<'a, Tok, Term, Node> BitXor<Comb<'a, Tok, Term, Node>> for Comb<'a, Tok, Term, Node> {
    type Output = Self;

    fn bitxor(self, rhs: Comb<'a, Tok, Term, Node>) -> Self::Output {
        Comb::RepeatUntil {
            repeated: Box::new(self),
            closing: Box::new(rhs),
        }
    }
}

impl<'a, Tok, Term, Node> Rem for Comb<'a, Tok, Term, Node>
where
    Comb<'a, Tok, Term, Node>: Clone,
{
    type Output = Self;

    fn rem(self, rhs: Self) -> Self::Output {
        !(self.clone() >> ((rhs >> self) ^ ()))
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{Span, Token};

    use super::*;

    #[derive(Debug, PartialEq, Clone)]
    enum TestTerminal {
        Plus,
    }

    impl PartialEq<Token> for TestTerminal {
        fn eq(&self, other: &Token) -> bool {
            matches!((self, other), (TestTerminal::Plus, Token::Plus { .. }))
        }
    }

    fn plus_token() -> Token {
        Token::Plus {
            position: Span::default(),
            text: "+".into(),
        }
    }

    #[test]
    fn test_sequence_simple() {
        let left: Comb<Token, TestTerminal, ()> = Comb::Terminal {
            token: TestTerminal::Plus,
        };
        let right: Comb<Token, TestTerminal, ()> = Comb::Terminal {
            token: TestTerminal::Plus,
        };
        let new = left >> right;

        assert_eq!(
            Comb::Sequence {
                current: Box::new(Comb::Terminal {
                    token: TestTerminal::Plus
                }),
                next: Box::new(Comb::Terminal {
                    token: TestTerminal::Plus
                })
            },
            new
        );
    }

    #[test]
    fn test_parse_terminal_simple() {
        let a: Comb<Token, TestTerminal, ()> = Comb::Terminal {
            token: TestTerminal::Plus,
        };
        let mut tokens = vec![plus_token()].into();
        let result = a.parse(&mut tokens);

        assert_eq!(Ok(vec![]), result);
        assert_eq!(tokens.get_index(), 1);
    }

    #[test]
    fn test_optional_not_matching() {
        let a: Comb<Token, TestTerminal, ()> = !Comb::Terminal {
            token: TestTerminal::Plus,
        };
        let mut tokens = vec![Token::Minus {
            position: Span::default(),
            text: "-".into(),
        }]
        .into();
        let result = a.parse(&mut tokens);

        assert_eq!(Ok(vec![]), result);
        assert_eq!(tokens.get_index(), 0);
    }
}
