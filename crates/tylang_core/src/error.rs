//! Top-level error type unifying every stage of [`crate::compile`]: lexing,
//! parsing, type checking, type validation and code generation each have
//! their own error enum with their own [`std::fmt::Display`], and this
//! just forwards to whichever one actually failed.

use std::fmt::Display;

use crate::codegen::CodegenError;
use crate::lexer::LexError;
use crate::parser::{ParseError, ProgramError};
use crate::typechecker::{TypeCheckError, TypeValidationError};

#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    TypeCheck(TypeCheckError),
    TypeValidation(TypeValidationError),
    Codegen(CodegenError),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Lex(e) => write!(f, "{e}"),
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::TypeCheck(e) => write!(f, "{e}"),
            CompileError::TypeValidation(e) => write!(f, "{e}"),
            CompileError::Codegen(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ProgramError> for CompileError {
    fn from(value: ProgramError) -> Self {
        match value {
            ProgramError::Lex(e) => CompileError::Lex(e),
            ProgramError::Parse(e) => CompileError::Parse(e),
        }
    }
}

impl From<TypeCheckError> for CompileError {
    fn from(value: TypeCheckError) -> Self {
        CompileError::TypeCheck(value)
    }
}

impl From<TypeValidationError> for CompileError {
    fn from(value: TypeValidationError) -> Self {
        CompileError::TypeValidation(value)
    }
}

impl From<CodegenError> for CompileError {
    fn from(value: CodegenError) -> Self {
        CompileError::Codegen(value)
    }
}
