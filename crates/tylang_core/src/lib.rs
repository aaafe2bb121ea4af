use parser::ast::TopLevelStatement;

pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod typechecker;

pub use codegen::ClassArtifact;
pub use error::CompileError;

type Ast<T> = Vec<TopLevelStatement<T>>;

/// Lexes, parses, type-checks, validates and emits a complete source file,
/// stopping at the first stage that fails. Mirrors the pipeline
/// [`typechecker::TypeChecker`] itself documents: untyped AST -> inference
/// -> validation -> code generation.
pub fn compile(source: &str, file: impl Into<String>) -> Result<Vec<ClassArtifact>, CompileError> {
    let parsed = parser::parse_program(source, file)?;
    let checked = typechecker::TypeChecker::new(parsed).check()?;
    let validated = typechecker::TypeChecker::validate(checked)?;
    let artifacts = codegen::emit_program(&validated)?;
    Ok(artifacts)
}
