//! End-to-end coverage of [`tylang_core::compile`] against the concrete
//! scenarios this compiler targets. These check the shape of the emitted
//! class artifacts (names, magic number, presence/absence) rather than
//! executing them, since driving a class-file verifier or a JVM is outside
//! this crate's own test harness.

use tylang_core::{compile, CompileError};

fn artifact_named<'a>(
    artifacts: &'a [tylang_core::ClassArtifact],
    name: &str,
) -> &'a tylang_core::ClassArtifact {
    artifacts
        .iter()
        .find(|a| a.name == name)
        .unwrap_or_else(|| panic!("no artifact named {name}, got {:?}", artifacts.iter().map(|a| &a.name).collect::<Vec<_>>()))
}

fn assert_valid_class_file(bytes: &[u8]) {
    assert_eq!(&bytes[0..4], &0xCAFEBABEu32.to_be_bytes(), "missing class-file magic number");
}

#[test]
fn add_two_ints() {
    let artifacts = compile("fun add(x: Int, y: Int): Int { x + y }", "add.ty").expect("compiles");
    assert_eq!(artifacts.len(), 1);
    let add = artifact_named(&artifacts, "add$");
    assert_valid_class_file(&add.bytes);
}

#[test]
fn recursive_factorial() {
    let source = "fun factorial(n: Int): Int { if (n <= 1) { 1 } else { n * factorial(n - 1) } }";
    let artifacts = compile(source, "factorial.ty").expect("compiles");
    assert_eq!(artifacts.len(), 1);
    assert_valid_class_file(&artifact_named(&artifacts, "factorial$").bytes);
}

#[test]
fn class_with_constructor_and_accessors() {
    let source = "class Point(x: Int, y: Int) { fun getX(): Int { x } fun getY(): Int { y } }";
    let artifacts = compile(source, "point.ty").expect("compiles");
    assert_eq!(artifacts.len(), 1);
    assert_valid_class_file(&artifact_named(&artifacts, "Point").bytes);
}

#[test]
fn object_singleton_with_methods() {
    let source = "object Math { fun pi(): Double { 3.14159 } fun square(x: Int): Int { x * x } }";
    let artifacts = compile(source, "math.ty").expect("compiles");
    assert_eq!(artifacts.len(), 1);
    assert_valid_class_file(&artifact_named(&artifacts, "Math").bytes);
}

#[test]
fn extension_methods_on_int() {
    let source = "extension Int { fun isEven(): Boolean { this % 2 == 0 } fun double(): Int { this * 2 } }";
    let artifacts = compile(source, "int_ext.ty").expect("compiles");
    assert_eq!(artifacts.len(), 1);
    assert_valid_class_file(&artifact_named(&artifacts, "Int$Extension").bytes);
}

#[test]
fn higher_order_function_with_lambda_argument() {
    let source = "fun twice(f: Int => Int, x: Int): Int { f(f(x)) }\nfun caller(): Int { twice((x: Int) => x * 2, 3) }";
    let artifacts = compile(source, "twice.ty").expect("compiles");
    assert_eq!(artifacts.len(), 2);
    assert_valid_class_file(&artifact_named(&artifacts, "twice$").bytes);
    assert_valid_class_file(&artifact_named(&artifacts, "caller$").bytes);
}

#[test]
fn string_concatenation_and_escapes() {
    let source = r#"fun greet(name: String): String { "hi, " + name + "!\n" }"#;
    let artifacts = compile(source, "greet.ty").expect("compiles");
    assert_eq!(artifacts.len(), 1);
    assert_valid_class_file(&artifact_named(&artifacts, "greet$").bytes);
}

#[test]
fn undefined_variable_is_rejected_with_no_artifact() {
    let source = "fun broken(x: Int): Int { undefined_variable + x }";
    let result = compile(source, "broken.ty");
    assert!(matches!(result, Err(CompileError::TypeCheck(_))), "{result:?}");
}
