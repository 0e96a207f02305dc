//! End-to-end tests for the analysis pipeline.
//!
//! Each test goes from source text through tokenizing, parsing and every semantic pass,
//! then inspects the diagnostics, the bound facts and the symbol table.

use std::rc::Rc;

use sema::{
    ast::ast::NodeKind,
    errors::errors::DiagnosticCode,
    render_diagnostic,
    semantic::{
        binder::bound::{BoundFact, ConstantValue},
        compilation::{Compilation, CompilationOptions, Phase},
        symbols::types::{NativeType, Ty},
    },
};

fn compile_with(source: &str, options: CompilationOptions) -> Compilation {
    let mut compilation = Compilation::from_source(source, "test.lang", options).unwrap();
    compilation.analyze().unwrap();
    compilation
}

fn compile(source: &str) -> Compilation {
    compile_with(source, CompilationOptions::default())
}

fn error_codes(compilation: &Compilation) -> Vec<DiagnosticCode> {
    compilation
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.is_error())
        .map(|diagnostic| diagnostic.code())
        .collect()
}

#[test]
fn test_valid_program_with_forward_references() {
    let compilation = compile(
        r#"
        struct Point { x: i64, y: i64 }

        fn main() -> i64 {
            let p = origin();
            return length(p) + length(origin());
        }

        fn length(p: Point) -> i64 { return p.x * p.x + p.y * p.y; }
        fn origin() -> Point { return new Point { x: 0, y: 0 }; }
        "#,
    );

    assert!(compilation.is_valid_program(), "{:?}", error_codes(&compilation));
    assert!(compilation.fixpoint_rounds() >= 1);
    assert!(compilation.fixpoint_rounds() <= 256);
}

#[test]
fn test_literal_table_through_pipeline() {
    let compilation =
        compile("fn f() { let a = 1_721; let b = 121.30; let c = .882; let d = -23; let e = 0xFF; }");
    assert!(compilation.is_valid_program(), "{:?}", error_codes(&compilation));

    let tree = compilation.tree();
    let values: Vec<(Ty, ConstantValue)> = tree
        .descendants(tree.root().unwrap())
        .into_iter()
        .filter(|node| matches!(tree.kind(*node), NodeKind::Literal { .. }))
        .map(|node| {
            let bound = compilation.bound(node).unwrap();
            match &bound.fact {
                BoundFact::Literal { value } => (bound.ty(), value.clone()),
                other => panic!("literal bound as {:?}", other),
            }
        })
        .collect();

    assert_eq!(
        values,
        vec![
            (Ty::Native(NativeType::I64), ConstantValue::Int(1721)),
            (Ty::Native(NativeType::F64), ConstantValue::Float(121.30)),
            (Ty::Native(NativeType::F64), ConstantValue::Float(0.882)),
            (Ty::Native(NativeType::I64), ConstantValue::Int(-23)),
            (Ty::Native(NativeType::I64), ConstantValue::Int(255)),
        ]
    );
}

#[test]
fn test_malformed_literals_report_exactly_once() {
    for lexeme in ["371.", "._61", "150__0"] {
        let compilation = compile(&format!("fn f() {{ let a = {}; }}", lexeme));

        assert_eq!(
            error_codes(&compilation),
            vec![DiagnosticCode::MalformedNumericLiteral],
            "{}",
            lexeme
        );
        assert_eq!(compilation.diagnostics().len(), 1);
        assert_eq!(compilation.halted_at(), Some(Phase::Types));
    }
}

#[test]
fn test_local_cycle_converges_to_unresolved_type() {
    let compilation = compile("fn f() { let a = b; let b = a; }");

    assert!(!compilation.is_valid_program());
    assert_eq!(
        error_codes(&compilation),
        vec![DiagnosticCode::UnresolvedType, DiagnosticCode::UnresolvedType]
    );
}

#[test]
fn test_ambiguous_import_is_reported_not_picked() {
    let source = "module left { fn pick() -> i64 { return 1; } } \
                  module right { fn pick() -> i64 { return 2; } } \
                  import left; import right; pick();";

    let compilation = compile(source);
    assert_eq!(error_codes(&compilation), vec![DiagnosticCode::AmbiguousName]);

    let tip = compilation.diagnostics().as_slice()[0].get_tip().to_string();
    assert!(tip.contains("left.pick"), "{}", tip);
    assert!(tip.contains("right.pick"), "{}", tip);
}

#[test]
fn test_analysis_is_deterministic() {
    let source = "module left { fn pick() -> i64 { return 1; } } \
                  module right { fn pick() -> i64 { return 2; } } \
                  import left; import right; pick(); missing(); pick();";

    let summarize = |compilation: &Compilation| -> Vec<(String, u32, String)> {
        compilation
            .diagnostics()
            .iter()
            .map(|diagnostic| {
                (
                    diagnostic.get_error_name().to_string(),
                    diagnostic.get_position().0,
                    diagnostic.get_tip().to_string(),
                )
            })
            .collect()
    };

    let first = summarize(&compile(source));
    for _ in 0..3 {
        assert_eq!(summarize(&compile(source)), first);
    }
    assert_eq!(first.len(), 3);
}

#[test]
fn test_analyze_twice_is_a_no_op() {
    let mut compilation =
        Compilation::from_source("fn f() { let x = 1; }", "test.lang", CompilationOptions::default())
            .unwrap();

    assert_eq!(compilation.analyze(), Ok(true));
    let bound = compilation.binder().len();
    let nodes = compilation.tree().len();

    assert_eq!(compilation.analyze(), Ok(true));
    assert_eq!(compilation.binder().len(), bound);
    assert_eq!(compilation.tree().len(), nodes);
}

#[test]
fn test_assignability_matrix() {
    let legal = [
        "fn f() { let a: i32 = 1i32; }",
        "fn f() { let a: any = 1i32; }",
        "fn f() { let a: any = \"text\"; }",
        "struct P { x: i64 } fn f(p: P) { let q: P = p; }",
    ];
    for source in legal {
        let compilation = compile(source);
        assert!(compilation.is_valid_program(), "{}: {:?}", source, error_codes(&compilation));
    }

    let illegal = [
        "fn f() { let a: any = 1; let b: i32 = a; }",
        "fn f() { let a: i32 = 1i64; }",
        "fn f() { let a: string = true; }",
        "struct P { x: i64 } struct Q { x: i64 } fn f(p: P) { let q: Q = p; }",
    ];
    for source in illegal {
        let compilation = compile(source);
        assert_eq!(
            error_codes(&compilation),
            vec![DiagnosticCode::IllegalAssignmentType],
            "{}",
            source
        );
    }
}

#[test]
fn test_dependency_assembly() {
    let library = compile_with(
        "module util { fn twice(x: i64) -> i64 { return x * 2; } struct Pair { a: i64, b: i64 } }",
        CompilationOptions::default().with_assembly_name("util"),
    );
    assert!(library.is_valid_program());
    let assembly = Rc::new(library.into_assembly().unwrap());
    assert_eq!(assembly.name, "util");

    let options = CompilationOptions::default().with_dependency(Rc::clone(&assembly));
    let program = compile_with(
        "import util; fn run(p: Pair) -> i64 { return twice(p.a) + p.b; }",
        options,
    );
    assert!(program.is_valid_program(), "{:?}", error_codes(&program));

    let options = CompilationOptions::default().with_dependency(Rc::clone(&assembly));
    let program = compile_with("import util; fn run() { twice(true); }", options);
    assert_eq!(
        error_codes(&program),
        vec![DiagnosticCode::IllegalAssignmentType]
    );
}

#[test]
fn test_split_module_sees_dependency_part() {
    let library = compile("module shared { fn base() -> i64 { return 1; } }");
    let assembly = Rc::new(library.into_assembly().unwrap());

    let options = CompilationOptions::default().with_dependency(assembly);
    let program = compile_with(
        "module shared { fn derived() -> i64 { return base() + 1; } }",
        options,
    );
    assert!(program.is_valid_program(), "{:?}", error_codes(&program));
}

#[test]
fn test_invalid_program_has_no_assembly() {
    let compilation = compile("fn f() { 1; }");
    assert!(!compilation.is_valid_program());
    assert!(compilation.into_assembly().is_none());
}

#[test]
fn test_rendered_diagnostic_points_at_source() {
    let source = "fn f() -> i64 {\n    return missing;\n}";
    let compilation = compile(source);
    let diagnostic = &compilation.diagnostics().as_slice()[0];

    let rendered = render_diagnostic(diagnostic, source);
    assert!(rendered.starts_with("error[2002]: UnresolvedName"), "{}", rendered);
    assert!(rendered.contains("2 | return missing;"), "{}", rendered);
    assert!(rendered.contains("-> test.lang"), "{}", rendered);
}
