use super::check::{assignability, is_statement_expression, Assignability};
use crate::{
    ast::ast::{NodeId, NodeKind},
    errors::errors::{InternalError, Severity},
    semantic::{
        compilation::{Compilation, CompilationOptions, Phase},
        symbols::{
            ids::{SymbolId, SymbolRef, UnitId},
            types::{NativeType, Ty},
        },
    },
};

fn compile(source: &str) -> Compilation {
    let mut compilation =
        Compilation::from_source(source, "test.lang", CompilationOptions::default()).unwrap();
    compilation.analyze().unwrap();
    compilation
}

fn errors(compilation: &Compilation) -> Vec<String> {
    compilation
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.is_error())
        .map(|diagnostic| diagnostic.get_error_name().to_string())
        .collect()
}

fn nodes_where(compilation: &Compilation, keep: fn(&NodeKind) -> bool) -> Vec<NodeId> {
    let tree = compilation.tree();
    tree.descendants(tree.root().unwrap())
        .into_iter()
        .filter(|node| keep(tree.kind(*node)))
        .collect()
}

fn implicit_returns(compilation: &Compilation) -> usize {
    nodes_where(compilation, |kind| {
        matches!(
            kind,
            NodeKind::Return {
                is_implicit: true,
                ..
            }
        )
    })
    .len()
}

fn assert_valid(compilation: &Compilation) {
    assert!(
        compilation.is_valid_program(),
        "unexpected diagnostics: {:?}",
        errors(compilation)
    );
}

#[test]
fn test_implicit_return_appended_once() {
    let mut compilation = compile("fn f() { let x = 1i32; }");
    assert_valid(&compilation);
    assert_eq!(implicit_returns(&compilation), 1);

    compilation.analyze().unwrap();
    assert_eq!(implicit_returns(&compilation), 1);

    let function = nodes_where(&compilation, |kind| {
        matches!(kind, NodeKind::FunctionDef { .. })
    })[0];
    let NodeKind::FunctionDef { body, .. } = compilation.tree().kind(function) else {
        unreachable!()
    };
    let NodeKind::Block { statements } = compilation.tree().kind(*body) else {
        panic!("function body is not a block")
    };
    assert!(matches!(
        compilation.tree().kind(*statements.last().unwrap()),
        NodeKind::Return {
            value: None,
            is_implicit: true
        }
    ));
    assert_eq!(compilation.type_of(function), Ty::Native(NativeType::Null));
}

#[test]
fn test_no_implicit_return_when_every_path_returns() {
    let compilation = compile("fn f() -> i64 { return 1; }");
    assert_valid(&compilation);
    assert_eq!(implicit_returns(&compilation), 0);

    let compilation =
        compile("fn f(c: bool) -> i64 { if c { return 1; } else { return 2; } }");
    assert_valid(&compilation);
    assert_eq!(implicit_returns(&compilation), 0);
}

#[test]
fn test_yield_placement() {
    let compilation = compile("fn f() { yield 1; }");
    assert_eq!(errors(&compilation), vec!["YieldNotAllowed"]);
    assert_eq!(compilation.halted_at(), Some(Phase::Implicit));

    let compilation = compile("fn f(c: bool) { let v = if c { yield 1; }; }");
    assert_eq!(errors(&compilation), vec!["NonExhaustiveYield"]);

    let compilation = compile("fn f(c: bool) { if c { yield 1; } else { g(); } }");
    assert_eq!(errors(&compilation), vec!["InconsistentYield"]);
}

#[test]
fn test_unreachable_statement_is_a_warning() {
    let compilation = compile("fn f() -> i64 { return 1; return 2; }");
    assert_valid(&compilation);

    let diagnostics = compilation.diagnostics().as_slice();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity(), Severity::Warning);
    assert_eq!(diagnostics[0].get_error_name(), "UnreachableStatement");
}

#[test]
fn test_duplicate_declarations() {
    let compilation = compile("fn f() { } fn f() { }");
    assert_eq!(errors(&compilation), vec!["DuplicateDefinition"]);
    assert_eq!(compilation.halted_at(), Some(Phase::Declare));

    let compilation = compile("fn f(a: i64, a: i64) { }");
    assert_eq!(errors(&compilation), vec!["DuplicateDefinition"]);

    let compilation = compile("module m { } namespace m { }");
    assert_eq!(errors(&compilation), vec!["DuplicateDefinition"]);
}

#[test]
fn test_modules_can_be_reopened() {
    let compilation = compile("module m { fn a() { } } module m { fn b() { } }");
    assert_valid(&compilation);

    let table = compilation.symbol_table();
    let scope = table.find_scope(&["m"]).unwrap();
    assert!(table.lookup_local(scope, "a").is_some());
    assert!(table.lookup_local(scope, "b").is_some());
}

#[test]
fn test_name_resolution_errors() {
    let compilation = compile("fn f() -> i64 { return y; }");
    assert_eq!(errors(&compilation), vec!["UnresolvedName"]);
    assert_eq!(compilation.halted_at(), Some(Phase::Names));

    let compilation = compile("import nowhere;");
    assert_eq!(errors(&compilation), vec!["ImportNotFound"]);

    let compilation = compile("module m { } fn f() { m.nothing(); }");
    assert_eq!(errors(&compilation), vec!["UnresolvedName"]);
}

#[test]
fn test_only_modules_can_be_imported() {
    let compilation = compile(
        "import f; fn f(secret: i64) -> i64 { return secret; } \
         fn g() -> i64 { return secret; }",
    );
    assert_eq!(errors(&compilation), vec!["ImportNotFound", "UnresolvedName"]);

    let compilation = compile("import P; struct P { x: i64 } fn g() -> i64 { return x; }");
    assert_eq!(errors(&compilation), vec!["ImportNotFound", "UnresolvedName"]);

    let compilation = compile(
        "module m { fn f(secret: i64) -> i64 { return secret; } } import m.f; \
         fn g() -> i64 { return secret; }",
    );
    assert_eq!(errors(&compilation), vec!["ImportNotFound", "UnresolvedName"]);
}

#[test]
fn test_qualified_module_member() {
    let compilation =
        compile("module m { fn g() -> i64 { return 1; } } fn f() -> i64 { return m.g(); }");
    assert_valid(&compilation);

    let call = nodes_where(&compilation, |kind| matches!(kind, NodeKind::Call { .. }))[0];
    assert_eq!(compilation.type_of(call), Ty::Native(NativeType::I64));
}

#[test]
fn test_imports_resolve_and_can_be_ambiguous() {
    let compilation = compile(
        "module a { fn f() -> i64 { return 1; } } import a; fn g() -> i64 { return f(); }",
    );
    assert_valid(&compilation);

    let compilation = compile(
        "module a { fn f() -> i64 { return 1; } } \
         module b { fn f() -> i64 { return 2; } } \
         import a; import b; f();",
    );
    assert_eq!(errors(&compilation), vec!["AmbiguousName"]);
}

#[test]
fn test_forward_references_converge() {
    let compilation = compile(
        "fn main() -> i64 { return helper(2); } fn helper(x: i64) -> i64 { return x * 2; }",
    );
    assert_valid(&compilation);
    assert_eq!(compilation.fixpoint_rounds(), 1);

    let compilation = compile("fn f(x: Id) -> i64 { return x; } type Id = i64;");
    assert_valid(&compilation);
}

#[test]
fn test_inferred_return_type() {
    let compilation = compile("fn f() { return 1u8; } fn g() -> u8 { return f(); }");
    assert_valid(&compilation);

    let table = compilation.symbol_table();
    let f = table.lookup_local(table.global(), "f").unwrap();
    assert_eq!(
        table.symbol(f).as_function().unwrap().return_type(),
        Ty::Native(NativeType::U8)
    );
}

#[test]
fn test_local_cycle_is_unresolved_type() {
    let compilation = compile("fn f() { let a = b; let b = a; }");
    assert_eq!(errors(&compilation), vec!["UnresolvedType", "UnresolvedType"]);
    assert_eq!(compilation.halted_at(), Some(Phase::Types));
}

#[test]
fn test_long_forward_reference_chains_converge() {
    let links = 300;
    let mut locals: Vec<String> = (0..links)
        .map(|i| format!("let a{} = a{} + 1;", i, i + 1))
        .collect();
    locals.push(format!("let a{} = 1;", links));
    let backward = format!("fn f() -> i64 {{ {} return a0; }}", locals.join(" "));

    let functions: Vec<String> = (0..links)
        .map(|i| format!("fn g{}() {{ return g{}(); }}", i, i + 1))
        .chain([format!("fn g{}() {{ return 7u16; }}", links)])
        .collect();
    let forward = format!("{} fn h() -> u16 {{ return g0(); }}", functions.join(" "));

    for source in [backward, forward] {
        let options = CompilationOptions::default().with_max_fixpoint_rounds(2);
        let mut compilation = Compilation::from_source(&source, "test.lang", options).unwrap();

        let analyzed = compilation.analyze();
        assert_eq!(analyzed, Ok(true), "{:?}", errors(&compilation));
        assert!(compilation.fixpoint_rounds() <= 2);
    }
}

#[test]
fn test_fixpoint_round_limit_is_internal_error() {
    let source =
        "fn main() -> i64 { return helper(2); } fn helper(x: i64) -> i64 { return x * 2; }";
    let options = CompilationOptions::default().with_max_fixpoint_rounds(0);
    let mut compilation = Compilation::from_source(source, "test.lang", options).unwrap();

    assert_eq!(
        compilation.analyze(),
        Err(InternalError::FixpointDiverged { rounds: 0 })
    );
}

#[test]
fn test_type_errors() {
    let compilation = compile("fn f(x: Foo) { }");
    assert_eq!(errors(&compilation), vec!["TypeDoesNotExist"]);

    let compilation = compile("fn g() { } fn f(x: g) { }");
    assert_eq!(errors(&compilation), vec!["TypeDoesNotExist"]);

    let compilation = compile("fn f() { let x = 1 + true; }");
    assert_eq!(errors(&compilation), vec!["IncompatibleOperands"]);

    let compilation = compile("fn f() { let x = !1; }");
    assert_eq!(errors(&compilation), vec!["InvalidOperand"]);

    let compilation = compile("fn f() { let x = 1; x(); }");
    assert_eq!(errors(&compilation), vec!["NotCallable"]);

    let compilation = compile("struct P { x: i64 } fn f(p: P) -> i64 { return p.y; }");
    assert_eq!(errors(&compilation), vec!["MissingMemberField"]);

    let compilation = compile("fn f() { let v = new i64 { }; }");
    assert_eq!(errors(&compilation), vec!["NotAStruct"]);
}

#[test]
fn test_numeric_literal_bounds_in_context() {
    let compilation = compile("fn f() { let x = 128i8; }");
    assert_eq!(errors(&compilation), vec!["NumericLiteralOverflow"]);

    let compilation = compile("fn f() { let x: i8 = -128i8; }");
    assert_valid(&compilation);
}

#[test]
fn test_conditional_expression_type() {
    let compilation = compile(
        "fn pick(c: bool) -> i64 { let v = if c { yield 1; } else { yield 2; }; return v; }",
    );
    assert_valid(&compilation);

    let conditional = nodes_where(&compilation, |kind| {
        matches!(kind, NodeKind::Conditional { .. })
    })[0];
    assert_eq!(compilation.type_of(conditional), Ty::Native(NativeType::I64));

    let looping = compile("fn f() { let i = 0; while i < 10 { i += 1; } }");
    assert_valid(&looping);
    let node = nodes_where(&looping, |kind| matches!(kind, NodeKind::While { .. }))[0];
    assert_eq!(looping.type_of(node), Ty::Native(NativeType::Null));
}

#[test]
fn test_mixed_yield_types_are_not_implemented() {
    let source = "fn f(c: bool) { let v = if c { yield 1; } else { yield \"s\"; }; }";
    let mut compilation =
        Compilation::from_source(source, "test.lang", CompilationOptions::default()).unwrap();

    assert!(matches!(
        compilation.analyze(),
        Err(InternalError::NotImplemented { .. })
    ));
}

#[test]
fn test_struct_members_and_methods() {
    let compilation = compile(
        "struct Counter { count: i64, fn get() -> i64 { return count; } } \
         fn make() -> Counter { return new Counter { count: 0 }; } \
         fn read(c: Counter) -> i64 { return c.get() + c.count; }",
    );
    assert_valid(&compilation);

    let compilation = compile("struct P { x: i64, y: i64 } fn f() { let p = new P { x: 1 }; }");
    assert_eq!(errors(&compilation), vec!["MissingFieldInitializer"]);

    let compilation =
        compile("struct P { x: i64 } fn f() { let p = new P { x: 1, z: 2 }; }");
    assert_eq!(errors(&compilation), vec!["MissingMemberField"]);
    assert_eq!(compilation.halted_at(), Some(Phase::Check));
}

#[test]
fn test_statement_expressions() {
    let compilation = compile("fn f() { 1; }");
    assert_eq!(errors(&compilation), vec!["InvalidExpressionStatement"]);

    let compilation = compile("fn g() { } fn f() { g(); }");
    assert_valid(&compilation);

    assert!(is_statement_expression(&NodeKind::Call {
        callee: NodeId(0),
        arguments: vec![],
    }));
    assert!(!is_statement_expression(&NodeKind::Identifier {
        name: "x".to_string()
    }));
}

#[test]
fn test_assignment_targets() {
    let compilation = compile("fn f() { const x = 1; x = 2; }");
    assert_eq!(errors(&compilation), vec!["AssignToConstant"]);

    let compilation = compile("fn f() { 1 = 2; }");
    assert_eq!(errors(&compilation), vec!["NotAssignable"]);

    let compilation = compile("fn f(a: i64) { a = 2; a += 3; }");
    assert_valid(&compilation);
}

#[test]
fn test_call_arguments_are_checked() {
    let compilation = compile("fn g(a: i64) { } fn f() { g(); }");
    assert_eq!(errors(&compilation), vec!["ArgumentCountMismatch"]);

    let compilation = compile("fn g(a: i64) { } fn f() { g(true); }");
    assert_eq!(errors(&compilation), vec!["IllegalAssignmentType"]);
}

#[test]
fn test_return_and_condition_types() {
    let compilation = compile("fn f() -> i64 { return true; }");
    assert_eq!(errors(&compilation), vec!["IllegalAssignmentType"]);

    let compilation = compile("fn f(c: bool) -> i64 { if c { return 1; } }");
    assert_eq!(errors(&compilation), vec!["IllegalAssignmentType"]);

    let compilation = compile("fn f() { if 1 { } }");
    assert_eq!(errors(&compilation), vec!["IllegalAssignmentType"]);
}

#[test]
fn test_type_used_as_value() {
    let compilation = compile("fn f() { let x = i64; }");
    assert_eq!(errors(&compilation), vec!["TypeUsedAsValue"]);
}

#[test]
fn test_assignability_rules() {
    let i32_ = Ty::Native(NativeType::I32);
    let string = Ty::Native(NativeType::String);
    let named = Ty::Named(SymbolRef {
        unit: UnitId(0),
        symbol: SymbolId(0),
    });

    assert_eq!(assignability(i32_, i32_), Assignability::Legal);
    assert_eq!(assignability(named, named), Assignability::Legal);
    assert_eq!(assignability(Ty::Any, i32_), Assignability::Legal);
    assert_eq!(assignability(i32_, Ty::Any), Assignability::Illegal);
    assert_eq!(assignability(i32_, string), Assignability::Illegal);
    assert_eq!(assignability(i32_, Ty::Error), Assignability::Suppressed);
    assert_eq!(assignability(Ty::Error, i32_), Assignability::Suppressed);
    assert_eq!(assignability(i32_, Ty::NoType), Assignability::NotAValue);

    let compilation = compile("fn f() { let a: any = 1i32; let b: i32 = 2i32; }");
    assert_valid(&compilation);

    let compilation = compile("fn f() { let a: any = 1; let b: i32 = a; }");
    assert_eq!(errors(&compilation), vec!["IllegalAssignmentType"]);
}
