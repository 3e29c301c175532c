// tests/compile.rs
//
// End-to-end pipeline tests through the driver library.

use olang::commands::compile::{DEFAULT_SAMPLE, compile_source};
use olang::errors::PipelineError;

#[test]
fn default_sample_compiles() {
    let ir = compile_source(DEFAULT_SAMPLE, "<sample>").expect("sample must compile");
    assert!(ir.starts_with("; ModuleID = 'languageOcompiler'"));
    assert!(ir.contains("source_filename = \"languageO\""));
    assert!(ir.contains("define void @Main_ctor(%Main* %this)"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("@printf"));
}

#[test]
fn inheritance_dispatch_end_to_end() {
    let ir = compile_source(
        "class A is method f : Integer => Integer(1) end
         class B extends A is method f : Integer => Integer(2) end
         class Main is
           var x : A()
           method g : Integer => x.f()
         end",
        "test.o",
    )
    .expect("must compile");

    assert!(ir.contains("%A = type"));
    assert!(ir.contains("%B = type"));
    assert!(ir.contains("%Main = type"));
    assert!(ir.contains("switch i32"));
    assert!(ir.contains("call i32 @A_f"));
    assert!(ir.contains("call i32 @B_f"));
}

#[test]
fn parse_failure_is_staged_as_parse() {
    let err = compile_source("class 42", "bad.o").unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
}

#[test]
fn semantic_failure_carries_the_message() {
    let err = compile_source("class A is end class A is end", "dup.o").unwrap_err();
    let PipelineError::Semantic { message, .. } = err else {
        panic!("expected a semantic failure");
    };
    assert!(message.contains("declared more than once"), "got: {message}");
}

#[test]
fn emitted_ir_orders_sections() {
    let ir = compile_source(
        "class P is
           this is end
           method m : Integer => Integer(7)
         end
         class Main is
           var p : P()
           method go : Integer => p.m()
         end",
        "order.o",
    )
    .expect("must compile");

    let type_def = ir.find("%P = type").unwrap();
    let ctor = ir.find("define void @P_ctor").unwrap();
    let method = ir.find("define i32 @P_m").unwrap();
    let main = ir.find("define i32 @main()").unwrap();
    assert!(type_def < ctor && ctor < method && method < main);
}
