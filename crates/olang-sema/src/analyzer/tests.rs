use super::*;
use crate::errors::SemanticError;
use crate::model::SemanticModel;
use olang_frontend::Parser;
use olang_frontend::ast::*;

fn analyze(source: &str) -> Result<(Program, SemanticModel), TypeError> {
    let mut parser = Parser::new(source);
    let mut program = parser.parse_program().expect("parse failed");
    let interner = parser.into_interner();
    let mut analyzer = Analyzer::new(&interner);
    let model = analyzer.analyze(&mut program)?;
    Ok((program, model))
}

fn expect_error(source: &str) -> SemanticError {
    let err = analyze(source).err().expect("analysis should fail");
    err.error
}

#[test]
fn inheritance_and_override() {
    let (_, model) = analyze(
        "class A is method f : Integer => Integer(1) end
         class B extends A is method f : Integer => Integer(2) end
         class Main is
           var x : A()
           method g : Integer => x.f()
         end",
    )
    .unwrap();

    let order: Vec<&str> = model.classes_in_order().map(|c| c.name.as_str()).collect();
    assert_eq!(order, ["A", "B", "Main"]);
    assert_eq!(model.class("B").unwrap().base.as_deref(), Some("A"));
    // Main's field survives because g reads it.
    assert_eq!(model.class("Main").unwrap().fields.len(), 1);
    assert_eq!(model.class("Main").unwrap().fields[0].ty.name, "A");
}

#[test]
fn dead_field_and_dead_local_elimination() {
    let (program, model) = analyze(
        "class S is
           var used : Integer(1)
           var unused : Integer(2)
           method m : Integer is
             var keep : Integer(10)
             var drop : Integer(11)
             return keep.Plus(used)
           end
         end",
    )
    .unwrap();

    let class = model.class("S").unwrap();
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "used");

    // The AST was rewritten in step: one field member and the method.
    assert_eq!(program.classes[0].members.len(), 2);

    let Member::Method(method) = &program.classes[0].members[1] else {
        panic!("expected the method after cleanup");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    assert_eq!(block.items.len(), 2);
    assert!(matches!(block.items[0].kind, StmtKind::Var { .. }));
    assert!(matches!(block.items[1].kind, StmtKind::Return(_)));
}

#[test]
fn dead_local_with_effectful_initializer_survives() {
    let (program, _) = analyze(
        "class Logger is
           method log : Integer => Integer(0)
         end
         class Main is
           method m : Integer is
             var ignored : Logger()
             var traced : Logger().log()
             return Integer(1)
           end
         end",
    )
    .unwrap();

    let Member::Method(method) = &program.classes[1].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    // `ignored` constructs a user class, `traced` calls a method: both
    // initializers are effectful, so both unused locals stay.
    assert_eq!(block.items.len(), 3);
}

#[test]
fn unreachable_statements_after_return_are_dropped() {
    let (program, _) = analyze(
        "class R is
           method m : Integer is
             return Integer(1)
             var z : Integer(2)
             return Integer(3)
           end
         end",
    )
    .unwrap();

    let Member::Method(method) = &program.classes[0].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    assert_eq!(block.items.len(), 1);
    assert!(matches!(block.items[0].kind, StmtKind::Return(Some(_))));
}

#[test]
fn array_typing_and_builtins() {
    let (program, model) = analyze(
        "class W is
           method build : Integer is
             var a : Array[Integer](10)
             var n : a.Length()
             var f : a.get(0)
             return n.Plus(f)
           end
         end",
    )
    .unwrap();

    let Member::Method(method) = &program.classes[0].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    let var_ty = |i: usize| model.var_type(block.items[i].id).unwrap().name.as_str();
    assert_eq!(var_ty(0), "Array[Integer]");
    assert_eq!(var_ty(1), "Integer");
    assert_eq!(var_ty(2), "Integer");
}

#[test]
fn list_typing_and_builtins() {
    let (program, model) = analyze(
        "class W is
           method build : List[Integer] is
             var l : List[Integer](Integer(1), Integer(3))
             var h : l.head()
             var a : l.toArray()
             var n : a.Length()
             return l.tail().append(h.Plus(n))
           end
         end",
    )
    .unwrap();

    let Member::Method(method) = &program.classes[0].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    let var_ty = |i: usize| model.var_type(block.items[i].id).unwrap().name.as_str();
    assert_eq!(var_ty(0), "List[Integer]");
    assert_eq!(var_ty(1), "Integer");
    assert_eq!(var_ty(2), "Array[Integer]");
}

#[test]
fn overload_resolution_with_forward_declaration() {
    let (_, model) = analyze(
        "class C is
           method f : Integer
           method f(x: Integer) : Integer => x
           method f : Integer is return Integer(0) end
         end",
    )
    .unwrap();

    let class = model.class("C").unwrap();
    assert_eq!(class.methods.len(), 2);
    let zero_arg = class.methods.iter().find(|m| m.param_types.is_empty()).unwrap();
    let one_arg = class
        .methods
        .iter()
        .find(|m| m.param_types.len() == 1)
        .unwrap();
    // The bodyless declaration was backfilled by the later implementation.
    assert!(zero_arg.implementation.is_some());
    assert!(one_arg.implementation.is_some());
    assert_eq!(one_arg.param_types[0].name, "Integer");
}

#[test]
fn inheritance_cycle_is_detected() {
    let err = expect_error("class A extends B is end class B extends A is end");
    assert!(matches!(
        err,
        SemanticError::InheritanceCycleOrUnresolved { .. }
    ));
}

#[test]
fn class_may_extend_builtin() {
    assert!(analyze("class Meters extends Integer is end").is_ok());
}

#[test]
fn every_surviving_expression_has_a_type() {
    let (program, model) = analyze(
        "class A is
           var v : Integer(3)
           method f(x: Integer) : Integer => x.Plus(v)
         end
         class Main is
           var a : A()
           this is this.a := A() end
           method run : Integer is
             var r : a.f(Integer(4))
             if r.Greater(Integer(0)) then
               return r
             end
             return Integer(0)
           end
         end",
    )
    .unwrap();

    fn walk_expr(expr: &Expr, model: &SemanticModel) {
        assert!(
            model.expr_type(expr.id).is_some(),
            "missing type for expression {}",
            expr.id
        );
        match &expr.kind {
            ExprKind::ConstructorCall { args, .. } => {
                args.iter().for_each(|a| walk_expr(a, model));
            }
            ExprKind::Call { callee, args } => {
                walk_expr(callee, model);
                args.iter().for_each(|a| walk_expr(a, model));
            }
            ExprKind::FieldAccess { object, .. } => walk_expr(object, model),
            _ => {}
        }
    }

    fn walk_block(block: &Block, model: &SemanticModel) {
        for stmt in &block.items {
            match &stmt.kind {
                StmtKind::Var { init, .. } => walk_expr(init, model),
                StmtKind::Assign { target, value } => {
                    walk_expr(target, model);
                    walk_expr(value, model);
                }
                StmtKind::While { cond, body } => {
                    walk_expr(cond, model);
                    walk_block(body, model);
                }
                StmtKind::If {
                    cond,
                    then_body,
                    else_body,
                } => {
                    walk_expr(cond, model);
                    walk_block(then_body, model);
                    if let Some(e) = else_body {
                        walk_block(e, model);
                    }
                }
                StmtKind::Return(Some(v)) => walk_expr(v, model),
                StmtKind::Return(None) => {}
                StmtKind::Expr(e) => walk_expr(e, model),
            }
        }
    }

    for class in &program.classes {
        for member in &class.members {
            match member {
                Member::Field(f) => walk_expr(&f.init, &model),
                Member::Method(m) => match &m.body {
                    Some(MethodBody::Block(b)) => walk_block(b, &model),
                    Some(MethodBody::Expr(e)) => walk_expr(e, &model),
                    None => {}
                },
                Member::Ctor(c) => walk_block(&c.body, &model),
            }
        }
    }
}

#[test]
fn field_usage_round_trip() {
    // Unreferenced: eliminated.
    let (_, model) = analyze(
        "class S is
           var f : Integer(1)
           method m : Integer => Integer(0)
         end",
    )
    .unwrap();
    assert!(model.class("S").unwrap().fields.is_empty());

    // Referenced: survives.
    let (_, model) = analyze(
        "class S is
           var f : Integer(1)
           method m : Integer => f
         end",
    )
    .unwrap();
    assert_eq!(model.class("S").unwrap().fields.len(), 1);
}

// ===== Error taxonomy =====

#[test]
fn duplicate_class() {
    let err = expect_error("class A is end class A is end");
    assert!(matches!(err, SemanticError::DuplicateClass { .. }));
}

#[test]
fn unknown_base() {
    let err = expect_error("class A extends Ghost is end");
    assert!(matches!(err, SemanticError::UnknownBase { .. }));
}

#[test]
fn duplicate_field() {
    let err = expect_error("class A is var x : Integer(1) var x : Integer(2) end");
    assert!(matches!(err, SemanticError::DuplicateField { .. }));
}

#[test]
fn duplicate_forward_declaration() {
    let err = expect_error(
        "class A is
           method f : Integer
           method f : Integer
         end",
    );
    assert!(matches!(
        err,
        SemanticError::DuplicateForwardDeclaration { .. }
    ));
}

#[test]
fn duplicate_implementation() {
    let err = expect_error(
        "class A is
           method f : Integer => Integer(1)
           method f : Integer => Integer(2)
         end",
    );
    assert!(matches!(err, SemanticError::DuplicateImplementation { .. }));
}

#[test]
fn return_type_mismatch_between_declarations() {
    let err = expect_error(
        "class A is
           method f : Integer
           method f : Real is return Real(1.0) end
         end",
    );
    assert!(matches!(
        err,
        SemanticError::ReturnTypeMismatchBetweenDeclarations { .. }
    ));
}

#[test]
fn duplicate_constructor_signature() {
    let err = expect_error(
        "class A is
           this(x: Integer) is end
           this(y: Integer) is end
         end",
    );
    assert!(matches!(
        err,
        SemanticError::DuplicateConstructorSignature { .. }
    ));
}

#[test]
fn undeclared_identifier() {
    let err = expect_error("class A is method m : Integer => ghost end");
    assert!(matches!(err, SemanticError::UndeclaredIdentifier { .. }));
}

#[test]
fn unknown_class_in_constructor_call() {
    let err = expect_error("class A is var x : Ghost() end");
    assert!(matches!(err, SemanticError::UnknownClass { .. }));
}

#[test]
fn method_not_declared() {
    let err = expect_error(
        "class A is end
         class B is
           var a : A()
           method m : Integer => a.missing()
         end",
    );
    assert!(matches!(err, SemanticError::MethodNotDeclared { .. }));
}

#[test]
fn no_matching_overload() {
    let err = expect_error(
        "class A is
           method f(x: Integer) : Integer => x
           method m : Integer => f(Real(1.0))
         end",
    );
    assert!(matches!(err, SemanticError::NoMatchingOverload { .. }));
}

#[test]
fn argument_count_mismatch() {
    let err = expect_error(
        "class A is
           method f(x: Integer) : Integer => x
           method m : Integer => f(Integer(1), Integer(2))
         end",
    );
    assert!(matches!(err, SemanticError::ArgumentCountMismatch { .. }));
}

#[test]
fn assignment_type_mismatch() {
    let err = expect_error(
        "class A is
           method m : Integer is
             var x : Integer(1)
             x := Real(2.0)
             return x
           end
         end",
    );
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
}

#[test]
fn condition_must_be_boolean() {
    let err = expect_error(
        "class A is
           method m : Integer is
             while Integer(1) loop end
             return Integer(0)
           end
         end",
    );
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
}

#[test]
fn void_initializer_is_rejected() {
    let err = expect_error(
        "class A is
           method nothing is return end
           method m : Integer is
             var x : nothing()
             return Integer(0)
           end
         end",
    );
    assert!(matches!(err, SemanticError::VoidInitializer { .. }));
}

#[test]
fn return_outside_method() {
    let err = expect_error("class A is this is return end end");
    assert!(matches!(err, SemanticError::ReturnOutsideMethod { .. }));
}

#[test]
fn return_value_in_void_method() {
    let err = expect_error("class A is method m is return Integer(1) end end");
    assert!(matches!(err, SemanticError::ReturnValueInVoid { .. }));
}

#[test]
fn missing_return_value() {
    let err = expect_error("class A is method m : Integer is return end end");
    assert!(matches!(err, SemanticError::MissingReturnValue { .. }));
}

#[test]
fn expression_body_requires_return_type() {
    let err = expect_error("class A is method m => Integer(1) end");
    assert!(matches!(
        err,
        SemanticError::ExpressionBodyWithoutReturnType { .. }
    ));
}

#[test]
fn duplicate_variable_in_same_scope() {
    let err = expect_error(
        "class A is
           method m : Integer is
             var x : Integer(1)
             var x : Integer(2)
             return x
           end
         end",
    );
    assert!(matches!(err, SemanticError::DuplicateVariable { .. }));
}

#[test]
fn shadowing_in_child_scope_is_allowed() {
    let result = analyze(
        "class A is
           method m(flag: Boolean) : Integer is
             var x : Integer(1)
             if flag then
               var x : Integer(2)
               return x
             end
             return x
           end
         end",
    );
    assert!(result.is_ok());
}

#[test]
fn forward_declaration_after_implementation_is_accepted() {
    // The implementation backfills the declaration slot; a later bodyless
    // declaration of the same signature takes it over without conflict.
    let result = analyze(
        "class A is
           method f : Integer is return Integer(1) end
           method f : Integer
         end",
    );
    assert!(result.is_ok());
}

#[test]
fn bare_array_parameter_accepts_any_element_type() {
    let result = analyze(
        "class A is
           method first(a: Array) : Integer => a.Length()
           method m : Integer is
             var xs : Array[Real](3)
             return first(xs)
           end
         end",
    );
    assert!(result.is_ok());
}

#[test]
fn standard_result_is_accepted_where_exact_type_is_required() {
    // Primitive arithmetic results participate as wildcards.
    let result = analyze(
        "class A is
           method m : Integer is
             var x : Integer(1)
             x := x.Plus(Integer(2))
             return x
           end
         end",
    );
    assert!(result.is_ok());
}

#[test]
fn analysis_is_repeatable() {
    let source = "class A is method f : Integer => Integer(1) end";
    let mut parser = Parser::new(source);
    let mut program = parser.parse_program().unwrap();
    let interner = parser.into_interner();
    let mut analyzer = Analyzer::new(&interner);
    assert!(analyzer.analyze(&mut program).is_ok());
    // Internal tables are cleared on entry, so a second run is clean.
    assert!(analyzer.analyze(&mut program).is_ok());
}
