use super::Emitter;
use crate::runtime::MODULE_PREAMBLE;
use olang_frontend::Parser;
use olang_sema::Analyzer;

fn compile(source: &str) -> String {
    let mut parser = Parser::new(source);
    let mut program = parser.parse_program().expect("parse failed");
    let interner = parser.into_interner();
    let mut analyzer = Analyzer::new(&interner);
    let model = analyzer.analyze(&mut program).expect("analysis failed");
    Emitter::new(&program, &interner, &model)
        .emit()
        .expect("emission failed")
}

/// No instruction may follow a terminator inside a basic block.
fn assert_blocks_are_well_formed(ir: &str) {
    let mut in_function = false;
    let mut closed = false;
    for line in ir.lines() {
        if line.starts_with("define ") {
            in_function = true;
            closed = false;
            continue;
        }
        if !in_function {
            continue;
        }
        if line == "}" {
            in_function = false;
            continue;
        }
        let is_label = line.ends_with(':') && !line.starts_with(' ');
        if is_label {
            closed = false;
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        assert!(!closed, "instruction after terminator: {line}");
        if trimmed.starts_with("ret ") || trimmed.starts_with("br ") || trimmed.starts_with("switch ")
        {
            closed = true;
        }
    }
}

#[test]
fn preamble_is_frozen() {
    let ir = compile("class Main is end");
    assert!(ir.starts_with(MODULE_PREAMBLE));
    assert!(ir.contains("declare %Array* @o_array_new(i32)"));
    assert!(ir.contains("@.fmt_real = private unnamed_addr constant [4 x i8] c\"%f\\0A\\00\""));
}

#[test]
fn type_definitions_follow_class_id_order() {
    // B is declared first but extends A, so A gets classId 1 and its type
    // definition comes first.
    let ir = compile(
        "class B extends A is end
         class A is end",
    );
    let a = ir.find("%A = type").expect("missing %A");
    let b = ir.find("%B = type").expect("missing %B");
    assert!(a < b);
}

#[test]
fn type_definitions_include_tag_and_fields() {
    let ir = compile(
        "class A is
           var x : Integer(1)
           method m : Integer => x
         end",
    );
    assert!(ir.contains("%A = type { i32, i32 }"), "got:\n{ir}");
}

#[test]
fn override_dispatch_switches_over_class_tags() {
    let ir = compile(
        "class A is method f : Integer => Integer(1) end
         class B extends A is method f : Integer => Integer(2) end
         class Main is
           var x : A()
           method g : Integer => x.f()
         end",
    );

    assert!(ir.contains("define i32 @A_f(%A* %this)"));
    assert!(ir.contains("define i32 @B_f(%B* %this)"));
    assert!(ir.contains("define i32 @Main_g(%Main* %this)"));

    // The dispatch in Main_g covers both A (tag 1) and its descendant B
    // (tag 2), even though x's static type is A.
    let main_g = function_body(&ir, "@Main_g");
    assert!(main_g.contains("switch i32"), "got:\n{main_g}");
    assert!(main_g.contains("i32 1, label"));
    assert!(main_g.contains("i32 2, label"));
    assert!(main_g.contains("call i32 @A_f(%A*"));
    assert!(main_g.contains("call i32 @B_f(%B*"));

    assert_blocks_are_well_formed(&ir);
}

#[test]
fn array_builtins_lower_to_runtime_calls() {
    let ir = compile(
        "class W is
           method build : Integer is
             var a : Array[Integer](10)
             var n : a.Length()
             var f : a.get(0)
             return n.Plus(f)
           end
         end",
    );

    assert!(ir.contains("call %Array* @o_array_new(i32 10)"));
    assert!(ir.contains("call i32 @o_array_length(%Array*"));
    assert!(ir.contains("call i8* @o_array_get(%Array*"));
    // get() unboxes the element cell.
    assert!(ir.contains("bitcast i8*"));
    assert!(ir.contains("add i32"));
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn list_constructor_boxes_primitive_elements() {
    let ir = compile(
        "class W is
           method build : List[Integer] is
             var l : List[Integer](Integer(5))
             return l.append(Integer(6))
           end
         end",
    );

    assert!(ir.contains("call i8* @malloc(i64 4)"));
    assert!(ir.contains("call %List* @o_list_singleton(i8*"));
    assert!(ir.contains("call %List* @o_list_append(%List*"));
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn object_allocation_uses_the_null_gep_size_trick() {
    let ir = compile(
        "class P is
           this(seed: Integer) is end
         end
         class Main is
           method m : P => P(Integer(3))
         end",
    );

    let m = function_body(&ir, "@Main_m");
    assert!(m.contains("getelementptr %P, %P* null, i32 1"));
    assert!(m.contains("ptrtoint %P*"));
    assert!(m.contains("call i8* @malloc(i64"));
    assert!(m.contains("store i32 1, i32*"));
    assert!(m.contains("call void @P_ctor__Integer(%P*"));
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn constructor_parameters_are_copied_to_slots() {
    let ir = compile(
        "class P is
           var seed : Integer(0)
           this(seed: Integer) is this.seed := seed end
         end
         class Main is
           var p : P(Integer(1))
           method m : Integer => p.seed
         end",
    );

    assert!(ir.contains("define void @P_ctor__Integer(%P* %this, i32 %seed)"));
    assert!(ir.contains("%seed.addr = alloca i32"));
    assert!(ir.contains("store i32 %seed, i32* %seed.addr"));
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn main_allocates_the_start_class_and_calls_its_ctor() {
    let ir = compile(
        "class Main is
           this is Integer(42).Print() end
         end",
    );

    let main = function_body(&ir, "@main");
    assert!(main.contains("call i8* @malloc"));
    assert!(main.contains("store i32 1, i32*"));
    assert!(main.contains("call void @Main_ctor(%Main*"));
    assert!(last_instruction(&main) == "ret i32 0");
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn main_without_classes_just_returns() {
    let ir = compile("");
    let main = function_body(&ir, "@main");
    assert_eq!(last_instruction(&main), "ret i32 0");
}

#[test]
fn while_and_if_lower_to_labelled_blocks() {
    let ir = compile(
        "class Main is
           method count(n: Integer) : Integer is
             var total : Integer(0)
             while n.Greater(Integer(0)) loop
               total := total.Plus(n)
               n := n.Minus(Integer(1))
             end
             if total.Greater(Integer(100)) then
               return total
             else
               return Integer(0)
             end
           end
         end",
    );

    let body = function_body(&ir, "@Main_count__Integer");
    for label in ["cond_", "body_", "exit_", "then_", "else_"] {
        assert!(body.contains(label), "missing {label} in:\n{body}");
    }
    assert!(body.contains("icmp sgt i32"));
    assert!(body.contains("br i1"));
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn print_uses_the_format_globals() {
    let ir = compile(
        "class Main is
           this is
             Integer(42).Print()
             Real(1.5).Print()
           end
         end",
    );

    assert!(ir.contains("getelementptr [4 x i8], [4 x i8]* @.fmt_int, i32 0, i32 0"));
    assert!(ir.contains("getelementptr [4 x i8], [4 x i8]* @.fmt_real, i32 0, i32 0"));
    assert!(ir.contains("call i32 (i8*, ...) @printf(i8*"));
    assert!(ir.contains("double 1.5"));
    assert_blocks_are_well_formed(&ir);
}

#[test]
fn void_method_falls_through_to_ret_void() {
    let ir = compile(
        "class Main is
           method nop is end
         end",
    );
    let body = function_body(&ir, "@Main_nop");
    assert_eq!(last_instruction(&body), "ret void");
}

#[test]
fn overloaded_methods_mangle_their_parameter_types() {
    let ir = compile(
        "class C is
           method f : Integer => Integer(0)
           method f(x: Integer) : Integer => x
           method f(x: Real) : Integer => Integer(1)
         end",
    );

    assert!(ir.contains("define i32 @C_f(%C* %this)"));
    assert!(ir.contains("define i32 @C_f__Integer(%C* %this, i32 %x)"));
    assert!(ir.contains("define i32 @C_f__Real(%C* %this, double %x)"));
}

#[test]
fn inherited_method_case_casts_to_the_declaring_class() {
    let ir = compile(
        "class A is method f : Integer => Integer(1) end
         class B extends A is end
         class Main is
           var b : B()
           method g : Integer => b.f()
         end",
    );

    let g = function_body(&ir, "@Main_g");
    // B inherits f from A: its case casts %B* to %A* and calls @A_f.
    assert!(g.contains("bitcast %B*"));
    assert!(g.contains("call i32 @A_f(%A*"));
    assert_blocks_are_well_formed(&ir);
}

/// Last instruction line of a function body (skipping the closing brace).
fn last_instruction(body: &str) -> String {
    body.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty() && *l != "}")
        .unwrap_or_default()
        .to_string()
}

/// Extract the text of one emitted function by its `@name`.
fn function_body(ir: &str, name: &str) -> String {
    let mut out = String::new();
    let mut capturing = false;
    for line in ir.lines() {
        if line.starts_with("define ") && line.contains(&format!("{name}(")) {
            capturing = true;
        }
        if capturing {
            out.push_str(line);
            out.push('\n');
            if line == "}" {
                break;
            }
        }
    }
    assert!(!out.is_empty(), "function {name} not found in:\n{ir}");
    out
}
