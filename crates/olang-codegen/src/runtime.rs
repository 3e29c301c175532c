// runtime.rs
//! The fixed module preamble: runtime type definitions, external runtime
//! declarations, and the print format strings.
//!
//! The C runtime linked against the emitted module implements exactly
//! these symbols; the text below is part of the output contract and never
//! varies per program.

pub const MODULE_PREAMBLE: &str = r#"; ModuleID = 'languageOcompiler'
source_filename = "languageO"
%Array = type { i32, i8* }
%List = type { i8* }

declare i8* @malloc(i64)
declare %Array* @o_array_new(i32)
declare i32    @o_array_length(%Array*)
declare i8*    @o_array_get(%Array*, i32)
declare void   @o_array_set(%Array*, i32, i8*)
declare %List* @o_list_empty()
declare %List* @o_list_singleton(i8*)
declare %List* @o_list_replicate(i8*, i32)
declare %List* @o_list_append(%List*, i8*)
declare i8*    @o_list_head(%List*)
declare %List* @o_list_tail(%List*)
declare %Array* @o_list_to_array(%List*)
declare i32    @printf(i8*, ...)

@.fmt_int  = private unnamed_addr constant [4 x i8] c"%d\0A\00"
@.fmt_real = private unnamed_addr constant [4 x i8] c"%f\0A\00"
"#;

/// Sizes of boxed primitives in bytes, as the runtime's `i8*` cells
/// expect them.
pub fn boxed_size(llvm_ty: &str) -> Option<u32> {
    match llvm_ty {
        "i32" => Some(4),
        "double" => Some(8),
        "i1" => Some(1),
        _ => None,
    }
}
