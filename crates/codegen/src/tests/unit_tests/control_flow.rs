//! Branch, switch, and comparison lowering.

use neoc_data::{
    ClassBuilder, InvokeKind, JavaType, JumpCond, MethodSig, SourceInsn, ValueKind,
};
use pretty_assertions::assert_eq;

use crate::error::CompilerError;
use crate::opcode::Opcode;
use crate::tests::helpers::{compile_class, entry, method_bytes, method_opcodes, CONTRACT};

use Opcode::*;

#[test]
fn zero_compare_materializes_the_zero() {
    let mut m = entry(MethodSig::new(vec![JavaType::Int], JavaType::Int)).max_locals(1);
    let negative = m.fresh_label();
    m.load(0, ValueKind::Int)
        .jump(JumpCond::IfLt, negative)
        .push_int(1)
        .ret_value(ValueKind::Int)
        .label(negative)
        .push_int(0)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, Push0, JmpLtL, Push1, Ret, Push0, Ret]
    );
}

#[test]
fn two_operand_compares_fuse_into_conditional_jumps() {
    let mut m = entry(MethodSig::new(vec![JavaType::Int; 2], JavaType::Int)).max_locals(2);
    let eq = m.fresh_label();
    m.load(0, ValueKind::Int)
        .load(1, ValueKind::Int)
        .jump(JumpCond::IfICmpEq, eq)
        .push_int(0)
        .ret_value(ValueKind::Int)
        .label(eq)
        .push_int(1)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, LdArg1, JmpEqL, Push0, Ret, Push1, Ret]
    );
}

#[test]
fn reference_compares_go_through_equal_and_isnull() {
    let string = JavaType::string();
    let mut m = entry(MethodSig::new(vec![string.clone(), string], JavaType::Int)).max_locals(2);
    let hit = m.fresh_label();
    let null = m.fresh_label();
    m.load(0, ValueKind::Ref)
        .load(1, ValueKind::Ref)
        .jump(JumpCond::IfACmpEq, hit)
        .load(0, ValueKind::Ref)
        .jump(JumpCond::IfNull, null)
        .push_int(0)
        .ret_value(ValueKind::Int)
        .label(hit)
        .push_int(1)
        .ret_value(ValueKind::Int)
        .label(null)
        .push_int(2)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![
            InitSlot, LdArg0, LdArg1, Equal, JmpIfL, LdArg0, IsNull, JmpIfL, Push0, Ret, Push1,
            Ret, Push2, Ret
        ]
    );
}

#[test]
fn lcmp_fuses_with_the_following_branch() {
    let mut m = entry(MethodSig::new(vec![JavaType::Long; 2], JavaType::Int)).max_locals(4);
    let ge = m.fresh_label();
    m.load(0, ValueKind::Long)
        .load(2, ValueKind::Long)
        .emit(SourceInsn::Lcmp)
        .jump(JumpCond::IfGe, ge)
        .push_int(0)
        .ret_value(ValueKind::Int)
        .label(ge)
        .push_int(1)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, LdArg1, JmpGeL, Push0, Ret, Push1, Ret]
    );
}

#[test]
fn lcmp_without_a_branch_is_rejected() {
    let mut m = entry(MethodSig::new(vec![JavaType::Long; 2], JavaType::Int)).max_locals(4);
    m.load(0, ValueKind::Long)
        .load(2, ValueKind::Long)
        .emit(SourceInsn::Lcmp)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let err = compile_class(class).unwrap_err();
    assert!(matches!(err, CompilerError::UnsupportedInstruction { .. }));
}

#[test]
fn int_switch_becomes_a_test_chain() {
    let mut m = entry(MethodSig::new(vec![JavaType::Int], JavaType::Int)).max_locals(1);
    let one = m.fresh_label();
    let five = m.fresh_label();
    let other = m.fresh_label();
    m.load(0, ValueKind::Int)
        .emit(SourceInsn::Switch {
            cases: vec![(1, one), (5, five)],
            default: other,
        })
        .label(one)
        .push_int(10)
        .ret_value(ValueKind::Int)
        .label(five)
        .push_int(50)
        .ret_value(ValueKind::Int)
        .label(other)
        .push_int(0)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![
            InitSlot, LdArg0, Dup, Push1, JmpNeL, Drop, JmpL, Push5, JmpNeL, JmpL, Push10, Ret,
            PushInt8, Ret, Push0, Ret
        ]
    );

    // The first mismatch branch lands on the second case's key test.
    let bytes = method_bytes(&module, "main");
    let first_jmpne = 6;
    let second_test = 17;
    assert_eq!(bytes[first_jmpne], Opcode::JmpNeL.byte());
    assert_eq!(
        bytes[first_jmpne + 1..first_jmpne + 5],
        (second_test - first_jmpne as i32).to_le_bytes()
    );
}

#[test]
fn empty_switch_drops_and_jumps_to_default() {
    let mut m = entry(MethodSig::new(vec![JavaType::Int], JavaType::Int)).max_locals(1);
    let other = m.fresh_label();
    m.load(0, ValueKind::Int)
        .emit(SourceInsn::Switch {
            cases: vec![],
            default: other,
        })
        .label(other)
        .push_int(0)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, Drop, JmpL, Push0, Ret]
    );
}

#[test]
fn string_switch_collapses_to_equality_tests() {
    let string = JavaType::string();
    let mut m = entry(MethodSig::new(vec![string.clone()], JavaType::Int)).max_locals(3);
    let hash_arm = m.fresh_label();
    let join = m.fresh_label();
    let hit = m.fresh_label();
    let miss = m.fresh_label();
    m.load(0, ValueKind::Ref)
        .store(1, ValueKind::Ref)
        .push_int(-1)
        .store(2, ValueKind::Int)
        .load(1, ValueKind::Ref)
        .invoke_virtual(
            "java/lang/String",
            "hashCode",
            MethodSig::new(vec![], JavaType::Int),
        )
        .emit(SourceInsn::Switch {
            cases: vec![(97, hash_arm)],
            default: join,
        })
        .label(hash_arm)
        .load(1, ValueKind::Ref)
        .push_str("a")
        .invoke_virtual(
            "java/lang/String",
            "equals",
            MethodSig::new(vec![JavaType::object("java/lang/Object")], JavaType::Boolean),
        )
        .jump(JumpCond::IfEq, join)
        .push_int(0)
        .store(2, ValueKind::Int)
        .jump(JumpCond::Always, join)
        .label(join)
        .load(2, ValueKind::Int)
        .emit(SourceInsn::Switch {
            cases: vec![(0, hit)],
            default: miss,
        })
        .label(hit)
        .push_int(1)
        .ret_value(ValueKind::Int)
        .label(miss)
        .push_int(0)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![
            InitSlot, LdArg0, StLoc0, LdLoc0, PushData1, Equal, JmpIfL, JmpL, Push1, Ret, Push0,
            Ret
        ]
    );
}

#[test]
fn string_switch_arms_tolerate_line_markers() {
    let string = JavaType::string();
    let mut m = entry(MethodSig::new(vec![string.clone()], JavaType::Int)).max_locals(3);
    let hash_arm = m.fresh_label();
    let join = m.fresh_label();
    let hit = m.fresh_label();
    let miss = m.fresh_label();
    m.load(0, ValueKind::Ref)
        .store(1, ValueKind::Ref)
        .push_int(-1)
        .store(2, ValueKind::Int)
        .load(1, ValueKind::Ref)
        .invoke_virtual(
            "java/lang/String",
            "hashCode",
            MethodSig::new(vec![], JavaType::Int),
        )
        .emit(SourceInsn::Switch {
            cases: vec![(97, hash_arm)],
            default: join,
        })
        .label(hash_arm)
        .line(10)
        .load(1, ValueKind::Ref)
        .line(11)
        .push_str("a")
        .invoke_virtual(
            "java/lang/String",
            "equals",
            MethodSig::new(vec![JavaType::object("java/lang/Object")], JavaType::Boolean),
        )
        .jump(JumpCond::IfEq, join)
        .line(12)
        .push_int(0)
        .store(2, ValueKind::Int)
        .jump(JumpCond::Always, join)
        .label(join)
        .load(2, ValueKind::Int)
        .emit(SourceInsn::Switch {
            cases: vec![(0, hit)],
            default: miss,
        })
        .label(hit)
        .push_int(1)
        .ret_value(ValueKind::Int)
        .label(miss)
        .push_int(0)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![
            InitSlot, LdArg0, StLoc0, LdLoc0, PushData1, Equal, JmpIfL, JmpL, Push1, Ret, Push0,
            Ret
        ]
    );
}

#[test]
fn try_region_opens_with_a_marker() {
    let mut m = entry(MethodSig::new(vec![], JavaType::Int));
    let start = m.fresh_label();
    let end = m.fresh_label();
    let handler = m.fresh_label();
    m.label(start)
        .push_str("boom")
        .emit(SourceInsn::Throw)
        .label(end)
        .label(handler)
        .emit(SourceInsn::Pop)
        .push_int(0)
        .ret_value(ValueKind::Int);
    let m = m.try_region(start, end, handler, Some("java/lang/Exception"));
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![TryL, PushData1, Throw, Drop, Push0, Ret]
    );

    // TRY_L at 0 (9 bytes), PUSHDATA "boom" (6), THROW (1); the handler
    // starts at 16 and there is no finally.
    let bytes = method_bytes(&module, "main");
    assert_eq!(bytes[1..9], [16, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn interface_dispatch_is_rejected() {
    let mut m = entry(MethodSig::new(vec![JavaType::object("com/example/Iface")], JavaType::Void))
        .max_locals(1);
    m.load(0, ValueKind::Ref)
        .invoke(
            InvokeKind::Interface,
            "com/example/Iface",
            "run",
            MethodSig::void(),
        )
        .ret();
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let err = compile_class(class).unwrap_err();
    assert!(matches!(err, CompilerError::UnsupportedInstruction { .. }));
}
