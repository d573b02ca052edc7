//! Object layout, exceptions, string concatenation, and arrays.

use neoc_data::{
    ArrayElem, ClassBuilder, FieldRef, JavaType, MethodBuilder, MethodSig, SourceInsn, ValueKind,
};
use pretty_assertions::assert_eq;

use crate::error::CompilerError;
use crate::opcode::Opcode;
use crate::tests::helpers::{compile_class, compile_classes, entry, method, method_opcodes, CONTRACT};

use Opcode::*;

fn point_class() -> neoc_data::ClassDef {
    let mut ctor = MethodBuilder::ctor(MethodSig::new(vec![JavaType::Int; 2], JavaType::Void))
        .max_locals(3);
    ctor.load(0, ValueKind::Ref)
        .invoke_special("java/lang/Object", "<init>", MethodSig::void())
        .load(0, ValueKind::Ref)
        .load(1, ValueKind::Int)
        .emit(SourceInsn::PutField(FieldRef {
            owner: "com/example/Point".into(),
            name: "x".into(),
            ty: JavaType::Int,
        }))
        .load(0, ValueKind::Ref)
        .load(2, ValueKind::Int)
        .emit(SourceInsn::PutField(FieldRef {
            owner: "com/example/Point".into(),
            name: "y".into(),
            ty: JavaType::Int,
        }))
        .ret();
    ClassBuilder::new("com/example/Point")
        .instance_field("x", JavaType::Int)
        .instance_field("y", JavaType::Int)
        .method(ctor.build())
        .build()
}

#[test]
fn allocation_builds_a_field_array_and_calls_the_ctor() {
    let mut m = entry(MethodSig::new(vec![], JavaType::Int)).max_locals(1);
    m.emit(SourceInsn::New {
        class: "com/example/Point".into(),
    })
    .emit(SourceInsn::Dup)
    .push_int(1)
    .push_int(2)
    .invoke_special(
        "com/example/Point",
        "<init>",
        MethodSig::new(vec![JavaType::Int; 2], JavaType::Void),
    )
    .store(0, ValueKind::Ref)
    .load(0, ValueKind::Ref)
    .emit(SourceInsn::GetField(FieldRef {
        owner: "com/example/Point".into(),
        name: "x".into(),
        ty: JavaType::Int,
    }))
    .ret_value(ValueKind::Int);
    let app = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_classes(vec![app, point_class()], CONTRACT).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![
            InitSlot, Push2, NewArray, Dup, Push1, Push2, Reverse3, CallL, StLoc0, LdLoc0, Push0,
            PickItem, Ret
        ]
    );

    // The constructor body starts past the superclass constructor call.
    assert_eq!(
        method_opcodes(&module, "<init>"),
        vec![
            InitSlot, LdArg0, LdArg1, Push0, Swap, SetItem, LdArg0, LdArg2, Push1, Swap, SetItem,
            Ret
        ]
    );
}

#[test]
fn empty_constructors_vanish_along_with_their_call() {
    let mut ctor = MethodBuilder::ctor(MethodSig::void()).max_locals(1);
    ctor.load(0, ValueKind::Ref)
        .invoke_special("java/lang/Object", "<init>", MethodSig::void())
        .ret();
    let thing = ClassBuilder::new("com/example/Thing")
        .instance_field("tag", JavaType::Int)
        .method(ctor.build())
        .build();

    let mut m = entry(MethodSig::new(vec![], JavaType::Void)).max_locals(1);
    m.emit(SourceInsn::New {
        class: "com/example/Thing".into(),
    })
    .emit(SourceInsn::Dup)
    .invoke_special("com/example/Thing", "<init>", MethodSig::void())
    .store(0, ValueKind::Ref)
    .ret();
    let app = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_classes(vec![app, thing], CONTRACT).unwrap();
    // Neither a call nor a duplicated array reference survives, and the
    // constructor itself is never compiled.
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, Push1, NewArray, StLoc0, Ret]
    );
    assert_eq!(module.method_count(), 1);
}

#[test]
fn inherited_fields_come_first_in_the_layout() {
    let base = ClassBuilder::new("com/example/Base")
        .instance_field("a", JavaType::Int)
        .build();
    let derived = ClassBuilder::new("com/example/Derived")
        .extends("com/example/Base")
        .instance_field("b", JavaType::Int)
        .build();
    let mut m = entry(MethodSig::new(
        vec![JavaType::object("com/example/Derived")],
        JavaType::Int,
    ))
    .max_locals(1);
    m.load(0, ValueKind::Ref)
        .emit(SourceInsn::GetField(FieldRef {
            owner: "com/example/Derived".into(),
            name: "b".into(),
            ty: JavaType::Int,
        }))
        .ret_value(ValueKind::Int);
    let app = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_classes(vec![app, base, derived], CONTRACT).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, Push1, PickItem, Ret]
    );
}

#[test]
fn exception_with_message_is_the_message() {
    let mut m = entry(MethodSig::new(vec![], JavaType::Void));
    m.emit(SourceInsn::New {
        class: "java/lang/Exception".into(),
    })
    .emit(SourceInsn::Dup)
    .push_str("oops")
    .invoke_special(
        "java/lang/Exception",
        "<init>",
        MethodSig::new(vec![JavaType::string()], JavaType::Void),
    )
    .emit(SourceInsn::Throw);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(method_opcodes(&module, "main"), vec![PushData1, Throw]);
}

#[test]
fn bare_exception_gets_a_placeholder_message() {
    let mut m = entry(MethodSig::new(vec![], JavaType::Void));
    m.emit(SourceInsn::New {
        class: "java/lang/Exception".into(),
    })
    .emit(SourceInsn::Dup)
    .invoke_special("java/lang/Exception", "<init>", MethodSig::void())
    .emit(SourceInsn::Throw);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    let main = method(&module, "main");
    assert_eq!(main.iter().next().unwrap().operand(), b"error");
}

#[test]
fn exception_subclasses_are_rejected() {
    let custom = ClassBuilder::new("com/example/MyError")
        .extends("java/lang/Exception")
        .build();
    let mut m = entry(MethodSig::new(vec![], JavaType::Void));
    m.emit(SourceInsn::New {
        class: "com/example/MyError".into(),
    })
    .emit(SourceInsn::Dup)
    .invoke_special("com/example/MyError", "<init>", MethodSig::void())
    .emit(SourceInsn::Throw);
    let app = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let err = compile_classes(vec![app, custom], CONTRACT).unwrap_err();
    assert!(matches!(
        err,
        CompilerError::UnsupportedExceptionType { ref ty, .. } if ty == "com/example/MyError"
    ));
}

#[test]
fn string_concatenation_becomes_cat() {
    let sb = "java/lang/StringBuilder";
    let sb_ty = JavaType::object(sb);
    let mut m = entry(MethodSig::new(vec![JavaType::string()], JavaType::string())).max_locals(1);
    m.emit(SourceInsn::New { class: sb.into() })
        .emit(SourceInsn::Dup)
        .invoke_special(sb, "<init>", MethodSig::void())
        .push_str("hello ")
        .invoke_virtual(sb, "append", MethodSig::new(vec![JavaType::string()], sb_ty.clone()))
        .load(0, ValueKind::Ref)
        .invoke_virtual(sb, "append", MethodSig::new(vec![JavaType::string()], sb_ty))
        .invoke_virtual(sb, "toString", MethodSig::new(vec![], JavaType::string()))
        .ret_value(ValueKind::Ref);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, PushData1, LdArg0, Cat, Convert, Ret]
    );
}

#[test]
fn static_fields_compile_to_static_slots() {
    let mut clinit = MethodBuilder::clinit();
    clinit
        .push_int(5)
        .emit(SourceInsn::PutStatic(FieldRef {
            owner: CONTRACT.into(),
            name: "counter".into(),
            ty: JavaType::Int,
        }))
        .ret();
    let mut m = entry(MethodSig::new(vec![], JavaType::Int));
    m.emit(SourceInsn::GetStatic(FieldRef {
        owner: CONTRACT.into(),
        name: "counter".into(),
        ty: JavaType::Int,
    }))
    .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT)
        .static_field("counter", JavaType::Int)
        .method(m.build())
        .method(clinit.build())
        .build();

    let module = compile_class(class).unwrap();
    assert_eq!(method_opcodes(&module, "main"), vec![LdSFld0, Ret]);
    assert_eq!(
        method_opcodes(&module, "_initialize"),
        vec![InitSSlot, Push5, StSFld0, Ret]
    );
}

#[test]
fn foreign_static_field_access_is_rejected() {
    let other = ClassBuilder::new("com/example/Other")
        .static_field("shared", JavaType::Int)
        .build();
    let mut m = entry(MethodSig::new(vec![], JavaType::Int));
    m.emit(SourceInsn::GetStatic(FieldRef {
        owner: "com/example/Other".into(),
        name: "shared".into(),
        ty: JavaType::Int,
    }))
    .ret_value(ValueKind::Int);
    let app = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let err = compile_classes(vec![app, other], CONTRACT).unwrap_err();
    assert!(matches!(err, CompilerError::UnsupportedInstruction { .. }));
}

#[test]
fn constant_byte_array_folds_into_pushdata() {
    let mut m = entry(MethodSig::new(vec![], JavaType::array(JavaType::Byte)));
    m.push_int(3)
        .emit(SourceInsn::NewArray { elem: ArrayElem::Byte })
        .emit(SourceInsn::Dup)
        .push_int(0)
        .push_int(1)
        .emit(SourceInsn::ArrayStore { elem: ArrayElem::Byte })
        .emit(SourceInsn::Dup)
        .push_int(1)
        .push_int(2)
        .emit(SourceInsn::ArrayStore { elem: ArrayElem::Byte })
        .emit(SourceInsn::Dup)
        .push_int(2)
        .push_int(3)
        .emit(SourceInsn::ArrayStore { elem: ArrayElem::Byte })
        .ret_value(ValueKind::Ref);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(method_opcodes(&module, "main"), vec![PushData1, Convert, Ret]);
    let main = method(&module, "main");
    assert_eq!(main.iter().next().unwrap().operand(), [1, 2, 3]);
}

#[test]
fn dynamic_byte_array_allocates_a_buffer() {
    let mut m = entry(MethodSig::new(vec![JavaType::Int], JavaType::array(JavaType::Byte)))
        .max_locals(1);
    m.load(0, ValueKind::Int)
        .emit(SourceInsn::NewArray { elem: ArrayElem::Byte })
        .ret_value(ValueKind::Ref);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, NewBuffer, Ret]
    );
}

#[test]
fn empty_reference_array_has_its_own_opcode() {
    let mut m = entry(MethodSig::new(vec![], JavaType::array(JavaType::string())));
    m.push_int(0)
        .emit(SourceInsn::NewArray { elem: ArrayElem::Ref })
        .ret_value(ValueKind::Ref);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(method_opcodes(&module, "main"), vec![NewArray0, Ret]);
}

#[test]
fn array_access_maps_to_item_opcodes() {
    let arr = JavaType::array(JavaType::Int);
    let mut m = entry(MethodSig::new(vec![arr], JavaType::Int)).max_locals(1);
    m.load(0, ValueKind::Ref)
        .push_int(0)
        .load(0, ValueKind::Ref)
        .push_int(1)
        .emit(SourceInsn::ArrayLoad { elem: ArrayElem::Int })
        .emit(SourceInsn::ArrayStore { elem: ArrayElem::Int })
        .load(0, ValueKind::Ref)
        .emit(SourceInsn::ArrayLength)
        .ret_value(ValueKind::Int);
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let module = compile_class(class).unwrap();
    assert_eq!(
        method_opcodes(&module, "main"),
        vec![InitSlot, LdArg0, Push0, LdArg0, Push1, PickItem, SetItem, LdArg0, Size, Ret]
    );
}

#[test]
fn multidimensional_arrays_are_rejected() {
    let mut m = entry(MethodSig::new(vec![], JavaType::Void));
    m.push_int(2)
        .push_int(2)
        .emit(SourceInsn::MultiNewArray {
            ty: JavaType::array(JavaType::array(JavaType::Int)),
            dims: 2,
        })
        .ret();
    let class = ClassBuilder::new(CONTRACT).method(m.build()).build();

    let err = compile_class(class).unwrap_err();
    assert!(matches!(err, CompilerError::UnsupportedInstruction { .. }));
}
