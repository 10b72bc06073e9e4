//! Object model tests: allocation, fields, type checks and constants

use super::harness::*;

const POINT: &str = "app/Point";

// ============================================================================
// Fields
// ============================================================================

#[test]
fn test_instance_fields() {
    // p = new Point(); p.x = 7; p.big = 1 << 40; p.next = p; return p
    let mut p = Program::new();
    let point = p.rt.add_type("Lapp/Point;");
    let x = p.rt.add_field(POINT, "x", TypeCode::Int, false);
    let big = p.rt.add_field(POINT, "big", TypeCode::Long, false);
    let next = p.rt.add_field(POINT, "next", TypeCode::Object, false);
    let m = p.method("run", "L", true, 4, |w| {
        w.emit_21(Opcode::NewInstance, 0, point as u16);
        load_int(w, 1, 7);
        w.emit_22(Opcode::Iput, 1, 0, x as u16);
        load_long(w, 2, 1 << 40);
        w.emit_22(Opcode::IputWide, 2, 0, big as u16);
        w.emit_22(Opcode::IputObject, 0, 0, next as u16);
        w.emit_11x(Opcode::ReturnObject, 0);
    });
    let obj = p.returned(m, &[]).as_object();
    assert_eq!(p.rt.class_name_of(obj), POINT);
    assert_eq!(p.rt.instance_field(obj, "x"), Some(Value::Int(7)));
    assert_eq!(p.rt.instance_field(obj, "big"), Some(Value::Long(1 << 40)));
    assert_eq!(p.rt.instance_field(obj, "next"), Some(Value::Object(obj)));
}

#[test]
fn test_field_read_back_through_volatile_forms() {
    // Volatile variants behave as the plain ones
    let mut p = Program::new();
    let point = p.rt.add_type("Lapp/Point;");
    let big = p.rt.add_field(POINT, "big", TypeCode::Long, false);
    let m = p.method("run", "J", true, 3, |w| {
        w.emit_21(Opcode::NewInstance, 0, point as u16);
        load_long(w, 1, -9);
        w.emit_22(Opcode::IputWideVolatile, 1, 0, big as u16);
        load_long(w, 1, 0);
        w.emit_22(Opcode::IgetWideVolatile, 1, 0, big as u16);
        w.emit_11x(Opcode::ReturnWide, 1);
    });
    assert_eq!(p.returned(m, &[]), Value::Long(-9));
}

#[test]
fn test_sub_word_fields_truncate_and_extend() {
    // byte field: store 0x1ff, read back -1; char field: store -1, read 0xffff
    let mut p = Program::new();
    let point = p.rt.add_type("Lapp/Point;");
    let b = p.rt.add_field(POINT, "b", TypeCode::Byte, false);
    let c = p.rt.add_field(POINT, "c", TypeCode::Char, false);
    let m = p.method("run", "I", true, 3, |w| {
        w.emit_21(Opcode::NewInstance, 0, point as u16);
        load_int(w, 1, 0x1ff);
        w.emit_22(Opcode::IputByte, 1, 0, b as u16);
        load_int(w, 1, -1);
        w.emit_22(Opcode::IputChar, 1, 0, c as u16);
        w.emit_22(Opcode::IgetByte, 1, 0, b as u16);
        w.emit_22(Opcode::IgetChar, 2, 0, c as u16);
        w.emit_23x(Opcode::AddInt, 1, 1, 2);
        w.emit_11x(Opcode::Return, 1);
    });
    assert_eq!(p.returned(m, &[]), Value::Int(0xffff - 1));
}

#[test]
fn test_static_fields() {
    let mut p = Program::new();
    let counter = p.rt.add_field(POINT, "counter", TypeCode::Long, true);
    let name = p.rt.add_field(POINT, "name", TypeCode::Object, true);
    let s = p.rt.add_string("origin");
    let m = p.method("run", "J", true, 4, |w| {
        w.emit_21(Opcode::SgetWide, 0, counter as u16);
        load_long(w, 2, 5);
        w.emit_23x(Opcode::AddLong, 0, 0, 2);
        w.emit_21(Opcode::SputWide, 0, counter as u16);
        w.emit_21(Opcode::ConstString, 2, s as u16);
        w.emit_21(Opcode::SputObject, 2, name as u16);
        w.emit_11x(Opcode::ReturnWide, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Long(5));
    assert_eq!(p.returned(m, &[]), Value::Long(10));
    assert_eq!(p.rt.static_field(counter), Some(Value::Long(10)));
    let stored = p.rt.static_field(name).unwrap().as_object();
    assert_eq!(p.rt.string_value(stored), Some("origin"));
}

#[test]
fn test_iget_on_null_raises_npe() {
    let mut p = Program::new();
    let x = p.rt.add_field(POINT, "x", TypeCode::Int, false);
    let m = p.method("run", "V", true, 2, |w| {
        load_int(w, 0, 0);
        w.emit_22(Opcode::Iget, 1, 0, x as u16);
        w.emit_10x(Opcode::ReturnVoid);
    });
    let (class, _) = p.threw(m, &[]);
    assert_eq!(class, "java/lang/NullPointerException");
}

#[test]
fn test_unknown_field_throws() {
    let (class, message) = expect_throw(1, |w| {
        w.emit_21(Opcode::Sget, 0, 42);
        w.emit_10x(Opcode::ReturnVoid);
    });
    assert_eq!(class, classes::NO_SUCH_FIELD);
    assert_eq!(message.as_deref(), Some("field@42"));
}

#[test]
fn test_new_instance_of_unknown_class_throws() {
    let mut p = Program::new();
    let missing = p.rt.add_type("Lapp/Missing;");
    let m = p.method("run", "V", true, 1, |w| {
        w.emit_21(Opcode::NewInstance, 0, missing as u16);
        w.emit_10x(Opcode::ReturnVoid);
    });
    let (class, message) = p.threw(m, &[]);
    assert_eq!(class, classes::NO_CLASS_DEF);
    assert_eq!(message.as_deref(), Some("app/Missing"));
}

// ============================================================================
// Type checks
// ============================================================================

/// `static int test(Object o)` running `instance-of` against `descriptor`
fn instance_of(p: &mut Program, descriptor: &str) -> MethodRef {
    let ty = p.rt.add_type(descriptor);
    p.method("test", "IL", true, 2, |w| {
        w.emit_22(Opcode::InstanceOf, 0, 1, ty as u16);
        w.emit_11x(Opcode::Return, 0);
    })
}

#[test]
fn test_instance_of() {
    let mut p = Program::new();
    p.rt.define_class("app/Base", Some(classes::OBJECT));
    p.rt.define_class("app/Derived", Some("app/Base"));
    let test = instance_of(&mut p, "Lapp/Base;");
    let base = p.instance("app/Base");
    let derived = p.instance("app/Derived");
    let other = p.instance("app/Other");
    assert_eq!(p.returned(test, &[Value::Object(derived)]), Value::Int(1));
    assert_eq!(p.returned(test, &[Value::Object(base)]), Value::Int(1));
    assert_eq!(p.returned(test, &[Value::Object(other)]), Value::Int(0));
    assert_eq!(p.returned(test, &[Value::NULL]), Value::Int(0));
}

#[test]
fn test_instance_of_null_skips_resolution() {
    let mut p = Program::new();
    let test = instance_of(&mut p, "Lapp/Missing;");
    assert_eq!(p.returned(test, &[Value::NULL]), Value::Int(0));
    let obj = p.instance("app/Other");
    let (class, _) = p.threw(test, &[Value::Object(obj)]);
    assert_eq!(class, classes::NO_CLASS_DEF);
}

/// `static Object cast(Object o)` running `check-cast` against `descriptor`
fn check_cast(p: &mut Program, descriptor: &str) -> MethodRef {
    let ty = p.rt.add_type(descriptor);
    p.method("cast", "LL", true, 1, |w| {
        w.emit_21(Opcode::CheckCast, 0, ty as u16);
        w.emit_11x(Opcode::ReturnObject, 0);
    })
}

#[test]
fn test_check_cast_passes() {
    let mut p = Program::new();
    let cast = check_cast(&mut p, "Ljava/lang/Object;");
    let s = p.rt.new_string("x");
    assert_eq!(p.returned(cast, &[Value::Object(s)]), Value::Object(s));
}

#[test]
fn test_check_cast_failure_message() {
    let mut p = Program::new();
    p.rt.define_class("app/Foo", Some(classes::OBJECT));
    let cast = check_cast(&mut p, "Lapp/Foo;");
    let s = p.rt.new_string("x");
    let (class, message) = p.threw(cast, &[Value::Object(s)]);
    assert_eq!(class, "java/lang/ClassCastException");
    assert_eq!(
        message.as_deref(),
        Some("java.lang.String cannot be cast to app.Foo")
    );
}

#[test]
fn test_check_cast_null_always_passes() {
    // Not even the type is resolved
    let mut p = Program::new();
    let cast = check_cast(&mut p, "Lapp/Missing;");
    assert_eq!(p.returned(cast, &[Value::NULL]), Value::NULL);
}

// ============================================================================
// Constants
// ============================================================================

#[test]
fn test_const_string_is_interned() {
    // Two loads of the same string index yield the same reference
    let mut p = Program::new();
    let s = p.rt.add_string("hello");
    let m = p.method("run", "Z", true, 2, |w| {
        w.emit_21(Opcode::ConstString, 0, s as u16);
        w.emit_31(Opcode::ConstStringJumbo, 1, s);
        w.emit_22(Opcode::IfNe, 0, 1, 4);
        load_int(w, 0, 1);
        w.emit_11x(Opcode::Return, 0);
        load_int(w, 0, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Boolean(true));
}

#[test]
fn test_const_class() {
    let mut p = Program::new();
    let ty = p.rt.add_type("Ljava/lang/String;");
    let m = p.method("run", "L", true, 1, |w| {
        w.emit_21(Opcode::ConstClass, 0, ty as u16);
        w.emit_11x(Opcode::ReturnObject, 0);
    });
    let mirror = p.returned(m, &[]).as_object();
    assert_eq!(p.rt.class_name_of(mirror), classes::CLASS);
    assert_eq!(Some(mirror), p.rt.class(classes::STRING).map(|c| c.as_object()));
}

#[test]
fn test_unknown_string_throws() {
    let (class, message) = expect_throw(1, |w| {
        w.emit_21(Opcode::ConstString, 0, 3);
        w.emit_10x(Opcode::ReturnVoid);
    });
    assert_eq!(class, classes::INTERNAL_ERROR);
    assert_eq!(message.as_deref(), Some("string@3"));
}
