//! Invoke marshalling tests: nested activations and host calls

use super::harness::*;

/// `static long add(int a, long b)`: v2 = a, v3:v4 = b
fn add_int_long(p: &mut Program) -> MethodRef {
    p.method("add", "JIJ", true, 5, |w| {
        w.emit_12x(Opcode::IntToLong, 0, 2);
        w.emit_23x(Opcode::AddLong, 0, 0, 3);
        w.emit_11x(Opcode::ReturnWide, 0);
    })
}

/// `int name()` on `class` returning `value`
fn name_method(p: &mut Program, class: &str, value: i32) -> MethodRef {
    p.method_in(class, "name", "I", false, 2, |w, _| {
        load_int(w, 0, value);
        w.emit_11x(Opcode::Return, 0);
    })
}

// ============================================================================
// Nested activations
// ============================================================================

#[test]
fn test_invoke_static_packed_wide_argument() {
    // v0 = 5; v1:v2 = 1 << 33; invoke-static {v0, v1, v2}, add
    let mut p = Program::new();
    let add = add_int_long(&mut p);
    let m = p.method("run", "J", true, 3, |w| {
        load_int(w, 0, 5);
        load_long(w, 1, 1 << 33);
        w.emit_35c(Opcode::InvokeStatic, &[0, 1, 2], add.0 as u16);
        w.emit_11x(Opcode::MoveResultWide, 0);
        w.emit_11x(Opcode::ReturnWide, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Long((1 << 33) + 5));
}

#[test]
fn test_invoke_static_range() {
    let mut p = Program::new();
    let add = add_int_long(&mut p);
    let m = p.method("run", "J", true, 20, |w| {
        load_int(w, 0, -1);
        load_long(w, 17, 10);
        w.emit_32x(Opcode::Move16, 16, 0);
        w.emit_3rc(Opcode::InvokeStaticRange, 16, 3, add.0 as u16);
        w.emit_11x(Opcode::MoveResultWide, 0);
        w.emit_11x(Opcode::ReturnWide, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Long(9));
}

#[test]
fn test_invoke_direct_receiver_int_long() {
    // long f(int a, long b) on an instance: this = v1, a = v2, b = v3:v4
    let mut p = Program::new();
    let f = p.method("f", "JIJ", false, 5, |w| {
        w.emit_12x(Opcode::IntToLong, 0, 2);
        w.emit_23x(Opcode::SubLong, 0, 3, 0);
        w.emit_11x(Opcode::ReturnWide, 0);
    });
    let obj = p.instance(MAIN);
    // caller(Object this): v0 = this (param), v1 = 3, v2:v3 = 100
    let caller = p.method("caller", "JL", true, 5, |w| {
        load_int(w, 1, 3);
        load_long(w, 2, 100);
        w.emit_35c(Opcode::InvokeDirect, &[4, 1, 2, 3], f.0 as u16);
        w.emit_11x(Opcode::MoveResultWide, 0);
        w.emit_11x(Opcode::ReturnWide, 0);
    });
    assert_eq!(p.returned(caller, &[Value::Object(obj)]), Value::Long(97));
}

#[test]
fn test_invoke_virtual_selects_override() {
    let mut p = Program::new();
    p.rt.define_class("app/Base", Some(classes::OBJECT));
    p.rt.define_class("app/Derived", Some("app/Base"));
    let base_name = name_method(&mut p, "app/Base", 1);
    name_method(&mut p, "app/Derived", 2);
    // static int call(Base b) { return b.name(); }
    let call = p.method("call", "IL", true, 1, |w| {
        w.emit_35c(Opcode::InvokeVirtual, &[0], base_name.0 as u16);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    let base = p.instance("app/Base");
    let derived = p.instance("app/Derived");
    assert_eq!(p.returned(call, &[Value::Object(base)]), Value::Int(1));
    assert_eq!(p.returned(call, &[Value::Object(derived)]), Value::Int(2));
}

#[test]
fn test_invoke_super_keeps_resolved_method() {
    let mut p = Program::new();
    p.rt.define_class("app/Base", Some(classes::OBJECT));
    p.rt.define_class("app/Derived", Some("app/Base"));
    let base_name = name_method(&mut p, "app/Base", 1);
    name_method(&mut p, "app/Derived", 2);
    let call = p.method("call", "IL", true, 1, |w| {
        w.emit_35c(Opcode::InvokeSuper, &[0], base_name.0 as u16);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    let derived = p.instance("app/Derived");
    assert_eq!(p.returned(call, &[Value::Object(derived)]), Value::Int(1));
}

#[test]
fn test_invoke_on_null_receiver_raises_npe() {
    let mut p = Program::new();
    let name = name_method(&mut p, MAIN, 1);
    let m = p.method("run", "V", true, 1, |w| {
        load_int(w, 0, 0);
        w.emit_35c(Opcode::InvokeInterface, &[0], name.0 as u16);
        w.emit_10x(Opcode::ReturnVoid);
    });
    let (class, _) = p.threw(m, &[]);
    assert_eq!(class, "java/lang/NullPointerException");
}

#[test]
fn test_invoke_static_on_instance_method_throws() {
    let mut p = Program::new();
    let name = name_method(&mut p, MAIN, 1);
    let m = p.method("run", "V", true, 1, |w| {
        w.emit_35c(Opcode::InvokeStatic, &[], name.0 as u16);
        w.emit_10x(Opcode::ReturnVoid);
    });
    let (class, _) = p.threw(m, &[]);
    assert_eq!(class, classes::INCOMPATIBLE_CLASS_CHANGE);
}

#[test]
fn test_argument_slot_mismatch_is_internal_fault() {
    // add takes three slots; pass two
    let mut p = Program::new();
    let add = add_int_long(&mut p);
    let m = p.method("run", "V", true, 2, |w| {
        w.emit_35c(Opcode::InvokeStatic, &[0, 1], add.0 as u16);
        w.emit_10x(Opcode::ReturnVoid);
    });
    assert_eq!(
        p.try_call(m, None, &[]),
        Err(VmError::ArgumentCountMismatch {
            expected: 3,
            actual: 2
        })
    );
}

#[test]
fn test_call_entry_checks_argument_slots() {
    let mut p = Program::new();
    let add = add_int_long(&mut p);
    assert!(matches!(
        p.try_call(add, None, &[Value::Int(1)]),
        Err(VmError::ArgumentCountMismatch { .. })
    ));
    assert_eq!(
        p.call(add, None, &[Value::Int(1), Value::Long(2)]),
        Outcome::Returned(Value::Long(3))
    );
}

/// `static int depth(int n)`: `n == 0 ? 0 : depth(n - 1) + 1`
///
/// ```text
/// 0:  if-eqz v1, +11
/// 2:  add-int/lit8 v0, v1, -1
/// 4:  invoke-static {v0}, depth
/// 7:  move-result v0
/// 8:  add-int/lit8 v0, v0, 1
/// 10: return v0
/// 11: return v1
/// ```
fn recursive_depth(p: &mut Program) -> MethodRef {
    // First method registered, so its index is 0
    let m = p.method("depth", "II", true, 2, |w| {
        w.emit_21(Opcode::IfEqz, 1, 11);
        w.emit_22b(Opcode::AddIntLit8, 0, 1, -1);
        w.emit_35c(Opcode::InvokeStatic, &[0], 0);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_22b(Opcode::AddIntLit8, 0, 0, 1);
        w.emit_11x(Opcode::Return, 0);
        w.emit_11x(Opcode::Return, 1);
    });
    assert_eq!(m, MethodRef(0));
    m
}

#[test]
fn test_recursion() {
    let mut p = Program::new();
    let m = recursive_depth(&mut p);
    assert_eq!(p.returned(m, &[Value::Int(100)]), Value::Int(100));
    assert_eq!(p.interp.depth(), 0);
}

#[test]
fn test_call_depth_limit() {
    let mut p = Program::with_options(InterpreterOptions::default().with_max_call_depth(4));
    let m = recursive_depth(&mut p);
    assert_eq!(p.returned(m, &[Value::Int(3)]), Value::Int(3));
    assert_eq!(
        p.try_call(m, None, &[Value::Int(4)]),
        Err(VmError::StackOverflow { depth: 4 })
    );
    // The failed chain released its registers
    assert_eq!(p.interp.register_stats().top, 0);
    assert_eq!(p.interp.depth(), 0);
}

#[test]
fn test_prefer_host_calls_routes_through_host() {
    let options = InterpreterOptions::default().with_prefer_host_calls(true);
    let mut p = Program::with_options(options);
    let m = recursive_depth(&mut p);
    assert_eq!(p.returned(m, &[Value::Int(10)]), Value::Int(10));
    assert_eq!(p.interp.depth(), 0);
}

#[test]
fn test_call_depth_limit_spans_host_calls() {
    // Each level re-enters through the host; the limit still counts them all
    let options = InterpreterOptions::default()
        .with_max_call_depth(4)
        .with_prefer_host_calls(true);
    let mut p = Program::with_options(options);
    let m = recursive_depth(&mut p);
    assert_eq!(p.returned(m, &[Value::Int(3)]), Value::Int(3));
    assert_eq!(
        p.try_call(m, None, &[Value::Int(4)]),
        Err(VmError::StackOverflow { depth: 4 })
    );
    assert_eq!(p.interp.depth(), 0);
}

/// `static int run()` calling `callee` inside a catch-all that returns 1
///
/// ```text
/// 0: invoke-static {}, callee
/// 3: const/4 v0, 0
/// 4: return v0
/// 5: const/4 v0, 1    ; catch-all for [0, 3)
/// 6: return v0
/// ```
fn guarded_call(p: &mut Program, callee: MethodRef) -> MethodRef {
    p.method_with_tries("run", "I", true, 1, |w, t| {
        w.emit_35c(Opcode::InvokeStatic, &[], callee.0 as u16);
        load_int(w, 0, 0);
        w.emit_11x(Opcode::Return, 0);
        load_int(w, 0, 1);
        w.emit_11x(Opcode::Return, 0);
        t.add(0, 3, &[], Some(5));
    })
}

/// `static void broken()` whose first unit is the unused opcode 0x3e
fn broken_method(p: &mut Program) -> MethodRef {
    p.method("broken", "V", true, 1, |w| {
        let pos = w.emit_10x(Opcode::Nop);
        w.patch_unit(pos, 0x3e);
    })
}

#[test]
fn test_fault_in_nested_callee_is_not_catchable() {
    let mut p = Program::new();
    let broken = broken_method(&mut p);
    let run = guarded_call(&mut p, broken);
    assert_eq!(p.try_call(run, None, &[]), Err(VmError::InvalidOpcode(0x3e)));
    assert_eq!(p.interp.depth(), 0);
    assert_eq!(p.interp.register_stats().top, 0);
}

#[test]
fn test_fault_in_host_called_callee_is_not_catchable() {
    let mut p = Program::with_options(InterpreterOptions::default().with_prefer_host_calls(true));
    let broken = broken_method(&mut p);
    let run = guarded_call(&mut p, broken);
    assert_eq!(p.try_call(run, None, &[]), Err(VmError::InvalidOpcode(0x3e)));
    assert_eq!(p.interp.depth(), 0);
}

// ============================================================================
// Host calls
// ============================================================================

#[test]
fn test_native_static_call() {
    let mut p = Program::new();
    let mul = p
        .rt
        .add_native("app/Math", "mul", "III", true, |_, call| {
            Ok(Value::Int(call.args[0].as_int() * call.args[1].as_int()))
        })
        .unwrap();
    let m = p.method("run", "I", true, 2, |w| {
        load_int(w, 0, 6);
        load_int(w, 1, 7);
        w.emit_35c(Opcode::InvokeStatic, &[0, 1], mul.0 as u16);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Int(42));
}

#[test]
fn test_native_receives_typed_arguments() {
    // Arguments arrive typed by the shorty: Z B C S D
    let mut p = Program::new();
    let check = p
        .rt
        .add_native("app/Check", "check", "ZZBCSD", true, |_, call| {
            let ok = call.args
                == [
                    Value::Boolean(true),
                    Value::Byte(-2),
                    Value::Char(0xffff),
                    Value::Short(-3),
                    Value::Double(0.5),
                ];
            Ok(Value::Boolean(ok))
        })
        .unwrap();
    let m = p.method("run", "Z", true, 6, |w| {
        load_int(w, 0, 1);
        load_int(w, 1, -2);
        w.emit_21(Opcode::Const16, 2, 0xffff);
        load_int(w, 3, -3);
        load_double(w, 4, 0.5);
        w.emit_3rc(Opcode::InvokeStaticRange, 0, 6, check.0 as u16);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Boolean(true));
}

#[test]
fn test_native_returns_object() {
    let mut p = Program::new();
    let greet = p
        .rt
        .add_native("app/Text", "greet", "L", true, |rt, _| {
            Ok(Value::Object(rt.new_string("hello")))
        })
        .unwrap();
    let m = p.method("run", "L", true, 1, |w| {
        w.emit_35c(Opcode::InvokeStatic, &[], greet.0 as u16);
        w.emit_11x(Opcode::MoveResultObject, 0);
        w.emit_11x(Opcode::ReturnObject, 0);
    });
    let s = p.returned(m, &[]).as_object();
    assert_eq!(p.rt.string_value(s), Some("hello"));
}

#[test]
fn test_native_exception_is_catchable() {
    // 0: invoke-static {}, fail; 3: const/4 v0, 0; 4: return v0; 5: move-exception v0; 6: const/4 v0, 1; 7: return v0
    let mut p = Program::new();
    let fail = p
        .rt
        .add_native("app/Io", "fail", "V", true, |rt, _| {
            Err(rt.throw_new("java/io/IOException", Some("disk")))
        })
        .unwrap();
    let m = p.method_with_tries("run", "I", true, 1, |w, t| {
        w.emit_35c(Opcode::InvokeStatic, &[], fail.0 as u16);
        load_int(w, 0, 0);
        w.emit_11x(Opcode::Return, 0);
        w.emit_11x(Opcode::MoveException, 0);
        load_int(w, 0, 1);
        w.emit_11x(Opcode::Return, 0);
        t.add(0, 3, &[], Some(5));
    });
    assert_eq!(p.returned(m, &[]), Value::Int(1));
}

#[test]
fn test_move_result_after_void_call_reads_void() {
    let mut p = Program::new();
    let noop = p
        .rt
        .add_native("app/Util", "noop", "V", true, |_, _| Ok(Value::Void))
        .unwrap();
    let m = p.method("run", "I", true, 1, |w| {
        load_int(w, 0, 9);
        w.emit_35c(Opcode::InvokeStatic, &[], noop.0 as u16);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    assert_eq!(p.returned(m, &[]), Value::Int(0));
}
