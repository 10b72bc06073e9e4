//! Array allocation, element access and bulk fill tests

use super::harness::*;

/// `static Object make(int n)`: `new-array v0, v1, descriptor`
fn make_array(p: &mut Program, descriptor: &str) -> MethodRef {
    let ty = p.rt.add_type(descriptor);
    p.method("make", "LI", true, 2, |w| {
        w.emit_22(Opcode::NewArray, 0, 1, ty as u16);
        w.emit_11x(Opcode::ReturnObject, 0);
    })
}

// ============================================================================
// new-array / array-length
// ============================================================================

#[test]
fn test_new_array_is_zeroed() {
    let mut p = Program::new();
    let make = make_array(&mut p, "[J");
    let array = p.returned(make, &[Value::Int(3)]).as_object();
    assert_eq!(p.rt.class_name_of(array), "[J");
    assert_eq!(
        p.rt.array_elements(array),
        Some(&[Value::Long(0), Value::Long(0), Value::Long(0)][..])
    );
}

#[test]
fn test_new_array_negative_length_allocates_nothing() {
    let mut p = Program::new();
    let make = make_array(&mut p, "[I");
    let before = p.rt.heap_len();
    let outcome = p.call(make, None, &[Value::Int(-1)]);
    let exception = outcome.exception().unwrap();
    assert_eq!(p.rt.class_name_of(exception), classes::NEGATIVE_ARRAY_SIZE);
    assert_eq!(p.rt.exception_message(exception).as_deref(), Some("-1"));
    // Only the exception and its message string were allocated
    assert_eq!(p.rt.heap_len(), before + 2);
    assert!((before..p.rt.heap_len()).all(|i| {
        let obj = ObjRef::from_raw(i as u32 + 1);
        !p.rt.class_name_of(obj).starts_with('[')
    }));
}

#[test]
fn test_new_array_zero_length() {
    let mut p = Program::new();
    let make = make_array(&mut p, "[Ljava/lang/String;");
    let array = p.returned(make, &[Value::Int(0)]).as_object();
    assert_eq!(p.rt.array_elements(array), Some(&[][..]));
}

#[test]
fn test_array_length() {
    let mut p = Program::new();
    let m = p.method("len", "IL", true, 2, |w| {
        w.emit_12x(Opcode::ArrayLength, 0, 1);
        w.emit_11x(Opcode::Return, 0);
    });
    let array = p.rt.new_array("[B", &[Value::Byte(1); 5]).unwrap();
    assert_eq!(p.returned(m, &[Value::Object(array)]), Value::Int(5));
    let (class, _) = p.threw(m, &[Value::NULL]);
    assert_eq!(class, "java/lang/NullPointerException");
}

// ============================================================================
// aget / aput
// ============================================================================

#[test]
fn test_aput_aget_int() {
    // a = new int[4]; a[2] = 9; return a[2] + a.length
    let mut p = Program::new();
    let ty = p.rt.add_type("[I");
    let m = p.method("run", "I", true, 4, |w| {
        load_int(w, 0, 4);
        w.emit_22(Opcode::NewArray, 1, 0, ty as u16);
        load_int(w, 2, 2);
        load_int(w, 3, 9);
        w.emit_23x(Opcode::Aput, 3, 1, 2);
        w.emit_23x(Opcode::Aget, 3, 1, 2);
        w.emit_12x(Opcode::ArrayLength, 0, 1);
        w.emit_12x(Opcode::AddInt2Addr, 3, 0);
        w.emit_11x(Opcode::Return, 3);
    });
    assert_eq!(p.returned(m, &[]), Value::Int(13));
}

#[test]
fn test_aget_sub_word_extension() {
    // aget-byte sign-extends, aget-char zero-extends
    let mut p = Program::new();
    let m = p.method("get", "ILL", true, 4, |w| {
        load_int(w, 1, 0);
        w.emit_23x(Opcode::AgetByte, 0, 2, 1);
        w.emit_23x(Opcode::AgetChar, 1, 3, 1);
        w.emit_23x(Opcode::AddInt, 0, 0, 1);
        w.emit_11x(Opcode::Return, 0);
    });
    let bytes = p.rt.new_array("[B", &[Value::Byte(-1)]).unwrap();
    let chars = p.rt.new_array("[C", &[Value::Char(0xffff)]).unwrap();
    assert_eq!(
        p.returned(m, &[Value::Object(bytes), Value::Object(chars)]),
        Value::Int(0xffff - 1)
    );
}

#[test]
fn test_aput_aget_wide() {
    let mut p = Program::new();
    // a[1] = a[0]; a[0] = bits(7); return a[0]
    let m = p.method("swap", "DL", true, 7, |w| {
        load_int(w, 0, 0);
        load_int(w, 1, 1);
        w.emit_23x(Opcode::AgetWide, 2, 6, 0);
        load_long(w, 4, 7);
        w.emit_23x(Opcode::AputWide, 4, 6, 0);
        w.emit_23x(Opcode::AputWide, 2, 6, 1);
        w.emit_23x(Opcode::AgetWide, 2, 6, 0);
        w.emit_11x(Opcode::ReturnWide, 2);
    });
    let array = p
        .rt
        .new_array("[D", &[Value::Double(1.5), Value::Double(0.0)])
        .unwrap();
    assert_eq!(p.returned(m, &[Value::Object(array)]), Value::Double(f64::from_bits(7)));
    assert_eq!(
        p.rt.array_elements(array),
        Some(&[Value::Double(f64::from_bits(7)), Value::Double(1.5)][..])
    );
}

#[test]
fn test_aget_out_of_bounds() {
    let mut p = Program::new();
    let m = p.method("get", "IL", true, 3, |w| {
        load_int(w, 0, -1);
        w.emit_23x(Opcode::Aget, 1, 2, 0);
        w.emit_11x(Opcode::Return, 1);
    });
    let array = p.rt.new_array("[I", &[Value::Int(0); 3]).unwrap();
    let (class, message) = p.threw(m, &[Value::Object(array)]);
    assert_eq!(class, "java/lang/ArrayIndexOutOfBoundsException");
    assert_eq!(message.as_deref(), Some("length=3; index=-1"));
}

#[test]
fn test_aput_on_null_raises_npe() {
    let (class, _) = expect_throw(3, |w| {
        load_int(w, 0, 0);
        load_int(w, 1, 0);
        w.emit_23x(Opcode::AputBoolean, 1, 0, 1);
        w.emit_10x(Opcode::ReturnVoid);
    });
    assert_eq!(class, "java/lang/NullPointerException");
}

#[test]
fn test_aput_object_store_check() {
    let mut p = Program::new();
    let m = p.method("store", "VLL", true, 3, |w| {
        load_int(w, 0, 0);
        w.emit_23x(Opcode::AputObject, 2, 1, 0);
        w.emit_10x(Opcode::ReturnVoid);
    });
    let strings = p.rt.new_array("[Ljava/lang/String;", &[Value::NULL]).unwrap();
    let s = p.rt.new_string("ok");
    p.returned(m, &[Value::Object(strings), Value::Object(s)]);
    assert_eq!(p.rt.array_elements(strings), Some(&[Value::Object(s)][..]));

    let obj = p.instance("app/Other");
    let (class, _) = p.threw(m, &[Value::Object(strings), Value::Object(obj)]);
    assert_eq!(class, classes::ARRAY_STORE);
}

// ============================================================================
// filled-new-array
// ============================================================================

#[test]
fn test_filled_new_array_int() {
    let mut p = Program::new();
    let ty = p.rt.add_type("[I");
    let m = p.method("run", "L", true, 3, |w| {
        load_int(w, 0, 10);
        load_int(w, 1, 20);
        load_int(w, 2, 30);
        w.emit_35c(Opcode::FilledNewArray, &[2, 0, 1], ty as u16);
        w.emit_11x(Opcode::MoveResultObject, 0);
        w.emit_11x(Opcode::ReturnObject, 0);
    });
    let array = p.returned(m, &[]).as_object();
    assert_eq!(
        p.rt.array_elements(array),
        Some(&[Value::Int(30), Value::Int(10), Value::Int(20)][..])
    );
}

#[test]
fn test_filled_new_array_range_of_references() {
    let mut p = Program::new();
    let ty = p.rt.add_type("[Ljava/lang/String;");
    let a = p.rt.add_string("a");
    let b = p.rt.add_string("b");
    let m = p.method("run", "L", true, 3, |w| {
        w.emit_21(Opcode::ConstString, 1, a as u16);
        w.emit_21(Opcode::ConstString, 2, b as u16);
        w.emit_3rc(Opcode::FilledNewArrayRange, 1, 2, ty as u16);
        w.emit_11x(Opcode::MoveResultObject, 0);
        w.emit_11x(Opcode::ReturnObject, 0);
    });
    let array = p.returned(m, &[]).as_object();
    let elements: Vec<_> = p
        .rt
        .array_elements(array)
        .unwrap()
        .iter()
        .map(|v| p.rt.string_value(v.as_object()).unwrap().to_string())
        .collect();
    assert_eq!(elements, ["a", "b"]);
}

fn filled_new_array_of(descriptor: &str) -> (String, Option<String>) {
    let mut p = Program::new();
    let ty = p.rt.add_type(descriptor);
    let m = p.method("run", "V", true, 2, |w| {
        w.emit_35c(Opcode::FilledNewArray, &[0, 1], ty as u16);
        w.emit_10x(Opcode::ReturnVoid);
    });
    p.threw(m, &[])
}

#[test]
fn test_filled_new_array_rejects_wide_elements() {
    for descriptor in ["[J", "[D"] {
        let (class, message) = filled_new_array_of(descriptor);
        assert_eq!(class, "java/lang/RuntimeException");
        assert_eq!(message.as_deref(), Some("bad filled array req"));
    }
}

#[test]
fn test_filled_new_array_rejects_sub_word_elements() {
    let (class, message) = filled_new_array_of("[Z");
    assert_eq!(class, classes::INTERNAL_ERROR);
    assert_eq!(message.as_deref(), Some("unsupported filled array type Z"));
}

#[test]
fn test_filled_new_array_unknown_type_throws() {
    let mut p = Program::new();
    let m = p.method("run", "V", true, 1, |w| {
        w.emit_35c(Opcode::FilledNewArray, &[0], 999);
        w.emit_10x(Opcode::ReturnVoid);
    });
    let (class, message) = p.threw(m, &[]);
    assert_eq!(class, classes::NO_CLASS_DEF);
    assert_eq!(message.as_deref(), Some("type@999"));
}

#[test]
fn test_filled_new_array_unknown_type_is_catchable() {
    // 0: filled-new-array {}, type@999; 3: const/4 v0, 0; 4: return v0
    // 5: const/4 v0, 1 (catch-all for [0, 3)); 6: return v0
    let mut p = Program::new();
    let m = p.method_with_tries("run", "I", true, 1, |w, t| {
        w.emit_35c(Opcode::FilledNewArray, &[], 999);
        load_int(w, 0, 0);
        w.emit_11x(Opcode::Return, 0);
        load_int(w, 0, 1);
        w.emit_11x(Opcode::Return, 0);
        t.add(0, 3, &[], Some(5));
    });
    assert_eq!(p.returned(m, &[]), Value::Int(1));
}

// ============================================================================
// fill-array-data
// ============================================================================

/// `static void fill(Object a)`: `fill-array-data v0, payload`
fn fill_method(p: &mut Program, width: u16, elements: &[u64]) -> MethodRef {
    p.method("fill", "VL", true, 1, |w| {
        let fill = w.emit_31(Opcode::FillArrayData, 0, 0);
        w.emit_10x(Opcode::ReturnVoid);
        let payload = w.emit_array_data_payload(width, elements);
        w.patch_31(fill, payload - fill);
    })
}

#[test]
fn test_fill_array_data_int() {
    let mut p = Program::new();
    let fill = fill_method(&mut p, 4, &[1, 0xffff_ffff, 3]);
    let array = p.rt.new_array("[I", &[Value::Int(0); 4]).unwrap();
    p.returned(fill, &[Value::Object(array)]);
    assert_eq!(
        p.rt.array_elements(array),
        Some(&[Value::Int(1), Value::Int(-1), Value::Int(3), Value::Int(0)][..])
    );
}

#[test]
fn test_fill_array_data_bytes_and_longs() {
    let mut p = Program::new();
    let fill_bytes = fill_method(&mut p, 1, &[0x7f, 0x80, 0x01]);
    let bytes = p.rt.new_array("[B", &[Value::Byte(0); 3]).unwrap();
    p.returned(fill_bytes, &[Value::Object(bytes)]);
    assert_eq!(
        p.rt.array_elements(bytes),
        Some(&[Value::Byte(127), Value::Byte(-128), Value::Byte(1)][..])
    );

    let fill_longs = fill_method(&mut p, 8, &[u64::MAX, 1 << 40]);
    let longs = p.rt.new_array("[J", &[Value::Long(0); 2]).unwrap();
    p.returned(fill_longs, &[Value::Object(longs)]);
    assert_eq!(
        p.rt.array_elements(longs),
        Some(&[Value::Long(-1), Value::Long(1 << 40)][..])
    );
}

#[test]
fn test_fill_array_data_too_many_elements() {
    let mut p = Program::new();
    let fill = fill_method(&mut p, 4, &[1, 2, 3]);
    let array = p.rt.new_array("[I", &[Value::Int(0); 2]).unwrap();
    let (class, message) = p.threw(fill, &[Value::Object(array)]);
    assert_eq!(class, "java/lang/ArrayIndexOutOfBoundsException");
    assert_eq!(message.as_deref(), Some("length=2; index=3"));
    // Nothing was written
    assert_eq!(p.rt.array_elements(array), Some(&[Value::Int(0); 2][..]));
}

#[test]
fn test_fill_array_data_null_raises_npe() {
    let mut p = Program::new();
    let fill = fill_method(&mut p, 4, &[1]);
    let (class, _) = p.threw(fill, &[Value::NULL]);
    assert_eq!(class, "java/lang/NullPointerException");
}

#[test]
fn test_fill_array_data_bad_width_is_internal_fault() {
    let mut p = Program::new();
    let fill = p.method("fill", "VL", true, 1, |w| {
        let fill = w.emit_31(Opcode::FillArrayData, 0, 0);
        w.emit_10x(Opcode::ReturnVoid);
        let payload = w.emit_array_data_payload(4, &[1, 2]);
        w.patch_31(fill, payload - fill);
        w.patch_unit(payload + 1, 16);
    });
    let array = p.rt.new_array("[I", &[Value::Int(0); 2]).unwrap();
    assert_eq!(
        p.try_call(fill, None, &[Value::Object(array)]),
        Err(VmError::BadElementWidth(16))
    );
}
