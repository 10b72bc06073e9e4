//! Throw, catch, unwind and monitor tests

use super::harness::*;

const RUNTIME_EXCEPTION: &str = "Ljava/lang/RuntimeException;";
const ARITHMETIC_EXCEPTION: &str = "Ljava/lang/ArithmeticException;";
const EXCEPTION: &str = "Ljava/lang/Exception;";

/// `static Object f()` that throws a new instance of `thrown` at pc 2 and
/// returns the caught exception at the chosen handler
///
/// ```text
/// 0: new-instance v0, thrown
/// 2: throw v0
/// 3: const/4 v1, 0        ; not reached
/// 4: return-object v1
/// 5: move-exception v1    ; handler A
/// 6: return-object v1
/// 7: const/4 v1, 0        ; handler B: null
/// 8: return-object v1
/// ```
fn throw_and_catch(
    p: &mut Program,
    thrown: &str,
    tries: impl FnOnce(&mut TryTableBuilder),
) -> Outcome {
    let thrown = p.rt.add_type(thrown);
    let m = p.method_with_tries("f", "L", true, 2, |w, t| {
        w.emit_21(Opcode::NewInstance, 0, thrown as u16);
        w.emit_11x(Opcode::Throw, 0);
        load_int(w, 1, 0);
        w.emit_11x(Opcode::ReturnObject, 1);
        w.emit_11x(Opcode::MoveException, 1);
        w.emit_11x(Opcode::ReturnObject, 1);
        load_int(w, 1, 0);
        w.emit_11x(Opcode::ReturnObject, 1);
        tries(t);
    });
    p.call(m, None, &[])
}

fn returned_class(p: &Program, outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::Returned(Value::Object(obj)) if !obj.is_null() => Some(p.rt.class_name_of(obj)),
        Outcome::Returned(_) => None,
        Outcome::Threw(e) => panic!("escaped: {}", p.rt.class_name_of(e)),
    }
}

// ============================================================================
// Catch clause selection
// ============================================================================

#[test]
fn test_typed_clause_catches() {
    let mut p = Program::new();
    let rte = p.rt.add_type(RUNTIME_EXCEPTION);
    let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
        t.add(0, 3, &[(rte, 5)], None);
    });
    assert_eq!(
        returned_class(&p, outcome).as_deref(),
        Some("java/lang/RuntimeException")
    );
}

#[test]
fn test_superclass_clause_catches() {
    let mut p = Program::new();
    let exception = p.rt.add_type(EXCEPTION);
    let outcome = throw_and_catch(&mut p, ARITHMETIC_EXCEPTION, |t| {
        t.add(0, 3, &[(exception, 5)], None);
    });
    assert_eq!(
        returned_class(&p, outcome).as_deref(),
        Some("java/lang/ArithmeticException")
    );
}

#[test]
fn test_first_matching_clause_wins() {
    // Both clauses match; table order decides
    let mut p = Program::new();
    let exception = p.rt.add_type(EXCEPTION);
    let rte = p.rt.add_type(RUNTIME_EXCEPTION);
    let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
        t.add(0, 3, &[(exception, 7), (rte, 5)], None);
    });
    assert_eq!(returned_class(&p, outcome), None);
}

#[test]
fn test_catch_all_when_no_clause_matches() {
    let mut p = Program::new();
    let arith = p.rt.add_type(ARITHMETIC_EXCEPTION);
    let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
        t.add(0, 3, &[(arith, 7)], Some(5));
    });
    assert_eq!(
        returned_class(&p, outcome).as_deref(),
        Some("java/lang/RuntimeException")
    );
}

#[test]
fn test_unresolvable_catch_type_is_skipped() {
    let mut p = Program::new();
    let missing = p.rt.add_type("Lapp/Missing;");
    let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
        t.add(0, 3, &[(missing, 7)], Some(5));
    });
    assert_eq!(
        returned_class(&p, outcome).as_deref(),
        Some("java/lang/RuntimeException")
    );
}

#[test]
fn test_uncaught_exception_escapes() {
    let mut p = Program::new();
    let arith = p.rt.add_type(ARITHMETIC_EXCEPTION);
    let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
        t.add(0, 3, &[(arith, 5)], None);
    });
    let exception = outcome.exception().unwrap();
    assert_eq!(p.rt.class_name_of(exception), "java/lang/RuntimeException");
}

#[test]
fn test_range_not_covering_throw_site() {
    // The throw is at pc 2; [0, 2) does not cover it
    let mut p = Program::new();
    let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
        t.add(0, 2, &[], Some(5));
    });
    assert!(outcome.exception().is_some());
}

#[test]
fn test_later_starting_range_wins() {
    // [0, 9) -> null handler, [2, 3) -> handler A, in both table orders
    for inner_first in [false, true] {
        let mut p = Program::new();
        let outcome = throw_and_catch(&mut p, RUNTIME_EXCEPTION, |t| {
            if inner_first {
                t.add(2, 1, &[], Some(5));
                t.add(0, 9, &[], Some(7));
            } else {
                t.add(0, 9, &[], Some(7));
                t.add(2, 1, &[], Some(5));
            }
        });
        assert!(returned_class(&p, outcome).is_some(), "inner_first={}", inner_first);
    }
}

// ============================================================================
// Interpreter-raised exceptions
// ============================================================================

#[test]
fn test_bounds_exception_is_catchable() {
    // 0: const/4 v0, 2
    // 1: new-array v1, v0, [I
    // 3: const/4 v0, 5
    // 4: aget v2, v1, v0
    // 6: const/4 v2, 0
    // 7: return-object v2
    // 8: move-exception v2
    // 9: return-object v2
    let mut p = Program::new();
    let int_array = p.rt.add_type("[I");
    let m = p.method_with_tries("f", "L", true, 3, |w, t| {
        load_int(w, 0, 2);
        w.emit_22(Opcode::NewArray, 1, 0, int_array as u16);
        load_int(w, 0, 5);
        w.emit_23x(Opcode::Aget, 2, 1, 0);
        load_int(w, 2, 0);
        w.emit_11x(Opcode::ReturnObject, 2);
        w.emit_11x(Opcode::MoveException, 2);
        w.emit_11x(Opcode::ReturnObject, 2);
        t.add(0, 6, &[], Some(8));
    });
    let exception = p.returned(m, &[]).as_object();
    assert_eq!(
        p.rt.class_name_of(exception),
        "java/lang/ArrayIndexOutOfBoundsException"
    );
    assert_eq!(
        p.rt.exception_message(exception).as_deref(),
        Some("length=2; index=5")
    );
}

#[test]
fn test_throw_null_raises_npe() {
    let (class, _) = expect_throw(1, |w| {
        load_int(w, 0, 0);
        w.emit_11x(Opcode::Throw, 0);
    });
    assert_eq!(class, "java/lang/NullPointerException");
}

#[test]
fn test_move_exception_without_exception_is_internal_fault() {
    let mut p = Program::new();
    let m = p.method("f", "V", true, 1, |w| {
        w.emit_11x(Opcode::MoveException, 0);
        w.emit_10x(Opcode::ReturnVoid);
    });
    assert_eq!(p.try_call(m, None, &[]), Err(VmError::MissingException));
}

// ============================================================================
// Propagation across activations
// ============================================================================

#[test]
fn test_callee_exception_caught_by_caller() {
    // callee: throw new RuntimeException
    // caller: try { callee(); return null; } catch (...) { return e; }
    let mut p = Program::new();
    let rte = p.rt.add_type(RUNTIME_EXCEPTION);
    let callee = p.method("callee", "V", true, 1, |w| {
        w.emit_21(Opcode::NewInstance, 0, rte as u16);
        w.emit_11x(Opcode::Throw, 0);
    });
    let caller = p.method_with_tries("caller", "L", true, 1, |w, t| {
        w.emit_35c(Opcode::InvokeStatic, &[], callee.0 as u16);
        load_int(w, 0, 0);
        w.emit_11x(Opcode::ReturnObject, 0);
        w.emit_11x(Opcode::MoveException, 0);
        w.emit_11x(Opcode::ReturnObject, 0);
        t.add(0, 3, &[(rte, 5)], None);
    });
    let exception = p.returned(caller, &[]).as_object();
    assert_eq!(p.rt.class_name_of(exception), "java/lang/RuntimeException");
    assert_eq!(p.interp.depth(), 0);
}

#[test]
fn test_exception_escapes_two_levels() {
    let mut p = Program::new();
    let inner = p.method("inner", "I", true, 2, |w| {
        load_int(w, 0, 1);
        load_int(w, 1, 0);
        w.emit_23x(Opcode::DivInt, 0, 0, 1);
        w.emit_11x(Opcode::Return, 0);
    });
    let outer = p.method("outer", "I", true, 1, |w| {
        w.emit_35c(Opcode::InvokeStatic, &[], inner.0 as u16);
        w.emit_11x(Opcode::MoveResult, 0);
        w.emit_11x(Opcode::Return, 0);
    });
    let (class, message) = p.threw(outer, &[]);
    assert_eq!(class, "java/lang/ArithmeticException");
    assert_eq!(message.as_deref(), Some("divide by zero"));
    assert_eq!(p.interp.register_stats().top, 0);
}

// ============================================================================
// Monitors
// ============================================================================

#[test]
fn test_monitor_enter_exit_balanced() {
    let mut p = Program::new();
    let s = p.rt.add_string("lock");
    let m = p.method("f", "L", true, 1, |w| {
        w.emit_21(Opcode::ConstString, 0, s as u16);
        w.emit_11x(Opcode::MonitorEnter, 0);
        w.emit_11x(Opcode::MonitorEnter, 0);
        w.emit_11x(Opcode::MonitorExit, 0);
        w.emit_11x(Opcode::ReturnObject, 0);
    });
    let lock = p.returned(m, &[]).as_object();
    assert_eq!(p.rt.monitor_count(lock), 1);
}

/// ```text
/// 0: const-string v0, "lock"
/// 2: monitor-exit v0      ; not held
/// 3: const/4 v1, 0
/// 4: return v1
/// 5: move-exception v1
/// 6: const/4 v1, 1
/// 7: return v1
/// ```
fn unheld_monitor_exit(try_start: u32) -> Outcome {
    let mut p = Program::new();
    let s = p.rt.add_string("lock");
    let m = p.method_with_tries("f", "I", true, 2, |w, t| {
        w.emit_21(Opcode::ConstString, 0, s as u16);
        w.emit_11x(Opcode::MonitorExit, 0);
        load_int(w, 1, 0);
        w.emit_11x(Opcode::Return, 1);
        w.emit_11x(Opcode::MoveException, 1);
        load_int(w, 1, 1);
        w.emit_11x(Opcode::Return, 1);
        t.add(try_start, 1, &[], Some(5));
    });
    let outcome = p.call(m, None, &[]);
    if let Outcome::Threw(e) = outcome {
        assert_eq!(p.rt.class_name_of(e), classes::ILLEGAL_MONITOR_STATE);
    }
    outcome
}

#[test]
fn test_monitor_exit_failure_is_raised_past_the_instruction() {
    // A range covering only the monitor-exit does not see its exception
    assert!(unheld_monitor_exit(2).exception().is_some());
    // A range covering the next instruction does
    assert_eq!(unheld_monitor_exit(3), Outcome::Returned(Value::Int(1)));
}

#[test]
fn test_monitor_exit_null_is_raised_past_the_instruction() {
    // 0: const/4 v0, 0; 1: monitor-exit v0; 2: return-void; 3: move-exception v0; 4: return-void
    for (try_start, caught) in [(1, false), (2, true)] {
        let mut p = Program::new();
        let m = p.method_with_tries("f", "V", true, 1, |w, t| {
            load_int(w, 0, 0);
            w.emit_11x(Opcode::MonitorExit, 0);
            w.emit_10x(Opcode::ReturnVoid);
            w.emit_11x(Opcode::MoveException, 0);
            w.emit_10x(Opcode::ReturnVoid);
            t.add(try_start, 1, &[], Some(3));
        });
        match p.call(m, None, &[]) {
            Outcome::Returned(_) => assert!(caught),
            Outcome::Threw(e) => {
                assert!(!caught);
                assert_eq!(p.rt.class_name_of(e), "java/lang/NullPointerException");
            }
        }
    }
}

#[test]
fn test_monitor_enter_null_is_raised_at_the_instruction() {
    // 0: const/4 v0, 0; 1: monitor-enter v0; 2: return-void; 3: move-exception v0; 4: return-void
    let mut p = Program::new();
    let m = p.method_with_tries("f", "V", true, 1, |w, t| {
        load_int(w, 0, 0);
        w.emit_11x(Opcode::MonitorEnter, 0);
        w.emit_10x(Opcode::ReturnVoid);
        w.emit_11x(Opcode::MoveException, 0);
        w.emit_10x(Opcode::ReturnVoid);
        t.add(1, 1, &[], Some(3));
    });
    assert_eq!(p.call(m, None, &[]), Outcome::Returned(Value::Void));
}
