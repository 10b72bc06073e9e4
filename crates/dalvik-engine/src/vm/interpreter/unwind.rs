//! Exception unwinding within one activation
//!
//! The try table is scanned linearly. A range is a candidate when it covers
//! `pc` and starts after the best range found so far; inside a candidate
//! the first clause (table order) whose type the exception is an instance
//! of wins, and a catch-all counts as a match when no typed clause does.
//! A clause whose type cannot be resolved is skipped.

use tracing::{debug, warn};

use crate::bytecode::TryItem;
use crate::vm::interpreter::frame::Frame;
use crate::vm::runtime::Runtime;
use crate::vm::value::ObjRef;
use crate::vm::{VmError, VmResult};

/// Find the catch target for `exception` thrown at `frame.pc`
pub fn find_catch(rt: &mut dyn Runtime, frame: &Frame, exception: ObjRef) -> VmResult<Option<u32>> {
    let pc = frame.pc;
    let mut best: Option<&TryItem> = None;
    let mut target = None;

    for item in &frame.code.tries {
        if !item.covers(pc) {
            continue;
        }
        if let Some(current) = best {
            if current.start_addr >= item.start_addr {
                continue;
            }
        }

        let handler = frame.code.catch_handler(item)?;
        let mut matched = None;
        for clause in &handler.clauses {
            match rt.resolve_class(frame.method, clause.type_idx) {
                Ok(class) => {
                    if rt.is_instance_of(exception, class) {
                        matched = Some(clause.addr);
                        break;
                    }
                }
                Err(_) => {
                    warn!(
                        method = frame.method.0,
                        type_idx = clause.type_idx,
                        "unwind: catch type could not be resolved, skipping clause"
                    );
                }
            }
        }
        if let Some(addr) = matched.or(handler.catch_all) {
            best = Some(item);
            target = Some(addr);
        }
    }
    Ok(target)
}

/// Resolve `frame.pending` against the frame's try table
///
/// Returns `true` when execution resumes at a catch target: `pc` is moved
/// there and the exception is parked in `frame.caught` for
/// `move-exception`. Returns `false` when the exception must propagate;
/// it is left pending.
pub fn unwind(rt: &mut dyn Runtime, frame: &mut Frame) -> VmResult<bool> {
    let exception = frame
        .pending
        .ok_or(VmError::UnexpectedState("unwind without a pending exception"))?;

    match find_catch(rt, frame, exception)? {
        Some(addr) => {
            if addr >= frame.code_len() {
                return Err(VmError::PcOutOfRange {
                    pc: addr,
                    len: frame.code_len(),
                });
            }
            debug!(
                method = frame.method.0,
                from = frame.pc,
                to = addr,
                exception = %exception,
                "unwind: caught"
            );
            frame.pc = addr;
            frame.caught = frame.pending.take();
            Ok(true)
        }
        None => {
            debug!(
                method = frame.method.0,
                pc = frame.pc,
                exception = %exception,
                "unwind: propagating to caller"
            );
            Ok(false)
        }
    }
}
