//! Execution result types for the dispatch loop

use crate::vm::interpreter::invoke::InvokeRequest;
use crate::vm::value::{ObjRef, Value};

/// Result of executing a single instruction
///
/// Used by the dispatch loop to determine what happens next.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Continue at the (already updated) pc
    Continue,

    /// A handler recorded a pending exception; the pc still points at the
    /// faulting instruction
    Throw,

    /// The activation finished with a value
    Return(Value),

    /// Arguments are decoded; the loop performs the call and advances
    /// past the invoke once it completes
    Invoke(InvokeRequest),
}

/// How an activation (or the whole call chain) ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Normal return, typed by the method's shorty
    Returned(Value),

    /// An exception escaped the activation
    Threw(ObjRef),
}

impl Outcome {
    /// The returned value, if the call completed normally
    pub fn value(self) -> Option<Value> {
        match self {
            Outcome::Returned(v) => Some(v),
            Outcome::Threw(_) => None,
        }
    }

    /// The escaped exception, if any
    pub fn exception(self) -> Option<ObjRef> {
        match self {
            Outcome::Returned(_) => None,
            Outcome::Threw(e) => Some(e),
        }
    }
}
