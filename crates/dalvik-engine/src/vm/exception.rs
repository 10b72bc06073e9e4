//! VM-catchable exception kinds raised by the interpreter itself
//!
//! Handlers never construct exception objects; they name a kind and a
//! message and let the host allocate the throwable via
//! [`HostObjects::throw_new`](crate::vm::HostObjects::throw_new).

/// Exceptions the interpreter raises on its own behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    /// Null dereference
    NullPointer,
    /// Array index outside `[0, length)`
    ArrayIndexOutOfBounds,
    /// `new-array` with a negative length
    NegativeArraySize,
    /// Failed `check-cast`
    ClassCast,
    /// Integer division or remainder by zero
    Arithmetic,
    /// Malformed request (`filled-new-array` of a wide element type)
    Runtime,
    /// Unsupported request (`filled-new-array` of a non-int primitive)
    Internal,
}

impl ExceptionKind {
    /// Binary class name of the throwable
    pub fn class_name(self) -> &'static str {
        match self {
            ExceptionKind::NullPointer => "java/lang/NullPointerException",
            ExceptionKind::ArrayIndexOutOfBounds => "java/lang/ArrayIndexOutOfBoundsException",
            ExceptionKind::NegativeArraySize => "java/lang/NegativeArraySizeException",
            ExceptionKind::ClassCast => "java/lang/ClassCastException",
            ExceptionKind::Arithmetic => "java/lang/ArithmeticException",
            ExceptionKind::Runtime => "java/lang/RuntimeException",
            ExceptionKind::Internal => "java/lang/InternalError",
        }
    }

    /// `length=<len>; index=<idx>`
    pub fn bounds_message(length: i32, index: i32) -> String {
        format!("length={}; index={}", length, index)
    }

    /// `<actual> cannot be cast to <desired>`
    pub fn cast_message(actual: &str, desired: &str) -> String {
        format!("{} cannot be cast to {}", actual, desired)
    }

    /// Message used for division and remainder by zero
    pub const DIVIDE_BY_ZERO: &'static str = "divide by zero";

    /// Message used for `filled-new-array` of a wide element type
    pub const BAD_FILLED_ARRAY: &'static str = "bad filled array req";

    /// `unsupported filled array type <c>`
    pub fn unsupported_filled_array(element: char) -> String {
        format!("unsupported filled array type {}", element)
    }
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}
