//! Host handles, type codes and typed values
//!
//! The interpreter never owns host objects. Registers hold [`ObjRef`]
//! handles issued by the host runtime; `0` is the null reference.
//!
//! [`Value`] is the typed form used at the boundary with the host (call
//! arguments, return values, field reads). [`RegValue`] is the untyped form
//! read straight out of registers, where the instruction tells only the
//! width and the host decides the final type (e.g. `aput` serves both
//! `int[]` and `float[]`).

use crate::vm::{VmError, VmResult};

/// Opaque reference to a host object (`0` is null)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjRef(u32);

impl ObjRef {
    /// The null reference
    pub const NULL: ObjRef = ObjRef(0);

    /// Wrap a raw handle
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ObjRef(raw)
    }

    /// Raw handle value as stored in a register
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check for null
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `Some(self)` unless null
    #[inline]
    pub fn non_null(self) -> Option<ObjRef> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}

/// Reference to a class object
///
/// Classes are objects too (`const-class` stores one in a register), so a
/// `ClassRef` is a typed wrapper around the class object's handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassRef(ObjRef);

impl ClassRef {
    /// Wrap a class object handle
    #[inline]
    pub const fn new(obj: ObjRef) -> Self {
        ClassRef(obj)
    }

    /// The class object itself
    #[inline]
    pub const fn as_object(self) -> ObjRef {
        self.0
    }
}

/// Reference to a resolved method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef(pub u32);

// ============================================================================
// Type codes and shorty descriptors
// ============================================================================

/// Single-character type code used by shorty and field descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    /// `V`
    Void,
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `S`
    Short,
    /// `C`
    Char,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
    /// `L` (any reference, arrays included)
    Object,
}

impl TypeCode {
    /// Parse a shorty character
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'V' => TypeCode::Void,
            'Z' => TypeCode::Boolean,
            'B' => TypeCode::Byte,
            'S' => TypeCode::Short,
            'C' => TypeCode::Char,
            'I' => TypeCode::Int,
            'J' => TypeCode::Long,
            'F' => TypeCode::Float,
            'D' => TypeCode::Double,
            'L' | '[' => TypeCode::Object,
            _ => return None,
        })
    }

    /// Type code of a full type descriptor (`I`, `Ljava/lang/String;`, `[I`)
    pub fn from_descriptor(descriptor: &str) -> VmResult<Self> {
        descriptor
            .chars()
            .next()
            .and_then(TypeCode::from_char)
            .ok_or_else(|| VmError::InvalidDescriptor(descriptor.to_string()))
    }

    /// Shorty character
    pub fn to_char(self) -> char {
        match self {
            TypeCode::Void => 'V',
            TypeCode::Boolean => 'Z',
            TypeCode::Byte => 'B',
            TypeCode::Short => 'S',
            TypeCode::Char => 'C',
            TypeCode::Int => 'I',
            TypeCode::Long => 'J',
            TypeCode::Float => 'F',
            TypeCode::Double => 'D',
            TypeCode::Object => 'L',
        }
    }

    /// Long and double occupy two registers
    #[inline]
    pub fn is_wide(self) -> bool {
        matches!(self, TypeCode::Long | TypeCode::Double)
    }

    /// Number of register slots a value of this type occupies
    #[inline]
    pub fn slots(self) -> u16 {
        match self {
            TypeCode::Void => 0,
            TypeCode::Long | TypeCode::Double => 2,
            _ => 1,
        }
    }
}

/// Parsed shorty descriptor: return type followed by parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shorty {
    text: String,
    return_type: TypeCode,
    params: Vec<TypeCode>,
}

impl Shorty {
    /// Parse a shorty such as `"VIJ"` (void, takes int and long)
    pub fn parse(text: &str) -> VmResult<Self> {
        let mut chars = text.chars();
        let return_type = chars
            .next()
            .and_then(TypeCode::from_char)
            .ok_or_else(|| VmError::InvalidShorty(text.to_string()))?;
        let params = chars
            .map(|c| match TypeCode::from_char(c) {
                Some(TypeCode::Void) | None => Err(VmError::InvalidShorty(text.to_string())),
                Some(t) => Ok(t),
            })
            .collect::<VmResult<Vec<_>>>()?;
        Ok(Self {
            text: text.to_string(),
            return_type,
            params,
        })
    }

    /// Return type (first character)
    #[inline]
    pub fn return_type(&self) -> TypeCode {
        self.return_type
    }

    /// Parameter types (excluding the receiver)
    #[inline]
    pub fn params(&self) -> &[TypeCode] {
        &self.params
    }

    /// Register slots taken by the arguments, receiver included when
    /// `is_static` is false
    pub fn arg_slots(&self, is_static: bool) -> u16 {
        let receiver = if is_static { 0 } else { 1 };
        receiver + self.params.iter().map(|t| t.slots()).sum::<u16>()
    }

    /// The descriptor text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Shorty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// Values
// ============================================================================

/// A typed value crossing the interpreter/host boundary
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// No value (`V`)
    #[default]
    Void,
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `char`
    Char(u16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Reference (possibly null)
    Object(ObjRef),
}

impl Value {
    /// Null reference value
    pub const NULL: Value = Value::Object(ObjRef::NULL);

    /// Type code of this value
    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Void => TypeCode::Void,
            Value::Boolean(_) => TypeCode::Boolean,
            Value::Byte(_) => TypeCode::Byte,
            Value::Short(_) => TypeCode::Short,
            Value::Char(_) => TypeCode::Char,
            Value::Int(_) => TypeCode::Int,
            Value::Long(_) => TypeCode::Long,
            Value::Float(_) => TypeCode::Float,
            Value::Double(_) => TypeCode::Double,
            Value::Object(_) => TypeCode::Object,
        }
    }

    /// Contents of a single register holding this value
    ///
    /// Sub-word integers are sign- or zero-extended as the JVM does
    /// (`char` is unsigned); floats keep their bit pattern.
    pub fn narrow_bits(&self) -> u32 {
        match *self {
            Value::Void => 0,
            Value::Boolean(z) => z as u32,
            Value::Byte(b) => b as i32 as u32,
            Value::Short(s) => s as i32 as u32,
            Value::Char(c) => c as u32,
            Value::Int(i) => i as u32,
            Value::Long(j) => j as u32,
            Value::Float(f) => f.to_bits(),
            Value::Double(d) => d.to_bits() as u32,
            Value::Object(o) => o.raw(),
        }
    }

    /// Contents of a register pair holding this value
    pub fn wide_bits(&self) -> u64 {
        match *self {
            Value::Long(j) => j as u64,
            Value::Double(d) => d.to_bits(),
            other => other.narrow_bits() as i32 as i64 as u64,
        }
    }

    /// As `int` (narrow bits reinterpreted)
    #[inline]
    pub fn as_int(&self) -> i32 {
        self.narrow_bits() as i32
    }

    /// As `long`
    #[inline]
    pub fn as_long(&self) -> i64 {
        self.wide_bits() as i64
    }

    /// As `float`
    #[inline]
    pub fn as_float(&self) -> f32 {
        match *self {
            Value::Float(f) => f,
            other => f32::from_bits(other.narrow_bits()),
        }
    }

    /// As `double`
    #[inline]
    pub fn as_double(&self) -> f64 {
        match *self {
            Value::Double(d) => d,
            other => f64::from_bits(other.wide_bits()),
        }
    }

    /// As a reference (`NULL` for non-reference values)
    #[inline]
    pub fn as_object(&self) -> ObjRef {
        match *self {
            Value::Object(o) => o,
            _ => ObjRef::NULL,
        }
    }

    /// Reinterpret this value as type `ty`
    ///
    /// Used to normalize host results to the declared return type.
    pub fn coerce(self, ty: TypeCode) -> Value {
        match ty {
            TypeCode::Void => Value::Void,
            TypeCode::Object => Value::Object(ObjRef::from_raw(self.narrow_bits())),
            TypeCode::Long | TypeCode::Double => RegValue::Wide(self.wide_bits()).to_typed(ty),
            _ => RegValue::Narrow(self.narrow_bits()).to_typed(ty),
        }
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Object(obj)
    }
}

/// Untyped register contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegValue {
    /// One register
    Narrow(u32),
    /// A register pair
    Wide(u64),
    /// One register holding a reference
    Ref(ObjRef),
}

impl RegValue {
    /// Interpret as a value of type `ty`
    ///
    /// Narrow integer types truncate (`Boolean` keeps only the low bit).
    pub fn to_typed(self, ty: TypeCode) -> Value {
        let narrow = match self {
            RegValue::Narrow(bits) => bits,
            RegValue::Wide(bits) => bits as u32,
            RegValue::Ref(obj) => obj.raw(),
        };
        let wide = match self {
            RegValue::Wide(bits) => bits,
            _ => narrow as u64,
        };
        match ty {
            TypeCode::Void => Value::Void,
            TypeCode::Boolean => Value::Boolean(narrow & 1 != 0),
            TypeCode::Byte => Value::Byte(narrow as i8),
            TypeCode::Short => Value::Short(narrow as i16),
            TypeCode::Char => Value::Char(narrow as u16),
            TypeCode::Int => Value::Int(narrow as i32),
            TypeCode::Float => Value::Float(f32::from_bits(narrow)),
            TypeCode::Long => Value::Long(wide as i64),
            TypeCode::Double => Value::Double(f64::from_bits(wide)),
            TypeCode::Object => Value::Object(ObjRef::from_raw(narrow)),
        }
    }
}
