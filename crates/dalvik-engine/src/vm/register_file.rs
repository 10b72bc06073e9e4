//! Register file for the Dalvik interpreter
//!
//! Each activation owns a window of registers in one contiguous array of
//! untagged 32-bit slots. The instruction stream, not the slot, decides how
//! a register is read: as `int`, `float`, a reference handle, or (with its
//! neighbour) as a 64-bit `long`/`double`, low slot first.
//!
//! # Memory Layout
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Activation 2 (current)                 │  ← top
//! │   v0..v(N-ins)   locals                │
//! │   v(N-ins)..vN   incoming arguments    │
//! ├────────────────────────────────────────┤
//! │ Activation 1                           │  ← base of activation 2
//! ├────────────────────────────────────────┤
//! │ Activation 0 (entry method)            │
//! └────────────────────────────────────────┘  ← base 0
//! ```
//!
//! Every access is checked against the owning window, so a stray register
//! index faults with [`VmError::RegisterOutOfBounds`] instead of reading a
//! neighbouring activation.

use crate::vm::value::{ObjRef, TypeCode, Value};
use crate::vm::{VmError, VmResult};

/// Default maximum register file size (in slots)
pub const DEFAULT_MAX_SIZE: usize = 1024 * 64; // 65536 registers

/// A register window: `size` slots starting at `base`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// Absolute index of `v0`
    pub base: usize,
    /// Number of registers
    pub size: u32,
}

impl Window {
    #[inline]
    fn index(&self, reg: u32) -> VmResult<usize> {
        if reg < self.size {
            Ok(self.base + reg as usize)
        } else {
            Err(VmError::RegisterOutOfBounds {
                reg,
                size: self.size,
            })
        }
    }

    #[inline]
    fn wide_index(&self, reg: u32) -> VmResult<usize> {
        if (reg as u64) + 1 < self.size as u64 {
            Ok(self.base + reg as usize)
        } else {
            Err(VmError::RegisterOutOfBounds {
                reg: reg.saturating_add(1),
                size: self.size,
            })
        }
    }
}

/// Register file shared by all activations of one interpreter
#[derive(Debug)]
pub struct RegisterFile {
    /// Contiguous register storage
    slots: Vec<u32>,
    /// Next free register slot (top of allocated space)
    top: usize,
    /// Maximum number of registers
    max_size: usize,
}

impl RegisterFile {
    /// Create a new register file with default max size
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    /// Create a new register file with specified max size
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            slots: Vec::with_capacity(256.min(max_size)),
            top: 0,
            max_size,
        }
    }

    /// Allocate a window of `count` registers on top of the file.
    ///
    /// All registers start zeroed (int 0, null reference).
    pub fn alloc_frame(&mut self, count: u16) -> VmResult<Window> {
        let base = self.top;
        let new_top = base + count as usize;
        if new_top > self.max_size {
            return Err(VmError::RegisterFileOverflow);
        }
        if new_top > self.slots.len() {
            self.slots.resize(new_top, 0);
        }
        self.slots[base..new_top].fill(0);
        self.top = new_top;
        Ok(Window {
            base,
            size: count as u32,
        })
    }

    /// Free the topmost window.
    ///
    /// `window` should be the value returned by the matching `alloc_frame`.
    #[inline]
    pub fn free_frame(&mut self, window: Window) {
        debug_assert!(window.base + window.size as usize == self.top);
        self.top = window.base;
    }

    // ===== Raw slots =====

    /// Raw 32-bit contents of `reg`
    #[inline]
    pub fn get(&self, window: Window, reg: u32) -> VmResult<u32> {
        Ok(self.slots[window.index(reg)?])
    }

    /// Overwrite `reg` with raw bits
    #[inline]
    pub fn set(&mut self, window: Window, reg: u32, bits: u32) -> VmResult<()> {
        let index = window.index(reg)?;
        self.slots[index] = bits;
        Ok(())
    }

    /// Raw 64-bit contents of the pair `reg`, `reg + 1`
    #[inline]
    pub fn get_wide(&self, window: Window, reg: u32) -> VmResult<u64> {
        let index = window.wide_index(reg)?;
        Ok(self.slots[index] as u64 | (self.slots[index + 1] as u64) << 32)
    }

    /// Overwrite the pair `reg`, `reg + 1` with raw bits
    #[inline]
    pub fn set_wide(&mut self, window: Window, reg: u32, bits: u64) -> VmResult<()> {
        let index = window.wide_index(reg)?;
        self.slots[index] = bits as u32;
        self.slots[index + 1] = (bits >> 32) as u32;
        Ok(())
    }

    // ===== Typed accessors =====

    /// Read `reg` as `int`
    #[inline]
    pub fn get_int(&self, window: Window, reg: u32) -> VmResult<i32> {
        self.get(window, reg).map(|bits| bits as i32)
    }

    /// Write an `int` to `reg`
    #[inline]
    pub fn set_int(&mut self, window: Window, reg: u32, value: i32) -> VmResult<()> {
        self.set(window, reg, value as u32)
    }

    /// Read `reg` as `float`
    #[inline]
    pub fn get_float(&self, window: Window, reg: u32) -> VmResult<f32> {
        self.get(window, reg).map(f32::from_bits)
    }

    /// Write a `float` to `reg`
    #[inline]
    pub fn set_float(&mut self, window: Window, reg: u32, value: f32) -> VmResult<()> {
        self.set(window, reg, value.to_bits())
    }

    /// Read the pair at `reg` as `long`
    #[inline]
    pub fn get_long(&self, window: Window, reg: u32) -> VmResult<i64> {
        self.get_wide(window, reg).map(|bits| bits as i64)
    }

    /// Write a `long` to the pair at `reg`
    #[inline]
    pub fn set_long(&mut self, window: Window, reg: u32, value: i64) -> VmResult<()> {
        self.set_wide(window, reg, value as u64)
    }

    /// Read the pair at `reg` as `double`
    #[inline]
    pub fn get_double(&self, window: Window, reg: u32) -> VmResult<f64> {
        self.get_wide(window, reg).map(f64::from_bits)
    }

    /// Write a `double` to the pair at `reg`
    #[inline]
    pub fn set_double(&mut self, window: Window, reg: u32, value: f64) -> VmResult<()> {
        self.set_wide(window, reg, value.to_bits())
    }

    /// Read `reg` as a reference handle
    #[inline]
    pub fn get_object(&self, window: Window, reg: u32) -> VmResult<ObjRef> {
        self.get(window, reg).map(ObjRef::from_raw)
    }

    /// Write a reference handle to `reg`
    #[inline]
    pub fn set_object(&mut self, window: Window, reg: u32, obj: ObjRef) -> VmResult<()> {
        self.set(window, reg, obj.raw())
    }

    /// Read `reg` (or the pair at `reg`) as a value of type `ty`
    pub fn read(&self, window: Window, reg: u32, ty: TypeCode) -> VmResult<Value> {
        Ok(match ty {
            TypeCode::Void => Value::Void,
            TypeCode::Long => Value::Long(self.get_long(window, reg)?),
            TypeCode::Double => Value::Double(self.get_double(window, reg)?),
            TypeCode::Object => Value::Object(self.get_object(window, reg)?),
            TypeCode::Float => Value::Float(self.get_float(window, reg)?),
            narrow => Value::Int(self.get_int(window, reg)?).coerce(narrow),
        })
    }

    /// Write `value` to `reg`, using the pair for wide values
    pub fn write(&mut self, window: Window, reg: u32, value: Value) -> VmResult<()> {
        match value {
            Value::Void => Ok(()),
            Value::Long(_) | Value::Double(_) => self.set_wide(window, reg, value.wide_bits()),
            _ => self.set(window, reg, value.narrow_bits()),
        }
    }

    /// Copy one register (or a pair) between windows
    pub fn copy(
        &mut self,
        src: Window,
        src_reg: u32,
        dst: Window,
        dst_reg: u32,
        wide: bool,
    ) -> VmResult<()> {
        if wide {
            let bits = self.get_wide(src, src_reg)?;
            self.set_wide(dst, dst_reg, bits)
        } else {
            let bits = self.get(src, src_reg)?;
            self.set(dst, dst_reg, bits)
        }
    }

    /// Current top (next free slot)
    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    /// Maximum register file size
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Check if the register file is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Get statistics about register file usage
    pub fn stats(&self) -> RegisterFileStats {
        RegisterFileStats {
            top: self.top,
            capacity: self.slots.capacity(),
            max_size: self.max_size,
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about register file usage
#[derive(Debug, Clone, Copy)]
pub struct RegisterFileStats {
    /// Current top position (registers in use)
    pub top: usize,
    /// Allocated capacity
    pub capacity: usize,
    /// Maximum allowed size
    pub max_size: usize,
}
