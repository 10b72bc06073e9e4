//! Method bodies and their exception-handler tables
//!
//! A [`CodeItem`] mirrors the DEX `code_item` structure: register counts,
//! the instruction stream, and the try table. The try table is kept in its
//! encoded DEX form (a `try_item` array plus an `encoded_catch_handler_list`
//! byte buffer) and decoded lazily by the unwinder.
//!
//! ```text
//! try_item:               u32 start_addr, u16 insn_count, u16 handler_off
//! encoded_catch_handler:  sleb128 size
//!                         (uleb128 type_idx, uleb128 addr) * |size|
//!                         uleb128 catch_all_addr        (only if size <= 0)
//! ```

use crate::vm::{VmError, VmResult};

/// One protected range of the instruction stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryItem {
    /// First covered code unit
    pub start_addr: u32,
    /// Number of covered code units
    pub insn_count: u16,
    /// Byte offset of the handler in the encoded handler list
    pub handler_off: u16,
}

impl TryItem {
    /// Check if `pc` lies inside this range
    #[inline]
    pub fn covers(&self, pc: u32) -> bool {
        self.start_addr <= pc && (pc as u64) < self.start_addr as u64 + self.insn_count as u64
    }
}

/// A typed catch clause: `catch (type_idx) -> addr`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchClause {
    /// Type index of the caught exception class
    pub type_idx: u32,
    /// Handler address in code units
    pub addr: u32,
}

/// Decoded catch handler list of one try range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatchHandler {
    /// Typed clauses in table order
    pub clauses: Vec<CatchClause>,
    /// Catch-all address, if any
    pub catch_all: Option<u32>,
}

/// An interpretable method body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeItem {
    /// Total number of registers used by the method
    pub registers_size: u16,
    /// Number of registers holding incoming arguments (trailing registers)
    pub ins_size: u16,
    /// Number of outgoing argument words needed for invocations
    pub outs_size: u16,
    /// Instruction stream
    pub insns: Vec<u16>,
    /// Try ranges in table order
    pub tries: Vec<TryItem>,
    /// Encoded catch handler list (`encoded_catch_handler_list`)
    pub handlers: Vec<u8>,
}

impl CodeItem {
    /// Create a body without a try table
    pub fn new(registers_size: u16, ins_size: u16, insns: Vec<u16>) -> Self {
        Self {
            registers_size,
            ins_size,
            outs_size: 0,
            insns,
            tries: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Attach a try table produced by [`TryTableBuilder`]
    pub fn with_try_table(mut self, table: TryTable) -> Self {
        self.tries = table.tries;
        self.handlers = table.handlers;
        self
    }

    /// Number of code units in the instruction stream
    #[inline]
    pub fn insns_size(&self) -> u32 {
        self.insns.len() as u32
    }

    /// First register of the incoming-argument window
    #[inline]
    pub fn ins_start(&self) -> u16 {
        self.registers_size - self.ins_size
    }

    /// Decode the catch handler list of `item`
    pub fn catch_handler(&self, item: &TryItem) -> VmResult<CatchHandler> {
        // The list starts with its own uleb128 entry count; handler_off is
        // relative to the start of the list.
        let mut pos = item.handler_off as usize;
        if pos >= self.handlers.len() {
            return Err(VmError::MalformedCodeItem(format!(
                "handler offset {} outside handler list ({} bytes)",
                pos,
                self.handlers.len()
            )));
        }
        let size = read_sleb128(&self.handlers, &mut pos)?;
        let mut handler = CatchHandler {
            clauses: Vec::with_capacity(size.unsigned_abs() as usize),
            catch_all: None,
        };
        for _ in 0..size.unsigned_abs() {
            let type_idx = read_uleb128(&self.handlers, &mut pos)?;
            let addr = read_uleb128(&self.handlers, &mut pos)?;
            handler.clauses.push(CatchClause { type_idx, addr });
        }
        if size <= 0 {
            handler.catch_all = Some(read_uleb128(&self.handlers, &mut pos)?);
        }
        Ok(handler)
    }

    // ========================================================================
    // DEX encoding
    // ========================================================================

    /// Parse a DEX `code_item` from little-endian bytes
    ///
    /// `debug_info_off` is read and discarded.
    pub fn parse(bytes: &[u8]) -> VmResult<Self> {
        let mut reader = ByteReader { bytes, pos: 0 };
        let registers_size = reader.u16()?;
        let ins_size = reader.u16()?;
        let outs_size = reader.u16()?;
        let tries_size = reader.u16()?;
        let _debug_info_off = reader.u32()?;
        let insns_size = reader.u32()?;
        if ins_size > registers_size {
            return Err(VmError::MalformedCodeItem(format!(
                "ins_size {} exceeds registers_size {}",
                ins_size, registers_size
            )));
        }
        let mut insns = Vec::with_capacity(insns_size as usize);
        for _ in 0..insns_size {
            insns.push(reader.u16()?);
        }
        let mut tries = Vec::with_capacity(tries_size as usize);
        let mut handlers = Vec::new();
        if tries_size > 0 {
            if insns_size % 2 == 1 {
                reader.u16()?;
            }
            for _ in 0..tries_size {
                tries.push(TryItem {
                    start_addr: reader.u32()?,
                    insn_count: reader.u16()?,
                    handler_off: reader.u16()?,
                });
            }
            handlers = reader.rest().to_vec();
        }
        Ok(Self {
            registers_size,
            ins_size,
            outs_size,
            insns,
            tries,
            handlers,
        })
    }

    /// Encode as a DEX `code_item` (with `debug_info_off` = 0)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.insns.len() * 2 + self.handlers.len());
        out.extend_from_slice(&self.registers_size.to_le_bytes());
        out.extend_from_slice(&self.ins_size.to_le_bytes());
        out.extend_from_slice(&self.outs_size.to_le_bytes());
        out.extend_from_slice(&(self.tries.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(self.insns.len() as u32).to_le_bytes());
        for unit in &self.insns {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        if !self.tries.is_empty() {
            if self.insns.len() % 2 == 1 {
                out.extend_from_slice(&0u16.to_le_bytes());
            }
            for item in &self.tries {
                out.extend_from_slice(&item.start_addr.to_le_bytes());
                out.extend_from_slice(&item.insn_count.to_le_bytes());
                out.extend_from_slice(&item.handler_off.to_le_bytes());
            }
            out.extend_from_slice(&self.handlers);
        }
        out
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take<const N: usize>(&mut self) -> VmResult<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            VmError::MalformedCodeItem(format!("unexpected end of code item at byte {}", self.pos))
        })?;
        self.pos = end;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn u16(&mut self) -> VmResult<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> VmResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos.min(self.bytes.len())..]
    }
}

// ============================================================================
// LEB128
// ============================================================================

fn read_uleb128(bytes: &[u8], pos: &mut usize) -> VmResult<u32> {
    let mut result = 0u32;
    for shift in (0..35).step_by(7) {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| VmError::MalformedCodeItem("truncated uleb128".to_string()))?;
        *pos += 1;
        result |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(VmError::MalformedCodeItem("uleb128 longer than 5 bytes".to_string()))
}

fn read_sleb128(bytes: &[u8], pos: &mut usize) -> VmResult<i32> {
    let mut result = 0i32;
    for shift in (0..35).step_by(7) {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| VmError::MalformedCodeItem("truncated sleb128".to_string()))?;
        *pos += 1;
        result |= ((byte & 0x7f) as i32).wrapping_shl(shift);
        if byte & 0x80 == 0 {
            if shift + 7 < 32 && byte & 0x40 != 0 {
                result |= -1i32 << (shift + 7);
            }
            return Ok(result);
        }
    }
    Err(VmError::MalformedCodeItem("sleb128 longer than 5 bytes".to_string()))
}

fn write_uleb128(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn write_sleb128(out: &mut Vec<u8>, mut value: i32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

// ============================================================================
// TryTableBuilder
// ============================================================================

/// Encoded try table, ready to attach to a [`CodeItem`]
#[derive(Debug, Clone, Default)]
pub struct TryTable {
    /// Try ranges
    pub tries: Vec<TryItem>,
    /// Encoded handler list
    pub handlers: Vec<u8>,
}

/// Builds the DEX encoding of a try table
///
/// Every range gets its own handler entry; handlers are not deduplicated.
#[derive(Debug, Default)]
pub struct TryTableBuilder {
    tries: Vec<TryItem>,
    entries: Vec<Vec<u8>>,
}

impl TryTableBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range `[start, start + count)` with typed clauses and an
    /// optional catch-all target
    pub fn add(
        &mut self,
        start: u32,
        count: u16,
        clauses: &[(u32, u32)],
        catch_all: Option<u32>,
    ) -> &mut Self {
        let mut entry = Vec::new();
        let size = clauses.len() as i32;
        write_sleb128(&mut entry, if catch_all.is_some() { -size } else { size });
        for &(type_idx, addr) in clauses {
            write_uleb128(&mut entry, type_idx);
            write_uleb128(&mut entry, addr);
        }
        if let Some(addr) = catch_all {
            write_uleb128(&mut entry, addr);
        }
        self.tries.push(TryItem {
            start_addr: start,
            insn_count: count,
            handler_off: 0,
        });
        self.entries.push(entry);
        self
    }

    /// Produce the encoded table
    pub fn build(self) -> TryTable {
        let mut handlers = Vec::new();
        write_uleb128(&mut handlers, self.entries.len() as u32);
        let mut tries = self.tries;
        for (item, entry) in tries.iter_mut().zip(&self.entries) {
            item.handler_off = handlers.len() as u16;
            handlers.extend_from_slice(entry);
        }
        TryTable { tries, handlers }
    }
}
