//! Code-unit assembler
//!
//! `CodeWriter` emits 16-bit code units for each instruction format and the
//! three payload tables. Positions and offsets are in code units; branch and
//! payload offsets are relative to the referencing instruction.

use crate::bytecode::opcode::Opcode;
use crate::bytecode::payload::{
    ARRAY_DATA_SIGNATURE, PACKED_SWITCH_SIGNATURE, SPARSE_SWITCH_SIGNATURE,
};

/// Writer for Dalvik instruction streams (`Vec<u16>` code units)
#[derive(Debug, Default)]
pub struct CodeWriter {
    code: Vec<u16>,
}

#[inline]
fn op_aa(op: Opcode, aa: u8) -> u16 {
    op as u16 | (aa as u16) << 8
}

#[inline]
fn op_ba(op: Opcode, a: u8, b: u8) -> u16 {
    debug_assert!(a < 16 && b < 16, "nibble register out of range");
    op as u16 | ((a & 0xf) as u16) << 8 | ((b & 0xf) as u16) << 12
}

impl CodeWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    fn push(&mut self, units: &[u16]) -> u32 {
        let pos = self.code.len() as u32;
        self.code.extend_from_slice(units);
        pos
    }

    // ===== One code unit =====

    /// `op` (10x)
    pub fn emit_10x(&mut self, op: Opcode) -> u32 {
        self.push(&[op as u16])
    }

    /// `op vA, vB` (12x)
    pub fn emit_12x(&mut self, op: Opcode, a: u8, b: u8) -> u32 {
        self.push(&[op_ba(op, a, b)])
    }

    /// `op vA, #+B` (11n), `lit` in `-8..=7`
    pub fn emit_11n(&mut self, op: Opcode, a: u8, lit: i8) -> u32 {
        debug_assert!((-8..=7).contains(&lit));
        self.push(&[op_ba(op, a, (lit as u8) & 0xf)])
    }

    /// `op vAA` (11x)
    pub fn emit_11x(&mut self, op: Opcode, aa: u8) -> u32 {
        self.push(&[op_aa(op, aa)])
    }

    /// `op +AA` (10t)
    pub fn emit_10t(&mut self, op: Opcode, offset: i8) -> u32 {
        self.push(&[op_aa(op, offset as u8)])
    }

    // ===== Two code units =====

    /// `op +AAAA` (20t)
    pub fn emit_20t(&mut self, op: Opcode, offset: i16) -> u32 {
        self.push(&[op as u16, offset as u16])
    }

    /// `op vAA, vBBBB` (22x)
    pub fn emit_22x(&mut self, op: Opcode, aa: u8, bbbb: u16) -> u32 {
        self.push(&[op_aa(op, aa), bbbb])
    }

    /// `op vAA, BBBB` (21t, 21s, 21h, 21c)
    pub fn emit_21(&mut self, op: Opcode, aa: u8, bbbb: u16) -> u32 {
        self.push(&[op_aa(op, aa), bbbb])
    }

    /// `op vAA, vBB, vCC` (23x)
    pub fn emit_23x(&mut self, op: Opcode, aa: u8, bb: u8, cc: u8) -> u32 {
        self.push(&[op_aa(op, aa), bb as u16 | (cc as u16) << 8])
    }

    /// `op vAA, vBB, #+CC` (22b)
    pub fn emit_22b(&mut self, op: Opcode, aa: u8, bb: u8, lit: i8) -> u32 {
        self.push(&[op_aa(op, aa), bb as u16 | (lit as u8 as u16) << 8])
    }

    /// `op vA, vB, CCCC` (22t, 22s, 22c)
    pub fn emit_22(&mut self, op: Opcode, a: u8, b: u8, cccc: u16) -> u32 {
        self.push(&[op_ba(op, a, b), cccc])
    }

    // ===== Three code units =====

    /// `op +AAAAAAAA` (30t)
    pub fn emit_30t(&mut self, op: Opcode, offset: i32) -> u32 {
        let v = offset as u32;
        self.push(&[op as u16, v as u16, (v >> 16) as u16])
    }

    /// `op vAAAA, vBBBB` (32x)
    pub fn emit_32x(&mut self, op: Opcode, aaaa: u16, bbbb: u16) -> u32 {
        self.push(&[op as u16, aaaa, bbbb])
    }

    /// `op vAA, BBBBBBBB` (31i, 31t, 31c)
    pub fn emit_31(&mut self, op: Opcode, aa: u8, value: u32) -> u32 {
        self.push(&[op_aa(op, aa), value as u16, (value >> 16) as u16])
    }

    /// `op {vC, vD, vE, vF, vG}, kind@BBBB` (35c), at most five registers
    pub fn emit_35c(&mut self, op: Opcode, args: &[u8], index: u16) -> u32 {
        debug_assert!(args.len() <= 5);
        let nibble = |i: usize| args.get(i).map(|&r| (r & 0xf) as u16).unwrap_or(0);
        let first = op as u16 | nibble(4) << 8 | (args.len() as u16) << 12;
        let regs = nibble(0) | nibble(1) << 4 | nibble(2) << 8 | nibble(3) << 12;
        self.push(&[first, index, regs])
    }

    /// `op {vCCCC .. vCCCC+count-1}, kind@BBBB` (3rc)
    pub fn emit_3rc(&mut self, op: Opcode, first: u16, count: u8, index: u16) -> u32 {
        self.push(&[op_aa(op, count), index, first])
    }

    // ===== Five code units =====

    /// `op vAA, #+BBBBBBBBBBBBBBBB` (51l)
    pub fn emit_51l(&mut self, op: Opcode, aa: u8, value: u64) -> u32 {
        self.push(&[
            op_aa(op, aa),
            value as u16,
            (value >> 16) as u16,
            (value >> 32) as u16,
            (value >> 48) as u16,
        ])
    }

    // ===== Payload tables =====

    /// Pad with a `nop` so the next table starts on a 32-bit boundary
    fn align(&mut self) {
        if self.code.len() % 2 == 1 {
            self.code.push(Opcode::Nop as u16);
        }
    }

    /// Emit a packed-switch table; returns its position
    pub fn emit_packed_switch_payload(&mut self, first_key: i32, targets: &[i32]) -> u32 {
        self.align();
        let pos = self.push(&[PACKED_SWITCH_SIGNATURE, targets.len() as u16]);
        self.push_i32(first_key);
        for &t in targets {
            self.push_i32(t);
        }
        pos
    }

    /// Emit a sparse-switch table from `(key, target)` pairs sorted by key;
    /// returns its position
    pub fn emit_sparse_switch_payload(&mut self, cases: &[(i32, i32)]) -> u32 {
        debug_assert!(cases.windows(2).all(|w| w[0].0 < w[1].0), "keys must be sorted");
        self.align();
        let pos = self.push(&[SPARSE_SWITCH_SIGNATURE, cases.len() as u16]);
        for &(key, _) in cases {
            self.push_i32(key);
        }
        for &(_, target) in cases {
            self.push_i32(target);
        }
        pos
    }

    /// Emit a fill-array-data table of `elements`, each `width` bytes wide
    /// (low bytes of each value, little-endian); returns its position
    pub fn emit_array_data_payload(&mut self, width: u16, elements: &[u64]) -> u32 {
        self.align();
        let count = elements.len() as u32;
        let pos = self.push(&[ARRAY_DATA_SIGNATURE, width, count as u16, (count >> 16) as u16]);
        let mut bytes = Vec::with_capacity(width as usize * elements.len() + 1);
        for &e in elements {
            bytes.extend_from_slice(&e.to_le_bytes()[..width as usize]);
        }
        if bytes.len() % 2 == 1 {
            bytes.push(0);
        }
        for pair in bytes.chunks(2) {
            self.code.push(pair[0] as u16 | (pair[1] as u16) << 8);
        }
        pos
    }

    fn push_i32(&mut self, v: i32) {
        let v = v as u32;
        self.code.push(v as u16);
        self.code.push((v >> 16) as u16);
    }

    // ===== Patching =====

    /// Current position (code-unit index of the next instruction)
    #[inline]
    pub fn position(&self) -> u32 {
        self.code.len() as u32
    }

    /// Patch the 16-bit unit at `pos + 1` (branch offset of 20t/21t/22t)
    pub fn patch_unit(&mut self, pos: u32, value: u16) {
        self.code[pos as usize + 1] = value;
    }

    /// Patch the 32-bit operand of a 30t/31x instruction at `pos`
    pub fn patch_31(&mut self, pos: u32, value: u32) {
        self.code[pos as usize + 1] = value as u16;
        self.code[pos as usize + 2] = (value >> 16) as u16;
    }

    /// Consume the writer and return the code units
    pub fn finish(self) -> Vec<u16> {
        self.code
    }

    /// Get a reference to the current code
    pub fn code(&self) -> &[u16] {
        &self.code
    }
}
