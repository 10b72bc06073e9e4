//! Disassembler for Dalvik instruction streams
//!
//! Produces one line per instruction, `pppp: mnemonic operands`, using the
//! same operand syntax as `dexdump`. Payload tables are printed as a single
//! pseudo-instruction and skipped.

use crate::bytecode::opcode::{Format, Opcode};
use crate::bytecode::payload::{
    payload_width, ARRAY_DATA_SIGNATURE, PACKED_SWITCH_SIGNATURE, SPARSE_SWITCH_SIGNATURE,
};

fn index_kind(op: Opcode) -> &'static str {
    use Opcode::*;
    match op {
        ConstString | ConstStringJumbo => "string",
        ConstClass | CheckCast | InstanceOf | NewInstance | NewArray | FilledNewArray
        | FilledNewArrayRange => "type",
        _ if op.is_invoke() => "method",
        _ => "field",
    }
}

/// Render the instruction at `pc`
///
/// Returns the text and the width in code units, or `None` if the stream is
/// truncated at `pc`.
pub fn format_instruction(insns: &[u16], pc: usize) -> Option<(String, usize)> {
    let first = *insns.get(pc)?;
    let unit = |n: usize| insns.get(pc + n).copied();

    if first & 0xff == 0 && first != 0 {
        if let Some(width) = payload_width(&insns[pc..]) {
            let name = match first {
                PACKED_SWITCH_SIGNATURE => "packed-switch-payload",
                SPARSE_SWITCH_SIGNATURE => "sparse-switch-payload",
                ARRAY_DATA_SIGNATURE => "array-data-payload",
                _ => "payload",
            };
            return Some((format!("{} ({} units)", name, width), width));
        }
    }

    let op = match Opcode::from_u8(first as u8) {
        Some(op) => op,
        None => return Some((format!("unknown 0x{:02x}", first & 0xff), 1)),
    };
    let width = op.width() as usize;
    if pc + width > insns.len() {
        return None;
    }
    let name = op.name();
    let a = (first >> 8) & 0xf;
    let b = first >> 12;
    let aa = first >> 8;
    let u32_at = |n: usize| unit(n).unwrap_or(0) as u32 | (unit(n + 1).unwrap_or(0) as u32) << 16;
    let b1 = unit(1).unwrap_or(0);

    let text = match op.format() {
        Format::F10x => name.to_string(),
        Format::F12x => format!("{} v{}, v{}", name, a, b),
        Format::F11n => format!("{} v{}, #{}", name, a, ((b as i8) << 4) >> 4),
        Format::F11x => format!("{} v{}", name, aa),
        Format::F10t => format!("{} {:+}", name, aa as u8 as i8),
        Format::F20t => format!("{} {:+}", name, b1 as i16),
        Format::F22x => format!("{} v{}, v{}", name, aa, b1),
        Format::F21t => format!("{} v{}, {:+}", name, aa, b1 as i16),
        Format::F21s => format!("{} v{}, #{}", name, aa, b1 as i16),
        Format::F21h => {
            if op == Opcode::ConstHigh16 {
                format!("{} v{}, #0x{:x}", name, aa, (b1 as u32) << 16)
            } else {
                format!("{} v{}, #0x{:x}", name, aa, (b1 as u64) << 48)
            }
        }
        Format::F21c => format!("{} v{}, {}@{}", name, aa, index_kind(op), b1),
        Format::F23x => format!("{} v{}, v{}, v{}", name, aa, b1 & 0xff, b1 >> 8),
        Format::F22b => format!("{} v{}, v{}, #{}", name, aa, b1 & 0xff, (b1 >> 8) as u8 as i8),
        Format::F22t => format!("{} v{}, v{}, {:+}", name, a, b, b1 as i16),
        Format::F22s => format!("{} v{}, v{}, #{}", name, a, b, b1 as i16),
        Format::F22c => format!("{} v{}, v{}, {}@{}", name, a, b, index_kind(op), b1),
        Format::F30t => format!("{} {:+}", name, u32_at(1) as i32),
        Format::F32x => format!("{} v{}, v{}", name, b1, unit(2).unwrap_or(0)),
        Format::F31i => format!("{} v{}, #{}", name, aa, u32_at(1) as i32),
        Format::F31t => format!("{} v{}, {:+}", name, aa, u32_at(1) as i32),
        Format::F31c => format!("{} v{}, {}@{}", name, aa, index_kind(op), u32_at(1)),
        Format::F35c => {
            let count = (first >> 12) as usize;
            let word = unit(2).unwrap_or(0);
            let regs: Vec<String> = (0..count)
                .map(|i| {
                    let r = if i < 4 { (word >> (4 * i)) & 0xf } else { a };
                    format!("v{}", r)
                })
                .collect();
            format!("{} {{{}}}, {}@{}", name, regs.join(", "), index_kind(op), b1)
        }
        Format::F3rc => {
            let start = unit(2).unwrap_or(0) as u32;
            let regs = if aa == 0 {
                String::new()
            } else {
                format!("v{} .. v{}", start, start + aa as u32 - 1)
            };
            format!("{} {{{}}}, {}@{}", name, regs, index_kind(op), b1)
        }
        Format::F51l => {
            let lo = u32_at(1) as u64;
            let hi = u32_at(3) as u64;
            format!("{} v{}, #{}", name, aa, (lo | hi << 32) as i64)
        }
    };
    Some((text, width))
}

/// Disassemble a whole instruction stream
pub fn disassemble(insns: &[u16]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pc = 0usize;
    while pc < insns.len() {
        match format_instruction(insns, pc) {
            Some((text, width)) => {
                lines.push(format!("{:04x}: {}", pc, text));
                pc += width;
            }
            None => {
                lines.push(format!("{:04x}: <truncated>", pc));
                break;
            }
        }
    }
    lines
}
