//! Integer and floating-point arithmetic
//!
//! Covers the unary ops (`neg-*`, `not-*`), the three-register binops,
//! their `/2addr` forms and the `/lit16` and `/lit8` literal forms. Division and remainder by zero raise
//! `ArithmeticException`; `MIN / -1` is `MIN` and `MIN % -1` is `0`.

use crate::bytecode::{Format, Opcode};
use crate::vm::exception::ExceptionKind;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_aa, inst_b, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

/// Binary operator shared by all operand types and addressing forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::vm::interpreter) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    /// `lit - v`
    Rsub,
}

/// Operand type of a binop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Int,
    Long,
    Float,
    Double,
}

/// Operand type and operator of a three-register or `/2addr` binop
fn binop(op: Opcode) -> Option<(Operand, BinOp)> {
    use Opcode::*;
    Some(match op {
        AddInt | AddInt2Addr => (Operand::Int, BinOp::Add),
        SubInt | SubInt2Addr => (Operand::Int, BinOp::Sub),
        MulInt | MulInt2Addr => (Operand::Int, BinOp::Mul),
        DivInt | DivInt2Addr => (Operand::Int, BinOp::Div),
        RemInt | RemInt2Addr => (Operand::Int, BinOp::Rem),
        AndInt | AndInt2Addr => (Operand::Int, BinOp::And),
        OrInt | OrInt2Addr => (Operand::Int, BinOp::Or),
        XorInt | XorInt2Addr => (Operand::Int, BinOp::Xor),
        ShlInt | ShlInt2Addr => (Operand::Int, BinOp::Shl),
        ShrInt | ShrInt2Addr => (Operand::Int, BinOp::Shr),
        UshrInt | UshrInt2Addr => (Operand::Int, BinOp::Ushr),

        AddLong | AddLong2Addr => (Operand::Long, BinOp::Add),
        SubLong | SubLong2Addr => (Operand::Long, BinOp::Sub),
        MulLong | MulLong2Addr => (Operand::Long, BinOp::Mul),
        DivLong | DivLong2Addr => (Operand::Long, BinOp::Div),
        RemLong | RemLong2Addr => (Operand::Long, BinOp::Rem),
        AndLong | AndLong2Addr => (Operand::Long, BinOp::And),
        OrLong | OrLong2Addr => (Operand::Long, BinOp::Or),
        XorLong | XorLong2Addr => (Operand::Long, BinOp::Xor),
        ShlLong | ShlLong2Addr => (Operand::Long, BinOp::Shl),
        ShrLong | ShrLong2Addr => (Operand::Long, BinOp::Shr),
        UshrLong | UshrLong2Addr => (Operand::Long, BinOp::Ushr),

        AddFloat | AddFloat2Addr => (Operand::Float, BinOp::Add),
        SubFloat | SubFloat2Addr => (Operand::Float, BinOp::Sub),
        MulFloat | MulFloat2Addr => (Operand::Float, BinOp::Mul),
        DivFloat | DivFloat2Addr => (Operand::Float, BinOp::Div),
        RemFloat | RemFloat2Addr => (Operand::Float, BinOp::Rem),

        AddDouble | AddDouble2Addr => (Operand::Double, BinOp::Add),
        SubDouble | SubDouble2Addr => (Operand::Double, BinOp::Sub),
        MulDouble | MulDouble2Addr => (Operand::Double, BinOp::Mul),
        DivDouble | DivDouble2Addr => (Operand::Double, BinOp::Div),
        RemDouble | RemDouble2Addr => (Operand::Double, BinOp::Rem),

        _ => return None,
    })
}

/// Operator of a `/lit16` or `/lit8` binop
fn lit_op(op: Opcode) -> Option<BinOp> {
    use Opcode::*;
    Some(match op {
        AddIntLit16 | AddIntLit8 => BinOp::Add,
        RsubInt | RsubIntLit8 => BinOp::Rsub,
        MulIntLit16 | MulIntLit8 => BinOp::Mul,
        DivIntLit16 | DivIntLit8 => BinOp::Div,
        RemIntLit16 | RemIntLit8 => BinOp::Rem,
        AndIntLit16 | AndIntLit8 => BinOp::And,
        OrIntLit16 | OrIntLit8 => BinOp::Or,
        XorIntLit16 | XorIntLit8 => BinOp::Xor,
        ShlIntLit8 => BinOp::Shl,
        ShrIntLit8 => BinOp::Shr,
        UshrIntLit8 => BinOp::Ushr,
        _ => return None,
    })
}

/// `x op y` on `int`; `None` on division by zero
pub(in crate::vm::interpreter) fn int_op(op: BinOp, x: i32, y: i32) -> Option<i32> {
    Some(match op {
        BinOp::Add => x.wrapping_add(y),
        BinOp::Sub => x.wrapping_sub(y),
        BinOp::Mul => x.wrapping_mul(y),
        BinOp::Div => match y {
            0 => return None,
            -1 => x.wrapping_neg(),
            _ => x / y,
        },
        BinOp::Rem => match y {
            0 => return None,
            -1 => 0,
            _ => x % y,
        },
        BinOp::And => x & y,
        BinOp::Or => x | y,
        BinOp::Xor => x ^ y,
        BinOp::Shl => x << (y & 0x1f),
        BinOp::Shr => x >> (y & 0x1f),
        BinOp::Ushr => ((x as u32) >> (y & 0x1f)) as i32,
        BinOp::Rsub => y.wrapping_sub(x),
    })
}

/// `x op y` on `long`; shift distances use the low 6 bits of `y`
pub(in crate::vm::interpreter) fn long_op(op: BinOp, x: i64, y: i64) -> Option<i64> {
    Some(match op {
        BinOp::Add => x.wrapping_add(y),
        BinOp::Sub => x.wrapping_sub(y),
        BinOp::Mul => x.wrapping_mul(y),
        BinOp::Div => match y {
            0 => return None,
            -1 => x.wrapping_neg(),
            _ => x / y,
        },
        BinOp::Rem => match y {
            0 => return None,
            -1 => 0,
            _ => x % y,
        },
        BinOp::And => x & y,
        BinOp::Or => x | y,
        BinOp::Xor => x ^ y,
        BinOp::Shl => x << (y & 0x3f),
        BinOp::Shr => x >> (y & 0x3f),
        BinOp::Ushr => ((x as u64) >> (y & 0x3f)) as i64,
        BinOp::Rsub => y.wrapping_sub(x),
    })
}

macro_rules! float_op {
    ($name:ident, $t:ty) => {
        /// IEEE-754 arithmetic; `Rem` is the truncating fmod remainder
        pub(in crate::vm::interpreter) fn $name(op: BinOp, x: $t, y: $t) -> VmResult<$t> {
            Ok(match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Div => x / y,
                BinOp::Rem => x % y,
                _ => return Err(VmError::UnexpectedState("bitwise operator on floating point")),
            })
        }
    };
}

float_op!(float_op, f32);
float_op!(double_op, f64);

fn raise_divide_by_zero(rt: &mut dyn Runtime, frame: &mut Frame) -> VmResult<Flow> {
    frame.raise(rt, ExceptionKind::Arithmetic, Some(ExceptionKind::DIVIDE_BY_ZERO))
}

/// Operand registers of a binop: destination, first and second source
struct Operands {
    dst: u32,
    src1: u32,
    src2: u32,
    width: u32,
}

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_arithmetic_ops(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let op = opcode(inst)?;
        if let Some((operand, bin)) = binop(op) {
            let operands = match op.format() {
                // binop vAA, vBB, vCC
                Format::F23x => {
                    let unit = frame.unit(1)?;
                    Operands {
                        dst: inst_aa(inst),
                        src1: (unit & 0xff) as u32,
                        src2: (unit >> 8) as u32,
                        width: 2,
                    }
                }
                // binop/2addr vA, vB
                _ => Operands {
                    dst: inst_a(inst),
                    src1: inst_a(inst),
                    src2: inst_b(inst),
                    width: 1,
                },
            };
            return self.exec_binop(rt, frame, operand, bin, operands);
        }
        if let Some(bin) = lit_op(op) {
            return match op.format() {
                // binop/lit16 vA, vB, #+CCCC
                Format::F22s => {
                    let lit = frame.unit(1)? as i16 as i32;
                    self.exec_lit_op(rt, frame, bin, inst_a(inst), inst_b(inst), lit)
                }
                // binop/lit8 vAA, vBB, #+CC
                _ => {
                    let unit = frame.unit(1)?;
                    let lit = (unit >> 8) as u8 as i8 as i32;
                    let src = (unit & 0xff) as u32;
                    self.exec_lit_op(rt, frame, bin, inst_aa(inst), src, lit)
                }
            };
        }
        self.exec_unary(frame, op, inst)
    }

    fn exec_unary(&mut self, frame: &mut Frame, op: Opcode, inst: u16) -> VmResult<Flow> {
        let w = frame.window;
        let (dst, src) = (inst_a(inst), inst_b(inst));
        let regs = &mut self.regs;
        match op {
            Opcode::NegInt => regs.set_int(w, dst, regs.get_int(w, src)?.wrapping_neg())?,
            Opcode::NotInt => regs.set_int(w, dst, !regs.get_int(w, src)?)?,
            Opcode::NegLong => regs.set_long(w, dst, regs.get_long(w, src)?.wrapping_neg())?,
            Opcode::NotLong => regs.set_long(w, dst, !regs.get_long(w, src)?)?,
            Opcode::NegFloat => regs.set_float(w, dst, -regs.get_float(w, src)?)?,
            Opcode::NegDouble => regs.set_double(w, dst, -regs.get_double(w, src)?)?,
            _ => return Err(VmError::UnexpectedState("not an arithmetic opcode")),
        }
        Ok(frame.advance(1))
    }

    fn exec_binop(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        operand: Operand,
        op: BinOp,
        ops: Operands,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let regs = &mut self.regs;

        match operand {
            Operand::Int => {
                let x = regs.get_int(w, ops.src1)?;
                let y = regs.get_int(w, ops.src2)?;
                match int_op(op, x, y) {
                    Some(r) => regs.set_int(w, ops.dst, r)?,
                    None => return raise_divide_by_zero(rt, frame),
                }
            }
            // shift distances come from a single int register
            Operand::Long => {
                let x = regs.get_long(w, ops.src1)?;
                let y = match op {
                    BinOp::Shl | BinOp::Shr | BinOp::Ushr => regs.get_int(w, ops.src2)? as i64,
                    _ => regs.get_long(w, ops.src2)?,
                };
                match long_op(op, x, y) {
                    Some(r) => regs.set_long(w, ops.dst, r)?,
                    None => return raise_divide_by_zero(rt, frame),
                }
            }
            Operand::Float => {
                let x = regs.get_float(w, ops.src1)?;
                let y = regs.get_float(w, ops.src2)?;
                regs.set_float(w, ops.dst, float_op(op, x, y)?)?;
            }
            Operand::Double => {
                let x = regs.get_double(w, ops.src1)?;
                let y = regs.get_double(w, ops.src2)?;
                regs.set_double(w, ops.dst, double_op(op, x, y)?)?;
            }
        }
        Ok(frame.advance(ops.width))
    }

    fn exec_lit_op(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        op: BinOp,
        dst: u32,
        src: u32,
        lit: i32,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let x = self.regs.get_int(w, src)?;
        match int_op(op, x, lit) {
            Some(r) => {
                self.regs.set_int(w, dst, r)?;
                Ok(frame.advance(2))
            }
            None => raise_divide_by_zero(rt, frame),
        }
    }
}
