//! Array instructions
//!
//! Element access is bounds-checked here before reaching the host, so
//! [`HostObjects::array_get`](crate::vm::HostObjects::array_get) and
//! friends only ever see valid indices.

use crate::bytecode::{ArrayData, Opcode};
use crate::vm::exception::ExceptionKind;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_aa, inst_b, Frame};
use crate::vm::interpreter::invoke::ArgRegisters;
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::value::{ObjRef, RegValue, Value};
use crate::vm::{VmError, VmResult};

/// Element shape of an `aget`/`aput` variant, by offset from `aget`/`aput`
fn element_shape(index: u8) -> ElementShape {
    match index {
        1 => ElementShape::Wide,
        2 => ElementShape::Object,
        _ => ElementShape::Narrow,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementShape {
    Narrow,
    Wide,
    Object,
}

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_array_ops(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let op = opcode(inst)?;

        match op {
            // array-length vA, vB
            Opcode::ArrayLength => {
                let array = self.regs.get_object(w, inst_b(inst))?;
                if array.is_null() {
                    return frame.raise_npe(rt);
                }
                self.regs.set_int(w, inst_a(inst), rt.array_length(array))?;
                Ok(frame.advance(1))
            }

            // new-array vA, vB, type@CCCC
            Opcode::NewArray => {
                let length = self.regs.get_int(w, inst_b(inst))?;
                if length < 0 {
                    let message = length.to_string();
                    return frame.raise(rt, ExceptionKind::NegativeArraySize, Some(&message));
                }
                match rt.alloc_array(frame.method, length, frame.unit(1)? as u32) {
                    Ok(array) => {
                        self.regs.set_object(w, inst_a(inst), array)?;
                        Ok(frame.advance(2))
                    }
                    Err(exception) => frame.throw(exception),
                }
            }

            Opcode::FilledNewArray => {
                let args = ArgRegisters::packed(inst, frame.unit(2)?);
                self.filled_new_array(rt, frame, args)
            }
            Opcode::FilledNewArrayRange => {
                let args = ArgRegisters::range(inst, frame.unit(2)?);
                self.filled_new_array(rt, frame, args)
            }

            // fill-array-data vAA, +BBBBBBBB
            Opcode::FillArrayData => {
                let array = self.regs.get_object(w, inst_aa(inst))?;
                if array.is_null() {
                    return frame.raise_npe(rt);
                }
                let offset = frame.unit_u32(1)? as i32;
                let data = ArrayData::parse(frame.payload(offset)?)?;
                let length = rt.array_length(array);
                let count = data.count();
                if count as i64 > length as i64 {
                    let message = ExceptionKind::bounds_message(length, count as i32);
                    return frame.raise(rt, ExceptionKind::ArrayIndexOutOfBounds, Some(&message));
                }
                let wide = data.element_width() == 8;
                let mut failed = None;
                for index in 0..count {
                    let bits = data.element_bits(index);
                    let value = if wide {
                        RegValue::Wide(bits)
                    } else {
                        RegValue::Narrow(bits as u32)
                    };
                    if let Err(exception) = rt.array_put(array, index as i32, value) {
                        failed = Some(exception);
                        break;
                    }
                }
                match failed {
                    Some(exception) => frame.throw(exception),
                    None => Ok(frame.advance(3)),
                }
            }

            // aget* vAA, vBB, vCC
            _ if (0x44..=0x4a).contains(&op.to_u8()) => {
                let Some((array, index)) = self.checked_element(rt, frame)? else {
                    return Ok(Flow::Throw);
                };
                let value = rt.array_get(array, index);
                let dst = inst_aa(inst);
                match element_shape(op.to_u8() - 0x44) {
                    ElementShape::Narrow => self.regs.set(w, dst, value.narrow_bits())?,
                    ElementShape::Wide => self.regs.set_wide(w, dst, value.wide_bits())?,
                    ElementShape::Object => {
                        self.regs.set_object(w, dst, ObjRef::from_raw(value.narrow_bits()))?
                    }
                }
                Ok(frame.advance(2))
            }

            // aput* vAA, vBB, vCC
            _ if (0x4b..=0x51).contains(&op.to_u8()) => {
                let Some((array, index)) = self.checked_element(rt, frame)? else {
                    return Ok(Flow::Throw);
                };
                let src = inst_aa(inst);
                let value = match element_shape(op.to_u8() - 0x4b) {
                    ElementShape::Narrow => RegValue::Narrow(self.regs.get(w, src)?),
                    ElementShape::Wide => RegValue::Wide(self.regs.get_wide(w, src)?),
                    ElementShape::Object => RegValue::Ref(self.regs.get_object(w, src)?),
                };
                match rt.array_put(array, index, value) {
                    Ok(()) => Ok(frame.advance(2)),
                    Err(exception) => frame.throw(exception),
                }
            }

            _ => Err(VmError::UnexpectedState("not an array opcode")),
        }
    }

    /// Array and index of a 23x element access, or `None` after raising
    /// `NullPointerException` / `ArrayIndexOutOfBoundsException`
    fn checked_element(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
    ) -> VmResult<Option<(ObjRef, i32)>> {
        let w = frame.window;
        let unit = frame.unit(1)?;
        let array = self.regs.get_object(w, (unit & 0xff) as u32)?;
        let index = self.regs.get_int(w, (unit >> 8) as u32)?;

        if array.is_null() {
            frame.raise_npe(rt)?;
            return Ok(None);
        }
        let length = rt.array_length(array);
        if index < 0 || index >= length {
            let message = ExceptionKind::bounds_message(length, index);
            frame.raise(rt, ExceptionKind::ArrayIndexOutOfBounds, Some(&message))?;
            return Ok(None);
        }
        Ok(Some((array, index)))
    }

    /// `filled-new-array {regs}, type@BBBB`
    ///
    /// The array type is resolved first, so an unknown type raises the
    /// host's exception. Only `int` and reference element types are
    /// accepted. The new array
    /// goes to the frame's result slot for a following `move-result-object`.
    fn filled_new_array(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        args: ArgRegisters,
    ) -> VmResult<Flow> {
        let type_idx = frame.unit(1)? as u32;
        if let Err(exception) = rt.resolve_class(frame.method, type_idx) {
            return frame.throw(exception);
        }
        let descriptor = rt
            .type_descriptor(frame.method, type_idx)
            .ok_or_else(|| VmError::InvalidDescriptor(format!("type@{}", type_idx)))?;
        let element = descriptor.chars().nth(1).unwrap_or('V');

        match element {
            'J' | 'D' => {
                let message = ExceptionKind::BAD_FILLED_ARRAY;
                return frame.raise(rt, ExceptionKind::Runtime, Some(message));
            }
            'I' | 'L' | '[' => {}
            other => {
                let message = ExceptionKind::unsupported_filled_array(other);
                return frame.raise(rt, ExceptionKind::Internal, Some(&message));
            }
        }

        let count = args.count();
        let array = match rt.alloc_array(frame.method, count as i32, type_idx) {
            Ok(array) => array,
            Err(exception) => return frame.throw(exception),
        };
        for slot in 0..count {
            let reg = args.reg(slot)?;
            let value = if element == 'I' {
                RegValue::Narrow(self.regs.get(frame.window, reg)?)
            } else {
                RegValue::Ref(self.regs.get_object(frame.window, reg)?)
            };
            if let Err(exception) = rt.array_put(array, slot as i32, value) {
                return frame.throw(exception);
            }
        }
        frame.ret_val = Value::Object(array);
        Ok(frame.advance(3))
    }
}
