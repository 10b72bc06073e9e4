//! Object model instructions: type checks, allocation and field access

use crate::bytecode::Opcode;
use crate::vm::exception::ExceptionKind;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_aa, inst_b, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::value::{ObjRef, RegValue};
use crate::vm::{VmError, VmResult};

/// Register shape moved by a field instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::vm::interpreter) enum Shape {
    /// One register; sub-word values arrive sign/zero-extended
    Narrow,
    /// Register pair
    Wide,
    /// Reference
    Object,
}

/// Decoded `iget`/`iput`/`sget`/`sput` variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::vm::interpreter) struct FieldAccess {
    pub is_static: bool,
    pub is_put: bool,
    pub shape: Shape,
}

impl FieldAccess {
    /// Classify a field opcode; volatile forms behave as the plain ones
    pub(in crate::vm::interpreter) fn of(op: Opcode) -> Option<FieldAccess> {
        let byte = op.to_u8();
        let (is_static, is_put, shape) = match byte {
            0x52..=0x6d => {
                let index = (byte - 0x52) % 7;
                let shape = match index {
                    1 => Shape::Wide,
                    2 => Shape::Object,
                    _ => Shape::Narrow,
                };
                (byte >= 0x60, matches!(byte, 0x59..=0x5f | 0x67..=0x6d), shape)
            }
            _ => match op {
                Opcode::IgetVolatile => (false, false, Shape::Narrow),
                Opcode::IputVolatile => (false, true, Shape::Narrow),
                Opcode::SgetVolatile => (true, false, Shape::Narrow),
                Opcode::SputVolatile => (true, true, Shape::Narrow),
                Opcode::IgetObjectVolatile => (false, false, Shape::Object),
                Opcode::IgetWideVolatile => (false, false, Shape::Wide),
                Opcode::IputWideVolatile => (false, true, Shape::Wide),
                Opcode::SgetWideVolatile => (true, false, Shape::Wide),
                Opcode::SputWideVolatile => (true, true, Shape::Wide),
                Opcode::IputObjectVolatile => (false, true, Shape::Object),
                Opcode::SgetObjectVolatile => (true, false, Shape::Object),
                Opcode::SputObjectVolatile => (true, true, Shape::Object),
                _ => return None,
            },
        };
        Some(FieldAccess {
            is_static,
            is_put,
            shape,
        })
    }
}

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_object_ops(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let op = opcode(inst)?;

        match op {
            // check-cast vAA, type@BBBB
            Opcode::CheckCast => {
                let obj = self.regs.get_object(w, inst_aa(inst))?;
                if obj.is_null() {
                    return Ok(frame.advance(2));
                }
                let class = match rt.resolve_class(frame.method, frame.unit(1)? as u32) {
                    Ok(class) => class,
                    Err(exception) => return frame.throw(exception),
                };
                if rt.is_instance_of(obj, class) {
                    return Ok(frame.advance(2));
                }
                let actual = rt.class_name(rt.class_of(obj));
                let desired = rt.class_name(class);
                let message = ExceptionKind::cast_message(&actual, &desired);
                frame.raise(rt, ExceptionKind::ClassCast, Some(&message))
            }

            // instance-of vA, vB, type@CCCC
            Opcode::InstanceOf => {
                let obj = self.regs.get_object(w, inst_b(inst))?;
                let result = if obj.is_null() {
                    false
                } else {
                    match rt.resolve_class(frame.method, frame.unit(1)? as u32) {
                        Ok(class) => rt.is_instance_of(obj, class),
                        Err(exception) => return frame.throw(exception),
                    }
                };
                self.regs.set_int(w, inst_a(inst), result as i32)?;
                Ok(frame.advance(2))
            }

            // new-instance vAA, type@BBBB
            Opcode::NewInstance => {
                let created = rt
                    .resolve_class(frame.method, frame.unit(1)? as u32)
                    .and_then(|class| rt.new_object(class));
                match created {
                    Ok(obj) => {
                        self.regs.set_object(w, inst_aa(inst), obj)?;
                        Ok(frame.advance(2))
                    }
                    Err(exception) => frame.throw(exception),
                }
            }

            _ => match FieldAccess::of(op) {
                Some(access) => self.exec_field_op(rt, frame, inst, access),
                None => Err(VmError::UnexpectedState("not an object opcode")),
            },
        }
    }

    /// Instance forms are `op vA, vB, field@CCCC` (object in `vB`); static
    /// forms are `op vAA, field@BBBB`
    fn exec_field_op(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
        access: FieldAccess,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let field_idx = frame.unit(1)? as u32;

        let (reg, instance) = if access.is_static {
            (inst_aa(inst), None)
        } else {
            let obj = self.regs.get_object(w, inst_b(inst))?;
            if obj.is_null() {
                return frame.raise_npe(rt);
            }
            (inst_a(inst), Some(obj))
        };

        if access.is_put {
            let value = match access.shape {
                Shape::Narrow => RegValue::Narrow(self.regs.get(w, reg)?),
                Shape::Wide => RegValue::Wide(self.regs.get_wide(w, reg)?),
                Shape::Object => RegValue::Ref(self.regs.get_object(w, reg)?),
            };
            if let Err(exception) = rt.resolve_set_field(frame.method, field_idx, instance, value) {
                return frame.throw(exception);
            }
        } else {
            let value = match rt.resolve_field(frame.method, field_idx, instance) {
                Ok(value) => value,
                Err(exception) => return frame.throw(exception),
            };
            match access.shape {
                Shape::Narrow => self.regs.set(w, reg, value.narrow_bits())?,
                Shape::Wide => self.regs.set_wide(w, reg, value.wide_bits())?,
                Shape::Object => self.regs.set_object(w, reg, ObjRef::from_raw(value.narrow_bits()))?,
            }
        }
        Ok(frame.advance(2))
    }
}
