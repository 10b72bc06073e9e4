//! Interpreter state and the dispatch loop

use std::sync::Arc;

use tracing::{debug, trace};

use crate::bytecode::{format_instruction, CodeItem};
use crate::vm::interpreter::dispatch::OPCODE_TABLE;
use crate::vm::interpreter::execution::{Flow, Outcome};
use crate::vm::interpreter::frame::Frame;
use crate::vm::interpreter::invoke::ArgList;
use crate::vm::interpreter::unwind::unwind;
use crate::vm::options::InterpreterOptions;
use crate::vm::register_file::{RegisterFile, RegisterFileStats};
use crate::vm::runtime::{HostCall, Runtime};
use crate::vm::value::{MethodRef, ObjRef, Shorty, Value};
use crate::vm::{VmError, VmResult};

/// Register-machine interpreter for Dalvik bytecode
///
/// Owns the register file shared by all nested activations. The host
/// runtime is passed to every call rather than stored, so a host may
/// re-enter through a fresh interpreter while one is running.
#[derive(Debug)]
pub struct Interpreter {
    /// Register windows of all live activations
    pub(in crate::vm::interpreter) regs: RegisterFile,
    /// Configuration
    pub(in crate::vm::interpreter) options: InterpreterOptions,
    /// Number of live activations
    pub(in crate::vm::interpreter) depth: usize,
}

impl Interpreter {
    /// Create an interpreter with default options
    pub fn new() -> Self {
        Self::with_options(InterpreterOptions::default())
    }

    /// Create an interpreter with specific options
    pub fn with_options(options: InterpreterOptions) -> Self {
        Self {
            regs: RegisterFile::with_max_size(options.max_registers),
            options,
            depth: 0,
        }
    }

    /// Create the interpreter a host uses to run a bytecode body it was
    /// asked to call
    ///
    /// Inherits the caller's options and continues its depth count, so the
    /// call depth limit spans host re-entry.
    pub fn for_host_call(call: &HostCall<'_>) -> Self {
        let mut interpreter = Self::with_options(call.options.clone());
        interpreter.depth = call.depth;
        interpreter
    }

    /// Active options
    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    /// Number of live activations (between calls, 0 or the inherited depth)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Register file usage
    pub fn register_stats(&self) -> RegisterFileStats {
        self.regs.stats()
    }

    /// Run `method` to completion
    ///
    /// `receiver` is required for instance methods and must be `None` for
    /// static ones; `args` are the parameters in declaration order. Their
    /// slots must fill the method's `ins_size` exactly.
    pub fn call(
        &mut self,
        rt: &mut dyn Runtime,
        method: MethodRef,
        receiver: Option<ObjRef>,
        args: &[Value],
    ) -> VmResult<Outcome> {
        let code = rt
            .method_body(method)
            .ok_or(VmError::UnexpectedState("method has no interpretable body"))?;
        let shorty = rt
            .shorty(method)
            .ok_or_else(|| VmError::InvalidShorty(format!("<no shorty for method {}>", method.0)))?;
        let args = ArgList {
            receiver,
            values: args.to_vec(),
        };
        self.interpret(rt, method, code, &shorty, &args)
    }

    /// Run one activation of `code` with `args` in its parameter registers
    pub(in crate::vm::interpreter) fn interpret(
        &mut self,
        rt: &mut dyn Runtime,
        method: MethodRef,
        code: Arc<CodeItem>,
        shorty: &Shorty,
        args: &ArgList,
    ) -> VmResult<Outcome> {
        if self.depth >= self.options.max_call_depth {
            return Err(VmError::StackOverflow { depth: self.depth });
        }
        if code.ins_size > code.registers_size {
            return Err(VmError::MalformedCodeItem(format!(
                "ins_size {} exceeds registers_size {}",
                code.ins_size, code.registers_size
            )));
        }

        let window = self.regs.alloc_frame(code.registers_size)?;
        self.depth += 1;
        debug!(
            method = method.0,
            registers = code.registers_size,
            depth = self.depth,
            "enter activation"
        );

        let mut frame = Frame::new(method, code, window);
        let result = match args.store(&mut self.regs, window, &frame.code) {
            Ok(()) => self.run(rt, &mut frame, shorty),
            Err(e) => Err(e),
        };

        self.depth -= 1;
        self.regs.free_frame(window);
        debug!(method = method.0, depth = self.depth, outcome = ?result, "exit activation");
        result
    }

    /// The dispatch loop
    fn run(&mut self, rt: &mut dyn Runtime, frame: &mut Frame, shorty: &Shorty) -> VmResult<Outcome> {
        loop {
            let inst = frame.unit(0)?;

            if self.options.trace_instructions {
                let text = format_instruction(&frame.code.insns, frame.pc as usize)
                    .map_or_else(|| "<truncated>".to_string(), |(text, _)| text);
                trace!(method = frame.method.0, pc = frame.pc, insn = %text, "dispatch");
            }

            let mut flow = (OPCODE_TABLE.get(inst as u8))(self, rt, frame, inst)?;
            if let Flow::Invoke(request) = flow {
                flow = self.dispatch_invoke(rt, frame, request)?;
            }

            match flow {
                Flow::Continue => {}
                Flow::Return(value) => {
                    return Ok(Outcome::Returned(value.coerce(shorty.return_type())));
                }
                Flow::Throw => {
                    if !unwind(rt, frame)? {
                        let exception = frame
                            .pending
                            .take()
                            .ok_or(VmError::UnexpectedState("throw without a pending exception"))?;
                        return Ok(Outcome::Threw(exception));
                    }
                }
                Flow::Invoke(_) => return Err(VmError::UnexpectedState("nested invoke request")),
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
