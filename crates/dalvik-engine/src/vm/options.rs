//! Interpreter configuration

use serde::{Deserialize, Serialize};

use crate::vm::register_file::DEFAULT_MAX_SIZE;

/// Options for creating an [`Interpreter`](crate::vm::Interpreter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Maximum number of nested activations
    pub max_call_depth: usize,

    /// Maximum register slots across all live activations
    pub max_registers: usize,

    /// Emit a `trace!` event for every dispatched instruction
    pub trace_instructions: bool,

    /// Route every invoke through the host, even to interpretable callees
    pub prefer_host_calls: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
            max_registers: DEFAULT_MAX_SIZE,
            trace_instructions: false,
            prefer_host_calls: false,
        }
    }
}

impl InterpreterOptions {
    /// Parse options from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Set the nesting limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the register file size
    pub fn with_max_registers(mut self, slots: usize) -> Self {
        self.max_registers = slots;
        self
    }

    /// Enable per-instruction tracing
    pub fn with_trace_instructions(mut self, enabled: bool) -> Self {
        self.trace_instructions = enabled;
        self
    }

    /// Force the host-call back-end for every invoke
    pub fn with_prefer_host_calls(mut self, enabled: bool) -> Self {
        self.prefer_host_calls = enabled;
        self
    }
}
