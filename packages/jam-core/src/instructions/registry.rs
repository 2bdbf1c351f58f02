//! Instruction registry: opcode → handler.

use std::collections::HashMap;

use crate::instructions::base::InstructionHandler;

pub struct InstructionRegistry {
    handlers: HashMap<u8, Box<dyn InstructionHandler>>,
}

impl InstructionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: Box<dyn InstructionHandler>) {
        let opcode = handler.opcode();
        let previous = self.handlers.insert(opcode, handler);
        debug_assert!(previous.is_none(), "duplicate opcode {opcode}");
    }

    #[must_use]
    pub fn get(&self, opcode: u8) -> Option<&dyn InstructionHandler> {
        self.handlers.get(&opcode).map(Box::as_ref)
    }

    #[must_use]
    pub fn contains(&self, opcode: u8) -> bool {
        self.handlers.contains_key(&opcode)
    }

    #[must_use]
    pub fn opcodes(&self) -> Vec<u8> {
        self.handlers.keys().copied().collect()
    }
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
