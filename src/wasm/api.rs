//! WASM API for the 316/516 simulator.
//!
//! Provides JavaScript-callable interfaces for CPU control, state inspection
//! and I/O devices written in JavaScript.

use crate::{
    CpuConfig, DeviceInfo, IoContext, IoDevice, IoOp, IoResult, StopReason, CPU,
};
use wasm_bindgen::prelude::*;

/// I/O device backed by a JavaScript function.
///
/// The function is called as `callback(op, fnc, data, dev)` with the
/// numeric [`IoOp::code`] and must return the packed result: data in bits
/// 0..15, skip at bit 16, stop code from bit 17 up. A callback that throws
/// or returns a non-number stops the simulator with an illegal device stop.
struct JsDevice {
    callback: js_sys::Function,
}

impl IoDevice for JsDevice {
    fn io(&mut self, op: IoOp, fnc: u8, data: u16, dev: u8, _ctx: &mut IoContext) -> IoResult {
        let args = js_sys::Array::of4(
            &JsValue::from(op.code()),
            &JsValue::from(fnc),
            &JsValue::from(data),
            &JsValue::from(dev),
        );
        match self
            .callback
            .apply(&JsValue::NULL, &args)
            .ok()
            .and_then(|value| value.as_f64())
        {
            Some(packed) => IoResult::unpack(packed as u32),
            None => IoResult::stop(StopReason::IllegalDevice, data),
        }
    }
}

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
    code: u16,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
            code: 0,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }

    /// Numeric stop code, 0 for errors that are not simulator stops
    #[wasm_bindgen(getter)]
    pub fn code(&self) -> u16 {
        self.code
    }
}

impl From<StopReason> for JsError {
    fn from(reason: StopReason) -> Self {
        JsError {
            message: reason.to_string(),
            code: reason.code(),
        }
    }
}

/// Main simulator interface for JavaScript
#[wasm_bindgen]
pub struct Emulator316 {
    cpu: CPU,
}

#[wasm_bindgen]
impl Emulator316 {
    /// Create a simulator with `memory_words` of core and the default options
    #[wasm_bindgen(constructor)]
    pub fn new(memory_words: usize) -> Result<Emulator316, JsError> {
        let config = CpuConfig::default().with_memory_size(memory_words);
        let cpu = CPU::new(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Emulator316 { cpu })
    }

    /// Execute a single cycle
    pub fn step(&mut self) -> Result<(), JsError> {
        self.cpu.step().map_err(JsError::from)
    }

    /// Execute up to `max` cycles and return the number executed
    pub fn run(&mut self, max: u32) -> Result<u32, JsError> {
        self.cpu
            .run(max as u64)
            .map(|n| n as u32)
            .map_err(JsError::from)
    }

    /// Reset the CPU and every device; memory is kept
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    // Register getters
    #[wasm_bindgen(getter)]
    pub fn a(&self) -> u16 {
        self.cpu.a()
    }

    #[wasm_bindgen(getter)]
    pub fn b(&self) -> u16 {
        self.cpu.b()
    }

    #[wasm_bindgen(getter)]
    pub fn x(&self) -> u16 {
        self.cpu.x()
    }

    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    #[wasm_bindgen(getter)]
    pub fn c(&self) -> bool {
        self.cpu.c()
    }

    #[wasm_bindgen(getter)]
    pub fn sc(&self) -> u8 {
        self.cpu.sc()
    }

    #[wasm_bindgen(getter)]
    pub fn extended_mode(&self) -> bool {
        self.cpu.extended_mode()
    }

    #[wasm_bindgen(getter)]
    pub fn double_precision(&self) -> bool {
        self.cpu.dp()
    }

    #[wasm_bindgen(getter)]
    pub fn cycles(&self) -> f64 {
        self.cpu.cycles() as f64 // Convert u64 to f64 for JavaScript
    }

    // Register setters

    pub fn set_a(&mut self, value: u16) {
        self.cpu.set_a(value);
    }

    pub fn set_b(&mut self, value: u16) {
        self.cpu.set_b(value);
    }

    pub fn set_x(&mut self, value: u16) {
        self.cpu.set_x(value);
    }

    /// Set the program counter
    pub fn set_pc(&mut self, addr: u16) {
        self.cpu.set_pc(addr);
    }

    pub fn set_c(&mut self, value: bool) {
        self.cpu.set_c(value);
    }

    // Operator controls

    /// Set sense switch 1..4
    pub fn set_sense_switch(&mut self, n: u8, on: bool) {
        self.cpu.set_sense_switch(n, on);
    }

    /// Press the START button
    pub fn press_start(&mut self) {
        self.cpu.lines_mut().press_start();
    }

    /// Raise standard interrupt request line `line`
    pub fn request_interrupt(&mut self, line: u8) {
        self.cpu.lines_mut().request(line);
    }

    /// Drop standard interrupt request line `line`
    pub fn clear_interrupt(&mut self, line: u8) {
        self.cpu.lines_mut().clear(line);
    }

    /// Raise extended interrupt line `line`
    pub fn request_extended_interrupt(&mut self, line: u8) {
        self.cpu.lines_mut().request_extended(line);
    }

    pub fn add_breakpoint(&mut self, addr: u16) {
        self.cpu.breakpoints_mut().add_execute(addr);
    }

    pub fn remove_breakpoint(&mut self, addr: u16) -> bool {
        self.cpu.breakpoints_mut().remove_execute(addr)
    }

    // Devices

    /// Attach a JavaScript device at `number`, occupying `slots` numbers
    pub fn attach_device(
        &mut self,
        number: u8,
        slots: u8,
        callback: js_sys::Function,
    ) -> Result<(), JsError> {
        let info = DeviceInfo::new(number).with_slots(slots);
        self.cpu
            .attach_device(info, Box::new(JsDevice { callback }))
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Detach the device at `number`; returns false if none was attached
    pub fn detach_device(&mut self, number: u8) -> bool {
        self.cpu.detach_device(number).is_some()
    }

    // Memory access methods

    /// Read a single word from memory
    pub fn read_memory(&self, addr: u16) -> u16 {
        self.cpu.memory().read(addr)
    }

    /// Write a single word to memory
    pub fn write_memory(&mut self, addr: u16, value: u16) {
        self.cpu.memory_mut().write(addr, value);
    }

    /// Read `len` words starting at `start` (for efficient display)
    pub fn get_memory_block(&self, start: u16, len: u16) -> Vec<u16> {
        (0..len)
            .map(|i| self.cpu.memory().read(start.wrapping_add(i)))
            .collect()
    }

    /// Load a program into memory and set PC
    pub fn load_program(&mut self, program: &[u16], start_addr: u16) {
        self.cpu.memory_mut().load(start_addr, program);
        self.cpu.set_pc(start_addr);
    }

    /// Recorded instruction history, one line per entry
    pub fn history(&self) -> Vec<JsValue> {
        self.cpu
            .history()
            .iter()
            .map(|entry| JsValue::from_str(&entry.to_string()))
            .collect()
    }

    /// Enable instruction history with `entries` slots (0 disables it)
    pub fn set_history_length(&mut self, entries: usize) -> Result<(), JsError> {
        self.cpu
            .set_history_length(entries)
            .map_err(|e| JsError::new(&e.to_string()))
    }
}
