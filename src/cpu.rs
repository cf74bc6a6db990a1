//! # CPU State and Execution
//!
//! This module contains the CPU struct representing the 316/516 processor
//! state and the fetch-decode-execute loop.
//!
//! ## CPU State
//!
//! The CPU maintains:
//! - **Registers**: A, B and the C (carry/overflow) flag. The index register
//!   X is not a latch: it is the memory cell at location 0 (extended mode) or
//!   at the base of the current 16K bank (non-extended mode)
//! - **Program counter** (PC): 15-bit address of the next instruction
//! - **Modes**: extended addressing, double precision, the shift counter
//!   (SC) and the mode in effect before the last interrupt
//! - **Machine**: core memory, interrupt and channel request lines, the
//!   device table and the DMA channel registers
//!
//! ## Execution Model
//!
//! Each call to [`CPU::step`] runs one machine cycle:
//!
//! 1. Service every DMA/DMC channel with a request outstanding
//! 2. Take a standard interrupt if one is pending, else the highest priority
//!    extended interrupt, by executing a synthesized `JST*` through the
//!    interrupt vector
//! 3. Otherwise fetch the word at the PC (checking execute breakpoints),
//!    advance the PC and execute it
//!
//! Every condition that stops the simulator comes back as a [`StopReason`].

use crate::addressing::merge_address;
use crate::breakpoints::Breakpoints;
use crate::config::{validate_history_length, validate_memory_size, ConfigError, CpuConfig};
use crate::devices::channels::{self, Channel, ChannelState, DMA_IN, DMA_MAX, DMA_WCMASK};
use crate::devices::interrupts::IoLines;
use crate::devices::{DeviceError, DeviceInfo, DeviceTable, IoDevice};
use crate::history::{History, HistoryEntry, PcQueue};
use crate::instructions::{control, io, memref, operate, shifts, skip};
use crate::memory::{CoreMemory, MemoryError, X_AMASK};
use crate::opcodes::{decode, InstructionClass, IA};
use crate::StopReason;
use log::{debug, trace};

/// Standard interrupt vector location.
pub const STD_INT_VECTOR: u16 = 0o63;

/// Vector location of extended interrupt line 0; line n uses `0o64 + n`.
pub const EXT_INT_VECTOR: u16 = 0o64;

/// JST opcode, as executed when an interrupt is taken.
const JST: u16 = 0o020000;

/// Number of sense switches.
pub const SENSE_SWITCHES: u8 = 4;

/// 316/516 CPU state and execution context.
///
/// # Examples
///
/// ```
/// use lib316::{CpuConfig, StopReason, CPU};
///
/// let mut cpu = CPU::new(CpuConfig::default()).unwrap();
///
/// // CRA, AOA, HLT
/// cpu.memory_mut().load(0o100, &[0o140040, 0o141206, 0o000000]);
/// cpu.set_pc(0o100);
///
/// assert_eq!(cpu.run(10), Err(StopReason::Halt));
/// assert_eq!(cpu.a(), 1);
/// assert_eq!(cpu.cycles(), 3);
/// ```
pub struct CPU {
    /// A register
    pub(crate) a: u16,

    /// B register
    pub(crate) b: u16,

    /// Program counter (address of next instruction)
    pub(crate) pc: u16,

    /// Carry/overflow flag
    pub(crate) c: bool,

    /// Extended addressing mode
    pub(crate) ext: bool,

    /// Extended mode before the last interrupt
    pub(crate) pme: bool,

    /// DXA executed: leave extended mode at the next JMP
    pub(crate) extoff_pending: bool,

    /// Double precision mode
    pub(crate) dp: bool,

    /// Shift counter
    pub(crate) sc: u8,

    /// Sense switches 1..4 as bits 0..3
    sense_switches: u8,

    pub(crate) memory: CoreMemory,
    pub(crate) lines: IoLines,
    pub(crate) devices: DeviceTable,

    /// DMA channel registers
    pub(crate) dma: [ChannelState; DMA_MAX],

    pub(crate) config: CpuConfig,
    breakpoints: Breakpoints,
    pub(crate) history: History,
    pub(crate) pc_queue: PcQueue,

    /// Location of the instruction being executed
    pub(crate) fetch_pc: u16,

    /// Execute breakpoint that stopped the last step, skipped once on resume
    last_break: Option<u16>,

    /// Instructions executed (interrupts included)
    cycles: u64,
}

impl CPU {
    /// Creates a CPU with zeroed memory and registers.
    ///
    /// Fails if the configuration is invalid.
    pub fn new(config: CpuConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            a: 0,
            b: 0,
            pc: 0,
            c: false,
            ext: false,
            pme: false,
            extoff_pending: false,
            dp: false,
            sc: 0,
            sense_switches: 0,
            memory: CoreMemory::new(config.memory_size),
            lines: IoLines::default(),
            devices: DeviceTable::new(),
            dma: [ChannelState::default(); DMA_MAX],
            history: History::new(config.history_length),
            config,
            breakpoints: Breakpoints::default(),
            pc_queue: PcQueue::default(),
            fetch_pc: 0,
            last_break: None,
            cycles: 0,
        })
    }

    /// Executes one machine cycle: channel service, then an interrupt or one
    /// instruction.
    ///
    /// Side effects committed before a stop is detected are kept.
    pub fn step(&mut self) -> Result<(), StopReason> {
        let result = self.cycle();
        if let Err(reason) = result {
            debug!("stop at {:06o}: {}", self.pc, reason);
        }
        result
    }

    /// Runs up to `max_instructions` cycles.
    ///
    /// Returns the number of cycles run, or the reason execution stopped.
    pub fn run(&mut self, max_instructions: u64) -> Result<u64, StopReason> {
        let start = self.cycles;
        while self.cycles - start < max_instructions {
            self.step()?;
        }
        Ok(self.cycles - start)
    }

    fn cycle(&mut self) -> Result<(), StopReason> {
        if self.lines.chan_req != 0 {
            channels::service(
                &mut self.dma,
                &mut self.devices,
                &mut self.memory,
                &mut self.lines,
            )?;
        }

        let ir = if self.lines.standard_pending() {
            self.take_interrupt(STD_INT_VECTOR)
        } else if let Some(line) = self.take_extended() {
            self.take_interrupt(EXT_INT_VECTOR + line as u16)
        } else {
            self.fetch()?
        };
        self.lines.clear_start();
        self.cycles += 1;
        self.execute(ir)
    }

    fn take_extended(&mut self) -> Option<u8> {
        if !self.config.extended_interrupts {
            return None;
        }
        self.lines.take_extended()
    }

    /// Enters an interrupt: returns `JST* vector` for execution.
    fn take_interrupt(&mut self, vector: u16) -> u16 {
        self.pme = self.ext;
        if self.config.extended_addressing {
            self.ext = true;
        }
        self.lines.inhibit();
        debug!("interrupt at {:06o}, vector {:03o}", self.pc, vector);

        let ir = IA | JST | vector;
        self.fetch_pc = self.pc;
        self.record_history(ir, true);
        ir
    }

    fn fetch(&mut self) -> Result<u16, StopReason> {
        if self.last_break.take() != Some(self.pc) && self.breakpoints.is_execute(self.pc) {
            self.last_break = Some(self.pc);
            return Err(StopReason::Breakpoint { address: self.pc });
        }

        let ir = self.memory.read(self.pc);
        self.fetch_pc = self.pc;
        self.record_history(ir, false);
        self.pc = merge_address(self.pc, self.pc.wrapping_add(1), self.ext);
        self.lines.set_nodefer();
        Ok(ir)
    }

    fn execute(&mut self, ir: u16) -> Result<(), StopReason> {
        trace!(
            "{:06o}: {:06o}  A={:06o} B={:06o} X={:06o} C={}",
            self.fetch_pc,
            ir,
            self.a,
            self.b,
            self.x(),
            self.c as u8
        );
        match decode(ir) {
            InstructionClass::MemoryReference(op) => memref::execute(self, op, ir),
            InstructionClass::Control => control::execute(self, ir),
            InstructionClass::Shift => shifts::execute(self, ir),
            InstructionClass::Skip => {
                skip::execute(self, ir);
                Ok(())
            }
            InstructionClass::Operate => operate::execute(self, ir),
            InstructionClass::Io(op) => io::execute(self, op, ir),
        }
    }

    fn record_history(&mut self, ir: u16, interrupt: bool) {
        if !self.history.is_enabled() {
            return;
        }
        let entry = HistoryEntry {
            pc: self.fetch_pc,
            ir,
            a: self.a,
            b: self.b,
            x: self.x(),
            c: self.c,
            ea: None,
            operand: 0,
            interrupt,
        };
        self.history.record(entry);
    }

    // ========== Helpers for instruction execution ==========

    /// CPU store: goes through the write gate, then checks write breakpoints
    /// (also for stores the gate discarded).
    pub(crate) fn write(&mut self, addr: u16, value: u16) -> Result<(), StopReason> {
        self.memory.write_gated(addr, value);
        if self.breakpoints.is_write(addr) {
            return Err(StopReason::WriteBreakpoint { address: addr });
        }
        Ok(())
    }

    /// Skips `n` words, wrapping inside the current bank.
    pub(crate) fn skip(&mut self, n: u16) {
        self.pc = merge_address(self.pc, self.pc.wrapping_add(n), self.ext);
    }

    /// Outcome of a reserved instruction under the current stop toggle.
    pub(crate) fn reserved(&self) -> Result<(), StopReason> {
        if self.config.stop_on_illegal_instruction {
            return Err(StopReason::ReservedInstruction);
        }
        Ok(())
    }

    /// Location of the index register.
    pub(crate) fn xr_address(&self) -> u16 {
        if self.ext {
            0
        } else {
            self.pc & 0o040000
        }
    }

    // ========== Register Getters ==========

    /// Returns the A register value.
    pub fn a(&self) -> u16 {
        self.a
    }

    /// Returns the B register value.
    pub fn b(&self) -> u16 {
        self.b
    }

    /// Returns the index register: the word at its shadow location.
    pub fn x(&self) -> u16 {
        self.memory.read(self.xr_address())
    }

    /// Returns the program counter value.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Returns true if the C flag is set.
    pub fn c(&self) -> bool {
        self.c
    }

    /// Returns true in double precision mode.
    pub fn dp(&self) -> bool {
        self.dp
    }

    /// Returns the shift counter.
    pub fn sc(&self) -> u8 {
        self.sc
    }

    /// Returns true in extended addressing mode.
    pub fn extended_mode(&self) -> bool {
        self.ext
    }

    /// Returns the addressing mode in effect before the last interrupt.
    pub fn previous_extended_mode(&self) -> bool {
        self.pme
    }

    /// Returns true if a DXA is waiting for the next JMP.
    pub fn extend_off_pending(&self) -> bool {
        self.extoff_pending
    }

    /// Returns the number of cycles (instructions and interrupts) executed.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Location of the instruction executed last.
    pub fn fetch_pc(&self) -> u16 {
        self.fetch_pc
    }

    // ========== Register Setters ==========

    pub fn set_a(&mut self, value: u16) {
        self.a = value;
    }

    pub fn set_b(&mut self, value: u16) {
        self.b = value;
    }

    /// Sets the index register by writing its shadow location.
    pub fn set_x(&mut self, value: u16) {
        let addr = self.xr_address();
        self.memory.write(addr, value);
    }

    /// Sets the PC (15 bits). Forgets a pending breakpoint resume.
    pub fn set_pc(&mut self, value: u16) {
        self.pc = value & X_AMASK;
        self.last_break = None;
    }

    pub fn set_c(&mut self, value: bool) {
        self.c = value;
    }

    pub fn set_dp(&mut self, value: bool) {
        self.dp = value;
    }

    /// Sets the shift counter (6 bits).
    pub fn set_sc(&mut self, value: u8) {
        self.sc = value & 0o77;
    }

    pub fn set_extended_mode(&mut self, value: bool) {
        self.ext = value;
    }

    /// Returns a snapshot of every register.
    pub fn registers(&self) -> Registers {
        Registers {
            a: self.a,
            b: self.b,
            x: self.x(),
            pc: self.pc,
            c: self.c,
            ext: self.ext,
            pme: self.pme,
            dp: self.dp,
            sc: self.sc,
            extoff_pending: self.extoff_pending,
        }
    }

    /// Restores a register snapshot. X is written after PC and the mode, so
    /// it lands at the snapshot's shadow location.
    pub fn set_registers(&mut self, regs: &Registers) {
        self.a = regs.a;
        self.b = regs.b;
        self.set_pc(regs.pc);
        self.c = regs.c;
        self.ext = regs.ext;
        self.pme = regs.pme;
        self.dp = regs.dp;
        self.set_sc(regs.sc);
        self.extoff_pending = regs.extoff_pending;
        self.set_x(regs.x);
    }

    // ========== Machine Access ==========

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn memory(&self) -> &CoreMemory {
        &self.memory
    }

    /// Direct memory access (no write gate, no breakpoints).
    pub fn memory_mut(&mut self) -> &mut CoreMemory {
        &mut self.memory
    }

    pub fn lines(&self) -> &IoLines {
        &self.lines
    }

    /// Interrupt and channel request lines, for front panels and tests.
    pub fn lines_mut(&mut self) -> &mut IoLines {
        &mut self.lines
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breakpoints
    }

    /// Sense switch `n` (1..=4).
    pub fn sense_switch(&self, n: u8) -> bool {
        (1..=SENSE_SWITCHES).contains(&n) && self.sense_switches & (1 << (n - 1)) != 0
    }

    /// Sets sense switch `n` (1..=4); other numbers are ignored.
    pub fn set_sense_switch(&mut self, n: u8, on: bool) {
        if !(1..=SENSE_SWITCHES).contains(&n) {
            return;
        }
        if on {
            self.sense_switches |= 1 << (n - 1);
        } else {
            self.sense_switches &= !(1 << (n - 1));
        }
    }

    /// Examines a word of installed memory.
    pub fn examine(&self, addr: u32) -> Result<u16, MemoryError> {
        self.memory.examine(addr)
    }

    /// Deposits a word into installed memory. Depositing at the index
    /// register's shadow location changes X.
    pub fn deposit(&mut self, addr: u32, value: u16) -> Result<(), MemoryError> {
        if !self.memory.exists(addr) {
            return Err(MemoryError::NonExistent(addr));
        }
        self.memory.write(addr as u16, value);
        Ok(())
    }

    /// Changes the installed memory size, zero-filling everything above it.
    ///
    /// Returns the number of non-zero words discarded.
    pub fn set_memory_size(&mut self, words: usize) -> Result<usize, ConfigError> {
        validate_memory_size(words)?;
        self.config.memory_size = words;
        Ok(self.memory.resize(words))
    }

    /// Changes the history length (0 disables it), discarding the history.
    pub fn set_history_length(&mut self, entries: usize) -> Result<(), ConfigError> {
        validate_history_length(entries)?;
        self.config.history_length = entries;
        self.history.set_capacity(entries);
        Ok(())
    }

    /// Recorded instruction history, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    /// Locations jumps were taken from, newest first.
    pub fn pc_queue(&self) -> &PcQueue {
        &self.pc_queue
    }

    // ========== Devices and Channels ==========

    /// Attaches a device.
    ///
    /// Besides the table's own conflict checks, the device's channel must be
    /// installed: DMA channels up to the configured count, DMC channels only
    /// with the DMC option.
    pub fn attach_device(
        &mut self,
        info: DeviceInfo,
        device: Box<dyn IoDevice>,
    ) -> Result<(), DeviceError> {
        if let Some(channel) = info.channel {
            if !self.channel_installed(channel) {
                return Err(DeviceError::ChannelOutOfRange { channel });
            }
        }
        self.devices.attach(info, device)
    }

    /// Detaches the device answering at `number`.
    pub fn detach_device(&mut self, number: u8) -> Option<Box<dyn IoDevice>> {
        self.devices.detach(number)
    }

    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    fn channel_installed(&self, channel: Channel) -> bool {
        match channel {
            Channel::Dma(n) => (1..=self.config.dma_channels).contains(&n),
            Channel::Dmc(_) => self.config.dmc && channel.index().is_some(),
        }
    }

    /// Registers of DMA channel `n` (1..=4).
    pub fn dma_channel(&self, n: u8) -> Option<ChannelState> {
        let index = Channel::Dma(n).index()?;
        Some(self.dma[index])
    }

    /// Sets up DMA channel `n` at `address` with a word count of `words`, as a
    /// program would with OTA 024.
    ///
    /// The range counter is loaded with the one's complement of `words`, so
    /// `words` transfers leave it at all ones and the next transfer wraps it
    /// to zero and signals end of range.
    pub fn configure_dma(
        &mut self,
        n: u8,
        address: u16,
        input: bool,
        words: u16,
    ) -> Result<(), DeviceError> {
        let channel = Channel::Dma(n);
        if !self.channel_installed(channel) {
            return Err(DeviceError::ChannelOutOfRange { channel });
        }
        let state = &mut self.dma[n as usize - 1];
        let direction = if input { DMA_IN } else { 0 };
        state.load_address(direction | (address & X_AMASK));
        state.word_count = !words & DMA_WCMASK;
        Ok(())
    }

    /// Writes the control block of DMC channel `n` (1..=16) for a transfer
    /// of `start..=end`.
    pub fn configure_dmc(
        &mut self,
        n: u8,
        start: u16,
        end: u16,
        input: bool,
    ) -> Result<(), DeviceError> {
        let channel = Channel::Dmc(n);
        let block = match channel.dmc_block() {
            Some(block) if self.channel_installed(channel) => block,
            _ => return Err(DeviceError::ChannelOutOfRange { channel }),
        };
        let direction = if input { DMA_IN } else { 0 };
        self.memory.write(block, direction | (start & X_AMASK));
        self.memory.write(block + 1, end & X_AMASK);
        Ok(())
    }

    /// Resets the processor and every device.
    ///
    /// Clears the modes, the shift counter, DMA registers, interrupt
    /// requests and masks, channel requests and the PC change queue.
    /// A, B, C, the PC and memory keep their values.
    pub fn reset(&mut self) {
        self.ext = false;
        self.pme = false;
        self.extoff_pending = false;
        self.dp = false;
        self.sc = 0;
        self.dma = [ChannelState::default(); DMA_MAX];
        self.lines.reset();
        self.devices.reset_all();
        self.pc_queue.reset();
        self.last_break = None;
        debug!("CPU reset");
    }
}

/// Snapshot of the processor registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub a: u16,
    pub b: u16,
    pub x: u16,
    pub pc: u16,
    pub c: bool,
    /// Extended addressing mode
    pub ext: bool,
    /// Mode before the last interrupt
    pub pme: bool,
    /// Double precision mode
    pub dp: bool,
    pub sc: u8,
    pub extoff_pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IoContext, IoOp, IoResult};

    fn cpu() -> CPU {
        CPU::new(CpuConfig::default()).unwrap()
    }

    #[test]
    fn test_cpu_initialization() {
        let cpu = cpu();
        assert_eq!(cpu.a(), 0);
        assert_eq!(cpu.b(), 0);
        assert_eq!(cpu.pc(), 0);
        assert!(!cpu.c());
        assert!(!cpu.extended_mode());
        assert_eq!(cpu.cycles(), 0);
        assert_eq!(cpu.memory().size(), 32768);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CpuConfig::default().with_memory_size(1000);
        assert_eq!(
            CPU::new(config).err(),
            Some(ConfigError::MemorySize(1000))
        );
    }

    #[test]
    fn test_lda_sector_zero_scenario() {
        let mut cpu = cpu();
        cpu.memory_mut().write(0, 0);
        cpu.memory_mut().write(1, 0o004010);
        cpu.memory_mut().write(0o10, 0o123456);
        cpu.set_pc(1);
        cpu.step().unwrap();
        assert_eq!(cpu.a(), 0o123456);
        assert_eq!(cpu.pc(), 2);
    }

    #[test]
    fn test_noop_control_word_changes_nothing() {
        let mut cpu = cpu();
        cpu.set_a(0o123);
        cpu.set_b(0o456);
        cpu.set_c(true);
        cpu.set_sc(0o17);
        cpu.set_pc(0o1000);
        cpu.memory_mut().write(0o1000, 0o000001);
        let before = cpu.registers();

        cpu.step().unwrap();

        let after = cpu.registers();
        assert_eq!(after, Registers { pc: 0o1001, ..before });
    }

    #[test]
    fn test_write_gate_protects_low_memory() {
        let mut cpu = cpu();
        cpu.set_a(0o7777);
        cpu.set_pc(0o1000);
        // STA 05, STA 0, STA 020
        cpu.memory_mut()
            .load(0o1000, &[0o010005, 0o010000, 0o010020]);
        cpu.run(3).unwrap();
        assert_eq!(cpu.memory().read(0o5), 0);
        assert_eq!(cpu.memory().read(0o0), 0o7777);
        assert_eq!(cpu.memory().read(0o20), 0o7777);
    }

    #[test]
    fn test_write_breakpoint_fires_on_discarded_store() {
        let mut cpu = cpu();
        cpu.breakpoints_mut().add_write(0o5);
        cpu.set_pc(0o1000);
        cpu.memory_mut().write(0o1000, 0o010005);
        assert_eq!(
            cpu.step(),
            Err(StopReason::WriteBreakpoint { address: 0o5 })
        );
        assert_eq!(cpu.memory().read(0o5), 0);
    }

    #[test]
    fn test_execute_breakpoint_resumes() {
        let mut cpu = cpu();
        cpu.breakpoints_mut().add_execute(0o1001);
        cpu.set_pc(0o1000);
        // NOP, NOP
        cpu.memory_mut().load(0o1000, &[0o101000, 0o101000]);

        cpu.step().unwrap();
        assert_eq!(cpu.step(), Err(StopReason::Breakpoint { address: 0o1001 }));
        assert_eq!(cpu.pc(), 0o1001);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0o1002);
    }

    #[test]
    fn test_pc_wraps_in_bank_when_not_extended() {
        let mut cpu = cpu();
        cpu.set_pc(0o037777);
        cpu.memory_mut().write(0o037777, 0o101000);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0o000000);

        cpu.set_extended_mode(true);
        cpu.set_pc(0o037777);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0o040000);
    }

    #[test]
    fn test_standard_interrupt_enters_through_vector() {
        let mut cpu = cpu();
        cpu.set_extended_mode(false);
        cpu.memory_mut().write(0o63, 0o2000);
        cpu.set_pc(0o1000);
        cpu.lines_mut().set_enable_mask(1 << 4);
        cpu.lines_mut().enable();
        cpu.lines_mut().set_nodefer();
        cpu.lines_mut().request(4);

        cpu.step().unwrap();

        // JST* 063 stored the interrupted PC at 02000 and continued after it
        assert_eq!(cpu.memory().read(0o2000), 0o1000);
        assert_eq!(cpu.pc(), 0o2001);
        assert!(!cpu.lines().is_enabled());
        assert!(cpu.extended_mode());
        assert!(!cpu.previous_extended_mode());
        assert_eq!(cpu.pc_queue().iter().next(), Some(0o1000));
    }

    #[test]
    fn test_enb_defers_interrupt_one_instruction() {
        let mut cpu = cpu();
        cpu.memory_mut().write(0o63, 0o2000);
        cpu.lines_mut().set_enable_mask(1);
        cpu.lines_mut().request(0);
        cpu.set_pc(0o1000);
        // ENB, NOP
        cpu.memory_mut().load(0o1000, &[0o000401, 0o101000]);

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0o1002);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0o2001);
    }

    #[test]
    fn test_history_records_interrupts_and_operands() {
        let mut cpu = CPU::new(CpuConfig::default().with_history(64)).unwrap();
        cpu.memory_mut().write(0o10, 0o55);
        cpu.memory_mut().write(0o1000, 0o004010);
        cpu.set_pc(0o1000);
        cpu.step().unwrap();

        let history = cpu.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].pc, 0o1000);
        assert_eq!(history[0].ea, Some(0o10));
        assert_eq!(history[0].operand, 0o55);
        assert!(!history[0].interrupt);

        cpu.set_history_length(0).unwrap();
        assert!(cpu.history().is_empty());
        assert!(cpu.set_history_length(3).is_err());
    }

    #[test]
    fn test_examine_deposit_and_resize() {
        let mut cpu = cpu();
        cpu.deposit(0o20000, 0o1234).unwrap();
        assert_eq!(cpu.examine(0o20000), Ok(0o1234));

        assert_eq!(cpu.set_memory_size(8192), Ok(1));
        assert_eq!(cpu.examine(0o20000), Err(MemoryError::NonExistent(0o20000)));
        assert_eq!(
            cpu.deposit(0o20000, 1),
            Err(MemoryError::NonExistent(0o20000))
        );
        assert_eq!(cpu.memory().read(0o20000), 0);
        assert!(cpu.set_memory_size(100).is_err());
    }

    #[test]
    fn test_deposit_at_shadow_changes_x() {
        let mut cpu = cpu();
        cpu.deposit(0, 0o777).unwrap();
        assert_eq!(cpu.x(), 0o777);
    }

    #[test]
    fn test_registers_round_trip() {
        let mut cpu = cpu();
        let regs = Registers {
            a: 1,
            b: 2,
            x: 3,
            pc: 0o040100,
            c: true,
            ext: false,
            pme: true,
            dp: true,
            sc: 0o21,
            extoff_pending: false,
        };
        cpu.set_registers(&regs);
        assert_eq!(cpu.registers(), regs);
        assert_eq!(cpu.memory().read(0o040000), 3);
    }

    struct Null;

    impl IoDevice for Null {
        fn io(&mut self, _op: IoOp, _fnc: u8, data: u16, _dev: u8, _ctx: &mut IoContext) -> IoResult {
            IoResult::data(data)
        }
    }

    #[test]
    fn test_attach_checks_installed_channels() {
        let config = CpuConfig::default().with_dma_channels(1).with_dmc(false);
        let mut cpu = CPU::new(config).unwrap();
        assert!(cpu
            .attach_device(DeviceInfo::new(0o5).with_channel(Channel::Dma(1)), Box::new(Null))
            .is_ok());
        assert_eq!(
            cpu.attach_device(DeviceInfo::new(0o6).with_channel(Channel::Dma(2)), Box::new(Null)),
            Err(DeviceError::ChannelOutOfRange {
                channel: Channel::Dma(2)
            })
        );
        assert!(cpu
            .attach_device(DeviceInfo::new(0o7).with_channel(Channel::Dmc(1)), Box::new(Null))
            .is_err());
        assert!(cpu.configure_dmc(1, 0o100, 0o110, true).is_err());
    }

    #[test]
    fn test_reset_clears_modes_not_registers() {
        let mut cpu = cpu();
        cpu.set_a(0o7);
        cpu.set_dp(true);
        cpu.set_extended_mode(true);
        cpu.pc_queue.record(0o100);
        cpu.configure_dma(1, 0o2000, true, 3).unwrap();

        cpu.reset();

        assert_eq!(cpu.a(), 0o7);
        assert!(!cpu.dp());
        assert!(!cpu.extended_mode());
        assert!(cpu.pc_queue().is_empty());
        assert_eq!(cpu.dma_channel(1), Some(ChannelState::default()));
    }

    #[test]
    fn test_sense_switch_range() {
        let mut cpu = cpu();
        cpu.set_sense_switch(3, true);
        cpu.set_sense_switch(9, true);
        assert!(cpu.sense_switch(3));
        assert!(!cpu.sense_switch(9));
        cpu.set_sense_switch(3, false);
        assert!(!cpu.sense_switch(3));
    }
}
