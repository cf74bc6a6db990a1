//! Interrupt and channel request lines shared by the CPU and devices.
//!
//! The 316/516 has two interrupt systems:
//!
//! ## Standard Interrupt
//!
//! Up to 14 device request bits share one vector. A request is taken when
//! interrupts are on (ENB), not deferred, and at least one request bit is
//! enabled by the SMK mask. Requests are level-sensitive: a device holds its
//! bit until the handler services it.
//!
//! The interrupt word also carries three control bits:
//!
//! | Bit | Meaning |
//! |-----|---------|
//! | 14  | START button pressed (single-shot, cleared every cycle) |
//! | 15  | NODEF: no deferral pending (set on every ordinary fetch) |
//! | 16  | ON: interrupts enabled |
//!
//! ## Extended (Priority) Interrupt
//!
//! Up to 16 additional lines, each with its own vector. When no standard
//! interrupt is pending the lowest numbered line that is both requested and
//! enabled wins, and taking it clears that line's request bit.
//!
//! ## Channel Requests
//!
//! A device wanting a DMA/DMC transfer sets its channel's request bit. The CPU
//! services every requested channel at the top of each cycle.

use super::channels::Channel;

/// Real-time clock request bit.
pub const INT_CLK: u32 = 1 << 0;

/// Memory parity error request bit.
pub const INT_MPE: u32 = 1 << 1;

/// Highest standard request line usable by devices.
pub const INT_LINES: u8 = 14;

/// START button.
pub const INT_START: u32 = 1 << 14;

/// No interrupt deferral pending.
pub const INT_NODEF: u32 = 1 << 15;

/// Interrupts enabled.
pub const INT_ON: u32 = 1 << 16;

/// Interrupts on and not deferred.
pub const INT_PENDING: u32 = INT_ON | INT_NODEF;

/// Number of extended interrupt lines.
pub const EXT_INT_LINES: u8 = 16;

/// Interrupt and channel request state.
///
/// # Examples
///
/// ```
/// use lib316::IoLines;
///
/// let mut lines = IoLines::default();
/// lines.set_enable_mask(0o000004);
/// lines.request(2);
/// assert!(!lines.standard_pending()); // interrupts still off
///
/// lines.enable();
/// lines.set_nodefer();
/// assert!(lines.standard_pending());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoLines {
    pub(crate) dev_int: u32,
    pub(crate) dev_enb: u32,
    pub(crate) ext_int: u16,
    pub(crate) ext_enb: u16,
    pub(crate) chan_req: u32,
}

impl IoLines {
    /// Raises standard request line `line` (0..14).
    pub fn request(&mut self, line: u8) {
        if line < INT_LINES {
            self.dev_int |= 1 << line;
        }
    }

    /// Drops standard request line `line`.
    pub fn clear(&mut self, line: u8) {
        if line < INT_LINES {
            self.dev_int &= !(1 << line);
        }
    }

    /// Returns true if standard request line `line` is raised.
    pub fn is_requested(&self, line: u8) -> bool {
        line < INT_LINES && self.dev_int & (1 << line) != 0
    }

    /// Raw standard interrupt word (requests plus START/NODEF/ON).
    pub fn interrupt_word(&self) -> u32 {
        self.dev_int
    }

    /// Standard interrupt enable mask, as loaded by SMK.
    pub fn enable_mask(&self) -> u16 {
        self.dev_enb as u16
    }

    pub fn set_enable_mask(&mut self, mask: u16) {
        self.dev_enb = mask as u32;
    }

    /// Returns true if interrupts are on.
    pub fn is_enabled(&self) -> bool {
        self.dev_int & INT_ON != 0
    }

    /// ENB: interrupts on, deferred for one instruction.
    pub fn enable(&mut self) {
        self.dev_int = (self.dev_int | INT_ON) & !INT_NODEF;
    }

    /// INH: interrupts off.
    pub fn inhibit(&mut self) {
        self.dev_int &= !INT_ON;
    }

    /// Marks the one-instruction ENB deferral as elapsed.
    pub fn set_nodefer(&mut self) {
        self.dev_int |= INT_NODEF;
    }

    /// Presses the START button.
    pub fn press_start(&mut self) {
        self.dev_int |= INT_START;
    }

    pub(crate) fn clear_start(&mut self) {
        self.dev_int &= !INT_START;
    }

    /// Returns true if a memory parity error is pending.
    pub fn parity_error(&self) -> bool {
        self.dev_int & INT_MPE != 0
    }

    /// Raises the memory parity error request.
    pub fn set_parity_error(&mut self) {
        self.dev_int |= INT_MPE;
    }

    pub(crate) fn clear_parity_error(&mut self) {
        self.dev_int &= !INT_MPE;
    }

    /// Returns true if a standard interrupt will be taken.
    pub fn standard_pending(&self) -> bool {
        (self.dev_int & (INT_PENDING | INT_START | self.dev_enb)) > INT_PENDING
    }

    /// Raises extended interrupt line `line` (0..16).
    pub fn request_extended(&mut self, line: u8) {
        if line < EXT_INT_LINES {
            self.ext_int |= 1 << line;
        }
    }

    /// Drops extended interrupt line `line`.
    pub fn clear_extended(&mut self, line: u8) {
        if line < EXT_INT_LINES {
            self.ext_int &= !(1 << line);
        }
    }

    /// Extended interrupt request bitmap.
    pub fn extended_requests(&self) -> u16 {
        self.ext_int
    }

    /// Extended interrupt enable mask.
    pub fn extended_mask(&self) -> u16 {
        self.ext_enb
    }

    pub fn set_extended_mask(&mut self, mask: u16) {
        self.ext_enb = mask;
    }

    /// Highest priority extended line that would be taken, if any.
    pub fn extended_pending(&self) -> Option<u8> {
        if self.dev_int & INT_PENDING != INT_PENDING {
            return None;
        }
        let active = self.ext_int & self.ext_enb;
        if active == 0 {
            return None;
        }
        Some(active.trailing_zeros() as u8)
    }

    /// Takes the highest priority extended line, clearing its request.
    pub(crate) fn take_extended(&mut self) -> Option<u8> {
        let line = self.extended_pending()?;
        self.ext_int &= !(1 << line);
        Some(line)
    }

    /// Requests service on a DMA/DMC channel.
    pub fn request_channel(&mut self, channel: Channel) {
        if let Some(index) = channel.index() {
            self.chan_req |= 1 << index;
        }
    }

    /// Returns true if a channel has a service request outstanding.
    pub fn channel_requested(&self, channel: Channel) -> bool {
        channel
            .index()
            .is_some_and(|index| self.chan_req & (1 << index) != 0)
    }

    /// Clears everything reset clears: requests, masks and channel requests.
    /// ON, NODEF and START survive.
    pub(crate) fn reset(&mut self) {
        self.dev_int &= INT_ON | INT_NODEF | INT_START;
        self.dev_enb = 0;
        self.ext_int = 0;
        self.ext_enb = 0;
        self.chan_req = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed() -> IoLines {
        let mut lines = IoLines::default();
        lines.enable();
        lines.set_nodefer();
        lines
    }

    #[test]
    fn test_standard_needs_enable_mask() {
        let mut lines = armed();
        lines.request(3);
        assert!(!lines.standard_pending());

        lines.set_enable_mask(1 << 3);
        assert!(lines.standard_pending());

        lines.clear(3);
        assert!(!lines.standard_pending());
    }

    #[test]
    fn test_enb_defers_one_instruction() {
        let mut lines = IoLines::default();
        lines.set_enable_mask(0o1);
        lines.request(0);
        lines.enable();
        assert!(!lines.standard_pending());
        lines.set_nodefer();
        assert!(lines.standard_pending());
    }

    #[test]
    fn test_start_ignores_mask() {
        let mut lines = armed();
        lines.press_start();
        assert!(lines.standard_pending());
        lines.clear_start();
        assert!(!lines.standard_pending());
    }

    #[test]
    fn test_extended_priority_lowest_first() {
        let mut lines = armed();
        lines.set_extended_mask(0o177777);
        lines.request_extended(7);
        lines.request_extended(3);

        assert_eq!(lines.take_extended(), Some(3));
        assert_eq!(lines.extended_requests(), 1 << 7);
        assert_eq!(lines.take_extended(), Some(7));
        assert_eq!(lines.take_extended(), None);
    }

    #[test]
    fn test_extended_masked_and_off() {
        let mut lines = IoLines::default();
        lines.request_extended(5);
        lines.set_extended_mask(1 << 5);
        assert_eq!(lines.extended_pending(), None);

        lines.enable();
        lines.set_nodefer();
        assert_eq!(lines.extended_pending(), Some(5));

        lines.set_extended_mask(0);
        assert_eq!(lines.extended_pending(), None);
    }

    #[test]
    fn test_reset_keeps_control_bits() {
        let mut lines = armed();
        lines.request(4);
        lines.set_enable_mask(0o777);
        lines.request_extended(1);
        lines.request_channel(Channel::Dma(1));

        lines.reset();

        assert!(lines.is_enabled());
        assert!(!lines.is_requested(4));
        assert_eq!(lines.enable_mask(), 0);
        assert_eq!(lines.extended_requests(), 0);
        assert!(!lines.channel_requested(Channel::Dma(1)));
    }
}
