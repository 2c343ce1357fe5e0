//! DMA (Direct Memory Access) channel state.
//!
//! The four channels only hold latched register state here; the actual
//! transfer loop needs simultaneous access to every bus region plus the
//! interrupt controller, so it lives on [`crate::mmu::Mmu`] as
//! `run_channel`, invoked by the frame pump at the right timing edges.

use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DmaTiming {
    Immediate,
    VBlank,
    HBlank,
    Special,
}

impl DmaTiming {
    fn from_bits(bits: u16) -> Self {
        match bits & 0x3 {
            0 => DmaTiming::Immediate,
            1 => DmaTiming::VBlank,
            2 => DmaTiming::HBlank,
            3 => DmaTiming::Special,
            _ => unreachable!(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddrControl {
    Increment,
    Decrement,
    Fixed,
    IncrementReload,
}

impl AddrControl {
    fn from_bits(bits: u16) -> Self {
        match bits & 0x3 {
            0 => AddrControl::Increment,
            1 => AddrControl::Decrement,
            2 => AddrControl::Fixed,
            3 => AddrControl::IncrementReload,
            _ => unreachable!(),
        }
    }
}

pub struct DmaChannel {
    pub index: usize,
    source: u32,
    destination: u32,
    /// Count as latched at arm time (0 decodes to the channel's max).
    count: u32,
    source_latch: u32,
    destination_latch: u32,
    count_latch: u32,

    pub dest_control: AddrControl,
    pub source_control: AddrControl,
    pub repeat: bool,
    pub word_width: bool, // true = 32-bit, false = 16-bit
    pub timing: DmaTiming,
    pub irq_on_finish: bool,
    pub enabled: bool,

    source_mask: u32,
    dest_mask: u32,
    count_mask: u32,
}

impl DmaChannel {
    fn new(index: usize) -> Self {
        let (source_mask, dest_mask, count_mask) = if index == 3 {
            (0x0fff_ffff, 0x0fff_ffff, 0xffff)
        } else {
            (0x07ff_ffff, 0x07ff_ffff, 0x3fff)
        };
        Self {
            index,
            source: 0,
            destination: 0,
            count: 0,
            source_latch: 0,
            destination_latch: 0,
            count_latch: 0,
            dest_control: AddrControl::Increment,
            source_control: AddrControl::Increment,
            repeat: false,
            word_width: false,
            timing: DmaTiming::Immediate,
            irq_on_finish: false,
            enabled: false,
            source_mask,
            dest_mask,
            count_mask,
        }
    }

    pub fn set_source(&mut self, value: u32) {
        self.source_latch = value & self.source_mask;
    }

    pub fn set_source_low(&mut self, value: u16) {
        self.source_latch = ((self.source_latch & 0xffff_0000) | value as u32) & self.source_mask;
    }

    pub fn set_source_high(&mut self, value: u16) {
        self.source_latch =
            ((self.source_latch & 0x0000_ffff) | ((value as u32) << 16)) & self.source_mask;
    }

    pub fn set_destination(&mut self, value: u32) {
        self.destination_latch = value & self.dest_mask;
    }

    pub fn set_destination_low(&mut self, value: u16) {
        self.destination_latch =
            ((self.destination_latch & 0xffff_0000) | value as u32) & self.dest_mask;
    }

    pub fn set_destination_high(&mut self, value: u16) {
        self.destination_latch =
            ((self.destination_latch & 0x0000_ffff) | ((value as u32) << 16)) & self.dest_mask;
    }

    pub fn set_count(&mut self, value: u16) {
        self.count_latch = value as u32 & self.count_mask;
    }

    /// Writes DMAxCNT_H, arming the channel when bit 15 transitions to 1.
    /// Returns true when this write should fire an immediate transfer.
    pub fn write_control_high(&mut self, value: u16) -> bool {
        self.dest_control = AddrControl::from_bits(value >> 5);
        self.source_control = AddrControl::from_bits(value >> 7);
        self.repeat = value & 0x0200 != 0;
        self.word_width = value & 0x0400 != 0;
        self.timing = DmaTiming::from_bits(value >> 12);
        self.irq_on_finish = value & 0x4000 != 0;
        let was_enabled = self.enabled;
        self.enabled = value & 0x8000 != 0;

        if self.enabled && !was_enabled {
            self.source = self.source_latch;
            self.destination = self.destination_latch;
            self.count = if self.count_latch == 0 {
                self.count_mask + 1
            } else {
                self.count_latch
            };
            return self.timing == DmaTiming::Immediate;
        }
        false
    }

    pub fn control_high(&self) -> u16 {
        let mut value = 0u16;
        value |= (self.dest_control as u16) << 5;
        value |= (self.source_control as u16) << 7;
        if self.repeat {
            value |= 0x0200;
        }
        if self.word_width {
            value |= 0x0400;
        }
        value |= (self.timing as u16) << 12;
        if self.irq_on_finish {
            value |= 0x4000;
        }
        if self.enabled {
            value |= 0x8000;
        }
        value
    }

    pub fn source(&self) -> u32 {
        self.source
    }

    pub fn destination(&self) -> u32 {
        self.destination
    }

    pub fn remaining(&self) -> u32 {
        self.count
    }

    /// Called after the channel has run to completion. Handles the
    /// repeat/reload state machine: non-repeating channels disarm,
    /// repeating ones stay armed and optionally re-latch the
    /// destination for the next firing.
    pub fn finish(&mut self) {
        if !self.repeat {
            self.enabled = false;
            return;
        }
        self.count = if self.count_latch == 0 {
            self.count_mask + 1
        } else {
            self.count_latch
        };
        if self.dest_control == AddrControl::IncrementReload {
            self.destination = self.destination_latch;
        }
    }

    pub fn step_addr(addr: u32, control: AddrControl, width: u32) -> u32 {
        match control {
            AddrControl::Increment | AddrControl::IncrementReload => addr.wrapping_add(width),
            AddrControl::Decrement => addr.wrapping_sub(width),
            AddrControl::Fixed => addr,
        }
    }

    pub fn advance(&mut self, width: u32) {
        self.source = Self::step_addr(self.source, self.source_control, width);
        self.destination = Self::step_addr(self.destination, self.dest_control, width);
        self.count -= 1;
    }
}

impl Display for DmaChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DMA{}: enabled={} src=0x{:08x} dst=0x{:08x} count={} timing={:?}",
            self.index, self.enabled, self.source, self.destination, self.count, self.timing
        )
    }
}

pub struct Dma {
    pub channels: [DmaChannel; 4],
}

impl Dma {
    pub fn new() -> Self {
        Self {
            channels: [
                DmaChannel::new(0),
                DmaChannel::new(1),
                DmaChannel::new(2),
                DmaChannel::new(3),
            ],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn any_armed(&self, timing: DmaTiming) -> bool {
        self.channels
            .iter()
            .any(|channel| channel.enabled && channel.timing == timing)
    }
}

impl Default for Dma {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_latches_count_and_addresses() {
        let mut channel = DmaChannel::new(0);
        channel.set_source(0x0200_0000);
        channel.set_destination(0x0300_0000);
        channel.set_count(4);
        let fires = channel.write_control_high(0x8000);
        assert!(fires);
        assert_eq!(channel.source(), 0x0200_0000);
        assert_eq!(channel.destination(), 0x0300_0000);
        assert_eq!(channel.remaining(), 4);
    }

    #[test]
    fn test_count_zero_decodes_to_max() {
        let mut channel = DmaChannel::new(0);
        channel.set_count(0);
        channel.write_control_high(0x8000);
        assert_eq!(channel.remaining(), 0x4000);
    }

    #[test]
    fn test_channel3_count_zero_is_0x10000() {
        let mut channel = DmaChannel::new(3);
        channel.set_count(0);
        channel.write_control_high(0x8000);
        assert_eq!(channel.remaining(), 0x10000);
    }

    #[test]
    fn test_finish_disarms_without_repeat() {
        let mut channel = DmaChannel::new(0);
        channel.set_count(1);
        channel.write_control_high(0x8000);
        channel.finish();
        assert!(!channel.enabled);
    }

    #[test]
    fn test_finish_reloads_destination_when_requested() {
        let mut channel = DmaChannel::new(0);
        channel.set_source(0x0800_0000);
        channel.set_destination(0x0600_0000);
        channel.set_count(4);
        // repeat + dest reload + vblank timing
        channel.write_control_high(0x8000 | 0x0200 | (3 << 5));
        channel.destination = 0x0600_0100;
        channel.finish();
        assert_eq!(channel.destination(), 0x0600_0000);
        assert!(channel.enabled);
    }
}
