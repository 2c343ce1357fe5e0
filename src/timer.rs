//! The four-channel timer unit: prescalers, cascade and overflow IRQs.

use crate::irq::{Interrupt, Irq};

const PRESCALERS: [u32; 4] = [1, 64, 256, 1024];

pub struct TimerChannel {
    counter: u16,
    reload: u16,
    prescaler: u32,
    cascade: bool,
    irq_enable: bool,
    enabled: bool,
    accumulator: u32,
    /// Set by the previous channel's overflow this tick, consumed by a
    /// cascading channel instead of its own prescaler.
    cascade_in: bool,
}

impl TimerChannel {
    fn new() -> Self {
        Self {
            counter: 0,
            reload: 0,
            prescaler: PRESCALERS[0],
            cascade: false,
            irq_enable: false,
            enabled: false,
            accumulator: 0,
            cascade_in: false,
        }
    }

    fn write_control(&mut self, value: u16) {
        self.prescaler = PRESCALERS[(value & 0x3) as usize];
        self.cascade = value & 0x04 != 0;
        self.irq_enable = value & 0x40 != 0;
        let was_enabled = self.enabled;
        self.enabled = value & 0x80 != 0;
        if self.enabled && !was_enabled {
            self.counter = self.reload;
            self.accumulator = 0;
        }
    }

    fn control(&self) -> u16 {
        let index = PRESCALERS.iter().position(|&p| p == self.prescaler).unwrap_or(0);
        index as u16
            | if self.cascade { 0x04 } else { 0 }
            | if self.irq_enable { 0x40 } else { 0 }
            | if self.enabled { 0x80 } else { 0 }
    }

    /// Advances the channel by `cycles` of wall-clock CPU time, returning
    /// whether it overflowed (for cascade wiring and IRQ raising).
    fn tick(&mut self, cycles: u32) -> bool {
        if !self.enabled {
            return false;
        }
        if self.cascade {
            if self.cascade_in {
                self.cascade_in = false;
                return self.increment();
            }
            return false;
        }
        let mut overflowed = false;
        self.accumulator += cycles;
        while self.accumulator >= self.prescaler {
            self.accumulator -= self.prescaler;
            if self.increment() {
                overflowed = true;
            }
        }
        overflowed
    }

    fn increment(&mut self) -> bool {
        let (next, overflowed) = self.counter.overflowing_add(1);
        if overflowed {
            self.counter = self.reload;
        } else {
            self.counter = next;
        }
        overflowed
    }
}

impl Default for TimerChannel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Timer {
    channels: [TimerChannel; 4],
}

impl Timer {
    pub fn new() -> Self {
        Self {
            channels: [
                TimerChannel::new(),
                TimerChannel::new(),
                TimerChannel::new(),
                TimerChannel::new(),
            ],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances all four channels by `cycles`, feeding each overflow into
    /// the next channel's cascade input and raising the matching IRQ.
    pub fn advance(&mut self, cycles: u32, irq: &mut Irq) {
        let interrupts = [
            Interrupt::Timer0,
            Interrupt::Timer1,
            Interrupt::Timer2,
            Interrupt::Timer3,
        ];
        for index in 0..4 {
            let overflowed = self.channels[index].tick(cycles);
            if overflowed {
                if self.channels[index].irq_enable {
                    irq.request(interrupts[index]);
                }
                if index + 1 < 4 {
                    self.channels[index + 1].cascade_in = true;
                }
            }
        }
    }

    pub fn read16(&self, channel: usize, high: bool) -> u16 {
        if high {
            self.channels[channel].control()
        } else {
            self.channels[channel].counter
        }
    }

    pub fn write16(&mut self, channel: usize, high: bool, value: u16) {
        if high {
            self.channels[channel].write_control(value);
        } else {
            self.channels[channel].reload = value;
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescaler_1_overflows_after_65536_cycles() {
        let mut timer = Timer::new();
        let mut irq = Irq::new();
        timer.write16(0, true, 0x80); // enable, prescaler /1
        timer.advance(65535, &mut irq);
        assert_eq!(timer.read16(0, false), 65535);
        timer.advance(1, &mut irq);
        assert_eq!(timer.read16(0, false), 0);
        assert!(irq.iflags() == 0);
    }

    #[test]
    fn test_overflow_raises_irq_when_enabled() {
        let mut timer = Timer::new();
        let mut irq = Irq::new();
        timer.write16(0, false, 0xfffe);
        timer.write16(0, true, 0x80 | 0x40);
        timer.advance(2, &mut irq);
        assert_eq!(irq.iflags(), 1 << Interrupt::Timer0 as u16);
    }

    #[test]
    fn test_reload_on_overflow() {
        let mut timer = Timer::new();
        let mut irq = Irq::new();
        timer.write16(0, false, 0xff00);
        timer.write16(0, true, 0x80);
        timer.advance(0x100, &mut irq);
        assert_eq!(timer.read16(0, false), 0xff00);
    }

    #[test]
    fn test_cascade_from_timer0_to_timer1() {
        let mut timer = Timer::new();
        let mut irq = Irq::new();
        timer.write16(0, false, 0xffff);
        timer.write16(0, true, 0x80);
        timer.write16(1, true, 0x84); // enable + cascade
        timer.advance(1, &mut irq);
        assert_eq!(timer.read16(0, false), 0xffff);
        assert_eq!(timer.read16(1, false), 1);
    }
}
