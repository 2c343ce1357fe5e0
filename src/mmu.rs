//! The system bus: address decode, mirroring, unaligned-access rotation
//! and I/O register dispatch across every memory-mapped component.

use crate::consts::*;
use crate::dma::DmaTiming;
use crate::irq::{Interrupt, Irq};
use crate::pad::Pad;
use crate::ppu::Ppu;
use crate::rom::Cartridge;
use crate::timer::Timer;
use crate::{debugln, warnln};

use crate::dma::Dma;

/// The operations every component of the emulator issues against memory.
/// Implemented once, by [`Mmu`]; the CPU and BIOS HLE only ever see this
/// trait so that tests can swap in a bare-bones bus.
pub trait Bus {
    fn read8(&mut self, addr: u32) -> u8;
    fn read16(&mut self, addr: u32) -> u16;
    fn read32(&mut self, addr: u32) -> u32;
    fn write8(&mut self, addr: u32, value: u8);
    fn write16(&mut self, addr: u32, value: u16);
    fn write32(&mut self, addr: u32, value: u32);
}

const DMA_INTERRUPTS: [Interrupt; 4] = [
    Interrupt::Dma0,
    Interrupt::Dma1,
    Interrupt::Dma2,
    Interrupt::Dma3,
];

pub struct Mmu {
    bios: Vec<u8>,
    ewram: Vec<u8>,
    iwram: Vec<u8>,
    pub rom: Cartridge,

    pub ppu: Ppu,
    pub dma: Dma,
    pub timer: Timer,
    pub irq: Irq,
    pub pad: Pad,
}

impl Mmu {
    pub fn new() -> Self {
        Self {
            bios: vec![0; BIOS_SIZE as usize],
            ewram: vec![0; EWRAM_SIZE as usize],
            iwram: vec![0; IWRAM_SIZE as usize],
            rom: Cartridge::new(),
            ppu: Ppu::new(),
            dma: Dma::new(),
            timer: Timer::new(),
            irq: Irq::new(),
            pad: Pad::new(),
        }
    }

    pub fn reset(&mut self) {
        self.ewram.iter_mut().for_each(|b| *b = 0);
        self.iwram.iter_mut().for_each(|b| *b = 0);
        self.ppu.reset();
        self.dma.reset();
        self.timer.reset();
        self.irq.reset();
        self.pad.reset();
    }

    pub fn load_rom(&mut self, cartridge: Cartridge) {
        self.rom = cartridge;
    }

    /// Runs any channels armed for `timing` to completion, in priority
    /// order (channel 0 first), matching the fixed priority the DMA
    /// engine gives lower-numbered channels.
    pub fn fire_dma(&mut self, timing: DmaTiming) {
        for index in 0..4 {
            if self.dma.channels[index].enabled && self.dma.channels[index].timing == timing {
                self.run_dma_channel(index);
            }
        }
    }

    fn run_dma_channel(&mut self, index: usize) {
        let width = if self.dma.channels[index].word_width { 4 } else { 2 };
        while self.dma.channels[index].remaining() > 0 {
            let src = self.dma.channels[index].source();
            let dst = self.dma.channels[index].destination();
            if width == 4 {
                let value = self.read32(src);
                self.write32(dst, value);
            } else {
                let value = self.read16(src);
                self.write16(dst, value);
            }
            self.dma.channels[index].advance(width);
        }
        let irq_on_finish = self.dma.channels[index].irq_on_finish;
        self.dma.channels[index].finish();
        if irq_on_finish {
            self.irq.request(DMA_INTERRUPTS[index]);
        }
    }

    fn io_read16(&mut self, offset: u32) -> u16 {
        match offset {
            REG_DISPCNT => self.ppu.dispcnt,
            REG_DISPSTAT => self.ppu.dispstat,
            REG_VCOUNT => self.ppu.vcount,
            REG_BG0CNT => self.ppu.bgcnt[0],
            REG_BG1CNT => self.ppu.bgcnt[1],
            REG_BG2CNT => self.ppu.bgcnt[2],
            REG_BG3CNT => self.ppu.bgcnt[3],
            REG_DMA0CNT_H => self.dma.channels[0].control_high(),
            REG_DMA1CNT_H => self.dma.channels[1].control_high(),
            REG_DMA2CNT_H => self.dma.channels[2].control_high(),
            REG_DMA3CNT_H => self.dma.channels[3].control_high(),
            REG_TM0CNT_L => self.timer.read16(0, false),
            REG_TM0CNT_H => self.timer.read16(0, true),
            REG_TM1CNT_L => self.timer.read16(1, false),
            REG_TM1CNT_H => self.timer.read16(1, true),
            REG_TM2CNT_L => self.timer.read16(2, false),
            REG_TM2CNT_H => self.timer.read16(2, true),
            REG_TM3CNT_L => self.timer.read16(3, false),
            REG_TM3CNT_H => self.timer.read16(3, true),
            REG_KEYINPUT => self.pad.keyinput(),
            REG_IE => self.irq.ie(),
            REG_IF => self.irq.iflags(),
            REG_IME => self.irq.ime() as u16,
            _ => {
                debugln!("Read from unmapped I/O register 0x{:03x}", offset);
                0
            }
        }
    }

    fn io_write16(&mut self, offset: u32, value: u16) {
        match offset {
            REG_DISPCNT => self.ppu.dispcnt = value,
            REG_DISPSTAT => self.ppu.dispstat = (self.ppu.dispstat & 0x0007) | (value & !0x0007),
            REG_VCOUNT => {}
            REG_BG0CNT => self.ppu.bgcnt[0] = value,
            REG_BG1CNT => self.ppu.bgcnt[1] = value,
            REG_BG2CNT => self.ppu.bgcnt[2] = value,
            REG_BG3CNT => self.ppu.bgcnt[3] = value,
            REG_BG0HOFS => self.ppu.bg_hofs[0] = value,
            REG_BG0VOFS => self.ppu.bg_vofs[0] = value,
            REG_BG1HOFS => self.ppu.bg_hofs[1] = value,
            REG_BG1VOFS => self.ppu.bg_vofs[1] = value,
            REG_BG2HOFS => self.ppu.bg_hofs[2] = value,
            REG_BG2VOFS => self.ppu.bg_vofs[2] = value,
            REG_BG3HOFS => self.ppu.bg_hofs[3] = value,
            REG_BG3VOFS => self.ppu.bg_vofs[3] = value,

            REG_DMA0SAD => self.dma.channels[0].set_source_low(value),
            REG_DMA1SAD => self.dma.channels[1].set_source_low(value),
            REG_DMA2SAD => self.dma.channels[2].set_source_low(value),
            REG_DMA3SAD => self.dma.channels[3].set_source_low(value),
            x if x == REG_DMA0SAD + 2 => self.dma.channels[0].set_source_high(value),
            x if x == REG_DMA1SAD + 2 => self.dma.channels[1].set_source_high(value),
            x if x == REG_DMA2SAD + 2 => self.dma.channels[2].set_source_high(value),
            x if x == REG_DMA3SAD + 2 => self.dma.channels[3].set_source_high(value),
            REG_DMA0DAD => self.dma.channels[0].set_destination_low(value),
            REG_DMA1DAD => self.dma.channels[1].set_destination_low(value),
            REG_DMA2DAD => self.dma.channels[2].set_destination_low(value),
            REG_DMA3DAD => self.dma.channels[3].set_destination_low(value),
            x if x == REG_DMA0DAD + 2 => self.dma.channels[0].set_destination_high(value),
            x if x == REG_DMA1DAD + 2 => self.dma.channels[1].set_destination_high(value),
            x if x == REG_DMA2DAD + 2 => self.dma.channels[2].set_destination_high(value),
            x if x == REG_DMA3DAD + 2 => self.dma.channels[3].set_destination_high(value),
            REG_DMA0CNT_L => self.dma.channels[0].set_count(value),
            REG_DMA1CNT_L => self.dma.channels[1].set_count(value),
            REG_DMA2CNT_L => self.dma.channels[2].set_count(value),
            REG_DMA3CNT_L => self.dma.channels[3].set_count(value),
            REG_DMA0CNT_H => {
                if self.dma.channels[0].write_control_high(value) {
                    self.run_dma_channel(0);
                }
            }
            REG_DMA1CNT_H => {
                if self.dma.channels[1].write_control_high(value) {
                    self.run_dma_channel(1);
                }
            }
            REG_DMA2CNT_H => {
                if self.dma.channels[2].write_control_high(value) {
                    self.run_dma_channel(2);
                }
            }
            REG_DMA3CNT_H => {
                if self.dma.channels[3].write_control_high(value) {
                    self.run_dma_channel(3);
                }
            }

            REG_TM0CNT_L => self.timer.write16(0, false, value),
            REG_TM0CNT_H => self.timer.write16(0, true, value),
            REG_TM1CNT_L => self.timer.write16(1, false, value),
            REG_TM1CNT_H => self.timer.write16(1, true, value),
            REG_TM2CNT_L => self.timer.write16(2, false, value),
            REG_TM2CNT_H => self.timer.write16(2, true, value),
            REG_TM3CNT_L => self.timer.write16(3, false, value),
            REG_TM3CNT_H => self.timer.write16(3, true, value),

            REG_KEYINPUT => {}
            REG_IE => self.irq.set_ie(value),
            REG_IF => self.irq.ack_iflags(value),
            REG_IME => self.irq.set_ime(value & 1 != 0),
            _ => warnln!("Write to unmapped I/O register 0x{:03x}", offset),
        }
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Mmu {
    fn read8(&mut self, addr: u32) -> u8 {
        match addr >> 24 {
            0x00 => self.bios[(addr as usize) & (BIOS_SIZE as usize - 1)],
            0x02 => self.ewram[(addr as usize) & (EWRAM_SIZE as usize - 1)],
            0x03 => self.iwram[(addr as usize) & (IWRAM_SIZE as usize - 1)],
            0x04 => {
                let offset = addr & 0x3ff;
                let half = self.io_read16(offset & !1);
                if offset & 1 != 0 {
                    (half >> 8) as u8
                } else {
                    half as u8
                }
            }
            0x05 => self.ppu.palette[(addr as usize) & (PALETTE_SIZE as usize - 1)],
            0x06 => {
                let offset = vram_offset(addr);
                self.ppu.vram[offset]
            }
            0x07 => self.ppu.oam[(addr as usize) & (OAM_SIZE as usize - 1)],
            0x08..=0x0d => self.rom.read8((addr - ROM_BASE) & 0x01ff_ffff),
            _ => 0,
        }
    }

    fn read16(&mut self, addr: u32) -> u16 {
        let aligned = addr & !1;
        let value = match aligned >> 24 {
            0x00 | 0x02 | 0x03 | 0x05 | 0x06 | 0x07 | 0x08..=0x0d => {
                u16::from_le_bytes([self.read8(aligned), self.read8(aligned + 1)])
            }
            0x04 => self.io_read16(aligned & 0x3ff),
            _ => 0,
        };
        if addr & 1 != 0 {
            value.rotate_right(8)
        } else {
            value
        }
    }

    fn read32(&mut self, addr: u32) -> u32 {
        let aligned = addr & !3;
        let value = u32::from_le_bytes([
            self.read8(aligned),
            self.read8(aligned + 1),
            self.read8(aligned + 2),
            self.read8(aligned + 3),
        ]);
        let rotation = (addr & 0x3) * 8;
        value.rotate_right(rotation)
    }

    fn write8(&mut self, addr: u32, value: u8) {
        match addr >> 24 {
            0x00 => {}
            0x02 => self.ewram[(addr as usize) & (EWRAM_SIZE as usize - 1)] = value,
            0x03 => self.iwram[(addr as usize) & (IWRAM_SIZE as usize - 1)] = value,
            0x04 => {
                let offset = addr & 0x3ff;
                let base = offset & !1;
                if base == REG_IF {
                    // IF is write-1-to-clear: an 8-bit write must only ack
                    // the bits in the targeted byte, never the other byte's
                    // currently pending flags.
                    let half = if offset & 1 != 0 {
                        (value as u16) << 8
                    } else {
                        value as u16
                    };
                    self.io_write16(base, half);
                } else {
                    let mut half = self.io_read16(base);
                    if offset & 1 != 0 {
                        half = (half & 0x00ff) | ((value as u16) << 8);
                    } else {
                        half = (half & 0xff00) | value as u16;
                    }
                    self.io_write16(base, half);
                }
            }
            // Palette byte writes replicate into both halves of the cell.
            0x05 => {
                let base = (addr as usize) & (PALETTE_SIZE as usize - 1) & !1;
                self.ppu.palette[base] = value;
                self.ppu.palette[base + 1] = value;
            }
            // BG/tilemap VRAM byte writes replicate; sprite VRAM discards them.
            0x06 => {
                let offset = vram_offset(addr);
                if offset < 0x1_0000 {
                    let base = offset & !1;
                    self.ppu.vram[base] = value;
                    self.ppu.vram[base + 1] = value;
                } else {
                    debugln!("Discarded 8-bit write to sprite VRAM at 0x{:06x}", offset);
                }
            }
            0x07 => {}
            0x08..=0x0d => {}
            _ => {}
        }
    }

    fn write16(&mut self, addr: u32, value: u16) {
        let addr = addr & !1;
        match addr >> 24 {
            0x00 => {}
            0x02 => {
                let base = (addr as usize) & (EWRAM_SIZE as usize - 1);
                self.ewram[base..base + 2].copy_from_slice(&value.to_le_bytes());
            }
            0x03 => {
                let base = (addr as usize) & (IWRAM_SIZE as usize - 1);
                self.iwram[base..base + 2].copy_from_slice(&value.to_le_bytes());
            }
            0x04 => self.io_write16(addr & 0x3ff, value),
            0x05 => {
                let base = (addr as usize) & (PALETTE_SIZE as usize - 1);
                self.ppu.palette[base..base + 2].copy_from_slice(&value.to_le_bytes());
            }
            0x06 => {
                let base = vram_offset(addr);
                self.ppu.vram[base..base + 2].copy_from_slice(&value.to_le_bytes());
            }
            0x07 => {
                let base = (addr as usize) & (OAM_SIZE as usize - 1);
                self.ppu.oam[base..base + 2].copy_from_slice(&value.to_le_bytes());
            }
            0x08..=0x0d => {}
            _ => {}
        }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        let addr = addr & !3;
        let bytes = value.to_le_bytes();
        self.write16(addr, u16::from_le_bytes([bytes[0], bytes[1]]));
        self.write16(addr + 2, u16::from_le_bytes([bytes[2], bytes[3]]));
    }
}

/// VRAM's 96 KiB is mirrored across a 128 KiB window; the last 32 KiB of
/// that window repeats the final 32 KiB bank instead of wrapping to zero.
fn vram_offset(addr: u32) -> usize {
    let window = (addr as usize) & 0x1_ffff;
    if window >= VRAM_SIZE as usize {
        window - 0x8000
    } else {
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ewram_mirrors_at_256k() {
        let mut mmu = Mmu::new();
        mmu.write8(EWRAM_BASE, 0x42);
        assert_eq!(mmu.read8(EWRAM_BASE + EWRAM_SIZE), 0x42);
    }

    #[test]
    fn test_unaligned_32bit_read_rotates() {
        let mut mmu = Mmu::new();
        mmu.write32(IWRAM_BASE, 0x1122_3344);
        let value = mmu.read32(IWRAM_BASE + 1);
        assert_eq!(value, 0x4411_2233);
    }

    #[test]
    fn test_unaligned_16bit_read_rotates() {
        let mut mmu = Mmu::new();
        mmu.write16(IWRAM_BASE, 0xabcd);
        let value = mmu.read16(IWRAM_BASE + 1);
        assert_eq!(value, 0xcdab);
    }

    #[test]
    fn test_if_write_is_write_one_to_clear() {
        let mut mmu = Mmu::new();
        mmu.irq.request(Interrupt::VBlank);
        mmu.irq.request(Interrupt::HBlank);
        mmu.write16(IO_BASE + REG_IF, 1 << Interrupt::VBlank as u16);
        assert_eq!(mmu.irq.iflags(), 1 << Interrupt::HBlank as u16);
    }

    #[test]
    fn test_if_byte_write_only_clears_targeted_byte() {
        let mut mmu = Mmu::new();
        mmu.irq.request(Interrupt::VBlank);
        mmu.irq.request(Interrupt::Keypad);
        // 8-bit write to the low byte of IF clearing VBlank must not touch
        // the pending Keypad flag living in the high byte.
        mmu.write8(IO_BASE + REG_IF, 1 << Interrupt::VBlank as u8);
        assert_eq!(mmu.irq.iflags(), 1 << Interrupt::Keypad as u16);
    }

    #[test]
    fn test_keyinput_write_is_ignored() {
        let mut mmu = Mmu::new();
        let before = mmu.read16(IO_BASE + REG_KEYINPUT);
        mmu.write16(IO_BASE + REG_KEYINPUT, 0);
        assert_eq!(mmu.read16(IO_BASE + REG_KEYINPUT), before);
    }

    #[test]
    fn test_palette_byte_write_replicates() {
        let mut mmu = Mmu::new();
        mmu.write8(PALETTE_BASE, 0x5a);
        assert_eq!(mmu.read16(PALETTE_BASE), 0x5a5a);
    }

    #[test]
    fn test_dma_immediate_transfer_fires_on_control_write() {
        let mut mmu = Mmu::new();
        mmu.write32(EWRAM_BASE, 0xcafe_babe);
        mmu.write32(IO_BASE + REG_DMA0SAD, EWRAM_BASE);
        mmu.write32(IO_BASE + REG_DMA0DAD, EWRAM_BASE + 0x1000);
        mmu.write16(IO_BASE + REG_DMA0CNT_L, 1);
        mmu.write16(IO_BASE + REG_DMA0CNT_H, 0x8000 | 0x0400); // enable, 32-bit
        assert_eq!(mmu.read32(EWRAM_BASE + 0x1000), 0xcafe_babe);
    }
}
