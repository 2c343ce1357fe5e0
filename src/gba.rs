//! Top-level system: wires the CPU, bus and peripherals together into the
//! frame pump described for the emulator, and is the type the panic
//! diagnostics hook and the frontends talk to.

use std::sync::{Arc, Mutex};

use rustboy_advance_common::error::Error;
use rustboy_advance_common::util::read_file;

use crate::cpu::Cpu;
use crate::dma::DmaTiming;
use crate::info::Info;
use crate::mmu::{Bus, Mmu};
use crate::pad::PadKey;
use crate::rom::Cartridge;

/// Address the HLE IRQ controller reads the user's handler pointer from,
/// mirroring the real BIOS's documented IRQ dispatch contract.
const USER_IRQ_HANDLER_PTR: u32 = 0x0300_7ffc;

/// Cross-cutting toggles a real deployment needs beyond the core
/// simulation: whether individual subsystems run (useful to benchmark
/// the CPU alone), the BIOS-HLE switch, and the nominal clock rate the
/// frontend paces frames against.
#[derive(Clone, Copy)]
pub struct GbaConfig {
    pub ppu_enabled: bool,
    pub dma_enabled: bool,
    pub timers_enabled: bool,
    pub bios_hle: bool,
    pub clock_freq: u32,
}

impl GbaConfig {
    pub fn new() -> Self {
        Self {
            ppu_enabled: true,
            dma_enabled: true,
            timers_enabled: true,
            bios_hle: true,
            clock_freq: 16_777_216,
        }
    }
}

impl Default for GbaConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Gba {
    pub cpu: Cpu,
    pub mmu: Mmu,
    config: Arc<Mutex<GbaConfig>>,
}

impl Gba {
    pub fn new() -> Self {
        Self::with_config(GbaConfig::new())
    }

    pub fn with_config(config: GbaConfig) -> Self {
        let mut cpu = Cpu::new();
        cpu.bios_hle = config.bios_hle;
        Self {
            cpu,
            mmu: Mmu::new(),
            config: Arc::new(Mutex::new(config)),
        }
    }

    pub fn config(&self) -> Arc<Mutex<GbaConfig>> {
        Arc::clone(&self.config)
    }

    pub fn reset(&mut self) {
        self.mmu.reset();
        self.boot();
    }

    /// Places the system in the direct-boot state and performs the
    /// initial frame setup a real cartridge expects immediately after
    /// the boot ROM hands off control.
    pub fn boot(&mut self) {
        self.cpu.direct_boot();
        self.cpu.bios_hle = self.config.lock().unwrap().bios_hle;
    }

    pub fn load_rom_file(&mut self, path: &str) -> Result<(), Error> {
        let data = read_file(path)?;
        self.load_rom_data(&data)
    }

    pub fn load_rom_data(&mut self, data: &[u8]) -> Result<(), Error> {
        let cartridge = Cartridge::from_data(data)?;
        self.mmu.load_rom(cartridge);
        self.boot();
        Ok(())
    }

    pub fn key_press(&mut self, key: PadKey) {
        self.mmu.pad.key_press(key);
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.mmu.pad.key_lift(key);
    }

    /// Latches a full keypad mask for the upcoming frame (0 = pressed),
    /// the shape the host shell's input polling hands over once per
    /// frame.
    pub fn set_input_mask(&mut self, mask: u16) {
        self.mmu.pad.set_mask(mask);
    }

    pub fn framebuffer(&self) -> &[u8] {
        &self.mmu.ppu.framebuffer
    }

    /// Runs a single CPU step and feeds its cycle cost through the
    /// peripherals in the fixed order the concurrency model specifies:
    /// PPU, timers, DMA-timing hooks, then the interrupt predicate.
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.mmu);

        let config = *self.config.lock().unwrap();

        if config.ppu_enabled {
            let events = self.mmu.ppu.advance(cycles, &mut self.mmu.irq);
            if config.dma_enabled {
                if events.hblank {
                    self.mmu.fire_dma(DmaTiming::HBlank);
                }
                if events.vblank {
                    self.mmu.fire_dma(DmaTiming::VBlank);
                }
            }
        }

        if config.timers_enabled {
            self.mmu.timer.advance(cycles, &mut self.mmu.irq);
        }

        self.mmu.irq.check(&mut self.cpu);
        if self.cpu.bios_hle && self.cpu.regs.mode() == crate::cpu::Mode::Irq && self.cpu.regs.pc() == crate::cpu::VECTOR_IRQ {
            let handler = self.mmu.read32(USER_IRQ_HANDLER_PTR);
            if handler != 0 {
                self.cpu.regs.set_pc(handler);
            }
        }

        cycles
    }

    /// Runs steps until one full frame (one VBlank-to-VBlank cycle) of
    /// cycles has elapsed.
    pub fn step_frame(&mut self) {
        let mut total = 0u32;
        while total < crate::consts::CYCLES_PER_FRAME {
            total += self.step();
        }
    }

    pub fn description_debug(&self) -> String {
        format!(
            "{}\nPC=0x{:08x} CPSR=0x{:08x} mode={:?} thumb={} halted={}\nVCOUNT={} DISPCNT=0x{:04x} DISPSTAT=0x{:04x}",
            Info::name(),
            self.cpu.regs.pc(),
            self.cpu.regs.cpsr,
            self.cpu.regs.mode(),
            self.cpu.regs.thumb(),
            self.cpu.regs.halted,
            self.mmu.ppu.vcount,
            self.mmu.ppu.dispcnt,
            self.mmu.ppu.dispstat,
        )
    }
}

impl Default for Gba {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_lands_at_rom_base() {
        let mut gba = Gba::new();
        gba.boot();
        assert_eq!(gba.cpu.regs.pc(), crate::consts::ROM_BASE);
    }

    #[test]
    fn test_load_rom_rejects_empty_data() {
        let mut gba = Gba::new();
        assert!(gba.load_rom_data(&[]).is_err());
    }

    #[test]
    fn test_step_executes_an_instruction() {
        let mut rom = vec![0u8; 0x1000];
        rom[0..4].copy_from_slice(&0xe3a0_0005u32.to_le_bytes()); // MOV R0, #5
        let mut gba = Gba::new();
        gba.load_rom_data(&rom).unwrap();
        gba.step();
        assert_eq!(gba.cpu.regs.r[0], 5);
    }
}
