//! Address map and I/O register layout constants.

// Region bases, per the fixed GBA address map.
pub const BIOS_BASE: u32 = 0x0000_0000;
pub const BIOS_SIZE: u32 = 0x0000_4000;

pub const EWRAM_BASE: u32 = 0x0200_0000;
pub const EWRAM_SIZE: u32 = 0x0004_0000;

pub const IWRAM_BASE: u32 = 0x0300_0000;
pub const IWRAM_SIZE: u32 = 0x0000_8000;

pub const IO_BASE: u32 = 0x0400_0000;
pub const IO_SIZE: u32 = 0x0000_0400;

pub const PALETTE_BASE: u32 = 0x0500_0000;
pub const PALETTE_SIZE: u32 = 0x0000_0400;

pub const VRAM_BASE: u32 = 0x0600_0000;
pub const VRAM_SIZE: u32 = 0x0001_8000;

pub const OAM_BASE: u32 = 0x0700_0000;
pub const OAM_SIZE: u32 = 0x0000_0400;

pub const ROM_BASE: u32 = 0x0800_0000;
pub const ROM_MAX_SIZE: u32 = 0x0200_0000;

// I/O register offsets, relative to `IO_BASE`.
pub const REG_DISPCNT: u32 = 0x000;
pub const REG_DISPSTAT: u32 = 0x004;
pub const REG_VCOUNT: u32 = 0x006;
pub const REG_BG0CNT: u32 = 0x008;
pub const REG_BG1CNT: u32 = 0x00a;
pub const REG_BG2CNT: u32 = 0x00c;
pub const REG_BG3CNT: u32 = 0x00e;
pub const REG_BG0HOFS: u32 = 0x010;
pub const REG_BG0VOFS: u32 = 0x012;
pub const REG_BG1HOFS: u32 = 0x014;
pub const REG_BG1VOFS: u32 = 0x016;
pub const REG_BG2HOFS: u32 = 0x018;
pub const REG_BG2VOFS: u32 = 0x01a;
pub const REG_BG3HOFS: u32 = 0x01c;
pub const REG_BG3VOFS: u32 = 0x01e;

pub const REG_DMA0SAD: u32 = 0x0b0;
pub const REG_DMA0DAD: u32 = 0x0b4;
pub const REG_DMA0CNT_L: u32 = 0x0b8;
pub const REG_DMA0CNT_H: u32 = 0x0ba;
pub const REG_DMA1SAD: u32 = 0x0bc;
pub const REG_DMA1DAD: u32 = 0x0c0;
pub const REG_DMA1CNT_L: u32 = 0x0c4;
pub const REG_DMA1CNT_H: u32 = 0x0c6;
pub const REG_DMA2SAD: u32 = 0x0c8;
pub const REG_DMA2DAD: u32 = 0x0cc;
pub const REG_DMA2CNT_L: u32 = 0x0d0;
pub const REG_DMA2CNT_H: u32 = 0x0d2;
pub const REG_DMA3SAD: u32 = 0x0d4;
pub const REG_DMA3DAD: u32 = 0x0d8;
pub const REG_DMA3CNT_L: u32 = 0x0dc;
pub const REG_DMA3CNT_H: u32 = 0x0de;

pub const REG_TM0CNT_L: u32 = 0x100;
pub const REG_TM0CNT_H: u32 = 0x102;
pub const REG_TM1CNT_L: u32 = 0x104;
pub const REG_TM1CNT_H: u32 = 0x106;
pub const REG_TM2CNT_L: u32 = 0x108;
pub const REG_TM2CNT_H: u32 = 0x10a;
pub const REG_TM3CNT_L: u32 = 0x10c;
pub const REG_TM3CNT_H: u32 = 0x10e;

pub const REG_KEYINPUT: u32 = 0x130;

pub const REG_IE: u32 = 0x200;
pub const REG_IF: u32 = 0x202;
pub const REG_IME: u32 = 0x208;

// Scanline timing.
pub const CYCLES_PER_SCANLINE: u32 = 1232;
pub const CYCLES_HDRAW: u32 = 960;
pub const CYCLES_HBLANK: u32 = 272;
pub const VISIBLE_LINES: u16 = 160;
pub const TOTAL_LINES: u16 = 228;
pub const CYCLES_PER_FRAME: u32 = CYCLES_PER_SCANLINE * TOTAL_LINES as u32;

// Display surface.
pub const SCREEN_WIDTH: usize = 240;
pub const SCREEN_HEIGHT: usize = 160;
