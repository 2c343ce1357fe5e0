//! Cartridge (ROM) loading and addressing.
//!
//! Unlike the Game Boy there is no MBC banking to emulate: a GBA cartridge
//! is simply mapped, read-only, starting at [`crate::consts::ROM_BASE`].
//! Backup-memory persistence (SRAM/flash/EEPROM) is out of scope.

use core::fmt;
use std::fmt::{Display, Formatter};

use rustboy_advance_common::error::Error;

use crate::consts::ROM_MAX_SIZE;
use crate::debugln;

pub struct Cartridge {
    data: Vec<u8>,
}

impl Cartridge {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        if data.is_empty() || data.len() as u32 > ROM_MAX_SIZE {
            return Err(Error::RomSize);
        }
        debugln!("Loaded ROM with {} bytes", data.len());
        Ok(Self {
            data: data.to_vec(),
        })
    }

    pub fn title(&self) -> String {
        if self.data.len() < 0xac + 12 {
            return String::new();
        }
        String::from_utf8_lossy(&self.data[0xa0..0xac])
            .trim_end_matches('\0')
            .to_string()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn read8(&self, offset: u32) -> u8 {
        *self.data.get(offset as usize).unwrap_or(&0xff)
    }

    pub fn read16(&self, offset: u32) -> u16 {
        u16::from_le_bytes([self.read8(offset), self.read8(offset + 1)])
    }

    pub fn read32(&self, offset: u32) -> u32 {
        u32::from_le_bytes([
            self.read8(offset),
            self.read8(offset + 1),
            self.read8(offset + 2),
            self.read8(offset + 3),
        ])
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Cartridge: \"{}\" ({} bytes)", self.title(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_rom() {
        assert!(Cartridge::from_data(&[]).is_err());
    }

    #[test]
    fn test_reads_title_from_header() {
        let mut data = vec![0u8; 0x100];
        data[0xa0..0xa5].copy_from_slice(b"HELLO");
        let cart = Cartridge::from_data(&data).unwrap();
        assert_eq!(cart.title(), "HELLO");
    }

    #[test]
    fn test_out_of_range_reads_as_open_bus() {
        let cart = Cartridge::from_data(&[1, 2, 3, 4]).unwrap();
        assert_eq!(cart.read8(1000), 0xff);
    }
}
