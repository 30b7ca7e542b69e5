pub mod address;
mod mapper;


use crate::input::JoypadState;
use crate::interrupts::InterruptController;
use crate::memory::mapper::{Mapper, MapperFeatures, RamMapResult};
use crate::serialize;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// Images smaller than two 16KB banks are rejected.
pub const MIN_ROM_SIZE: usize = 0x8000;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("error reading cartridge file: {source}")]
    FileRead {
        #[from]
        source: io::Error,
    },
    #[error("cartridge image is {size} bytes, must be at least {MIN_ROM_SIZE} bytes")]
    TooSmall { size: usize },
    #[error("unsupported cartridge type byte: {type_byte:02X}")]
    UnsupportedMapper { type_byte: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cartridge {
    #[serde(skip)]
    rom: Vec<u8>,
    ram: Vec<u8>,
    mapper: Mapper,
    has_battery: bool,
    header_checksum: u8,
    global_checksum: u16,
}

impl Cartridge {
    /// Validate the header of the given ROM image and set up the appropriate mapper and RAM.
    ///
    /// # Errors
    ///
    /// This function will return an error if the image is smaller than [`MIN_ROM_SIZE`] or if the
    /// cartridge type byte at 0x0147 is not supported.
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        if rom.len() < MIN_ROM_SIZE {
            return Err(CartridgeLoadError::TooSmall { size: rom.len() });
        }

        let type_byte = rom[address::MAPPER as usize];
        let Some((mapper_type, MapperFeatures { has_ram, has_battery })) =
            mapper::parse_mapper_type(type_byte)
        else {
            return Err(CartridgeLoadError::UnsupportedMapper { type_byte });
        };

        let ram_size_code = rom[address::RAM_SIZE as usize];
        let ram_size = match ram_size_code {
            0x00 => 0,
            0x02 => 8 * 1024,
            0x03 => 32 * 1024,
            _ => {
                log::warn!("unsupported RAM size code {ram_size_code:02X}, using no RAM");
                0
            }
        };
        if ram_size > 0 && !has_ram {
            log::debug!(
                "cartridge type {type_byte:02X} has no RAM, ignoring size code {ram_size_code:02X}"
            );
        }

        log::debug!(
            "loaded cartridge: mapper={mapper_type:?}, ROM size={}, RAM size={ram_size}, \
             battery={has_battery}",
            rom.len()
        );

        let header_checksum = rom[address::HEADER_CHECKSUM as usize];
        let global_checksum = u16::from_be_bytes([
            rom[address::GLOBAL_CHECKSUM as usize],
            rom[address::GLOBAL_CHECKSUM as usize + 1],
        ]);

        Ok(Self {
            rom,
            ram: vec![0x00; ram_size],
            mapper: Mapper::new(mapper_type),
            has_battery,
            header_checksum,
            global_checksum,
        })
    }

    pub fn from_file<P>(file_path: P) -> Result<Self, CartridgeLoadError>
    where
        P: AsRef<Path>,
    {
        let rom = fs::read(file_path.as_ref())?;
        Self::new(rom)
    }

    pub fn read_rom(&self, address: u16) -> u8 {
        let mapped_address = self.mapper.map_rom_address(address);
        self.rom.get(mapped_address as usize).copied().unwrap_or(0xFF)
    }

    pub fn write_rom(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    pub fn read_ram(&self, address: u16) -> u8 {
        match self.mapper.map_ram_address(address) {
            RamMapResult::RamAddress(ram_address) => {
                self.ram.get(ram_address as usize).copied().unwrap_or(0xFF)
            }
            RamMapResult::None => 0xFF,
        }
    }

    pub fn write_ram(&mut self, address: u16, value: u8) {
        if let RamMapResult::RamAddress(ram_address) = self.mapper.map_ram_address(address) {
            if let Some(ram_value) = self.ram.get_mut(ram_address as usize) {
                *ram_value = value;
            }
        }
    }

    /// The cartridge RAM contents, for persisting battery-backed saves.
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Restore previously persisted RAM contents. Extra bytes are ignored.
    pub fn load_ram(&mut self, ram: &[u8]) {
        let len = self.ram.len().min(ram.len());
        self.ram[..len].copy_from_slice(&ram[..len]);
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    pub(crate) fn same_image_as(&self, other: &Self) -> bool {
        self.header_checksum == other.header_checksum
            && self.global_checksum == other.global_checksum
    }

    pub(crate) fn move_unserializable_fields_from(&mut self, other: &mut Self) {
        self.rom = std::mem::take(&mut other.rom);
    }
}

/// The full 16-bit address space as seen by the CPU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSpace {
    cartridge: Cartridge,
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    vram: [u8; 8192],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    working_ram: [u8; 8192],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    oam: [u8; 160],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    io_registers: [u8; 128],
    #[serde(
        serialize_with = "serialize::serialize_array",
        deserialize_with = "serialize::deserialize_array"
    )]
    hram: [u8; 127],
    interrupts: InterruptController,
    joypad: JoypadState,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            vram: [0; 8192],
            working_ram: [0; 8192],
            oam: [0; 160],
            io_registers: [0; 128],
            hram: [0; 127],
            interrupts: InterruptController::new(),
            joypad: JoypadState::new(),
        }
    }

    /// Read the value at the given address. Unmapped addresses read as 0xFF.
    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => self.cartridge.read_rom(address),
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize]
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address::JOYPAD_REGISTER => self.joypad.read_register(),
            address::IF_REGISTER => self.interrupts.read_if(),
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers[(address - address::IO_REGISTERS_START) as usize]
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.interrupts.read_ie(),
        }
    }

    /// Read a little-endian 16-bit value; the high byte comes from `address + 1`.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    /// Write the value to the given address. Writes to read-only or unmapped addresses are
    /// silently dropped; writes to the ROM range go to the cartridge mapper registers.
    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize] = value;
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize] = value;
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address::JOYPAD_REGISTER => {
                self.joypad.write_register(value);
            }
            address::IF_REGISTER => {
                self.interrupts.write_if(value);
            }
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers[(address - address::IO_REGISTERS_START) as usize] = value;
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.interrupts.write_ie(value);
            }
        }
    }

    /// Write a little-endian 16-bit value; the high byte goes to `address + 1`.
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    pub fn get_cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn get_cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    pub fn joypad(&self) -> &JoypadState {
        &self.joypad
    }

    pub fn joypad_mut(&mut self) -> &mut JoypadState {
        &mut self.joypad
    }

    pub(crate) fn move_unserializable_fields_from(&mut self, other: &mut Self) {
        self.cartridge.move_unserializable_fields_from(&mut other.cartridge);
    }
}
