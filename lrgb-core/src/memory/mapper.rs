use crate::memory::address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapperType {
    None,
    MBC1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct MapperFeatures {
    pub(crate) has_ram: bool,
    pub(crate) has_battery: bool,
}

/// Decode the cartridge type byte at 0x0147. Returns None for cartridge types that are not
/// supported.
pub(crate) fn parse_mapper_type(type_byte: u8) -> Option<(MapperType, MapperFeatures)> {
    let (mapper_type, has_ram, has_battery) = match type_byte {
        0x00 => (MapperType::None, false, false),
        0x01 => (MapperType::MBC1, false, false),
        0x02 => (MapperType::MBC1, true, false),
        0x03 => (MapperType::MBC1, true, true),
        _ => return None,
    };

    Some((mapper_type, MapperFeatures { has_ram, has_battery }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamMapResult {
    // Relative address into the full RAM array
    RamAddress(u32),
    // The RAM address is invalid or RAM access is disabled
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum BankingMode {
    Rom,
    Ram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Mapper {
    None,
    MBC1 {
        ram_enabled: bool,
        // Never 0; a write of 0 selects bank 1
        rom_bank_low: u8,
        // Upper ROM bank bits in ROM banking mode, RAM bank number in RAM banking mode
        bank_high: u8,
        banking_mode: BankingMode,
    },
}

impl Mapper {
    pub(crate) fn new(mapper_type: MapperType) -> Self {
        match mapper_type {
            MapperType::None => Self::None,
            MapperType::MBC1 => Self::MBC1 {
                ram_enabled: false,
                rom_bank_low: 0x01,
                bank_high: 0x00,
                banking_mode: BankingMode::Rom,
            },
        }
    }

    /// The bank currently mapped into 0x4000-0x7FFF.
    pub(crate) fn rom_bank(&self) -> u32 {
        match *self {
            Self::None => 1,
            Self::MBC1 { rom_bank_low, bank_high, banking_mode, .. } => match banking_mode {
                BankingMode::Rom => u32::from((bank_high << 5) | rom_bank_low),
                BankingMode::Ram => u32::from(rom_bank_low),
            },
        }
    }

    /// The bank currently mapped into 0xA000-0xBFFF.
    pub(crate) fn ram_bank(&self) -> u32 {
        match *self {
            Self::None => 0,
            Self::MBC1 { bank_high, banking_mode, .. } => match banking_mode {
                BankingMode::Rom => 0,
                BankingMode::Ram => u32::from(bank_high),
            },
        }
    }

    /// Map a CPU address in 0x0000-0x7FFF to an offset into the full ROM image.
    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        match address {
            address @ address::ROM_START..=0x3FFF => u32::from(address),
            address @ address::SWITCHABLE_ROM_START..=address::ROM_END => {
                let relative_address = u32::from(address - address::SWITCHABLE_ROM_START);
                (self.rom_bank() << 14) + relative_address
            }
            _ => panic!("mapper called for address outside of cartridge ROM range: {address:04X}"),
        }
    }

    // ROM writes don't actually modify the ROM (it is read-only after all) but they do modify
    // cartridge registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::MBC1 { ram_enabled, rom_bank_low, bank_high, banking_mode } => match address {
                _address @ 0x0000..=0x1FFF => {
                    log::trace!("ram_enable changed to {value:02X}");
                    *ram_enabled = value & 0x0F == 0x0A;
                }
                _address @ 0x2000..=0x3FFF => {
                    log::trace!("rom_bank_number changed to {value:02X}");
                    *rom_bank_low = match value & 0x1F {
                        0x00 => 0x01,
                        bank => bank,
                    };
                }
                _address @ 0x4000..=0x5FFF => {
                    log::trace!("ram_bank_number changed to {value:02X}");
                    *bank_high = value & 0x03;
                }
                _address @ 0x6000..=0x7FFF => {
                    log::trace!("banking_mode_select changed to {value:02X}");
                    *banking_mode =
                        if value & 0x01 != 0 { BankingMode::Ram } else { BankingMode::Rom };
                }
                _ => panic!("invalid ROM write address in MBC1 mapper: {address:04X}"),
            },
        }
    }

    pub(crate) fn map_ram_address(&self, address: u16) -> RamMapResult {
        let relative_address = u32::from(address - address::EXTERNAL_RAM_START);

        match self {
            // Without a mapper there is no RAM enable register, so RAM stays inaccessible
            Self::None => RamMapResult::None,
            &Self::MBC1 { ram_enabled, .. } => {
                if ram_enabled {
                    RamMapResult::RamAddress((self.ram_bank() << 13) + relative_address)
                } else {
                    RamMapResult::None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper_types() {
        assert_eq!(Some((MapperType::None, MapperFeatures::default())), parse_mapper_type(0x00));
        assert_eq!(
            Some((MapperType::MBC1, MapperFeatures { has_ram: true, has_battery: true })),
            parse_mapper_type(0x03)
        );
        assert_eq!(None, parse_mapper_type(0x05));
        assert_eq!(None, parse_mapper_type(0x13));
    }

    #[test]
    fn mbc1_zero_bank_selects_one() {
        let mut mapper = Mapper::new(MapperType::MBC1);

        mapper.write_rom_address(0x2000, 0x00);
        assert_eq!(1, mapper.rom_bank());
        assert_eq!(0x4010, mapper.map_rom_address(0x4010));

        // Only the low 5 bits are considered when checking for 0
        mapper.write_rom_address(0x3FFF, 0x20);
        assert_eq!(1, mapper.rom_bank());

        mapper.write_rom_address(0x2000, 0x1F);
        assert_eq!(0x1F, mapper.rom_bank());
    }

    #[test]
    fn mbc1_banking_modes() {
        let mut mapper = Mapper::new(MapperType::MBC1);
        mapper.write_rom_address(0x2000, 0x05);
        mapper.write_rom_address(0x4000, 0x02);

        // ROM banking mode: high bits extend the ROM bank, RAM fixed to bank 0
        assert_eq!(0x45, mapper.rom_bank());
        assert_eq!(0, mapper.ram_bank());
        assert_eq!(0x45 * 0x4000 + 0x0123, mapper.map_rom_address(0x4123));

        // RAM banking mode: high bits select the RAM bank
        mapper.write_rom_address(0x6000, 0x01);
        assert_eq!(0x05, mapper.rom_bank());
        assert_eq!(2, mapper.ram_bank());

        // Bank 0 window is never affected
        assert_eq!(0x3FFF, mapper.map_rom_address(0x3FFF));
    }

    #[test]
    fn mbc1_ram_enable() {
        let mut mapper = Mapper::new(MapperType::MBC1);
        assert_eq!(RamMapResult::None, mapper.map_ram_address(0xA000));

        mapper.write_rom_address(0x0000, 0x0A);
        assert_eq!(RamMapResult::RamAddress(0x0005), mapper.map_ram_address(0xA005));

        // Only the low nibble matters
        mapper.write_rom_address(0x1FFF, 0xFA);
        assert_eq!(RamMapResult::RamAddress(0x0000), mapper.map_ram_address(0xA000));

        mapper.write_rom_address(0x6000, 0x01);
        mapper.write_rom_address(0x4000, 0x03);
        assert_eq!(RamMapResult::RamAddress(3 * 0x2000 + 0x1FFF), mapper.map_ram_address(0xBFFF));

        mapper.write_rom_address(0x0000, 0x0B);
        assert_eq!(RamMapResult::None, mapper.map_ram_address(0xA000));
    }

    #[test]
    fn no_mapper_ignores_writes() {
        let mut mapper = Mapper::new(MapperType::None);
        mapper.write_rom_address(0x2000, 0x03);
        mapper.write_rom_address(0x0000, 0x0A);

        assert_eq!(0x4010, mapper.map_rom_address(0x4010));
        assert_eq!(RamMapResult::None, mapper.map_ram_address(0xA000));
    }
}
