use crate::config::RunConfig;
use crate::memory::{Cartridge, CartridgeLoadError};
use crate::serialize::{self, SaveStateError};
use crate::EmulationState;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("error loading cartridge from {file_path}: {source}")]
    FileRead {
        file_path: String,
        #[source]
        source: CartridgeLoadError,
    },
    #[error("error reading cartridge RAM from {file_path}: {source}")]
    RamRead {
        file_path: String,
        #[source]
        source: io::Error,
    },
    #[error("error loading save state from {file_path}: {source}")]
    SaveState {
        file_path: String,
        #[source]
        source: SaveStateError,
    },
}

/// Load the cartridge named by the config and build a fresh emulation state around it. Persisted
/// battery RAM is restored if present, then the save state if one was requested.
///
/// # Errors
///
/// Returns an error if the cartridge, its RAM file, or the save state cannot be loaded.
pub fn init_emulation_state(run_config: &RunConfig) -> Result<EmulationState, StartupError> {
    let mut cartridge = Cartridge::from_file(&run_config.rom_file_path).map_err(|err| {
        StartupError::FileRead { file_path: run_config.rom_file_path.clone(), source: err }
    })?;

    if run_config.persist_cartridge_ram && cartridge.has_battery() {
        let ram_path = determine_cartridge_ram_path(&run_config.rom_file_path);
        if ram_path.is_file() {
            let ram = fs::read(&ram_path).map_err(|err| StartupError::RamRead {
                file_path: ram_path.display().to_string(),
                source: err,
            })?;
            cartridge.load_ram(&ram);

            log::info!("Loaded cartridge RAM from '{}'", ram_path.display());
        }
    }

    let mut state = EmulationState::new(cartridge);

    if let Some(load_state_path) = &run_config.load_state_path {
        serialize::load_state_from_file(load_state_path, &mut state).map_err(|err| {
            StartupError::SaveState { file_path: load_state_path.clone(), source: err }
        })?;
    }

    Ok(state)
}

pub fn determine_cartridge_ram_path<P: AsRef<Path>>(rom_file_path: P) -> PathBuf {
    rom_file_path.as_ref().with_extension("sav")
}

/// Write the cartridge RAM to `path`. Does nothing for cartridges without a battery.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_cartridge_ram<P: AsRef<Path>>(state: &EmulationState, path: P) -> io::Result<()> {
    let cartridge = state.address_space.get_cartridge();
    if !cartridge.has_battery() || cartridge.ram().is_empty() {
        return Ok(());
    }

    fs::write(path.as_ref(), cartridge.ram())?;

    log::info!("Wrote cartridge RAM to '{}'", path.as_ref().display());

    Ok(())
}
