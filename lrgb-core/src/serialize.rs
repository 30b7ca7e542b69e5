use crate::EmulationState;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("error serializing/deserializing state: {source}")]
    Serialization {
        #[from]
        source: bincode::Error,
    },
    #[error("error reading/writing state: {source}")]
    FileSystem {
        #[from]
        source: io::Error,
    },
    #[error("save state was created from a different cartridge image")]
    RomMismatch,
}

// serde only derives for arrays up to 32 elements
pub fn serialize_array<S, T, const N: usize>(
    array: &[T; N],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut state = serializer.serialize_tuple(N)?;
    for value in array {
        state.serialize_element(value)?;
    }
    state.end()
}

struct DeserializeArrayVisitor<T, const N: usize> {
    marker: PhantomData<T>,
}

impl<'de, T, const N: usize> Visitor<'de> for DeserializeArrayVisitor<T, N>
where
    T: Deserialize<'de> + Default + Copy,
{
    type Value = [T; N];

    fn expecting(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "an array of size {N}")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut array = [T::default(); N];

        for (i, value) in array.iter_mut().enumerate() {
            *value = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }

        if seq.next_element::<T>()?.is_some() {
            return Err(de::Error::custom(format!("array has more than {N} elements")));
        }

        Ok(array)
    }
}

pub fn deserialize_array<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default + Copy,
{
    deserializer.deserialize_tuple(N, DeserializeArrayVisitor { marker: PhantomData })
}

pub fn determine_save_state_path<P: AsRef<Path>>(rom_file_path: P) -> PathBuf {
    rom_file_path.as_ref().with_extension("ss0")
}

/// Serialize the CPU, memory, interrupt and joypad state. The cartridge ROM is not included.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn save_state(state: &EmulationState) -> Result<Vec<u8>, SaveStateError> {
    Ok(bincode::serialize(state)?)
}

/// Replace `state` with a previously saved state. The saved state must have been created from the
/// same cartridge image; the ROM and any outstanding input senders are carried over from `state`.
/// On error, `state` is left unmodified.
///
/// # Errors
///
/// Returns an error if the bytes cannot be deserialized or if they were saved from a different
/// cartridge.
pub fn load_state(bytes: &[u8], state: &mut EmulationState) -> Result<(), SaveStateError> {
    let mut loaded: EmulationState = bincode::deserialize(bytes)?;

    if !loaded.address_space.get_cartridge().same_image_as(state.address_space.get_cartridge()) {
        return Err(SaveStateError::RomMismatch);
    }

    loaded.move_unserializable_fields_from(state);
    *state = loaded;

    Ok(())
}

pub fn save_state_to_file<P>(state: &EmulationState, path: P) -> Result<(), SaveStateError>
where
    P: AsRef<Path>,
{
    let serialized_state = save_state(state)?;
    fs::write(path.as_ref(), serialized_state)?;

    log::info!("Successfully wrote save state to '{}'", path.as_ref().display());

    Ok(())
}

pub fn load_state_from_file<P>(path: P, state: &mut EmulationState) -> Result<(), SaveStateError>
where
    P: AsRef<Path>,
{
    let serialized_state = fs::read(path.as_ref())?;
    load_state(&serialized_state, state)?;

    log::info!("Successfully loaded save state from '{}'", path.as_ref().display());

    Ok(())
}
