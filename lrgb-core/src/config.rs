use std::fmt::Formatter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub rom_file_path: String,
    /// Stop after this many CPU steps; `None` runs until the CPU stops or halts for good.
    pub max_steps: Option<u64>,
    pub load_state_path: Option<String>,
    pub persist_cartridge_ram: bool,
}

impl RunConfig {
    pub fn new(rom_file_path: impl Into<String>) -> Self {
        Self {
            rom_file_path: rom_file_path.into(),
            max_steps: None,
            load_state_path: None,
            persist_cartridge_ram: true,
        }
    }
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rom_file_path: {}", self.rom_file_path)?;
        writeln!(f, "max_steps: {}", fmt_option(self.max_steps.as_ref()))?;
        writeln!(f, "load_state_path: {}", fmt_option(self.load_state_path.as_ref()))?;
        writeln!(f, "persist_cartridge_ram: {}", self.persist_cartridge_ram)?;

        Ok(())
    }
}

fn fmt_option<T: std::fmt::Display>(option: Option<&T>) -> String {
    match option {
        Some(value) => format!("{value}"),
        None => "<None>".into(),
    }
}
