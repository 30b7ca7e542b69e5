mod config;
mod script;

use crate::config::CliConfig;
use crate::script::InputScript;
use anyhow::Context;
use clap::Parser;
use lrgb_core::{CpuRegisters, EmulationState, RunConfig, RunState};

#[derive(Parser)]
struct Cli {
    #[arg(short = 'f', long = "rom_file_path")]
    rom_file_path: String,
    /// Maximum number of CPU steps to run
    #[arg(long = "steps")]
    steps: Option<u64>,
    /// TOML file supplying defaults for the other options
    #[arg(long = "config")]
    config: Option<String>,
    /// Joypad script with lines of the form `<step> press|release <button>`
    #[arg(long = "input")]
    input: Option<String>,
    #[arg(long = "load_state")]
    load_state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    StepLimit,
    Stopped,
    HaltedForever,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = Cli::parse();

    let cli_config = match &args.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };

    let run_config = RunConfig {
        rom_file_path: args.rom_file_path,
        max_steps: args.steps.or(cli_config.max_steps),
        load_state_path: args.load_state,
        persist_cartridge_ram: cli_config.persist_cartridge_ram,
    };

    log::info!("Running with config:\n{run_config}");

    let mut input_script = match &args.input {
        Some(path) => InputScript::from_file(path)?,
        None => InputScript::default(),
    };

    let mut state = lrgb_core::init_emulation_state(&run_config)?;

    let result = run(&mut state, run_config.max_steps, &mut input_script);

    if run_config.persist_cartridge_ram {
        let ram_path = lrgb_core::determine_cartridge_ram_path(&run_config.rom_file_path);
        lrgb_core::save_cartridge_ram(&state, &ram_path)
            .with_context(|| format!("error writing cartridge RAM to '{}'", ram_path.display()))?;
    }

    if cli_config.save_state_on_exit {
        let state_path = lrgb_core::determine_save_state_path(&run_config.rom_file_path);
        lrgb_core::save_state_to_file(&state, state_path)?;
    }

    let (steps, cycles, stop_reason) = result?;

    println!("{steps} steps, {cycles} cycles, {stop_reason:?}");
    if cli_config.print_registers {
        println!("{}", format_registers(state.cpu().registers()));
    }

    Ok(())
}

/// Step until the step limit is hit or nothing can ever change the CPU's state again.
fn run(
    state: &mut EmulationState,
    max_steps: Option<u64>,
    input_script: &mut InputScript,
) -> Result<(u64, u64, StopReason), anyhow::Error> {
    let sender = state.input_sender();

    let mut steps = 0_u64;
    let mut cycles = 0_u64;
    loop {
        if max_steps.is_some_and(|max_steps| steps >= max_steps) {
            return Ok((steps, cycles, StopReason::StepLimit));
        }

        input_script.feed(steps, &sender);

        let pc = state.cpu().registers().pc;
        let step_cycles = state
            .step()
            .with_context(|| format!("execution failed after {steps} steps at PC={pc:04X}"))?;
        cycles += u64::from(step_cycles);
        steps += 1;

        if input_script.is_exhausted() {
            match state.cpu().run_state() {
                RunState::Stopped => return Ok((steps, cycles, StopReason::Stopped)),
                RunState::Halted if !state.address_space().interrupts().any_pending() => {
                    return Ok((steps, cycles, StopReason::HaltedForever));
                }
                _ => {}
            }
        }
    }
}

fn format_registers(registers: &CpuRegisters) -> String {
    format!(
        "AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X} PC={:04X} [{}{}{}{}]",
        registers.af(),
        registers.bc(),
        registers.de(),
        registers.hl(),
        registers.sp,
        registers.pc,
        if registers.zero_flag() { 'Z' } else { '-' },
        if registers.subtract_flag() { 'N' } else { '-' },
        if registers.half_carry_flag() { 'H' } else { '-' },
        if registers.carry_flag() { 'C' } else { '-' },
    )
}
