use anyhow::{anyhow, Context};
use lrgb_core::{Button, InputSender, JoypadEvent};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedInput {
    pub step: u64,
    pub event: JoypadEvent,
}

/// Joypad transitions to inject at fixed step numbers, in step order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputScript {
    inputs: Vec<ScriptedInput>,
    next: usize,
}

impl InputScript {
    pub fn from_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let script = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading input script from '{path:?}'"))?;
        Self::parse(&script).with_context(|| format!("error parsing input script at '{path:?}'"))
    }

    /// One transition per line: `<step> press|release <button>`. Blank lines and lines starting
    /// with `#` are skipped.
    pub fn parse(script: &str) -> Result<Self, anyhow::Error> {
        let mut inputs = Vec::new();

        for (i, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let input = parse_line(line).with_context(|| format!("line {}: '{line}'", i + 1))?;
            inputs.push(input);
        }

        // Stable, so same-step transitions keep their file order
        inputs.sort_by_key(|input| input.step);

        Ok(Self { inputs, next: 0 })
    }

    /// Send every transition scheduled at or before `step` that has not been sent yet.
    pub fn feed(&mut self, step: u64, sender: &InputSender) {
        while let Some(input) = self.inputs.get(self.next) {
            if input.step > step {
                break;
            }

            log::debug!("step {step}: sending {:?}", input.event);
            sender.send(input.event);
            self.next += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.inputs.len()
    }
}

fn parse_line(line: &str) -> Result<ScriptedInput, anyhow::Error> {
    let tokens: Vec<_> = line.split_whitespace().collect();
    let [step, action, button] = tokens[..] else {
        return Err(anyhow!("expected '<step> press|release <button>'"));
    };

    let step: u64 = step.parse().with_context(|| format!("invalid step number '{step}'"))?;
    let button: Button = button.parse()?;
    let event = match action.to_ascii_lowercase().as_str() {
        "press" => JoypadEvent::Pressed(button),
        "release" => JoypadEvent::Released(button),
        _ => return Err(anyhow!("invalid action '{action}', expected press or release")),
    };

    Ok(ScriptedInput { step, event })
}
