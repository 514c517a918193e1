use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::ids::{PortId, ScenarioId};

/// A FIFO connecting a unique source (`Out`) port to a unique destination
/// (`In`) port.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    src: PortId,
    dst: PortId,
    initial_tokens: u32,
    final_tokens: u32,
    persistent_initial_names: Vec<String>,
    persistent_final_names: Vec<String>,
    token_size: BTreeMap<ScenarioId, u64>,
}

impl Channel {
    pub fn new(name: impl Into<String>, src: PortId, dst: PortId) -> Self {
        Self {
            name: name.into(),
            src,
            dst,
            initial_tokens: 0,
            final_tokens: 0,
            persistent_initial_names: Vec::new(),
            persistent_final_names: Vec::new(),
            token_size: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn src(&self) -> PortId {
        self.src
    }

    pub fn dst(&self) -> PortId {
        self.dst
    }

    pub fn initial_tokens(&self) -> u32 {
        self.initial_tokens
    }

    pub fn final_tokens(&self) -> u32 {
        self.final_tokens
    }

    pub fn set_initial_tokens(&mut self, d: u32) {
        self.initial_tokens = d;
    }

    pub fn set_final_tokens(&mut self, d: u32) {
        self.final_tokens = d;
    }

    pub fn persistent_initial_names(&self) -> &[String] {
        &self.persistent_initial_names
    }

    pub fn persistent_final_names(&self) -> &[String] {
        &self.persistent_final_names
    }

    pub fn add_persistent_initial_name(&mut self, name: impl Into<String>) -> Result<()> {
        if self.persistent_initial_names.len() as u32 >= self.initial_tokens {
            return Err(Error::PortChannelViolation(format!(
                        "channel '{}' already has {} persistent initial-token names for {} initial tokens",
                        self.name, self.persistent_initial_names.len(), self.initial_tokens
                    )));
        }
        self.persistent_initial_names.push(name.into());
        Ok(())
    }

    pub fn add_persistent_final_name(&mut self, name: impl Into<String>) -> Result<()> {
        if self.persistent_final_names.len() as u32 >= self.final_tokens {
            return Err(Error::PortChannelViolation(format!(
                        "channel '{}' already has {} persistent final-token names for {} final tokens",
                        self.name, self.persistent_final_names.len(), self.final_tokens
                    )));
        }
        self.persistent_final_names.push(name.into());
        Ok(())
    }

    pub fn set_token_size(&mut self, scenario: ScenarioId, size: u64) {
        self.token_size.insert(scenario, size);
    }

    pub fn token_size(&self, scenario: ScenarioId) -> u64 {
        self.token_size.get(&scenario).copied().unwrap_or(0)
    }

    /// Checks the channel invariants: persistent-name counts never exceed
    /// the corresponding token counts, and a zero token count rules out any
    /// persistent names at all.
    pub fn validate(&self) -> Result<()> {
        if self.persistent_initial_names.len() as u32 > self.initial_tokens {
            return Err(Error::PortChannelViolation(format!(
                        "channel '{}': more persistent initial names than initial tokens",
                        self.name
                    )));
        }
        if self.persistent_final_names.len() as u32 > self.final_tokens {
            return Err(Error::PortChannelViolation(format!(
                        "channel '{}': more persistent final names than final tokens",
                        self.name
                    )));
        }
        if self.initial_tokens == 0 && !self.persistent_initial_names.is_empty() {
            return Err(Error::PortChannelViolation(format!(
                        "channel '{}': zero initial tokens but persistent initial names present",
                        self.name
                    )));
        }
        if self.final_tokens == 0 && !self.persistent_final_names.is_empty() {
            return Err(Error::PortChannelViolation(format!(
                        "channel '{}': zero final tokens but persistent final names present",
                        self.name
                    )));
        }
        Ok(())
    }
}
