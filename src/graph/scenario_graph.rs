use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Error, Result};

use super::actor::Actor;
use super::channel::Channel;
use super::ids::{ActorId, ChannelId, PortId, ScenarioId};
use super::port::{Direction, Port};
use super::storage::StorageDistribution;

/// A dataflow graph of actors and channels, parameterized per scenario.
/// Owns its actors and channels in flat arenas; all cross-references
/// (ports, channels) are dense indices, so cloning a `ScenarioGraph`
/// never needs to rewire anything.
#[derive(Debug, Clone, Default)]
pub struct ScenarioGraph {
    name: String,
    actors: Vec<Actor>,
    channels: Vec<Channel>,
    storage_distributions: HashMap<ScenarioId, BTreeSet<StorageDistribution>>,
}

impl ScenarioGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actors: Vec::new(),
            channels: Vec::new(),
            storage_distributions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        let id = ActorId(self.actors.len());
        self.actors.push(actor);
        id
    }

    pub fn add_channel(&mut self, channel: Channel) -> ChannelId {
        let id = ChannelId(self.channels.len());
        self.channels.push(channel);
        id
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut [Actor] {
        &mut self.actors
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn actor(&self, id: ActorId) -> &Actor {
        &self.actors[id.index()]
    }

    pub fn actor_mut(&mut self, id: ActorId) -> &mut Actor {
        &mut self.actors[id.index()]
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.actors[id.actor.index()].ports()[id.slot as usize]
    }

    pub fn actor_by_name(&self, name: &str) -> Result<ActorId> {
        self.actors
            .iter()
            .position(|a| a.name() == name)
            .map(ActorId)
            .ok_or_else(|| Error::NotFound {
                kind: "actor",
                name: name.to_string(),
            })
    }

    pub fn channel_by_name(&self, name: &str) -> Result<ChannelId> {
        self.channels
            .iter()
            .position(|c| c.name() == name)
            .map(ChannelId)
            .ok_or_else(|| Error::NotFound {
                kind: "channel",
                name: name.to_string(),
            })
    }

    /// Finds the channel connected to a port, if any.
    pub fn channel_of(&self, port: PortId) -> Option<ChannelId> {
        self.channels
            .iter()
            .position(|c| c.src() == port || c.dst() == port)
            .map(ChannelId)
    }

    pub fn storage_distributions(&self, scenario: ScenarioId) -> Option<&BTreeSet<StorageDistribution>> {
        self.storage_distributions.get(&scenario)
    }

    pub fn add_storage_distribution(&mut self, scenario: ScenarioId, dist: StorageDistribution) {
        self.storage_distributions.entry(scenario).or_default().insert(dist);
    }

    pub fn total_initial_tokens(&self) -> usize {
        self.channels.iter().map(|c| c.initial_tokens() as usize).sum()
    }

    pub fn total_final_tokens(&self) -> usize {
        self.channels.iter().map(|c| c.final_tokens() as usize).sum()
    }

    /// The global slot index of the first initial token of `channel`,
    /// under the contiguous-per-channel-in-iteration-order numbering used
    /// by the symbolic exploration.
    pub fn initial_slot_base(&self, channel: ChannelId) -> usize {
        self.channels[..channel.index()]
            .iter()
            .map(|c| c.initial_tokens() as usize)
            .sum()
    }

    pub fn final_slot_base(&self, channel: ChannelId) -> usize {
        self.channels[..channel.index()]
            .iter()
            .map(|c| c.final_tokens() as usize)
            .sum()
    }

    /// Canonical ordering of initial persistent-token global slot indices:
    /// sort names lexicographically within each channel, then concatenate
    /// in channel iteration order.
    pub fn persistent_initial_order(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut base = 0;
        for channel in &self.channels {
            let mut slots: Vec<(usize, &str)> = channel
                .persistent_initial_names()
                .iter()
                .enumerate()
                .map(|(slot, name)| (slot, name.as_str()))
                .collect();
            slots.sort_by_key(|(_, name)| *name);
            out.extend(slots.into_iter().map(|(slot, _)| base + slot));
            base += channel.initial_tokens() as usize;
        }
        out
    }

    /// Same as [`Self::persistent_initial_order`] but over final tokens.
    pub fn persistent_final_order(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut base = 0;
        for channel in &self.channels {
            let mut slots: Vec<(usize, &str)> = channel
                .persistent_final_names()
                .iter()
                .enumerate()
                .map(|(slot, name)| (slot, name.as_str()))
                .collect();
            slots.sort_by_key(|(_, name)| *name);
            out.extend(slots.into_iter().map(|(slot, _)| base + slot));
            base += channel.final_tokens() as usize;
        }
        out
    }

    /// Checks the structural invariants: ports face the right direction
    /// across each channel, and (when well-formed) every port is connected
    /// to exactly one channel.
    pub fn validate(&self) -> Result<()> {
        let mut connected: HashSet<PortId> = HashSet::new();
        for channel in &self.channels {
            channel.validate()?;
            let src = self.port(channel.src());
            let dst = self.port(channel.dst());
            if src.direction() != Direction::Out {
                return Err(Error::PortChannelViolation(format!(
                            "channel '{}' source port is not Out",
                            channel.name()
                        )));
            }
            if dst.direction() != Direction::In {
                return Err(Error::PortChannelViolation(format!(
                            "channel '{}' destination port is not In",
                            channel.name()
                        )));
            }
            if !connected.insert(channel.src()) {
                return Err(Error::PortChannelViolation(format!(
                            "port {} is connected to more than one channel",
                            channel.src()
                        )));
            }
            if !connected.insert(channel.dst()) {
                return Err(Error::PortChannelViolation(format!(
                            "port {} is connected to more than one channel",
                            channel.dst()
                        )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::port::{Direction, Port};

    fn sg_with_channel(d: u32, names: &[&str]) -> ScenarioGraph {
        let mut sg = ScenarioGraph::new("g");
        let mut a = Actor::new("A", "t");
        a.add_port(Port::new("out", Direction::Out));
        let a_id = sg.add_actor(a);
        let mut b = Actor::new("B", "t");
        b.add_port(Port::new("in", Direction::In));
        let b_id = sg.add_actor(b);
        let src = PortId { actor: a_id, slot: 0 };
        let dst = PortId { actor: b_id, slot: 0 };
        let mut c = Channel::new("c", src, dst);
        c.set_initial_tokens(d);
        for n in names {
            c.add_persistent_initial_name(*n).unwrap();
        }
        sg.add_channel(c);
        sg
    }

    #[test]
    fn validates_direction_and_connectivity() {
        let sg = sg_with_channel(1, &["tok"]);
        assert!(sg.validate().is_ok());
    }

    #[test]
    fn persistent_order_sorts_lexicographically_per_channel() {
        let sg = sg_with_channel(2, &["zeta", "alpha"]);
        let order = sg.persistent_initial_order();
        // "alpha" (slot 1) sorts before "zeta" (slot 0)
        assert_eq!(order, vec![1, 0]);
    }
}
