use std::fmt;

/// Declares a newtype wrapping a dense `usize` index, the arena-storage
/// replacement for the source's cyclic pointer references.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(i: usize) -> Self {
                Self(i)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(ActorId);
define_id!(ChannelId);
define_id!(ScenarioId);
define_id!(ScenarioGraphId);
define_id!(FsmStateId);

/// A port is addressed by its owning actor and a slot within that actor's
/// port list (declaration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId {
    pub actor: ActorId,
    pub slot: u16,
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor, self.slot)
    }
}
