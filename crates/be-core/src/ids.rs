use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque 128-bit identity. Only equality and hashing are meaningful.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(CharacterId);
define_id!(ActorId);
define_id!(RunnerKey);
define_id!(ItemId);
define_id!(SkillId);
define_id!(StatusId);

impl RunnerKey {
    /// Canonical key of the runner executing an actor's current page.
    pub fn for_actor(actor: ActorId) -> Self {
        Self(*actor.as_uuid())
    }
}
