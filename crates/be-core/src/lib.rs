pub mod character;
pub mod command;
pub mod condition;
pub mod config;
pub mod error;
pub mod ids;
pub mod instruction;
pub mod sheet;
pub mod trigger;

pub use character::*;
pub use command::*;
pub use condition::*;
pub use config::*;
pub use error::BattleEventError;
pub use ids::*;
pub use instruction::*;
pub use sheet::*;
pub use trigger::*;
