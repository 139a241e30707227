pub mod enums;
pub mod rule;

pub use enums::{MatchFlags, MatchKind, Operator};
pub use rule::{Action, Condition, ConditionValue, HeaderField, Rule, BODY_SENTINEL};
