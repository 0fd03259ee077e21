// 協調・斥力判定
pub mod criteria;

// 回避解の合成
pub mod resolver;

pub use criteria::RepulsiveCriterion;
pub use resolver::{ConflictResolver, ResolutionKind, ResolutionParams};
