//! 规则模块
//! 统一导出规则数据模型、优先级评分与展平组件

pub mod flattener;
pub mod model;
pub mod scorer;

pub use flattener::{flatten_rule, flatten_rules, tactic_slug};
pub use model::{DetectionRule, RulePage, SubTechnique, Tactic, Technique, Threat};
pub use scorer::{normalize_score, PriorityIndex, PriorityScorer};
