//! rsheatmap - SIEM 检测规则 ATT&CK Navigator 热力图生成库
//!
//! 流水线：分页拉取规则 → 优先级标签评分 → 嵌套威胁结构展平 → 图层组装 → 写出

pub mod client;
pub mod config;
pub mod error;
pub mod layer;
pub mod rule;
pub mod writer;

// 导出全局错误类型
pub use self::error::{HeatmapError, HmResult};

// 导出配置模块核心结构体与构建器
pub use crate::config::{ConfigManager, CustomConfigBuilder, HeatmapConfig, OutputMode};

// 导出拉取模块核心接口
pub use crate::client::RuleFetcher;

// 导出规则模块核心数据结构与变换
pub use crate::rule::{
    flatten_rule, flatten_rules, normalize_score, tactic_slug, DetectionRule, PriorityIndex,
    PriorityScorer, RulePage,
};

// 导出图层模块核心结构体与构建器
pub use crate::layer::{LayerBuilder, NavigatorLayer, TechniqueEntry, LAYER_DOMAIN};

// 导出写出器
pub use crate::writer::LayerWriter;
