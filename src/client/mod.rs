//! 拉取模块
//! 统一导出规则拉取组件

pub mod fetcher;

pub use fetcher::RuleFetcher;
