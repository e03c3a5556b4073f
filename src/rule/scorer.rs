//! 优先级评分器
//! 核心职责：
//! 1. 按标签前缀提取规则优先级（前缀后接单个数字，大小写不敏感）
//! 2. 将优先级归一化为 [0,100] 分值
//! 3. 统计各优先级频次，供运行时汇报
//!
//! 评分方向约定：优先级数字越小紧急度越高，归一化后分值越高
//! （P1 → 100，Pmax → 最低档），与图例的反向映射保持一致

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::HmResult;
use crate::rule::model::DetectionRule;

/// 优先级评分器
/// 设计：正则在构造时编译一次，整个运行周期复用
pub struct PriorityScorer {
    pattern: Regex,
}

impl PriorityScorer {
    /// 构建评分器
    /// 参数：tag_prefix - 优先级标签前缀（字面量，内部转义后拼入正则）
    pub fn new(tag_prefix: &str) -> HmResult<Self> {
        // 大小写不敏感前缀 + 单个数字，数字后允许任意尾随内容
        let pattern = Regex::new(&format!(r"(?i)^{}(\d)", regex::escape(tag_prefix)))?;
        Ok(Self { pattern })
    }

    /// 从标签列表提取优先级
    /// 规则：
    /// 1. 按扫描顺序匹配，最后一个命中的标签生效
    /// 2. 数字 0 不是合法优先级，跳过
    /// 3. 无命中返回 None
    pub fn extract_priority(&self, tags: &[String]) -> Option<u8> {
        let mut priority = None;
        for tag in tags {
            if let Some(caps) = self.pattern.captures(tag) {
                // 捕获组固定为单个数字，parse 不会失败
                if let Ok(value) = caps[1].parse::<u8>() {
                    if value == 0 {
                        warn!("ignoring tag with priority 0: {}", tag);
                        continue;
                    }
                    priority = Some(value);
                }
            }
        }
        priority
    }

    /// 扫描整个规则集，建立规则ID → 优先级索引
    /// 无任何命中时 max 为 None，所有规则按 0 分处理
    pub fn collect(&self, rules: &[DetectionRule]) -> PriorityIndex {
        let mut by_rule = HashMap::new();
        for rule in rules {
            if let Some(priority) = self.extract_priority(&rule.tags) {
                by_rule.insert(rule.id.clone(), priority);
            }
        }
        let max = by_rule.values().copied().max();
        debug!(
            "priority index built: {} tagged rules, max priority {:?}",
            by_rule.len(),
            max
        );
        PriorityIndex { by_rule, max }
    }
}

/// 运行期优先级索引（规则ID → 优先级 + 当次运行观测到的最大优先级）
#[derive(Debug, Clone)]
pub struct PriorityIndex {
    by_rule: HashMap<String, u8>,
    max: Option<u8>,
}

impl PriorityIndex {
    /// 查询规则归一化分值
    /// 策略（显式约定）：无优先级标签的规则得 0 分，但仍计入规则总数
    pub fn score_for(&self, rule_id: &str) -> u8 {
        match (self.by_rule.get(rule_id), self.max) {
            (Some(&priority), Some(max)) => normalize_score(priority, max),
            _ => 0,
        }
    }

    /// 当次运行观测到的最大优先级
    pub fn max_priority(&self) -> Option<u8> {
        self.max
    }

    /// 各优先级频次（升序）
    pub fn level_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for priority in self.by_rule.values() {
            *counts.entry(*priority).or_insert(0usize) += 1;
        }
        counts
    }

    /// 输出各优先级频次及其占规则总数的百分比
    /// 参数：total_rules - 规则总数（含无标签规则）
    pub fn report(&self, total_rules: usize) {
        for (level, count) in self.level_counts() {
            let percent = if total_rules == 0 {
                0.0
            } else {
                count as f64 / total_rules as f64 * 100.0
            };
            info!("Priority {} = {} [{:.1}%]", level, count, percent);
        }
        let untagged = total_rules.saturating_sub(self.by_rule.len());
        if untagged > 0 {
            info!("Untagged rules (score 0) = {}", untagged);
        }
    }
}

/// 优先级归一化
/// 公式：round(((max + 1 - priority) / max) * 100)，优先级 1 映射 100 分
pub fn normalize_score(priority: u8, max: u8) -> u8 {
    if max == 0 || priority > max {
        return 0;
    }
    let score = ((max + 1 - priority) as f64 / max as f64 * 100.0).round();
    score.min(100.0) as u8
}
