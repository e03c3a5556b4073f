//! 规则展平器
//! 将规则的 威胁→战术→技术→子技术 嵌套结构展平为技术条目列表
//! 设计：纯函数折叠，不依赖任何全局可变累加器
//!
//! 展平规则：
//! 1. 缺失战术名的威胁分组整体跳过
//! 2. 每个 (技术, 战术) 对产出一条条目，子技术继承父技术的战术/分值/备注
//! 3. 不去重，条目顺序与输入迭代顺序一致

use crate::layer::model::TechniqueEntry;
use crate::rule::model::DetectionRule;
use crate::rule::scorer::PriorityIndex;

/// 展平整个规则集
pub fn flatten_rules(rules: &[DetectionRule], index: &PriorityIndex) -> Vec<TechniqueEntry> {
    rules
        .iter()
        .flat_map(|rule| flatten_rule(rule, index.score_for(&rule.id)))
        .collect()
}

/// 展平单条规则，产出 0..N 条技术条目
pub fn flatten_rule(rule: &DetectionRule, score: u8) -> Vec<TechniqueEntry> {
    let comment = join_references(&rule.references);
    let mut entries = Vec::new();

    for threat in &rule.threat {
        // 战术名缺失则跳过该分组
        let Some(tactic) = threat.tactic.as_ref().filter(|t| !t.name.is_empty()) else {
            continue;
        };
        let slug = tactic_slug(&tactic.name);

        for technique in &threat.technique {
            if technique.id.is_empty() {
                continue;
            }
            entries.push(TechniqueEntry::new(
                technique.id.clone(),
                slug.clone(),
                comment.clone(),
                score,
            ));
            for sub in &technique.subtechnique {
                if sub.id.is_empty() {
                    continue;
                }
                entries.push(TechniqueEntry::new(
                    sub.id.clone(),
                    slug.clone(),
                    comment.clone(),
                    score,
                ));
            }
        }
    }
    entries
}

/// 战术名规范化（小写 + 空格转连字符）
pub fn tactic_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// 引用列表拼接为备注（空行分隔，无引用返回空串）
fn join_references(references: &[String]) -> String {
    references.join("\n\n")
}
