//! Navigator 图层数据模型定义
//! 对应 ATT&CK Navigator layer 格式的序列化结构，无业务逻辑
//! 字段拼写（techniqueID/showID 等）通过 serde rename 与目标格式对齐

use serde::{Deserialize, Serialize};

/// 技术条目（热力图最小单元）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueEntry {
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    pub tactic: String,
    pub enabled: bool,
    pub comment: String,
    pub score: u8,
}

impl TechniqueEntry {
    pub fn new(technique_id: String, tactic: String, comment: String, score: u8) -> Self {
        Self {
            technique_id,
            tactic,
            enabled: true,
            comment,
            score,
        }
    }
}

/// 格式版本对（layer 格式版本 + Navigator 版本）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versions {
    pub layer: String,
    pub navigator: String,
}

/// 平台过滤
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filters {
    pub platforms: Vec<String>,
}

/// 矩阵布局选项
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub layout: String,
    #[serde(rename = "showID")]
    pub show_id: bool,
    pub show_name: bool,
    pub show_aggregate_scores: bool,
    pub count_unscored: bool,
    pub aggregate_function: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            layout: "side".to_string(),
            show_id: true,
            show_name: true,
            show_aggregate_scores: true,
            count_unscored: true,
            aggregate_function: "average".to_string(),
        }
    }
}

/// 分值渐变（colors 降序覆盖 maxValue → minValue）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    pub colors: Vec<String>,
    pub min_value: u8,
    pub max_value: u8,
}

/// 图例条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendItem {
    pub label: String,
    pub color: String,
}

/// 图层元数据键值对
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    pub name: String,
    pub value: String,
}

/// 完整 Navigator 图层文档
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorLayer {
    pub name: String,
    pub versions: Versions,
    pub domain: String,
    pub description: String,
    pub filters: Filters,
    pub sorting: u8,
    pub layout: Layout,
    pub hide_disabled: bool,
    pub techniques: Vec<TechniqueEntry>,
    pub gradient: Gradient,
    pub legend_items: Vec<LegendItem>,
    pub show_tactic_row_background: bool,
    pub tactic_row_background: String,
    pub select_techniques_across_tactics: bool,
    pub select_subtechniques_with_parent: bool,
    pub metadata: Vec<MetadataItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technique_entry_field_spelling() {
        // 测试场景：序列化字段名必须与 Navigator 格式拼写一致（techniqueID）
        let entry = TechniqueEntry::new(
            "T1071".to_string(),
            "command-and-control".to_string(),
            String::new(),
            100,
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["techniqueID"], "T1071");
        assert_eq!(value["enabled"], true);
        assert!(value.get("technique_id").is_none());
    }

    #[test]
    fn test_layout_field_spelling() {
        // 测试场景：showID 保持全大写 ID，其余字段 camelCase
        let value = serde_json::to_value(Layout::default()).unwrap();
        assert_eq!(value["showID"], true);
        assert_eq!(value["showName"], true);
        assert_eq!(value["aggregateFunction"], "average");
    }
}
