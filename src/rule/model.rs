//! 规则数据模型定义
//! 仅存储接口返回的规则数据，无任何业务逻辑，支持序列化/反序列化
//! 所有嵌套可选字段均带默认值，缺失字段跳过而非报错

use serde::{Deserialize, Serialize};

/// 规则列表接口单页响应（{total, perPage, data} 结构）
#[derive(Debug, Clone, Deserialize)]
pub struct RulePage {
    #[serde(default)]
    pub total: u64,
    #[serde(rename = "perPage", default)]
    pub per_page: u64,
    #[serde(default)]
    pub data: Vec<DetectionRule>,
}

/// 检测规则（只保留热力图生成所需字段，其余字段忽略）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub threat: Vec<Threat>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// 威胁分组（战术 + 其下技术列表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threat {
    #[serde(default)]
    pub tactic: Option<Tactic>,
    #[serde(default)]
    pub technique: Vec<Technique>,
}

/// 战术
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tactic {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// 技术（可携带子技术）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technique {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subtechnique: Vec<SubTechnique>,
}

/// 子技术
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTechnique {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}
