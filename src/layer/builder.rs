//! 图层构建器
//! 核心职责：
//! 1. 按配置组装完整 Navigator 图层文档（渐变、图例、布局、元数据）
//! 2. 图例标签按与评分器相同的反向映射由渐变色下标推回百分比
//! 3. 生成 YYYYMMDD 日期戳（元数据与输出文件名共用）

use chrono::Local;

use crate::config::HeatmapConfig;
use crate::layer::model::{
    Filters, Gradient, Layout, LegendItem, MetadataItem, NavigatorLayer, TechniqueEntry, Versions,
};

/// ATT&CK 企业矩阵域常量
pub const LAYER_DOMAIN: &str = "enterprise-attack";

/// 当前日期戳（YYYYMMDD）
pub fn date_stamp() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// 图层构建器
pub struct LayerBuilder<'a> {
    config: &'a HeatmapConfig,
}

impl<'a> LayerBuilder<'a> {
    pub fn new(config: &'a HeatmapConfig) -> Self {
        Self { config }
    }

    /// 组装图层文档
    /// 参数：techniques - 展平后的技术条目列表
    pub fn build(&self, techniques: Vec<TechniqueEntry>) -> NavigatorLayer {
        NavigatorLayer {
            name: self.config.heatmap_name.clone(),
            versions: Versions {
                layer: self.config.layer_version.clone(),
                navigator: self.config.navigator_version.clone(),
            },
            domain: LAYER_DOMAIN.to_string(),
            description: format!(
                "Heatmap based on rules enabled on SIEM cluster at {}",
                self.config.base_route
            ),
            filters: Filters {
                platforms: self.config.platforms.clone(),
            },
            sorting: 0,
            layout: Layout::default(),
            hide_disabled: true,
            techniques,
            gradient: Gradient {
                colors: self.config.gradient.clone(),
                min_value: 0,
                max_value: 100,
            },
            legend_items: legend_items(&self.config.gradient),
            show_tactic_row_background: true,
            tactic_row_background: self.config.tactic_row_background.clone(),
            select_techniques_across_tactics: true,
            select_subtechniques_with_parent: false,
            metadata: vec![
                MetadataItem {
                    name: "Generated".to_string(),
                    value: date_stamp(),
                },
                MetadataItem {
                    name: "Usage".to_string(),
                    value: "INTERNAL ONLY".to_string(),
                },
            ],
        }
    }
}

/// 渐变色下标 → 百分比图例
/// 反向映射：n 个颜色时下标 i（0 起）标签为 round((n - i) / n * 100)%，
/// 首个颜色对应最高分值段，与评分器的优先级反转方向一致
fn legend_items(colors: &[String]) -> Vec<LegendItem> {
    let n = colors.len();
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let percent = ((n - i) as f64 / n as f64 * 100.0).round() as u8;
            LegendItem {
                label: format!("{}%", percent),
                color: color.clone(),
            }
        })
        .collect()
}
