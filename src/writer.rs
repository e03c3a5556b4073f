//! 图层写出器
//! 将图层文档序列化为缩进JSON并按输出模式落盘：
//! - Persist：写入输出目录（文件名 heatmap-YYYYMMDD.json）
//! - Discard：写入临时目录，保留一段校验停留时间后随目录一起清理

use std::path::PathBuf;

use tracing::info;

use crate::config::{HeatmapConfig, OutputMode};
use crate::error::HmResult;
use crate::layer::builder::date_stamp;
use crate::layer::model::NavigatorLayer;

/// 图层写出器
/// 设计：无状态工具类，单次写出，无部分写入语义
pub struct LayerWriter;

impl LayerWriter {
    /// 写出图层文档
    /// 返回：持久化路径（Persist），Discard 模式返回 None
    pub async fn write(
        layer: &NavigatorLayer,
        config: &HeatmapConfig,
    ) -> HmResult<Option<PathBuf>> {
        let file_name = format!("heatmap-{}.json", date_stamp());
        let payload = serde_json::to_vec_pretty(layer)?;

        match &config.output_mode {
            OutputMode::Persist => {
                let path = config.output_dir.join(&file_name);
                tokio::fs::write(&path, &payload).await?;
                info!("heatmap layer written to {}", path.display());
                Ok(Some(path))
            }
            OutputMode::Discard { hold } => {
                // 临时目录随 guard 析构自动清理
                let dir = tempfile::TempDir::new()?;
                let path = dir.path().join(&file_name);
                tokio::fs::write(&path, &payload).await?;
                info!(
                    "heatmap layer validated at {} (discarded after {:.1}s)",
                    path.display(),
                    hold.as_secs_f64()
                );
                tokio::time::sleep(*hold).await;
                Ok(None)
            }
        }
    }
}
