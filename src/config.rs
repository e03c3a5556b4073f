//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::{HeatmapError, HmResult};

/// 默认渐变色（高分红 → 低分绿，对应 0-100 分值区间）
static DEFAULT_GRADIENT: Lazy<Vec<String>> = Lazy::new(|| {
    ["#ff6666", "#ffb366", "#ffe766", "#b3d465", "#8ec843"]
        .iter()
        .map(|c| c.to_string())
        .collect()
});

/// 默认平台过滤列表
static DEFAULT_PLATFORMS: Lazy<Vec<String>> = Lazy::new(|| {
    ["Windows", "macOS", "Office 365"]
        .iter()
        .map(|p| p.to_string())
        .collect()
});

/// 产物输出模式
/// 设计说明：原始流程中非调试模式写入临时目录后静默丢弃，
/// 此处将其显式化为配置项，丢弃前保留一段校验停留时间
#[derive(Debug, Clone)]
pub enum OutputMode {
    /// 持久化到输出目录
    Persist,
    /// 写入临时目录校验后丢弃
    Discard { hold: Duration },
}

/// 全局配置
#[derive(Debug, Clone)]
pub struct HeatmapConfig {
    // SIEM接口地址（协议+主机+端口）
    pub base_route: String,
    // 规则列表接口路径
    pub rule_route: String,
    // 规则过滤查询片段（?filter=...）
    pub rule_filter: String,
    // 分页大小查询片段（&per_page=N）
    pub per_page: String,
    // ApiKey凭据
    pub api_key: String,
    // 优先级标签前缀（前缀后接单个数字，如 "priority: p"）
    pub tag_prefix: String,
    // 瞬时错误最大重试次数（不含首次请求）
    pub retry_total: usize,
    // 指数退避基数（单位：秒）
    pub backoff_base: f64,
    // 退避上限（单位：秒）
    pub backoff_cap: f64,
    // HTTP超时（单位：秒）
    pub http_timeout: u64,
    // 热力图名称
    pub heatmap_name: String,
    // 战术行背景色
    pub tactic_row_background: String,
    // 图层格式版本
    pub layer_version: String,
    // Navigator版本
    pub navigator_version: String,
    // 渐变色列表（降序映射 100 → 0）
    pub gradient: Vec<String>,
    // 平台过滤列表
    pub platforms: Vec<String>,
    // 持久化输出目录
    pub output_dir: PathBuf,
    // 输出模式
    pub output_mode: OutputMode,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            base_route: "https://localhost:5601".to_string(),
            rule_route: "/api/detection_engine/rules/_find".to_string(),
            rule_filter: "?filter=alert.attributes.enabled:true".to_string(),
            per_page: "&per_page=100".to_string(),
            api_key: String::new(),
            tag_prefix: "priority: p".to_string(),
            retry_total: 3,
            backoff_base: 15.0,
            backoff_cap: 60.0,
            http_timeout: 30,
            heatmap_name: "Detection Coverage Heatmap".to_string(),
            tactic_row_background: "#dddddd".to_string(),
            layer_version: "4.5".to_string(),
            navigator_version: "4.9.1".to_string(),
            gradient: DEFAULT_GRADIENT.clone(),
            platforms: DEFAULT_PLATFORMS.clone(),
            output_dir: PathBuf::from("."),
            output_mode: OutputMode::Discard {
                hold: Duration::from_secs(1),
            },
        }
    }
}

impl HeatmapConfig {
    /// 校验配置合法性
    /// 规则：
    /// 1. base_route 必须是合法URL
    /// 2. 标签前缀非空（否则任何标签都会命中）
    /// 3. 渐变色列表非空（图例与渐变依赖同一列表）
    pub fn validate(&self) -> HmResult<()> {
        Url::parse(&self.base_route)?;
        if self.tag_prefix.trim().is_empty() {
            return Err(HeatmapError::ConfigError(
                "tag prefix must not be empty".to_string(),
            ));
        }
        if self.gradient.is_empty() {
            return Err(HeatmapError::ConfigError(
                "gradient color list must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 解析渐变色环境值（JSON字符串数组，如 ["#ff6666","#8ec843"]）
    pub fn parse_gradient(raw: &str) -> HmResult<Vec<String>> {
        let colors: Vec<String> = serde_json::from_str(raw).map_err(|e| {
            HeatmapError::ConfigError(format!("failed to parse gradient color list: {}", e))
        })?;
        Ok(colors)
    }
}

/// 配置管理器（单例）
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> HeatmapConfig {
        HeatmapConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: HeatmapConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HeatmapConfig::default(),
        }
    }

    pub fn base_route(mut self, route: String) -> Self {
        self.config.base_route = route;
        self
    }

    pub fn rule_route(mut self, route: String) -> Self {
        self.config.rule_route = route;
        self
    }

    pub fn rule_filter(mut self, filter: String) -> Self {
        self.config.rule_filter = filter;
        self
    }

    pub fn per_page(mut self, per_page: String) -> Self {
        self.config.per_page = per_page;
        self
    }

    pub fn api_key(mut self, key: String) -> Self {
        self.config.api_key = key;
        self
    }

    pub fn tag_prefix(mut self, prefix: String) -> Self {
        self.config.tag_prefix = prefix;
        self
    }

    pub fn retry_total(mut self, total: usize) -> Self {
        self.config.retry_total = total;
        self
    }

    pub fn backoff(mut self, base: f64, cap: f64) -> Self {
        self.config.backoff_base = base;
        self.config.backoff_cap = cap;
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn heatmap_name(mut self, name: String) -> Self {
        self.config.heatmap_name = name;
        self
    }

    pub fn tactic_row_background(mut self, color: String) -> Self {
        self.config.tactic_row_background = color;
        self
    }

    pub fn versions(mut self, layer: String, navigator: String) -> Self {
        self.config.layer_version = layer;
        self.config.navigator_version = navigator;
        self
    }

    pub fn gradient(mut self, colors: Vec<String>) -> Self {
        self.config.gradient = colors;
        self
    }

    pub fn platforms(mut self, platforms: Vec<String>) -> Self {
        self.config.platforms = platforms;
        self
    }

    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output_dir = dir;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    pub fn build(self) -> HeatmapConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gradient_valid_list() {
        // 测试场景：合法JSON数组，应解析为颜色列表
        let colors = HeatmapConfig::parse_gradient(r##"["#ff6666", "#8ec843"]"##).unwrap();
        assert_eq!(colors, vec!["#ff6666".to_string(), "#8ec843".to_string()]);
    }

    #[test]
    fn test_parse_gradient_invalid_json() {
        // 测试场景：非JSON数组，应返回配置错误
        let result = HeatmapConfig::parse_gradient("#ff6666,#8ec843");
        assert!(matches!(result, Err(HeatmapError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_empty_tag_prefix() {
        // 测试场景：空标签前缀会命中所有标签，必须拒绝
        let config = ConfigManager::custom().tag_prefix("  ".to_string()).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_route() {
        // 测试场景：base_route 非URL，应返回URL解析错误
        let config = ConfigManager::custom()
            .base_route("not a url".to_string())
            .build();
        assert!(matches!(config.validate(), Err(HeatmapError::UrlError(_))));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(HeatmapConfig::default().validate().is_ok());
    }
}
