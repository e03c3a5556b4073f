//! rsheatmap 命令行入口
//! 环境变量与命令行参数等价（clap env 绑定），环境变量名沿用既有部署约定

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rsheatmap::{
    flatten_rules, ConfigManager, HeatmapConfig, HmResult, LayerBuilder, LayerWriter, OutputMode,
    PriorityScorer, RuleFetcher,
};

#[derive(Parser, Debug)]
#[command(
    name = "rsheatmap",
    version,
    about = "Generate an ATT&CK Navigator heatmap layer from SIEM detection rules"
)]
struct Cli {
    /// SIEM接口地址（协议+主机+端口）
    #[arg(long, env = "BASE_ROUTE")]
    base_route: String,

    /// 规则列表接口路径
    #[arg(long, env = "ELK_ROUTE", default_value = "/api/detection_engine/rules/_find")]
    rule_route: String,

    /// 规则过滤查询片段（?filter=...）
    #[arg(long, env = "ELK_FILTER", default_value = "?filter=alert.attributes.enabled:true")]
    rule_filter: String,

    /// 分页大小查询片段（&per_page=N）
    #[arg(long, env = "ELK_PER_PAGE", default_value = "&per_page=100")]
    per_page: String,

    /// ApiKey凭据
    #[arg(long, env = "ELK_KEY", hide_env_values = true)]
    api_key: String,

    /// 优先级标签前缀（前缀后接单个数字）
    #[arg(long, env = "TAG_PREFIX", default_value = "priority: p")]
    tag_prefix: String,

    /// 瞬时错误最大重试次数
    #[arg(long, env = "RETRY_TOTAL", default_value_t = 3)]
    retry_total: usize,

    /// 指数退避基数（秒）
    #[arg(long, env = "BACKOFF", default_value_t = 15.0)]
    backoff: f64,

    /// 退避上限（秒）
    #[arg(long, env = "BACKOFF_MAX", default_value_t = 60.0)]
    backoff_max: f64,

    /// HTTP超时（秒）
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 30)]
    http_timeout: u64,

    /// 热力图名称
    #[arg(long, env = "HEATMAP_NAME", default_value = "Detection Coverage Heatmap")]
    heatmap_name: String,

    /// 战术行背景色
    #[arg(long, env = "TACTIC_ROW_BACKGROUND", default_value = "#dddddd")]
    tactic_row_background: String,

    /// 图层格式版本
    #[arg(long, env = "LAYER_VERSION", default_value = "4.5")]
    layer_version: String,

    /// Navigator版本
    #[arg(long, env = "NAVIGATOR_VERSION", default_value = "4.9.1")]
    navigator_version: String,

    /// 渐变色列表（JSON字符串数组），缺省使用内置渐变
    #[arg(long, env = "DESC_GRADIENT")]
    gradient: Option<String>,

    /// 持久化输出目录
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// 丢弃模式下的校验停留时长（秒）
    #[arg(long, env = "DISCARD_HOLD", default_value_t = 1.0)]
    discard_hold: f64,

    /// 调试模式：持久化输出到输出目录（否则写临时目录后丢弃）
    #[arg(
        long,
        env = "DEBUG",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    debug: bool,
}

impl Cli {
    /// 转换为运行配置
    fn into_config(self) -> HmResult<HeatmapConfig> {
        let mut builder = ConfigManager::custom()
            .base_route(self.base_route)
            .rule_route(self.rule_route)
            .rule_filter(self.rule_filter)
            .per_page(self.per_page)
            .api_key(self.api_key)
            .tag_prefix(self.tag_prefix)
            .retry_total(self.retry_total)
            .backoff(self.backoff, self.backoff_max)
            .http_timeout(self.http_timeout)
            .heatmap_name(self.heatmap_name)
            .tactic_row_background(self.tactic_row_background)
            .versions(self.layer_version, self.navigator_version)
            .output_dir(self.output_dir)
            .output_mode(if self.debug {
                OutputMode::Persist
            } else {
                OutputMode::Discard {
                    hold: Duration::from_secs_f64(self.discard_hold.max(0.0)),
                }
            });

        if let Some(raw) = &self.gradient {
            builder = builder.gradient(HeatmapConfig::parse_gradient(raw)?);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> HmResult<()> {
    let config = cli.into_config()?;

    // 1. 分页拉取全部规则（全量成功或整体失败）
    let fetcher = RuleFetcher::new(&config)?;
    let rules = fetcher.fetch_all().await?;
    tracing::info!("{} Detection Rules", rules.len());

    // 2. 优先级评分与频次汇报
    let scorer = PriorityScorer::new(&config.tag_prefix)?;
    let index = scorer.collect(&rules);
    index.report(rules.len());

    // 3. 展平为技术条目
    let techniques = flatten_rules(&rules, &index);
    tracing::info!("{} technique entries emitted", techniques.len());

    // 4. 组装图层并写出
    let layer = LayerBuilder::new(&config).build(techniques);
    LayerWriter::write(&layer, &config).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        // 不可恢复的HTTP错误：输出响应体便于排障，不写任何产物
        match err.response_body() {
            Some(body) if !body.is_empty() => eprintln!("{body}"),
            _ => eprintln!("rsheatmap: {err}"),
        }
        std::process::exit(1);
    }
}
