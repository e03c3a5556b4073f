//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum HeatmapError {
    // 配置相关错误
    #[error("配置无效：{0}")]
    ConfigError(String),

    // 拉取相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),
    #[error("接口返回错误（HTTP {status}）：{body}")]
    HttpStatus { status: u16, body: String },
    #[error("重试次数耗尽（{attempts} 次重试后仍失败）：{source}")]
    RetryExhausted {
        attempts: usize,
        source: Box<HeatmapError>,
    },
    #[error("分页参数无效：{0}")]
    InvalidPagination(String),

    // 评分相关错误
    #[error("优先级标签模式编译失败：{0}")]
    TagPatternError(#[from] regex::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

impl HeatmapError {
    /// 若错误链中携带了HTTP响应体，取出用于终端输出
    pub fn response_body(&self) -> Option<&str> {
        match self {
            HeatmapError::HttpStatus { body, .. } => Some(body),
            HeatmapError::RetryExhausted { source, .. } => source.response_body(),
            _ => None,
        }
    }
}

// 全局Result类型
pub type HmResult<T> = Result<T, HeatmapError>;
