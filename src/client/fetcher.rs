//! 规则拉取器
//! 核心职责：
//! 1. 对规则列表接口按页顺序拉取，首页确定总页数
//! 2. 瞬时错误（429/500/502/503/504）有界重试 + 指数退避（基数/上限可配）
//! 3. 非瞬时错误快速失败，携带响应体向上传递
//! 4. 全量成功或整体失败，不输出部分结果

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::HeatmapConfig;
use crate::error::{HeatmapError, HmResult};
use crate::rule::model::{DetectionRule, RulePage};

/// 触发自动重试的瞬时状态码
const TRANSIENT_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// 判断状态码是否可重试
fn is_transient(status: StatusCode) -> bool {
    TRANSIENT_STATUS.contains(&status.as_u16())
}

/// 规则拉取器
/// 设计：构造时固定请求头与重试参数，每次运行复用同一 Client
pub struct RuleFetcher {
    client: Client,
    first_page_url: String,
    retry_total: usize,
    backoff_base: f64,
    backoff_cap: f64,
}

impl RuleFetcher {
    /// 构建拉取器
    /// 请求头固定：Content-Type / Authorization(ApiKey) / kbn-xsrf
    pub fn new(config: &HeatmapConfig) -> HmResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=UTF-8"),
        );
        let auth = HeaderValue::from_str(&format!("ApiKey {}", config.api_key))
            .map_err(|e| HeatmapError::InvalidInput(format!("invalid api key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("kbn-xsrf", HeaderValue::from_static("true"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            first_page_url: format!(
                "{}{}{}{}",
                config.base_route, config.rule_route, config.rule_filter, config.per_page
            ),
            retry_total: config.retry_total,
            backoff_base: config.backoff_base,
            backoff_cap: config.backoff_cap,
        })
    }

    /// 拉取全部规则页并拼接
    /// 流程：首页确定 total/perPage → 总页数 = ceil(total/perPage) → 顺序拉取余页
    pub async fn fetch_all(&self) -> HmResult<Vec<DetectionRule>> {
        let first = self.get_page(&self.first_page_url).await?;
        let pages = Self::page_count(first.total, first.per_page)?;
        debug!(
            "first page fetched: total={} perPage={} pages={}",
            first.total, first.per_page, pages
        );

        let mut rules = first.data;
        for page in 2..=pages {
            let url = format!("{}&page={}", self.first_page_url, page);
            let mut chunk = self.get_page(&url).await?;
            rules.append(&mut chunk.data);
        }

        info!("{} detection rules fetched", rules.len());
        Ok(rules)
    }

    /// 总页数计算（向上取整）
    /// 边界：total 为 0 时 0 页（首页已取）；perPage 为 0 视为接口异常
    fn page_count(total: u64, per_page: u64) -> HmResult<u64> {
        if per_page == 0 {
            if total == 0 {
                return Ok(0);
            }
            return Err(HeatmapError::InvalidPagination(format!(
                "perPage is 0 with total {}",
                total
            )));
        }
        Ok(total.div_ceil(per_page))
    }

    /// 单页GET（带重试）
    /// 规则：
    /// 1. 2xx → 解析 JSON 单页响应
    /// 2. 瞬时状态码且未超重试上限 → 退避后重试
    /// 3. 其余状态码 → 读取响应体后立即失败
    async fn get_page(&self, url: &str) -> HmResult<RulePage> {
        let mut attempt: u32 = 0;
        loop {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.json::<RulePage>().await?);
            }

            if is_transient(status) && (attempt as usize) < self.retry_total {
                let delay = self.backoff_delay(attempt);
                warn!(
                    "transient HTTP {} from {}, retrying in {:.1}s (attempt {}/{})",
                    status,
                    url,
                    delay.as_secs_f64(),
                    attempt + 1,
                    self.retry_total
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let failure = HeatmapError::HttpStatus {
                status: status.as_u16(),
                body,
            };
            return if is_transient(status) {
                Err(HeatmapError::RetryExhausted {
                    attempts: self.retry_total,
                    source: Box::new(failure),
                })
            } else {
                Err(failure)
            };
        }
    }

    /// 指数退避时长：min(base * 2^attempt, cap)
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let secs = (self.backoff_base * 2f64.powi(attempt as i32)).min(self.backoff_cap);
        Duration::from_secs_f64(secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_body(total: u64, per_page: u64, count: usize, offset: usize) -> serde_json::Value {
        let data: Vec<_> = (0..count)
            .map(|i| json!({"id": format!("rule-{}", offset + i), "tags": []}))
            .collect();
        json!({"total": total, "perPage": per_page, "data": data})
    }

    fn test_fetcher(base: String) -> RuleFetcher {
        let config = ConfigManager::custom()
            .base_route(base)
            .rule_route("/api/detection_engine/rules/_find".to_string())
            .rule_filter("?filter=enabled".to_string())
            .per_page("&per_page=20".to_string())
            .api_key("test-key".to_string())
            .retry_total(3)
            .backoff(0.0, 0.0)
            .build();
        RuleFetcher::new(&config).unwrap()
    }

    #[test]
    fn test_page_count_rounds_up() {
        // 测试场景：55 条 / 每页 20 → 3 页
        assert_eq!(RuleFetcher::page_count(55, 20).unwrap(), 3);
        assert_eq!(RuleFetcher::page_count(40, 20).unwrap(), 2);
        assert_eq!(RuleFetcher::page_count(1, 20).unwrap(), 1);
        assert_eq!(RuleFetcher::page_count(0, 20).unwrap(), 0);
    }

    #[test]
    fn test_page_count_rejects_zero_per_page() {
        // 测试场景：perPage 为 0 且 total 非 0，属于接口异常
        assert!(matches!(
            RuleFetcher::page_count(55, 0),
            Err(HeatmapError::InvalidPagination(_))
        ));
        assert_eq!(RuleFetcher::page_count(0, 0).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_all_paginates() {
        // 测试场景：total=55 perPage=20 → 恰好 3 次请求，拼接 55 条
        let server = MockServer::start().await;
        let route = "/api/detection_engine/rules/_find";

        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(55, 20, 20, 0)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(55, 20, 20, 20)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(55, 20, 15, 40)))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(server.uri());
        let rules = fetcher.fetch_all().await.unwrap();
        assert_eq!(rules.len(), 55);
        assert_eq!(rules[0].id, "rule-0");
        assert_eq!(rules[54].id, "rule-54");
    }

    #[tokio::test]
    async fn test_fetch_sends_expected_headers() {
        // 测试场景：Authorization/kbn-xsrf/Content-Type 请求头必须到达服务端
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/detection_engine/rules/_find"))
            .and(wiremock::matchers::header("Authorization", "ApiKey test-key"))
            .and(wiremock::matchers::header("kbn-xsrf", "true"))
            .and(wiremock::matchers::header(
                "Content-Type",
                "application/json;charset=UTF-8",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 20, 1, 0)))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(server.uri());
        let rules = fetcher.fetch_all().await.unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_500_exhausts_retries() {
        // 测试场景：500 持续存在，重试 3 次后整体失败（共 4 次请求）
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/detection_engine/rules/_find"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(4)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(server.uri());
        let err = fetcher.fetch_all().await.unwrap_err();
        match err {
            HeatmapError::RetryExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    *source,
                    HeatmapError::HttpStatus { status: 500, .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transient_then_success_recovers() {
        // 测试场景：首次 503，第二次 200，应重试成功
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/detection_engine/rules/_find"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/detection_engine/rules/_find"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 20, 1, 0)))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(server.uri());
        assert_eq!(fetcher.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_transient_error_fails_fast_with_body() {
        // 测试场景：401 不重试，错误携带响应体
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/detection_engine/rules/_find"))
            .respond_with(ResponseTemplate::new(401).set_body_string("missing credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(server.uri());
        let err = fetcher.fetch_all().await.unwrap_err();
        match err {
            HeatmapError::HttpStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "missing credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_backoff_delay_capped() {
        // 测试场景：退避按 2^attempt 增长并受上限截断
        let config = ConfigManager::custom().backoff(15.0, 60.0).build();
        let fetcher = RuleFetcher::new(&config).unwrap();
        assert_eq!(fetcher.backoff_delay(0), Duration::from_secs(15));
        assert_eq!(fetcher.backoff_delay(1), Duration::from_secs(30));
        assert_eq!(fetcher.backoff_delay(2), Duration::from_secs(60));
        assert_eq!(fetcher.backoff_delay(5), Duration::from_secs(60));
    }
}
