use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 匹配/对账参数，单次运行内保持不变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// 供应商名称相似度阈值 (0-100)
    pub vendor_match_threshold: u8,
    /// 明细描述相似度阈值 (0-100)
    pub description_match_threshold: u8,
    pub quantity_tolerance: BigDecimal,
    pub price_tolerance: BigDecimal,
    /// 税率容差，百分点
    pub tax_rate_epsilon: BigDecimal,
    pub tax_amount_epsilon: BigDecimal,
    /// 税额差超过该值时税务差异升级为 medium
    pub tax_amount_materiality: BigDecimal,
    /// 数量相对偏差达到该比例即为 high
    pub quantity_high_ratio: BigDecimal,
    /// 单价相对偏差达到该比例即为 high
    pub price_high_ratio: BigDecimal,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            vendor_match_threshold: 80,
            description_match_threshold: 80,
            quantity_tolerance: BigDecimal::zero(),
            price_tolerance: BigDecimal::zero(),
            tax_rate_epsilon: BigDecimal::new(1i64.into(), 2),
            tax_amount_epsilon: BigDecimal::new(1i64.into(), 2),
            tax_amount_materiality: BigDecimal::from(50),
            quantity_high_ratio: BigDecimal::new(20i64.into(), 2),
            price_high_ratio: BigDecimal::new(10i64.into(), 2),
        }
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor_match_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "vendor_match_threshold must be within 0-100, got {}",
                self.vendor_match_threshold
            )));
        }
        if self.description_match_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "description_match_threshold must be within 0-100, got {}",
                self.description_match_threshold
            )));
        }

        let non_negative = [
            ("quantity_tolerance", &self.quantity_tolerance),
            ("price_tolerance", &self.price_tolerance),
            ("tax_rate_epsilon", &self.tax_rate_epsilon),
            ("tax_amount_epsilon", &self.tax_amount_epsilon),
            ("tax_amount_materiality", &self.tax_amount_materiality),
            ("quantity_high_ratio", &self.quantity_high_ratio),
            ("price_high_ratio", &self.price_high_ratio),
        ];
        for (name, value) in non_negative {
            if *value < BigDecimal::zero() {
                return Err(ConfigError::Invalid(format!("{} must not be negative, got {}", name, value)));
            }
        }

        Ok(())
    }
}

impl AppConfig {
    /// 加载配置：默认值 < reconcile.toml (可选) < RECON_ 环境变量
    ///
    /// 环境变量示例: `RECON_SERVER__PORT=9090`, `RECON_MATCHING__VENDOR_MATCH_THRESHOLD=85`
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let settings = config::Config::builder()
            .set_default("server.host", defaults.host)?
            .set_default("server.port", i64::from(defaults.port))?
            .add_source(config::File::with_name("reconcile").required(false))
            .add_source(
                config::Environment::with_prefix("RECON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = settings.try_deserialize()?;
        app.matching.validate()?;
        Ok(app)
    }
}
