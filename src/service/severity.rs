use bigdecimal::{BigDecimal, Zero};

use crate::config::MatchingConfig;
use crate::models::{DiscrepancyType, Severity};

/// 差异幅度
#[derive(Debug, Clone)]
pub enum Magnitude {
    /// 结构性差异，无数值幅度
    Structural,
    /// 期望值与实际值 (数量/单价)
    Deviation { expected: BigDecimal, actual: BigDecimal },
    /// 税额绝对差 (两侧税额都存在时)
    TaxDifference(Option<BigDecimal>),
}

/// 由差异类型和幅度确定严重程度
pub fn classify(kind: DiscrepancyType, magnitude: &Magnitude, config: &MatchingConfig) -> Severity {
    match kind {
        DiscrepancyType::MissingItem | DiscrepancyType::ExtraItem | DiscrepancyType::CurrencyMismatch => {
            Severity::Critical
        }
        DiscrepancyType::QuantityMismatch => deviation_severity(magnitude, &config.quantity_high_ratio),
        DiscrepancyType::PriceChange => deviation_severity(magnitude, &config.price_high_ratio),
        DiscrepancyType::TaxRateMismatch | DiscrepancyType::TaxAmountMismatch => match magnitude {
            Magnitude::TaxDifference(Some(diff)) if diff.abs() > config.tax_amount_materiality => Severity::Medium,
            _ => Severity::Low,
        },
        DiscrepancyType::DescriptionMismatch => Severity::Low,
    }
}

/// 相对偏差 |actual - expected| / |expected|，期望值为 0 时无法计算
pub fn relative_deviation(expected: &BigDecimal, actual: &BigDecimal) -> Option<BigDecimal> {
    if expected.is_zero() {
        return None;
    }
    Some((actual - expected).abs() / expected.abs())
}

fn deviation_severity(magnitude: &Magnitude, high_ratio: &BigDecimal) -> Severity {
    let Magnitude::Deviation { expected, actual } = magnitude else {
        return Severity::Medium;
    };
    match relative_deviation(expected, actual) {
        Some(ratio) if ratio >= *high_ratio => Severity::High,
        _ => Severity::Medium,
    }
}
