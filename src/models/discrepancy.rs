use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::document::LineItem;

/// 差异类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyType {
    QuantityMismatch,
    PriceChange,
    MissingItem,
    ExtraItem,
    DescriptionMismatch,
    CurrencyMismatch,
    TaxRateMismatch,
    TaxAmountMismatch,
}

/// 严重程度，按业务影响递增排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// 差异一侧的结构化快照，只填充参与比较的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_total: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<BigDecimal>,
}

impl ValueSnapshot {
    /// 整行快照 (缺失/多出明细)
    pub fn from_item(item: &LineItem) -> Self {
        Self {
            item_number: item.item_number.clone(),
            description: Some(item.description.clone()),
            quantity: item.quantity.clone(),
            unit_price: item.unit_price.clone(),
            line_total: item.line_total.clone(),
            ..Default::default()
        }
    }

    pub fn quantity(quantity: &BigDecimal) -> Self {
        Self {
            quantity: Some(quantity.clone()),
            ..Default::default()
        }
    }

    pub fn unit_price(unit_price: &BigDecimal) -> Self {
        Self {
            unit_price: Some(unit_price.clone()),
            ..Default::default()
        }
    }

    pub fn description(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    pub fn currency(currency: &str) -> Self {
        Self {
            currency: Some(currency.to_string()),
            ..Default::default()
        }
    }

    pub fn tax(tax_rate: Option<&BigDecimal>, tax_amount: Option<&BigDecimal>) -> Self {
        Self {
            tax_rate: tax_rate.cloned(),
            tax_amount: tax_amount.cloned(),
            ..Default::default()
        }
    }
}

/// 单条差异记录，严重程度在创建时确定，之后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    #[serde(rename = "type")]
    pub discrepancy_type: DiscrepancyType,
    pub severity: Severity,
    pub item_number: Option<String>,
    pub description: String,
    pub po_value: Option<ValueSnapshot>,
    pub invoice_value: Option<ValueSnapshot>,
    pub delivery_value: Option<ValueSnapshot>,
    pub message: String,
}
