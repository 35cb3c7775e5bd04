use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::service::normalizer::parse_amount;

/// 文档类型 (采购订单 / 发票 / 送货单)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    #[serde(alias = "po", alias = "PO", alias = "PurchaseOrder")]
    PurchaseOrder,
    #[serde(alias = "Invoice")]
    Invoice,
    #[serde(alias = "DeliveryNote")]
    DeliveryNote,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PurchaseOrder => "PO",
            Self::Invoice => "Invoice",
            Self::DeliveryNote => "Delivery Note",
        }
    }
}

/// 外部抽取服务产出的结构化文档，引擎只读
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub document_id: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub po_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery_note_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vendor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub document_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    /// 税率，百分比 (8.25 表示 8.25%)
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax_rate: Option<BigDecimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax_amount: Option<BigDecimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub subtotal: Option<BigDecimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_amount: Option<BigDecimal>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl ExtractedDocument {
    /// PO号和供应商名称都缺失的文档永远无法分组
    pub fn has_identifiers(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.po_number) || present(&self.vendor_name)
    }
}

/// 明细行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_number: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Option<BigDecimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub unit_price: Option<BigDecimal>,
    /// 只观察，不校验 quantity × unit_price
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub line_total: Option<BigDecimal>,
}

impl LineItem {
    /// 行金额：优先 line_total，其次 quantity × unit_price
    pub fn effective_total(&self) -> Option<BigDecimal> {
        match (&self.line_total, &self.quantity, &self.unit_price) {
            (Some(total), _, _) => Some(total.clone()),
            (None, Some(qty), Some(price)) => Some(qty * price),
            _ => None,
        }
    }
}

/// 单个工作区的文档快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceDocuments {
    pub workspace_id: String,
    pub documents: Vec<ExtractedDocument>,
}

/// 数值字段宽松解析：数字或数字字符串，其余一律视为缺失
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(&s),
        _ => None,
    }))
}

/// 日期宽松解析：日期、无时区或带时区的时间戳均取日期部分，其余视为缺失
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => parse_date(s.trim()),
        _ => None,
    }))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    raw.parse::<NaiveDate>()
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()))
}

/// 标识字段宽松解析：抽取结果中的编号可能是数字
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn non_numeric_fields_decode_as_absent() {
        let item: LineItem = serde_json::from_value(serde_json::json!({
            "item_number": 3,
            "description": "Steel Bolts M12",
            "quantity": "N/A",
            "unit_price": "$2.50",
            "line_total": true
        }))
        .unwrap();

        assert_eq!(item.item_number.as_deref(), Some("3"));
        assert_eq!(item.quantity, None);
        assert_eq!(item.unit_price, Some(BigDecimal::from_str("2.50").unwrap()));
        assert_eq!(item.line_total, None);
    }

    #[test]
    fn document_type_accepts_short_tag() {
        let doc: ExtractedDocument = serde_json::from_value(serde_json::json!({
            "document_id": "d1",
            "type": "po",
            "po_number": "PO-1"
        }))
        .unwrap();

        assert_eq!(doc.document_type, DocumentType::PurchaseOrder);
        assert!(doc.line_items.is_empty());
        assert!(doc.has_identifiers());
    }

    #[test]
    fn document_type_accepts_capitalized_tags() {
        for (tag, expected) in [
            ("PO", DocumentType::PurchaseOrder),
            ("Invoice", DocumentType::Invoice),
            ("DeliveryNote", DocumentType::DeliveryNote),
            ("delivery_note", DocumentType::DeliveryNote),
        ] {
            let doc: ExtractedDocument = serde_json::from_value(serde_json::json!({
                "document_id": "d1",
                "type": tag
            }))
            .unwrap();
            assert_eq!(doc.document_type, expected, "tag {}", tag);
        }
    }

    #[test]
    fn document_date_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        for raw in [
            serde_json::json!("2024-03-15"),
            serde_json::json!("2024-03-15T10:00:00"),
            serde_json::json!("2024-03-15T10:00:00.123"),
            serde_json::json!("2024-03-15T10:00:00+08:00"),
            serde_json::json!("2024-03-15 10:00:00"),
        ] {
            let doc: ExtractedDocument = serde_json::from_value(serde_json::json!({
                "document_id": "d1",
                "type": "invoice",
                "document_date": raw
            }))
            .unwrap();
            assert_eq!(doc.document_date, expected);
        }

        for raw in [serde_json::json!("15/03/2024"), serde_json::json!(20240315), serde_json::json!(null)] {
            let doc: ExtractedDocument = serde_json::from_value(serde_json::json!({
                "document_id": "d1",
                "type": "invoice",
                "document_date": raw
            }))
            .unwrap();
            assert_eq!(doc.document_date, None);
        }
    }

    #[test]
    fn blank_identifiers_do_not_count() {
        let doc = ExtractedDocument {
            document_id: "d1".into(),
            po_number: Some("   ".into()),
            ..Default::default()
        };
        assert!(!doc.has_identifiers());
    }

    #[test]
    fn effective_total_falls_back_to_extension() {
        let item = LineItem {
            quantity: Some(BigDecimal::from(4)),
            unit_price: Some(BigDecimal::from_str("2.5").unwrap()),
            ..Default::default()
        };
        assert_eq!(item.effective_total(), Some(BigDecimal::from(10)));
    }
}
