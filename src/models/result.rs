use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::discrepancy::Discrepancy;
use super::document::DocumentType;

/// 发票配对所用的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    PoNumber,
    VendorName,
}

/// 匹配置信度 (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfidence {
    pub po_number_match: u8,
    pub vendor_name_match: u8,
    /// 展示用供应商名称
    pub vendor_name: String,
    pub overall: f64,
}

/// 对账结果，每个匹配组一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingResult {
    pub id: Uuid,
    pub po_document_id: String,
    pub invoice_document_id: String,
    pub delivery_note_document_id: Option<String>,
    pub matched_by: MatchedBy,
    pub match_confidence: MatchConfidence,
    pub discrepancies: Vec<Discrepancy>,
    pub total_po_amount: BigDecimal,
    pub total_invoice_amount: BigDecimal,
    pub total_delivery_amount: Option<BigDecimal>,
    /// invoice - PO，正数表示多收
    pub total_difference: BigDecimal,
}

/// 未能分组的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// PO号和供应商名称都缺失
    MissingIdentifiers,
    /// 找不到可配对的对方文档
    NoCounterpart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedDocument {
    pub document_id: String,
    pub document_type: DocumentType,
    pub reason: UnmatchedReason,
}

/// 一次对账运行的完整输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub results: Vec<MatchingResult>,
    pub unmatched: Vec<UnmatchedDocument>,
}
