use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::aligner::Alignment;
use super::grouper::MatchGroup;
use super::identity::{po_match_score, vendor_match_score};
use crate::models::{Discrepancy, ExtractedDocument, MatchConfidence, MatchingResult};

const PO_WEIGHT: f64 = 0.4;
const VENDOR_WEIGHT: f64 = 0.3;
const ITEM_WEIGHT: f64 = 0.3;

/// 结果ID命名空间，保证同一组文档每次生成相同ID
const RESULT_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

/// 文档总额：声明总额 > 小计+税额 > 明细行合计
pub fn document_total(doc: &ExtractedDocument) -> BigDecimal {
    if let Some(total) = &doc.total_amount {
        return total.clone();
    }
    if let (Some(subtotal), Some(tax)) = (&doc.subtotal, &doc.tax_amount) {
        return subtotal + tax;
    }
    doc.line_items
        .iter()
        .filter_map(|item| item.effective_total())
        .fold(BigDecimal::zero(), |acc, t| acc + t)
}

/// 综合置信度 (0-100)
///
/// 0.4 × PO号得分 + 0.3 × 供应商得分 + 0.3 × 明细配对率；
/// 任一侧无明细时去掉明细项并重新归一化权重
pub fn overall_confidence(po_score: u8, vendor_score: u8, matched: usize, po_items: usize, invoice_items: usize) -> f64 {
    let identity = PO_WEIGHT * f64::from(po_score) + VENDOR_WEIGHT * f64::from(vendor_score);
    let overall = if po_items == 0 || invoice_items == 0 {
        identity / (PO_WEIGHT + VENDOR_WEIGHT)
    } else {
        let ratio = matched as f64 / po_items.max(invoice_items) as f64;
        identity + ITEM_WEIGHT * ratio * 100.0
    };
    (overall.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// 组装对账结果，纯函数
pub fn assemble(group: &MatchGroup, alignment: &Alignment, discrepancies: Vec<Discrepancy>) -> MatchingResult {
    let po = group.po;
    let invoice = group.invoice;

    let po_score = po_match_score(
        po.po_number.as_deref().unwrap_or_default(),
        invoice.po_number.as_deref().unwrap_or_default(),
    );
    let vendor_score = vendor_match_score(
        po.vendor_name.as_deref().unwrap_or_default(),
        invoice.vendor_name.as_deref().unwrap_or_default(),
    );
    let overall = overall_confidence(
        po_score,
        vendor_score,
        alignment.matched_count(),
        po.line_items.len(),
        invoice.line_items.len(),
    );

    let vendor_name = [&po.vendor_name, &invoice.vendor_name]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| "Unknown Vendor".to_string());

    let total_po_amount = document_total(po);
    let total_invoice_amount = document_total(invoice);
    let total_difference = &total_invoice_amount - &total_po_amount;

    MatchingResult {
        id: result_id(group),
        po_document_id: po.document_id.clone(),
        invoice_document_id: invoice.document_id.clone(),
        delivery_note_document_id: group.delivery_note.map(|d| d.document_id.clone()),
        matched_by: group.matched_by,
        match_confidence: MatchConfidence {
            po_number_match: po_score,
            vendor_name_match: vendor_score,
            vendor_name,
            overall,
        },
        discrepancies,
        total_po_amount,
        total_invoice_amount,
        total_delivery_amount: group.delivery_note.map(document_total),
        total_difference,
    }
}

fn result_id(group: &MatchGroup) -> Uuid {
    let key = format!(
        "{}|{}|{}",
        group.po.document_id,
        group.invoice.document_id,
        group.delivery_note.map(|d| d.document_id.as_str()).unwrap_or_default()
    );
    Uuid::new_v5(&RESULT_NAMESPACE, key.as_bytes())
}
