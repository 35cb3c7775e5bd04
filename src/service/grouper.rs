use indexmap::IndexSet;

use super::identity::{is_vendor_accepted, po_match_score, vendor_match_score, EXACT_MATCH};
use crate::models::{DocumentType, ExtractedDocument, MatchedBy, UnmatchedDocument, UnmatchedReason};

/// 匹配组：一张PO、一张发票、可选一张送货单
#[derive(Debug, Clone, Copy)]
pub struct MatchGroup<'a> {
    pub po: &'a ExtractedDocument,
    pub invoice: &'a ExtractedDocument,
    pub delivery_note: Option<&'a ExtractedDocument>,
    pub matched_by: MatchedBy,
}

/// 分组结果
#[derive(Debug, Default)]
pub struct Grouping<'a> {
    pub groups: Vec<MatchGroup<'a>>,
    pub unmatched: Vec<UnmatchedDocument>,
}

/// 将工作区文档划分为匹配组
///
/// 以PO为锚点按输入顺序处理：先按PO号精确匹配发票，失败再按供应商名称模糊匹配；
/// 送货单使用同样的策略挂到该组上。每张文档最多属于一个组，同分取输入顺序最早者。
pub fn group_documents<'a>(documents: &'a [ExtractedDocument], vendor_threshold: u8) -> Grouping<'a> {
    let of_type = |t: DocumentType| -> Vec<&'a ExtractedDocument> {
        documents.iter().filter(|d| d.document_type == t).collect()
    };
    let pos = of_type(DocumentType::PurchaseOrder);
    let invoices = of_type(DocumentType::Invoice);
    let delivery_notes = of_type(DocumentType::DeliveryNote);

    // 已分配的发票/送货单下标 (保序去重)
    let mut taken_invoices: IndexSet<usize> = IndexSet::new();
    let mut taken_notes: IndexSet<usize> = IndexSet::new();
    let mut grouping = Grouping::default();

    for &po in &pos {
        if !po.has_identifiers() {
            tracing::warn!("PO {} has neither PO number nor vendor name, cannot be grouped", po.document_id);
            grouping.unmatched.push(unmatched(po, UnmatchedReason::MissingIdentifiers));
            continue;
        }

        let Some((inv_idx, matched_by)) = find_counterpart(po, &invoices, &taken_invoices, vendor_threshold) else {
            tracing::warn!("PO {}: no matching invoice found", po.document_id);
            grouping.unmatched.push(unmatched(po, UnmatchedReason::NoCounterpart));
            continue;
        };
        taken_invoices.insert(inv_idx);

        let delivery_note = find_counterpart(po, &delivery_notes, &taken_notes, vendor_threshold).map(
            |(dn_idx, _)| {
                taken_notes.insert(dn_idx);
                delivery_notes[dn_idx]
            },
        );

        tracing::debug!(
            "PO {} paired with invoice {} by {:?}, delivery note: {:?}",
            po.document_id,
            invoices[inv_idx].document_id,
            matched_by,
            delivery_note.map(|d| d.document_id.as_str())
        );

        grouping.groups.push(MatchGroup {
            po,
            invoice: invoices[inv_idx],
            delivery_note,
            matched_by,
        });
    }

    let leftovers = [(&invoices, &taken_invoices), (&delivery_notes, &taken_notes)];
    for (candidates, taken) in leftovers {
        for (idx, doc) in candidates.iter().enumerate() {
            if taken.contains(&idx) {
                continue;
            }
            let reason = if doc.has_identifiers() {
                UnmatchedReason::NoCounterpart
            } else {
                UnmatchedReason::MissingIdentifiers
            };
            tracing::warn!("{} {} left ungrouped ({:?})", doc.document_type.label(), doc.document_id, reason);
            grouping.unmatched.push(unmatched(doc, reason));
        }
    }

    grouping
}

/// 在未分配的候选中为锚点文档寻找对方文档
fn find_counterpart(
    anchor: &ExtractedDocument,
    candidates: &[&ExtractedDocument],
    taken: &IndexSet<usize>,
    vendor_threshold: u8,
) -> Option<(usize, MatchedBy)> {
    let available = || {
        candidates
            .iter()
            .enumerate()
            .filter(move |(idx, _)| !taken.contains(idx))
    };

    // 1. PO号精确匹配优先
    let anchor_po = anchor.po_number.as_deref().unwrap_or_default();
    if let Some((idx, _)) = available()
        .find(|(_, c)| po_match_score(anchor_po, c.po_number.as_deref().unwrap_or_default()) == EXACT_MATCH)
    {
        return Some((idx, MatchedBy::PoNumber));
    }

    // 2. 供应商名称：取最高分，同分保留最早
    let anchor_vendor = anchor.vendor_name.as_deref().unwrap_or_default();
    let mut best: Option<(usize, u8)> = None;
    for (idx, candidate) in available() {
        let score = vendor_match_score(anchor_vendor, candidate.vendor_name.as_deref().unwrap_or_default());
        if !is_vendor_accepted(score, vendor_threshold) {
            continue;
        }
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }

    best.map(|(idx, _)| (idx, MatchedBy::VendorName))
}

fn unmatched(doc: &ExtractedDocument, reason: UnmatchedReason) -> UnmatchedDocument {
    UnmatchedDocument {
        document_id: doc.document_id.clone(),
        document_type: doc.document_type,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, t: DocumentType, po: Option<&str>, vendor: Option<&str>) -> ExtractedDocument {
        ExtractedDocument {
            document_id: id.to_string(),
            document_type: t,
            po_number: po.map(String::from),
            vendor_name: vendor.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn po_number_takes_priority_over_vendor() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, Some("PO-100"), Some("Acme Corp")),
            doc("inv-vendor", DocumentType::Invoice, None, Some("Acme Corp")),
            doc("inv-po", DocumentType::Invoice, Some("po-0100"), Some("Someone Else")),
        ];
        let grouping = group_documents(&docs, 80);

        assert_eq!(grouping.groups.len(), 1);
        let group = &grouping.groups[0];
        assert_eq!(group.invoice.document_id, "inv-po");
        assert_eq!(group.matched_by, MatchedBy::PoNumber);
        assert_eq!(grouping.unmatched.len(), 1);
        assert_eq!(grouping.unmatched[0].document_id, "inv-vendor");
        assert_eq!(grouping.unmatched[0].reason, UnmatchedReason::NoCounterpart);
    }

    #[test]
    fn vendor_fallback_attaches_delivery_note() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, None, Some("SteelWorks Inc.")),
            doc("inv1", DocumentType::Invoice, Some("X-1"), Some("steelworks")),
            doc("dn1", DocumentType::DeliveryNote, None, Some("SteelWorks")),
        ];
        let grouping = group_documents(&docs, 80);

        assert_eq!(grouping.groups.len(), 1);
        let group = &grouping.groups[0];
        assert_eq!(group.matched_by, MatchedBy::VendorName);
        assert_eq!(group.delivery_note.map(|d| d.document_id.as_str()), Some("dn1"));
        assert!(grouping.unmatched.is_empty());
    }

    #[test]
    fn no_double_assignment_and_earliest_tie_wins() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, None, Some("Acme")),
            doc("po2", DocumentType::PurchaseOrder, None, Some("Acme")),
            doc("po3", DocumentType::PurchaseOrder, None, Some("Acme")),
            doc("inv1", DocumentType::Invoice, None, Some("Acme")),
            doc("inv2", DocumentType::Invoice, None, Some("ACME Inc")),
        ];
        let grouping = group_documents(&docs, 80);

        let pairs: Vec<(&str, &str)> = grouping
            .groups
            .iter()
            .map(|g| (g.po.document_id.as_str(), g.invoice.document_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("po1", "inv1"), ("po2", "inv2")]);
        assert_eq!(grouping.unmatched.len(), 1);
        assert_eq!(grouping.unmatched[0].document_id, "po3");
    }

    #[test]
    fn documents_without_identifiers_are_reported() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, None, None),
            doc("inv1", DocumentType::Invoice, None, None),
        ];
        let grouping = group_documents(&docs, 80);

        assert!(grouping.groups.is_empty());
        assert!(grouping
            .unmatched
            .iter()
            .all(|u| u.reason == UnmatchedReason::MissingIdentifiers));
        assert_eq!(grouping.unmatched.len(), 2);
    }

    #[test]
    fn empty_po_numbers_never_pair() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, Some(""), Some("Alpha Metals")),
            doc("inv1", DocumentType::Invoice, Some(""), Some("Zeta Plastics")),
        ];
        let grouping = group_documents(&docs, 80);
        assert!(grouping.groups.is_empty());
    }

    #[test]
    fn below_threshold_vendor_is_not_grouped() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, None, Some("Northwind Traders")),
            doc("inv1", DocumentType::Invoice, None, Some("Northwnd Traders")),
        ];
        assert_eq!(group_documents(&docs, 80).groups.len(), 1);
        assert!(group_documents(&docs, 99).groups.is_empty());
    }

    #[test]
    fn unattached_delivery_notes_are_reported() {
        let docs = vec![
            doc("po1", DocumentType::PurchaseOrder, Some("PO-1"), None),
            doc("po3", DocumentType::PurchaseOrder, Some("PO-3"), None),
            doc("inv1", DocumentType::Invoice, Some("PO-1"), None),
            doc("dn1", DocumentType::DeliveryNote, Some("PO-1"), None),
            doc("dn2", DocumentType::DeliveryNote, Some("PO-2"), Some("Other Supplier")),
            doc("dn3", DocumentType::DeliveryNote, Some("PO-3"), None),
            doc("dn4", DocumentType::DeliveryNote, None, None),
        ];
        let grouping = group_documents(&docs, 80);

        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].delivery_note.map(|d| d.document_id.as_str()), Some("dn1"));

        let unmatched: Vec<(&str, DocumentType, UnmatchedReason)> = grouping
            .unmatched
            .iter()
            .map(|u| (u.document_id.as_str(), u.document_type, u.reason))
            .collect();
        assert_eq!(
            unmatched,
            vec![
                ("po3", DocumentType::PurchaseOrder, UnmatchedReason::NoCounterpart),
                ("dn2", DocumentType::DeliveryNote, UnmatchedReason::NoCounterpart),
                ("dn3", DocumentType::DeliveryNote, UnmatchedReason::NoCounterpart),
                ("dn4", DocumentType::DeliveryNote, UnmatchedReason::MissingIdentifiers),
            ]
        );
    }

    #[test]
    fn po_only_workspace_yields_no_groups() {
        let docs = vec![doc("po1", DocumentType::PurchaseOrder, Some("PO-1"), Some("Acme"))];
        let grouping = group_documents(&docs, 80);
        assert!(grouping.groups.is_empty());
        assert_eq!(grouping.unmatched[0].reason, UnmatchedReason::NoCounterpart);
    }
}
