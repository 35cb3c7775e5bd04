use bigdecimal::BigDecimal;
use std::collections::HashMap;

use super::aligner::{align_items, AlignedPair, Alignment};
use super::grouper::MatchGroup;
use super::normalizer::{normalize_currency, normalize_description};
use super::severity::{classify, Magnitude};
use crate::config::MatchingConfig;
use crate::models::{Discrepancy, DiscrepancyType, ExtractedDocument, LineItem, ValueSnapshot};

/// 检测一个匹配组的全部差异
///
/// 顺序固定：逐对明细 (按PO行序) -> 缺失 -> 多出 -> 送货单数量 -> 表头 (币种/税率/税额)
pub fn detect(group: &MatchGroup, alignment: &Alignment, config: &MatchingConfig) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();
    // PO行号 -> 该行数量差异在 discrepancies 中的位置
    let mut quantity_by_po_line: HashMap<usize, usize> = HashMap::new();

    for pair in &alignment.pairs {
        if let Some(d) = quantity_mismatch(pair, config) {
            quantity_by_po_line.insert(pair.left_index, discrepancies.len());
            discrepancies.push(d);
        }
        discrepancies.extend(price_change(pair, config));
        discrepancies.extend(description_mismatch(pair, config));
    }

    for (_, item) in &alignment.left_only {
        discrepancies.push(missing_item(item, config));
    }
    for (_, item) in &alignment.right_only {
        discrepancies.push(extra_item(item, config));
    }

    if let Some(note) = group.delivery_note {
        apply_delivery(&mut discrepancies, &mut quantity_by_po_line, group.po, note, config);
    }

    discrepancies.extend(header_discrepancies(group.po, group.invoice, config));
    discrepancies
}

/// 表头级比较，每组一次
pub fn header_discrepancies(po: &ExtractedDocument, invoice: &ExtractedDocument, config: &MatchingConfig) -> Vec<Discrepancy> {
    let mut out = Vec::new();

    let currency = |doc: &ExtractedDocument| {
        doc.currency
            .as_deref()
            .map(normalize_currency)
            .filter(|c| !c.is_empty())
    };
    match (currency(po), currency(invoice)) {
        (Some(po_cur), Some(inv_cur)) if po_cur != inv_cur => {
            out.push(Discrepancy {
                discrepancy_type: DiscrepancyType::CurrencyMismatch,
                severity: classify(DiscrepancyType::CurrencyMismatch, &Magnitude::Structural, config),
                item_number: None,
                description: "Currency Mismatch".to_string(),
                po_value: Some(ValueSnapshot::currency(&po_cur)),
                invoice_value: Some(ValueSnapshot::currency(&inv_cur)),
                delivery_value: None,
                message: format!("Currency mismatch: PO={}, Invoice={}", po_cur, inv_cur),
            });
        }
        (None, _) | (_, None) => {
            tracing::debug!(
                "currency check skipped, PO: {:?}, Invoice: {:?}",
                po.currency,
                invoice.currency
            );
        }
        _ => {}
    }

    let tax_difference = match (&po.tax_amount, &invoice.tax_amount) {
        (Some(p), Some(i)) => Some((i - p).abs()),
        _ => None,
    };
    let tax_snapshot = |doc: &ExtractedDocument| ValueSnapshot::tax(doc.tax_rate.as_ref(), doc.tax_amount.as_ref());

    if let (Some(po_rate), Some(inv_rate)) = (&po.tax_rate, &invoice.tax_rate) {
        if (inv_rate - po_rate).abs() > config.tax_rate_epsilon {
            let magnitude = Magnitude::TaxDifference(tax_difference.clone());
            out.push(Discrepancy {
                discrepancy_type: DiscrepancyType::TaxRateMismatch,
                severity: classify(DiscrepancyType::TaxRateMismatch, &magnitude, config),
                item_number: None,
                description: "Tax Rate Mismatch".to_string(),
                po_value: Some(tax_snapshot(po)),
                invoice_value: Some(tax_snapshot(invoice)),
                delivery_value: None,
                message: format!("Tax rate mismatch: PO={}%, Invoice={}%", po_rate, inv_rate),
            });
        }
    }

    if let (Some(po_tax), Some(inv_tax), Some(diff)) = (&po.tax_amount, &invoice.tax_amount, &tax_difference) {
        if *diff > config.tax_amount_epsilon {
            let magnitude = Magnitude::TaxDifference(Some(diff.clone()));
            out.push(Discrepancy {
                discrepancy_type: DiscrepancyType::TaxAmountMismatch,
                severity: classify(DiscrepancyType::TaxAmountMismatch, &magnitude, config),
                item_number: None,
                description: "Tax Amount Mismatch".to_string(),
                po_value: Some(tax_snapshot(po)),
                invoice_value: Some(tax_snapshot(invoice)),
                delivery_value: None,
                message: format!(
                    "Tax amount mismatch: PO={}, Invoice={} (difference: {})",
                    money(po_tax),
                    money(inv_tax),
                    money(diff)
                ),
            });
        }
    }

    out
}

fn quantity_mismatch(pair: &AlignedPair, config: &MatchingConfig) -> Option<Discrepancy> {
    let (po_qty, inv_qty) = (pair.left.quantity.as_ref()?, pair.right.quantity.as_ref()?);
    if (inv_qty - po_qty).abs() <= config.quantity_tolerance {
        return None;
    }

    let magnitude = Magnitude::Deviation {
        expected: po_qty.clone(),
        actual: inv_qty.clone(),
    };
    let (item_number, description) = pair_identity(pair);
    Some(Discrepancy {
        discrepancy_type: DiscrepancyType::QuantityMismatch,
        severity: classify(DiscrepancyType::QuantityMismatch, &magnitude, config),
        message: format!(
            "{} ordered {} units, invoice shows {} units",
            item_label(item_number.as_deref(), &description),
            po_qty,
            inv_qty
        ),
        item_number,
        description,
        po_value: Some(ValueSnapshot::quantity(po_qty)),
        invoice_value: Some(ValueSnapshot::quantity(inv_qty)),
        delivery_value: None,
    })
}

fn price_change(pair: &AlignedPair, config: &MatchingConfig) -> Option<Discrepancy> {
    let (po_price, inv_price) = (pair.left.unit_price.as_ref()?, pair.right.unit_price.as_ref()?);
    if (inv_price - po_price).abs() <= config.price_tolerance {
        return None;
    }

    let magnitude = Magnitude::Deviation {
        expected: po_price.clone(),
        actual: inv_price.clone(),
    };
    let (item_number, description) = pair_identity(pair);
    Some(Discrepancy {
        discrepancy_type: DiscrepancyType::PriceChange,
        severity: classify(DiscrepancyType::PriceChange, &magnitude, config),
        message: format!(
            "{} priced at {} on PO, invoice shows {}",
            item_label(item_number.as_deref(), &description),
            money(po_price),
            money(inv_price)
        ),
        item_number,
        description,
        po_value: Some(ValueSnapshot::unit_price(po_price)),
        invoice_value: Some(ValueSnapshot::unit_price(inv_price)),
        delivery_value: None,
    })
}

/// 按明细编号强制配对但描述差异较大
fn description_mismatch(pair: &AlignedPair, config: &MatchingConfig) -> Option<Discrepancy> {
    if !pair.by_item_number || pair.description_score >= config.description_match_threshold {
        return None;
    }
    // 两边都没有描述，无从比较
    if normalize_description(&pair.left.description).is_empty()
        && normalize_description(&pair.right.description).is_empty()
    {
        return None;
    }

    let (item_number, description) = pair_identity(pair);
    Some(Discrepancy {
        discrepancy_type: DiscrepancyType::DescriptionMismatch,
        severity: classify(DiscrepancyType::DescriptionMismatch, &Magnitude::Structural, config),
        message: format!(
            "{} description differs: PO '{}', invoice '{}' (similarity {}%)",
            item_label(item_number.as_deref(), &description),
            pair.left.description,
            pair.right.description,
            pair.description_score
        ),
        item_number,
        description,
        po_value: Some(ValueSnapshot::description(&pair.left.description)),
        invoice_value: Some(ValueSnapshot::description(&pair.right.description)),
        delivery_value: None,
    })
}

fn missing_item(item: &LineItem, config: &MatchingConfig) -> Discrepancy {
    Discrepancy {
        discrepancy_type: DiscrepancyType::MissingItem,
        severity: classify(DiscrepancyType::MissingItem, &Magnitude::Structural, config),
        item_number: item.item_number.clone(),
        description: item.description.clone(),
        po_value: Some(ValueSnapshot::from_item(item)),
        invoice_value: None,
        delivery_value: None,
        message: format!(
            "{}{} is on PO but missing from invoice",
            item_label(item.item_number.as_deref(), &item.description),
            units_suffix(item)
        ),
    }
}

fn extra_item(item: &LineItem, config: &MatchingConfig) -> Discrepancy {
    Discrepancy {
        discrepancy_type: DiscrepancyType::ExtraItem,
        severity: classify(DiscrepancyType::ExtraItem, &Magnitude::Structural, config),
        item_number: item.item_number.clone(),
        description: item.description.clone(),
        po_value: None,
        invoice_value: Some(ValueSnapshot::from_item(item)),
        delivery_value: None,
        message: format!(
            "{}{} is on invoice but not on PO",
            item_label(item.item_number.as_deref(), &item.description),
            units_suffix(item)
        ),
    }
}

/// 送货单数量核对：已有数量差异则补充送货数量，否则新增一条
fn apply_delivery(
    discrepancies: &mut Vec<Discrepancy>,
    quantity_by_po_line: &mut HashMap<usize, usize>,
    po: &ExtractedDocument,
    note: &ExtractedDocument,
    config: &MatchingConfig,
) {
    let alignment = align_items(&po.line_items, &note.line_items, config.description_match_threshold);

    for pair in &alignment.pairs {
        let (Some(po_qty), Some(dn_qty)) = (&pair.left.quantity, &pair.right.quantity) else {
            continue;
        };
        if (dn_qty - po_qty).abs() <= config.quantity_tolerance {
            continue;
        }

        if let Some(&idx) = quantity_by_po_line.get(&pair.left_index) {
            let existing = &mut discrepancies[idx];
            existing.delivery_value = Some(ValueSnapshot::quantity(dn_qty));
            existing.message.push_str(&format!(", delivery note shows {} units", dn_qty));
            continue;
        }

        let magnitude = Magnitude::Deviation {
            expected: po_qty.clone(),
            actual: dn_qty.clone(),
        };
        let (item_number, description) = pair_identity(pair);
        quantity_by_po_line.insert(pair.left_index, discrepancies.len());
        discrepancies.push(Discrepancy {
            discrepancy_type: DiscrepancyType::QuantityMismatch,
            severity: classify(DiscrepancyType::QuantityMismatch, &magnitude, config),
            message: format!(
                "{} ordered {} units, delivery note shows {} units",
                item_label(item_number.as_deref(), &description),
                po_qty,
                dn_qty
            ),
            item_number,
            description,
            po_value: Some(ValueSnapshot::quantity(po_qty)),
            invoice_value: None,
            delivery_value: Some(ValueSnapshot::quantity(dn_qty)),
        });
    }
}

/// 差异展示用的编号和描述：优先取PO侧
fn pair_identity(pair: &AlignedPair) -> (Option<String>, String) {
    let item_number = pair
        .left
        .item_number
        .clone()
        .or_else(|| pair.right.item_number.clone());
    let description = if pair.left.description.trim().is_empty() {
        pair.right.description.clone()
    } else {
        pair.left.description.clone()
    };
    (item_number, description)
}

fn item_label(item_number: Option<&str>, description: &str) -> String {
    match item_number {
        Some(n) => format!("Item #{}", n),
        None => format!("'{}'", description),
    }
}

fn units_suffix(item: &LineItem) -> String {
    item.quantity
        .as_ref()
        .map(|q| format!(" ({} units)", q))
        .unwrap_or_default()
}

/// 四舍五入到分
fn money(value: &BigDecimal) -> String {
    format!("${}", value.round(2).with_scale(2))
}
