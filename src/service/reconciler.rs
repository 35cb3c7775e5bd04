use rayon::prelude::*;

use super::aggregator::assemble;
use super::aligner::align_items;
use super::detector::detect;
use super::grouper::{group_documents, MatchGroup};
use crate::config::MatchingConfig;
use crate::models::{ExtractedDocument, MatchingResult, ReconcileOutcome, WorkspaceDocuments};

/// 对账入口：工作区文档快照 + 配置 -> 对账结果
///
/// 纯计算，无共享状态。分组完成后各组并行对齐/检测，结果保持分组顺序。
pub fn reconcile(documents: &[ExtractedDocument], config: &MatchingConfig) -> ReconcileOutcome {
    tracing::info!("Reconciling {} documents", documents.len());

    let grouping = group_documents(documents, config.vendor_match_threshold);
    let results: Vec<MatchingResult> = grouping
        .groups
        .par_iter()
        .map(|group| reconcile_group(group, config))
        .collect();

    let discrepancy_count: usize = results.iter().map(|r| r.discrepancies.len()).sum();
    tracing::info!(
        "Reconciliation done: {} groups, {} discrepancies, {} unmatched documents",
        results.len(),
        discrepancy_count,
        grouping.unmatched.len()
    );

    ReconcileOutcome {
        results,
        unmatched: grouping.unmatched,
    }
}

/// 多个工作区互不相关，直接并行
pub fn reconcile_workspaces(workspaces: &[WorkspaceDocuments], config: &MatchingConfig) -> Vec<ReconcileOutcome> {
    workspaces
        .par_iter()
        .map(|ws| {
            tracing::debug!("workspace {}", ws.workspace_id);
            reconcile(&ws.documents, config)
        })
        .collect()
}

fn reconcile_group(group: &MatchGroup, config: &MatchingConfig) -> MatchingResult {
    let alignment = align_items(
        &group.po.line_items,
        &group.invoice.line_items,
        config.description_match_threshold,
    );
    let discrepancies = detect(group, &alignment, config);

    tracing::debug!(
        "Group PO {} / Invoice {}: {} pairs, {} discrepancies",
        group.po.document_id,
        group.invoice.document_id,
        alignment.matched_count(),
        discrepancies.len()
    );

    assemble(group, &alignment, discrepancies)
}

/// 持有配置的对账服务，供 HTTP 层共享
pub struct ReconcileService {
    config: MatchingConfig,
}

impl ReconcileService {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// 使用服务默认配置对账
    pub fn reconcile(&self, documents: &[ExtractedDocument]) -> ReconcileOutcome {
        reconcile(documents, &self.config)
    }
}
