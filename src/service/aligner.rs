use super::identity::{description_score, item_numbers_match};
use crate::models::LineItem;

/// 排序得分权重：描述 80%，数量一致 10%，单价一致 10% (满分 1000)
const DESCRIPTION_WEIGHT: u32 = 8;
const QUANTITY_BONUS: u32 = 100;
const PRICE_BONUS: u32 = 100;

/// 已配对的明细
#[derive(Debug, Clone, Copy)]
pub struct AlignedPair<'a> {
    pub left_index: usize,
    pub right_index: usize,
    pub left: &'a LineItem,
    pub right: &'a LineItem,
    pub description_score: u8,
    /// 按明细编号强制配对
    pub by_item_number: bool,
}

/// 两份文档明细的对齐结果
///
/// 每条明细恰好出现在 pairs / left_only / right_only 之一
#[derive(Debug, Clone, Default)]
pub struct Alignment<'a> {
    pub pairs: Vec<AlignedPair<'a>>,
    pub left_only: Vec<(usize, &'a LineItem)>,
    pub right_only: Vec<(usize, &'a LineItem)>,
}

impl Alignment<'_> {
    pub fn matched_count(&self) -> usize {
        self.pairs.len()
    }
}

#[derive(Debug)]
struct Candidate {
    left: usize,
    right: usize,
    forced: bool,
    description_score: u8,
    rank: u32,
}

/// 贪心二分匹配
///
/// 计算所有 (左, 右) 组合得分，明细编号一致者强制优先，其余须达到描述相似度阈值；
/// 按 (强制, 得分 降序, 左下标, 右下标) 排序后依次提交，已配对的明细不再参与。
/// 非全局最优，但结果确定且可复现。
pub fn align_items<'a>(left: &'a [LineItem], right: &'a [LineItem], description_threshold: u8) -> Alignment<'a> {
    if left.is_empty() || right.is_empty() {
        return Alignment {
            pairs: Vec::new(),
            left_only: left.iter().enumerate().collect(),
            right_only: right.iter().enumerate().collect(),
        };
    }

    let mut candidates = Vec::new();
    for (li, l) in left.iter().enumerate() {
        for (ri, r) in right.iter().enumerate() {
            let forced = item_numbers_match(l.item_number.as_deref(), r.item_number.as_deref());
            let desc = description_score(&l.description, &r.description);
            if !forced && (desc == 0 || desc < description_threshold) {
                continue;
            }
            candidates.push(Candidate {
                left: li,
                right: ri,
                forced,
                description_score: desc,
                rank: rank(l, r, desc),
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.forced
            .cmp(&a.forced)
            .then_with(|| b.rank.cmp(&a.rank))
            .then_with(|| a.left.cmp(&b.left))
            .then_with(|| a.right.cmp(&b.right))
    });

    let mut left_used = vec![false; left.len()];
    let mut right_used = vec![false; right.len()];
    let mut pairs = Vec::new();

    for c in candidates {
        if left_used[c.left] || right_used[c.right] {
            continue;
        }
        left_used[c.left] = true;
        right_used[c.right] = true;
        pairs.push(AlignedPair {
            left_index: c.left,
            right_index: c.right,
            left: &left[c.left],
            right: &right[c.right],
            description_score: c.description_score,
            by_item_number: c.forced,
        });
    }
    pairs.sort_by_key(|p| p.left_index);

    let left_only = left.iter().enumerate().filter(|(i, _)| !left_used[*i]).collect();
    let right_only = right.iter().enumerate().filter(|(i, _)| !right_used[*i]).collect();

    tracing::debug!(
        "aligned {} pairs, {} left-only, {} right-only",
        pairs.len(),
        left.len() - pairs.len(),
        right.len() - pairs.len()
    );

    Alignment {
        pairs,
        left_only,
        right_only,
    }
}

fn rank(l: &LineItem, r: &LineItem, desc: u8) -> u32 {
    let mut score = u32::from(desc) * DESCRIPTION_WEIGHT;
    if l.quantity.is_some() && l.quantity == r.quantity {
        score += QUANTITY_BONUS;
    }
    if l.unit_price.is_some() && l.unit_price == r.unit_price {
        score += PRICE_BONUS;
    }
    score
}
