use super::normalizer::{normalize_description, normalize_identifier, normalize_vendor};

/// PO号精确匹配得分
pub const EXACT_MATCH: u8 = 100;

/// PO号匹配：规范化后完全相同为 100，否则为 0；空值永远不匹配
pub fn po_match_score(a: &str, b: &str) -> u8 {
    let a = normalize_identifier(a);
    let b = normalize_identifier(b);
    if !a.is_empty() && a == b {
        EXACT_MATCH
    } else {
        0
    }
}

/// 供应商名称相似度 (0-100)，与词序无关且对称
pub fn vendor_match_score(a: &str, b: &str) -> u8 {
    token_sort_ratio(&normalize_vendor(a), &normalize_vendor(b))
}

/// 明细描述相似度，与供应商名称使用同一相似度函数
pub fn description_score(a: &str, b: &str) -> u8 {
    token_sort_ratio(&normalize_description(a), &normalize_description(b))
}

/// 供应商得分是否足以用于分组
pub fn is_vendor_accepted(score: u8, threshold: u8) -> bool {
    score > 0 && score >= threshold
}

/// 明细编号是否一致 (两侧都有编号时)
pub fn item_numbers_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => po_match_score(a, b) == EXACT_MATCH,
        _ => false,
    }
}

/// 词排序后的归一化编辑距离比，输入须已规范化
fn token_sort_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a = sort_tokens(a);
    let b = sort_tokens(b);
    if a == b {
        return EXACT_MATCH;
    }
    (strsim::normalized_levenshtein(&a, &b) * 100.0).round() as u8
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
