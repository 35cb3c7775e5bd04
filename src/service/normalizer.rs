use bigdecimal::BigDecimal;
use std::str::FromStr;

/// 常见法人后缀，仅在名称末尾剥离
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "llc",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "co",
];

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '%'];

/// 指数上限，超出视为无法解析 ("1e999999999" 比较时会展开成十亿位)
const MAX_AMOUNT_SCALE: i64 = 32;

/// 供应商名称规范化：小写、去标点、去末尾法人后缀
///
/// "SteelWorks Inc." 与 "steelworks" 规范化后相同
pub fn normalize_vendor(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.last().is_some_and(|t| LEGAL_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// 标识符规范化 (PO号、明细编号)：去空白、统一大小写、去掉数字段前导零
///
/// "PO-00123" 与 "po-123" 规范化后相同，其余字符保持不变
pub fn normalize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .peekable();

    while let Some(c) = chars.next() {
        let in_digit_run = out.ends_with(|p: char| p.is_ascii_digit());
        if c == '0' && !in_digit_run && chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            continue;
        }
        out.push(c);
    }
    out
}

/// 明细描述规范化：小写，标点视为分隔符
pub fn normalize_description(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 币种规范化，常见符号映射为 ISO 代码
pub fn normalize_currency(raw: &str) -> String {
    match raw.trim() {
        "$" => "USD".to_string(),
        "€" => "EUR".to_string(),
        "£" => "GBP".to_string(),
        other => other.to_uppercase(),
    }
}

/// 金额解析："USD 1,234.50"、"$2.50"、"8.25%"、"Rs. 100" 均可；无法解析返回 None
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    let is_decoration = |c: char| c.is_alphabetic() || CURRENCY_SYMBOLS.contains(&c);
    let trimmed = raw.trim();
    let body = trimmed.trim_start_matches(is_decoration);
    let prefix = &trimmed[..trimmed.len() - body.len()];
    // 缩写前缀的句点 ("Rs.")
    let body = if prefix.ends_with(char::is_alphabetic) {
        body.trim_start().strip_prefix('.').unwrap_or(body)
    } else {
        body
    };
    let cleaned: String = body
        .trim_end_matches(is_decoration)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if !cleaned.contains(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let value = BigDecimal::from_str(&cleaned).ok()?;
    let (_, scale) = value.as_bigint_and_exponent();
    if scale.abs() > MAX_AMOUNT_SCALE {
        return None;
    }
    Some(value)
}
