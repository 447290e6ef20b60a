// ==========================================
// MBA 院校数据后台 - 字段规范化函数
// ==========================================
// 职责: 将格式松散的单元格文本转换为类型化标量
// 约束: 全部为纯函数，且为全函数（不 panic、不返回 Err；
//       无法解析时返回 None）
// ==========================================

use chrono::NaiveDate;

// ==========================================
// 数值
// ==========================================

/// 解析整数
///
/// # 规则
/// 1. 去除近似/括号标记 `~ ( )`
/// 2. 在第一个 `-` 或 `,` 处截断（区间取下限）
/// 3. 去除所有非数字字符后解析
///
/// # 示例
/// - "~400" → 400
/// - "300-350" → 300
/// - "1,200" → 1（逗号视为分隔符）
/// - "N/A" → None
pub fn parse_integer(value: &str) -> Option<i64> {
    let stripped: String = value
        .chars()
        .filter(|c| !matches!(c, '~' | '(' | ')'))
        .collect();
    let head = stripped.split(['-', ',']).next().unwrap_or("");
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()
}

/// 解析百分比（去掉第一个 `%` 后取前缀浮点数）
pub fn parse_percentage(value: &str) -> Option<f64> {
    leading_float(&value.replacen('%', "", 1))
}

/// 解析小数（取前缀浮点数）
pub fn parse_decimal(value: &str) -> Option<f64> {
    leading_float(value)
}

/// 解析前缀浮点数："3.5 years" → 3.5，"abc" → None
fn leading_float(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digit_count = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digit_count += frac_end - frac_start;
        if frac_end > frac_start || digit_count > 0 {
            end = frac_end;
        }
    }
    if digit_count == 0 {
        return None;
    }

    // 指数部分仅在后跟数字时生效
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

// ==========================================
// 布尔
// ==========================================

const AFFIRMATIVE_TOKENS: [&str; 4] = ["yes", "true", "1", "y"];

/// 解析布尔值：命中肯定词表为 true，其余（含空）为 false
pub fn parse_boolean(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    AFFIRMATIVE_TOKENS.contains(&lowered.as_str())
}

// ==========================================
// 地区推断
// ==========================================

/// 规范地区名 → 同义词（有序表，先命中者胜出）
const REGION_SYNONYMS: &[(&str, &[&str])] = &[
    ("USA", &["USA", "United States", "US", "America"]),
    ("UK", &["UK", "United Kingdom", "England", "Britain"]),
    ("Canada", &["Canada"]),
    ("France", &["France"]),
    ("Spain", &["Spain"]),
    ("Germany", &["Germany"]),
    ("China", &["China"]),
    ("India", &["India"]),
    ("Switzerland", &["Switzerland"]),
    ("Italy", &["Italy"]),
    ("Singapore", &["Singapore"]),
    ("Australia", &["Australia"]),
    ("Netherlands", &["Netherlands", "Holland"]),
];

/// 从自由文本（如 "Boston, MA, USA"）推断地区
///
/// 子串匹配区分大小写；无命中时原样返回输入
pub fn infer_region_from_free_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    REGION_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| text.contains(s)))
        .map(|(region, _)| region.to_string())
        .unwrap_or_else(|| text.to_string())
}

// ==========================================
// 文本
// ==========================================

/// TRIM；空串 → None
pub fn clean_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 清理富文本单元格
///
/// - `<br>` / `<br/>`（含转义形式）→ 换行
/// - 其余标签剥离
/// - 常见实体解码
/// - 每行内空白折叠，空行丢弃
pub fn clean_html_text(value: &str) -> Option<String> {
    let mut text = value.to_string();
    for br in ["&lt;br&gt;", "&lt;br/&gt;", "&lt;br /&gt;"] {
        text = replace_ignore_case(&text, br, "\n");
    }
    text = strip_escaped_tags(&text);
    for br in ["<br>", "<br/>", "<br />"] {
        text = replace_ignore_case(&text, br, "\n");
    }
    let stripped = strip_tags(&text);
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    let lines: Vec<String> = decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(pos) = lower[cursor..].find(&needle) {
        let start = cursor + pos;
        out.push_str(&haystack[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    // 未闭合的 '<' 不是标签，保留原文
    if in_tag {
        return text.to_string();
    }
    out
}

fn strip_escaped_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("&lt;") {
        match rest[start..].find("&gt;") {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + end + "&gt;".len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// 规范化网址：`www.` 开头补全为 `https://www.`
pub fn normalize_url(value: &str) -> Option<String> {
    let cleaned = clean_text(value)?;
    if cleaned.starts_with("www.") {
        Some(format!("https://{}", cleaned))
    } else {
        Some(cleaned)
    }
}

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// 规范化日期：可识别时输出 ISO `YYYY-MM-DD`，否则返回 TRIM 后原文
///
/// "Month YYYY" 取当月 1 日
pub fn normalize_date(value: &str) -> Option<String> {
    let cleaned = clean_text(value)?;
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {}", cleaned), "%d %B %Y") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    Some(cleaned)
}

/// 提取金额：取第一组数字（去千分位），否则返回 TRIM 后原文
///
/// "$10,000 per year" → "10000"；"Full tuition" → "Full tuition"
pub fn extract_amount(value: &str) -> Option<String> {
    let cleaned = clean_text(value)?;
    let group: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    match group.parse::<u64>() {
        Ok(n) if n > 0 => Some(n.to_string()),
        _ => Some(cleaned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_ranges_and_markers() {
        assert_eq!(parse_integer("400"), Some(400));
        assert_eq!(parse_integer("~400"), Some(400));
        assert_eq!(parse_integer("(approx) 350"), Some(350));
        assert_eq!(parse_integer("300-350"), Some(300));
        assert_eq!(parse_integer("1,200"), Some(1));
        assert_eq!(parse_integer("#12"), Some(12));
        assert_eq!(parse_integer("N/A"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("-5"), None);
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("45%"), Some(45.0));
        assert_eq!(parse_percentage(" 38.5 % "), Some(38.5));
        assert_eq!(parse_percentage("n/a"), None);
    }

    #[test]
    fn test_parse_decimal_uses_leading_number() {
        assert_eq!(parse_decimal("3.6"), Some(3.6));
        assert_eq!(parse_decimal("5.5 years"), Some(5.5));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("7."), Some(7.0));
        assert_eq!(parse_decimal("1e3"), Some(1000.0));
        assert_eq!(parse_decimal("2e"), Some(2.0));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("-"), None);
    }

    #[test]
    fn test_parse_boolean() {
        assert!(parse_boolean("Yes"));
        assert!(parse_boolean(" TRUE "));
        assert!(parse_boolean("1"));
        assert!(parse_boolean("y"));
        assert!(!parse_boolean("no"));
        assert!(!parse_boolean(""));
        assert!(!parse_boolean("maybe"));
    }

    #[test]
    fn test_infer_region_first_match_wins() {
        assert_eq!(infer_region_from_free_text("Boston, MA, USA"), "USA");
        assert_eq!(infer_region_from_free_text("London, United Kingdom"), "UK");
        assert_eq!(infer_region_from_free_text("Fontainebleau, France"), "France");
        assert_eq!(infer_region_from_free_text("Amsterdam, Holland"), "Netherlands");
        assert_eq!(infer_region_from_free_text("Springfield"), "Springfield");
        assert_eq!(infer_region_from_free_text(""), "");
    }

    #[test]
    fn test_clean_html_text() {
        assert_eq!(
            clean_html_text("<p>Full   tuition</p><br/>Living &amp; travel").as_deref(),
            Some("Full tuition\nLiving & travel")
        );
        assert_eq!(
            clean_html_text("GPA 3.0&lt;br&gt;IELTS 6.5").as_deref(),
            Some("GPA 3.0\nIELTS 6.5")
        );
        assert_eq!(clean_html_text("  <b></b> "), None);
        assert_eq!(clean_html_text("a < b").as_deref(), Some("a < b"));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("www.chevening.org").as_deref(),
            Some("https://www.chevening.org")
        );
        assert_eq!(
            normalize_url("https://daad.de").as_deref(),
            Some("https://daad.de")
        );
        assert_eq!(normalize_url("  "), None);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2025-11-05").as_deref(), Some("2025-11-05"));
        assert_eq!(normalize_date("2025/11/05").as_deref(), Some("2025-11-05"));
        assert_eq!(normalize_date("11/05/2025").as_deref(), Some("2025-11-05"));
        assert_eq!(normalize_date("November 5, 2025").as_deref(), Some("2025-11-05"));
        assert_eq!(normalize_date("5 November 2025").as_deref(), Some("2025-11-05"));
        assert_eq!(normalize_date("November 2025").as_deref(), Some("2025-11-01"));
        assert_eq!(normalize_date(" Rolling ").as_deref(), Some("Rolling"));
    }

    #[test]
    fn test_extract_amount() {
        assert_eq!(extract_amount("$10,000 per year").as_deref(), Some("10000"));
        assert_eq!(extract_amount("Full tuition").as_deref(), Some("Full tuition"));
        assert_eq!(extract_amount("0 EUR").as_deref(), Some("0 EUR"));
        assert_eq!(extract_amount(""), None);
    }
}
