// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文；导入消息与报告文本均经由此模块
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "zh-CN"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
///
/// # 返回
/// - false: 不支持的语言，保持当前设置
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use smart_import::i18n::t;
/// let msg = t("report.title");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use smart_import::i18n::t_with_args;
/// let msg = t_with_args("import.required", &[("field", "name")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（不改动全局语言）
pub fn t_for_locale(key: &str, locale: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn fill_args(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_for_locale() {
        let msg = t_for_locale("import.required", "en", &[("field", "name")]);
        assert_eq!(msg, "name is required");

        let msg = t_for_locale("import.required", "zh-CN", &[("field", "name")]);
        assert!(msg.contains("name"));
        assert!(msg.contains("必填"));
    }

    #[test]
    fn test_unknown_locale_rejected() {
        assert!(!set_locale("fr"));
    }

    #[test]
    fn test_missing_args_left_in_place() {
        let msg = t_for_locale("import.too_long", "en", &[("max", "10")]);
        assert!(msg.contains("10"));
        assert!(msg.contains("%{len}"));
    }
}
