// ==========================================
// MBA 院校数据后台 - 规范字段映射表
// ==========================================
// 职责: 按实体种类声明规范字段（名称 / 候选列 / 规范化函数 /
//       默认值 / 派生回填 / 长度限制）
// 约束: 候选列顺序即解析顺序：规范列名优先于历史别名
//       新增历史别名只需改动本表一行
// ==========================================

use crate::domain::types::{EntityKind, FieldType, FieldValue};
use crate::importer::field_normalizer as norm;

// ==========================================
// Normalizer - 单元格规范化方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    Text,
    Html,
    Url,
    Date,
    Amount,
    Integer,
    Percentage,
    Decimal,
    Boolean,
}

impl Normalizer {
    /// 对非空原始文本应用规范化；无法解析时为 NULL
    pub fn apply(&self, raw: &str) -> FieldValue {
        match self {
            Normalizer::Text => FieldValue::text_or_null(norm::clean_text(raw)),
            Normalizer::Html => FieldValue::text_or_null(norm::clean_html_text(raw)),
            Normalizer::Url => FieldValue::text_or_null(norm::normalize_url(raw)),
            Normalizer::Date => FieldValue::text_or_null(norm::normalize_date(raw)),
            Normalizer::Amount => FieldValue::text_or_null(norm::extract_amount(raw)),
            Normalizer::Integer => norm::parse_integer(raw)
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            Normalizer::Percentage => norm::parse_percentage(raw)
                .map(FieldValue::Percentage)
                .unwrap_or(FieldValue::Null),
            Normalizer::Decimal => norm::parse_decimal(raw)
                .map(FieldValue::Decimal)
                .unwrap_or(FieldValue::Null),
            Normalizer::Boolean => FieldValue::Boolean(norm::parse_boolean(raw)),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Normalizer::Text
            | Normalizer::Html
            | Normalizer::Url
            | Normalizer::Date
            | Normalizer::Amount => FieldType::Text,
            Normalizer::Integer => FieldType::Integer,
            Normalizer::Percentage => FieldType::Percentage,
            Normalizer::Decimal => FieldType::Decimal,
            Normalizer::Boolean => FieldType::Boolean,
        }
    }
}

// ==========================================
// 静态默认值 / 派生回填
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Text(&'static str),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_value(&self) -> FieldValue {
        match self {
            DefaultValue::Text(s) => FieldValue::Text(s.to_string()),
            DefaultValue::Bool(b) => FieldValue::Boolean(*b),
        }
    }
}

/// 字段为空时，基于同一实体的其他字段派生
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// 从自由文本字段推断地区
    RegionFrom(&'static str),
    /// "<name> offered by <provider>"
    OfferedBy {
        name: &'static str,
        provider: &'static str,
    },
    /// 复制另一字段的值
    CopyOf(&'static str),
}

// ==========================================
// FieldSpec - 字段声明
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// 历史/别名列（规范列名本身总是第一个候选）
    pub aliases: &'static [&'static str],
    pub normalizer: Normalizer,
    pub default: Option<DefaultValue>,
    pub fallback: Option<Fallback>,
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

impl FieldSpec {
    const fn new(name: &'static str, normalizer: Normalizer) -> Self {
        Self {
            name,
            aliases: &[],
            normalizer,
            default: None,
            fallback: None,
            required: false,
            min_len: None,
            max_len: None,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self::new(name, Normalizer::Text)
    }

    const fn aliases(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    const fn default(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    const fn fallback(self, fallback: Fallback) -> Self {
        Self {
            fallback: Some(fallback),
            ..self
        }
    }

    const fn required(self, min_len: usize, max_len: usize) -> Self {
        Self {
            required: true,
            min_len: Some(min_len),
            max_len: Some(max_len),
            ..self
        }
    }

    const fn max_len(self, max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..self
        }
    }

    /// 候选列（按优先级）
    pub fn candidates(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    pub fn field_type(&self) -> FieldType {
        self.normalizer.field_type()
    }
}

// ==========================================
// EntitySchema - 实体字段表
// ==========================================
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// 按实体种类取字段表
pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::School => &SCHOOL_SCHEMA,
        EntityKind::Scholarship => &SCHOLARSHIP_SCHEMA,
    }
}

// ==========================================
// 院校 (mba_schools)
// ==========================================
static SCHOOL_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::School,
    fields: &SCHOOL_FIELDS,
};

const SCHOOL_FIELDS: [FieldSpec; 32] = [
    FieldSpec::text("name").aliases(&["School Name"]).required(2, 200),
    FieldSpec::text("description").aliases(&["Description"]),
    FieldSpec::text("location").aliases(&["Location"]),
    FieldSpec::text("country").fallback(Fallback::RegionFrom("location")),
    FieldSpec::text("type").default(DefaultValue::Text("Full-time MBA")),
    FieldSpec::text("duration").default(DefaultValue::Text("2 years")),
    FieldSpec::new("ranking", Normalizer::Integer).aliases(&[
        "qs_mba_rank",
        "ft_global_mba_rank",
        "bloomberg_mba_rank",
        "QS MBA Rank",
        "FT Global MBA Rank",
        "Bloomberg MBA Rank",
    ]),
    FieldSpec::new("qs_mba_rank", Normalizer::Integer).aliases(&["QS MBA Rank"]),
    FieldSpec::new("ft_global_mba_rank", Normalizer::Integer).aliases(&["FT Global MBA Rank"]),
    FieldSpec::new("bloomberg_mba_rank", Normalizer::Integer).aliases(&["Bloomberg MBA Rank"]),
    FieldSpec::new("class_size", Normalizer::Integer).aliases(&["Class Size"]),
    FieldSpec::new("women_percentage", Normalizer::Percentage).aliases(&["Women"]),
    FieldSpec::new("mean_gmat", Normalizer::Integer).aliases(&["Mean GMAT"]),
    FieldSpec::new("mean_gpa", Normalizer::Decimal).aliases(&["Mean GPA"]),
    FieldSpec::new("avg_gre", Normalizer::Integer).aliases(&["Avg GRE"]),
    FieldSpec::new("avg_work_exp_years", Normalizer::Decimal).aliases(&["Avg Work Exp (Years)"]),
    FieldSpec::text("avg_starting_salary").aliases(&["Avg Starting Salary"]),
    FieldSpec::text("tuition").aliases(&["Tuition (Total)"]),
    FieldSpec::text("total_cost"),
    FieldSpec::text("application_fee").aliases(&["Application Fee"]),
    FieldSpec::text("weighted_salary").aliases(&["Weighted Salary ($)"]),
    FieldSpec::new("employment_in_3_months_percent", Normalizer::Percentage)
        .aliases(&["Employment in 3 Months (%)"]),
    FieldSpec::new("employment_rate", Normalizer::Percentage),
    FieldSpec::new("gmat_gre_waiver_available", Normalizer::Boolean)
        .aliases(&["GMAT/GRE Waiver Available"])
        .default(DefaultValue::Bool(false)),
    FieldSpec::text("application_deadlines").aliases(&["Application Deadlines"]),
    FieldSpec::text("class_profile").aliases(&["Class Profile"]),
    FieldSpec::text("admissions_rounds").aliases(&["Admissions Rounds"]),
    FieldSpec::text("top_hiring_companies").aliases(&["Top Hiring Companies"]),
    FieldSpec::text("alumni_network_strength").aliases(&["Alumni Network Strength"]),
    FieldSpec::text("notable_alumni").aliases(&["Notable Alumni"]),
    FieldSpec::new("website", Normalizer::Url),
    FieldSpec::text("status").default(DefaultValue::Text("active")),
];

// ==========================================
// 奖学金 (scholarships)
// ==========================================
static SCHOLARSHIP_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Scholarship,
    fields: &SCHOLARSHIP_FIELDS,
};

const SCHOLARSHIP_FIELDS: [FieldSpec; 14] = [
    FieldSpec::text("name")
        .aliases(&["Scholarship Name", "title"])
        .required(2, 200),
    FieldSpec::text("provider")
        .aliases(&["Host Organization", "organization"])
        .max_len(150),
    FieldSpec::text("host_country")
        .aliases(&["Host Country", "country"])
        .max_len(100),
    FieldSpec::text("description")
        .max_len(2000)
        .fallback(Fallback::OfferedBy {
            name: "name",
            provider: "provider",
        }),
    FieldSpec::new("amount", Normalizer::Amount),
    FieldSpec::new("eligibility", Normalizer::Html)
        .aliases(&["Eligibility Criteria (Key Points)", "eligibility_criteria"])
        .max_len(1500),
    FieldSpec::new("deadline", Normalizer::Date).aliases(&["Latest Deadline (Approx.)"]),
    FieldSpec::new("application_url", Normalizer::Url).aliases(&["Official URL"]),
    FieldSpec::text("field_of_study"),
    FieldSpec::text("degree_level").aliases(&["Level of Study"]),
    FieldSpec::text("countries").fallback(Fallback::CopyOf("host_country")),
    FieldSpec::new("benefits", Normalizer::Html)
        .aliases(&["Benefits (Key Points)"])
        .max_len(1000),
    FieldSpec::new("fully_funded", Normalizer::Boolean)
        .aliases(&["Fully Funded?"])
        .default(DefaultValue::Bool(false)),
    FieldSpec::text("status").default(DefaultValue::Text("active")),
];
