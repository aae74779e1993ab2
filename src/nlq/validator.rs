//! Query validation.
//!
//! Scores a generated SQL statement against the question that produced it.
//! The validator is an ordered battery of independent heuristic rules; each
//! rule may subtract from a running confidence and contribute an issue and
//! a suggestion. Deductions accumulate and the final confidence is clamped
//! to [20, 100]. Pure function, no side effects, never fails.

use crate::models::DatabaseSchema;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Confidence floor; the validator never reports below this.
const MIN_CONFIDENCE: u32 = 20;

/// Overall verdict derived from the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Confidence >= 80
    Good,
    /// Confidence >= 60
    Warning,
    /// Anything lower
    Error,
}

/// The validator's assessment of a (question, SQL) pair.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub status: ValidationStatus,
    /// Integer in [20, 100].
    pub confidence: u8,
    pub message: String,
    /// Ordered as produced by the triggered rules.
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// One triggered rule: the deduction plus the feedback it contributes.
struct RuleHit {
    deduction: u32,
    issue: String,
    suggestion: String,
}

impl RuleHit {
    fn new(deduction: u32, issue: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            deduction,
            issue: issue.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Normalized inputs shared by every rule: question lower-cased for keyword
/// tests, SQL upper-cased for token tests.
struct RuleContext<'a> {
    question: String,
    sql: String,
    schema: &'a DatabaseSchema,
}

type Rule = fn(&RuleContext) -> Vec<RuleHit>;

/// Rule battery, evaluated in order. Rules are independent; they are not
/// mutually exclusive and their deductions accumulate.
const RULES: &[Rule] = &[
    count_rule,
    sum_rule,
    average_rule,
    maximum_rule,
    minimum_rule,
    grouping_rule,
    date_filter_rule,
    range_filter_rule,
    periodicity_rule,
    table_relevance_rule,
    limit_rule,
];

/// Validate a generated query against the question it should answer.
pub fn validate_query(question: &str, sql: &str, schema: &DatabaseSchema) -> Validation {
    let ctx = RuleContext {
        question: question.to_lowercase(),
        sql: sql.to_uppercase(),
        schema,
    };

    let mut total_deduction: u32 = 0;
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    for rule in RULES {
        for hit in rule(&ctx) {
            total_deduction += hit.deduction;
            issues.push(hit.issue);
            suggestions.push(hit.suggestion);
        }
    }

    let confidence = 100u32.saturating_sub(total_deduction).max(MIN_CONFIDENCE) as u8;
    let (status, message) = status_for(confidence);

    Validation {
        status,
        confidence,
        message: message.to_string(),
        issues,
        suggestions,
    }
}

fn status_for(confidence: u8) -> (ValidationStatus, &'static str) {
    if confidence >= 80 {
        (
            ValidationStatus::Good,
            "Query looks good and matches your question",
        )
    } else if confidence >= 60 {
        (
            ValidationStatus::Warning,
            "Query may partially match your question",
        )
    } else {
        (
            ValidationStatus::Error,
            "Query might not fully answer your question",
        )
    }
}

// =============================================================================
// Shared keyword helpers
// =============================================================================

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const MONTH_NAMES: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// "this week", "last month", "next quarter", ...
fn period_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(this|last|next)\s+(week|month|year|quarter)\b").expect("valid regex")
    })
}

/// Bare years 2020-2026.
fn bare_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b202[0-6]\b").expect("valid regex"))
}

/// "last 30 days", "past 7 days"
fn last_n_days_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(last|past)\s+\d+\s+days?\b").expect("valid regex"))
}

/// "3 weeks ago", "1 year ago"
fn units_ago_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\s+(day|week|month|year)s?\s+ago\b").expect("valid regex"))
}

/// Absolute or relative date token anywhere in the question.
fn mentions_date(question: &str) -> bool {
    question.contains("today")
        || question.contains("yesterday")
        || contains_any(question, WEEKDAYS)
        || contains_any(question, MONTH_NAMES)
        || period_phrase_re().is_match(question)
        || bare_year_re().is_match(question)
}

const RANGE_KEYWORDS: &[&str] = &[
    "since", "before", "after", "between", "from", "until", "recent", "latest", "oldest", "newest",
];

/// Duration or range phrase anywhere in the question.
fn mentions_duration(question: &str) -> bool {
    last_n_days_re().is_match(question)
        || units_ago_re().is_match(question)
        || contains_any(question, RANGE_KEYWORDS)
        || period_phrase_re().is_match(question)
}

const PERIODICITY_PHRASES: &[&str] = &[
    "daily",
    "weekly",
    "monthly",
    "yearly",
    "quarterly",
    "per day",
    "per week",
    "per month",
    "per year",
    "by day",
    "by week",
    "by month",
    "by year",
    "by date",
    "over time",
    "trend",
    "history",
    "historical",
];

fn mentions_periodicity(question: &str) -> bool {
    contains_any(question, PERIODICITY_PHRASES)
}

/// Column-name substrings that suggest a date/time column.
const DATE_COLUMN_PATTERNS: &[&str] = &[
    "DATE", "TIME", "CREATED", "UPDATED", "TIMESTAMP", "_AT", "_ON",
];

/// Recognized date function tokens.
const DATE_FUNCTIONS: &[&str] = &[
    "DATE",
    "DATETIME",
    "TIMESTAMP",
    "STRFTIME",
    "DATE_TRUNC",
    "EXTRACT",
    "YEAR",
    "MONTH",
    "DAY",
];

/// Whether the SQL appears to touch a date column or date function.
fn references_date(sql: &str) -> bool {
    contains_any(sql, DATE_COLUMN_PATTERNS) || contains_any(sql, DATE_FUNCTIONS)
}

// =============================================================================
// Rules
// =============================================================================

fn count_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &["how many", "count", "number of", "total number"];
    if contains_any(&ctx.question, TRIGGERS) && !ctx.sql.contains("COUNT") {
        return vec![RuleHit::new(
            30,
            "Question asks for a count, but the query does not use COUNT",
            "Use COUNT(*) or COUNT(column) to count matching rows",
        )];
    }
    Vec::new()
}

fn sum_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &["total", "sum of", "combined"];
    // "total number" is a count phrasing, handled by count_rule
    let triggered =
        contains_any(&ctx.question, TRIGGERS) && !ctx.question.contains("total number");
    if triggered && !ctx.sql.contains("SUM") && !ctx.sql.contains("COUNT") {
        return vec![RuleHit::new(
            25,
            "Question asks for a total, but the query does not aggregate with SUM",
            "Use SUM(column) to add up a numeric column",
        )];
    }
    Vec::new()
}

fn average_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &["average", "avg", "mean"];
    if contains_any(&ctx.question, TRIGGERS) && !ctx.sql.contains("AVG") {
        return vec![RuleHit::new(
            30,
            "Question asks for an average, but the query does not use AVG",
            "Use AVG(column) to compute the average of a numeric column",
        )];
    }
    Vec::new()
}

fn maximum_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &["highest", "maximum", "max", "most", "largest", "biggest"];
    if contains_any(&ctx.question, TRIGGERS)
        && !ctx.sql.contains("MAX")
        && !ctx.sql.contains("ORDER BY")
    {
        return vec![RuleHit::new(
            20,
            "Question asks for the highest value, but the query has no MAX or ORDER BY",
            "Use MAX(column), or ORDER BY column DESC with LIMIT 1",
        )];
    }
    Vec::new()
}

fn minimum_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &["lowest", "minimum", "min", "least", "smallest"];
    if contains_any(&ctx.question, TRIGGERS)
        && !ctx.sql.contains("MIN")
        && !ctx.sql.contains("ORDER BY")
    {
        return vec![RuleHit::new(
            20,
            "Question asks for the lowest value, but the query has no MIN or ORDER BY",
            "Use MIN(column), or ORDER BY column ASC with LIMIT 1",
        )];
    }
    Vec::new()
}

fn grouping_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &[" by ", " per ", " each ", " for each "];
    if contains_any(&ctx.question, TRIGGERS) && !ctx.sql.contains("GROUP BY") {
        return vec![RuleHit::new(
            20,
            "Question implies a per-category breakdown, but the query has no GROUP BY",
            "Add GROUP BY to break the results down per category",
        )];
    }
    Vec::new()
}

/// Specific-date rule. Defers to `range_filter_rule` when the question also
/// carries a duration/range phrase ("last month" is a range, not a point in
/// time), so the pair deducts once, not twice.
fn date_filter_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    if !mentions_date(&ctx.question) || mentions_duration(&ctx.question) {
        return Vec::new();
    }
    if !ctx.sql.contains("WHERE") {
        return vec![RuleHit::new(
            25,
            "Question mentions a specific date, but the query has no WHERE clause",
            "Add a WHERE clause filtering on a date column",
        )];
    }
    if !references_date(&ctx.sql) {
        return vec![RuleHit::new(
            20,
            "Query filters rows, but does not appear to reference a date column",
            "Filter on a date or timestamp column (e.g. created_at) for the mentioned date",
        )];
    }
    Vec::new()
}

fn range_filter_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    if !mentions_duration(&ctx.question) {
        return Vec::new();
    }
    if !ctx.sql.contains("WHERE") {
        return vec![RuleHit::new(
            30,
            "Question asks about a time period, but the query has no WHERE clause",
            "Add a WHERE clause restricting rows to the requested time period",
        )];
    }
    if !references_date(&ctx.sql) {
        return vec![RuleHit::new(
            20,
            "Query filters rows, but the filter does not reference a date column",
            "Compare a date or timestamp column against the requested period",
        )];
    }
    Vec::new()
}

fn periodicity_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    if !mentions_periodicity(&ctx.question) {
        return Vec::new();
    }
    if !ctx.sql.contains("GROUP BY") {
        return vec![RuleHit::new(
            25,
            "Question asks for a breakdown over time, but the query has no GROUP BY",
            "GROUP BY a date expression (e.g. by day or month)",
        )];
    }
    if !references_date(&ctx.sql) {
        return vec![RuleHit::new(
            15,
            "Query groups results, but not by a date expression",
            "Group by a date or timestamp column, or a date function over one",
        )];
    }
    Vec::new()
}

/// For each schema table whose singular form appears in the question, the
/// SQL should reference that table, or at least some table whose name
/// starts with the singular form. Fires once per unmatched table; an empty
/// schema fires nothing.
fn table_relevance_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    let mut hits = Vec::new();

    for table in &ctx.schema.tables {
        let lower = table.name.to_lowercase();
        let singular = lower.trim_end_matches('s');
        if !ctx.question.contains(singular) {
            continue;
        }

        let covered = ctx.sql.contains(&table.name.to_uppercase())
            || ctx.schema.tables.iter().any(|other| {
                other.name.to_lowercase().starts_with(singular)
                    && ctx.sql.contains(&other.name.to_uppercase())
            });

        if !covered {
            hits.push(RuleHit::new(
                15,
                format!(
                    "Question mentions '{}', but the query does not reference the {} table",
                    singular, table.name
                ),
                format!("Consider querying the \"{}\" table", table.name),
            ));
        }
    }

    hits
}

fn limit_rule(ctx: &RuleContext) -> Vec<RuleHit> {
    const TRIGGERS: &[&str] = &["top ", "first ", "best "];
    if contains_any(&ctx.question, TRIGGERS) && !ctx.sql.contains("LIMIT") {
        return vec![RuleHit::new(
            10,
            "Question asks for the top results, but the query has no LIMIT",
            "Add LIMIT to cap the number of returned rows",
        )];
    }
    Vec::new()
}
