// Prompt building and reply classification
use crate::engine::DataView;
use crate::model::AnalysisValue;
use crate::table::loader;
use regex_lite::Regex;
use std::sync::OnceLock;

/// A plain decimal, optionally grouped in thousands with commas.
const NUMBER_PATTERN: &str = r"^-?(\d+|\d{1,3}(,\d{3})+)(\.\d+)?$";

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(NUMBER_PATTERN).ok()).as_ref()
}

pub const SYSTEM_PROMPT: &str = "You are a data analyst. Answer questions about the sales table \
you are given using only its contents. Reply with a bare number when the answer is a single \
number. Reply with a ```csv fenced block (header row first) when the answer is a table. When \
asked for a chart or plot, reply with a ```svg fenced block holding a complete SVG document.";

/// User message: table shape, schema, a preview of the rows, then the question.
pub fn build_user_prompt(view: &DataView<'_>, preview_rows: usize) -> String {
    let table = view.table;
    let schema = serde_json::to_string(&table.schema()).unwrap_or_default();
    let preview = table.head(preview_rows);
    format!(
        "The table has {} rows and {} columns.\nSchema: {}\nFirst {} rows as CSV:\n{}\nQuestion: {}",
        table.len(),
        table.columns().len(),
        schema,
        preview.len(),
        preview.to_csv_string(),
        view.query.trim()
    )
}

/// Turns the model's reply text into a result value.
pub fn classify_reply(reply: &str) -> AnalysisValue {
    let reply = reply.trim();

    if let Some(svg) = fenced_block(reply, "svg") {
        return AnalysisValue::Chart(svg.as_bytes().to_vec());
    }
    if let Some(csv) = fenced_block(reply, "csv") {
        if let Ok(table) = loader::from_reader(csv.as_bytes()) {
            return AnalysisValue::Table(table);
        }
    }
    if let Some(number) = parse_number(reply) {
        return AnalysisValue::Number(number);
    }
    AnalysisValue::Text(reply.to_string())
}

fn parse_number(text: &str) -> Option<f64> {
    if !number_pattern()?.is_match(text) {
        return None;
    }
    text.replace(',', "").parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Body of the first ```<lang> ... ``` block, if any.
fn fenced_block<'a>(text: &'a str, lang: &str) -> Option<&'a str> {
    let opener = format!("```{}", lang);
    let start = text.find(&opener)? + opener.len();
    let rest = &text[start..];
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}
