use regex::Regex;

/// Normalizes raw completion output into a candidate SQL statement.
///
/// Strips markdown code fences, then takes the first `SELECT ... ;`
/// statement (case-insensitive, spanning newlines). If no such statement is
/// found the whole remaining text is returned trimmed, so callers always
/// have something to show the user. Best-effort only: the model is assumed
/// to emit at most one actionable statement.
pub fn extract_sql(raw: &str) -> String {
    let fenced_sql = Regex::new(r"(?s)```sql\n(.*?)\n```").unwrap();
    let fenced = Regex::new(r"(?s)```\n(.*?)\n```").unwrap();

    let cleaned = fenced_sql.replace_all(raw, "$1");
    let cleaned = fenced.replace_all(&cleaned, "$1");

    let select = Regex::new(r"(?is)SELECT .*?;").unwrap();
    match select.find(&cleaned) {
        Some(m) => m.as_str().to_string(),
        None => cleaned.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sql_code_fence() {
        let raw = "```sql\nSELECT * FROM users;\n```";
        assert_eq!(extract_sql(raw), "SELECT * FROM users;");
    }

    #[test]
    fn strips_untagged_code_fence() {
        let raw = "```\nSELECT id FROM orders;\n```";
        assert_eq!(extract_sql(raw), "SELECT id FROM orders;");
    }

    #[test]
    fn picks_first_select_out_of_prose() {
        let raw = "Here is your query:\nSELECT name FROM users WHERE age > 18;\nLet me know if you need anything else.";
        assert_eq!(extract_sql(raw), "SELECT name FROM users WHERE age > 18;");
    }

    #[test]
    fn select_spanning_newlines() {
        let raw = "SELECT u.name, COUNT(o.id)\nFROM users u\nJOIN orders o ON o.user_id = u.id\nGROUP BY u.name;";
        assert_eq!(extract_sql(raw), raw);
    }

    #[test]
    fn no_select_returns_trimmed_input() {
        let raw = "  I cannot help with that.  ";
        assert_eq!(extract_sql(raw), "I cannot help with that.");
    }

    #[test]
    fn extraction_is_idempotent_on_bare_statements() {
        let bare = "SELECT * FROM users;";
        assert_eq!(extract_sql(&extract_sql(bare)), extract_sql(bare));

        let fenced = "```sql\nSELECT a, b FROM t WHERE a < 3;\n```";
        let once = extract_sql(fenced);
        assert_eq!(extract_sql(&once), once);
    }

    #[test]
    fn lowercase_select_is_matched() {
        let raw = "select 1;";
        assert_eq!(extract_sql(raw), "select 1;");
    }
}
