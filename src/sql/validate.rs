use serde::Serialize;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Syntax-only verdict on a candidate statement. Statement type, table and
/// column existence are left to the database engine.
#[derive(Debug, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn validate_sql(sql: &str) -> ValidationOutcome {
    let dialect = GenericDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(statements) if statements.is_empty() => ValidationOutcome {
            valid: false,
            error: Some("Empty SQL statement".to_string()),
        },
        Ok(_) => ValidationOutcome {
            valid: true,
            error: None,
        },
        Err(e) => ValidationOutcome {
            valid: false,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_select() {
        let outcome = validate_sql("SELECT id, name FROM users WHERE age > 18;");
        assert!(outcome.valid);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn accepts_joins_and_aggregates() {
        let outcome = validate_sql(
            "SELECT u.name, COUNT(o.id) FROM users u \
             JOIN orders o ON o.user_id = u.id GROUP BY u.name;",
        );
        assert!(outcome.valid);
    }

    #[test]
    fn rejects_misspelled_keywords() {
        let outcome = validate_sql("SELEKT * FORM x");
        assert!(!outcome.valid);
        assert!(!outcome.error.unwrap().is_empty());
    }

    #[test]
    fn rejects_empty_input() {
        let outcome = validate_sql("");
        assert!(!outcome.valid);
    }

    #[test]
    fn rejects_dangling_clause() {
        let outcome = validate_sql("SELECT * FROM");
        assert!(!outcome.valid);
    }

    #[test]
    fn syntax_only_no_semantic_checks() {
        // Unknown tables parse fine; existence is the engine's concern
        let outcome = validate_sql("SELECT whatever FROM table_that_does_not_exist;");
        assert!(outcome.valid);
    }
}
