//! Prompt templating. Pure functions of their inputs; no I/O.

use crate::db::introspect::SchemaSnapshot;

/// Renders a snapshot as one `database.table: col1, col2, ...` line per
/// table, the grounding context for SQL generation.
pub fn render_schema(snapshot: &SchemaSnapshot) -> String {
    let mut lines = Vec::new();
    for (database, tables) in snapshot {
        for (table, columns) in tables {
            lines.push(format!("{}.{}: {}", database, table, columns.join(", ")));
        }
    }
    lines.join("\n")
}

/// Builds the (system, user) message pair for SQL generation.
pub fn generation_prompt(schema_text: &str, nl_query: &str) -> (String, String) {
    let system = r#"You are an expert SQL query generator specialized in creating optimized, production-ready SQL queries.

Guidelines:
- Generate only valid, executable SQL
- Prefer JOINs over subqueries when possible
- Use appropriate aggregate functions and GROUP BY
- Include proper WHERE clause filtering
- Return only the SQL query without explanations
- End queries with a semicolon"#
        .to_string();

    let user = format!(
        r#"Database Schema:
{}

Convert this natural language request to an optimized SQL query:
{}

Return only the SQL query:"#,
        schema_text, nl_query
    );

    (system, user)
}

/// Builds the message pair asking for a plain-English explanation of a query.
pub fn explain_prompt(sql: &str) -> (String, String) {
    let system = "You are a SQL expert. Explain what SQL queries do in plain English, \
                  breaking down each part of the query."
        .to_string();

    let user = format!(
        r#"Explain this SQL query in simple terms:
{}

Break down:
- What data it retrieves
- Which tables it uses
- Any joins or conditions
- What the result will look like"#,
        sql
    );

    (system, user)
}

/// Builds the message pair asking for index suggestions given an execution plan.
pub fn index_prompt(sql: &str, execution_plan: &str) -> (String, String) {
    let system = r#"You are a database optimization expert. Analyze SQL queries and suggest appropriate indexes to improve performance.

Focus on:
- WHERE clause columns
- JOIN columns
- ORDER BY columns
- GROUP BY columns
- Foreign key relationships"#
        .to_string();

    let plan_text = if execution_plan.is_empty() {
        "No execution plan available"
    } else {
        execution_plan
    };

    let user = format!(
        r#"SQL Query:
{}

Execution Plan:
{}

Suggest specific indexes to improve this query's performance. Return only the index suggestions:"#,
        sql, plan_text
    );

    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn snapshot() -> SchemaSnapshot {
        let mut tables = BTreeMap::new();
        tables.insert(
            "users".to_string(),
            vec!["id".to_string(), "email".to_string()],
        );
        tables.insert("orders".to_string(), vec!["id".to_string()]);
        let mut snapshot = SchemaSnapshot::new();
        snapshot.insert("shop".to_string(), tables);
        snapshot
    }

    #[test]
    fn schema_renders_one_line_per_table() {
        let text = render_schema(&snapshot());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"shop.users: id, email"));
        assert!(lines.contains(&"shop.orders: id"));
    }

    #[test]
    fn empty_snapshot_renders_empty_text() {
        assert_eq!(render_schema(&SchemaSnapshot::new()), "");
    }

    #[test]
    fn generation_prompt_carries_schema_and_question() {
        let (system, user) = generation_prompt("shop.users: id, email", "count the users");
        assert!(system.contains("semicolon"));
        assert!(user.contains("shop.users: id, email"));
        assert!(user.contains("count the users"));
    }

    #[test]
    fn index_prompt_falls_back_without_plan() {
        let (_, user) = index_prompt("SELECT 1;", "");
        assert!(user.contains("No execution plan available"));
    }
}
