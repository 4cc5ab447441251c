//! Advisor prompt construction.
//!
//! The caller supplies the database context; collecting it from a live
//! connection happens elsewhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbContext {
    /// Data source name.
    pub dsn: String,
    #[serde(default)]
    pub tables: Vec<String>,
    /// Table name to columns.
    #[serde(default)]
    pub schemas: BTreeMap<String, Vec<ColumnInfo>>,
    #[serde(default)]
    pub indexes: BTreeMap<String, Vec<IndexInfo>>,
    #[serde(default)]
    pub relations: Vec<TableRelation>,
    /// Query the user wants analyzed, if any.
    #[serde(default)]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub stats: Option<DbStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRelation {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    pub table_count: usize,
    pub index_count: usize,
    #[serde(default)]
    pub estimated_size: Option<String>,
}

impl DbContext {
    pub fn from_json(json: &str) -> Result<Self, AdvisorError> {
        let context: DbContext =
            serde_json::from_str(json).map_err(|e| AdvisorError::InvalidContext(e.to_string()))?;
        if context.dsn.trim().is_empty() {
            return Err(AdvisorError::InvalidContext("dsn is empty".to_string()));
        }
        Ok(context)
    }
}

const RESPONSE_SCHEMA: &str = r#"{
  "diagnostic": {
    "current_state": "Description of the current state",
    "hypotheses": ["Hypothesis 1"],
    "preliminary_checks": ["Check 1"]
  },
  "actions_recommended": [
    {
      "action": "Action name",
      "details": "Detailed description",
      "priority": "high",
      "dependencies": ["Prerequisite"],
      "tools": ["Tool"],
      "example_query": "SELECT ..."
    }
  ],
  "risks": [
    {
      "risk": "Risk name",
      "cause": "Cause",
      "impact": "Impact",
      "mitigation": "Mitigation"
    }
  ],
  "suggested_query": [
    {
      "description": "Description",
      "query": "SELECT ..."
    }
  ],
  "confidence_level": 0.85,
  "supplementary_notes": {
    "recommended_tools": ["Tool 1"],
    "best_practices": ["Practice 1"]
  }
}"#;

/// Build the prompt asking the model for a JSON advisory about `context`.
pub fn build_advisor_prompt(context: &DbContext) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str("You are a database administration expert. ");
    prompt.push_str("Analyze the following context and give structured advice as JSON.\n\n");

    prompt.push_str("# Database\n\n");
    prompt.push_str(&format!("DSN: {}\n", context.dsn));
    prompt.push_str(&format!("Table count: {}\n", context.tables.len()));

    if context.tables.is_empty() {
        prompt.push_str("\nNo tables were detected in this database.\n");
    } else {
        prompt.push_str("\n## Tables\n");
        for table in &context.tables {
            prompt.push_str(&format!("- {}\n", table));
        }
    }

    if let Some(stats) = &context.stats {
        prompt.push_str(&format!(
            "\nStatistics: {} tables, {} indexes",
            stats.table_count, stats.index_count
        ));
        if let Some(size) = &stats.estimated_size {
            prompt.push_str(&format!(", estimated size {}", size));
        }
        prompt.push('\n');
    }

    if !context.schemas.is_empty() {
        prompt.push_str("\n## Schemas\n");
        for (table, columns) in &context.schemas {
            prompt.push_str(&format!("- Table {}: {} columns\n", table, columns.len()));
            for col in columns {
                let mut flags = Vec::new();
                if col.is_primary_key {
                    flags.push("PK");
                }
                if col.is_foreign_key {
                    flags.push("FK");
                }
                if col.nullable == Some(false) {
                    flags.push("NOT NULL");
                }
                if flags.is_empty() {
                    prompt.push_str(&format!("  * {} ({})\n", col.name, col.data_type));
                } else {
                    prompt.push_str(&format!(
                        "  * {} ({}, {})\n",
                        col.name,
                        col.data_type,
                        flags.join(", ")
                    ));
                }
            }
        }
    }

    if context.indexes.values().any(|idx| !idx.is_empty()) {
        prompt.push_str("\n## Existing indexes\n");
        for (table, indexes) in &context.indexes {
            for idx in indexes {
                prompt.push_str(&format!(
                    "- Table {}: {}index {} on {}\n",
                    table,
                    if idx.unique { "unique " } else { "" },
                    idx.name,
                    idx.columns.join(", ")
                ));
            }
        }
    }

    if !context.relations.is_empty() {
        prompt.push_str("\n## Relations\n");
        for rel in &context.relations {
            prompt.push_str(&format!(
                "- {} ({}) -> {} ({})\n",
                rel.from_table, rel.from_column, rel.to_table, rel.to_column
            ));
        }
    }

    if let Some(sql) = context.sql_query.as_deref().filter(|q| !q.trim().is_empty()) {
        prompt.push_str("\n## Query to analyze\n");
        prompt.push_str(sql.trim());
        prompt.push('\n');
    }

    prompt.push_str("\n# Output\n\n");
    prompt.push_str(
        "IMPORTANT: Respond ONLY with valid JSON, no text before or after. Required structure:\n",
    );
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push('\n');

    prompt
}
