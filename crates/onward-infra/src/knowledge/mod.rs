//! Knowledge-base file loading.

use std::collections::HashMap;
use std::path::Path;

use onward_types::error::RepositoryError;
use onward_types::knowledge::KnowledgeRecord;

/// Load service records from a `.csv` table or a JSON array file.
///
/// The format follows the file extension; anything other than `.csv` is
/// read as JSON. Unlike the memory stores, a missing or malformed knowledge
/// file is an error: the operator asked for retrieval and should hear that
/// it is off.
pub async fn load_knowledge_records(path: &Path) -> Result<Vec<KnowledgeRecord>, RepositoryError> {
    let content = tokio::fs::read(path).await.map_err(|e| {
        RepositoryError::Storage(format!("failed to read {}: {e}", path.display()))
    })?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let parsed = if is_csv {
        parse_csv(&content)
    } else {
        serde_json::from_slice::<Vec<KnowledgeRecord>>(&content).map_err(|e| e.to_string())
    };
    let records = parsed.map_err(|e| {
        RepositoryError::Query(format!("invalid knowledge file {}: {e}", path.display()))
    })?;

    let skipped = records.iter().filter(|r| r.uid.trim().is_empty()).count();
    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "Knowledge records without uid skipped");
    }
    let records: Vec<KnowledgeRecord> = records
        .into_iter()
        .filter(|r| !r.uid.trim().is_empty())
        .collect();

    tracing::info!(
        path = %path.display(),
        format = if is_csv { "csv" } else { "json" },
        records = records.len(),
        "Loaded knowledge records"
    );
    Ok(records)
}

/// Rows keyed by header. Cells stay verbatim text so ids and phone numbers
/// keep their leading zeros; unknown columns are ignored.
fn parse_csv(content: &[u8]) -> Result<Vec<KnowledgeRecord>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        let mut row = row.map_err(|e| format!("row {}: {e}", line + 1))?;
        let mut cell = |name: &str| row.remove(name).unwrap_or_default();
        records.push(KnowledgeRecord {
            uid: cell("uid"),
            service_name: cell("service_name"),
            department: cell("department"),
            phone_number: cell("phone_number"),
            topic: cell("topic"),
            user_type: cell("user_type"),
            tags: cell("tags"),
            url: cell("url"),
            last_update: cell("last_update"),
            description: cell("description"),
        });
    }
    Ok(records)
}
