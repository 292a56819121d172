//! Generic list/detail tool over one entry type
//!
//! Routing per call:
//! - `id` given: detail view of that entry
//! - `request_id` given (correlated tools only): the tool's own type within
//!   that request's batch, oldest first
//! - otherwise: newest-first listing with the tool's filters applied
//!
//! Store failures never escape: they are logged with the tool name and the
//! arguments, and come back as an error-typed content block.

use super::args::ToolArgs;
use super::catalog::{CellSource, ToolSpec};
use crate::error::ToolError;
use crate::format::{self, DetailView};
use crate::mcp::{ToolDescriptor, ToolHandler, ToolOutput};
use crate::store::{BatchCorrelation, Entry, EntryQuery, EntryStore};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub struct EntryTool {
    spec: &'static ToolSpec,
    store: Arc<dyn EntryStore>,
    batches: BatchCorrelation,
    descriptor: ToolDescriptor,
}

impl EntryTool {
    pub fn new(spec: &'static ToolSpec, store: Arc<dyn EntryStore>) -> Self {
        Self {
            spec,
            batches: BatchCorrelation::new(store.clone()),
            store,
            descriptor: ToolDescriptor {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                input_schema: input_schema(spec),
            },
        }
    }

    async fn detail(&self, id: &str, include_related: bool) -> anyhow::Result<ToolOutput> {
        let Some(entry) = self.store.find(id).await? else {
            return Ok(ToolOutput::Error(format!(
                "{} entry not found: {}",
                self.spec.label, id
            )));
        };

        if entry.entry_type != self.spec.entry_type {
            return Ok(ToolOutput::Error(format!(
                "{} entry not found: {} (entry is a {})",
                self.spec.label, id, entry.entry_type
            )));
        }

        let mut view = DetailView::new(format!("{} Details:", self.spec.label))
            .field("ID", entry.id.as_str())
            .field("Type", entry.entry_type.as_str())
            .field("Batch ID", entry.batch_id.as_deref().unwrap_or("-"))
            .field("Created At", format::format_timestamp(&entry.created_at));

        if !entry.tags.is_empty() {
            view = view.field("Tags", entry.tags.join(", "));
        }

        for field in self.spec.detail_fields {
            if let Some(value) = entry.field(field.path) {
                view = view.value(field.label, value);
            }
        }

        let mut data = serde_json::to_value(&entry)?;

        if self.spec.related_summary && include_related && entry.batch_id.is_some() {
            let related = self.batches.related_summary(&entry).await;

            view = view.section(
                "Related Entries:",
                related
                    .iter()
                    .map(|(entry_type, count)| format!("{}: {}", entry_type.plural_label(), count))
                    .collect(),
            );

            data["related"] = related
                .iter()
                .map(|(entry_type, count)| (entry_type.as_str().to_string(), json!(count)))
                .collect::<Map<String, Value>>()
                .into();
        }

        Ok(ToolOutput::Text(view.render(&data)))
    }

    async fn list(&self, query: &EntryQuery) -> anyhow::Result<ToolOutput> {
        let entries = self.store.list(query).await?;
        Ok(self.render_entries(&format!("{}:", self.spec.title), &entries))
    }

    async fn list_for_request(&self, request_id: &str, limit: usize) -> ToolOutput {
        let entries = match self.batches.batch_id_for(request_id).await {
            Some(batch_id) => {
                self.batches
                    .entries_in_batch(&batch_id, self.spec.entry_type, limit)
                    .await
            }
            None => Vec::new(),
        };

        let title = format!("{} for request {}:", self.spec.title, request_id);
        self.render_entries(&title, &entries)
    }

    fn render_entries(&self, title: &str, entries: &[Entry]) -> ToolOutput {
        if entries.is_empty() {
            return ToolOutput::Text(format::render_empty(self.spec.plural, self.spec.json_key));
        }

        let headers: Vec<&str> = self.spec.columns.iter().map(|c| c.header).collect();

        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|entry| {
                self.spec
                    .columns
                    .iter()
                    .map(|column| format::truncate(&cell_text(entry, column.source), column.width))
                    .collect()
            })
            .collect();

        let json_rows: Vec<Value> = entries
            .iter()
            .map(|entry| {
                let row: Map<String, Value> = self
                    .spec
                    .columns
                    .iter()
                    .map(|column| (column.key.to_string(), cell_json(entry, column.source)))
                    .collect();
                Value::Object(row)
            })
            .collect();

        ToolOutput::Text(format::render_list(
            title,
            &headers,
            &rows,
            self.spec.json_key,
            json_rows,
        ))
    }

    fn log_store_error(&self, arguments: &Map<String, Value>, error: &anyhow::Error) {
        let arguments = serde_json::Value::Object(arguments.clone());
        tracing::error!(
            tool = self.spec.name,
            arguments = %arguments,
            error = %error,
            "Store access failed"
        );
    }
}

#[async_trait]
impl ToolHandler for EntryTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let args = ToolArgs::new(arguments);

        if let Some(id) = args.optional_str("id")? {
            let include_related = args.optional_bool("include_related")?.unwrap_or(true);

            return Ok(match self.detail(&id, include_related).await {
                Ok(output) => output,
                Err(e) => {
                    self.log_store_error(arguments, &e);
                    ToolOutput::Error(format!(
                        "Error retrieving {} entry {}: {}",
                        self.spec.label, id, e
                    ))
                }
            });
        }

        let limit = args.limit()?;

        if self.spec.correlated {
            if let Some(request_id) = args.optional_str("request_id")? {
                return Ok(self.list_for_request(&request_id, limit).await);
            }
        }

        let mut query = EntryQuery::new(self.spec.entry_type).limit(limit);
        for filter in self.spec.filters {
            if let Some(content_filter) = args.content_filter(filter)? {
                query = query.filter(content_filter);
            }
        }
        if let Some(tag) = args.optional_str("tag")? {
            query = query.tag(tag);
        }

        Ok(match self.list(&query).await {
            Ok(output) => output,
            Err(e) => {
                self.log_store_error(arguments, &e);
                ToolOutput::Error(format!("Error listing {}: {}", self.spec.plural, e))
            }
        })
    }
}

fn cell_text(entry: &Entry, source: CellSource) -> String {
    match source {
        CellSource::Id => entry.id.clone(),
        CellSource::CreatedAt => format::format_timestamp(&entry.created_at),
        CellSource::Field(path) => entry.field(path).map(format::cell_text).unwrap_or_default(),
        CellSource::Millis(path) => entry
            .field(path)
            .map(|v| format!("{}ms", format::cell_text(v)))
            .unwrap_or_default(),
        CellSource::Count(path) => entry
            .field(path)
            .and_then(Value::as_array)
            .map(|items| items.len().to_string())
            .unwrap_or_else(|| "0".to_string()),
        CellSource::Location(file, line) => location(entry, file, line).unwrap_or_default(),
    }
}

fn cell_json(entry: &Entry, source: CellSource) -> Value {
    match source {
        CellSource::Id => json!(entry.id),
        CellSource::CreatedAt => json!(format::format_timestamp(&entry.created_at)),
        CellSource::Field(path) | CellSource::Millis(path) => {
            entry.field(path).cloned().unwrap_or(Value::Null)
        }
        CellSource::Count(path) => json!(entry
            .field(path)
            .and_then(Value::as_array)
            .map_or(0, |items| items.len())),
        CellSource::Location(file, line) => location(entry, file, line).map_or(Value::Null, Value::String),
    }
}

fn location(entry: &Entry, file: &str, line: &str) -> Option<String> {
    let file = entry.field(file).map(format::cell_text)?;
    Some(match entry.field(line) {
        Some(line) => format!("{}:{}", file, format::cell_text(line)),
        None => file,
    })
}

fn input_schema(spec: &ToolSpec) -> Value {
    let mut properties = Map::new();

    properties.insert(
        "id".to_string(),
        json!({
            "type": "string",
            "description": format!("Show details of a single {} entry by ID", spec.label.to_lowercase()),
        }),
    );
    properties.insert(
        "limit".to_string(),
        json!({
            "type": "integer",
            "description": "Maximum number of entries to return (values above 100 are capped)",
            "default": 50,
            "minimum": 1,
            "maximum": 100,
        }),
    );
    properties.insert(
        "tag".to_string(),
        json!({
            "type": "string",
            "description": "Only entries carrying this tag",
        }),
    );

    for filter in spec.filters {
        properties.insert(
            filter.param.to_string(),
            json!({
                "type": filter.json_type(),
                "description": filter.description,
            }),
        );
    }

    if spec.correlated {
        properties.insert(
            "request_id".to_string(),
            json!({
                "type": "string",
                "description": format!("List {} recorded while handling this request", spec.plural),
            }),
        );
    }

    if spec.related_summary {
        properties.insert(
            "include_related".to_string(),
            json!({
                "type": "boolean",
                "description": "With id: append counts of entries recorded in the same batch",
                "default": true,
            }),
        );
    }

    json!({
        "type": "object",
        "properties": properties,
    })
}
