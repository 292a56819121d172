//! Static description of every entry tool
//!
//! Each tool is one [`ToolSpec`]: the entry type it reads, the columns of its
//! list table, the labelled fields of its detail view and the filters it
//! accepts. [`super::EntryTool`] interprets these tables; there is no
//! per-type code.

use crate::store::{EntryType, Matcher};

/// Where a table cell takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSource {
    Id,
    CreatedAt,
    /// Content field by dotted path
    Field(&'static str),
    /// Millisecond duration field, rendered with an `ms` suffix
    Millis(&'static str),
    /// Length of an array field
    Count(&'static str),
    /// `file:line` from two content fields
    Location(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub header: &'static str,
    /// Key of this column in the JSON rows
    pub key: &'static str,
    pub source: CellSource,
    /// Cells longer than this are truncated
    pub width: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    /// Argument name
    pub param: &'static str,
    /// Content path the argument is matched against
    pub path: &'static str,
    pub matcher: Matcher,
    pub description: &'static str,
}

impl FilterSpec {
    /// JSON Schema type of the argument
    pub fn json_type(&self) -> &'static str {
        match self.matcher {
            Matcher::NumberEq => "integer",
            Matcher::Bool => "boolean",
            Matcher::Exact | Matcher::ExactIgnoreCase | Matcher::Contains => "string",
        }
    }
}

#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub entry_type: EntryType,
    /// Singular label (`Request Details:`, `Request entry not found`)
    pub label: &'static str,
    /// Lower-case plural (`No requests found.`)
    pub plural: &'static str,
    /// Key of the row array in the JSON payload
    pub json_key: &'static str,
    /// Heading of list output
    pub title: &'static str,
    pub description: &'static str,
    pub columns: &'static [ColumnSpec],
    pub detail_fields: &'static [FieldSpec],
    pub filters: &'static [FilterSpec],
    /// Accepts `request_id` to list entries recorded inside one request
    pub correlated: bool,
    /// Detail view appends a related-entries summary
    pub related_summary: bool,
}

const fn col(header: &'static str, key: &'static str, source: CellSource, width: usize) -> ColumnSpec {
    assert!(width >= 3, "column width must leave room for the ... marker");
    ColumnSpec {
        header,
        key,
        source,
        width,
    }
}

const fn field(label: &'static str, path: &'static str) -> FieldSpec {
    FieldSpec { label, path }
}

const fn filter(
    param: &'static str,
    path: &'static str,
    matcher: Matcher,
    description: &'static str,
) -> FilterSpec {
    FilterSpec {
        param,
        path,
        matcher,
        description,
    }
}

const ID: ColumnSpec = col("ID", "id", CellSource::Id, 36);
const CREATED_AT: ColumnSpec = col("Created At", "created_at", CellSource::CreatedAt, 19);

pub static TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: "requests",
        entry_type: EntryType::Request,
        label: "Request",
        plural: "requests",
        json_key: "requests",
        title: "HTTP Requests",
        description: "List recorded HTTP requests, or show one request with its related entries",
        columns: &[
            ID,
            col("Method", "method", CellSource::Field("method"), 7),
            col("URI", "uri", CellSource::Field("uri"), 50),
            col("Status", "status", CellSource::Field("response_status"), 6),
            col("Duration", "duration", CellSource::Millis("duration"), 10),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Method", "method"),
            field("URI", "uri"),
            field("Status", "response_status"),
            field("Duration (ms)", "duration"),
            field("IP Address", "ip_address"),
            field("Controller Action", "controller_action"),
            field("Memory (MB)", "memory"),
            field("Middleware", "middleware"),
            field("Headers", "headers"),
            field("Payload", "payload"),
            field("Response", "response"),
        ],
        filters: &[
            filter("method", "method", Matcher::ExactIgnoreCase, "Filter by HTTP method (GET, POST, ...)"),
            filter("status", "response_status", Matcher::NumberEq, "Filter by response status code"),
            filter("path", "uri", Matcher::Contains, "Filter by URI substring (case-insensitive)"),
        ],
        correlated: false,
        related_summary: true,
    },
    ToolSpec {
        name: "queries",
        entry_type: EntryType::Query,
        label: "Query",
        plural: "queries",
        json_key: "queries",
        title: "Database Queries",
        description: "List recorded database queries, or show one query by ID",
        columns: &[
            ID,
            col("Connection", "connection", CellSource::Field("connection"), 12),
            col("SQL", "sql", CellSource::Field("sql"), 50),
            col("Time", "time", CellSource::Millis("time"), 10),
            col("Slow", "slow", CellSource::Field("slow"), 5),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Connection", "connection"),
            field("SQL", "sql"),
            field("Time (ms)", "time"),
            field("Slow", "slow"),
            field("File", "file"),
            field("Line", "line"),
            field("Bindings", "bindings"),
        ],
        filters: &[
            filter("connection", "connection", Matcher::Exact, "Filter by connection name"),
            filter("sql", "sql", Matcher::Contains, "Filter by SQL substring (case-insensitive)"),
            filter("slow", "slow", Matcher::Bool, "Only slow (true) or fast (false) queries"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "logs",
        entry_type: EntryType::Log,
        label: "Log",
        plural: "logs",
        json_key: "logs",
        title: "Log Entries",
        description: "List recorded log messages, or show one log entry by ID",
        columns: &[
            ID,
            col("Level", "level", CellSource::Field("level"), 9),
            col("Message", "message", CellSource::Field("message"), 60),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Level", "level"),
            field("Message", "message"),
            field("Context", "context"),
        ],
        filters: &[
            filter("level", "level", Matcher::ExactIgnoreCase, "Filter by level (debug, info, warning, error, ...)"),
            filter("message", "message", Matcher::Contains, "Filter by message substring (case-insensitive)"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "exceptions",
        entry_type: EntryType::Exception,
        label: "Exception",
        plural: "exceptions",
        json_key: "exceptions",
        title: "Exceptions",
        description: "List recorded exceptions, or show one exception with its trace",
        columns: &[
            ID,
            col("Class", "class", CellSource::Field("class"), 40),
            col("Message", "message", CellSource::Field("message"), 50),
            col("Location", "location", CellSource::Location("file", "line"), 40),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Class", "class"),
            field("Message", "message"),
            field("File", "file"),
            field("Line", "line"),
            field("Occurrences", "occurrences"),
            field("Context", "context"),
            field("Trace", "trace"),
        ],
        filters: &[
            filter("class", "class", Matcher::Contains, "Filter by exception class substring"),
            filter("message", "message", Matcher::Contains, "Filter by message substring (case-insensitive)"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "jobs",
        entry_type: EntryType::Job,
        label: "Job",
        plural: "jobs",
        json_key: "jobs",
        title: "Queued Jobs",
        description: "List recorded queued jobs, or show one job by ID",
        columns: &[
            ID,
            col("Name", "name", CellSource::Field("name"), 40),
            col("Queue", "queue", CellSource::Field("queue"), 15),
            col("Status", "status", CellSource::Field("status"), 10),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Name", "name"),
            field("Connection", "connection"),
            field("Queue", "queue"),
            field("Status", "status"),
            field("Tries", "tries"),
            field("Timeout", "timeout"),
            field("Data", "data"),
            field("Exception", "exception"),
        ],
        filters: &[
            filter("status", "status", Matcher::ExactIgnoreCase, "Filter by status (pending, processed, failed)"),
            filter("queue", "queue", Matcher::Exact, "Filter by queue name"),
            filter("name", "name", Matcher::Contains, "Filter by job class substring"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "cache",
        entry_type: EntryType::Cache,
        label: "Cache",
        plural: "cache operations",
        json_key: "cache_operations",
        title: "Cache Operations",
        description: "List recorded cache operations (hit, missed, set, forget), or show one by ID",
        columns: &[
            ID,
            col("Operation", "operation", CellSource::Field("type"), 9),
            col("Key", "key", CellSource::Field("key"), 50),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Operation", "type"),
            field("Key", "key"),
            field("Expiration", "expiration"),
            field("Value", "value"),
        ],
        filters: &[
            filter("operation", "type", Matcher::ExactIgnoreCase, "Filter by operation (hit, missed, set, forget)"),
            filter("key", "key", Matcher::Contains, "Filter by key substring (case-insensitive)"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "models",
        entry_type: EntryType::Model,
        label: "Model",
        plural: "model events",
        json_key: "models",
        title: "Model Events",
        description: "List recorded model events, or show one model event with its related entries",
        columns: &[
            ID,
            col("Model", "model", CellSource::Field("model"), 50),
            col("Action", "action", CellSource::Field("action"), 10),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Model", "model"),
            field("Action", "action"),
            field("Count", "count"),
            field("Changes", "changes"),
        ],
        filters: &[
            filter("action", "action", Matcher::ExactIgnoreCase, "Filter by action (created, updated, deleted, retrieved)"),
            filter("model", "model", Matcher::Contains, "Filter by model class substring"),
        ],
        correlated: true,
        related_summary: true,
    },
    ToolSpec {
        name: "mail",
        entry_type: EntryType::Mail,
        label: "Mail",
        plural: "mail",
        json_key: "mail",
        title: "Mail",
        description: "List recorded outgoing mail, or show one message with its related entries",
        columns: &[
            ID,
            col("Mailable", "mailable", CellSource::Field("mailable"), 40),
            col("Subject", "subject", CellSource::Field("subject"), 50),
            col("Queued", "queued", CellSource::Field("queued"), 6),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Mailable", "mailable"),
            field("Subject", "subject"),
            field("Queued", "queued"),
            field("From", "from"),
            field("To", "to"),
            field("Cc", "cc"),
            field("Bcc", "bcc"),
        ],
        filters: &[
            filter("mailable", "mailable", Matcher::Contains, "Filter by mailable class substring"),
            filter("subject", "subject", Matcher::Contains, "Filter by subject substring (case-insensitive)"),
        ],
        correlated: true,
        related_summary: true,
    },
    ToolSpec {
        name: "notifications",
        entry_type: EntryType::Notification,
        label: "Notification",
        plural: "notifications",
        json_key: "notifications",
        title: "Notifications",
        description: "List recorded notifications, or show one notification with its related entries",
        columns: &[
            ID,
            col("Notification", "notification", CellSource::Field("notification"), 40),
            col("Channel", "channel", CellSource::Field("channel"), 15),
            col("Queued", "queued", CellSource::Field("queued"), 6),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Notification", "notification"),
            field("Channel", "channel"),
            field("Notifiable", "notifiable"),
            field("Queued", "queued"),
            field("Response", "response"),
        ],
        filters: &[
            filter("channel", "channel", Matcher::ExactIgnoreCase, "Filter by channel (mail, database, slack, ...)"),
            filter("notification", "notification", Matcher::Contains, "Filter by notification class substring"),
        ],
        correlated: true,
        related_summary: true,
    },
    ToolSpec {
        name: "events",
        entry_type: EntryType::Event,
        label: "Event",
        plural: "events",
        json_key: "events",
        title: "Events",
        description: "List recorded dispatched events, or show one event by ID",
        columns: &[
            ID,
            col("Name", "name", CellSource::Field("name"), 50),
            col("Listeners", "listeners", CellSource::Count("listeners"), 9),
            col("Broadcast", "broadcast", CellSource::Field("broadcast"), 9),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Name", "name"),
            field("Broadcast", "broadcast"),
            field("Listeners", "listeners"),
            field("Payload", "payload"),
        ],
        filters: &[filter("name", "name", Matcher::Contains, "Filter by event name substring")],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "gates",
        entry_type: EntryType::Gate,
        label: "Gate",
        plural: "gate checks",
        json_key: "gates",
        title: "Gate Checks",
        description: "List recorded authorization gate checks, or show one by ID",
        columns: &[
            ID,
            col("Ability", "ability", CellSource::Field("ability"), 30),
            col("Result", "result", CellSource::Field("result"), 8),
            col("Location", "location", CellSource::Location("file", "line"), 40),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Ability", "ability"),
            field("Result", "result"),
            field("File", "file"),
            field("Line", "line"),
            field("Arguments", "arguments"),
        ],
        filters: &[
            filter("ability", "ability", Matcher::Contains, "Filter by ability substring"),
            filter("result", "result", Matcher::ExactIgnoreCase, "Filter by result (allowed, denied)"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "views",
        entry_type: EntryType::View,
        label: "View",
        plural: "views",
        json_key: "views",
        title: "Rendered Views",
        description: "List recorded view renders, or show one view by ID",
        columns: &[
            ID,
            col("Name", "name", CellSource::Field("name"), 40),
            col("Path", "path", CellSource::Field("path"), 50),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Name", "name"),
            field("Path", "path"),
            field("Composers", "composers"),
            field("Data", "data"),
        ],
        filters: &[filter("name", "name", Matcher::Contains, "Filter by view name substring")],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "dumps",
        entry_type: EntryType::Dump,
        label: "Dump",
        plural: "dumps",
        json_key: "dumps",
        title: "Dumps",
        description: "List recorded variable dumps, or show one dump by ID",
        columns: &[
            ID,
            col("Dump", "dump", CellSource::Field("dump"), 60),
            CREATED_AT,
        ],
        detail_fields: &[field("Dump", "dump")],
        filters: &[],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "commands",
        entry_type: EntryType::Command,
        label: "Command",
        plural: "commands",
        json_key: "commands",
        title: "Console Commands",
        description: "List recorded console command runs, or show one by ID",
        columns: &[
            ID,
            col("Command", "command", CellSource::Field("command"), 40),
            col("Exit Code", "exit_code", CellSource::Field("exit_code"), 9),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Command", "command"),
            field("Exit Code", "exit_code"),
            field("Arguments", "arguments"),
            field("Options", "options"),
        ],
        filters: &[
            filter("command", "command", Matcher::Contains, "Filter by command name substring"),
            filter("exit_code", "exit_code", Matcher::NumberEq, "Filter by exit code"),
        ],
        correlated: false,
        related_summary: false,
    },
    ToolSpec {
        name: "schedule",
        entry_type: EntryType::Schedule,
        label: "Scheduled Task",
        plural: "scheduled tasks",
        json_key: "scheduled_tasks",
        title: "Scheduled Tasks",
        description: "List recorded scheduled task runs, or show one by ID",
        columns: &[
            ID,
            col("Command", "command", CellSource::Field("command"), 40),
            col("Expression", "expression", CellSource::Field("expression"), 15),
            col("Description", "description", CellSource::Field("description"), 40),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Command", "command"),
            field("Description", "description"),
            field("Expression", "expression"),
            field("Timezone", "timezone"),
            field("User", "user"),
            field("Output", "output"),
        ],
        filters: &[filter("command", "command", Matcher::Contains, "Filter by command substring")],
        correlated: false,
        related_summary: false,
    },
    ToolSpec {
        name: "batches",
        entry_type: EntryType::Batch,
        label: "Batch",
        plural: "batches",
        json_key: "batches",
        title: "Job Batches",
        description: "List recorded job batches, or show one batch by ID",
        columns: &[
            ID,
            col("Name", "name", CellSource::Field("name"), 30),
            col("Total", "total_jobs", CellSource::Field("totalJobs"), 6),
            col("Pending", "pending_jobs", CellSource::Field("pendingJobs"), 7),
            col("Failed", "failed_jobs", CellSource::Field("failedJobs"), 6),
            col("Progress", "progress", CellSource::Field("progress"), 8),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Name", "name"),
            field("Connection", "connection"),
            field("Queue", "queue"),
            field("Total Jobs", "totalJobs"),
            field("Pending Jobs", "pendingJobs"),
            field("Processed Jobs", "processedJobs"),
            field("Failed Jobs", "failedJobs"),
            field("Progress", "progress"),
            field("Cancelled At", "cancelledAt"),
            field("Finished At", "finishedAt"),
        ],
        filters: &[filter("name", "name", Matcher::Contains, "Filter by batch name substring")],
        correlated: false,
        related_summary: false,
    },
    ToolSpec {
        name: "redis",
        entry_type: EntryType::Redis,
        label: "Redis",
        plural: "redis commands",
        json_key: "redis_commands",
        title: "Redis Commands",
        description: "List recorded Redis commands, or show one by ID",
        columns: &[
            ID,
            col("Connection", "connection", CellSource::Field("connection"), 12),
            col("Command", "command", CellSource::Field("command"), 50),
            col("Time", "time", CellSource::Millis("time"), 10),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Connection", "connection"),
            field("Command", "command"),
            field("Time (ms)", "time"),
        ],
        filters: &[
            filter("command", "command", Matcher::Contains, "Filter by command substring (case-insensitive)"),
            filter("connection", "connection", Matcher::Exact, "Filter by connection name"),
        ],
        correlated: true,
        related_summary: false,
    },
    ToolSpec {
        name: "http_client",
        entry_type: EntryType::ClientRequest,
        label: "HTTP Client Request",
        plural: "HTTP client requests",
        json_key: "http_client_requests",
        title: "Outgoing HTTP Client Requests",
        description: "List recorded outgoing HTTP client requests, or show one by ID",
        columns: &[
            ID,
            col("Method", "method", CellSource::Field("method"), 7),
            col("URI", "uri", CellSource::Field("uri"), 50),
            col("Status", "status", CellSource::Field("response_status"), 6),
            col("Duration", "duration", CellSource::Millis("duration"), 10),
            CREATED_AT,
        ],
        detail_fields: &[
            field("Method", "method"),
            field("URI", "uri"),
            field("Status", "response_status"),
            field("Duration (ms)", "duration"),
            field("Headers", "headers"),
            field("Payload", "payload"),
            field("Response Headers", "response_headers"),
            field("Response", "response"),
        ],
        filters: &[
            filter("method", "method", Matcher::ExactIgnoreCase, "Filter by HTTP method"),
            filter("status", "response_status", Matcher::NumberEq, "Filter by response status code"),
            filter("uri", "uri", Matcher::Contains, "Filter by URI substring (case-insensitive)"),
        ],
        correlated: true,
        related_summary: false,
    },
];

/// Look up a tool spec by tool name
pub fn spec_for(name: &str) -> Option<&'static ToolSpec> {
    TOOL_SPECS.iter().find(|spec| spec.name == name)
}
