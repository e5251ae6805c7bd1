use std::sync::Arc;

use pagegrid_source::{
    ColumnMeta, ColumnType, DistinctValuesResolver, GridSource, GridView, HttpTransport,
    LoadOutcome, SourceConfig, ViewChange, static_values,
};
use serde_json::{Value, json};

const USAGE: &str = "usage:
  pagegrid query <view.json>
  pagegrid fetch [view.json]
  pagegrid distinct <column> [--bool] [--nullable] [view.json]";

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn load_view(path: &str) -> GridView {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("failed to read view from {path}: {e}")));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| fail(format!("failed to parse view from {path}: {e}")))
}

fn load_config() -> SourceConfig {
    SourceConfig::from_env().unwrap_or_else(|e| fail(e))
}

fn print_json(value: &Value) {
    let out = serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(e));
    println!("{out}");
}

fn query(args: &[String]) {
    let [path] = args else { fail(USAGE) };
    let view = load_view(path);
    let query = view.snapshot().to_query_string().unwrap_or_else(|e| fail(e));
    println!("{query}");
}

async fn fetch(args: &[String]) {
    let config = load_config();
    let view = match args {
        [] => GridView::new(config.page_size),
        [path] => load_view(path),
        _ => fail(USAGE),
    };

    let transport = Arc::new(HttpTransport::new(config.transport_config()));
    let source: GridSource<Value, _> = GridSource::from_config(transport, &config);
    tracing::info!(base_url = %config.base_url, strategy = ?config.strategy, "fetching");

    let mut outcome = source
        .update_view(move |v| {
            *v = view;
            ViewChange::Filter
        })
        .await
        .unwrap_or_else(|e| fail(e));
    if outcome == LoadOutcome::Deferred {
        outcome = source.refresh().await.unwrap_or_else(|e| fail(e));
    }
    if let LoadOutcome::Applied { short_page: true, .. } = outcome {
        eprintln!("warning: server returned a short page");
    }

    let items: Vec<Value> = source
        .page_items()
        .into_iter()
        .filter_map(|slot| slot.as_loaded().cloned())
        .collect();
    print_json(&json!({ "total": source.item_count(), "items": items }));
}

async fn distinct(args: &[String]) {
    let Some((name, rest)) = args.split_first() else {
        fail(USAGE)
    };

    let mut value_type = ColumnType::Other;
    let mut nullable = false;
    let mut view_path = None;
    for arg in rest {
        match arg.as_str() {
            "--bool" => value_type = ColumnType::Boolean,
            "--nullable" => nullable = true,
            flag if flag.starts_with("--") => fail(format!("unknown flag: {flag}\n{USAGE}")),
            path => view_path = Some(path),
        }
    }
    let mut column = ColumnMeta::new(name.as_str(), value_type);
    column.nullable = nullable;

    // Enum and boolean columns need no server.
    if let Some(values) = static_values(&column) {
        print_json(&Value::Array(values));
        return;
    }

    let config = load_config();
    let filters = view_path
        .map(|path| load_view(path).filters().to_vec())
        .unwrap_or_default();
    let transport = Arc::new(HttpTransport::new(config.transport_config()));
    let values = DistinctValuesResolver::new(transport)
        .resolve(&column, &filters)
        .await
        .unwrap_or_else(|e| fail(e));
    print_json(&Value::Array(values));
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        fail(USAGE)
    };

    match command.as_str() {
        "query" => query(rest),
        "fetch" => fetch(rest).await,
        "distinct" => distinct(rest).await,
        other => fail(format!("unknown command: {other}\n{USAGE}")),
    }
}
