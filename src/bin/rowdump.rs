use std::{fs, path::PathBuf, sync::Arc};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;

use scuttle_rows::{
    ColumnDef, DataType, DefaultCodecRegistry, ReaderConfig, RowMetadata, RowReader, Value,
    VecSource,
};

/// Decodes the rows of a JSON result fixture and prints them.
#[derive(Parser)]
#[command(name = "rowdump", version)]
struct Cli {
    /// Fixture file: `{"columns": [..], "rows": [[..], ..]}`.
    fixture: PathBuf,

    /// Reader configuration (JSON).
    #[arg(long, env = "ROWDUMP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    columns: Vec<FixtureColumn>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct FixtureColumn {
    /// Name the source reports for the column.
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    /// Name the caller declared for the column, when it differs.
    alias: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(false)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading {}", path.display()))?;
            ReaderConfig::from_json(&text)?
        }
        None => ReaderConfig::default(),
    };

    let text = fs::read_to_string(&cli.fixture)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", cli.fixture.display()))?;
    let fixture: Fixture = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err("parsing fixture")?;

    let columns = fixture
        .columns
        .iter()
        .map(|column| -> Result<ColumnDef> {
            Ok(ColumnDef::new(&column.name, column.type_name.parse::<DataType>()?))
        })
        .collect::<Result<Vec<_>>>()?;
    let declared = fixture
        .columns
        .iter()
        .map(|column| column.alias.as_deref().unwrap_or(&column.name));

    let registry = DefaultCodecRegistry::new();
    let metadata = RowMetadata::from_columns(declared, &columns, &registry)?;
    tracing::info!(
        columns = metadata.column_count(),
        codecs = registry.len(),
        layout_check = %config.layout_check,
        "loaded fixture"
    );

    let reader = RowReader::new(Arc::new(metadata), config);
    let source_names: Vec<&str> = columns.iter().map(|column| column.name.as_str()).collect();

    let mut failed = 0usize;
    for (idx, raw) in fixture.rows.iter().enumerate() {
        let values: Vec<Value> = raw.iter().map(Value::from_json).collect();
        // rows wider than the column listing carry no labels
        let source = if values.len() == source_names.len() {
            VecSource::with_names(source_names.iter().copied(), values)?
        } else {
            VecSource::new(values)
        };

        match reader.read(&source) {
            Ok(row) => println!("{idx}: {row}"),
            Err(err) => {
                failed += 1;
                eprintln!("{idx}: {:?}", miette::Report::new(err));
            }
        }
    }

    tracing::info!(rows = reader.rows_read(), failed, "done");
    Ok(())
}
