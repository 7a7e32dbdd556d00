use std::io::Write as _;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use gridstream::{create_filter, detect, CsvImportConfig, FilterConfig, Format, ImportFactory};
use gridstream_core::types::{DumpFormat, RangeSize};
use gridstream_core::utils::constants::{DEFAULT_COL_SIZE, DEFAULT_ROW_SIZE};
use gridstream_core::Document;

#[derive(Parser)]
#[command(
    name = "gridstream",
    version,
    about = "Import a spreadsheet document and dump its content",
    long_about = "Imports a spreadsheet document (CSV and other supported formats) \
                  into the in-memory workbook model and writes its content in one of \
                  the dump formats."
)]
struct Cli {
    /// Path to the input file.
    file: PathBuf,

    /// Output directory path, or output file when --dump-check is used.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format of the output files.
    #[arg(short = 'f', long, default_value = "none")]
    output_format: OutputFormat,

    /// Dump the content in the format used for content verification in
    /// automated tests, to stdout or to the --output path.
    #[arg(long)]
    dump_check: bool,

    /// Force the input format instead of detecting it.
    #[arg(long)]
    format: Option<InputFormat>,

    /// Maximum number of rows in each sheet.
    #[arg(long)]
    row_size: Option<i32>,

    /// Number of header rows to replicate when a long CSV stream is split
    /// across multiple sheets.
    #[arg(long, default_value_t = 0)]
    row_header: usize,

    /// Generate run-time debug output.
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// CSV format.
    Csv,
    /// Flat text format.
    Flat,
    /// HTML format.
    Html,
    /// JSON format.
    Json,
    /// No output.
    None,
}

impl From<OutputFormat> for DumpFormat {
    fn from(v: OutputFormat) -> Self {
        match v {
            OutputFormat::Csv => DumpFormat::Csv,
            OutputFormat::Flat => DumpFormat::Flat,
            OutputFormat::Html => DumpFormat::Html,
            OutputFormat::Json => DumpFormat::Json,
            OutputFormat::None => DumpFormat::None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Csv,
    Ods,
    Xlsx,
    XlsXml,
    Gnumeric,
    Parquet,
}

impl From<InputFormat> for Format {
    fn from(v: InputFormat) -> Self {
        match v {
            InputFormat::Csv => Format::Csv,
            InputFormat::Ods => Format::Ods,
            InputFormat::Xlsx => Format::Xlsx,
            InputFormat::XlsXml => Format::XlsXml,
            InputFormat::Gnumeric => Format::Gnumeric,
            InputFormat::Parquet => Format::Parquet,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read(&cli.file)?;

    let format = match cli.format {
        Some(forced) => forced.into(),
        None => match detect(&content) {
            // CSV carries no magic; an undetected textual stream is
            // treated as CSV.
            Format::Unknown => Format::Csv,
            detected => detected,
        },
    };
    if cli.debug {
        eprintln!("input format: {format}");
    }

    let sheet_size = RangeSize {
        rows: cli.row_size.unwrap_or(DEFAULT_ROW_SIZE),
        columns: DEFAULT_COL_SIZE,
    };
    let mut doc = Document::new(sheet_size);

    {
        let factory = ImportFactory::new(&mut doc);
        let config = FilterConfig {
            csv: CsvImportConfig {
                header_row_size: cli.row_header,
                split_to_multiple_sheets: cli.row_size.is_some(),
            },
            debug: cli.debug,
        };
        let mut filter = create_filter(format, factory, config)?;
        if cli.debug {
            eprintln!("importing with the '{}' filter", filter.name());
        }
        filter.read_stream(&content)?;
    }

    if cli.dump_check {
        match &cli.output {
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                doc.dump_check(&mut lock)?;
                lock.flush()?;
            }
            Some(path) => {
                if path.is_dir() {
                    return Err(format!(
                        "a directory named '{}' already exists",
                        path.display()
                    )
                    .into());
                }
                let mut file = std::fs::File::create(path)?;
                doc.dump_check(&mut file)?;
            }
        }
        return Ok(());
    }

    let dump_format: DumpFormat = cli.output_format.into();
    if dump_format != DumpFormat::None {
        let outdir = cli
            .output
            .as_ref()
            .ok_or("no output directory given (use --output)")?;
        doc.dump(dump_format, outdir)?;
    }
    Ok(())
}
