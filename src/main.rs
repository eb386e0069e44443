use clap::{Parser, Subcommand};
use csv::ReaderBuilder;
use prettytable::{Cell, Row, Table};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use heapdb::{
    BufferPool, Catalog, DEFAULT_POOL_PAGES, DataType, HeapFile, HeapFileEncoder, PAGE_SIZE,
    StorageConfig, TransactionId, TupleSchema, Value,
};

#[derive(Parser)]
#[command(name = "heapdb", version, about = "Build and inspect heap files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a heap file from a CSV file
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Column types, e.g. int,string(16)
        #[arg(long, required = true, value_delimiter = ',', value_parser = parse_data_type)]
        types: Vec<DataType>,
        #[arg(long, default_value_t = PAGE_SIZE)]
        page_size: usize,
        /// Treat the first CSV line as data
        #[arg(long)]
        no_header: bool,
    },
    /// Print every tuple of a heap file
    Print {
        file: PathBuf,
        #[arg(long, required = true, value_delimiter = ',', value_parser = parse_data_type)]
        types: Vec<DataType>,
        #[arg(long, default_value_t = PAGE_SIZE)]
        page_size: usize,
        #[arg(long, default_value_t = DEFAULT_POOL_PAGES)]
        pool_pages: usize,
    },
}

fn parse_data_type(s: &str) -> Result<DataType, String> {
    s.parse().map_err(|e: heapdb::RecordError| e.to_string())
}

fn convert(
    input: PathBuf,
    output: PathBuf,
    types: Vec<DataType>,
    page_size: usize,
    no_header: bool,
) -> Result<(), Box<dyn Error>> {
    StorageConfig::new(page_size, DEFAULT_POOL_PAGES).validate()?;
    let schema = Arc::new(TupleSchema::from_types(&types));

    let mut reader = ReaderBuilder::new()
        .has_headers(!no_header)
        .flexible(true)
        .from_path(&input)?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != types.len() {
            return Err(format!(
                "row {}: expected {} fields, found {}",
                line + 1,
                types.len(),
                record.len()
            )
            .into());
        }
        let values = record
            .iter()
            .zip(&types)
            .map(|(field, data_type)| Value::parse(field, data_type))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("row {}: {}", line + 1, e))?;
        rows.push(values);
    }

    let row_count = rows.len();
    let pages = HeapFileEncoder::new(schema, page_size).convert(rows, &output)?;
    println!(
        "Wrote {} rows in {} pages to {}",
        row_count,
        pages,
        output.display()
    );
    Ok(())
}

fn print_file(
    path: PathBuf,
    types: Vec<DataType>,
    page_size: usize,
    pool_pages: usize,
) -> Result<(), Box<dyn Error>> {
    StorageConfig::new(page_size, pool_pages).validate()?;
    if !path.exists() {
        return Err(format!("{} does not exist", path.display()).into());
    }

    let schema = Arc::new(TupleSchema::from_types(&types));
    let heap_file = Arc::new(HeapFile::open(&path, Arc::clone(&schema), page_size)?);
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(heap_file.clone(), &path.to_string_lossy(), "");
    let pool = BufferPool::new(catalog, pool_pages);

    let mut table = Table::new();
    table.set_titles(Row::new(
        schema
            .columns()
            .iter()
            .map(|c| Cell::new(&format!("{} {}", c.name, c.data_type)))
            .collect(),
    ));

    let mut count = 0;
    for tuple in heap_file.iter(&pool, TransactionId::new()) {
        let tuple = tuple?;
        table.add_row(Row::new(
            tuple
                .values()
                .iter()
                .map(|v| Cell::new(&v.to_string()))
                .collect(),
        ));
        count += 1;
    }

    table.printstd();
    println!("{} rows", count);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Convert {
            input,
            output,
            types,
            page_size,
            no_header,
        } => convert(input, output, types, page_size, no_header),
        Command::Print {
            file,
            types,
            page_size,
            pool_pages,
        } => print_file(file, types, page_size, pool_pages),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
