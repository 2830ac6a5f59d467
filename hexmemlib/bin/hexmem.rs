use hexmemlib::{ChunkSizing, HexMemory, HexReader, HexReaderStatus, MemoryChunk};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use tracing::Level;

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!(" ----------------------------------------------");
    println!("|  Intel HEX Memory Reader  | v{version}          |");
    println!(" ----------------------------------------------");
    println!("\nUsage:");
    println!("  hexmem info <input> [options]");
    println!("  hexmem records <input> [options]");
    println!("  hexmem dump <input> [--chunk <n>] [options]");
    println!("\nOptions:");
    println!("  --max-chunks <n>   Maximum number of memory chunks (default: 10)");
    println!("  --arena-size <n>   Size of the data buffer in bytes (default: 8192)");
    println!("  --max-record <n>   Maximum data bytes per record (default: 32)");
    println!("  --exact-sizes      Do not drop the last byte of chunks closed by an address record");
    println!("  -v, --verbose      Print debug logs to stderr");
    println!("\nExamples:");
    println!("  hexmem info firmware.hex");
    println!("  hexmem records firmware.hex --max-record 255");
    println!("  hexmem dump firmware.hex --chunk 1 --exact-sizes");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    init_logging(args.iter().any(|arg| arg == "-v" || arg == "--verbose"));

    println!();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    // Dispatch and immediately handle results
    if let Err(e) = run_dispatch(command, &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_dispatch(cmd: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        "info" => {
            let path_str = args.get(2).ok_or("Missing input file path")?;
            let reader = build_reader(args)?;
            run_info(&PathBuf::from(path_str), &reader)
        }
        "records" => {
            let path_str = args.get(2).ok_or("Missing input file path")?;

            // Guard: File must exist
            let abs_path = validate_exists(path_str)?;

            let reader = build_reader(args)?;
            run_records(&abs_path, &reader)
        }
        "dump" => {
            let path_str = args.get(2).ok_or("Missing input file path")?;
            let reader = build_reader(args)?;

            let chunk = match get_flag_value(args, "--chunk") {
                Some(idx) => Some(
                    idx.parse::<usize>()
                        .map_err(|_e| format!("Invalid chunk index: {idx}"))?,
                ),
                None => None,
            };

            run_dump(&PathBuf::from(path_str), &reader, chunk)
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

fn run_info(path: &PathBuf, reader: &HexReader) -> Result<(), Box<dyn std::error::Error>> {
    let res = reader.read_hex(path);
    let status = HexReaderStatus::of(&res);

    println!("File Path:   {}", path.display());
    println!("Status:      {status:?}");

    let mem = res?;
    println!("Chunks:      {}", mem.chunk_count());
    println!("Data Size:   {} bytes", mem.total_size());
    println!();
    println!("  #  Address       Offset  Size");
    for (idx, chunk) in mem.chunks().iter().enumerate() {
        println!(
            "{idx:>3}  {}  {:>6}  {:>4}",
            format_addr(chunk.address),
            chunk.offset,
            chunk.size
        );
    }
    Ok(())
}

fn run_records(path: &PathBuf, reader: &HexReader) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;

    println!("Line\tByteCnt\tAddress\tRecType\t\tChcksm\tDatalen\tData");
    for item in reader.records(BufReader::new(file)) {
        let (line, record) = item?;
        let checksum_mark = if record.has_valid_checksum() { "" } else { "!" };
        let data = record
            .data
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "{line}\t0x{:02X}\t0x{:04X}\t{:<9}\t0x{:02X}{checksum_mark}\t{}\t{data}",
            record.byte_count,
            record.address,
            record.rtype.as_str(),
            record.checksum,
            record.data_len(),
        );
    }
    Ok(())
}

fn run_dump(
    path: &PathBuf,
    reader: &HexReader,
    chunk: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mem = reader.read_hex(path)?;

    let selected: Vec<&MemoryChunk> = match chunk {
        Some(idx) => vec![mem.chunks().get(idx).ok_or_else(|| {
            format!("Chunk #{idx} does not exist ({} chunks)", mem.chunk_count())
        })?],
        None => mem.chunks().iter().collect(),
    };

    for chunk in selected {
        dump_chunk(&mem, chunk);
    }
    Ok(())
}

fn dump_chunk(mem: &HexMemory, chunk: &MemoryChunk) {
    println!("Chunk @ {} ({} bytes)", format_addr(chunk.address), chunk.size);

    let mut address = u64::from(chunk.address);
    for row in mem.chunk_data(chunk).chunks(16) {
        let bytes = row
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = row
            .iter()
            .map(|&b| if b.is_ascii_graphic() { char::from(b) } else { '.' })
            .collect();
        println!("  {address:08X}  {bytes:<47}  |{ascii}|");
        address += 16;
    }
    println!();
}

// =============================== HELPER FUNCTIONS ===============================

fn format_addr(addr: u32) -> String {
    let s = format!("{addr:08X}");
    format!("0x{}_{}", &s[0..4], &s[4..8])
}

/// Build a reader from the limit flags present in `args`
fn build_reader(args: &[String]) -> Result<HexReader, Box<dyn std::error::Error>> {
    let mut reader = HexReader::new();

    if let Some(val) = get_flag_value(args, "--max-chunks") {
        reader.set_max_chunks(parse_usize(&val)?)?;
    }
    if let Some(val) = get_flag_value(args, "--arena-size") {
        reader.set_arena_capacity(parse_usize(&val)?)?;
    }
    if let Some(val) = get_flag_value(args, "--max-record") {
        reader.set_max_record_bytes(parse_usize(&val)?)?;
    }
    if args.iter().any(|arg| arg == "--exact-sizes") {
        reader.set_chunk_sizing(ChunkSizing::Exact);
    }

    Ok(reader)
}

/// Parse a decimal number or a hex number with 0x prefix
fn parse_usize(s: &str) -> Result<usize, String> {
    let s = s.trim();

    let res = if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex_str, 16)
    } else {
        s.parse::<usize>()
    };
    res.map_err(|_e| format!("Invalid number: {s}"))
}

/// Validate that a path exists and is a file. Returns absolute path.
fn validate_exists(path_str: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(format!("File not found: {path_str}").into());
    }
    if !path.is_file() {
        return Err(format!("Path is not a file: {path_str}").into());
    }
    // Return absolute path
    Ok(std::fs::canonicalize(path)?)
}

/// Find the value after a specific flag (e.g., "--chunk 1")
fn get_flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}
