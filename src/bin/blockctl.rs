//! blockctl
//!
//! Command-line access to a blockfile database directory.

use std::collections::BTreeSet;
use std::path::PathBuf;

use blockfile::file::DEFAULT_BLOCK_SIZE;
use blockfile::{BlockId, Config, FileManager};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// blockfile CLI
#[derive(Parser, Debug)]
#[command(name = "blockctl")]
#[command(about = "Inspect and exercise a block-structured database directory")]
#[command(version)]
struct Args {
    /// Home directory holding the database directory
    #[arg(long, default_value = ".")]
    home: PathBuf,

    /// Database name
    #[arg(long, default_value = "blockfile_db")]
    db: String,

    /// Separate base directory for the log file
    #[arg(long)]
    log_base: Option<PathBuf>,

    /// Block size in bytes
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show directory layout and whether the database is new
    Info,

    /// Print the number of blocks in a file
    Size { file: String },

    /// Print one block as text (trailing zeros trimmed)
    Read { file: String, block: u64 },

    /// Append a block holding the given text
    Append { file: String, text: String },

    /// Overwrite a block with the given text
    Write {
        file: String,
        block: u64,
        text: String,
    },

    /// Delete all log files and start a new one
    RebuildLog,

    /// Append from many threads at once and check the block numbers
    Stress {
        file: String,

        #[arg(short, long, default_value = "8")]
        threads: usize,

        #[arg(short = 'n', long, default_value = "100")]
        blocks: usize,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blockfile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .home_dir(&args.home)
        .db_name(&args.db)
        .block_size(args.block_size);
    if let Some(log_base) = &args.log_base {
        builder = builder.log_base_dir(log_base);
    }

    let fm = match FileManager::open(builder.build()) {
        Ok(fm) => fm,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&fm, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = fm.close() {
        tracing::warn!("Error while closing: {}", e);
    }
}

fn run(fm: &FileManager, command: Cmd) -> blockfile::Result<()> {
    match command {
        Cmd::Info => {
            println!("blockctl v{}", blockfile::VERSION);
            println!("data dir:   {}", fm.data_dir().display());
            println!("log dir:    {}", fm.log_dir().display());
            println!("block size: {}", fm.block_size());
            println!("new:        {}", fm.is_new());
        }
        Cmd::Size { file } => {
            println!("{}", fm.size(&file)?);
        }
        Cmd::Read { file, block } => {
            let mut buf = vec![0u8; fm.block_size()];
            fm.read(&BlockId::new(file, block), &mut buf)?;
            let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            println!("{}", String::from_utf8_lossy(&buf[..end]));
        }
        Cmd::Append { file, text } => {
            let block = fm.append(&file, &block_of(fm, &text))?;
            println!("{}", block);
        }
        Cmd::Write { file, block, text } => {
            let block = BlockId::new(file, block);
            fm.write(&block, &block_of(fm, &text))?;
            println!("{}", block);
        }
        Cmd::RebuildLog => {
            fm.rebuild_log_file()?;
            println!("rebuilt {}", fm.log_dir().join(fm.log_file_name()).display());
        }
        Cmd::Stress {
            file,
            threads,
            blocks,
        } => stress(fm, &file, threads, blocks)?,
    }
    Ok(())
}

/// Text truncated or zero-padded to one block
fn block_of(fm: &FileManager, text: &str) -> Vec<u8> {
    let mut buf = vec![0u8; fm.block_size()];
    let n = text.len().min(buf.len());
    buf[..n].copy_from_slice(&text.as_bytes()[..n]);
    buf
}

fn stress(fm: &FileManager, file: &str, threads: usize, blocks: usize) -> blockfile::Result<()> {
    let start = fm.size(file)?;
    let payload = vec![0xABu8; fm.block_size()];
    let payload = payload.as_slice();

    let results = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(move |_| {
                    (0..blocks)
                        .map(|_| fm.append(file, payload).map(|b| b.number()))
                        .collect::<blockfile::Result<Vec<u64>>>()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    });

    let Ok(results) = results else {
        tracing::error!("Stress worker panicked");
        std::process::exit(1);
    };

    let mut seen = BTreeSet::new();
    for joined in results {
        let Ok(numbers) = joined else {
            tracing::error!("Stress worker panicked");
            std::process::exit(1);
        };
        seen.extend(numbers?);
    }

    let expected = (threads * blocks) as u64;
    let contiguous = seen.len() as u64 == expected
        && seen.first().map_or(true, |&f| f == start)
        && seen.last().map_or(true, |&l| l + 1 == start + expected);

    println!(
        "appended {} blocks from {} threads: {}",
        seen.len(),
        threads,
        if contiguous { "distinct and contiguous" } else { "COLLISION OR GAP" }
    );
    if !contiguous {
        std::process::exit(2);
    }
    Ok(())
}
