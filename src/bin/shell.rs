//! Membank interactive shell
//!
//! Command-line demonstration harness over a single shared memory region.
//! Consumes the public `MemoryManager` interface only.

use anyhow::{bail, Context};
use clap::Parser;
use membank_rs::{BlockHandle, MemoryManager, VERSION};
use std::io::{self, BufRead, Write};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "membank-shell")]
#[command(about = "Interactive shell for the membank memory region simulator")]
struct Args {
    /// Number of cells in the managed region
    #[arg(short = 'c', long, default_value_t = 64)]
    cells: usize,
}

enum Outcome {
    Continue,
    Quit,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting membank shell v{}", VERSION);

    let manager = MemoryManager::new(args.cells)
        .with_context(|| format!("cannot create a region of {} cells", args.cells))?;

    println!(
        "membank {} — region of {} cells, type 'help' for commands",
        VERSION, args.cells
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("membank> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        match run_command(&manager, line.trim()) {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Quit) => break,
            Err(err) => eprintln!("error: {err}"),
        }
    }

    Ok(())
}

fn run_command(manager: &MemoryManager, line: &str) -> anyhow::Result<Outcome> {
    let mut parts = line.split_whitespace();
    let command = match parts.next() {
        Some(word) => word,
        None => return Ok(Outcome::Continue),
    };

    match command {
        "help" => print_help(),
        "quit" | "exit" => return Ok(Outcome::Quit),

        "show" => println!("{manager}"),

        "alloc" => {
            let size = parse_number(parts.next(), "size")?;
            let handle = manager.alloc(size)?;
            println!("allocated block {handle}");
            println!("{manager}");
        }

        "free" => {
            let handle = parse_handle(parts.next())?;
            manager.free(handle)?;
            println!("freed block {handle}");
            println!("{manager}");
        }

        "write" => {
            let handle = parse_handle(parts.next())?;
            let offset = parse_number(parts.next(), "offset")?;
            // Everything after the offset token, verbatim
            let data = parts.collect::<Vec<_>>().join(" ");
            manager.write(handle, offset, data.as_bytes())?;
            println!("{manager}");
        }

        "read" => {
            let handle = parse_handle(parts.next())?;
            let offset = parse_number(parts.next(), "offset")?;
            let length = parse_number(parts.next(), "length")?;
            let data = manager.read(handle, offset, length)?;
            println!("{:?}", String::from_utf8_lossy(&data));
        }

        "defrag" => {
            manager.defragment();
            println!("{manager}");
        }

        "blocks" => {
            let blocks = manager.blocks();
            if parts.next() == Some("json") {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else if blocks.is_empty() {
                println!("no live blocks");
            } else {
                for info in blocks {
                    println!(
                        "block {:>4}  start {:>4}  size {:>4}",
                        info.handle, info.start, info.size
                    );
                }
            }
        }

        "stats" => {
            let stats = manager.stats();
            if parts.next() == Some("json") {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "{} cells, {} live blocks, {} used, {} free in {} runs (largest {}), fragmentation {:.2}",
                    stats.capacity,
                    stats.live_blocks,
                    stats.used_cells,
                    stats.free_cells,
                    stats.free_runs,
                    stats.largest_free_run,
                    stats.fragmentation
                );
            }
        }

        other => bail!("unknown command '{other}', type 'help' for commands"),
    }

    Ok(Outcome::Continue)
}

fn parse_handle(token: Option<&str>) -> anyhow::Result<BlockHandle> {
    let raw: u64 = token
        .context("missing block handle")?
        .parse()
        .context("block handle must be a number")?;
    Ok(BlockHandle::from(raw))
}

fn parse_number(token: Option<&str>, what: &str) -> anyhow::Result<usize> {
    token
        .with_context(|| format!("missing {what}"))?
        .parse()
        .with_context(|| format!("{what} must be a number"))
}

fn print_help() {
    println!("commands:");
    println!("  alloc <size>                 allocate a block of <size> cells");
    println!("  free <handle>                free an allocated block");
    println!("  write <handle> <off> <text>  write text into a block");
    println!("  read <handle> <off> <len>    read bytes out of a block");
    println!("  defrag                       pack live blocks to the front");
    println!("  show                         render the region");
    println!("  blocks [json]                list live blocks");
    println!("  stats [json]                 region statistics");
    println!("  quit                         leave the shell");
}
