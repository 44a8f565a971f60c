use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use snel_merge::engine::core::{
    MergeInputs, MergeOptions, StepStatus, Value, merge, read_run, spawn_merge,
};
use snel_merge::logging;
use snel_merge::shared::config::CONFIG;

#[derive(Parser)]
#[command(name = "snel_merge")]
#[command(about = "Merge two sorted LSM runs into one", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge run A (older) with run B (newer) into a new output run
    Merge {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Drop tombstones; the output becomes the bottom level
        #[arg(long)]
        last_level: bool,
        /// Expected output entry count, used as a sizing hint
        #[arg(long, default_value = "0")]
        target_size: u64,
        /// Drive the merge in bursts of N actions instead of one shot.
        /// Without N, `merge.default_step` is used
        #[arg(long)]
        step: Option<Option<u64>>,
    },
    /// Print every entry of a run file
    Dump { run: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    match cli.command {
        Command::Merge {
            a,
            b,
            out,
            last_level,
            target_size,
            step,
        } => {
            let options = MergeOptions::from_config(&CONFIG.merge);
            let written = match step {
                None => merge(&a, &b, &out, target_size, last_level, &options)?,
                Some(burst) => {
                    let burst = burst.unwrap_or(CONFIG.merge.default_step);
                    let inputs = MergeInputs::new(a, b, out.clone())
                        .with_last_level(last_level)
                        .with_target_size(target_size);
                    let mut handle = spawn_merge(inputs, options)?;
                    loop {
                        let token = handle.next_token();
                        let done = handle.step(token, burst.max(1)).await?;
                        info!(
                            token = done.token.0,
                            performed = done.performed,
                            hibernations = done.hibernations,
                            "Step done"
                        );
                        if let StepStatus::Completed { written } = done.status {
                            handle.join().await?;
                            break written;
                        }
                    }
                }
            };
            println!("{} entries written to {}", written, out.display());
        }
        Command::Dump { run } => {
            for entry in read_run(&run)? {
                match entry.value {
                    Value::Put(v) => println!(
                        "{} => {}",
                        hex(&entry.key),
                        String::from_utf8_lossy(&v)
                    ),
                    Value::Tombstone => println!("{} => <tombstone>", hex(&entry.key)),
                }
            }
        }
    }

    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
