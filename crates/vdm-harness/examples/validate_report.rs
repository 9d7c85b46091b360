#![forbid(unsafe_code)]

//! Validate one extent report and print the usable window.
//!
//! Reads a captured report from a file, or runs the mapping tool against
//! a target file with `--map`. Set `RUST_LOG=vdm=info` to watch the
//! acquisition.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use vdm_extent::{ExtentTable, validate_virtual_data};
use vdm_harness::MapTool;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut tool = MapTool::default();
    let mut map_target: Option<PathBuf> = None;
    let mut report_file: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--map" => {
                let value = iter.next().context("--map needs a file argument")?;
                map_target = Some(PathBuf::from(value));
            }
            "--tool" => {
                let value = iter.next().context("--tool needs a program argument")?;
                tool = MapTool::new(value);
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other if !other.starts_with('-') => report_file = Some(PathBuf::from(other)),
            other => {
                print_usage();
                bail!("unknown argument: {other}");
            }
        }
    }

    let raw = match (report_file, map_target) {
        (Some(path), None) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(target)) => tool
            .read_extent_report(&target)
            .with_context(|| format!("failed to map {}", target.display()))?,
        _ => {
            print_usage();
            bail!("pass exactly one of <report.tsv> or --map <file>");
        }
    };

    let table = ExtentTable::parse(&raw)?;
    let window = validate_virtual_data(&table)?;

    println!(
        "usable window: {} bytes at file offset {} (physical offset {})",
        window.size, window.file_offset, window.physical_offset
    );
    println!("{}", serde_json::to_string_pretty(&window)?);
    Ok(())
}

fn print_usage() {
    eprintln!("usage: validate_report <report.tsv>");
    eprintln!("   or: validate_report --map <file> [--tool <program>]");
    eprintln!();
    eprintln!("Validates a physical extent report as virtual data and prints");
    eprintln!("the largest file/physical window whose bytes correspond 1:1.");
}
