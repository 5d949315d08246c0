//! ar6mx-recovery - bootloader and display tools for the AR6MX recovery image
//!
//! # Architecture
//!
//! The tools are split into two library crates:
//! - **ar6mx-updater** - sysfs writes, the bootloader copier and the
//!   unlock / copy / relock / enable-boot sequence, plus the function table
//!   exposed to update scripts
//! - **ar6mx-fbdev** - the Linux framebuffer backend of the recovery UI
//!
//! This binary wires both to a command line, with an optional TOML board
//! profile describing the sysfs nodes and display of a given board.

mod board;
mod cli;
mod commands;

use board::BoardConfig;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Load board profile
    let board = match BoardConfig::load(cli.board.as_deref()) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Failed to load board profile: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Flash { image } => commands::flash::run_flash(&board.boot, &image),
        Commands::Copy { image } => commands::flash::run_copy(&board.boot, &image),
        Commands::SysfsWrite { path, value } => commands::run_sysfs_write(&path, value),
        Commands::Call { name, args } => commands::flash::run_call(&board.boot, &name, &args),
        Commands::ListFunctions => {
            commands::flash::list_functions();
            Ok(())
        }
        Commands::FbTest {
            dummy,
            frames,
            format,
        } => commands::fb::run_fb_test(&board.display, dummy, frames, format),
        Commands::ShowBoard => {
            board.print();
            Ok(())
        }
    };

    result
}
