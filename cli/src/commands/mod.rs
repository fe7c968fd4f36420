//! Per-command handlers, one module per CLI command.

pub mod balance;
pub mod chain;
pub mod contract;
pub mod panel;
pub mod transaction;

use colored::Colorize;

pub fn print_success(message: &str) {
    println!("{} {}", "OK".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "ERROR".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "*".cyan(), message);
}
