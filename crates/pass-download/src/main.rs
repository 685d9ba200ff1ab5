//! PASS download service.
//!
//! The download service is a standalone web service that discovers open access manuscripts for a
//! DOI using Unpaywall, and downloads a chosen manuscript into the PASS Fedora repository.

#![warn(missing_debug_implementations, clippy::all)]

mod cli;
mod endpoints;
mod logging;
mod server;
mod service;

#[cfg(test)]
mod test;

fn main() {
    match cli::execute() {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            logging::ensure_log_error(&error);
            std::process::exit(1);
        }
    }
}
