use anyhow::Result;

mod cli;
mod discovery;
mod hidapi_impl;

fn main() -> Result<()> {
    cli::execute()
}
