//! # slackview CLI
//!
//! Command-line interface for the slackview library.

use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use slackview::SlackviewError;
use slackview::cli::Args;
use slackview::output::{ArchiveView, write_json};
use slackview::reader::ArchiveReader;

fn main() {
    let args = <Args as ClapParser>::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .init();

    if let Err(e) = run(&args) {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SlackviewError> {
    let total_start = Instant::now();
    let config = args.viewer_config();

    println!("💬 slackview v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Archive:   {}", args.archive.display());
    println!("💾 Output:    {}", args.output.display());
    println!("🏢 Workspace: {}", config.workspace);
    if let Some(since) = &config.since {
        println!("📅 Since:     {}", since);
    }
    if config.show_dms {
        println!("✉️  DMs:       included");
    }
    println!();

    println!("⏳ Reading archive...");
    let reader = ArchiveReader::new(&args.archive, config)?;
    let view = ArchiveView::from_reader(&reader)?;

    println!("💾 Writing JSON...");
    write_json(&view, &args.output)?;

    println!();
    println!("✅ Done! Output saved to {}", args.output.display());

    println!();
    println!("📊 Summary:");
    println!("   Channels:  {}", view.channels.len());
    println!("   Groups:    {}", view.groups.len());
    if reader.config().show_dms {
        println!("   DMs:       {}", view.dms.len());
        println!("   MPIMs:     {}", view.mpims.len());
    }
    println!("   Messages:  {}", view.message_count());
    println!("   Time:      {:.2}s", total_start.elapsed().as_secs_f64());

    Ok(())
}
