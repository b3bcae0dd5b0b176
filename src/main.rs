//! # tglens CLI
//!
//! Command-line interface for the tglens library.

use std::collections::BTreeMap;
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use tglens::TglensError;
use tglens::analysis::{Analysis, analyze_file};
use tglens::cli::Args;
use tglens::format::{OutputFormat, format_count, write_to_format};

const DEFAULT_OUTPUT: &str = "tglens_report.json";

fn main() {
    let args = <Args as ClapParser>::parse();
    init_tracing(&args);

    match run(&args) {
        Ok(()) => {}
        Err(TglensError::EmptyExport) => {
            println!("📭 The export contains no chats: nothing to show.");
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<(), TglensError> {
    let total_start = Instant::now();
    let output_path = adjust_output_extension(&args.output, args.format);

    // Print header
    println!("🔎 tglens v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:   {}", args.input);
    println!("💾 Output:  {}", output_path);
    println!("📄 Format:  {}", args.format);
    println!("🗓️  Buckets: {}", args.granularity);
    if args.streaming {
        println!("🌊 Mode:    Streaming");
    }

    let config = args.analysis_config()?;
    if let Some(ref after) = args.after {
        println!("📅 After:   {}", after);
    }
    if let Some(ref before) = args.before {
        println!("📅 Before:  {}", before);
    }
    if config.filter.period.duration().is_some() {
        println!("⏱️  Period:  last {}", args.period);
    }
    if let Some(ref from) = args.from {
        println!("👤 From:    {}", from);
    }
    println!();

    println!("⏳ Analyzing...");
    let analyze_start = Instant::now();
    let analysis = if args.streaming {
        analyze_streaming(args, &config)?
    } else {
        analyze_file(&args.input, &config)?
    };
    println!(
        "   {} chats, {} messages ({:.2}s)",
        analysis.stats.chats,
        analysis.stats.raw_messages,
        analyze_start.elapsed().as_secs_f64()
    );
    if let Some(summary) = analysis.skipped_summary() {
        println!("⚠️  {}", summary);
    }
    if config.filter.is_active() {
        println!(
            "🔍 {} messages after filtering ({:.1}% removed)",
            analysis.stats.analyzed_messages,
            analysis.stats.filtered_ratio()
        );
    }

    // Write report
    let lib_format: OutputFormat = args.format.into();
    println!("💾 Writing {}...", lib_format);
    let write_start = Instant::now();
    write_to_format(&analysis, &output_path, lib_format)?;
    println!("   Written in {:.2}s", write_start.elapsed().as_secs_f64());

    println!();
    println!("✅ Done! Report saved to {}", output_path);

    print_summary(&analysis, args.top);

    // Performance stats
    let total_time = total_start.elapsed();
    println!();
    println!("⚡ Performance:");
    println!("   Total time:  {:.2}s", total_time.as_secs_f64());
    let msgs_per_sec = analysis.stats.raw_messages as f64 / total_time.as_secs_f64();
    println!("   Throughput:  {:.0} messages/sec", msgs_per_sec);

    Ok(())
}

#[cfg(feature = "streaming")]
fn analyze_streaming(
    args: &Args,
    config: &tglens::config::AnalysisConfig,
) -> Result<Analysis, TglensError> {
    // `--strict` covers messages only; an invalid chat is always fatal
    let streaming = tglens::streaming::StreamingConfig::new();
    tglens::analysis::analyze_streaming(&args.input, config, streaming)
}

#[cfg(not(feature = "streaming"))]
fn analyze_streaming(
    _args: &Args,
    _config: &tglens::config::AnalysisConfig,
) -> Result<Analysis, TglensError> {
    Err(TglensError::invalid_config(
        "streaming",
        "--streaming requires the 'streaming' feature to be enabled",
    ))
}

fn print_summary(analysis: &Analysis, top: usize) {
    let agg = &analysis.aggregates;
    let overview = &agg.overview;

    println!();
    println!("📊 Summary:");
    println!("   Messages:  {}", format_count(overview.total_messages));
    println!("   Chats:     {}", overview.total_chats);
    if let (Some(first), Some(last)) = (overview.first, overview.last) {
        println!(
            "   Range:     {} → {} ({} days)",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d"),
            overview.total_days
        );
    }
    println!("   Media:     {}", format_count(overview.media_messages));
    if agg.calls.count > 0 {
        println!(
            "   Calls:     {} (avg {:.0}s)",
            agg.calls.count, agg.calls.average_duration_seconds
        );
    }

    if top == 0 {
        return;
    }

    let mut senders: BTreeMap<&str, u64> = BTreeMap::new();
    for (key, count) in agg.sender_counts.iter() {
        *senders.entry(key.sender_id.as_str()).or_default() += count;
    }
    let mut senders: Vec<_> = senders.into_iter().collect();
    senders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    if !senders.is_empty() {
        println!();
        println!("👥 Top senders:");
        for (sender, count) in senders.into_iter().take(top) {
            println!("   {:<24} {}", sender, format_count(count));
        }
    }

    let tokens = agg.tokens.top(top);
    if !tokens.is_empty() {
        println!();
        println!("💬 Top words:");
        for (token, count) in tokens {
            println!("   {:<24} {}", token, format_count(count));
        }
    }
}

/// Adjusts output file extension based on format if using default output.
fn adjust_output_extension(output: &str, format: tglens::cli::OutputFormat) -> String {
    if output != DEFAULT_OUTPUT {
        return output.to_string();
    }
    format!("tglens_report.{}", format.extension())
}
