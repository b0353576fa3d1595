use bag_etl::rosbag::BagReader;
use bag_etl::utils::logger;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bag_info")]
#[command(about = "Print topics, message counts and time span of a bag file")]
struct Args {
    /// Path to the bag file
    bag: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let reader = match BagReader::open(&args.bag) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let summary = match reader.summarize() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    println!("📦 {}", args.bag.display());
    match summary.time_bound() {
        Some((start, end)) => {
            println!("⏱️  Duration: {:.2}s ({:.3} .. {:.3})", end - start, start, end);
        }
        None => println!("⏱️  Duration: empty bag"),
    }
    println!("✉️  Messages: {}", summary.message_count());
    println!();

    for topic in &summary.topics {
        println!(
            "  {:<40} {:<28} {:>6} msgs",
            topic.topic, topic.datatype, topic.message_count
        );
    }
}
