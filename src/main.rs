use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;

use readaloud::pipeline::{SpeechPipeline, estimate_duration};
use readaloud::segment::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE};
use readaloud::tts::edge::config::signed_offset;
use readaloud::tts::edge::{DEFAULT_VOICE, EdgeTtsConfig};

/// readaloud - convert text to spoken audio via the Edge read-aloud service
#[derive(Parser, Debug)]
#[command(name = "readaloud")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Text to synthesize; reads stdin when neither TEXT nor --file is given
    text: Option<String>,

    /// Read the input text from a file ("-" for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Voice as a "locale, speaker" pair
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Pitch offset in hertz (e.g. 5 or -10)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pitch: i32,

    /// Speaking-rate offset in percent (e.g. 25 or -15)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    rate: i32,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    max_chunk_size: usize,

    /// Advisory minimum chunk size in characters
    #[arg(long, default_value_t = DEFAULT_MIN_CHUNK_SIZE)]
    min_chunk_size: usize,

    /// Output file path; defaults to a generated name in the current directory
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,
}

fn read_input(cli: &Cli) -> anyhow::Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    match &cli.file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {}", path.display(), e)),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| anyhow!("failed to read stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let text = read_input(&cli)?;

    let config = EdgeTtsConfig::default()
        .with_voice(&cli.voice)
        .with_pitch(signed_offset(cli.pitch, "Hz"))
        .with_rate(signed_offset(cli.rate, "%"));

    let mut pipeline =
        SpeechPipeline::with_chunk_sizes(config, cli.max_chunk_size, cli.min_chunk_size)?;

    // Surface session phase transitions on the terminal
    pipeline
        .client_mut()
        .on_status(Arc::new(|status| println!("{status}")));

    let char_count = text.trim().chars().count();
    let chunk_estimate = char_count.div_ceil(cli.max_chunk_size.max(1)).max(1);
    let eta = estimate_duration(char_count, chunk_estimate);
    println!(
        "Synthesizing {} characters (~{} seconds)...",
        char_count,
        eta.as_secs()
    );

    let output = pipeline.synthesize(&text).await?;

    let path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&output.file_name));
    std::fs::write(&path, &output.audio)
        .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;

    println!(
        "Wrote {} bytes ({} chunk{}) to {}",
        output.audio.len(),
        output.chunk_count,
        if output.chunk_count == 1 { "" } else { "s" },
        path.display()
    );

    Ok(())
}
