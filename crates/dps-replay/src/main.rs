//! Test tool: connects to a running `dps-runner` capture listener and
//! replays a previously captured raw byte stream over it, in fixed-size
//! chunks with an optional delay between writes. Grounded in the same
//! raw-socket style as the teacher's own `util::bin::test_listen` probe,
//! turned into a client instead of a listener.

use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

/// Replays a captured byte stream against a `dps-runner` capture port.
#[derive(Parser, Debug)]
#[command(name = "dps-replay", version, about)]
struct Args {
    /// Address of the running dps-runner's capture listener.
    #[arg(long, default_value = "127.0.0.1:28008")]
    target: String,

    /// Path to a raw binary capture file (exact bytes as they crossed the
    /// wire, magic delimiters included).
    #[arg(long)]
    file: String,

    /// Bytes written per chunk.
    #[arg(long, default_value_t = 1024)]
    chunk_size: usize,

    /// Delay between chunks, in milliseconds. Zero sends the whole file as
    /// fast as the socket accepts it.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let data = match fs::read(&args.file) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("failed to read capture file {}: {err}", args.file);
            return ExitCode::FAILURE;
        }
    };

    let mut stream = match TcpStream::connect(&args.target) {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("failed to connect to {}: {err}", args.target);
            return ExitCode::FAILURE;
        }
    };

    let chunk_size = args.chunk_size.max(1);
    for chunk in data.chunks(chunk_size) {
        if let Err(err) = stream.write_all(chunk) {
            eprintln!("write failed: {err}");
            return ExitCode::FAILURE;
        }
        if args.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }

    println!(
        "replayed {} bytes from {} to {}",
        data.len(),
        args.file,
        args.target
    );
    ExitCode::SUCCESS
}
