use clap::Parser;
use rustboy_advance::gba::Gba;
use rustboy_advance::info::Info;
use std::process::ExitCode;
use std::time::Instant;

/// Headless console frontend: runs a cartridge for a fixed number of
/// frames with no window/audio and reports basic throughput, mirroring
/// the benchmark-style entry point the GUI frontends build on top of.
#[derive(Parser)]
#[command(name = "rustboy-advance-console")]
struct Args {
    /// Path to the cartridge ROM to run.
    #[arg(default_value = "test.gba")]
    rom: String,

    /// Number of frames to run before exiting.
    #[arg(short, long, default_value_t = 60)]
    frames: u32,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut gba = Gba::new();
    if let Err(error) = gba.load_rom_file(&args.rom) {
        eprintln!("Failed to load ROM '{}': {}", args.rom, error);
        return ExitCode::FAILURE;
    }

    println!(
        "Running {} ({}) for {} frame(s)...",
        Info::name(),
        args.rom,
        args.frames
    );

    let start = Instant::now();
    for _ in 0..args.frames {
        gba.step_frame();
    }
    let elapsed = start.elapsed();

    println!("{}", gba.description_debug());
    println!("Ran {} frame(s) in {:?}", args.frames, elapsed);

    ExitCode::SUCCESS
}
