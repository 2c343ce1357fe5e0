#![allow(clippy::uninlined_format_args)]

pub mod graphics;

use clap::Parser;
use graphics::Graphics;
use rustboy_advance::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use rustboy_advance::gba::Gba;
use rustboy_advance::info::Info;
use rustboy_advance::pad::PadKey;
use sdl2::{event::Event, keyboard::Keycode, pixels::PixelFormatEnum};
use std::process::ExitCode;

/// The scale at which the 240x160 GBA screen is drawn, i.e. the ratio
/// between the native resolution and the window size.
const SCREEN_SCALE: f32 = 3.0;

#[derive(Parser)]
#[command(name = "rustboy-advance-sdl")]
struct Args {
    /// Path to the cartridge ROM to run.
    #[arg(default_value = "test.gba")]
    rom: String,
}

pub struct Emulator {
    gba: Gba,
    graphics: Graphics,
    title: String,
}

impl Emulator {
    pub fn new(rom_path: &str) -> Result<Self, rustboy_advance_common::error::Error> {
        let sdl = sdl2::init().unwrap();
        let mut gba = Gba::new();
        gba.load_rom_file(rom_path)?;

        let title = format!("{} [{}]", Info::name(), rom_path);
        let graphics = Graphics::new(
            &sdl,
            &title,
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
            SCREEN_SCALE,
            true,
        );

        Ok(Self { gba, graphics, title })
    }

    /// Runs the main emulation loop: polls input once per frame, steps
    /// the system for a full frame, then pushes the PPU framebuffer to
    /// the streaming texture backing the canvas.
    pub fn run(&mut self) {
        self.graphics.window_mut().set_title(&self.title).unwrap();

        let texture_creator = self.graphics.canvas.texture_creator();
        let mut texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::BGRA8888, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
            .unwrap();

        let mut mask = 0xffffu16;

        'main: loop {
            while let Some(event) = self.graphics.event_pump.poll_event() {
                match event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => break 'main,
                    Event::KeyDown {
                        keycode: Some(Keycode::R),
                        ..
                    } => self.gba.reset(),
                    Event::KeyDown {
                        keycode: Some(keycode),
                        ..
                    } => {
                        if let Some(key) = key_to_pad(keycode) {
                            mask &= !(1 << key as u16);
                            self.gba.set_input_mask(mask);
                        }
                    }
                    Event::KeyUp {
                        keycode: Some(keycode),
                        ..
                    } => {
                        if let Some(key) = key_to_pad(keycode) {
                            mask |= 1 << key as u16;
                            self.gba.set_input_mask(mask);
                        }
                    }
                    _ => (),
                }
            }

            self.gba.step_frame();

            texture
                .update(None, self.gba.framebuffer(), SCREEN_WIDTH * 4)
                .unwrap();
            self.graphics.canvas.clear();
            self.graphics.canvas.copy(&texture, None, None).unwrap();
            self.graphics.canvas.present();
        }
    }
}

fn key_to_pad(keycode: Keycode) -> Option<PadKey> {
    match keycode {
        Keycode::Up => Some(PadKey::Up),
        Keycode::Down => Some(PadKey::Down),
        Keycode::Left => Some(PadKey::Left),
        Keycode::Right => Some(PadKey::Right),
        Keycode::Return => Some(PadKey::Start),
        Keycode::Backspace => Some(PadKey::Select),
        Keycode::X => Some(PadKey::A),
        Keycode::Z => Some(PadKey::B),
        Keycode::A => Some(PadKey::L),
        Keycode::S => Some(PadKey::R),
        _ => None,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match Emulator::new(&args.rom) {
        Ok(mut emulator) => {
            emulator.run();
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Failed to load ROM '{}': {}", args.rom, error);
            ExitCode::FAILURE
        }
    }
}
