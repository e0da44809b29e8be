// Transcode a source movie or image sequence to EXR: build a temporary
// scene around the source, describe one EXR deliverable, and drive the
// render processor to completion.
//
// usage: transcode [-h <host>] <destination directory> <source path> [<start frame> <end frame>]

use flapi::models::deliverable::{FrameNumberMode, RenderDeliverable};
use flapi::models::options::{InsertPosition, NewSceneOptions};
use flapi::poller::wait_for_render;
use flapi::{Config, Connection, LaunchOptions, PollOptions};
use std::path::PathBuf;
use std::time::Duration;

struct Args {
    host: Option<String>,
    destination: String,
    source: String,
    start_frame: Option<i64>,
    end_frame: Option<i64>,
}

fn parse_args() -> Option<Args> {
    let mut host = None;
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-h" {
            host = Some(args.next()?);
        } else {
            positional.push(arg);
        }
    }

    if positional.len() != 2 && positional.len() != 4 {
        return None;
    }
    let start_frame = positional.get(2).and_then(|s| s.parse().ok());
    let end_frame = positional.get(3).and_then(|s| s.parse().ok());
    if positional.len() == 4 && (start_frame.is_none() || end_frame.is_none()) {
        return None;
    }

    Some(Args {
        host,
        destination: positional[0].clone(),
        source: positional[1].clone(),
        start_frame,
        end_frame,
    })
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = match parse_args() {
        Some(args) => args,
        None => {
            println!("usage: transcode [-h <host>] <destination directory> <source path> [<start frame> <end frame>]");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        println!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> flapi::Result<()> {
    let mut conn = match &args.host {
        Some(host) => Connection::connect(&Config::new(host))?,
        None => Connection::launch(&LaunchOptions::default())?,
    };

    println!("Starting transcode of {}", args.source);

    // Find the source material.
    let sequences = conn.sequences_for_template(&args.source, args.start_frame, args.end_frame)?;
    let sequence = match sequences.first() {
        Some(s) => *s,
        None => {
            println!("Could not find sequence for {}", args.source);
            std::process::exit(1);
        }
    };

    // Define a format matching the source dimensions.
    let width = conn.sequence_width(&sequence)?;
    let height = conn.sequence_height(&sequence)?;
    let format_name = format!("Transcode {}x{}", width, height);
    let formats = conn.global_formats()?;
    let format = conn.add_format(
        &formats,
        &format_name,
        "Created by flapi transcode",
        width,
        height,
        1.0,
    )?;

    // Temporary scene to hold the source.
    let options = NewSceneOptions {
        format: format_name.clone(),
        colourspace: "ACES_lin".to_owned(),
        frame_rate: 24.0,
        ..Default::default()
    };
    let scene = conn.temporary_scene(&options)?;

    conn.start_delta(&scene, "Insert Sequence")?;
    let shot = conn.insert_sequence(
        &scene,
        &sequence,
        InsertPosition::End,
        None,
        None, // auto-detect input colourspace
        Some(&format_name),
    )?;
    conn.release(&shot)?;
    conn.end_delta(&scene)?;
    conn.release(&sequence)?;

    // One EXR deliverable into the destination directory.
    let deliverable = RenderDeliverable {
        name: "Render to EXR".to_owned(),
        file_type: "EXR".to_owned(),
        output_directory: PathBuf::from(&args.destination),
        file_name_prefix: "render_".to_owned(),
        file_name_extension: ".exr".to_owned(),
        file_name_num_digits: 7,
        file_name_number: FrameNumberMode::ShotFrame,
        render_format: format_name.clone(),
        render_colour_space: Some("ACES_lin".to_owned()),
        ..Default::default()
    };

    let setup = conn.create_render_setup()?;
    conn.render_set_scene(&setup, &scene)?;
    conn.add_deliverable(&setup, &deliverable)?;

    let processor = conn.render_processor()?;
    println!("Render Start");
    conn.start_render(&processor, &setup)?;

    let outcome = wait_for_render(
        &mut conn,
        &processor,
        &PollOptions::with_interval(Duration::from_secs(1)),
        |status| {
            println!(
                "Render Status: {:?} Frames: {}/{}",
                status.status, status.complete, status.total
            );
        },
    )?;

    for item in &outcome.log {
        println!("{} : {}", item.message, item.detail.as_deref().unwrap_or(""));
    }

    conn.close_scene(&scene)?;
    conn.release(&format)?;
    conn.close();

    match outcome.status.error {
        Some(error) => {
            println!("Render Failed: {}", error);
            std::process::exit(1);
        }
        None => {
            println!("Render Complete");
            Ok(())
        }
    }
}
