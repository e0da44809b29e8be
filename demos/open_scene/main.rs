// Open a scene read-only and report what it is, to check a path and the
// connection are good.
//
// usage: open_scene [-h <host>] <host:job:scene>

use flapi::models::options::OpenFlag;
use flapi::models::scene_path::ScenePath;
use flapi::{Config, Connection};

fn main() {
    let mut host = "localhost".to_owned();
    let mut path_arg = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-h" {
            match args.next() {
                Some(h) => host = h,
                None => {
                    println!("No hostname specified for -h argument");
                    std::process::exit(1);
                }
            }
        } else if path_arg.is_none() {
            path_arg = Some(arg);
        }
    }

    let path_arg = match path_arg {
        Some(p) => p,
        None => {
            println!("No scene path specified");
            println!("usage: open_scene [-h <host>] <host:job:scene>");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&host, &path_arg) {
        println!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(host: &str, path_arg: &str) -> flapi::Result<()> {
    let path = ScenePath::parse(path_arg)?;

    let mut conn = Connection::connect(&Config::new(host))?;
    println!("Opening {}", path);

    let scene = conn.open_scene(&path, &[OpenFlag::ReadOnly])?;
    println!("Opened {}", scene);

    conn.close_scene(&scene)?;
    conn.release(&scene)?;
    conn.close();
    Ok(())
}
