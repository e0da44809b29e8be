// List jobs and scenes from a database host, using a locally launched
// service rather than an already-running one.
//
// usage: jobs [-db <database host>]

use flapi::{Connection, LaunchOptions};

fn main() {
    let mut dbhost = "localhost".to_owned();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-db" {
            match args.next() {
                Some(host) => dbhost = host,
                None => {
                    println!("No database hostname specified for -db argument");
                    std::process::exit(1);
                }
            }
        }
    }

    if let Err(e) = run(&dbhost) {
        println!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(dbhost: &str) -> flapi::Result<()> {
    let mut conn = Connection::launch(&LaunchOptions::default())?;

    let jobs = conn.get_jobs(dbhost)?;
    println!("Found {} jobs on {}:", jobs.len(), dbhost);
    for job in &jobs {
        println!("  {}:{}", dbhost, job);
        for scene in conn.get_scenes(dbhost, job, None)? {
            println!("    {}", scene);
        }
    }

    conn.close();
    Ok(())
}
