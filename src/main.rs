// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

struct Args {
    startup: Option<String>,
    config_path: Option<PathBuf>,
    debug: bool,
}

const USAGE: &str = "\
Usage: swl [options]

Options:
  -s <cmd>    run <cmd> as the startup command instead of the configured terminal
  -c <path>   load configuration from <path> instead of the default search path
  -d          enable debug logging (equivalent to RUST_LOG=debug)
  -v          print version and exit
  -h          print this help and exit";

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut args = Args {
        startup: None,
        config_path: None,
        debug: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-s" => {
                args.startup = Some(it.next().ok_or("-s requires an argument")?);
            }
            "-c" => {
                args.config_path = Some(PathBuf::from(it.next().ok_or("-c requires an argument")?));
            }
            "-d" => args.debug = true,
            "-v" => {
                println!("swl {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => return Err(format!("unrecognized argument: {other}").into()),
        }
    }
    Ok(args)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("swl: {err}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    init_logging(args.debug);

    let (mut event_loop, mut monotile) = monotile::Monotile::new();

    if let Some(path) = &args.config_path {
        match monotile.state.config.load_file(path) {
            Ok(()) => {
                let (keybindings, buttons) = monotile::config::load_bindings(&monotile.state.config);
                monotile.state.keybindings = keybindings;
                monotile.state.buttons = buttons;
                monotile.state.rules = monotile::rules::load_rules_from_config(&monotile.state.config);
            }
            Err(err) => {
                tracing::error!(?err, path = %path.display(), "failed to load configuration");
            }
        }
    }

    // TODO: implement drm backend selection from CLI
    monotile::backend::winit::init(&mut event_loop, &mut monotile)?;

    unsafe {
        std::env::remove_var("DISPLAY");
        std::env::set_var("WAYLAND_DISPLAY", &monotile.state.socket);
        std::env::set_var("XDG_SESSION_TYPE", "wayland");
        std::env::set_var("XDG_CURRENT_DESKTOP", "swl");
    }

    let startup = args
        .startup
        .unwrap_or_else(|| monotile.state.config.get_string("general.terminal", "foot"));
    let mut parts = startup.split_whitespace();
    if let Some(program) = parts.next() {
        std::process::Command::new(program).args(parts).spawn().ok();
    }

    event_loop.run(None, &mut monotile, |monotile| {
        monotile.state.flush_clients();
        if monotile.state.should_quit() {
            monotile.state.loop_signal.stop();
        }
    })?;

    Ok(())
}

fn init_logging(debug: bool) {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    } else if debug {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .init();
    } else {
        tracing_subscriber::fmt().init();
    }
}
