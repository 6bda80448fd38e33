/// prim3d Terminal Demo - the four primitive solids
///
/// Controls:
///   - W/S: Move forward / back
///   - A/D: Move left / right
///   - R/F: Move up / down
///   - Left/Right: Change spin speed
///   - C: Cycle color, T: Toggle translucency
///   - Q/ESC: Quit
use prim3d_terminal::{init_logging, LoggingConfig, TerminalApp};
use std::io;
use std::path::PathBuf;

fn main() -> io::Result<()> {
    init_logging(LoggingConfig {
        log_file: std::env::var_os("PRIM3D_LOG_FILE").map(PathBuf::from),
        ..LoggingConfig::default()
    });

    println!("prim3d Terminal Renderer - starting (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new()?;
    app.run()?;

    println!("Thank you for using prim3d!");
    Ok(())
}
