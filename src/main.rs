use mazeworks::app::App;
use tracing_subscriber::EnvFilter;

/// Log file for the terminal demo, since the maze occupies the screen
const LOG_FILE: &str = "mazeworks.log";

fn main() -> std::io::Result<()> {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    // Held until main returns so buffered lines are flushed
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let app = App::default();
    let mut stdout = std::io::stdout();
    App::setup_terminal(&mut stdout)?;
    let result = app.run(&mut stdout);
    App::restore_terminal(&mut stdout)?;
    if let Err(err) = &result {
        tracing::error!(%err, "terminal app failed");
    }
    result
}
