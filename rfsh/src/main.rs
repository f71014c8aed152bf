use std::env;
use std::sync::Arc;

use clap::Parser;
use rfs_client::{HttpRemote, MemoryRemote, Remote};
use rfs_config::RfshConfig;
use rfsh::{Session, ShellError};

/// rfsh - Interactive shell for a handle-based remote filesystem
#[derive(Parser, Debug)]
#[command(name = "rfsh", version, about)]
struct Args {
    /// Remote engine URL
    #[arg(short, long, env = "RFSH_SERVER")]
    server: Option<String>,

    /// Export root shown in the prompt
    #[arg(short, long, env = "RFSH_EXPORT")]
    export: Option<String>,

    /// Authentication token
    #[arg(short, long, env = "RFSH_TOKEN")]
    token: Option<String>,

    /// Execute a semicolon-separated command string and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Use the in-process memory backend instead of a server
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = rfs_config::load().unwrap_or_else(|_| RfshConfig::default());

    init_tracing(&config);

    // Server URL priority: CLI arg > env > config > default
    let server_url = args
        .server
        .clone()
        .unwrap_or_else(|| config.shell.server.clone());
    let export = args
        .export
        .clone()
        .unwrap_or_else(|| config.shell.export.clone());

    let remote: Arc<dyn Remote> = if args.memory {
        Arc::new(MemoryRemote::new())
    } else {
        let token = args.token.clone().or_else(|| {
            if config.shell.token.is_empty() {
                None
            } else {
                Some(config.shell.token.clone())
            }
        });

        let mut builder = HttpRemote::builder(&server_url);
        if let Some(token) = token {
            if token.trim().is_empty() {
                eprintln!("Error: token is empty.");
                std::process::exit(1);
            }
            builder = builder.token(token);
        }

        match builder.connect().await {
            Ok(remote) => Arc::new(remote),
            Err(e) => {
                eprintln!("rfsh: cannot connect to {server_url}: {e}");
                std::process::exit(1);
            }
        }
    };

    let host = if args.memory {
        "memory".to_string()
    } else {
        host_from_url(&server_url)
    };

    let mut session = Session::new(remote);

    let code = if let Some(batch) = args.command {
        // Batch mode: the string runs non-interactively, no prompts; an
        // `exit` in the sequence stops it cleanly.
        match session.execute(&batch).await {
            Ok(code) => code,
            Err(_) => 0,
        }
    } else {
        run_repl(&mut session, &config, &host, &export).await?;
        0
    };

    session.teardown().await;
    std::process::exit(code);
}

fn init_tracing(config: &RfshConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if config.logging.filter.is_empty() {
        config.logging.level.as_str().to_string()
    } else {
        config.logging.filter.clone()
    };

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Extract a hostname for the prompt (e.g. "http://nas.local:9099" -> "nas.local")
fn host_from_url(server_url: &str) -> String {
    let without_protocol = server_url
        .strip_prefix("https://")
        .or_else(|| server_url.strip_prefix("http://"))
        .unwrap_or(server_url);

    without_protocol
        .split([':', '/'])
        .next()
        .unwrap_or("localhost")
        .to_string()
}

async fn run_repl(
    session: &mut Session,
    config: &RfshConfig,
    host: &str,
    export: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    use rustyline::error::ReadlineError;
    use rustyline::{Config as RlConfig, DefaultEditor};

    let rl_config = RlConfig::builder()
        .max_history_size(config.shell.history.max_entries)?
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .build();
    let mut rl = DefaultEditor::with_config(rl_config)?;

    let history_path = rfs_config::history_path(config);
    if config.shell.history.enabled {
        let _ = rl.load_history(&history_path);
    }

    println!("rfsh v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' to quit, 'help' for commands.");
    println!();

    let user = env::var("USER").unwrap_or_else(|_| "anonymous".to_string());

    loop {
        // The prompt reflects live session state on every cycle.
        let prompt = config
            .shell
            .prompt
            .replace("{user}", &user)
            .replace("{host}", host)
            .replace("{export}", export)
            .replace("{cwd}", &session.cwd);

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match session.execute(line).await {
                    Ok(_) => {}
                    Err(ShellError::Exit) => {
                        println!("bye");
                        break;
                    }
                    Err(e) => {
                        // Anything that escapes the per-command reporting
                        // must not kill the shell.
                        tracing::error!(error = %e, "unhandled shell error");
                        eprintln!("rfsh: {e}");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if config.shell.history.enabled {
        let _ = rl.save_history(&history_path);
    }

    Ok(())
}
