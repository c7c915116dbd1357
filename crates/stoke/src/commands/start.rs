//! Development server command: resolve a port, then launch.

use std::sync::Arc;

use anyhow::Result;
use console::{style, user_attended, Term};
use stoke_server::{Compiler, CompileEvent, CopyBundler, DevServer, DevServerConfig, ProxyRules};

use crate::env::Environment;
use crate::files::check_required_files;
use crate::metadata::ProjectMetadata;
use crate::paths::ProjectPaths;
use crate::port::{process_for_port, resolve_port};
use crate::prompt::confirm_port_change;
use crate::urls::{lan_address, ServerUrls};

/// What to do once the port probe has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortDecision {
    /// Default port is free, launch on it
    Launch,

    /// Default port is busy and a terminal is attached, ask the user
    Prompt,

    /// Default port is busy and nobody can answer a prompt
    Warn,
}

fn decide(default_port: u16, resolved: u16, interactive: bool) -> PortDecision {
    if resolved == default_port {
        PortDecision::Launch
    } else if interactive {
        PortDecision::Prompt
    } else {
        PortDecision::Warn
    }
}

/// Run the start command.
pub async fn run(open: bool) -> Result<()> {
    let env = Environment::load("development");
    let paths = ProjectPaths::from_root(".");

    // Warn and bail before anything else if entry files are missing
    if !check_required_files(&paths.required_files()) {
        std::process::exit(1);
    }

    // Sampled once; prompts and screen clearing key off this for the rest
    // of the run
    let interactive = user_attended();

    let resolved = resolve_port(&env.host, env.port).await?;
    tracing::debug!(desired = env.port, resolved, "port probe finished");

    match decide(env.port, resolved, interactive) {
        PortDecision::Launch => launch(env, paths, resolved, open, interactive).await,
        PortDecision::Prompt => {
            let _ = Term::stdout().clear_screen();
            let occupant = process_for_port(env.port).await;
            if confirm_port_change(env.port, occupant.as_deref())? {
                launch(env, paths, resolved, open, interactive).await
            } else {
                // Declined: end quietly, no server
                Ok(())
            }
        }
        PortDecision::Warn => {
            println!(
                "{}",
                style(format!(
                    "Something is already running on port {}.",
                    env.port
                ))
                .red()
            );
            Ok(())
        }
    }
}

async fn launch(
    env: Environment,
    paths: ProjectPaths,
    port: u16,
    open: bool,
    interactive: bool,
) -> Result<()> {
    let metadata = ProjectMetadata::load(&paths.package_json)?;
    let urls = ServerUrls::new(env.protocol, &env.host, port, lan_address());

    let proxy = match &metadata.proxy {
        Some(target) => Some(ProxyRules::from_target(target)?),
        None => None,
    };

    let compiler = Arc::new(Compiler::new(Arc::new(CopyBundler)));
    spawn_status_printer(&compiler, metadata.name, urls.clone());

    let config = DevServerConfig {
        public_dir: paths.public_dir,
        entry: paths.entry_js,
        host: env.host,
        port,
        proxy,
        pretty_url: urls.pretty,
        open,
        interactive,
    };

    DevServer::new(compiler, config).start().await?;

    Ok(())
}

/// Subscribe to compile events and narrate them on the console.
fn spawn_status_printer(compiler: &Arc<Compiler>, name: String, urls: ServerUrls) {
    let mut events = compiler.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CompileEvent::Started => {
                    println!("Compiling...");
                }
                CompileEvent::Succeeded { show_instructions } => {
                    println!("{}", style("Compiled successfully!").green());
                    if show_instructions {
                        print_instructions(&name, &urls);
                    }
                }
                CompileEvent::Failed { message } => {
                    println!("{}", style("Failed to compile.").red());
                    println!();
                    println!("{message}");
                }
            }
        }
    });
}

fn print_instructions(name: &str, urls: &ServerUrls) {
    println!();
    println!("You can now view {} in the browser.", style(name).bold());
    println!();

    match &urls.lan {
        Some(lan) => {
            println!(
                "  {}            {}",
                style("Local:").bold(),
                style(&urls.pretty).cyan()
            );
            println!(
                "  {}  {}",
                style("On Your Network:").bold(),
                style(lan).cyan()
            );
        }
        None => println!("  {}", style(&urls.pretty).cyan()),
    }

    println!();
    println!("Note that the development build is not optimized.");
    println!(
        "To create a production build, use {}.",
        style("stoke build").cyan()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_default_port_launches_without_prompt() {
        assert_eq!(decide(3000, 3000, true), PortDecision::Launch);
        assert_eq!(decide(3000, 3000, false), PortDecision::Launch);
    }

    #[test]
    fn busy_port_prompts_only_when_interactive() {
        assert_eq!(decide(3000, 3001, true), PortDecision::Prompt);
        assert_eq!(decide(3000, 3001, false), PortDecision::Warn);
    }
}
