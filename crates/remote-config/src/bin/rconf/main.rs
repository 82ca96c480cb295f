mod cli;

use anyhow::Context;
use remote_config::config::Config;
use remote_config::loader::RemoteConfigLoader;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("RCONF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Resolve(resolve_cli) => resolve(resolve_cli),
        cli::Command::Fetch(fetch_cli) => fetch(fetch_cli),
        cli::Command::Providers => providers(),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn resolve(cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let local = load(&cli.input)?;
    let loader = RemoteConfigLoader::builtin(cli.input.mode.into());

    let effective = loader.resolve(&local)?;

    output(&cli.output, &effective)?;
    Ok(())
}

pub fn fetch(cli: cli::FetchCommand) -> anyhow::Result<()> {
    let local = load(&cli.input)?;
    let loader = RemoteConfigLoader::builtin(cli.input.mode.into());

    let Some(remote) = loader.fetch(&local)? else {
        anyhow::bail!("remote-configuration.provider is not set");
    };

    print!("{}", remote.to_config_text());
    Ok(())
}

pub fn providers() -> anyhow::Result<()> {
    let loader = RemoteConfigLoader::builtin(Default::default());
    for provider in loader.registry().iter() {
        println!("{:<8} {}", provider.short_name(), provider.display_name());
    }
    Ok(())
}

/// Local configuration: files in order, then `-D` overrides
fn load(input: &cli::InputArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    for file_path in &input.files {
        let file = Config::load_file(file_path)
            .with_context(|| format!("Failed to load {}", file_path.display()))?;
        config = file.with_fallback(&config);
    }

    for assignment in &input.overrides {
        let Some((key, value)) = assignment.split_once('=') else {
            anyhow::bail!("expected KEY=VALUE, got `{assignment}`");
        };

        let mut setting = Config::default();
        setting.set(&key.trim().into(), remote_config::value::Value::interpret(value));
        config = setting.with_fallback(&config);
    }

    Ok(config)
}

fn output(output: &cli::OutputArgs, config: &Config) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), config)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), config)?,
        cli::OutputFormat::Conf => print!("{}", config.to_config_text()),
    };

    Ok(())
}
