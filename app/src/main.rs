use idg_core::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "incident_demo=info,idg_core=info,idg_ai=info,idg_dispatch=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };
    tracing::debug!(
        storage_root = %config.storage.root.display(),
        model = %config.generation.model,
        parse_mode = %config.batch_parse_mode,
        "loaded configuration"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    std::process::exit(incident_demo_lib::run(&config, &args));
}
