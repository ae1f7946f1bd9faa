use particle_field::{FieldBuilder, FieldConfig};

fn main() {
    // RUST_LOG=debug for per-frame detail
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match FieldConfig::load(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path);
                config
            }
            Err(e) => {
                log::error!("could not load {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => FieldConfig::default(),
    };

    if let Err(e) = FieldBuilder::new().with_config(config).run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
