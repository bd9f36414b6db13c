use kiln::AppConfig;

fn main() {
    env_logger::init();

    let mut config = AppConfig::new();
    if let Some(arg) = std::env::args().nth(1) {
        match kiln::parse_stage_arg(&arg) {
            Ok(stage) => config = config.stage(stage),
            Err(e) => {
                log::error!("{}", e);
                eprintln!("usage: kiln [1-4]");
                std::process::exit(2);
            }
        }
    }

    if let Err(e) = kiln::run_with_config(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
