mod flags;
mod site;

use tracing_subscriber::EnvFilter;

pub fn main() {
    let flags = flags::Refract::from_env_or_exit();
    let filter = match flags.verbose {
        true => EnvFilter::new("info"),
        false => EnvFilter::from_default_env(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(prism::Error::from)
        .and_then(|runtime| runtime.block_on(site::build(flags)));

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
