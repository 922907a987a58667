use clap::Parser;
use pipedis::config::Config;
use pipedis::{server, Error};

fn main() -> Result<(), Error> {
    let config = Config::parse();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers.max(1))
        .enable_all()
        .build()?
        .block_on(server::run(config))
}
