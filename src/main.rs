use std::time::Duration;

use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "fairring")]
struct Opt {
    /// Unique peer ID
    #[structopt(short = "i", long = "id")]
    id: usize,

    /// Address to listen on for remote calls
    #[structopt(short = "a", long = "address")]
    address: String,

    /// Track finished requesters and report elapsed time
    #[structopt(short = "c", long = "coordinator")]
    coordinator: bool,

    /// Coordinator address for finished notifications
    #[structopt(short = "n", long = "notify")]
    notify: Option<String>,

    /// Simulated processing time per hop (in milliseconds)
    #[structopt(long = "hop-delay", default_value = "1000")]
    hop_delay: u64,

    /// Simulated critical-section duration (in milliseconds)
    #[structopt(long = "section", default_value = "2000")]
    section: u64,

    /// Logging verbosity
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();

    fairring::logging::init(opt.verbose)
        .expect("[INTERNAL ERROR]: logger already initialized");

    let mut config = fairring::Config::new(opt.id, opt.address)
        .coordinator(opt.coordinator)
        .with_hop_delay(Duration::from_millis(opt.hop_delay))
        .with_section(Duration::from_millis(opt.section));

    if let Some(notify) = opt.notify {
        config = config.with_notify(notify);
    }

    if let Err(error) = config.run().await {
        log::error!("{}: could not start listening: {}", opt.id, error);
        std::process::exit(1);
    }
}
