use std::time::Duration;

use fairring::discovery::PeerTable;
use log::{error, info};
use structopt::StructOpt;

mod server;

use crate::server::{Common, Server};

#[derive(StructOpt)]
#[structopt(name = "harness")]
struct Opt {
    /// Discovery document mapping peer IDs to addresses
    #[structopt(short = "f", long = "nodes", default_value = "nodes-list.json")]
    nodes: std::path::PathBuf,

    /// Peers with an ID below this value request the critical section
    #[structopt(short = "r", long = "requesters")]
    requesters: usize,

    /// Peer that originates the token
    #[structopt(short = "o", long = "origin", default_value = "0")]
    origin: usize,

    /// Peer that tracks completion
    #[structopt(short = "c", long = "coordinator", default_value = "0")]
    coordinator: usize,

    /// Peer binary to spawn for every entry; omit to wire running peers
    #[structopt(short = "s", long = "server")]
    server: Option<std::path::PathBuf>,

    /// Time to let spawned peers bind (in milliseconds)
    #[structopt(short = "d", long = "delay", default_value = "500")]
    delay: u64,

    /// Per-hop delay of spawned peers (in milliseconds)
    #[structopt(long = "hop-delay", default_value = "1000")]
    hop_delay: u64,

    /// Critical-section duration of spawned peers (in milliseconds)
    #[structopt(long = "section", default_value = "2000")]
    section: u64,

    /// Logging verbosity, forwarded to spawned peers
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();

    fairring::logging::init(opt.verbose)
        .expect("[INTERNAL ERROR]: logger already initialized");

    let table = PeerTable::load(&opt.nodes);
    info!("loaded {} peers from {}", table.len(), opt.nodes.display());

    // Kept alive until ctrl-c
    let mut servers = Vec::new();

    if let Some(path) = &opt.server {
        let common = Common {
            notify: table.address(opt.coordinator).unwrap_or_default(),
            hop_delay: opt.hop_delay,
            section: opt.section,
            verbose: opt.verbose,
        };
        for id in table.ids() {
            let address = table.address(id).unwrap_or_default();
            match Server::new(path, id, address, id == opt.coordinator, &common) {
            | Ok(server) => servers.push(server),
            | Err(err) => {
                error!("could not spawn peer {}: {}", id, err);
                return
            }
            }
        }
        tokio::time::sleep(Duration::from_millis(opt.delay)).await;
    }

    if let Err(err) = fairring::bootstrap::wire(&table, opt.requesters, opt.origin).await {
        error!("wiring failed: {}", err);
        return
    }

    info!("ring wired, waiting for ctrl-c");
    tokio::signal::ctrl_c().await.ok();
}
