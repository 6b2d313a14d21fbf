use std::time::Duration;

use chordring_core::dht::Address;
use chordring_core::dht::ChordId;
use chordring_core::dht::ChordPeer;
use chordring_core::inspect::RingInspect;
use chordring_node::config;
use chordring_node::config::BootstrapConfig;
use chordring_node::logging::init_logging;
use chordring_node::logging::LogLevel;
use chordring_node::node::ChordNode;
use chordring_node::simulate::simulate;
use chordring_transport::RemotePeer;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, default_value_t = LogLevel::Info, value_enum, env)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    #[command(about = "Writes a default configuration file.")]
    Init(InitCommand),
    #[command(about = "Starts a long-running ring node.")]
    Run(RunCommand),
    #[command(about = "Asks a running node which node owns an identifier.")]
    Lookup(LookupCommand),
    #[command(about = "Shows successor, predecessor and finger table of a running node.")]
    Inspect(InspectCommand),
    #[command(about = "Checks that a node answers.")]
    Ping(PingCommand),
    #[command(about = "Builds an in-process ring by sequential joins and prints every node.")]
    Simulate(SimulateCommand),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(
        long,
        short = 'c',
        env,
        default_value = config::DEFAULT_CONFIG_LOCATION,
        help = "Config file location"
    )]
    pub config: String,
}

#[derive(Args, Debug)]
struct InitCommand {
    #[arg(
        long,
        default_value = config::DEFAULT_CONFIG_LOCATION,
        help = "The location of config file"
    )]
    pub location: String,

    #[arg(long, help = "Ring size written to the config file")]
    pub ring_bits: Option<u8>,
}

#[derive(Args, Debug)]
struct RunCommand {
    #[arg(
        long,
        short = 'b',
        help = "Listen address. If not provided, use bind_addr in config file",
        env
    )]
    pub bind_addr: Option<String>,

    #[arg(long, help = "Address announced to peers", env)]
    pub external_addr: Option<String>,

    #[arg(long, help = "Identifier of this node. Derived from the address if absent", env)]
    pub node_id: Option<u64>,

    #[arg(long, help = "Address of a ring member to join through", env)]
    pub bootstrap: Option<String>,

    #[arg(long, help = "Identifier of the bootstrap node, asked from it if absent")]
    pub bootstrap_id: Option<u64>,

    #[arg(long, help = "Ring size. Must match every other member", env)]
    pub ring_bits: Option<u8>,

    #[arg(
        long,
        help = "Start from defaults instead of reading the config file"
    )]
    pub no_config: bool,

    #[command(flatten)]
    config_args: ConfigArgs,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[arg(help = "Address of a running node, host:port")]
    endpoint: String,

    #[arg(long, default_value_t = config::DEFAULT_REQUEST_TIMEOUT_MS, help = "Request timeout in milliseconds")]
    timeout_ms: u64,
}

impl ClientArgs {
    fn peer(&self) -> anyhow::Result<RemotePeer> {
        let address: Address = self.endpoint.parse()?;
        Ok(RemotePeer::new(
            address,
            Duration::from_millis(self.timeout_ms),
        ))
    }
}

#[derive(Args, Debug)]
struct LookupCommand {
    #[command(flatten)]
    client_args: ClientArgs,

    #[arg(help = "Identifier to resolve")]
    id: u64,
}

#[derive(Args, Debug)]
struct InspectCommand {
    #[command(flatten)]
    client_args: ClientArgs,
}

#[derive(Args, Debug)]
struct PingCommand {
    #[command(flatten)]
    client_args: ClientArgs,
}

#[derive(Args, Debug)]
struct SimulateCommand {
    #[arg(long, short = 'm', default_value_t = chordring_core::consts::DEFAULT_RING_BITS, help = "Ring size")]
    bits: u8,

    #[arg(required = true, help = "Node identifiers, in join order")]
    ids: Vec<u64>,
}

fn get_value<V>(value: Option<V>, default_value: V) -> V {
    value.unwrap_or(default_value)
}

async fn daemon_run(args: RunCommand) -> anyhow::Result<()> {
    let c = if args.no_config {
        config::Config::default()
    } else {
        config::Config::read_fs(args.config_args.config.as_str())?
    };

    let bootstrap = match args.bootstrap {
        Some(address) => Some(BootstrapConfig {
            address,
            id: args.bootstrap_id,
        }),
        None => c.bootstrap.clone(),
    };
    let c = config::Config {
        bind_addr: get_value(args.bind_addr, c.bind_addr),
        external_addr: args.external_addr.or(c.external_addr),
        node_id: args.node_id.or(c.node_id),
        ring_bits: get_value(args.ring_bits, c.ring_bits),
        bootstrap,
        ..c
    };

    let node = ChordNode::start(c).await?;
    println!("Node: {}", node.instance().node());
    node.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Init(args) => {
            let mut config = config::Config::default();
            if let Some(bits) = args.ring_bits {
                config.ring_bits = bits;
            }
            config.validate()?;
            let p = config.write_fs(args.location.as_str())?;
            println!("Your config file has saved to: {}", p);
            Ok(())
        }
        Command::Run(args) => daemon_run(args).await,
        Command::Lookup(args) => {
            let peer = args.client_args.peer()?;
            let owner = peer.find_successor(ChordId(args.id)).await?;
            println!("{}", owner);
            Ok(())
        }
        Command::Inspect(args) => {
            let peer = args.client_args.peer()?;
            let inspect = RingInspect::inspect_peer(&peer).await?;
            println!("{}", serde_json::to_string_pretty(&inspect)?);
            Ok(())
        }
        Command::Ping(args) => {
            let peer = args.client_args.peer()?;
            let node = peer.get_node().await?;
            let alive = peer.is_alive().await?;
            println!("{} alive: {}", node, alive);
            Ok(())
        }
        Command::Simulate(args) => {
            for (inspect, finger) in simulate(args.bits, &args.ids).await? {
                println!("{}", serde_json::to_string_pretty(&inspect)?);
                println!("{}", finger);
            }
            Ok(())
        }
    }
}
