use std::{
    fs,
    io::{self, Read, Write},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::prelude::*;
use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use gnss_mux::*;
use log::{info, warn};
use serialport::SerialPort;

/// Serial port as a [`Transport`], a read timeout means nothing arrived.
struct SerialLink(Box<dyn SerialPort>);

impl Transport for SerialLink {
    type Error = io::Error;

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.write_all(bytes)?;
        self.0.flush()
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}

fn print_event(event: &Event<'_>) {
    let now = Utc::now().format("%H:%M:%S%.3f");
    let records = event.records;
    match event.message {
        Message::Nmea(NmeaSentence::Gga) => {
            if let Some(gga) = &records.gga {
                println!("{} GGA {:?}", now, Position::from(gga));
            }
        },
        Message::Nmea(NmeaSentence::Rmc) => {
            if let Some(rmc) = &records.rmc {
                println!("{} RMC {:?}", now, Velocity::from(rmc));
            }
        },
        Message::Ubx {
            class: UBX_CLASS_CFG,
            id: UBX_CFG_ID_VALGET,
        } => {
            if let Some(resp) = event.cfg_val_get() {
                for (key, value) in resp.iter() {
                    println!("{} VALGET 0x{:08x} = {:02x?}", now, key.0, value);
                }
            }
        },
        Message::UnicoreBinary {
            message_id: UNICORE_MSG_BESTNAV,
        } => {
            if let Some(nav) = &records.best_nav {
                println!(
                    "{} BESTNAV {:?} {:?}",
                    now,
                    Position::from(nav),
                    Velocity::from(nav)
                );
            }
        },
        message => println!("{} {:?} ({} bytes)", now, message, event.frame.len()),
    }
}

/// `KEY=VALUE`, both decimal or `0x` hex. The value width follows the key.
fn parse_item(s: &str) -> Result<CfgItem> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", s))?;
    let key = parse_u32(key)?;
    let value = parse_u64(value)?;
    let size = KeyId(key)
        .value_size()
        .ok_or_else(|| anyhow!("key 0x{:08x} has a reserved size", key))?
        .to_usize();
    Ok(CfgItem::from_bytes(key, &value.to_le_bytes()[..size]))
}

fn parse_u64(s: &str) -> Result<u64> {
    let s = s.trim();
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .with_context(|| format!("invalid number {:?}", s))
}

fn parse_u32(s: &str) -> Result<u32> {
    Ok(u32::try_from(parse_u64(s)?)?)
}

fn parse_layers(matches: &ArgMatches) -> CfgLayerSet {
    let mut layers = CfgLayerSet::empty();
    for layer in matches.get_many::<String>("layer").into_iter().flatten() {
        match layer.as_str() {
            "ram" => layers |= CfgLayerSet::RAM,
            "bbr" => layers |= CfgLayerSet::BBR,
            "flash" => layers |= CfgLayerSet::FLASH,
            _ => {},
        }
    }
    if layers.is_empty() {
        CfgLayerSet::RAM
    } else {
        layers
    }
}

fn layer_arg() -> Arg {
    Arg::new("layer")
        .long("layer")
        .value_parser(["ram", "bbr", "flash"])
        .action(ArgAction::Append)
        .help("Configuration layer to write, may be repeated (default: ram)")
}

type Link = Session<SerialLink, StdClock>;

/// Feeds the link until the init sequence (or factory reset) leaves `Running`.
fn run_init(session: &mut Link) -> Result<()> {
    loop {
        session.poll(&mut print_event)?;
        match session.init_async_process() {
            InitState::Running => std::thread::sleep(Duration::from_millis(10)),
            InitState::Done => {
                info!("Init sequence done");
                return Ok(());
            },
            InitState::Error => {
                bail!("Init sequence failed at step {}", session.init_async_step())
            },
            InitState::Idle => return Ok(()),
        }
    }
}

/// Decodes a capture piped into stdin.
fn parse_stdin() -> Result<()> {
    let mut stdin = io::stdin().lock();
    let mut parser = Parser::default();
    let mut buf = [0u8; 4096];
    let mut frames = 0;
    loop {
        let n = stdin.read(&mut buf)?;
        if n == 0 {
            break;
        }
        frames += parser.feed(&buf[..n], &mut print_event);
    }
    info!("{} frames decoded", frames);
    Ok(())
}

fn report(result: std::result::Result<(), InitError>) {
    match result {
        Ok(()) => info!("Configuration applied"),
        Err(e) => warn!("{}", e),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command!()
        .about("Talks to a GNSS receiver speaking NMEA, UBX, Unicore and RTCM3")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Serial port to open, without it frames are read from stdin"),
        )
        .arg(
            Arg::new("baud")
                .short('s')
                .long("baud")
                .default_value("38400")
                .value_parser(value_parser!(u32))
                .help("Baud rate of the port"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .default_value("3000")
                .value_parser(value_parser!(u32))
                .help("ACK timeout in milliseconds"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("listen").about("Print every frame received"))
        .subcommand(
            Command::new("valset")
                .about("Write configuration items and wait for the ACK")
                .arg(
                    Arg::new("item")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("KEY=VALUE, e.g. 0x10740001=1"),
                )
                .arg(layer_arg()),
        )
        .subcommand(
            Command::new("valget")
                .about("Read configuration items from RAM")
                .arg(
                    Arg::new("key")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Key id, decimal or 0x hex"),
                ),
        )
        .subcommand(Command::new("factory-reset").about("Clear and reload the configuration"))
        .subcommand(
            Command::new("init")
                .about("Apply a JSON list of configuration items, one VALSET per item")
                .arg(Arg::new("file").required(true).help("JSON file"))
                .arg(layer_arg()),
        )
        .get_matches();

    let Some(port_name) = matches.get_one::<String>("port") else {
        if !matches!(matches.subcommand(), Some(("listen", _))) {
            bail!("--port is required to send commands");
        }
        return parse_stdin();
    };
    let baud = matches.get_one::<u32>("baud").copied().unwrap_or(38400);
    let timeout_ms = matches.get_one::<u32>("timeout").copied().unwrap_or(3000);

    let port = serialport::new(port_name, baud)
        .timeout(Duration::from_millis(10))
        .open()
        .with_context(|| format!("unable to open {}", port_name))?;
    info!("Opened {} at {} baud", port_name, baud);

    let config = SessionConfig {
        init: InitConfig {
            ack_timeout_ms: timeout_ms,
            ..InitConfig::default()
        },
        ..SessionConfig::default()
    };
    let mut session = Session::with_config(SerialLink(port), StdClock::new(), config);

    match matches.subcommand() {
        Some(("listen", _)) => loop {
            session.poll(&mut print_event)?;
            if let Some(gga) = session.last_gga() {
                log::trace!("{}", String::from_utf8_lossy(gga).trim_end());
            }
        },
        Some(("valset", sub)) => {
            let items = sub
                .get_many::<String>("item")
                .into_iter()
                .flatten()
                .map(|s| parse_item(s))
                .collect::<Result<Vec<_>>>()?;
            let builder = CfgValSetBuilder::new(parse_layers(sub), &items);
            if session.send_valset_sync(builder, timeout_ms, &mut print_event)? {
                info!("VALSET acknowledged");
            } else {
                bail!("VALSET rejected or timed out");
            }
        },
        Some(("valget", sub)) => {
            let keys = sub
                .get_many::<String>("key")
                .into_iter()
                .flatten()
                .map(|s| parse_u32(s))
                .collect::<Result<Vec<_>>>()?;
            session.send_valget(CfgValGetRequestBuilder::new(CfgLayerGet::Ram, &keys), None)?;
            if !session.wait_for_ack(timeout_ms, &mut print_event)? {
                bail!("VALGET rejected or timed out");
            }
        },
        Some(("factory-reset", _)) => {
            session.factory_reset(report)?;
            run_init(&mut session)?;
        },
        Some(("init", sub)) => {
            let file = sub
                .get_one::<String>("file")
                .ok_or_else(|| anyhow!("no file given"))?;
            let text = fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
            let items: Vec<CfgItem> = serde_json::from_str(&text)?;
            info!("Applying {} items", items.len());
            session.init_async_start(items, parse_layers(sub), report)?;
            run_init(&mut session)?;
        },
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}
