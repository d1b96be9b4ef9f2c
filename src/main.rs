use clap::Parser;
use fail2ban_waf::*;
use log::{error, info};
use std::sync::Arc;

/// Feed one synthetic request through the inspection engine and print the
/// log records it would emit. Useful for developing the ban daemon's
/// filter expressions against the exact wire format.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML); defaults when absent
    #[arg(short, long)]
    config: Option<String>,

    /// Request method
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Raw request URI
    #[arg(short, long, default_value = "/")]
    uri: String,

    /// User-Agent header value
    #[arg(short = 'a', long, default_value = "")]
    user_agent: String,

    /// Referer header value
    #[arg(long)]
    referer: Option<String>,

    /// Client address
    #[arg(long, default_value = "127.0.0.1")]
    remote_addr: String,

    /// Client port
    #[arg(long, default_value_t = 0)]
    remote_port: u16,

    /// Simulate an authentication attempt with this username
    #[arg(long)]
    username: Option<String>,

    /// Mark the request as arriving over XML-RPC
    #[arg(long)]
    xmlrpc: bool,

    /// Mark the request as authenticated
    #[arg(long)]
    authenticated: bool,

    /// Simulate the request resolving to no known resource
    #[arg(long)]
    not_found: bool,

    /// Simulate the canonical redirect resolver firing for this URL
    #[arg(long)]
    canonical_redirect: Option<String>,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GateConfig::from_file(path).unwrap_or_else(|e| {
            error!("Failed to load configuration from {}: {}", path, e);
            error!("Using default configuration");
            GateConfig::default()
        }),
        None => GateConfig::default(),
    };

    let engine = match Engine::new(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::new(sink.clone(), Arc::new(NoBan), &config.entry_point);

    let mut ctx = RequestContext::new(&args.method, &args.uri, &args.remote_addr, args.remote_port);
    ctx.user_agent = args.user_agent.clone();
    ctx.referer = args.referer.clone();
    ctx.authenticated = args.authenticated;
    if args.xmlrpc {
        ctx.transport = Transport::XmlRpc;
    }

    let mut events = vec![Event::RequestOpened, Event::RequestRouted];
    if let Some(username) = &args.username {
        events.push(Event::AuthAttempt {
            username: username.clone(),
        });
    }
    if let Some(url) = &args.canonical_redirect {
        events.push(Event::CanonicalRedirect {
            requested_url: url.clone(),
        });
    }
    if args.not_found {
        events.push(Event::NotFoundResolved);
    }

    let mut state = RequestState::new();
    let mut verdict = "request proceeds";

    for event in &events {
        let findings = engine.evaluate(event, &ctx, &mut state);
        match dispatcher.dispatch_all(&findings, &ctx, &mut state) {
            Outcome::Terminate(response) => {
                verdict = "terminated with 403";
                info!("termination response: {:?}", response.status());
                break;
            }
            Outcome::ShortCircuit(response) => {
                verdict = "short-circuited to minimal 404";
                info!("short-circuit response: {:?}", response.status());
            }
            Outcome::Continue => {}
        }
    }

    for line in sink.lines() {
        println!("{line}");
    }
    info!("verdict: {verdict}");
}
