//! End-to-end request scenarios: lifecycle events through the engine and
//! dispatcher, asserting the emitted wire records and response protocol.

use fail2ban_waf::*;
use http::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingBan {
    calls: AtomicUsize,
}

impl CountingBan {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl BanHook for CountingBan {
    fn ban(&self, _addr: &str) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    engine: Engine,
    dispatcher: Dispatcher,
    sink: Arc<MemorySink>,
    ban: Arc<CountingBan>,
}

fn harness(config: GateConfig) -> Harness {
    let engine = Engine::new(&config).unwrap();
    let sink = Arc::new(MemorySink::new());
    let ban = Arc::new(CountingBan::new());
    let dispatcher = Dispatcher::new(sink.clone(), ban.clone(), &config.entry_point);
    Harness {
        engine,
        dispatcher,
        sink,
        ban,
    }
}

fn run(h: &Harness, event: &Event, ctx: &RequestContext, state: &mut RequestState) -> Outcome {
    let findings = h.engine.evaluate(event, ctx, state);
    h.dispatcher.dispatch_all(&findings, ctx, state)
}

#[test]
fn test_head_probe_on_unresolved_path_gets_403_not_404() {
    let h = harness(GateConfig::default());
    let ctx = RequestContext::new("HEAD", "/no-such", "198.51.100.1", 40001);
    let mut state = RequestState::new();

    let outcome = run(&h, &Event::NotFoundResolved, &ctx, &mut state);

    match outcome {
        Outcome::Terminate(response) => assert_eq!(response.status(), StatusCode::FORBIDDEN),
        other => panic!("expected Terminate, got {other:?}"),
    }
    assert_eq!(h.ban.calls.load(Ordering::SeqCst), 1);
    let lines = h.sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Break-in attempt detected: 404_head"));
}

#[test]
fn test_googlebot_in_admin_dir_is_banned() {
    let h = harness(GateConfig::default());
    let mut ctx = RequestContext::new("GET", "/wp-admin/includes/foo", "198.51.100.2", 40002);
    ctx.user_agent = "Googlebot/2.1 (+http://www.google.com/bot.html)".to_string();
    let mut state = RequestState::new();

    let outcome = run(&h, &Event::RequestOpened, &ctx, &mut state);

    assert!(outcome.is_terminate());
    assert_eq!(h.ban.calls.load(Ordering::SeqCst), 1);
    assert!(h.sink.lines()[0].contains("robot_403"));
}

#[test]
fn test_browser_in_admin_dir_proceeds() {
    let h = harness(GateConfig::default());
    let mut ctx = RequestContext::new("GET", "/wp-admin/includes/foo", "198.51.100.3", 40003);
    ctx.user_agent = "Mozilla/5.0 (Windows NT 10.0)".to_string();
    let mut state = RequestState::new();

    let outcome = run(&h, &Event::RequestOpened, &ctx, &mut state);

    assert!(matches!(outcome, Outcome::Continue));
    assert!(h.sink.lines().is_empty());
    assert_eq!(h.ban.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_banned_username_fires_before_login_disabled() {
    let config = GateConfig {
        login_disabled: true,
        ..GateConfig::default()
    };
    let h = harness(config);
    let ctx = RequestContext::new("POST", "/wp-login.php", "198.51.100.4", 40004);
    let mut state = RequestState::new();

    let outcome = run(
        &h,
        &Event::AuthAttempt {
            username: "Admin".to_string(),
        },
        &ctx,
        &mut state,
    );

    assert!(outcome.is_terminate());
    let lines = h.sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("banned_username"));
    assert!(!lines.iter().any(|l| l.contains("login_disabled")));
}

#[test]
fn test_url_hack_suppresses_redirect_in_same_request() {
    let h = harness(GateConfig::default());
    let ctx = RequestContext::new("GET", "//evil.example/", "198.51.100.5", 40005);
    let mut state = RequestState::new();

    run(&h, &Event::RequestRouted, &ctx, &mut state);
    run(
        &h,
        &Event::CanonicalRedirect {
            requested_url: "//evil.example/".to_string(),
        },
        &ctx,
        &mut state,
    );

    let lines = h.sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("url_hack"));
}

#[test]
fn test_robot_404_short_circuits_but_does_not_ban() {
    let h = harness(GateConfig::default());
    let mut ctx = RequestContext::new("GET", "/gone", "198.51.100.6", 40006);
    ctx.user_agent = "curl/7.68.0".to_string();
    let mut state = RequestState::new();

    let outcome = run(&h, &Event::NotFoundResolved, &ctx, &mut state);

    match outcome {
        Outcome::ShortCircuit(response) => {
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(response.headers()["content-length"], "0");
        }
        other => panic!("expected ShortCircuit, got {other:?}"),
    }
    assert_eq!(h.ban.calls.load(Ordering::SeqCst), 0);
    assert!(!state.terminated);
}

#[test]
fn test_termination_stops_every_later_hook() {
    let h = harness(GateConfig::default());
    let mut ctx = RequestContext::new("POST", "/xmlrpc.php", "198.51.100.7", 40007);
    ctx.transport = Transport::XmlRpc;
    let mut state = RequestState::new();

    let outcome = run(
        &h,
        &Event::AuthAttempt {
            username: "alice".to_string(),
        },
        &ctx,
        &mut state,
    );
    assert!(outcome.is_terminate());

    // Subsequent hooks of the same request are dead.
    let outcome = run(&h, &Event::NotFoundResolved, &ctx, &mut state);
    assert!(matches!(outcome, Outcome::Continue));
    assert_eq!(h.sink.lines().len(), 1);
    assert_eq!(h.ban.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_ajax_override_chain_logs_then_calls_predecessor() {
    let h = harness(GateConfig::default());
    let chain = OverrideChain::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_handler = calls.clone();
    chain
        .register(
            Channel::Ajax,
            Box::new(move |message: &DieMessage, _: &str| {
                assert_eq!(message, &DieMessage::Code(-1));
                calls_in_handler.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    let ctx = RequestContext::new("POST", "/admin-ajax.php", "198.51.100.8", 40008);
    let mut state = RequestState::new();

    let outcome = chain.invoke(
        Channel::Ajax,
        &DieMessage::Code(-1),
        "",
        &h.engine,
        &h.dispatcher,
        &ctx,
        &mut state,
    );

    assert!(matches!(outcome, Outcome::Continue));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(h.sink.lines()[0].contains("wpdie_ajax"));
}

#[test]
fn test_record_layout_matches_daemon_contract() {
    let h = harness(GateConfig::default());
    let mut ctx = RequestContext::new("GET", "/gone", "192.0.2.200", 50123);
    ctx.user_agent = "Mozilla/5.0 (X11; Linux x86_64)".to_string();
    ctx.referer = Some("http://example.com/".to_string());
    let mut state = RequestState::new();

    run(&h, &Event::NotFoundResolved, &ctx, &mut state);

    assert_eq!(
        h.sink.lines()[0],
        "[info] [client 192.0.2.200:50123] Malicious traffic detected: 404 \
         (s:5:\"/gone\";), referer: (s:19:\"http://example.com/\";) <index.php"
    );
}
