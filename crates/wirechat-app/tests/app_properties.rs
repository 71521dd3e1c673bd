//! Property-based tests for the connection controller.
//!
//! Tests verify that invariants hold under arbitrary event sequences.
//! This ensures behavioral correctness across all possible execution paths.

use std::collections::BTreeSet;

use proptest::prelude::*;
use wirechat_app::{
    App, AppAction, AppConfig, AppEvent, CloseCause, Endpoint, HandleId, KeyInput, LinkEvent,
    LinkState, Phase,
    command::{self, Command},
};

/// Generate well-formed absolute URLs.
fn url_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("ws"), Just("wss"), Just("http"), Just("https")],
        "[a-z]{1,10}(\\.[a-z]{2,5})?",
        proptest::option::of(1u16..),
        "(/[a-z0-9]{0,8}){0,3}",
    )
        .prop_map(|(scheme, host, port, path)| match port {
            Some(port) => format!("{scheme}://{host}:{port}{path}"),
            None => format!("{scheme}://{host}{path}"),
        })
}

fn handle_strategy() -> impl Strategy<Value = HandleId> {
    (1u64..5).prop_map(HandleId::new)
}

fn cause_strategy() -> impl Strategy<Value = CloseCause> {
    prop_oneof![
        Just(CloseCause::Remote),
        "[a-z ]{0,12}".prop_map(CloseCause::Error),
    ]
}

/// Generate random app events, including notifications for stale handles.
fn event_strategy() -> impl Strategy<Value = AppEvent> {
    prop_oneof![
        1 => Just(AppEvent::Tick),
        1 => (1u16..200, 1u16..100).prop_map(|(c, r)| AppEvent::Resize(c, r)),
        2 => url_strategy().prop_map(AppEvent::Line),
        3 => "[A-Za-z ]{0,8}".prop_map(AppEvent::Line),
        1 => Just(AppEvent::Line("--exit".into())),
        1 => Just(AppEvent::Exit),
        1 => Just(AppEvent::Key(KeyInput::Enter)),
        1 => proptest::char::range('a', 'z').prop_map(|c| AppEvent::Key(KeyInput::Char(c))),
        3 => handle_strategy().prop_map(|handle| AppEvent::Link(LinkEvent::Opened { handle })),
        3 => (handle_strategy(), "[a-z ]{0,8}")
            .prop_map(|(handle, text)| AppEvent::Link(LinkEvent::Received { handle, text })),
        1 => (handle_strategy(), "[a-z ]{0,8}").prop_map(|(handle, reason)| {
            AppEvent::Link(LinkEvent::Received { handle, text: format!("ERROR: {reason}") })
        }),
        1 => (handle_strategy(), cause_strategy())
            .prop_map(|(handle, cause)| AppEvent::Link(LinkEvent::Closed { handle, cause })),
        1 => handle_strategy()
            .prop_map(|handle| AppEvent::SetupFailed { handle, reason: "setup".into() }),
    ]
}

/// Phase, endpoint, identity and link agree with each other.
fn assert_consistent(app: &App) {
    match app.phase() {
        Phase::AwaitingEndpoint => {
            assert!(app.endpoint().is_none());
            assert!(app.identity().is_none());
            assert!(app.link().is_none());
        },
        Phase::AwaitingIdentity => {
            assert!(app.endpoint().is_some());
            if let Some(link) = app.link() {
                assert!(app.identity().is_some());
                assert_ne!(link.state, LinkState::Accepted);
            }
        },
        Phase::Chatting => {
            assert!(app.endpoint().is_some());
            assert!(app.identity().is_some());
            assert_eq!(app.link().map(|l| l.state), Some(LinkState::Accepted));
        },
    }
}

/// `true` if the event may legitimately clear the transcript.
fn is_exit(event: &AppEvent) -> bool {
    match event {
        AppEvent::Exit | AppEvent::Quit => true,
        AppEvent::Line(line) => command::parse(line) == Command::Exit,
        _ => false,
    }
}

proptest! {
    #[test]
    fn prop_well_formed_url_advances(url in url_strategy()) {
        let mut app = App::default();
        let _ = app.submit_line(&url);

        prop_assert_eq!(app.phase(), Phase::AwaitingIdentity);
        let expected = Endpoint::parse(&url).expect("generated URL is valid");
        prop_assert_eq!(app.endpoint(), Some(&expected));
    }

    #[test]
    fn prop_scheme_less_input_is_rejected(input in "[a-z. ]{0,20}") {
        let mut app = App::default();
        let _ = app.submit_line(&input);

        prop_assert_eq!(app.phase(), Phase::AwaitingEndpoint);
        prop_assert!(app.endpoint().is_none());
        prop_assert!(app.notice().is_some());
    }

    #[test]
    fn prop_chat_lines_are_echoed_and_sent_once(lines in prop::collection::vec("[a-z]{1,10}", 1..20)) {
        let mut app = App::default();
        let _ = app.submit_line("ws://peer");
        let actions = app.submit_line("Ana");
        let handle = actions
            .iter()
            .find_map(|a| match a {
                AppAction::Open { handle, .. } => Some(*handle),
                _ => None,
            })
            .expect("identity opens a handle");
        let _ = app.handle(AppEvent::Link(LinkEvent::Opened { handle }));
        let _ = app.handle(AppEvent::Link(LinkEvent::Received { handle, text: "ok".into() }));

        for line in &lines {
            let actions = app.submit_line(line);
            let sends: Vec<_> = actions
                .iter()
                .filter(|a| matches!(a, AppAction::Send { .. }))
                .collect();
            let expected_send = AppAction::Send { handle, text: line.clone() };
            prop_assert_eq!(sends, vec![&expected_send]);
        }

        let expected: Vec<String> = lines.iter().map(|l| format!("Ana: {l}")).collect();
        prop_assert_eq!(app.transcript().lines(), expected.as_slice());
    }

    #[test]
    fn prop_inbound_lines_kept_in_order(
        before in prop::collection::vec("[a-z]{1,10}", 0..5),
        inbound in prop::collection::vec(".{0,20}", 0..30),
    ) {
        let mut app = App::default();
        let _ = app.submit_line("wss://peer");
        let _ = app.submit_line("Ana");
        let handle = app.current_handle().expect("handle opened");
        let _ = app.handle(AppEvent::Link(LinkEvent::Opened { handle }));
        let _ = app.handle(AppEvent::Link(LinkEvent::Received { handle, text: "ok".into() }));
        for line in &before {
            let _ = app.submit_line(line);
        }
        let prefix = app.transcript().len();

        for text in &inbound {
            let _ = app.handle(AppEvent::Link(LinkEvent::Received { handle, text: text.clone() }));
        }

        prop_assert_eq!(&app.transcript().lines()[prefix..], inbound.as_slice());
        prop_assert_eq!(app.phase(), Phase::Chatting);
    }

    #[test]
    fn prop_arbitrary_events_preserve_invariants(
        events in prop::collection::vec(event_strategy(), 0..80),
    ) {
        let mut app = App::new(AppConfig::default());
        let mut live: BTreeSet<HandleId> = BTreeSet::new();

        for event in events {
            let before = app.transcript().clone();
            let was_exit = is_exit(&event);

            match &event {
                AppEvent::Link(LinkEvent::Closed { handle, .. })
                | AppEvent::SetupFailed { handle, .. } => {
                    if app.current_handle() == Some(*handle) {
                        live.remove(handle);
                    }
                },
                _ => {},
            }

            for action in app.handle(event) {
                match action {
                    AppAction::Open { handle, .. } => {
                        live.insert(handle);
                    },
                    AppAction::Close { handle } => {
                        live.remove(&handle);
                    },
                    AppAction::Send { .. } | AppAction::Render | AppAction::Quit => {},
                }
            }

            // At most one live handle, and it is the one the controller owns
            prop_assert!(live.len() <= 1, "live handles: {:?}", live);
            if let Some(handle) = live.iter().next() {
                prop_assert_eq!(app.current_handle(), Some(*handle));
            }

            assert_consistent(&app);

            if !was_exit {
                prop_assert!(app.transcript().lines().starts_with(before.lines()));
            }
        }
    }

    #[test]
    fn prop_close_of_owned_handle_resets(
        events in prop::collection::vec(event_strategy(), 0..40),
        cause in cause_strategy(),
    ) {
        let mut app = App::default();
        for event in events {
            let _ = app.handle(event);
        }

        if let Some(handle) = app.current_handle() {
            let _ = app.handle(AppEvent::Link(LinkEvent::Closed { handle, cause }));

            prop_assert_eq!(app.phase(), Phase::AwaitingEndpoint);
            prop_assert!(app.endpoint().is_none());
            prop_assert!(app.identity().is_none());
            prop_assert!(app.link().is_none());
        }
    }

    #[test]
    fn prop_exit_is_idempotent(events in prop::collection::vec(event_strategy(), 0..40)) {
        let mut app = App::default();
        for event in events {
            let _ = app.handle(event);
        }

        let _ = app.exit();
        let once = app.clone();
        let second = app.exit();

        prop_assert_eq!(second, vec![AppAction::Render]);
        prop_assert_eq!(app.phase(), Phase::AwaitingEndpoint);
        prop_assert!(app.transcript().is_empty());
        prop_assert!(app.link().is_none());
        prop_assert_eq!(app.phase(), once.phase());
        prop_assert_eq!(app.transcript(), once.transcript());
    }
}
