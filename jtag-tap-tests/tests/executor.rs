use jtag_tap::{
    Builder, Config, Error, Handler, MAX_CHUNK_BYTES_LIMIT, TapState, TransferMode, TransitionRequest,
};
use jtag_tap_tests::{Call, MockTransport};

fn handler() -> Handler<MockTransport> {
    Handler::initialize(MockTransport::new(), &Config::default()).unwrap()
}

#[test]
fn initialize_resets_then_enters_idle() {
    let config = Builder::new().frequency_hz(10_000_000).mode(TransferMode::Gpio).build();
    let mut handler = Handler::initialize(MockTransport::new(), &config).unwrap();
    assert_eq!(handler.current_state(), TapState::Idle);
    let transport = handler.release().unwrap();
    assert_eq!(
        transport.calls,
        vec![
            Call::SetFrequency(10_000_000),
            Call::SetMode(TransferMode::Gpio),
            Call::AdvanceState(TransitionRequest::goto(TapState::Reset)),
            Call::AdvanceState(TransitionRequest::goto(TapState::Idle)),
        ]
    );
}

#[test]
fn zero_frequency_is_not_sent() {
    let mut handler = handler();
    let transport = handler.release().unwrap();
    assert!(!transport.calls.iter().any(|c| matches!(c, Call::SetFrequency(_))));
}

#[test]
fn initialize_fails_on_any_configuration_error() {
    let transport = MockTransport {
        fail_mode: true,
        ..MockTransport::default()
    };
    assert!(matches!(
        Handler::initialize(transport, &Config::default()),
        Err(Error::Transport(_))
    ));

    let transport = MockTransport {
        fail_frequency: true,
        ..MockTransport::default()
    };
    let config = Builder::new().frequency_hz(1_000_000).build();
    assert!(Handler::initialize(transport, &config).is_err());

    let transport = MockTransport {
        fail_advance: true,
        ..MockTransport::default()
    };
    assert!(Handler::initialize(transport, &Config::default()).is_err());
}

#[test]
fn initialize_rejects_bad_chunk_size() {
    for size in [0, 3, 48, 2 * MAX_CHUNK_BYTES_LIMIT, usize::MAX / 2 + 1] {
        let config = Builder::new().max_chunk_bytes(size).build();
        assert!(matches!(
            Handler::initialize(MockTransport::new(), &config),
            Err(Error::InvalidConfig(_))
        ));
    }
}

#[test]
fn largest_chunk_size_is_accepted() {
    let config = Builder::new().max_chunk_bytes(MAX_CHUNK_BYTES_LIMIT).build();
    let handler = Handler::initialize(MockTransport::new(), &config).unwrap();
    assert_eq!(handler.max_chunk_bytes(), MAX_CHUNK_BYTES_LIMIT);
}

#[test]
fn set_tap_state_updates_cache_on_success() {
    let mut handler = handler();
    handler.set_tap_state(TapState::DrPause).unwrap();
    assert_eq!(handler.current_state(), TapState::DrPause);
}

#[test]
fn failed_transition_keeps_cached_state() {
    let transport = MockTransport {
        fail_advance_to: Some(TapState::IrPause),
        ..MockTransport::default()
    };
    let mut handler = Handler::initialize(transport, &Config::default()).unwrap();
    handler.set_tap_state(TapState::DrPause).unwrap();
    assert!(matches!(
        handler.set_tap_state(TapState::IrPause),
        Err(Error::Transport(_))
    ));
    assert_eq!(handler.current_state(), TapState::DrPause);
}

#[test]
fn failed_hold_keeps_cached_state() {
    let transport = MockTransport {
        fail_advance_to: Some(TapState::DrPause),
        ..MockTransport::default()
    };
    let mut handler = Handler::initialize(transport, &Config::default()).unwrap();
    assert!(handler.run_state(TapState::DrPause, 10).is_err());
    assert_eq!(handler.current_state(), TapState::Idle);
}

#[test]
fn handler_works_over_borrowed_transport() {
    let mut transport = MockTransport::new();
    {
        let mut handler = Handler::initialize(&mut transport, &Config::default()).unwrap();
        handler.set_tap_state(TapState::DrPause).unwrap();
    }
    assert_eq!(
        transport.transitions().last(),
        Some(&TransitionRequest::goto(TapState::DrPause))
    );
}

#[test]
fn invalid_target_state_is_rejected_without_transport_call() {
    let mut handler = handler();
    assert!(matches!(
        handler.set_tap_state(TapState::Invalid),
        Err(Error::InvalidState(TapState::Invalid))
    ));
    assert_eq!(handler.current_state(), TapState::Idle);
    let transport = handler.release().unwrap();
    assert_eq!(transport.transitions().len(), 2);
}

#[test]
fn released_handler_rejects_everything() {
    let mut handler = handler();
    assert!(handler.release().is_some());
    assert!(matches!(handler.set_tap_state(TapState::Reset), Err(Error::InvalidHandle)));
    assert!(matches!(handler.wait_cycles(5), Err(Error::InvalidHandle)));
    assert!(matches!(handler.run_state(TapState::Idle, 5), Err(Error::InvalidHandle)));
    assert!(matches!(
        handler.dr_scan(8, &[0], None, TapState::Idle),
        Err(Error::InvalidHandle)
    ));
    assert!(matches!(
        handler.ir_scan(8, &[0], None, TapState::Idle),
        Err(Error::InvalidHandle)
    ));
    assert!(handler.release().is_none());
}

#[test]
fn wait_cycles_uses_run_test_when_supported() {
    let transport = MockTransport {
        run_test_supported: true,
        ..MockTransport::default()
    };
    let mut handler = Handler::initialize(transport, &Config::default()).unwrap();
    handler.wait_cycles(100).unwrap();
    let transport = handler.release().unwrap();
    assert_eq!(transport.calls.last(), Some(&Call::RunTest(100)));
    assert_eq!(transport.transitions().len(), 2);
}

#[test]
fn wait_cycles_falls_back_to_holding_current_state() {
    let mut handler = handler();
    handler.set_tap_state(TapState::DrPause).unwrap();
    handler.wait_cycles(1000).unwrap();
    assert_eq!(handler.current_state(), TapState::DrPause);
    let transport = handler.release().unwrap();
    let n = transport.calls.len();
    assert_eq!(transport.calls[n - 2], Call::RunTest(1000));
    assert_eq!(
        transport.calls[n - 1],
        Call::AdvanceState(TransitionRequest::hold(TapState::DrPause, 1000))
    );
}
