use std::collections::VecDeque;

use outbox::{
    client::{ApiTransport, OutboundRequest, SendOutcome, TransportError},
    record::MutationRecord,
    replay::{RecordOutcome, replay_pass},
    types::Method,
};

struct ScriptedTransport {
    script: VecDeque<Result<u16, TransportError>>,
    seen: Vec<OutboundRequest>,
}

impl ScriptedTransport {
    fn new(script: impl IntoIterator<Item = Result<u16, TransportError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            seen: Vec::new(),
        }
    }
}

impl ApiTransport for ScriptedTransport {
    fn send(&mut self, request: &OutboundRequest) -> Result<SendOutcome, TransportError> {
        self.seen.push(request.clone());
        match self.script.pop_front().unwrap_or(Ok(200)) {
            Ok(status) => Ok(SendOutcome { status }),
            Err(err) => Err(err),
        }
    }
}

fn record(target: &str, payload: serde_json::Value) -> MutationRecord {
    MutationRecord::new(Method::Put, target, Some(payload))
}

#[test]
fn requests_fire_in_enqueue_order() {
    let records = vec![
        record("/workouts", serde_json::json!({"n": 1})),
        record("/water", serde_json::json!({"n": 2})),
        record("/auth/me", serde_json::json!({"n": 3})),
    ];
    let mut transport = ScriptedTransport::new([Ok(200), Ok(201), Ok(204)]);

    let outcome = replay_pass(records.clone(), &mut transport, "tok", 0);

    let seen: Vec<&str> = transport.seen.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(seen, vec!["/workouts", "/water", "/auth/me"]);
    assert!(outcome.retained.is_empty());
    assert!(
        outcome
            .outcomes
            .iter()
            .all(|(_, o)| matches!(o, RecordOutcome::Applied { .. }))
    );
}

#[test]
fn rejected_mutation_is_discarded_and_never_retried() {
    let records = vec![record("/auth/me", serde_json::json!({"bad": true}))];
    let mut transport = ScriptedTransport::new([Ok(400)]);

    let outcome = replay_pass(records, &mut transport, "tok", 0);
    assert!(outcome.retained.is_empty());
    assert_eq!(transport.seen.len(), 1);
    assert!(matches!(
        outcome.outcomes[0].1,
        RecordOutcome::Rejected { status: 400 }
    ));

    // Second run over the retained (empty) queue issues nothing.
    let second = replay_pass(outcome.retained, &mut transport, "tok", 0);
    assert_eq!(transport.seen.len(), 1);
    assert!(second.outcomes.is_empty());
}

#[test]
fn server_error_retains_record_with_identical_payload() {
    let payload = serde_json::json!({"name": "Alex", "sets": [5, 5, 5]});
    let records = vec![record("/workouts", payload.clone())];
    let before = serde_json::to_vec(&records[0].payload).expect("encode");

    let mut transport = ScriptedTransport::new([Ok(503)]);
    let outcome = replay_pass(records, &mut transport, "tok", 0);

    assert_eq!(outcome.retained.len(), 1);
    let after = serde_json::to_vec(&outcome.retained[0].payload).expect("encode");
    assert_eq!(before, after);
    assert_eq!(outcome.retained[0].attempts, 1);
}

#[test]
fn non_2xx_non_4xx_statuses_are_treated_as_transient() {
    // 1xx/3xx carry no confirmation that the mutation was applied, so they
    // are neither dropped as applied nor discarded as rejected.
    let records = vec![
        record("/a", serde_json::json!(1)),
        record("/b", serde_json::json!(2)),
    ];
    let mut transport = ScriptedTransport::new([Ok(304), Ok(100)]);

    let outcome = replay_pass(records, &mut transport, "tok", 0);
    assert_eq!(outcome.retained.len(), 2);
    assert!(
        outcome
            .outcomes
            .iter()
            .all(|(_, o)| matches!(o, RecordOutcome::Retained))
    );
}

#[test]
fn timeout_and_network_failures_retain() {
    let records = vec![
        record("/a", serde_json::json!(1)),
        record("/b", serde_json::json!(2)),
    ];
    let mut transport = ScriptedTransport::new([
        Err(TransportError::Timeout),
        Err(TransportError::Network("connection refused".to_string())),
    ]);

    let outcome = replay_pass(records, &mut transport, "tok", 0);
    assert_eq!(outcome.retained.len(), 2);
    assert_eq!(transport.seen.len(), 2);
}

#[test]
fn transient_failure_does_not_block_later_records() {
    let records = vec![
        record("/a", serde_json::json!(1)),
        record("/b", serde_json::json!(2)),
        record("/c", serde_json::json!(3)),
    ];
    let mut transport = ScriptedTransport::new([Ok(500), Ok(200), Ok(400)]);

    let outcome = replay_pass(records, &mut transport, "tok", 0);

    assert_eq!(transport.seen.len(), 3);
    assert_eq!(outcome.retained.len(), 1);
    assert_eq!(outcome.retained[0].target, "/a");
    assert!(matches!(outcome.outcomes[1].1, RecordOutcome::Applied { .. }));
    assert!(matches!(outcome.outcomes[2].1, RecordOutcome::Rejected { .. }));
}

#[test]
fn attempt_cap_expires_record() {
    let mut queue = vec![record("/a", serde_json::json!(1))];
    let mut transport =
        ScriptedTransport::new((0..3).map(|_| Ok(500)).collect::<Vec<_>>());

    for run in 0..3 {
        let outcome = replay_pass(queue, &mut transport, "tok", 3);
        queue = outcome.retained;
        if run < 2 {
            assert_eq!(queue.len(), 1, "run {run} should retain");
            assert_eq!(queue[0].attempts, (run + 1) as u32);
        } else {
            assert!(queue.is_empty(), "third failure hits the cap");
            assert!(matches!(outcome.outcomes[0].1, RecordOutcome::Expired));
        }
    }
    assert_eq!(transport.seen.len(), 3);
}

#[test]
fn uncapped_record_retries_indefinitely() {
    let mut queue = vec![record("/a", serde_json::json!(1))];
    let mut transport =
        ScriptedTransport::new((0..20).map(|_| Ok(500)).collect::<Vec<_>>());

    for _ in 0..20 {
        queue = replay_pass(queue, &mut transport, "tok", 0).retained;
    }
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].attempts, 20);
}

#[test]
fn crash_before_save_redelivers_applied_request() {
    // The pass itself is pure; persistence happens after. Simulate a crash
    // between the two by discarding the pass result and replaying the same
    // loaded snapshot, as the next trigger would.
    let records = vec![record("/workouts", serde_json::json!({"reps": 10}))];
    let mut transport = ScriptedTransport::new([Ok(200), Ok(200)]);

    let first = replay_pass(records.clone(), &mut transport, "tok", 0);
    assert!(first.retained.is_empty());

    // Crash: `retained` never saved, so the old snapshot is what loads next.
    let second = replay_pass(records, &mut transport, "tok", 0);
    assert!(second.retained.is_empty());
    assert_eq!(transport.seen.len(), 2, "at-least-once delivery");
    assert_eq!(transport.seen[0], transport.seen[1]);
}

#[test]
fn bearer_token_rides_every_request() {
    let records = vec![
        record("/a", serde_json::json!(1)),
        record("/b", serde_json::json!(2)),
    ];
    let mut transport = ScriptedTransport::new([Ok(200), Ok(200)]);
    let _ = replay_pass(records, &mut transport, "secret-tok", 0);

    assert!(transport.seen.iter().all(|r| r.bearer == "secret-tok"));
}
