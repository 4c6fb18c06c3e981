use super::*;

use chrono::TimeDelta;
use proptest::prelude::*;

const ME: OwnerId = OwnerId(1234);
const OTHER: OwnerId = OwnerId(1334);

fn ts(s: &str) -> Timestamp {
    parse_timestamp(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn request(start: &str, end: &str) -> ReservationRequest {
    ReservationRequest {
        name: "Sala".into(),
        start: start.into(),
        end: end.into(),
        created_by: Some(ME),
    }
}

fn reservation(id: u64, start: &str, end: &str) -> Reservation {
    Reservation {
        id: ReservationId(id),
        name: format!("r{id}"),
        span: Span::new(ts(start), ts(end)),
        created_by: OTHER,
    }
}

fn morning() -> Vec<Reservation> {
    vec![reservation(1, "2025-05-01 09:00", "2025-05-01 10:00")]
}

const NOW: &str = "2025-05-01 08:00";

// ── Pure admission ───────────────────────────────────────

#[test]
fn successful_booking() {
    let ids = SequentialIds::after(&morning()).unwrap();
    let r = propose_reservation(
        &request("2025-05-01 11:00", "2025-05-01 12:00"),
        &morning(),
        ts(NOW),
        &ids,
    )
    .unwrap();
    assert_eq!(r.id, ReservationId(2));
    assert_eq!(r.span, Span::new(ts("2025-05-01 11:00"), ts("2025-05-01 12:00")));
    assert_eq!(r.created_by, ME);
    assert_eq!(r.name, "Sala");
}

#[test]
fn conflicting_booking_reports_existing_id() {
    let result = admit(&request("2025-05-01 09:30", "2025-05-01 10:30"), &morning(), ts(NOW));
    assert_eq!(result, Err(AdmissionError::Conflict(ReservationId(1))));
}

#[test]
fn contained_booking_conflicts() {
    let existing = vec![reservation(1, "2025-05-01 09:00", "2025-05-01 12:00")];
    let result = admit(&request("2025-05-01 10:00", "2025-05-01 11:00"), &existing, ts(NOW));
    assert_eq!(result, Err(AdmissionError::Conflict(ReservationId(1))));
}

#[test]
fn touching_booking_is_admitted() {
    assert!(admit(&request("2025-05-01 10:00", "2025-05-01 11:00"), &morning(), ts(NOW)).is_ok());
    assert!(admit(&request("2025-05-01 08:00", "2025-05-01 09:00"), &morning(), ts(NOW)).is_ok());
}

#[test]
fn conflict_reports_first_in_input_order() {
    let existing = vec![
        reservation(7, "2025-05-01 10:00", "2025-05-01 11:00"),
        reservation(3, "2025-05-01 09:00", "2025-05-01 10:00"),
    ];
    let result = admit(&request("2025-05-01 09:30", "2025-05-01 10:30"), &existing, ts(NOW));
    assert_eq!(result, Err(AdmissionError::Conflict(ReservationId(7))));
}

#[test]
fn past_booking_rejected() {
    let now = ts("2025-05-02 08:00");
    let result = admit(&request("2025-05-01 09:00", "2025-05-01 10:00"), &[], now);
    assert_eq!(result, Err(AdmissionError::PastStart));
}

#[test]
fn start_exactly_now_is_admitted() {
    let result = admit(&request(NOW, "2025-05-01 08:30"), &[], ts(NOW));
    assert!(result.is_ok());
}

#[test]
fn end_before_start_rejected() {
    let result = admit(&request("2025-05-01 10:00", "2025-05-01 09:00"), &[], ts(NOW));
    assert_eq!(result, Err(AdmissionError::InvalidOrder));
}

#[test]
fn zero_length_rejected() {
    let result = admit(&request("2025-05-01 10:00", "2025-05-01 10:00"), &[], ts(NOW));
    assert_eq!(result, Err(AdmissionError::InvalidOrder));
}

#[test]
fn order_checked_before_past() {
    // Both reversed and in the past: the order failure wins.
    let result = admit(
        &request("2025-04-01 10:00", "2025-04-01 09:00"),
        &[],
        ts(NOW),
    );
    assert_eq!(result, Err(AdmissionError::InvalidOrder));
}

#[test]
fn past_checked_before_conflict() {
    let existing = vec![reservation(1, "2025-05-01 07:00", "2025-05-01 09:00")];
    let result = admit(&request("2025-05-01 07:30", "2025-05-01 08:30"), &existing, ts(NOW));
    assert_eq!(result, Err(AdmissionError::PastStart));
}

#[test]
fn malformed_fields() {
    let mut r = request("2025-05-01 11:00", "2025-05-01 12:00");
    r.name = "   ".into();
    assert_eq!(admit(&r, &[], ts(NOW)), Err(AdmissionError::MalformedInput("name")));

    let r = request("not a time", "2025-05-01 12:00");
    assert_eq!(admit(&r, &[], ts(NOW)), Err(AdmissionError::MalformedInput("start")));

    let r = request("2025-05-01 11:00", "");
    assert_eq!(admit(&r, &[], ts(NOW)), Err(AdmissionError::MalformedInput("end")));

    let mut r = request("2025-05-01 11:00", "2025-05-01 12:00");
    r.created_by = None;
    assert_eq!(admit(&r, &[], ts(NOW)), Err(AdmissionError::MalformedInput("createdBy")));
}

#[test]
fn malformed_checked_before_order() {
    let mut r = request("2025-05-01 12:00", "2025-05-01 11:00");
    r.name.clear();
    assert_eq!(admit(&r, &[], ts(NOW)), Err(AdmissionError::MalformedInput("name")));
}

#[test]
fn empty_request_is_malformed() {
    let result = admit(&ReservationRequest::default(), &morning(), ts(NOW));
    assert!(matches!(result, Err(AdmissionError::MalformedInput(_))));
}

#[test]
fn admission_is_deterministic() {
    let candidates = [
        request("2025-05-01 11:00", "2025-05-01 12:00"),
        request("2025-05-01 09:30", "2025-05-01 10:30"),
        request("2025-04-30 11:00", "2025-04-30 12:00"),
    ];
    for candidate in &candidates {
        let first = admit(candidate, &morning(), ts(NOW));
        for _ in 0..3 {
            assert_eq!(admit(candidate, &morning(), ts(NOW)), first);
        }
    }
}

#[test]
fn rejected_proposal_consumes_no_id() {
    let ids = SequentialIds::starting_at(10);
    let _ = propose_reservation(
        &request("2025-05-01 09:30", "2025-05-01 10:30"),
        &morning(),
        ts(NOW),
        &ids,
    );
    assert_eq!(ids.next_id(), ReservationId(10));
}

#[test]
fn remove_unknown_id() {
    let store = morning();
    assert_eq!(
        remove_reservation(ReservationId(999), &store),
        Err(AdmissionError::NotFound(ReservationId(999)))
    );
    assert_eq!(store, morning());
}

#[test]
fn remove_known_id() {
    assert_eq!(remove_reservation(ReservationId(1), &morning()), Ok(ReservationId(1)));
}

#[test]
fn sequential_ids_continue_after_seed() {
    let seed = vec![
        reservation(4, "2025-05-01 09:00", "2025-05-01 10:00"),
        reservation(2, "2025-05-01 11:00", "2025-05-01 12:00"),
    ];
    let ids = SequentialIds::after(&seed).unwrap();
    assert_eq!(ids.next_id(), ReservationId(5));
    assert_eq!(ids.next_id(), ReservationId(6));
    assert_eq!(SequentialIds::after(&[]).unwrap().next_id(), ReservationId(1));
}

#[test]
fn sequential_ids_exhausted_at_max_seed() {
    let seed = vec![reservation(u64::MAX, "2025-05-01 09:00", "2025-05-01 10:00")];
    assert!(SequentialIds::after(&seed).is_none());
    assert!(matches!(
        Scheduler::in_memory(seed),
        Err(StoreError::IdsExhausted)
    ));

    let seed = vec![reservation(u64::MAX - 1, "2025-05-01 09:00", "2025-05-01 10:00")];
    let ids = SequentialIds::after(&seed).unwrap();
    assert_eq!(ids.next_id(), ReservationId(u64::MAX));
}

// ── Scheduler ────────────────────────────────────────────

#[tokio::test]
async fn scheduler_books_and_lists() {
    let scheduler = Scheduler::in_memory(morning()).unwrap();
    let r = scheduler
        .book(&request("2025-05-01 11:00", "2025-05-01 12:00"), ts(NOW))
        .await
        .unwrap();
    assert_eq!(r.id, ReservationId(2));

    let all = scheduler.reservations().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(!all[0].span.overlaps(&all[1].span));
}

#[tokio::test]
async fn scheduler_conflict_leaves_store_unchanged() {
    let scheduler = Scheduler::in_memory(morning()).unwrap();
    let err = scheduler
        .book(&request("2025-05-01 09:30", "2025-05-01 10:30"), ts(NOW))
        .await
        .unwrap_err();
    assert_eq!(err, AdmissionError::Conflict(ReservationId(1)));
    assert_eq!(scheduler.reservations().await.unwrap(), morning());
}

#[tokio::test]
async fn scheduler_cancel_and_unknown() {
    let scheduler = Scheduler::in_memory(morning()).unwrap();
    assert_eq!(scheduler.cancel(ReservationId(1)).await, Ok(ReservationId(1)));
    assert!(scheduler.reservations().await.unwrap().is_empty());
    assert_eq!(
        scheduler.cancel(ReservationId(1)).await,
        Err(AdmissionError::NotFound(ReservationId(1)))
    );
}

#[tokio::test]
async fn scheduler_never_reuses_ids() {
    let scheduler = Scheduler::in_memory(vec![]).unwrap();
    let a = scheduler
        .book(&request("2025-05-01 09:00", "2025-05-01 10:00"), ts(NOW))
        .await
        .unwrap();
    scheduler.cancel(a.id).await.unwrap();
    let b = scheduler
        .book(&request("2025-05-01 09:00", "2025-05-01 10:00"), ts(NOW))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn scheduler_publishes_events() {
    let scheduler = Scheduler::in_memory(vec![]).unwrap();
    let mut rx = scheduler.notify().subscribe();

    let r = scheduler
        .book(&request("2025-05-01 09:00", "2025-05-01 10:00"), ts(NOW))
        .await
        .unwrap();
    assert_eq!(
        rx.recv().await.unwrap(),
        ReservationEvent::Created { reservation: r.clone() }
    );

    // Rejections publish nothing.
    let _ = scheduler
        .book(&request("2025-05-01 09:00", "2025-05-01 10:00"), ts(NOW))
        .await;
    scheduler.cancel(r.id).await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), ReservationEvent::Removed { id: r.id });
}

#[tokio::test]
async fn scheduler_day_view() {
    let seed = vec![
        reservation(1, "2025-05-01 09:00", "2025-05-01 10:00"),
        reservation(2, "2025-05-02 11:00", "2025-05-02 12:00"),
    ];
    let scheduler = Scheduler::in_memory(seed).unwrap();
    scheduler
        .book(&request("2025-05-01 14:00", "2025-05-01 15:00"), ts(NOW))
        .await
        .unwrap();

    let view = scheduler
        .day_view(date("2025-05-01"), SortDirection::Ascending, ME)
        .await
        .unwrap();
    let ids: Vec<u64> = view.rows.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(view.timeline[0].token, crate::view::StyleToken::Reserved);
    assert_eq!(view.timeline[1].token, crate::view::StyleToken::MyReservation);
}

#[tokio::test]
async fn scheduler_concurrent_same_slot_admits_one() {
    let scheduler = Arc::new(Scheduler::in_memory(vec![]).unwrap());
    let mut handles = Vec::new();
    for _ in 0..16 {
        let s = scheduler.clone();
        handles.push(tokio::spawn(async move {
            s.book(&request("2025-05-01 09:00", "2025-05-01 10:00"), ts(NOW))
                .await
        }));
    }
    let mut ok = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AdmissionError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(scheduler.reservations().await.unwrap().len(), 1);
}

#[test]
fn scheduler_rejects_overlapping_seed() {
    let seed = vec![
        reservation(1, "2025-05-01 09:00", "2025-05-01 10:00"),
        reservation(2, "2025-05-01 09:30", "2025-05-01 11:00"),
    ];
    assert!(matches!(
        Scheduler::in_memory(seed),
        Err(StoreError::Conflict(ReservationId(1)))
    ));
}

// ── Store invariant under random operation sequences ─────

#[derive(Debug, Clone)]
enum Op {
    Book { start_min: i64, len_min: i64 },
    Cancel { pick: usize },
    CancelUnknown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..24 * 60, 1i64..180).prop_map(|(start_min, len_min)| Op::Book { start_min, len_min }),
        2 => (0usize..32).prop_map(|pick| Op::Cancel { pick }),
        1 => Just(Op::CancelUnknown),
    ]
}

fn assert_no_overlap(store: &[Reservation]) {
    for (i, a) in store.iter().enumerate() {
        for b in &store[i + 1..] {
            assert!(!a.span.overlaps(&b.span), "{} overlaps {}", a.span, b.span);
            assert_ne!(a.id, b.id);
        }
    }
}

proptest! {
    #[test]
    fn store_never_holds_overlaps(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let base = ts("2030-01-01 00:00");
        let ids = SequentialIds::default();
        let mut store: Vec<Reservation> = Vec::new();
        let mut issued = std::collections::HashSet::new();

        for op in ops {
            match op {
                Op::Book { start_min, len_min } => {
                    let start = base + TimeDelta::minutes(start_min);
                    let candidate = ReservationRequest::new(
                        "p",
                        Span::new(start, start + TimeDelta::minutes(len_min)),
                        ME,
                    );
                    let before = store.clone();
                    match propose_reservation(&candidate, &store, base, &ids) {
                        Ok(r) => {
                            prop_assert!(issued.insert(r.id));
                            store.push(r);
                        }
                        Err(AdmissionError::Conflict(id)) => {
                            prop_assert!(store.iter().any(|r| r.id == id));
                            prop_assert_eq!(&store, &before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
                Op::Cancel { pick } => {
                    if !store.is_empty() {
                        let id = store[pick % store.len()].id;
                        prop_assert_eq!(remove_reservation(id, &store), Ok(id));
                        store.retain(|r| r.id != id);
                    }
                }
                Op::CancelUnknown => {
                    let before = store.clone();
                    let unknown = ReservationId(u64::MAX);
                    prop_assert_eq!(
                        remove_reservation(unknown, &store),
                        Err(AdmissionError::NotFound(unknown))
                    );
                    prop_assert_eq!(&store, &before);
                }
            }
            assert_no_overlap(&store);
        }
    }

    #[test]
    fn overlap_is_symmetric(
        a_start in 0i64..1000, a_len in 1i64..200,
        b_start in 0i64..1000, b_len in 1i64..200,
    ) {
        let base = ts("2030-01-01 00:00");
        let a = Span::new(base + TimeDelta::minutes(a_start), base + TimeDelta::minutes(a_start + a_len));
        let b = Span::new(base + TimeDelta::minutes(b_start), base + TimeDelta::minutes(b_start + b_len));
        prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
    }
}
