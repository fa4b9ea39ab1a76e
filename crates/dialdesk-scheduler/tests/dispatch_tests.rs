// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher passes against a temp database and a scripted provider.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use dialdesk_core::{
    CallStatus, ContactId, DialdeskError, DialogRole, GroupId, StorageAdapter, TelephonyAdapter,
};
use dialdesk_scheduler::{
    CallCandidate, ContactInput, DispatchRunner, GroupInput, NumberOrText, TickSummary,
    WINDOW_ELAPSED,
};
use dialdesk_test_utils::{FailingDialogStorage, MockAnswer, TestHarness};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, 1, 9, 0, 0).unwrap()
}

fn at(offset_minutes: i64) -> String {
    (t0() + Duration::minutes(offset_minutes)).to_rfc3339()
}

async fn contact(harness: &TestHarness, name: &str, phone: &str) -> ContactId {
    harness
        .directory
        .create_contact(
            ContactInput {
                name: Some(name.to_string()),
                phone: Some(phone.to_string()),
                company: Some("Acme".to_string()),
                ..ContactInput::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap()
        .id
}

async fn group_of(harness: &TestHarness, members: &[ContactId]) -> GroupId {
    let group = harness
        .directory
        .create_group(
            &GroupInput {
                name: Some("Leads".to_string()),
                description: None,
            },
            t0(),
        )
        .await
        .unwrap();
    for member in members {
        harness.directory.add_member(group.id, *member).await.unwrap();
    }
    group.id
}

fn window_for_group(group: GroupId) -> CallCandidate {
    CallCandidate {
        group_id: Some(group.get()),
        call_type: Some("window".to_string()),
        start_time_window: Some(at(10)),
        end_time_window: Some(at(70)),
        ..CallCandidate::default()
    }
}

#[tokio::test]
async fn nothing_is_dispatched_before_it_is_due() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    harness
        .scheduler
        .create(
            CallCandidate {
                contact_id: Some(ada.get()),
                scheduled_time: Some(at(30)),
                ..CallCandidate::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap();

    let summary = harness.runner.tick(t0() + Duration::minutes(29)).await.unwrap();
    assert_eq!(summary, TickSummary::default());
    assert_eq!(harness.telephony.placed_count().await, 0);
}

#[tokio::test]
async fn individual_call_renders_script_and_records_dialog() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    let call = harness
        .scheduler
        .create(
            CallCandidate {
                contact_id: Some(ada.get()),
                scheduled_time: Some(at(30)),
                script: Some("Hi {{name}} from {{company}} {{unknown}}".to_string()),
                ..CallCandidate::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap();

    let now = t0() + Duration::minutes(30);
    let summary = harness.runner.tick(now).await.unwrap();
    assert_eq!(summary.due, 1);
    assert_eq!(summary.completed, 1);

    let placed = harness.telephony.placed().await;
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].phone, "+15550101");
    assert_eq!(placed[0].scheduled_call, Some(call.id()));
    assert_eq!(
        placed[0].script.as_deref(),
        Some("Hi Ada from Acme {{unknown}}")
    );

    let saved = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(saved.status(), CallStatus::Completed);
    assert_eq!(saved.call_attempts(), 1);
    assert_eq!(saved.last_attempt_at(), Some(now));

    let dialogs = harness.directory.dialogs(ada).await.unwrap();
    assert_eq!(dialogs.len(), 1);
    assert_eq!(dialogs[0].date, now);
    assert_eq!(dialogs[0].transcript.as_deref(), Some("Hello?"));

    // A completed call is never picked up again.
    let summary = harness.runner.tick(now + Duration::hours(1)).await.unwrap();
    assert_eq!(summary.due, 0);
}

#[tokio::test]
async fn failed_attempt_retries_on_the_fixed_interval() {
    let harness = TestHarness::builder()
        .with_answers(vec![
            MockAnswer::NoAnswer("busy".to_string()),
            MockAnswer::Error("provider down".to_string()),
        ])
        .build()
        .await
        .unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    let call = harness
        .scheduler
        .create(
            CallCandidate {
                contact_id: Some(ada.get()),
                scheduled_time: Some(at(5)),
                retry_until_success: Some(true),
                retry_interval: Some(NumberOrText::Number(30)),
                ..CallCandidate::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap();

    let first = t0() + Duration::minutes(5);
    assert_eq!(harness.runner.tick(first).await.unwrap().retrying, 1);
    let retrying = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(retrying.next_retry_at(), Some(first + Duration::minutes(30)));

    // Not due yet.
    assert_eq!(harness.runner.tick(first + Duration::minutes(29)).await.unwrap().due, 0);

    let second = first + Duration::minutes(30);
    assert_eq!(harness.runner.tick(second).await.unwrap().retrying, 1);

    let third = second + Duration::minutes(30);
    assert_eq!(harness.runner.tick(third).await.unwrap().completed, 1);

    let done = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(done.status(), CallStatus::Completed);
    assert_eq!(done.call_attempts(), 3);

    let dialogs = harness.directory.dialogs(ada).await.unwrap();
    assert_eq!(dialogs.len(), 3);
    assert!(
        dialogs
            .iter()
            .any(|d| d.messages[0].text == "Call not connected: busy")
    );
}

#[tokio::test]
async fn group_call_fans_out_over_current_members() {
    let harness = TestHarness::builder()
        .with_answers(vec![
            MockAnswer::NoAnswer("no answer".to_string()),
            MockAnswer::Answered,
        ])
        .build()
        .await
        .unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    let bob = contact(&harness, "Bob", "+15550102").await;
    let cy = contact(&harness, "Cy", "+15550103").await;
    let group = group_of(&harness, &[ada, bob]).await;

    let call = harness
        .scheduler
        .create(window_for_group(group), None, t0())
        .await
        .unwrap();

    // Membership changes after scheduling are honoured at dispatch time.
    harness.directory.remove_member(group, ada).await.unwrap();
    harness.directory.add_member(group, cy).await.unwrap();

    let summary = harness.runner.tick(t0() + Duration::minutes(15)).await.unwrap();
    assert_eq!(summary.completed, 1);

    let phones: Vec<_> = harness
        .telephony
        .placed()
        .await
        .into_iter()
        .map(|r| r.phone)
        .collect();
    assert_eq!(phones.len(), 2);
    assert!(phones.contains(&"+15550102".to_string()));
    assert!(phones.contains(&"+15550103".to_string()));

    // One schedule record, one attempt, one dialog per member called.
    let saved = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(saved.status(), CallStatus::Completed);
    assert_eq!(saved.call_attempts(), 1);
    assert!(harness.directory.dialogs(ada).await.unwrap().is_empty());
    assert_eq!(harness.directory.dialogs(bob).await.unwrap().len(), 1);
    assert_eq!(harness.directory.dialogs(cy).await.unwrap().len(), 1);
}

#[tokio::test]
async fn group_call_fails_when_no_member_connects() {
    let harness = TestHarness::builder()
        .with_answers(vec![
            MockAnswer::NoAnswer("busy".to_string()),
            MockAnswer::Error("provider down".to_string()),
        ])
        .build()
        .await
        .unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    let bob = contact(&harness, "Bob", "+15550102").await;
    let group = group_of(&harness, &[ada, bob]).await;
    let call = harness
        .scheduler
        .create(window_for_group(group), None, t0())
        .await
        .unwrap();

    let summary = harness.runner.tick(t0() + Duration::minutes(15)).await.unwrap();
    assert_eq!(summary.failed, 1);
    let saved = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(saved.status(), CallStatus::Failed);
    assert_eq!(harness.directory.dialogs(bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_group_is_a_failed_attempt() {
    let harness = TestHarness::builder().build().await.unwrap();
    let group = group_of(&harness, &[]).await;
    let call = harness
        .scheduler
        .create(window_for_group(group), None, t0())
        .await
        .unwrap();

    harness.runner.tick(t0() + Duration::minutes(15)).await.unwrap();
    let saved = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(saved.status(), CallStatus::Failed);
    assert_eq!(harness.telephony.placed_count().await, 0);
}

#[tokio::test]
async fn missed_window_is_recorded_without_calling() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    let call = harness
        .scheduler
        .create(
            CallCandidate {
                contact_id: Some(ada.get()),
                start_time_window: Some(at(10)),
                end_time_window: Some(at(20)),
                retry_until_success: Some(true),
                retry_interval: Some(NumberOrText::Number(15)),
                ..CallCandidate::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap();

    let late = t0() + Duration::minutes(45);
    let call = harness
        .runner
        .dispatch_call(&call, late)
        .await
        .unwrap()
        .expect("attempt should be saved");

    assert_eq!(harness.telephony.placed_count().await, 0);
    assert_eq!(call.status(), CallStatus::Retrying);
    assert_eq!(call.call_attempts(), 1);
    assert_eq!(call.next_retry_at(), Some(late + Duration::minutes(15)));
    assert!(harness.directory.dialogs(ada).await.unwrap().is_empty());
    assert_eq!(WINDOW_ELAPSED, "dispatch window elapsed");
}

#[tokio::test]
async fn attempt_is_discarded_when_the_call_changed_meanwhile() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;
    let read = harness
        .scheduler
        .create(
            CallCandidate {
                contact_id: Some(ada.get()),
                scheduled_time: Some(at(5)),
                ..CallCandidate::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap();

    // The user cancels after the dispatcher read the record.
    harness.scheduler.cancel(read.id(), t0()).await.unwrap();

    let result = harness
        .runner
        .dispatch_call(&read, t0() + Duration::minutes(5))
        .await
        .unwrap();
    assert!(result.is_none());

    let saved = harness.scheduler.get(read.id()).await.unwrap();
    assert_eq!(saved.status(), CallStatus::Cancelled);
    assert_eq!(saved.call_attempts(), 0);
}

#[tokio::test]
async fn immediate_call_appends_a_dialog() {
    let harness = TestHarness::builder().build().await.unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;

    let result = harness
        .runner
        .place_immediate(ada, Some("Hello {{name}}".to_string()), t0())
        .await
        .unwrap();
    assert!(result.answered);
    assert_eq!(result.call_sid, "CA-mock-1");
    assert_eq!(result.dialog.contact_id, ada);
    assert_eq!(result.dialog.messages[0].role, DialogRole::Agent);
    assert_eq!(result.dialog.messages[0].text, "Hello Ada");
    assert!(harness.scheduler.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn immediate_call_surfaces_provider_errors() {
    let harness = TestHarness::builder()
        .with_answers(vec![MockAnswer::Error("provider down".to_string())])
        .build()
        .await
        .unwrap();
    let ada = contact(&harness, "Ada", "+15550101").await;

    let err = harness.runner.place_immediate(ada, None, t0()).await.unwrap_err();
    assert!(matches!(err, DialdeskError::Telephony { .. }));
    assert!(harness.directory.dialogs(ada).await.unwrap().is_empty());

    let err = harness
        .runner
        .place_immediate(ContactId(999), None, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, DialdeskError::NotFound { .. }));
}

#[tokio::test]
async fn run_loop_stops_on_cancellation() {
    let harness = TestHarness::builder().build().await.unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(
        Arc::clone(&harness.runner).run(StdDuration::from_millis(20), cancel.clone()),
    );

    tokio::time::sleep(StdDuration::from_millis(60)).await;
    cancel.cancel();
    tokio::time::timeout(StdDuration::from_secs(2), handle)
        .await
        .expect("loop should stop")
        .unwrap();
}

/// A runner over the harness database whose dialog writes fail.
fn runner_without_dialogs(harness: &TestHarness) -> DispatchRunner {
    let storage: Arc<dyn StorageAdapter + Send + Sync> =
        Arc::new(FailingDialogStorage::new(harness.storage.clone()));
    let telephony: Arc<dyn TelephonyAdapter + Send + Sync> = harness.telephony.clone();
    DispatchRunner::new(
        storage,
        telephony,
        &harness.config.scheduling,
        &harness.config.dispatch,
    )
}

#[tokio::test]
async fn failed_dialog_write_still_records_the_attempt() {
    let harness = TestHarness::builder().build().await.unwrap();
    let runner = runner_without_dialogs(&harness);
    let ada = contact(&harness, "Ada", "+15550101").await;
    let call = harness
        .scheduler
        .create(
            CallCandidate {
                contact_id: Some(ada.get()),
                scheduled_time: Some(at(5)),
                ..CallCandidate::default()
            },
            None,
            t0(),
        )
        .await
        .unwrap();

    let summary = runner.tick(t0() + Duration::minutes(5)).await.unwrap();
    assert_eq!(summary.due, 1);
    assert_eq!(summary.completed, 1);

    let done = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(done.status(), CallStatus::Completed);
    assert_eq!(done.call_attempts(), 1);

    // The next pass must not dial the contact again.
    let summary = runner.tick(t0() + Duration::minutes(6)).await.unwrap();
    assert_eq!(summary.due, 0);
    assert_eq!(harness.telephony.placed_count().await, 1);
    assert!(harness.directory.dialogs(ada).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_dialog_writes_do_not_stop_group_fan_out() {
    let harness = TestHarness::builder().build().await.unwrap();
    let runner = runner_without_dialogs(&harness);
    let ada = contact(&harness, "Ada", "+15550101").await;
    let grace = contact(&harness, "Grace", "+15550102").await;
    let group = group_of(&harness, &[ada, grace]).await;
    let call = harness
        .scheduler
        .create(window_for_group(group), None, t0())
        .await
        .unwrap();

    let summary = runner.tick(t0() + Duration::minutes(15)).await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(harness.telephony.placed_count().await, 2);

    let done = harness.scheduler.get(call.id()).await.unwrap();
    assert_eq!(done.call_attempts(), 1);
    assert_eq!(runner.tick(t0() + Duration::minutes(16)).await.unwrap().due, 0);
    assert_eq!(harness.telephony.placed_count().await, 2);
}
