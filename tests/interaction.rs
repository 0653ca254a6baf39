// Integration tests for the click → navigate lifecycle: debounce,
// exactly-once emission, stale-target cancellation, unmount.

use std::sync::Arc;
use std::time::Duration;

use wardmap::{
    InteractionState, MapEvent, MapInteraction, MapTheme, NAV_DELAY, OfficeStatus, RegionRecord,
};

fn record(code: &str, headquarters: bool) -> RegionRecord {
    RegionRecord {
        code: Arc::from(code),
        region: format!("Region {code}"),
        status: OfficeStatus::Operational,
        headquarters,
        locality: None,
    }
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<MapEvent>) -> Vec<MapEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn navigations(events: &[MapEvent]) -> Vec<&MapEvent> {
    events
        .iter()
        .filter(|e| matches!(e, MapEvent::Navigate { .. }))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn click_styles_immediately_then_navigates_once() {
    let records = vec![record("B", false), record("A", true)];
    let (machine, mut rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    machine.pointer_enter();
    drain(&mut rx);

    machine.click();
    // clicked style lands before any time passes; hover tooltip is gone
    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            MapEvent::TooltipHide,
            MapEvent::Restyle { state: InteractionState::Clicked, theme: MapTheme::Light },
        ]
    );
    assert_eq!(machine.state(), InteractionState::Clicked);

    // a second click inside the delay window is ignored
    machine.click();
    assert!(drain(&mut rx).is_empty());

    tokio::time::sleep(NAV_DELAY + Duration::from_millis(50)).await;
    let events = drain(&mut rx);
    let navs = navigations(&events);
    assert_eq!(navs.len(), 1);
    assert_eq!(navs[0], &MapEvent::Navigate { code: Arc::from("A") });
    assert_eq!(machine.state(), InteractionState::Navigating);

    // clicks after navigation are still ignored
    machine.click();
    tokio::time::sleep(NAV_DELAY + Duration::from_millis(50)).await;
    assert!(navigations(&drain(&mut rx)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigation_goes_to_the_primary_record() {
    // hq beats a lexicographically smaller plain office
    let records = vec![record("A", false), record("Z", true)];
    let (machine, mut rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    machine.click();
    tokio::time::sleep(NAV_DELAY + Duration::from_millis(50)).await;

    let events = drain(&mut rx);
    let navs = navigations(&events);
    assert_eq!(navs, vec![&MapEvent::Navigate { code: Arc::from("Z") }]);
}

#[tokio::test(start_paused = true)]
async fn changing_district_cancels_pending_navigation() {
    let records = vec![record("A", true)];
    let (mut machine, mut rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    machine.click();
    drain(&mut rx);

    // identity changes before the delay elapses
    let other = vec![record("S1", true)];
    machine.set_district("South Goa", &other);

    tokio::time::sleep(NAV_DELAY * 2).await;
    let events = drain(&mut rx);
    assert!(navigations(&events).is_empty());
    assert_eq!(machine.state(), InteractionState::Idle);

    // the new identity can navigate normally
    machine.click();
    tokio::time::sleep(NAV_DELAY + Duration::from_millis(50)).await;
    let events = drain(&mut rx);
    assert_eq!(navigations(&events), vec![&MapEvent::Navigate { code: Arc::from("S1") }]);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_machine_cancels_pending_navigation() {
    let records = vec![record("A", true)];
    let (machine, mut rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    machine.click();
    drain(&mut rx);
    drop(machine);

    tokio::time::sleep(NAV_DELAY * 2).await;
    assert!(navigations(&drain(&mut rx)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn identity_token_is_cancelled_on_district_change() {
    let records = vec![record("A", true)];
    let (mut machine, _rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    let old_token = machine.cancel_token();
    assert!(!old_token.is_cancelled());

    machine.set_district("South Goa", &records);
    assert!(old_token.is_cancelled());
    assert!(!machine.cancel_token().is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn hover_is_suppressed_while_click_is_pending() {
    let records = vec![record("A", true)];
    let (machine, mut rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    machine.click();
    drain(&mut rx);

    machine.pointer_enter();
    machine.pointer_move(5.0, 5.0);
    machine.pointer_leave();
    assert!(drain(&mut rx).is_empty());
    assert_eq!(machine.state(), InteractionState::Clicked);
}

#[tokio::test(start_paused = true)]
async fn theme_toggle_mid_click_keeps_pending_navigation() {
    let records = vec![record("A", true)];
    let (machine, mut rx) =
        MapInteraction::new("Goa", "North Goa", &records, true, MapTheme::Light);

    machine.click();
    drain(&mut rx);

    machine.set_theme(MapTheme::Dark);
    assert_eq!(
        drain(&mut rx),
        vec![MapEvent::Restyle { state: InteractionState::Clicked, theme: MapTheme::Dark }]
    );

    tokio::time::sleep(NAV_DELAY + Duration::from_millis(50)).await;
    assert_eq!(navigations(&drain(&mut rx)).len(), 1);
}
