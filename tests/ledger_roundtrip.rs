use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use housing_allocation::workflows::allocation::{
    AllocationError, AllocationService, ApplicationStatus, EligibilityPolicy, EnquiryStatus,
    FlatType, PersonId, ProjectId, Repositories,
};
use housing_allocation::workflows::ledger::{sample_snapshot, CsvLedger, LedgerError, PROJECTS_FILE};

const SARAH: &str = "T7654321B";
const JOHN: &str = "S1234567A";
const DANIEL: &str = "T2109876H";
const MICHAEL: &str = "T8765432F";
const ACACIA: &str = "acacia-breeze";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "housing-allocation-{name}-{}",
        std::process::id()
    ));
    fs::remove_dir_all(&dir).ok();
    dir
}

fn pid(raw: &str) -> PersonId {
    PersonId::from(raw)
}

fn service_from_ledger(ledger: &CsvLedger) -> AllocationService {
    let snapshot = ledger.load().expect("ledger loads");
    AllocationService::new(
        Repositories::from_snapshot(snapshot).expect("repositories"),
        EligibilityPolicy::default(),
    )
    .expect("service builds")
}

#[test]
fn booked_state_survives_a_restart() {
    let dir = scratch_dir("restart");
    let ledger = CsvLedger::new(&dir);
    ledger.save(&sample_snapshot()).expect("seed ledger");

    let service = service_from_ledger(&ledger);
    let today = NaiveDate::from_ymd_opt(2025, 2, 20).expect("date");
    service
        .request_assignment(&pid(DANIEL), &ProjectId::from(ACACIA))
        .expect("registration");
    service
        .decide_assignment(&pid(MICHAEL), &pid(DANIEL), true)
        .expect("approved");
    let application = service
        .submit_application(&pid(SARAH), &ProjectId::from(ACACIA), FlatType::ThreeRoom, today)
        .expect("submitted");
    service
        .decide_application(&pid(MICHAEL), &application.id, true)
        .expect("approved");
    service
        .book(&pid(DANIEL), &pid(SARAH), FlatType::ThreeRoom)
        .expect("booked");
    service
        .submit_enquiry(
            &pid(JOHN),
            &ProjectId::from(ACACIA),
            "Any parking, nearby?".to_string(),
        )
        .expect("enquiry");

    let before = service.store().snapshot().expect("snapshot");
    ledger.save(&before).expect("save");

    let restarted = service_from_ledger(&ledger);
    assert_eq!(restarted.store().snapshot().expect("snapshot"), before);

    let stored = restarted.application(&application.id).expect("application");
    assert_eq!(stored.status, ApplicationStatus::Booked);
    let sarah = restarted.person(&pid(SARAH)).expect("sarah");
    assert!(sarah.booking.is_some());

    restarted.request_withdrawal(&pid(SARAH)).expect("requested");
    let outcome = restarted
        .decide_withdrawal(&pid(MICHAEL), &application.id, true)
        .expect("approved");
    assert!(outcome.unit_released);
    assert_eq!(
        restarted
            .project(&ProjectId::from(ACACIA))
            .expect("project")
            .units_available(FlatType::ThreeRoom),
        3
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn answered_enquiries_reload_verbatim() {
    let dir = scratch_dir("enquiries");
    let ledger = CsvLedger::new(&dir);
    ledger.save(&sample_snapshot()).expect("seed ledger");

    let service = service_from_ledger(&ledger);
    let answered = service
        .submit_enquiry(
            &pid(SARAH),
            &ProjectId::from(ACACIA),
            "  Is the carpark sheltered?  ".to_string(),
        )
        .expect("enquiry");
    let pending = service
        .submit_enquiry(&pid(JOHN), &ProjectId::from(ACACIA), " Pets allowed?".to_string())
        .expect("enquiry");
    assert!(matches!(
        service.reply_enquiry(&pid(MICHAEL), &answered.id, "   ".to_string()),
        Err(AllocationError::BlankText { .. })
    ));
    service
        .reply_enquiry(&pid(MICHAEL), &answered.id, " Yes, fully. ".to_string())
        .expect("reply");

    let before = service.store().snapshot().expect("snapshot");
    ledger.save(&before).expect("save");

    let restarted = service_from_ledger(&ledger);
    assert_eq!(restarted.store().snapshot().expect("snapshot"), before);

    let reloaded = restarted.enquiry(&answered.id).expect("answered");
    assert_eq!(reloaded.status, EnquiryStatus::Replied);
    assert_eq!(reloaded.message, "  Is the carpark sheltered?  ");
    assert_eq!(reloaded.response.as_deref(), Some(" Yes, fully. "));
    let reloaded = restarted.enquiry(&pending.id).expect("pending");
    assert_eq!(reloaded.status, EnquiryStatus::Pending);
    assert_eq!(reloaded.message, " Pets allowed?");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupt_inventory_is_rejected_on_load() {
    let dir = scratch_dir("corrupt");
    let ledger = CsvLedger::new(&dir);
    ledger.save(&sample_snapshot()).expect("seed ledger");

    let path = dir.join(PROJECTS_FILE);
    let contents = fs::read_to_string(&path).expect("projects file");
    // Two-room availability above its capacity.
    let corrupted = contents.replacen(
        "Acacia Breeze,Yishun,2025-02-15,2025-03-20,true,T8765432F,2,2",
        "Acacia Breeze,Yishun,2025-02-15,2025-03-20,true,T8765432F,9,2",
        1,
    );
    assert_ne!(contents, corrupted, "fixture row should be rewritten");
    fs::write(&path, corrupted).expect("rewrite");

    match ledger.load() {
        Err(LedgerError::InvalidRow { file, line, .. }) => {
            assert_eq!(file, PROJECTS_FILE);
            assert_eq!(line, 2);
        }
        other => panic!("expected invalid row, got {other:?}"),
    }

    fs::remove_dir_all(&dir).ok();
}
