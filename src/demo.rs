use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;

use crate::error::AppError;
use crate::workflows::allocation::{
    AllocationError, AllocationService, EligibilityPolicy, FlatType, PersonId, ProjectId,
    Repositories,
};
use crate::workflows::ledger::{sample_snapshot, CsvLedger};

const SARAH: &str = "T7654321B";
const JOHN: &str = "S1234567A";
const GRACE: &str = "S9876543C";
const JAMES: &str = "T2345678D";
const RACHEL: &str = "S3456789E";
const DANIEL: &str = "T2109876H";
const EMILY: &str = "S6543210I";
const DAVID: &str = "T1234567J";
const MICHAEL: &str = "T8765432F";
const JESSICA: &str = "S5678901G";

const ACACIA: &str = "acacia-breeze";
const CEDAR: &str = "cedar-grove";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Save the resulting ledger as CSV files into this directory.
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Submission date stamped on applications (defaults to today).
    #[arg(long, value_parser = crate::cli::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let service = AllocationService::new(
        Repositories::from_snapshot(sample_snapshot())?,
        EligibilityPolicy::default(),
    )?;

    println!("Housing allocation demo ({today})");
    run_script(&service, today);
    print_inventory(&service)?;

    if let Some(dir) = args.data_dir {
        let ledger = CsvLedger::new(dir);
        ledger.save(&service.store().snapshot()?)?;
        println!("\nLedger written to {}", ledger.dir().display());
    }

    Ok(())
}

fn pid(raw: &str) -> PersonId {
    PersonId::from(raw)
}

fn prj(raw: &str) -> ProjectId {
    ProjectId::from(raw)
}

/// Print one step, returning the value when it succeeded.
fn step<T>(
    label: &str,
    result: Result<T, AllocationError>,
    describe: impl FnOnce(&T) -> String,
) -> Option<T> {
    match result {
        Ok(value) => {
            println!("  ok       {label}: {}", describe(&value));
            Some(value)
        }
        Err(err) => {
            println!("  refused  {label}: {err}");
            None
        }
    }
}

fn run_script(service: &AllocationService, today: NaiveDate) {
    println!("\nOfficer registration");
    step(
        "Daniel registers for Acacia Breeze",
        service.request_assignment(&pid(DANIEL), &prj(ACACIA)),
        |_| "pending".to_string(),
    );
    step(
        "Michael approves Daniel",
        service.decide_assignment(&pid(MICHAEL), &pid(DANIEL), true),
        |_| "approved".to_string(),
    );
    step(
        "Emily registers for Cedar Grove",
        service.request_assignment(&pid(EMILY), &prj(CEDAR)),
        |_| "pending".to_string(),
    );
    step(
        "Michael approves Emily",
        service.decide_assignment(&pid(MICHAEL), &pid(EMILY), true),
        |_| "approved".to_string(),
    );
    step(
        "David registers for Cedar Grove",
        service.request_assignment(&pid(DAVID), &prj(CEDAR)),
        |_| "pending".to_string(),
    );

    println!("\nApplications");
    let sarah = step(
        "Sarah applies for a 3-Room at Acacia Breeze",
        service.submit_application(&pid(SARAH), &prj(ACACIA), FlatType::ThreeRoom, today),
        |application| application.id.to_string(),
    );
    step(
        "John applies for a 3-Room at Acacia Breeze",
        service.submit_application(&pid(JOHN), &prj(ACACIA), FlatType::ThreeRoom, today),
        |application| application.id.to_string(),
    );
    let john = step(
        "John applies for a 2-Room at Acacia Breeze",
        service.submit_application(&pid(JOHN), &prj(ACACIA), FlatType::TwoRoom, today),
        |application| application.id.to_string(),
    );
    step(
        "Rachel applies for a 2-Room at Acacia Breeze",
        service.submit_application(&pid(RACHEL), &prj(ACACIA), FlatType::TwoRoom, today),
        |application| application.id.to_string(),
    );
    step(
        "Sarah applies again, for Cedar Grove",
        service.submit_application(&pid(SARAH), &prj(CEDAR), FlatType::TwoRoom, today),
        |application| application.id.to_string(),
    );
    let grace = step(
        "Grace applies for a 2-Room at Cedar Grove",
        service.submit_application(&pid(GRACE), &prj(CEDAR), FlatType::TwoRoom, today),
        |application| application.id.to_string(),
    );
    let james = step(
        "James applies for a 2-Room at Cedar Grove",
        service.submit_application(&pid(JAMES), &prj(CEDAR), FlatType::TwoRoom, today),
        |application| application.id.to_string(),
    );

    println!("\nDecisions");
    if let Some(application) = &sarah {
        step(
            "Jessica decides Sarah's application",
            service.decide_application(&pid(JESSICA), &application.id, true),
            |decided| decided.status.to_string(),
        );
    }
    let decisions = [
        ("Sarah", &sarah),
        ("John", &john),
        ("Grace", &grace),
        ("James", &james),
    ];
    for (name, application) in decisions {
        if let Some(application) = application {
            step(
                &format!("Michael approves {name}"),
                service.decide_application(&pid(MICHAEL), &application.id, true),
                |decided| decided.status.to_string(),
            );
        }
    }

    println!("\nBookings");
    for (officer, applicant, flat_type, label) in [
        (DANIEL, SARAH, FlatType::ThreeRoom, "Daniel books Sarah's 3-Room"),
        (DANIEL, SARAH, FlatType::ThreeRoom, "Daniel books Sarah's 3-Room again"),
        (EMILY, GRACE, FlatType::TwoRoom, "Emily books Grace's 2-Room"),
        (EMILY, JAMES, FlatType::TwoRoom, "Emily books James's 2-Room"),
        (EMILY, JOHN, FlatType::TwoRoom, "Emily books John's 2-Room"),
    ] {
        step(
            label,
            service.book(&pid(officer), &pid(applicant), flat_type),
            |receipt| {
                format!(
                    "receipt {} for {} ({}, {}), {} at {}",
                    receipt.application_id,
                    receipt.applicant_name,
                    receipt.age,
                    receipt.marital_status.label(),
                    receipt.flat_type,
                    receipt.project_name
                )
            },
        );
    }

    println!("\nEnquiries");
    let enquiry = step(
        "John asks about Acacia Breeze",
        service.submit_enquiry(
            &pid(JOHN),
            &prj(ACACIA),
            "Is the booking fee refundable?".to_string(),
        ),
        |enquiry| enquiry.id.to_string(),
    );
    if let Some(enquiry) = enquiry {
        step(
            "Emily answers John",
            service.reply_enquiry(&pid(EMILY), &enquiry.id, "Yes.".to_string()),
            |_| "replied".to_string(),
        );
        step(
            "Daniel answers John",
            service.reply_enquiry(
                &pid(DANIEL),
                &enquiry.id,
                "Only before signing the agreement.".to_string(),
            ),
            |_| "replied".to_string(),
        );
        step(
            "John edits the answered enquiry",
            service.edit_enquiry(&pid(JOHN), &enquiry.id, "Never mind".to_string()),
            |_| "edited".to_string(),
        );
    }

    println!("\nWithdrawals");
    step(
        "Sarah requests withdrawal",
        service.request_withdrawal(&pid(SARAH)),
        |application| application.id.to_string(),
    );
    if let Some(application) = &sarah {
        step(
            "Michael approves Sarah's withdrawal",
            service.decide_withdrawal(&pid(MICHAEL), &application.id, true),
            |outcome| {
                format!(
                    "{} -> {}, unit released: {}",
                    outcome.previous_status, outcome.status, outcome.unit_released
                )
            },
        );
        step(
            "Michael decides Sarah's withdrawal again",
            service.decide_withdrawal(&pid(MICHAEL), &application.id, true),
            |_| "decided".to_string(),
        );
    }
}

fn print_inventory(service: &AllocationService) -> Result<(), AppError> {
    println!("\nInventory");
    for project in service.store().projects.all()? {
        println!(
            "- {} ({}): {} {} / {} {} / {} staff slots",
            project.name,
            project.neighborhood,
            project.units_available(FlatType::TwoRoom),
            FlatType::TwoRoom,
            project.units_available(FlatType::ThreeRoom),
            FlatType::ThreeRoom,
            project.inventory.staff_slots()
        );
    }
    Ok(())
}
