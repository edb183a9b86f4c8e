use super::domain::{Enquiry, EnquiryStatus, Person, Project};
use super::error::AllocationError;

fn ensure_author(author: &Person, enquiry: &Enquiry, action: &str) -> Result<(), AllocationError> {
    if enquiry.applicant_id != author.id {
        return Err(AllocationError::not_permitted(
            &author.id,
            format!("{action} enquiry {}", enquiry.id),
        ));
    }
    Ok(())
}

fn ensure_open(enquiry: &Enquiry, operation: &'static str) -> Result<(), AllocationError> {
    if enquiry.status != EnquiryStatus::Pending {
        return Err(AllocationError::invalid_state(
            "enquiry",
            &enquiry.id,
            operation,
            "it has already been answered",
        ));
    }
    Ok(())
}

/// Messages and responses must carry at least one non-whitespace character.
pub fn ensure_text(field: &'static str, text: &str) -> Result<(), AllocationError> {
    if text.trim().is_empty() {
        return Err(AllocationError::BlankText { field });
    }
    Ok(())
}

pub fn edit(
    author: &Person,
    enquiry: &mut Enquiry,
    message: String,
) -> Result<(), AllocationError> {
    ensure_author(author, enquiry, "edit")?;
    ensure_open(enquiry, "edit")?;
    ensure_text("message", &message)?;
    enquiry.message = message;
    Ok(())
}

/// Checks that `author` may delete the enquiry; removal itself is the repository's job.
pub fn ensure_deletable(author: &Person, enquiry: &Enquiry) -> Result<(), AllocationError> {
    ensure_author(author, enquiry, "delete")?;
    ensure_open(enquiry, "delete")
}

/// Answer an enquiry. Only the owning manager or the handling officer may respond, once.
pub fn reply(
    responder: &Person,
    project: &Project,
    enquiry: &mut Enquiry,
    response: String,
) -> Result<(), AllocationError> {
    if !(responder.owns(project) || responder.handles(&project.id)) {
        return Err(AllocationError::not_permitted(
            &responder.id,
            format!("answer enquiries for {}", project.id),
        ));
    }
    ensure_open(enquiry, "reply to")?;
    ensure_text("response", &response)?;

    enquiry.response = Some(response);
    enquiry.responder_id = Some(responder.id.clone());
    enquiry.status = EnquiryStatus::Replied;
    Ok(())
}
