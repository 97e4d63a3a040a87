//! Emails sent at each step of the submission and purchase lifecycle.

use crate::domain::event::Event;
use crate::domain::ports::Email;
use crate::domain::purchase::Purchase;
use crate::domain::submission::FormSubmission;

pub fn submission_received(submission: &FormSubmission, event: &Event) -> Email {
    Email {
        to: submission.student_email.clone(),
        subject: format!("We received your form for {}", event.title),
        text: format!(
            "Hi {},\n\nThanks for submitting your form for {}. An ASB officer will review it \
             and you will get another email once it has been approved or declined.\n\n\
             Reference: {}\n",
            submission.student_name, event.title, submission.id
        ),
    }
}

pub fn review_requested(admin: &str, submission: &FormSubmission, event: &Event) -> Email {
    Email {
        to: admin.to_string(),
        subject: format!("New form submission for {}", event.title),
        text: format!(
            "{} ({}, student id {}) submitted a form for {} with {} document(s).\n\n\
             Submission: {}\n",
            submission.student_name,
            submission.student_email,
            submission.student_id,
            event.title,
            submission.documents.len(),
            submission.id
        ),
    }
}

pub fn submission_approved(
    submission: &FormSubmission,
    event: &Event,
    purchase: Option<&Purchase>,
) -> Email {
    let mut text = format!(
        "Hi {},\n\nYour form for {} has been approved.\n",
        submission.student_name, event.title
    );
    if let Some(note) = &submission.admin_note {
        text.push_str(&format!("\nNote from ASB: {note}\n"));
    }
    match purchase.and_then(|p| p.checkout_url().map(|url| (p, url))) {
        Some((purchase, url)) => text.push_str(&format!(
            "\nTo confirm your spot, pay ${} for your ticket here:\n{url}\n",
            purchase.total
        )),
        None => text.push_str("\nNo payment is required. See you there!\n"),
    }

    Email {
        to: submission.student_email.clone(),
        subject: format!("Approved: {}", event.title),
        text,
    }
}

pub fn submission_rejected(submission: &FormSubmission, event: &Event) -> Email {
    let reason = submission
        .admin_note
        .as_deref()
        .unwrap_or("No reason was given.");
    Email {
        to: submission.student_email.clone(),
        subject: format!("Update on your form for {}", event.title),
        text: format!(
            "Hi {},\n\nUnfortunately your form for {} was not approved.\n\nReason: {reason}\n\n\
             Please contact the ASB office if you have questions.\n",
            submission.student_name, event.title
        ),
    }
}

pub fn payment_received(purchase: &Purchase) -> Email {
    Email {
        to: purchase.buyer.email.clone(),
        subject: format!("Receipt for {}", purchase.product_name),
        text: format!(
            "Hi {},\n\nWe received your payment of ${} for {} x {}.\n\nOrder: {}\n",
            purchase.buyer.name,
            purchase.total,
            purchase.quantity,
            purchase.product_name,
            purchase.id
        ),
    }
}

pub fn payment_abandoned(purchase: &Purchase) -> Email {
    Email {
        to: purchase.buyer.email.clone(),
        subject: format!("Your order for {} was not completed", purchase.product_name),
        text: format!(
            "Hi {},\n\nYour payment for {} did not go through, so the order was cancelled. \
             You can place a new order at any time.\n\nOrder: {}\n",
            purchase.buyer.name, purchase.product_name, purchase.id
        ),
    }
}

pub fn order_ready(purchase: &Purchase) -> Email {
    Email {
        to: purchase.buyer.email.clone(),
        subject: format!("Your {} is ready", purchase.product_name),
        text: format!(
            "Hi {},\n\nYour order of {} x {} has been fulfilled. Pick it up at the ASB office \
             if you have not already.\n\nOrder: {}\n",
            purchase.buyer.name, purchase.quantity, purchase.product_name, purchase.id
        ),
    }
}

pub fn order_cancelled(purchase: &Purchase) -> Email {
    Email {
        to: purchase.buyer.email.clone(),
        subject: format!("Order for {} cancelled", purchase.product_name),
        text: format!(
            "Hi {},\n\nYour order of {} x {} was cancelled by the ASB office. If you already \
             paid, the refund is handled separately.\n\nOrder: {}\n",
            purchase.buyer.name, purchase.quantity, purchase.product_name, purchase.id
        ),
    }
}
