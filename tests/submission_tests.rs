// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Submission flows against the in-memory store.

use loan_desk::db::memory::StoreOp;
use loan_desk::error::{AuthError, StoreError};
use loan_desk::flows::{
    LoanDraft, Outcome, RegistrationForm, SelectionFlow, SelectionState, Submitter, TaskDraft,
};
use loan_desk::models::{Equipment, Role};
use loan_desk::navigation::Destination;
use loan_desk::services::auth::AuthOp;
use loan_desk::services::{decode_image, AuthService, ResourceHandle, ResourcePicker};

mod common;
use common::{create_test_app, seed_catalogue, temp_file, PNG_1X1};

fn projector() -> Equipment {
    Equipment {
        id: "eq1".to_string(),
        name: "Projector".to_string(),
        description: String::new(),
        image: None,
    }
}

#[tokio::test]
async fn test_loan_request_document() {
    let app = create_test_app(Some("u1"));
    seed_catalogue(&app.store);

    let mut flow = SelectionFlow::new(app.ctx.clone(), "eq1");
    flow.start().await;
    assert!(matches!(flow.state(), SelectionState::ReadyToSubmit { .. }));

    flow.set_return_date("31/12/2025");
    let outcome = flow.submit().await;
    assert!(outcome.is_submitted(), "unexpected outcome: {:?}", outcome);

    let writes = app.store.writes();
    assert_eq!(writes.len(), 1, "exactly one create call");
    assert_eq!(writes[0].op, StoreOp::Add);
    assert_eq!(writes[0].collection, "loans");

    let doc = writes[0].fields.as_ref().expect("add carries fields");
    assert_eq!(doc.get_str("equipmentId"), Some("eq1"));
    assert_eq!(doc.get_str("equipmentName"), Some("Projector"));
    assert_eq!(doc.get_str("requesterId"), Some("u1"));
    assert_eq!(doc.get_str("status"), Some("pending"));
    assert_eq!(doc.get_str("returnDate"), Some("31/12/2025"));
    assert_eq!(doc.get_str("requesterName"), Some("Ana"));
    assert_eq!(doc.get_str("requesterProgram"), Some("Physics"));
    assert_eq!(doc.get_str("requesterPhoto"), Some("aGk="));
    assert!(doc.get_timestamp("requestDate").is_some());

    let nav = outcome.navigation().expect("loan submission navigates");
    assert_eq!(nav.to, Destination::LoanList);
    let pop = nav.pop_up_to.as_ref().expect("pops history");
    assert_eq!(pop.destination, Destination::LoanList);
    assert!(pop.inclusive);
    assert_eq!(flow.message().as_deref(), Some("Request sent successfully"));
}

#[tokio::test]
async fn test_requester_without_profile_uses_email() {
    let app = create_test_app(Some("u2"));
    let submitter = Submitter::new(app.ctx.clone());

    let outcome = submitter
        .submit_loan(&projector(), None, &mut LoanDraft::new("01/02/2026"))
        .await;
    assert!(outcome.is_submitted());

    let writes = app.store.writes();
    let doc = writes[0].fields.as_ref().unwrap();
    assert_eq!(doc.get_str("requesterName"), Some("u2@example.com"));
    assert_eq!(doc.get_str("requesterProgram"), Some(""));
    assert_eq!(doc.get_str("requesterPhoto"), Some(""));
}

#[tokio::test]
async fn test_blank_fields_make_no_store_calls() {
    let app = create_test_app(Some("u1"));
    let submitter = Submitter::new(app.ctx.clone());

    for blank in ["", "  ", "\t\n"] {
        let outcome = submitter
            .submit_loan(&projector(), None, &mut LoanDraft::new(blank))
            .await;
        assert!(matches!(outcome, Outcome::Invalid(ref m) if !m.is_empty()));
    }

    let outcome = submitter.submit_task(&mut TaskDraft::default()).await;
    assert!(matches!(outcome, Outcome::Invalid(_)));

    let mut form = RegistrationForm {
        email: "ana@example.com".to_string(),
        password: "secret".to_string(),
        role: Role::Student,
        ..Default::default()
    };
    let outcome = submitter.register(&mut form).await;
    assert_eq!(outcome, Outcome::Invalid("Complete the required fields".to_string()));

    assert!(app.store.calls().is_empty());
    assert!(app.auth.calls().is_empty());
    assert!(submitter.message().is_some());
}

#[tokio::test]
async fn test_task_document() {
    let app = create_test_app(Some("u1"));
    let path = temp_file("task.png", PNG_1X1).await;
    app.picker.queue(&path);

    let submitter = Submitter::new(app.ctx.clone());
    let mut draft = TaskDraft {
        description: "Broken tripod".to_string(),
        image: app.picker.pick("image/*").await,
    };
    assert!(draft.image.is_some());

    let outcome = submitter.submit_task(&mut draft).await;
    assert!(outcome.is_submitted(), "unexpected outcome: {:?}", outcome);
    assert!(outcome.navigation().is_none());
    assert!(draft.description.is_empty());
    assert!(draft.image.is_none());

    let writes = app.store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].collection, "tasks");
    let doc = writes[0].fields.as_ref().unwrap();
    assert_eq!(doc.get_str("ownerId"), Some("u1"));
    assert_eq!(doc.get_str("description"), Some("Broken tripod"));
    assert!(doc.get_timestamp("timestamp").is_some());
    assert!(doc.non_blank_str("image").is_some());

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_unreadable_image_fails_without_write() {
    let app = create_test_app(Some("u1"));
    let submitter = Submitter::new(app.ctx.clone());

    let mut draft = TaskDraft {
        description: "x".to_string(),
        image: Some(ResourceHandle::new("/nonexistent/loan-desk/photo.png")),
    };
    let outcome = submitter.submit_task(&mut draft).await;

    assert!(matches!(outcome, Outcome::Failed(ref m) if m.starts_with("Error saving: ")));
    assert!(app.store.writes().is_empty());
    assert!(draft.image.is_some());
    assert!(!submitter.is_submitting());
}

#[tokio::test]
async fn test_store_failure_is_reported() {
    let app = create_test_app(Some("u1"));
    app.store.fail(
        StoreOp::Add,
        "tasks",
        StoreError::Unavailable("network unreachable".to_string()),
    );
    let path = temp_file("fail.png", PNG_1X1).await;

    let submitter = Submitter::new(app.ctx.clone());
    let mut draft = TaskDraft {
        description: "x".to_string(),
        image: Some(ResourceHandle::new(path.to_string_lossy())),
    };
    let outcome = submitter.submit_task(&mut draft).await;

    match outcome {
        Outcome::Failed(message) => assert!(message.contains("network unreachable")),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(draft.description, "x");
    assert!(!submitter.is_submitting());

    // The flag was released, so a retry by the user goes through
    app.store.heal(StoreOp::Add, "tasks");
    assert!(submitter.submit_task(&mut draft).await.is_submitted());

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_register_student_with_photo() {
    let app = create_test_app(None);
    let path = temp_file("me.png", PNG_1X1).await;

    let submitter = Submitter::new(app.ctx.clone());
    let mut form = RegistrationForm {
        email: "ana@example.com".to_string(),
        password: "secret".to_string(),
        name: "Ana".to_string(),
        student_id: "2021-001".to_string(),
        program: "Physics".to_string(),
        role: Role::Student,
        photo: Some(ResourceHandle::new(path.to_string_lossy())),
    };
    let outcome = submitter.register(&mut form).await;

    let nav = outcome.navigation().expect("registration navigates");
    assert_eq!(nav.to, Destination::LoanList);

    let uid = app.auth.current_user().expect("signed in").uid;
    let writes = app.store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].op, StoreOp::Set);
    assert_eq!(writes[0].id.as_deref(), Some(uid.as_str()));

    let doc = writes[0].fields.as_ref().unwrap();
    assert_eq!(doc.get_str("role"), Some("student"));
    assert_eq!(doc.get_str("program"), Some("Physics"));
    assert!(decode_image(doc.get_str("photo").unwrap()).is_some());
    assert!(doc.get_timestamp("createdAt").is_some());

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_register_auth_failure_skips_profile() {
    let app = create_test_app(None);
    app.auth.fail_register(AuthError::EmailExists);

    let submitter = Submitter::new(app.ctx.clone());
    let mut form = RegistrationForm {
        email: "ana@example.com".to_string(),
        password: "secret".to_string(),
        name: "Ana".to_string(),
        role: Role::Admin,
        ..Default::default()
    };
    let outcome = submitter.register(&mut form).await;

    assert_eq!(
        outcome,
        Outcome::Failed("Registration error: Email already registered".to_string())
    );
    assert!(app.store.calls().is_empty());
    assert_eq!(form.password, "secret");
}

#[tokio::test]
async fn test_register_trims_email() {
    let app = create_test_app(None);
    let submitter = Submitter::new(app.ctx.clone());
    let mut form = RegistrationForm {
        email: "  ana@example.com\n".to_string(),
        password: "secret".to_string(),
        name: "Ana".to_string(),
        role: Role::Admin,
        ..Default::default()
    };
    let outcome = submitter.register(&mut form).await;
    assert!(outcome.is_submitted(), "unexpected outcome: {:?}", outcome);

    assert_eq!(
        app.auth.calls(),
        vec![(AuthOp::Register, "ana@example.com".to_string())]
    );
    let writes = app.store.writes();
    let doc = writes[0].fields.as_ref().unwrap();
    assert_eq!(doc.get_str("email"), Some("ana@example.com"));
    assert_eq!(form.email, "ana@example.com");
}
