//! End-to-end session scenarios over the in-process loopback transport.

use std::sync::Arc;

use serde_json::json;
use tokio::time::Duration;

use hvx::protocol::{Inbound, Question, Response, ResultCode};
use hvx::{
    ConfigDocument, Error, Job, JobStatus, Loopback, LoopbackHarness, ObjRef, Server, TextDocument,
    Vm, registry,
};

fn connect() -> (ObjRef<Server>, LoopbackHarness) {
    let (parts, harness) = Loopback::channel();
    (Server::connect(parts), harness)
}

async fn respond_success(harness: &mut LoopbackHarness, payload: serde_json::Value) {
    let command = harness.commands.recv().await.unwrap();
    harness
        .inbound
        .send(Inbound::Response(Response {
            id: command.id,
            code: ResultCode::Success,
            params: payload,
        }))
        .unwrap();
}

#[tokio::test]
async fn login_round_trip() {
    let (server, mut harness) = connect();

    let job = server.login("root", "secret");
    assert_eq!(job.status(), JobStatus::Pending);

    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command.method, "srv.login");
    assert_eq!(command.params["user"], "root");

    harness
        .inbound
        .send(Inbound::Response(Response {
            id: command.id,
            code: ResultCode::Success,
            params: json!({"session": "s-42"}),
        }))
        .unwrap();

    let status = job.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(status, JobStatus::Completed);
    assert_eq!(job.return_code().unwrap(), ResultCode::Success);
    assert_eq!(job.payload().unwrap()["session"], "s-42");
}

#[tokio::test]
async fn empty_user_fails_without_a_round_trip() {
    let (server, mut harness) = connect();

    let job = server.login("", "secret");
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.return_code().unwrap(), ResultCode::InvalidArgument);

    // Nothing was submitted.
    assert!(harness.commands.try_recv().is_err());
}

#[tokio::test]
async fn relogin_is_local_and_immediate() {
    let (server, mut harness) = connect();

    // Before any login there is nothing to re-authenticate with.
    let job = server.relogin();
    assert_eq!(job.return_code().unwrap(), ResultCode::InvalidArgument);

    let login = server.login("root", "secret");
    respond_success(&mut harness, json!({})).await;
    login.wait(Duration::from_secs(5)).await.unwrap();

    let job = server.relogin();
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.return_code().unwrap(), ResultCode::Success);
    assert_eq!(job.payload().unwrap()["user"], "root");
    assert_eq!(job.correlation(), None);

    // Still nothing extra on the wire.
    assert!(harness.commands.try_recv().is_err());
}

#[tokio::test]
async fn disconnect_completes_every_pending_job() {
    let (server, mut harness) = connect();

    let login = server.login("root", "secret");
    harness.commands.recv().await.unwrap();

    harness.close();

    let status = login.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(status, JobStatus::Completed);
    assert_eq!(login.return_code().unwrap(), ResultCode::NotConnected);

    // Dispatching after teardown fails locally, and still as a job.
    let after = server.logoff();
    assert_eq!(after.return_code().unwrap(), ResultCode::NotConnected);
}

#[tokio::test]
async fn question_lifecycle() {
    let (server, mut harness) = connect();

    harness
        .inbound
        .send(Inbound::Question(Question {
            request_id: "r1".into(),
            issuer: "vm-1".into(),
            params: json!({"text": "disk exists, overwrite?"}),
        }))
        .unwrap();

    while server.questions().is_empty() {
        tokio::task::yield_now().await;
    }
    let questions = server.questions();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].request_id(), "r1");
    assert_eq!(server.questions_of("vm-1").len(), 1);
    assert_eq!(server.questions_of("vm-2").len(), 0);

    let job = server.answer_question("r1", json!("yes"));
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.return_code().unwrap(), ResultCode::Success);
    assert!(server.questions().is_empty());

    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command.method, "srv.answer");
    assert_eq!(command.params["requestId"], "r1");
    assert_eq!(command.params["answer"], "yes");

    // A repeated answer to the same id is accepted as a no-op.
    let again = server.answer_question("r1", json!("yes"));
    assert_eq!(again.return_code().unwrap(), ResultCode::Success);
}

#[tokio::test]
async fn vm_commit_forwards_the_document_text() {
    let (server, mut harness) = connect();

    let document = Arc::new(TextDocument::new("<vm name=\"web\"/>"));
    let vm = Vm::open(&server, "vm-web", document.clone()).unwrap();

    let edit = vm.begin_edit();
    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command.method, "vm.beginEdit");
    harness
        .inbound
        .send(Inbound::Response(Response {
            id: command.id,
            code: ResultCode::Success,
            params: json!({}),
        }))
        .unwrap();
    edit.wait(Duration::from_secs(5)).await.unwrap();

    document.from_text("<vm name=\"web\" cpus=\"4\"/>").unwrap();

    let commit = vm.commit();
    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command.method, "vm.commit");
    assert_eq!(command.params["vm"], "vm-web");
    assert_eq!(command.params["config"], "<vm name=\"web\" cpus=\"4\"/>");
    harness
        .inbound
        .send(Inbound::Response(Response {
            id: command.id,
            code: ResultCode::Success,
            params: json!({}),
        }))
        .unwrap();
    assert_eq!(
        commit.wait(Duration::from_secs(5)).await.unwrap(),
        JobStatus::Completed
    );
}

#[tokio::test]
async fn vm_open_rejects_an_empty_identity() {
    let (server, _harness) = connect();
    let err = Vm::open(&server, "", Arc::new(TextDocument::new(""))).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn handles_resolve_across_the_registry_until_released() {
    let (server, _harness) = connect();
    let vm = Vm::open(&server, "vm-a", Arc::new(TextDocument::new("<vm/>"))).unwrap();
    let handle = vm.handle();

    // A raw handle resolves to a second owning reference.
    let resolved = ObjRef::<Vm>::from_handle(handle).unwrap();
    assert_eq!(resolved.ident(), "vm-a");

    // Wrong expected type fails closed without touching the object.
    assert!(ObjRef::<Job>::from_handle(handle).is_err());
    assert!(registry().lookup(handle).is_ok());

    drop(resolved);
    assert!(registry().lookup(handle).is_ok());
    drop(vm);
    assert!(registry().lookup(handle).is_err());
}

#[tokio::test]
async fn cancel_requires_a_remote_job() {
    let (server, mut harness) = connect();

    let local = server.relogin();
    let cancel = server.cancel(&local);
    assert_eq!(cancel.return_code().unwrap(), ResultCode::InvalidArgument);

    let login = server.login("root", "secret");
    let login_cmd = harness.commands.recv().await.unwrap();

    let cancel = server.cancel(&login);
    let cancel_cmd = harness.commands.recv().await.unwrap();
    assert_eq!(cancel_cmd.method, "job.cancel");
    assert_eq!(cancel_cmd.params["id"], login_cmd.id.0);
    assert_eq!(cancel.status(), JobStatus::Pending);
}

#[tokio::test]
async fn released_job_does_not_block_the_session() {
    let (server, mut harness) = connect();

    // Caller abandons the job before the dispatcher answers. That stops
    // observation, not the remote work; the late response is discarded.
    let job = server.login("root", "secret");
    let command = harness.commands.recv().await.unwrap();
    drop(job);

    harness
        .inbound
        .send(Inbound::Response(Response {
            id: command.id,
            code: ResultCode::Success,
            params: json!({}),
        }))
        .unwrap();

    let logoff = server.logoff();
    respond_success(&mut harness, json!({})).await;
    assert_eq!(
        logoff.wait(Duration::from_secs(5)).await.unwrap(),
        JobStatus::Completed
    );
}
