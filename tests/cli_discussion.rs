mod forum_stub;

use forum_stub::ForumStub;
use hn_slurp::thread::Threads;
use predicates::prelude::*;

fn discussion_cmd(stub: &ForumStub) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hn-slurp");
    cmd.env_remove("HN_PASSWORD")
        .env_remove("RUST_LOG")
        .args(["discussion", "--base-url", &stub.base_url]);
    cmd
}

#[test]
fn discussion_is_rebuilt_as_threads() -> anyhow::Result<()> {
    let stub = ForumStub::spawn();

    let output = discussion_cmd(&stub).args(["--id", "100"]).output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let threads: Threads = serde_json::from_slice(&output.stdout)?;
    assert_eq!(threads.thread_count(), 2);
    assert_eq!(threads.comment_count(), 5);

    let first = &threads.roots()[0];
    assert_eq!(first.id, 11);
    assert_eq!(first.author, "c11");
    assert_eq!(first.reply_count, 2);
    assert_eq!(first.children[0].children[0].id, 13);
    assert_eq!(first.children[0].children[0].depth, 2);
    assert_eq!(first.content, "Comment 11");
    assert_eq!(threads.roots()[1].children[0].id, 15);
    Ok(())
}

#[test]
fn flat_output_keeps_page_order() -> anyhow::Result<()> {
    let stub = ForumStub::spawn();

    let output = discussion_cmd(&stub)
        .args(["--id", "100", "--flat"])
        .output()?;
    assert!(output.status.success());

    let flat: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)?;
    let order = flat
        .iter()
        .map(|comment| (comment["id"].as_u64(), comment["depth"].as_u64()))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            (Some(11), Some(0)),
            (Some(12), Some(1)),
            (Some(13), Some(2)),
            (Some(14), Some(0)),
            (Some(15), Some(1)),
        ]
    );
    Ok(())
}

#[test]
fn orphaned_comment_fails_the_run() {
    let stub = ForumStub::spawn();

    discussion_cmd(&stub)
        .args(["--id", "200"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("no parent found for comment 22"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let stub = ForumStub::spawn();

    discussion_cmd(&stub)
        .env("RUST_LOG", "debug")
        .args(["--id", "100"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}

#[test]
fn quiet_hides_info_logs() {
    let stub = ForumStub::spawn();

    discussion_cmd(&stub)
        .args(["--id", "100", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::contains("discussion rebuilt").not());
}
