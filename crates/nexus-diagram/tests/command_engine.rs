#![cfg(unix)]

use nexus_diagram::{CommandEngine, DiagramRenderer, FailureKind};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < limit {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    done()
}

fn process_alive(pid: &str) -> bool {
    Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read work dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn work_dir_is_created_on_demand() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path().join("nested").join("scratch");
    CommandEngine::new("sh")
        .with_work_dir(&dir)
        .expect("work dir");
    assert!(dir.is_dir());
}

#[test]
fn work_dir_that_cannot_be_created_is_an_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("occupied");
    std::fs::write(&file, "x").expect("write");
    let err = CommandEngine::new("sh")
        .with_work_dir(file.join("scratch"))
        .expect_err("path under a file");
    assert!(matches!(err, nexus_diagram::Error::Io(_)));
}

#[test]
fn renderer_output_is_returned_and_scratch_files_removed() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let engine = CommandEngine::new("sh")
        .with_args([
            "-c",
            r#"while [ $# -gt 0 ]; do [ "$1" = -o ] && out="$2"; shift; done; printf '<svg/>' > "$out""#,
            "renderer",
        ])
        .with_work_dir(tmp.path())
        .expect("work dir");

    let svg = DiagramRenderer::new(engine)
        .render_sync("graph TD\nA-->B")
        .expect("render");
    assert_eq!(svg, "<svg/>");
    assert!(entries(tmp.path()).is_empty(), "{:?}", entries(tmp.path()));
}

#[test]
fn timed_out_renderer_is_killed_and_cleaned_up() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let work = tmp.path().join("work");
    let pid_file = tmp.path().join("renderer.pid");
    let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());

    let engine = CommandEngine::new("sh")
        .with_args(["-c", script.as_str(), "renderer"])
        .with_work_dir(&work)
        .expect("work dir");
    let renderer = DiagramRenderer::new(engine).with_timeout(Duration::from_millis(300));

    let failure = renderer.render_sync("graph TD\nA-->B").expect_err("timeout");
    assert_eq!(failure.kind, FailureKind::Timeout);

    assert!(wait_until(Duration::from_secs(5), || pid_file.exists()));
    let pid = std::fs::read_to_string(&pid_file).expect("pid");
    let pid = pid.trim();

    assert!(
        wait_until(Duration::from_secs(5), || !process_alive(pid)),
        "renderer process {pid} survived the timeout"
    );
    assert!(
        wait_until(Duration::from_secs(5), || entries(&work).is_empty()),
        "{:?}",
        entries(&work)
    );
}
