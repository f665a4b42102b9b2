use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn codeqa(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codeqa").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("CODEQA_EMBEDDING_MODE")
        .env_remove("CODEQA_EMBEDDING_DIM")
        .env("CODEQA_BATCH_SIZE", "4");
    cmd
}

fn setup_repo() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src/account.py"),
        "class UserAccount:\n    def __init__(self, name):\n        self.name = name\n",
    )
    .unwrap();
    fs::write(
        root.join("src/session.rs"),
        "pub fn login(user: &str) -> bool {\n    !user.is_empty()\n}\n",
    )
    .unwrap();
    fs::write(
        root.join(".codeqa.toml"),
        "[indexing]\nbatch_delay_ms = 0\n\n[provider]\nembedding_dim = 32\n",
    )
    .unwrap();
    temp
}

#[test]
fn index_then_query_as_json() {
    let temp = setup_repo();
    let root = temp.path();

    let output = codeqa(root)
        .args(["--quiet", "index", ".", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["files"], 2);
    assert_eq!(report["provider_errors"], 0);

    let output = codeqa(root)
        .args(["-q", "query", "find the login function", "--json", "--max-results", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let response: Value = serde_json::from_slice(&output.stdout).expect("response json");
    assert_eq!(response["intent"]["intent"], "code-search");
    let ranked = response["ranked"].as_array().expect("ranked array");
    assert!(!ranked.is_empty() && ranked.len() <= 2);
    assert_eq!(ranked[0]["chunk"]["metadata"]["detail"]["symbol"], "login");
}

#[test]
fn text_output_names_the_top_chunk() {
    let temp = setup_repo();
    let root = temp.path();

    codeqa(root).args(["-q", "index"]).assert().success();
    codeqa(root)
        .args(["-q", "query", "show me the class", "--path", "."])
        .assert()
        .success()
        .stdout(contains("class UserAccount"));
}

#[test]
fn querying_before_indexing_fails() {
    let temp = setup_repo();
    codeqa(temp.path())
        .args(["-q", "query", "where is login"])
        .assert()
        .failure()
        .stderr(contains("codeqa index"));
}

#[test]
fn indexing_without_an_embedder_fails_fast() {
    let temp = setup_repo();
    codeqa(temp.path())
        .args(["-q", "--embed-mode", "none", "index"])
        .assert()
        .failure()
        .stderr(contains("embedding"));
    assert!(!temp.path().join(".codeqa").join("index.json").exists());
}

#[test]
fn classify_needs_no_index() {
    let temp = tempdir().unwrap();
    codeqa(temp.path())
        .args(["classify", "generate a class diagram"])
        .assert()
        .success()
        .stdout(contains("intent: class-diagram"));

    codeqa(temp.path())
        .args(["classify", "design of the tests", "--role", "tester"])
        .assert()
        .success()
        .stdout(contains("intent: testing-guidance"));
}

#[test]
fn bad_config_names_the_key() {
    let temp = setup_repo();
    fs::write(temp.path().join(".codeqa.toml"), "[query]\ncandidate_multiplier = 0\n").unwrap();
    codeqa(temp.path())
        .args(["-q", "index"])
        .assert()
        .failure()
        .stderr(contains("query.candidate_multiplier"));
}
