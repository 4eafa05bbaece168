//! End-to-end runs over a small essay corpus on disk

use std::fs;
use std::path::Path;

use quire::config::SiteConfig;
use quire::content::{DocumentId, Status};
use quire::Site;

const GAMBLING: &str = "Suppose you are offered a fair coin toss where heads doubles your \
    stake and tails loses it. The expected value is zero, so a rational agent with linear \
    utility should be indifferent. Yet almost everyone declines, and they are right to. Wealth \
    enters utility through something like a logarithm, which is concave, so every fair bet \
    lowers expected utility.";

const PLUS: &str = "We define natural numbers as Z or S of a natural, and addition by \
    recursion on the first argument. Multiplication follows the same pattern and never needs \
    a primitive plus operator.";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn essay(title: &str, date: &str, body: &str) -> String {
    format!(
        "---\nlayout: post\ntitle: \"{}\"\ndate: {}\ncategories: essays\n---\n{}\n",
        title, date, body
    )
}

fn corpus() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "source/_posts/2018-10-10-fair-gambling.md",
        &essay("Fair Gambling Isn't a Good Idea", "2018-10-10", GAMBLING),
    );
    write(
        root,
        "source/_posts/2018-10-10-why-fair-gambling.md",
        &essay(
            "Why Fair Gambling Isn't a Good Idea",
            "2018-10-10",
            &format!("{} The Kelly criterion agrees: stake nothing on a zero-edge bet.", GAMBLING),
        ),
    );
    write(
        root,
        "source/_posts/arithmetics-without-plus.md",
        &essay(
            "Arithmetics Without Plus",
            "2019-01-01",
            &format!("{}\n\n```haskell\ndata Nat = Z | S Nat\n```\n", PLUS),
        ),
    );
    write(
        root,
        "source/_drafts/arithmetics-without-plus.md",
        &essay(
            "Arithmetics Without Plus",
            "2020-01-01",
            &format!("{}\n\n```haskell\ndata Nat = Z | S Nat\n```\n", PLUS),
        ),
    );
    write(
        root,
        "source/_posts/knots.md",
        &essay("Climbing Knots", "2017-05-05", "Tie a figure eight, then check it."),
    );
    write(
        root,
        "source/_posts/unterminated.md",
        "---\ntitle: Lost Essay\ndate: 2016-01-01\n\nThe closing delimiter never comes.\n",
    );

    dir
}

#[test]
fn test_build_corpus() {
    let dir = corpus();
    let site = Site::with_config(dir.path(), SiteConfig::default());
    let report = site.build().unwrap();

    let ids: Vec<&str> = report.output.index.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "arithmetics-without-plus",
            "2018-10-10-why-fair-gambling",
            "knots"
        ]
    );
    assert!(report
        .output
        .documents
        .iter()
        .all(|d| d.status == Status::Published));

    let draft = report
        .store
        .get(&DocumentId::from("drafts/arithmetics-without-plus"))
        .unwrap();
    assert!(!draft.canonical);

    let shorter = report
        .store
        .get(&DocumentId::from("2018-10-10-fair-gambling"))
        .unwrap();
    assert!(!shorter.canonical);
    assert_eq!(
        shorter.revision_group.as_ref().map(|g| g.as_str()),
        Some("2018-10-10-why-fair-gambling")
    );

    let summary = report.summary();
    assert_eq!(summary.loaded, 5);
    assert_eq!(summary.superseded, 2);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].contains("unterminated.md"));

    let page = fs::read_to_string(
        site.public_dir
            .join("arithmetics-without-plus")
            .join("index.html"),
    )
    .unwrap();
    assert!(page.contains("data Nat = Z | S Nat\n"));

    let index: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(site.public_dir.join("index.json")).unwrap())
            .unwrap();
    assert_eq!(index.as_array().unwrap().len(), 3);
    assert_eq!(index[2]["title"], "Climbing Knots");
}

#[test]
fn test_build_is_deterministic() {
    let dir = corpus();
    let site = Site::with_config(dir.path(), SiteConfig::default());

    let first = site.inspect().unwrap();
    let second = site.inspect().unwrap();
    assert_eq!(first.clusters, second.clusters);
    assert_eq!(first.output.index, second.output.index);
}

#[test]
fn test_config_file_is_honored() {
    let dir = corpus();
    write(
        dir.path(),
        "_config.yml",
        "title: Essays\npublish:\n  include_drafts: true\n  dedupe: false\n",
    );

    let site = Site::new(dir.path()).unwrap();
    assert_eq!(site.config.title, "Essays");
    let report = site.inspect().unwrap();
    assert_eq!(report.output.len(), 5);
}

#[test]
fn test_clean_removes_output() {
    let dir = corpus();
    let site = Site::with_config(dir.path(), SiteConfig::default());
    site.build().unwrap();
    assert!(site.public_dir.exists());

    site.clean().unwrap();
    assert!(!site.public_dir.exists());
}

#[test]
fn test_rebuild_drops_excluded_pages() {
    let dir = corpus();
    let site = Site::with_config(dir.path(), SiteConfig::default());
    site.build().unwrap();
    let knots = site.public_dir.join("knots").join("index.html");
    assert!(knots.exists());

    write(
        dir.path(),
        "source/_posts/knots.md",
        &essay("Climbing Knots", "2017-05-05", "```\nfigure eight\n"),
    );
    let report = site.build().unwrap();
    assert_eq!(report.output.len(), 2);
    assert_eq!(report.output.failures.len(), 1);
    assert!(!knots.exists());
}
