use std::collections::HashMap;
use std::fs;
use std::path::Path;

use git2::{Commit, Oid, Repository, Signature, Time};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use commitstats::error::{AcquireError, ExtractionError, PipelineError};
use commitstats::schema::RawTable;
use commitstats::tables::GeneralTableBuilder;
use commitstats::{
    CommitExtractor, DelimitedDirSink, LocalCheckout, Pipeline, PipelineConfig,
};

const T_INITIAL: i64 = 1_600_000_100;
const T_ALPHA: i64 = 1_600_000_200;
const T_BETA: i64 = 1_600_000_150;
const T_MERGE: i64 = 1_600_000_300;
const T_UPDATE: i64 = 1_600_000_400;

fn write_tree(repo: &Repository, files: &[(&str, &str)]) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    for (name, content) in files {
        let blob = repo.blob(content.as_bytes()).unwrap();
        builder.insert(*name, blob, 0o100_644).unwrap();
    }
    builder.write().unwrap()
}

fn add_commit(
    repo: &Repository,
    update_head: bool,
    files: &[(&str, &str)],
    parents: &[&Commit],
    message: &str,
    author: (&str, &str),
    time: i64,
) -> Oid {
    let tree = repo.find_tree(write_tree(repo, files)).unwrap();
    let signature = Signature::new(author.0, author.1, &Time::new(time, 0)).unwrap();
    repo.commit(
        update_head.then_some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        parents,
    )
    .unwrap()
}

struct Fixture {
    initial: Oid,
    alpha: Oid,
    beta: Oid,
    merge: Oid,
    update: Oid,
}

/// Five-commit history: two commits and a side branch folded by a merge,
/// then one commit with nothing merged after it.
fn setup_test_repo(path: &Path) -> Fixture {
    let repo = Repository::init(path).unwrap();
    let ann = ("Ann", "ann@example.com");
    let bea = ("Bea", "bea@example.com");

    let base = &[("base.txt", "line one\n")];
    let initial = add_commit(&repo, true, base, &[], "Initial commit", ann, T_INITIAL);
    let initial_commit = repo.find_commit(initial).unwrap();

    let with_alpha = &[("base.txt", "line one\n"), ("alpha.txt", "a\nb\n")];
    let alpha = add_commit(
        &repo,
        true,
        with_alpha,
        &[&initial_commit],
        "Add; alpha; file",
        ann,
        T_ALPHA,
    );

    let with_beta = &[("base.txt", "line one\n"), ("beta.txt", "x\n")];
    let beta = add_commit(
        &repo,
        false,
        with_beta,
        &[&initial_commit],
        "Add beta file",
        bea,
        T_BETA,
    );

    let merged_files = &[
        ("base.txt", "line one\n"),
        ("alpha.txt", "a\nb\n"),
        ("beta.txt", "x\n"),
    ];
    let alpha_commit = repo.find_commit(alpha).unwrap();
    let beta_commit = repo.find_commit(beta).unwrap();
    let merge = add_commit(
        &repo,
        true,
        merged_files,
        &[&alpha_commit, &beta_commit],
        "Merge beta into main line",
        ann,
        T_MERGE,
    );

    let updated_files = &[
        ("base.txt", "line two\n"),
        ("alpha.txt", "a\nb\n"),
        ("beta.txt", "x\n"),
    ];
    let merge_commit = repo.find_commit(merge).unwrap();
    let update = add_commit(
        &repo,
        true,
        updated_files,
        &[&merge_commit],
        "Update base file",
        ann,
        T_UPDATE,
    );

    Fixture {
        initial,
        alpha,
        beta,
        merge,
        update,
    }
}

fn test_config(workspace: &TempDir) -> PipelineConfig {
    PipelineConfig::new(
        workspace.path().join("raw_data"),
        workspace.path().join("results"),
    )
    .with_stat_workers(2)
}

#[tokio::test]
async fn extractor_writes_all_raw_tables() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let raw_dir = config.raw_data_dir.join("sample_repo");
    let extractor = CommitExtractor::new(&repo_dir, &raw_dir, &config);
    extractor.extract_all(&CancellationToken::new()).await.unwrap();

    for table in RawTable::ALL {
        let path = table.path_in(&raw_dir);
        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, table.header().join(";"), "header of {:?}", table);
    }

    // Four non-merge commits, one merge.
    let hashes = fs::read_to_string(RawTable::CommitHashes.path_in(&raw_dir)).unwrap();
    assert_eq!(hashes.lines().count(), 5); // header + 4 commits
    let merges = fs::read_to_string(RawTable::MergesInfo.path_in(&raw_dir)).unwrap();
    assert_eq!(merges.lines().count(), 2); // header + 1 merge
}

#[tokio::test]
async fn general_table_round_trips_extracted_values() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    let fixture = setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let raw_dir = config.raw_data_dir.join("sample_repo");
    CommitExtractor::new(&repo_dir, &raw_dir, &config)
        .extract_all(&CancellationToken::new())
        .await
        .unwrap();

    let rows = GeneralTableBuilder::new(&raw_dir).build().unwrap();
    assert_eq!(rows.len(), 4);
    let by_hash: HashMap<String, _> = rows
        .into_iter()
        .map(|row| (row.commit.commit_hash.clone(), row))
        .collect();

    let initial = &by_hash[&fixture.initial.to_string()];
    assert_eq!(initial.commit_message, "Initial commit");
    // Root commit has no parent to diff against; stats degrade to zero.
    assert_eq!((initial.insertions, initial.deletions), (0, 0));

    let alpha = &by_hash[&fixture.alpha.to_string()];
    // Separators inside the subject are stripped, not escaped.
    assert_eq!(alpha.commit_message, "Add alpha file");
    assert_eq!((alpha.insertions, alpha.deletions), (2, 0));

    let beta = &by_hash[&fixture.beta.to_string()];
    assert_eq!((beta.insertions, beta.deletions), (1, 0));

    let update = &by_hash[&fixture.update.to_string()];
    assert_eq!((update.insertions, update.deletions), (1, 1));
}

#[tokio::test]
async fn commits_adopt_nearest_subsequent_merge() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    let fixture = setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let raw_dir = config.raw_data_dir.join("sample_repo");
    CommitExtractor::new(&repo_dir, &raw_dir, &config)
        .extract_all(&CancellationToken::new())
        .await
        .unwrap();

    let rows = GeneralTableBuilder::new(&raw_dir).build().unwrap();
    for row in &rows {
        match &row.nearest_merge {
            Some(merge) => {
                assert_eq!(merge.merge_hash, fixture.merge.to_string());
                assert_eq!(merge.merge_unix_time, T_MERGE);
                assert!(merge.merge_unix_time >= row.commit.commit_unix_time);
                assert_eq!(
                    merge.time_before_merge,
                    T_MERGE - row.commit.commit_unix_time
                );
            }
            None => {
                // Only the commit after the merge has nothing to adopt.
                assert_eq!(row.commit.commit_hash, fixture.update.to_string());
            }
        }
    }
}

#[tokio::test]
async fn extraction_is_idempotent() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let raw_dir = config.raw_data_dir.join("sample_repo");
    let extractor = CommitExtractor::new(&repo_dir, &raw_dir, &config);

    extractor.extract_all(&CancellationToken::new()).await.unwrap();
    let first: Vec<String> = RawTable::ALL
        .iter()
        .map(|t| fs::read_to_string(t.path_in(&raw_dir)).unwrap())
        .collect();

    extractor.extract_all(&CancellationToken::new()).await.unwrap();
    let second: Vec<String> = RawTable::ALL
        .iter()
        .map(|t| fs::read_to_string(t.path_in(&raw_dir)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn change_stats_need_the_hash_table_first() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let raw_dir = config.raw_data_dir.join("sample_repo");
    let extractor = CommitExtractor::new(&repo_dir, &raw_dir, &config);

    let err = extractor
        .extract_change_stats_all(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::MissingPrerequisite { .. }));
}

#[tokio::test]
async fn cancelled_stat_extraction_keeps_collected_rows() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let raw_dir = config.raw_data_dir.join("sample_repo");
    let extractor = CommitExtractor::new(&repo_dir, &raw_dir, &config);
    extractor.extract_hashes().await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let written = extractor.extract_change_stats_all(&cancel).await.unwrap();
    assert_eq!(written, 0);

    // The table still exists with its header, ready for a later rerun.
    let content =
        fs::read_to_string(RawTable::InsertionsDeletions.path_in(&raw_dir)).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn pipeline_persists_derived_tables_with_repo_prefix() {
    let workspace = TempDir::new().unwrap();
    let repo_dir = workspace.path().join("sample_repo");
    setup_test_repo(&repo_dir);

    let config = test_config(&workspace);
    let results_dir = config.results_dir.clone();
    let pipeline = Pipeline::new(config);
    let source = LocalCheckout::new(&repo_dir);
    let sink = DelimitedDirSink::new(&results_dir);

    let summary = pipeline
        .run_repo(&source, &sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.repository, "sample_repo");
    assert_eq!(summary.commits, 4);
    assert_eq!(summary.authors, 2);

    for name in [
        "sample_repo_general_commits_info.csv",
        "sample_repo_authors_stats.csv",
        "sample_repo_messages_all_words.csv",
        "sample_repo_messages_raw_words_freq.csv",
        "sample_repo_messages_stemmed_words_freq.csv",
    ] {
        assert!(results_dir.join(name).exists(), "missing {name}");
    }

    // Two authors, ordered by email.
    let authors = fs::read_to_string(results_dir.join("sample_repo_authors_stats.csv")).unwrap();
    let mut lines = authors.lines().skip(1);
    assert!(lines.next().unwrap().starts_with("ann@example.com;Ann;3;"));
    assert!(lines.next().unwrap().starts_with("bea@example.com;Bea;1;"));
}

#[tokio::test]
async fn missing_checkout_fails_in_the_acquire_stage() {
    let workspace = TempDir::new().unwrap();
    let config = test_config(&workspace);
    let results_dir = config.results_dir.clone();
    let pipeline = Pipeline::new(config);
    let sink = DelimitedDirSink::new(&results_dir);

    let source = LocalCheckout::new(workspace.path().join("does_not_exist"));
    let err = pipeline
        .run_repo(&source, &sink, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Acquire(AcquireError::MissingCheckout { .. })
    ));

    let plain_dir = workspace.path().join("plain_dir");
    fs::create_dir_all(&plain_dir).unwrap();
    let source = LocalCheckout::new(&plain_dir);
    let err = pipeline
        .run_repo(&source, &sink, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Acquire(AcquireError::NotARepository { .. })
    ));
}
