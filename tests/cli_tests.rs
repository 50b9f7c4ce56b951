//! End-to-end tests of the `taxon-resolver` binary.

use std::path::{Path, PathBuf};

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const TREE: &str = "\
1\t0\tno rank\troot
2\t1\tdomain\tBacteria
1224\t2\tphylum\tProteobacteria
1236\t1224\tclass\tGammaproteobacteria
562\t1236\tspecies\tEscherichia coli
1239\t2\tphylum\tFirmicutes
1280\t1239\tspecies\tStaphylococcus aureus
2759\t1\tdomain\tEukaryota
9606\t2759\tspecies\tHomo sapiens
";

const ACCESSIONS: &str = "\
# accession\ttaxid
NC_000913\t562
AB123456\t9606
NZ_CP000253\t1280
";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn help_lists_commands() {
    cargo_bin_cmd!("taxon-resolver")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("build-index"))
        .stdout(predicate::str::contains("lca"));
}

#[test]
fn resolve_fasta_headers() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);
    let accessions = write(&tmp, "acc.tsv", ACCESSIONS);
    let reads = write(
        &tmp,
        "reads.fasta",
        ">read1 tax|9606\nACGT\n>gb|NC_000913.3| chromosome\nACGT\n>read3 [Staphylococcus aureus]\nACGT\n>read4 nothing\nACGT\n",
    );

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", path_arg(&reads), "--tree", path_arg(&tree)])
        .args(["--accessions", path_arg(&accessions), "--threads", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("read1 tax|9606\t9606\tHomo sapiens"))
        .stdout(predicate::str::contains("gb|NC_000913.3| chromosome\t562\tEscherichia coli"))
        .stdout(predicate::str::contains("read3 [Staphylococcus aureus]\t1280\tStaphylococcus aureus"))
        .stdout(predicate::str::contains("read4 nothing\t0\t-"))
        .stdout(predicate::str::contains("ACGT").not());
}

#[test]
fn resolve_from_stdin_with_lca() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--algorithm", "lca"])
        .args(["--format", "tsv"])
        .write_stdin("tax|562 tax|1280\nk__Bacteria;p__Firmicutes\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("header\tid\tname\n"))
        .stdout(predicate::str::contains("tax|562 tax|1280\t2\tBacteria"))
        .stdout(predicate::str::contains("k__Bacteria;p__Firmicutes\t1239\tFirmicutes"));
}

#[test]
fn resolve_disabled_ids() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--disable", "9606", "--no-text"])
        .write_stdin("tax|9606\ntax|9606 tax|562\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("tax|9606\t9606\tHomo sapiens"))
        .stdout(predicate::str::contains("tax|9606 tax|562\t562\tEscherichia coli"));
}

#[test]
fn resolve_json_output() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);

    let output = cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--format", "json"])
        .write_stdin(">r1 tax|562\n>r2\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["header"], "r1 tax|562");
    assert_eq!(json[0]["id"], 562);
    assert_eq!(json[0]["name"], "Escherichia coli");
    assert_eq!(json[1]["id"], 0);
    assert!(json[1]["name"].is_null());
}

#[test]
fn resolve_with_config_file() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);
    let config = write(
        &tmp,
        "config.json",
        r#"{"Taxonomy": {"id_tags": ["species:"], "use_text_parsing": false}}"#,
    );

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--config", path_arg(&config)])
        .write_stdin("species:1280 tax|562\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\t1280\tStaphylococcus aureus"));
}

#[test]
fn resolve_rejects_bad_config() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);
    let config = write(&tmp, "config.json", r#"{"Taxonomy": {"no_such_option": 1}}"#);

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--config", path_arg(&config)])
        .write_stdin("tax|562\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading config"));
}

#[test]
fn resolve_requires_a_tree() {
    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-"])
        .write_stdin("tax|562\n")
        .assert()
        .failure();
}

#[test]
fn build_disk_index_and_resolve() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);
    let accessions = write(&tmp, "acc.tsv", ACCESSIONS);
    let index = tmp.path().join("acc.idx");

    cargo_bin_cmd!("taxon-resolver")
        .args(["build-index", path_arg(&accessions), path_arg(&index)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 accessions"));
    assert!(index.exists());

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--accessions", path_arg(&index)])
        .write_stdin("ref|NZ_CP000253.1|\nAB123456 some read\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ref|NZ_CP000253.1|\t1280"))
        .stdout(predicate::str::contains("AB123456 some read\t9606"));
}

#[test]
fn build_sqlite_index_and_resolve() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);
    let accessions = write(&tmp, "acc.tsv", ACCESSIONS);
    let db = tmp.path().join("mapping.db");

    cargo_bin_cmd!("taxon-resolver")
        .args(["build-index", path_arg(&accessions), path_arg(&db), "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entries\": 3"));

    cargo_bin_cmd!("taxon-resolver")
        .args(["resolve", "-", "--tree", path_arg(&tree), "--embedded-db", path_arg(&db)])
        .args(["--threads", "4"])
        .write_stdin("gb|AB123456|\ngb|NC_000913|\ngb|NZ_CP000253|\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("gb|AB123456|\t9606"))
        .stdout(predicate::str::contains("gb|NC_000913|\t562"))
        .stdout(predicate::str::contains("gb|NZ_CP000253|\t1280"));
}

#[test]
fn build_index_rejects_unknown_suffix() {
    let tmp = TempDir::new().unwrap();
    let accessions = write(&tmp, "acc.tsv", ACCESSIONS);

    cargo_bin_cmd!("taxon-resolver")
        .args(["build-index", path_arg(&accessions), path_arg(&tmp.path().join("out.txt"))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must end in .idx"));
}

#[test]
fn lca_command() {
    let tmp = TempDir::new().unwrap();
    let tree = write(&tmp, "tree.tsv", TREE);

    cargo_bin_cmd!("taxon-resolver")
        .args(["lca", "--tree", path_arg(&tree), "562", "1280"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2\tBacteria\tdomain"));

    cargo_bin_cmd!("taxon-resolver")
        .args(["lca", "--tree", path_arg(&tree), "562", "31337"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("31337"));
}
