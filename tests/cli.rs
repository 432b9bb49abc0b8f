use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn kusmala() -> Command {
    Command::cargo_bin("kusmala").expect("binary is built")
}

fn write_program(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("write program");
    path
}

#[test]
fn runs_a_program_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_program(
        &dir,
        "fib.km",
        r#"
        // deret fibonacci
        buat fib = fungsi(n) {
            jika (n < 2) { kembalikan n; }
            fib(n - 1) + fib(n - 2)
        };
        cetak("fib", fib(10));
        "#,
    );
    kusmala()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout("fib 55\n");
}

#[test]
fn runs_an_inline_expression() {
    kusmala()
        .args(["run", "--expr", "buat a = [1, 2, 3]; cetak(panjang(a), a[2])"])
        .assert()
        .success()
        .stdout("3 3\n");
}

#[test]
fn top_level_values_are_not_echoed() {
    kusmala()
        .args(["run", "--expr", "1 + 2"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn rejects_files_without_the_source_extension() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_program(&dir, "program.txt", "cetak(1)");
    kusmala()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("berekstensi .km"));
}

#[test]
fn reports_missing_files() {
    kusmala()
        .args(["run", "tidak_ada.km"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gagal membaca berkas"));
}

#[test]
fn parse_errors_are_listed_and_nothing_runs() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_program(&dir, "rusak.km", "cetak(1);\nbuat = 2;\njika () { 3 }");
    kusmala()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("kesalahan sintaks:"))
        .stderr(predicate::str::contains("\t2: mengharapkan IDENTIFIER dekat '='"))
        .stderr(predicate::str::contains("kondisi tidak boleh kosong"));
}

#[test]
fn runtime_errors_stop_the_program() {
    kusmala()
        .args(["run", "--expr", "cetak(1);\n1 + benar;\ncetak(2);"])
        .assert()
        .failure()
        .stdout("1\n")
        .stderr(predicate::str::contains("2: tipe tidak cocok dekat '1 + benar'"));
}

#[test]
fn collect_errors_keeps_going() {
    kusmala()
        .args([
            "run",
            "--collect-errors",
            "--expr",
            "hilang;\ncetak(2);\n[1][5];",
        ])
        .assert()
        .failure()
        .stdout("2\n")
        .stderr(predicate::str::contains("1: identifier tidak dikenal dekat 'hilang'"))
        .stderr(predicate::str::contains("3: indeks di luar batas dekat '5'"));
}

#[test]
fn tree_flag_prints_the_outline_before_running() {
    kusmala()
        .args(["run", "--tree", "--expr", "buat x = 4 - 2; cetak(x)"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("DECLARE x\n  INFIX -\n"))
        .stdout(predicate::str::ends_with("PRINT\n  IDENT x\n2\n"));
}

#[test]
fn tokens_flag_lists_the_token_stream() {
    kusmala()
        .args(["run", "--tokens", "--expr", "buat x = 1;"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BUAT"))
        .stdout(predicate::str::contains("IDENTIFIER"))
        .stdout(predicate::str::contains("EOF"));
}

#[test]
fn expr_and_file_conflict() {
    kusmala()
        .args(["run", "a.km", "--expr", "1"])
        .assert()
        .failure();
}

#[test]
fn semicolon_after_a_block_is_accepted() {
    kusmala()
        .args(["run", "--expr", "jika (benar) { cetak(1) };\n{ cetak(2) };"])
        .assert()
        .success()
        .stdout("1\n2\n");
}
