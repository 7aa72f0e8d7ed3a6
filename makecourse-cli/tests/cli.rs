use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("makecourse")?
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("makecourse.yml"));
    Ok(())
}

#[test]
fn unknown_recipe_kind_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("makecourse.yml"),
        "course: course.xml\noutput: 'generated/{type}/'\nrecipes:\n  DS: exam\n",
    )?;
    fs::write(dir.path().join("course.xml"), "<Course/>")?;

    Command::cargo_bin("makecourse")?
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown recipe kind"));
    Ok(())
}

#[test]
fn course_without_buildable_units_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("makecourse.yml"),
        "course: course.xml\noutput: 'generated/{type}/'\n",
    )?;
    fs::write(
        dir.path().join("course.xml"),
        "<Course year='2025'><intro>welcome</intro></Course>",
    )?;

    Command::cargo_bin("makecourse")?
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 built, 0 up to date"));
    Ok(())
}

#[test]
fn malformed_course_document_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("makecourse.yml"),
        "course: course.xml\noutput: 'generated/{type}/'\n",
    )?;
    fs::write(dir.path().join("course.xml"), "<Course><open>")?;

    Command::cargo_bin("makecourse")?
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("course.xml"));
    Ok(())
}
