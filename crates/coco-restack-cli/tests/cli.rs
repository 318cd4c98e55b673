// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use assert_cmd::Command;
use serde_json::{Value, json};
use std::{fs, path::Path};
use tempfile::TempDir;

const ENV_VARS: [&str; 5] = [
    "RESTACK_INPUT_ROOT",
    "RESTACK_STAGING_ROOT",
    "RESTACK_OUTPUT_ROOT",
    "RESTACK_TRAIN_RATIO",
    "RESTACK_SEED",
];

/// Writes a default-layout input tree with `n` images, all present on disk.
fn write_input(root: &Path, n: u64) {
    let labels = root.join("smaller_publaynet_dataset/labels/publaynet");
    let images_dir = root.join("smaller_publaynet_dataset/train-0/publaynet/train");
    fs::create_dir_all(&labels).unwrap();
    fs::create_dir_all(&images_dir).unwrap();

    let images: Vec<Value> = (1..=n)
        .map(|id| json!({"id": id, "file_name": format!("PMC{}_00000.jpg", id), "width": 612, "height": 792}))
        .collect();
    let annotations: Vec<Value> = (1..=n)
        .map(|id| json!({"id": id * 10, "image_id": id, "category_id": 1, "bbox": [1.0, 2.0, 3.0, 4.0], "area": 12.0, "iscrowd": 0}))
        .collect();
    let categories = json!([{"supercategory": "", "id": 1, "name": "text"}]);

    let train = json!({"categories": categories, "images": images, "annotations": annotations});
    let val = json!({"categories": categories, "images": [], "annotations": []});
    fs::write(labels.join("train.json"), train.to_string()).unwrap();
    fs::write(labels.join("val.json"), val.to_string()).unwrap();

    for id in 1..=n {
        fs::write(images_dir.join(format!("PMC{}_00000.jpg", id)), b"jpeg").unwrap();
    }
}

fn restack(dir: &Path) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-restack")?;
    cmd.current_dir(dir);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    Ok(cmd)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_default_run() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    write_input(temp_dir.path(), 10);

    restack(temp_dir.path())?
        .assert()
        .success()
        .stdout(predicates::str::contains("Dataset Summary:"))
        .stdout(predicates::str::contains("Train set: 8 images, 8 annotations"))
        .stdout(predicates::str::contains("Val set: 2 images, 2 annotations"));

    let output = temp_dir.path().join("coco_dataset");
    let train = read_json(&output.join("annotations/instances_train.json"));
    assert_eq!(train["images"].as_array().unwrap().len(), 8);
    assert_eq!(fs::read_dir(output.join("images/val"))?.count(), 2);
    assert!(!temp_dir.path().join("temp_dataset").exists());
    Ok(())
}

#[test]
fn test_run_with_options() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    write_input(temp_dir.path(), 10);

    restack(temp_dir.path())?
        .args(["--output", "custom_out", "run", "--train-ratio", "0.5"])
        .args(["--seed", "7", "--keep-staging"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Train set: 5 images"));

    assert!(temp_dir.path().join("custom_out/images/train").is_dir());
    assert!(temp_dir.path().join("temp_dataset/annotations/all.json").is_file());
    Ok(())
}

#[test]
fn test_ratio_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    write_input(temp_dir.path(), 10);

    restack(temp_dir.path())?
        .env("RESTACK_TRAIN_RATIO", "0.3")
        .assert()
        .success()
        .stdout(predicates::str::contains("Train set: 3 images"));
    Ok(())
}

#[test]
fn test_stages_then_verify() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    write_input(temp_dir.path(), 6);

    restack(temp_dir.path())?
        .arg("aggregate")
        .assert()
        .success()
        .stdout(predicates::str::contains("Staged 6 of 6 images"));

    restack(temp_dir.path())?
        .args(["resplit", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Train set: 4 images"));

    restack(temp_dir.path())?
        .arg("verify")
        .assert()
        .success()
        .stdout(predicates::str::contains("PASSED"));

    fs::write(
        temp_dir.path().join("coco_dataset/images/train/stray.jpg"),
        b"x",
    )?;
    restack(temp_dir.path())?
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicates::str::contains("FAILED"));
    Ok(())
}

#[test]
fn test_missing_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;

    restack(temp_dir.path())?
        .assert()
        .failure()
        .stderr(predicates::str::contains("MissingInputFile"));
    Ok(())
}

#[test]
fn test_invalid_ratio_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    write_input(temp_dir.path(), 2);

    restack(temp_dir.path())?
        .args(["run", "--train-ratio", "1.5"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("train_ratio"));
    Ok(())
}
