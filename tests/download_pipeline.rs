use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jersey_dataset::{
    download_all, process_split, DownloadConfig, FetchError, RetryPolicy, Split, SplitStats,
};

fn record(url: &str, label: &str) -> String {
    format!(
        r#"{{"messages":[{{"role":"system","content":"Read the jersey number."}},{{"role":"user","content":[{{"type":"image_url","image_url":{{"url":"{url}"}}}}]}},{{"role":"assistant","content":"{label}"}}]}}"#
    )
}

fn config(root: &Path) -> DownloadConfig {
    DownloadConfig {
        annotations_dir: root.join("annotations"),
        output_dir: root.join("dataset"),
        retry: RetryPolicy {
            backoff_base: Duration::ZERO,
            backoff_step: Duration::ZERO,
            ..RetryPolicy::default()
        },
    }
}

fn write_split(config: &DownloadConfig, split: Split, lines: &[String]) {
    fs::create_dir_all(&config.annotations_dir).unwrap();
    fs::write(
        config.annotations_dir.join(split.annotation_file()),
        lines.join("\n"),
    )
    .unwrap();
}

/// Serves `body-of-<url>` for every url except those containing "dead".
fn fake_server(calls: &RefCell<Vec<String>>) -> impl Fn(&str) -> Result<Vec<u8>, FetchError> + '_ {
    move |url: &str| {
        calls.borrow_mut().push(url.to_string());
        if url.contains("dead") {
            Err(FetchError::Status(404))
        } else {
            Ok(format!("body-of-{url}").into_bytes())
        }
    }
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for class in fs::read_dir(dir).unwrap() {
        let class = class.unwrap().path();
        for file in fs::read_dir(&class).unwrap() {
            files.push(file.unwrap().path());
        }
    }
    files.sort_by_key(|p| p.file_name().unwrap().to_os_string());
    files
}

#[test]
fn test_split_sorts_images_into_label_folders() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config(temp.path());
    write_split(
        &config,
        Split::Train,
        &[
            record("http://img/1.jpg", " 23 "),
            String::new(),
            record("http://img/2.jpg", "7"),
            "{broken".to_string(),
            r#"{"messages":[{"role":"assistant","content":"9"}]}"#.to_string(),
            record("http://img/dead.jpg", "7"),
            record("http://img/3.jpg", "23"),
        ],
    );

    let calls = RefCell::new(Vec::new());
    let stats = process_split(&fake_server(&calls), &config, Split::Train).unwrap();

    assert_eq!(
        stats,
        SplitStats {
            records: 6,
            downloaded: 3,
            malformed: 2,
            failed: 1,
        }
    );

    let train = config.output_dir.join("train");
    assert_eq!(
        fs::read(train.join("23").join("000001.jpg")).unwrap(),
        b"body-of-http://img/1.jpg"
    );
    assert_eq!(
        fs::read(train.join("7").join("000002.jpg")).unwrap(),
        b"body-of-http://img/2.jpg"
    );
    assert_eq!(
        fs::read(train.join("23").join("000006.jpg")).unwrap(),
        b"body-of-http://img/3.jpg"
    );
    assert!(!train.join("7").join("000005.jpg").exists());

    // dead url: five attempts, everything else once
    let calls = calls.into_inner();
    assert_eq!(calls.iter().filter(|u| u.contains("dead")).count(), 5);
    assert_eq!(calls.len(), 8);
}

#[test]
fn test_file_names_follow_line_order_across_labels() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config(temp.path());
    let labels = ["4", "11", "4", "0", "11", "30"];
    let lines: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| record(&format!("http://img/{i}.jpg"), label))
        .collect();
    write_split(&config, Split::Valid, &lines);

    let calls = RefCell::new(Vec::new());
    process_split(&fake_server(&calls), &config, Split::Valid).unwrap();

    let files = files_under(&config.output_dir.join("valid"));
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "000001.jpg",
            "000002.jpg",
            "000003.jpg",
            "000004.jpg",
            "000005.jpg",
            "000006.jpg"
        ]
    );
    for (path, label) in files.iter().zip(labels) {
        assert_eq!(path.parent().unwrap().file_name().unwrap(), label);
    }
    assert_eq!(
        calls.into_inner(),
        (0..6).map(|i| format!("http://img/{i}.jpg")).collect::<Vec<_>>()
    );
}

#[test]
fn test_rerun_overwrites_existing_images() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config(temp.path());
    write_split(&config, Split::Test, &[record("http://img/a.jpg", "5")]);

    let target = config.output_dir.join("test").join("5").join("000001.jpg");
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, b"stale").unwrap();

    let calls = RefCell::new(Vec::new());
    process_split(&fake_server(&calls), &config, Split::Test).unwrap();
    assert_eq!(fs::read(&target).unwrap(), b"body-of-http://img/a.jpg");
}

#[test]
fn test_missing_split_file_does_not_stop_other_splits() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config(temp.path());
    write_split(&config, Split::Train, &[record("http://img/t.jpg", "1")]);
    write_split(&config, Split::Test, &[record("http://img/s.jpg", "2")]);

    let calls = RefCell::new(Vec::new());
    let results = download_all(&fake_server(&calls), &config);

    let splits: Vec<Split> = results.iter().map(|(split, _)| *split).collect();
    assert_eq!(splits, [Split::Train, Split::Test]);
    assert!(config.output_dir.join("train/1/000001.jpg").exists());
    assert!(config.output_dir.join("test/2/000001.jpg").exists());
    assert!(!config.output_dir.join("valid").exists());
}
