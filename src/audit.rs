use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::split::Split;

const IMAGE_SUFFIXES: [&str; 3] = [".jpg", ".jpeg", ".png"];
const RULE_WIDTH: usize = 60;

/// Classes found for one split. Folder names and label-file ids never mix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassSet {
    Folders(BTreeSet<String>),
    LabelIds(BTreeSet<i64>),
}

impl ClassSet {
    pub fn len(&self) -> usize {
        match self {
            ClassSet::Folders(set) => set.len(),
            ClassSet::LabelIds(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> &'static str {
        match self {
            ClassSet::Folders(_) => "folder",
            ClassSet::LabelIds(_) => "label-file",
        }
    }

    /// Classes in `self` that are absent from `other`.
    pub fn difference(&self, other: &ClassSet) -> Result<ClassSet, AuditError> {
        match (self, other) {
            (ClassSet::Folders(a), ClassSet::Folders(b)) => {
                Ok(ClassSet::Folders(a.difference(b).cloned().collect()))
            }
            (ClassSet::LabelIds(a), ClassSet::LabelIds(b)) => {
                Ok(ClassSet::LabelIds(a.difference(b).copied().collect()))
            }
            _ => Err(AuditError::ModeMismatch {
                left: self.mode(),
                right: other.mode(),
            }),
        }
    }

    /// Sorted class names, as used for folder lookups.
    pub fn names(&self) -> Vec<String> {
        match self {
            ClassSet::Folders(set) => set.iter().cloned().collect(),
            ClassSet::LabelIds(set) => set.iter().map(i64::to_string).collect(),
        }
    }

    fn contains_name(&self, name: &str) -> bool {
        match self {
            ClassSet::Folders(set) => set.contains(name),
            ClassSet::LabelIds(set) => name.parse::<i64>().map_or(false, |id| set.contains(&id)),
        }
    }
}

impl fmt::Display for ClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = match self {
            ClassSet::Folders(set) => set.iter().map(|name| format!("'{name}'")).collect(),
            ClassSet::LabelIds(set) => set.iter().map(i64::to_string).collect(),
        };
        write!(f, "[{}]", items.join(", "))
    }
}

/// Immediate subdirectories of `split_root`. A missing root has no classes.
pub fn folder_classes(split_root: &Path) -> Result<BTreeSet<String>, AuditError> {
    let mut classes = BTreeSet::new();
    if !split_root.exists() {
        return Ok(classes);
    }
    for entry in fs::read_dir(split_root).map_err(|e| AuditError::io(split_root, e))? {
        let entry = entry.map_err(|e| AuditError::io(split_root, e))?;
        if entry.path().is_dir() {
            classes.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(classes)
}

/// Integer class ids from the first token of every line in `labels_dir/*.txt`.
pub fn label_file_classes(labels_dir: &Path) -> Result<BTreeSet<i64>, AuditError> {
    let mut classes = BTreeSet::new();
    if !labels_dir.exists() {
        return Ok(classes);
    }

    let mut label_files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(labels_dir).map_err(|e| AuditError::io(labels_dir, e))? {
        let path = entry.map_err(|e| AuditError::io(labels_dir, e))?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "txt") {
            label_files.push(path);
        }
    }
    label_files.sort();

    for path in label_files {
        let content = fs::read_to_string(&path).map_err(|e| AuditError::io(&path, e))?;
        for (line_no, line) in (1..).zip(content.lines()) {
            let Some(token) = line.split_whitespace().next() else {
                continue;
            };
            let id = token.parse::<i64>().map_err(|_| AuditError::LabelParse {
                path: path.clone(),
                line: line_no,
                token: token.to_string(),
            })?;
            classes.insert(id);
        }
    }
    Ok(classes)
}

/// Image files (by suffix) directly inside `class_dir`.
pub fn count_images(class_dir: &Path) -> Result<usize, AuditError> {
    let mut count = 0;
    for entry in fs::read_dir(class_dir).map_err(|e| AuditError::io(class_dir, e))? {
        let entry = entry.map_err(|e| AuditError::io(class_dir, e))?;
        if entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if IMAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            count += 1;
        }
    }
    Ok(count)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassCount {
    pub class: String,
    pub images: usize,
    pub missing_in_valid: bool,
    pub missing_in_test: bool,
}

#[derive(Clone, Debug)]
pub struct AuditReport {
    pub used_label_files: bool,
    pub train: ClassSet,
    pub valid: ClassSet,
    pub test: ClassSet,
    pub missing_in_valid: ClassSet,
    pub missing_in_test: ClassSet,
    /// Present only when the train root is a directory.
    pub image_counts: Option<Vec<ClassCount>>,
}

/// Discover classes for every split, diff them against train and count train images.
///
/// Folder discovery is tried first. If it finds nothing for train, every split
/// is re-read from the dataset-level `labels/*.txt` files instead. Those files
/// carry no split, so all three splits get the same id set.
pub fn audit_dataset(config: &AuditConfig) -> Result<AuditReport, AuditError> {
    let root = &config.dataset_dir;
    let split_root = |split: Split| root.join(split.as_str());

    let folders = |split: Split| folder_classes(&split_root(split)).map(ClassSet::Folders);
    let mut used_label_files = false;
    let mut train = folders(Split::Train)?;
    let mut valid = folders(Split::Valid)?;
    let mut test = folders(Split::Test)?;
    if train.is_empty() {
        info!("no class folders under train, falling back to label files");
        used_label_files = true;
        let ids = label_file_classes(&root.join("labels"))?;
        train = ClassSet::LabelIds(ids.clone());
        valid = ClassSet::LabelIds(ids.clone());
        test = ClassSet::LabelIds(ids);
    }

    let missing_in_valid = train.difference(&valid)?;
    let missing_in_test = train.difference(&test)?;

    let train_root = split_root(Split::Train);
    let image_counts = if train_root.is_dir() {
        Some(count_train_images(
            &train_root,
            &train,
            &missing_in_valid,
            &missing_in_test,
        )?)
    } else {
        None
    };

    Ok(AuditReport {
        used_label_files,
        train,
        valid,
        test,
        missing_in_valid,
        missing_in_test,
        image_counts,
    })
}

fn count_train_images(
    train_root: &Path,
    train: &ClassSet,
    missing_in_valid: &ClassSet,
    missing_in_test: &ClassSet,
) -> Result<Vec<ClassCount>, AuditError> {
    train
        .names()
        .par_iter()
        .filter_map(|class| {
            let class_dir = train_root.join(class);
            if !class_dir.is_dir() {
                return None;
            }
            let counted = count_images(&class_dir).map(|images| {
                debug!(class = class.as_str(), images, "counted class folder");
                ClassCount {
                    class: class.clone(),
                    images,
                    missing_in_valid: missing_in_valid.contains_name(class),
                    missing_in_test: missing_in_test.contains_name(class),
                }
            });
            Some(counted)
        })
        .collect()
}

fn rule(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analyzing dataset splits...\n")?;
        if self.used_label_files {
            writeln!(f, "Trying label file analysis...\n")?;
        }

        writeln!(f, "Train set: {} classes", self.train.len())?;
        writeln!(f, "Valid set: {} classes", self.valid.len())?;
        writeln!(f, "Test set: {} classes", self.test.len())?;
        writeln!(f)?;

        rule(f, "MISSING CLASSES ANALYSIS")?;
        for (missing, split, name) in [
            (&self.missing_in_valid, "VALID", "validation"),
            (&self.missing_in_test, "TEST", "test"),
        ] {
            if missing.is_empty() {
                writeln!(f, "\n✅ All training classes present in {name} set")?;
            } else {
                writeln!(
                    f,
                    "\n❌ Classes in TRAIN but missing in {split} ({}):",
                    missing.len()
                )?;
                writeln!(f, "   {missing}")?;
            }
        }

        writeln!(f)?;
        rule(f, "ALL CLASSES")?;
        writeln!(f, "\nTrain classes: {}", self.train)?;
        writeln!(f, "\nValid classes: {}", self.valid)?;
        writeln!(f, "\nTest classes: {}", self.test)?;

        if let Some(counts) = &self.image_counts {
            writeln!(f)?;
            rule(f, "IMAGE COUNT PER CLASS (Train set)")?;
            for count in counts {
                write!(f, "  Class {}: {} images", count.class, count.images)?;
                if count.missing_in_valid {
                    write!(f, " ⚠️ MISSING IN VALID")?;
                }
                if count.missing_in_test {
                    write!(f, " ⚠️ MISSING IN TEST")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
