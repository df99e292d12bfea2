//! Integration tests for package equivalence
//!
//! These tests check that reading, transforming and saving a package keeps
//! its manifest in the expected state.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use opcdiag_core::{hash_blob, DiffPresenter, Manifest, OpcError, Package};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SLIDE_MASTER_URI: &str = "ppt/slideMasters/slideMaster1.xml";

/// Build a small presentation package with the given slide master title
fn create_test_package(master_title: &str, core_title: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/></Types>"#).unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#).unwrap();

    zip.start_file("docProps/core.xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#,
        core_title
    )
    .unwrap();

    zip.start_file("ppt/presentation.xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst/></p:presentation>"#).unwrap();

    zip.start_file(SLIDE_MASTER_URI, options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><a:t>{}</a:t></p:cSld></p:sldMaster>"#,
        master_title
    )
    .unwrap();

    zip.start_file("ppt/media/image1.png", options).unwrap();
    zip.write_all(&[0x89, b'P', b'N', b'G', 0x00, 0x01]).unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

fn write_package(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_read_and_save_keeps_manifest() {
    let temp = TempDir::new().unwrap();
    let src = write_package(temp.path(), "base.pptx", &create_test_package("A", "Base"));
    let dst = temp.path().join("copy.pptx");

    Package::read(&src).unwrap().save(&dst).unwrap();

    let expected = Manifest::from_path(&src).unwrap();
    let actual = Manifest::from_path(&dst).unwrap();
    assert_eq!(actual, expected, "{}", actual.diff(&expected, "copy", "base"));
}

#[test]
fn test_extract_then_repackage_keeps_manifest() {
    let temp = TempDir::new().unwrap();
    let src = write_package(temp.path(), "base.pptx", &create_test_package("A", "Base"));
    let dir = temp.path().join("extracted");
    let repackaged = temp.path().join("repackaged.pptx");

    Package::read(&src).unwrap().save_to_dir(&dir).unwrap();
    assert_eq!(Manifest::from_path(&dir).unwrap(), Manifest::from_path(&src).unwrap());

    Package::read(&dir).unwrap().save(&repackaged).unwrap();
    assert_eq!(
        Manifest::from_path(&repackaged).unwrap(),
        Manifest::from_path(&src).unwrap()
    );
}

#[test]
fn test_extract_with_prettify_rewrites_only_xml_items() {
    let temp = TempDir::new().unwrap();
    let src = write_package(temp.path(), "base.pptx", &create_test_package("A", "Base"));
    let dir = temp.path().join("extracted");

    let mut package = Package::read(&src).unwrap();
    package.prettify_xml().unwrap();
    package.save_to_dir(&dir).unwrap();

    let before = Manifest::from_path(&src).unwrap();
    let after = Manifest::from_path(&dir).unwrap();
    assert_eq!(after.len(), before.len());
    assert_eq!(
        after.get("ppt/media/image1.png").unwrap(),
        before.get("ppt/media/image1.png").unwrap()
    );
    assert_ne!(
        after.get(SLIDE_MASTER_URI).unwrap(),
        before.get(SLIDE_MASTER_URI).unwrap()
    );

    let master = fs::read_to_string(dir.join("ppt/slideMasters/slideMaster1.xml")).unwrap();
    assert!(master.starts_with("<?xml version='1.0' encoding='UTF-8' standalone='yes'?>\n"));
    assert!(master.contains("\n  <p:cSld>\n    <a:t>A</a:t>\n  </p:cSld>\n"));
}

#[test]
fn test_substitute_changes_only_the_named_item() {
    let temp = TempDir::new().unwrap();
    let pkg_a = write_package(temp.path(), "a.pptx", &create_test_package("Source", "A"));
    let pkg_b = write_package(temp.path(), "b.pptx", &create_test_package("Target", "B"));
    let pkg_c = temp.path().join("c.pptx");

    let source = Package::read(&pkg_a).unwrap();
    let mut target = Package::read(&pkg_b).unwrap();
    let src_item = source.find_item_by_uri_tail("slideMaster1.xml").unwrap();
    target.substitute_item(src_item).unwrap();
    target.save(&pkg_c).unwrap();

    let manifest_a = Manifest::from_path(&pkg_a).unwrap();
    let mut expected = Manifest::from_path(&pkg_b).unwrap();
    expected
        .set(SLIDE_MASTER_URI, manifest_a.get(SLIDE_MASTER_URI).unwrap())
        .unwrap();

    let actual = Manifest::from_path(&pkg_c).unwrap();
    assert_eq!(actual, expected, "{}", actual.diff(&expected, "actual", "expected"));
    assert_eq!(
        actual.get("docProps/core.xml").unwrap(),
        hash_blob(Package::read(&pkg_b).unwrap().get("docProps/core.xml").unwrap().blob())
    );
}

#[test]
fn test_save_to_dir_refuses_to_replace_file() {
    let temp = TempDir::new().unwrap();
    let src = write_package(temp.path(), "base.pptx", &create_test_package("A", "Base"));
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, b"keep me").unwrap();

    let err = Package::read(&src).unwrap().save_to_dir(&blocker).unwrap_err();
    assert!(matches!(err, OpcError::NotADirectory(_)));
    assert_eq!(fs::read(&blocker).unwrap(), b"keep me");
}

#[test]
fn test_package_diff() {
    let temp = TempDir::new().unwrap();
    let pkg_1 = write_package(temp.path(), "one.pptx", &create_test_package("A", "One"));
    let pkg_2 = write_package(temp.path(), "two.pptx", &create_test_package("A", "Two"));
    let package_1 = Package::read(&pkg_1).unwrap();
    let package_2 = Package::read(&pkg_2).unwrap();
    let presenter = DiffPresenter::new();

    assert!(presenter.package_diff(&package_1, &package_1).unwrap().is_empty());

    let diff = presenter.package_diff(&package_1, &package_2).unwrap();
    assert!(diff.content_types.is_empty());
    assert!(diff.rels.is_empty());
    assert_eq!(diff.xml_parts.len(), 1);
    assert!(diff.xml_parts[0].contains("-  <dc:title>One</dc:title>"));
    assert!(diff.xml_parts[0].contains("+  <dc:title>Two</dc:title>"));
}
