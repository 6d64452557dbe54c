use super::*;
use crate::test_support::Fixture;

#[test]
fn resolves_directory_inputs_and_language() {
    let fixture = Fixture::new();
    let config = fixture.config();

    assert_eq!(config.identifier, "abc");
    assert_eq!(config.language, Language::Py);
    assert_eq!(config.model, fixture.src.join("sol.py"));
    assert_eq!(
        config.inputs,
        InputsSource::Directory(fixture.src.join("tests"))
    );
    assert_eq!(config.extras, Extras::default());
    assert!(!config.flags.outputs);
    assert!(!config.flags.archive);
}

#[test]
fn single_file_inputs_become_a_generator() {
    let fixture = Fixture::new();
    fixture.write("gen.cpp", b"int main() {}\n");
    let manifest = PackageManifest {
        inputs: PathBuf::from("gen.cpp"),
        ..fixture.manifest()
    };

    let config = fixture.resolve(&manifest);

    assert_eq!(
        config.inputs,
        InputsSource::Generator(fixture.src.join("gen.cpp"))
    );
}

#[test]
fn rejects_unsupported_language_tag() {
    let fixture = Fixture::new();
    let manifest = PackageManifest {
        lang: "java".to_string(),
        ..fixture.manifest()
    };

    let err = manifest.resolve(&fixture.src).expect_err("java is not a tag");

    assert!(err.to_string().contains("\"java\""), "{err}");
}

#[test]
fn rejects_unsafe_identifiers() {
    for bad in ["", "a/b", "..", "abc def", "zad\u{e9}"] {
        assert!(validate_identifier(bad).is_err(), "{bad:?} should be rejected");
    }
    for good in ["abc", "ABC_1", "round-2"] {
        validate_identifier(good).expect("valid identifier");
    }
}

#[test]
fn missing_sources_name_the_offending_path() {
    let fixture = Fixture::new();
    let manifest = PackageManifest {
        checker: Some(PathBuf::from("chk.cpp")),
        ..fixture.manifest()
    };

    let err = manifest.resolve(&fixture.src).expect_err("checker is missing");
    let message = err.to_string();

    assert!(message.contains("checker"), "{message}");
    assert!(message.contains("chk.cpp"), "{message}");
}

#[test]
fn outputs_from_a_generator_fail_fast() {
    let fixture = Fixture::new();
    fixture.write("gen.py", b"print(1)\n");
    let manifest = PackageManifest {
        inputs: PathBuf::from("gen.py"),
        outputs: true,
        ..fixture.manifest()
    };

    let err = manifest.resolve(&fixture.src).expect_err("generator + outputs");

    assert!(err.to_string().contains("generator"), "{err}");
}

#[test]
fn full_cleanup_requires_zip() {
    let fixture = Fixture::new();
    let manifest = PackageManifest {
        fullcleanup: true,
        ..fixture.manifest()
    };

    assert!(manifest.resolve(&fixture.src).is_err());

    let manifest = PackageManifest {
        fullcleanup: true,
        zip: true,
        ..fixture.manifest()
    };
    let config = fixture.resolve(&manifest);
    assert!(config.flags.full_cleanup && config.flags.archive);
}

#[test]
fn manifest_json_resolves_against_its_directory() {
    let fixture = Fixture::new();
    fixture.write("cfg.yml", b"time_limit: 1\n");
    let manifest_path = fixture.write(
        "package.json",
        br#"{
            "name": "abc",
            "model": "sol.py",
            "lang": "py",
            "inputs": "tests",
            "doc": "doc.pdf",
            "cfg": "cfg.yml",
            "zip": true
        }"#,
    );

    let manifest = load_manifest(&manifest_path).expect("load manifest");
    let config = manifest
        .resolve(&manifest_source_root(&manifest_path))
        .expect("resolve manifest");

    assert_eq!(config.extras.config, Some(fixture.src.join("cfg.yml")));
    assert!(config.flags.archive);
    assert!(!config.flags.outputs);
}

#[test]
fn manifest_rejects_unknown_fields() {
    let fixture = Fixture::new();
    let manifest_path = fixture.write(
        "package.json",
        br#"{"name": "abc", "model": "sol.py", "lang": "py", "inputs": "tests", "doc": "doc.pdf", "output": true}"#,
    );

    let err = load_manifest(&manifest_path).expect_err("typo in field name");

    assert!(format!("{err:#}").contains("output"), "{err:#}");
}

#[test]
fn sources_list_every_staged_role() {
    let fixture = Fixture::new();
    fixture.write("cfg.yml", b"memory_limit: 256\n");
    fixture.write("brute.py", b"print(0)\n");
    let config = fixture.resolve(&PackageManifest {
        cfg: Some(PathBuf::from("cfg.yml")),
        addsol: vec![PathBuf::from("brute.py")],
        ..fixture.manifest()
    });

    let labels: Vec<_> = config.sources().into_iter().map(|(label, _)| label).collect();

    assert_eq!(
        labels,
        vec![
            "statement",
            "model solution",
            "inputs directory",
            "config",
            "additional solution"
        ]
    );
}
