use bake_template::{parse_str, TemplateError};

const BASIC: &str = r#"{
    "description": "chroot image",
    "min_packer_version": "1.2.0",
    "variables": { "region": "eu-west-1" },
    "builders": [
        { "type": "chroot", "mount_path": "/mnt/root", "force": true },
        { "type": "chroot", "name": "second", "mount_path": "/mnt/other" }
    ],
    "provisioners": [
        { "type": "shell", "inline": ["apt-get update"], "only": ["chroot"], "pause_before": "10s" },
        { "type": "file", "source": "a", "destination": "/a", "except": ["second"],
          "override": { "chroot": { "source": "b" } } }
    ],
    "post-processors": ["compress"]
}"#;

#[test]
fn parses_builders_and_provisioners() {
    let tpl = parse_str(BASIC).unwrap();
    assert_eq!(tpl.description.as_deref(), Some("chroot image"));
    assert_eq!(tpl.min_version.as_deref(), Some("1.2.0"));
    assert_eq!(tpl.variables["region"], "eu-west-1");
    assert_eq!(tpl.post_processors.len(), 1);

    let names: Vec<&str> = tpl.builders.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["chroot", "second"]);
    let chroot = tpl.builder("chroot").unwrap();
    assert_eq!(chroot.kind, "chroot");
    assert!(!chroot.config.contains_key("type"));
    assert!(!chroot.config.contains_key("name"));
    assert_eq!(chroot.config["mount_path"], "/mnt/root");
    assert_eq!(tpl.builders_of_type("chroot").count(), 2);

    let shell = &tpl.provisioners[0];
    assert_eq!(shell.kind, "shell");
    assert_eq!(shell.only, vec!["chroot"]);
    assert_eq!(shell.pause_before.as_deref(), Some("10s"));
    assert!(shell.config.contains_key("inline"));
    assert!(!shell.config.contains_key("only"));
    assert!(shell.applies_to("chroot"));
    assert!(!shell.applies_to("second"));

    let file = &tpl.provisioners[1];
    assert!(file.overrides.contains_key("chroot"));
    assert!(file.applies_to("chroot"));
    assert!(!file.applies_to("second"));
    assert_eq!(file.config.len(), 2);
}

#[test]
fn unknown_root_keys_are_reported_sorted() {
    let errs = parse_str(r#"{ "zeta": 1, "builders": [], "alpha": true }"#).unwrap_err();
    assert_eq!(errs.messages(),
               vec!["Unknown root level key in template: 'alpha'",
                    "Unknown root level key in template: 'zeta'"]);
}

#[test]
fn builder_errors_accumulate() {
    let errs = parse_str(r#"{
        "builders": [
            { "name": "no-type" },
            { "type": "chroot" },
            { "type": "chroot" },
            "not-an-object"
        ],
        "provisioners": [ { "inline": [] } ]
    }"#).unwrap_err();

    assert_eq!(errs.messages(),
               vec!["builder 1: missing 'type'",
                    "builder 3: builder with name 'chroot' already exists",
                    "builder 4: expected an object, got string",
                    "provisioner 1: missing 'type'"]);
    assert_eq!(errs.len(), 4);
    assert!(errs.to_string().starts_with("4 errors occurred:"));
}

#[test]
fn malformed_documents_are_rejected() {
    let errs = parse_str("{ not json").unwrap_err();
    assert!(matches!(errs.0[0], TemplateError::Json(_)));

    let errs = parse_str("[1, 2]").unwrap_err();
    assert!(matches!(errs.0[0], TemplateError::NotAnObject));

    let errs = parse_str(r#"{ "builders": { "type": "chroot" } }"#).unwrap_err();
    assert_eq!(errs.to_string(), "'builders': 'builders' expected a list, got object");
}

#[test]
fn empty_template_is_valid() {
    let tpl = parse_str("{}").unwrap();
    assert!(tpl.builders.is_empty());
    assert!(tpl.provisioners.is_empty());
    assert!(tpl.push.is_none());
}
