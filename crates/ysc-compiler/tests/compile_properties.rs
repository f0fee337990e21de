//! Integration tests: compile whole schema trees and check the properties the
//! generated documents must have, including acceptance by the `jsonschema`
//! validator.

use proptest::prelude::*;
use serde_json::{json, Value};
use ysc_compiler::{compile, CompileOptions, Encoding, Layout, SchemaDraft};
use ysc_core::{CompilationUnit, CompileError, ReferenceKind, SchemaNode, TypeSpec};

const SYSTEM_YANG: &str = r#"
modules:
  - kind: module
    name: example-system
    prefix: sys
    description: Basic system configuration.
    children:
      - kind: typedef
        name: percent
        type: { name: uint8, range: "0..100" }
      - kind: identity
        name: auth-method
      - kind: identity
        name: password
        bases: [auth-method]
      - kind: identity
        name: public-key
        bases: [auth-method]
      - kind: grouping
        name: endpoint
        children:
          - kind: leaf
            name: address
            mandatory: true
            type: { name: string, length: "1..253" }
          - kind: leaf
            name: port
            type: { name: uint16 }
            default: "123"
      - kind: container
        name: sys:system
        children:
          - kind: leaf
            name: hostname
            type:
              name: string
              patterns: ["[a-zA-Z0-9.-]+"]
          - kind: leaf
            name: load-threshold
            type: { name: percent, range: "10..90" }
          - kind: leaf
            name: auth
            type: { name: identityref, bases: [auth-method] }
          - kind: list
            name: server
            key: [name]
            children:
              - kind: leaf
                name: name
                type: { name: string }
              - kind: uses
                grouping: endpoint
              - kind: leaf
                name: prefer
                type: { name: empty }
          - kind: choice
            name: timezone
            children:
              - kind: case
                name: by-name
                children:
                  - kind: leaf
                    name: timezone-name
                    type: { name: string }
              - kind: case
                name: by-offset
                children:
                  - kind: leaf
                    name: utc-offset
                    type: { name: int16, range: "-1500..1500" }
          - kind: container
            name: state
            config: false
            children:
              - kind: leaf
                name: boot-count
                type: { name: uint64 }
      - kind: rpc
        name: reboot
        input:
          - kind: leaf
            name: delay
            type: { name: uint32 }
"#;

fn system_unit() -> CompilationUnit {
    serde_yaml::from_str(SYSTEM_YANG).unwrap()
}

fn compile_value(unit: &CompilationUnit, options: &CompileOptions) -> Value {
    let doc = compile(unit, None, options).unwrap();
    serde_json::from_str(&doc.to_json().unwrap()).unwrap()
}

fn validator(schema: &Value, draft: SchemaDraft) -> jsonschema::Validator {
    let draft = match draft {
        SchemaDraft::Draft07 => jsonschema::Draft::Draft7,
        SchemaDraft::Draft201909 => jsonschema::Draft::Draft201909,
        SchemaDraft::Draft202012 => jsonschema::Draft::Draft202012,
    };
    let mut opts = jsonschema::options();
    opts.with_draft(draft);
    opts.build(schema).unwrap()
}

fn module(children: Vec<SchemaNode>) -> CompilationUnit {
    CompilationUnit::new(vec![SchemaNode::module("m", "m", children)])
}

#[test]
fn uint8_leaf_is_bounded_by_width() {
    let unit = module(vec![SchemaNode::leaf("level", TypeSpec::named("uint8"))]);
    let doc = compile_value(&unit, &CompileOptions::default());
    assert_eq!(doc["properties"]["level"]["type"], json!("integer"));
    assert_eq!(doc["properties"]["level"]["minimum"], json!(0));
    assert_eq!(doc["properties"]["level"]["maximum"], json!(255));
}

#[test]
fn list_keys_equal_item_required_keys() {
    let doc = compile_value(&system_unit(), &CompileOptions::default());
    let server = &doc["properties"]["sys:system"]["properties"]["server"];
    assert_eq!(server["type"], json!("array"));
    // `name` is the key; `address` is mandatory through the grouping.
    assert_eq!(server["items"]["required"], json!(["name", "address"]));
}

#[test]
fn repeated_compilations_are_byte_identical() {
    let unit = system_unit();
    for options in [
        CompileOptions::default(),
        CompileOptions {
            layout: Layout::Split,
            strip_namespaces: true,
            encoding: Encoding::Rfc7951,
            ..CompileOptions::default()
        },
    ] {
        let first = compile(&unit, None, &options).unwrap().to_json().unwrap();
        let second = compile(&unit, None, &options).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn typedef_cycle_fails_before_output() {
    let unit = module(vec![
        SchemaNode::typedef("a", TypeSpec::named("b")),
        SchemaNode::typedef("b", TypeSpec::named("c")),
        SchemaNode::typedef("c", TypeSpec::named("a")),
        SchemaNode::leaf("x", TypeSpec::named("a")),
    ]);
    let err = compile(&unit, Some("m"), &CompileOptions::default()).unwrap_err();
    match err {
        CompileError::Cycle { chain, path, .. } => {
            assert_eq!(chain, vec!["m:a", "m:b", "m:c", "m:a"]);
            assert_eq!(path.to_string(), "/x");
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn config_only_prunes_state_container() {
    let unit = module(vec![SchemaNode::container(
        "top",
        vec![
            SchemaNode::leaf("name", TypeSpec::named("string")),
            SchemaNode::container("stats", vec![SchemaNode::leaf("hits", TypeSpec::named("uint32")).with_config(false)]),
        ],
    )]);
    let all = compile_value(&unit, &CompileOptions::default());
    assert!(all["properties"]["top"]["properties"].get("stats").is_some());

    let options = CompileOptions {
        config_only: true,
        ..CompileOptions::default()
    };
    let pruned = compile_value(&unit, &options);
    let top = &pruned["properties"]["top"]["properties"];
    assert!(top.get("stats").is_none());
    assert_eq!(top["name"], json!({"type": "string"}));
}

#[test]
fn strip_namespaces_collision_and_passthrough() {
    let unit = module(vec![SchemaNode::container(
        "top",
        vec![
            SchemaNode::container("a:state", vec![SchemaNode::leaf("x", TypeSpec::named("string"))]),
            SchemaNode::container("b:state", vec![SchemaNode::leaf("y", TypeSpec::named("string"))]),
        ],
    )]);
    let kept = compile_value(&unit, &CompileOptions::default());
    let top = &kept["properties"]["top"]["properties"];
    assert!(top.get("a:state").is_some());
    assert!(top.get("b:state").is_some());

    let options = CompileOptions {
        strip_namespaces: true,
        ..CompileOptions::default()
    };
    let err = compile(&unit, Some("m"), &options).unwrap_err();
    match err {
        CompileError::NameCollision {
            path,
            name,
            first,
            second,
        } => {
            assert_eq!(path.to_string(), "/top");
            assert_eq!(name, "state");
            assert_eq!((first.as_str(), second.as_str()), ("a:state", "b:state"));
        }
        other => panic!("expected a collision, got {other}"),
    }
}

#[test]
fn config_filter_runs_before_namespace_stripping() {
    let unit = module(vec![SchemaNode::container(
        "top",
        vec![
            SchemaNode::container("a:state", vec![SchemaNode::leaf("x", TypeSpec::named("string"))]),
            SchemaNode::container("b:state", vec![SchemaNode::leaf("y", TypeSpec::named("string"))]).with_config(false),
        ],
    )]);
    let options = CompileOptions {
        config_only: true,
        strip_namespaces: true,
        ..CompileOptions::default()
    };
    let doc = compile_value(&unit, &options);
    let top = &doc["properties"]["top"]["properties"];
    assert_eq!(top["state"]["properties"]["x"], json!({"type": "string"}));
    assert!(top["state"]["properties"].get("y").is_none());

    let keep_state = CompileOptions {
        config_only: false,
        ..options
    };
    assert!(matches!(
        compile(&unit, Some("m"), &keep_state).unwrap_err(),
        CompileError::NameCollision { .. }
    ));
}

#[test]
fn identityref_accepts_module_prefix_and_bare_names() {
    let schema = compile_value(&system_unit(), &CompileOptions::default());
    let validator = validator(&schema, SchemaDraft::Draft202012);
    for auth in ["example-system:password", "sys:public-key", "password"] {
        assert!(validator.is_valid(&json!({"sys:system": {"auth": auth}})), "rejected {auth}");
    }
    for auth in ["example-system:auth-method", "other:password", "passwd"] {
        assert!(!validator.is_valid(&json!({"sys:system": {"auth": auth}})), "accepted {auth}");
    }
}

#[test]
fn prefixed_leafref_takes_the_named_module_type() {
    let state = |name: &str, x: &str| SchemaNode::container(name, vec![SchemaNode::leaf("x", TypeSpec::named(x))]);
    let unit = CompilationUnit::new(vec![
        SchemaNode::module("mod-a", "a", vec![state("a:state", "string")]),
        SchemaNode::module(
            "mod-b",
            "b",
            vec![state("b:state", "uint8"), SchemaNode::leaf("b:ref", TypeSpec::leafref("/b:state/b:x"))],
        ),
    ]);
    let doc = compile_value(&unit, &CompileOptions::default());
    assert_eq!(
        doc["properties"]["b:ref"],
        json!({"type": "integer", "minimum": 0, "maximum": 255})
    );
}

#[test]
fn choice_cases_flatten_into_parent() {
    let unit = module(vec![SchemaNode::container(
        "p",
        vec![SchemaNode::choice(
            "c",
            vec![
                SchemaNode::case("one", vec![SchemaNode::leaf("a", TypeSpec::named("string"))]),
                SchemaNode::case("two", vec![SchemaNode::leaf("b", TypeSpec::named("string"))]),
            ],
        )],
    )]);
    let doc = compile_value(&unit, &CompileOptions::default());
    let keys: Vec<&String> = doc["properties"]["p"]["properties"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn union_members_keep_declared_order() {
    let unit = module(vec![SchemaNode::leaf(
        "u",
        TypeSpec::union(vec![TypeSpec::named("string"), TypeSpec::enumeration(["x", "y"])]),
    )]);
    let doc = compile_value(&unit, &CompileOptions::default());
    assert_eq!(
        doc["properties"]["u"],
        json!({"anyOf": [{"type": "string"}, {"type": "string", "enum": ["x", "y"]}]})
    );
}

#[test]
fn unknown_root_is_unresolved() {
    let err = compile(&system_unit(), Some("ietf-interfaces"), &CompileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnresolvedReference {
            kind: ReferenceKind::Root,
            ..
        }
    ));
    // The prefix selects the module too.
    assert!(compile(&system_unit(), Some("sys"), &CompileOptions::default()).is_ok());
}

#[test]
fn document_validates_instances_in_every_draft() {
    let unit = system_unit();
    let valid = json!({
        "sys:system": {
            "hostname": "router-1.example.com",
            "load-threshold": 75,
            "auth": "example-system:password",
            "server": [
                {"name": "ntp1", "address": "10.0.0.1", "port": 123, "prefer": true},
                {"name": "ntp2", "address": "10.0.0.2"}
            ],
            "utc-offset": -300,
            "state": {"boot-count": 12}
        }
    });
    let invalid = [
        json!({"sys:system": {"hostname": "bad host"}}),
        json!({"sys:system": {"load-threshold": 95}}),
        json!({"sys:system": {"auth": "sys:auth-method"}}),
        json!({"sys:system": {"server": [{"address": "10.0.0.3"}]}}),
        json!({"sys:system": {"server": [{"name": "x", "address": ""}]}}),
        json!({"sys:system": {"utc-offset": 2000}}),
        json!({"sys:system": {"unknown": 1}}),
    ];
    for draft in [SchemaDraft::Draft07, SchemaDraft::Draft201909, SchemaDraft::Draft202012] {
        let options = CompileOptions {
            draft,
            ..CompileOptions::default()
        };
        let schema = compile_value(&unit, &options);
        assert_eq!(schema["$schema"], json!(draft.uri()));
        let validator = validator(&schema, draft);
        assert!(validator.is_valid(&valid), "{draft}: valid instance rejected");
        for instance in &invalid {
            assert!(!validator.is_valid(instance), "{draft}: accepted {instance}");
        }
    }
}

#[test]
fn rfc7951_encoding_validates_string_numbers_and_null_empty() {
    let options = CompileOptions {
        encoding: Encoding::Rfc7951,
        ..CompileOptions::default()
    };
    let schema = compile_value(&system_unit(), &options);
    let validator = validator(&schema, SchemaDraft::Draft202012);
    let instance = json!({
        "sys:system": {
            "server": [{"name": "a", "address": "b", "prefer": [null]}],
            "state": {"boot-count": "18446744073709551615"}
        }
    });
    assert!(validator.is_valid(&instance));
    assert!(!validator.is_valid(&json!({"sys:system": {"state": {"boot-count": 5}}})));
    assert!(!validator.is_valid(&json!({"sys:system": {"server": [{"name": "a", "address": "b", "prefer": true}]}})));
}

#[test]
fn split_layout_separates_operations() {
    let options = CompileOptions {
        layout: Layout::Split,
        config_only: true,
        strip_namespaces: true,
        ..CompileOptions::default()
    };
    let schema = compile_value(&system_unit(), &options);
    let data = &schema["properties"]["data"]["properties"];
    assert!(data.get("system").is_some());
    assert!(data["system"]["properties"].get("state").is_none());
    let reboot = &schema["properties"]["operations"]["properties"]["example-system:reboot"];
    assert_eq!(reboot["properties"]["input"]["properties"]["delay"]["type"], json!("integer"));
}

#[test]
fn yaml_options_drive_compilation() {
    let options: CompileOptions =
        serde_yaml::from_str("strip-namespaces: true\nannotate: false\ntitle: System\n").unwrap();
    let schema = compile_value(&system_unit(), &options);
    assert_eq!(schema["title"], json!("System"));
    assert!(schema.get("description").is_none());
    assert!(schema["properties"].get("system").is_some());
}

proptest! {
    #[test]
    fn range_restriction_bounds_accepted_values(lo in 0u8..=255, span in 0u8..=255, probe in 0u8..=255) {
        let hi = lo.saturating_add(span);
        let unit = module(vec![SchemaNode::leaf(
            "level",
            TypeSpec::named("uint8").with_range(format!("{lo}..{hi}")),
        )]);
        let schema = compile_value(&unit, &CompileOptions::default());
        prop_assert_eq!(&schema["properties"]["level"]["minimum"], &json!(lo));
        prop_assert_eq!(&schema["properties"]["level"]["maximum"], &json!(hi));
        let validator = validator(&schema, SchemaDraft::Draft202012);
        let accepted = validator.is_valid(&json!({"level": probe}));
        prop_assert_eq!(accepted, (lo..=hi).contains(&probe));
    }

    #[test]
    fn integer_widths_match_their_builtin(width in prop::sample::select(vec![
        ("int8", -128i64, 127i64),
        ("int16", -32_768, 32_767),
        ("int32", -2_147_483_648, 2_147_483_647),
        ("uint8", 0, 255),
        ("uint16", 0, 65_535),
        ("uint32", 0, 4_294_967_295),
    ])) {
        let (name, min, max) = width;
        let unit = module(vec![SchemaNode::leaf("v", TypeSpec::named(name))]);
        let schema = compile_value(&unit, &CompileOptions::default());
        prop_assert_eq!(&schema["properties"]["v"]["minimum"], &json!(min));
        prop_assert_eq!(&schema["properties"]["v"]["maximum"], &json!(max));
    }
}
