//! JSON contract with the mapping server.

use serde_json::{Value, json};
use vmap_model::{
    ArithmeticOperator, Literal, LogicalOperator, Mapping, MappingData, MappingId, MappingStatus,
    Operand,
};

fn stored_mapping() -> Value {
    json!({
        "id": 42,
        "description": "Weight in kilograms",
        "status": "review",
        "target": {
            "schema": {"name": "vitals", "title": "Vital signs", "publish_date": "2015-01-01"},
            "attribute": {"name": "weight_kg", "title": "Weight (kg)", "type": "number"}
        },
        "condition": "ALL",
        "groups": [
            {
                "conversions": [
                    {
                        "operator": null,
                        "value": {
                            "schema": {"name": "site_vitals", "publish_date": "2014-06-30"},
                            "attribute": {"name": "weight_g", "type": "number"}
                        }
                    },
                    {"operator": "MUL", "value": 100}
                ],
                "logic": {"operator": "ALL", "conditions": [{"operator": "EQ", "value": 100}]}
            }
        ]
    })
}

fn load(json: Value) -> Mapping {
    let data: MappingData = serde_json::from_value(json).unwrap();
    Mapping::from_wire(&data)
}

fn save(mapping: &Mapping) -> Value {
    serde_json::to_value(mapping.to_wire()).unwrap()
}

#[test]
fn stored_mapping_round_trips() {
    let json = stored_mapping();
    assert_eq!(save(&load(json.clone())), json);

    // Records the server wrote for mappings without a description or
    // target choice.
    let mut blank = stored_mapping();
    blank["description"] = json!("");
    blank["targetChoice"] = json!({});
    let mapping = load(blank.clone());
    assert_eq!(mapping.description.as_deref(), Some(""));
    assert!(mapping.target_choice.is_none());
    assert_eq!(save(&mapping), blank);
}

#[test]
fn cleared_target_choice_keeps_empty_slot() {
    let json = json!({
        "target": {
            "schema": {"name": "history"},
            "attribute": {"name": "smoker", "type": "choice"}
        },
        "targetChoice": {"name": "1", "title": "Yes"},
        "condition": "ALL",
        "groups": []
    });
    let mut mapping = load(json);
    mapping.target_choice = None;
    assert_eq!(save(&mapping)["targetChoice"], json!({}));

    let fresh = save(&Mapping::new());
    assert!(fresh.get("targetChoice").is_none());
    assert!(fresh.get("description").is_none());
}

#[test]
fn choice_target_round_trips() {
    let json = json!({
        "target": {
            "schema": {"name": "history"},
            "attribute": {"name": "smoker", "type": "choice"}
        },
        "targetChoice": {"name": "1", "title": "Yes"},
        "condition": "ANY",
        "groups": [
            {
                "conversions": [
                    {"operator": null, "value": {"schema": {"name": "site"}, "attribute": {"name": "cigs", "type": "number"}}}
                ],
                "logic": {"operator": "ANY", "conditions": [
                    {"operator": "GT", "value": 0},
                    {"operator": "EQ", "value": 1.5},
                    {"operator": "NE", "value": "none"}
                ]}
            },
            {"conversions": [], "logic": null}
        ]
    });
    let mapping = load(json.clone());
    assert!(mapping.targets_choice());
    assert_eq!(mapping.condition(), LogicalOperator::Any);
    assert_eq!(save(&mapping), json);
}

#[test]
fn hydration_replaces_edited_state() {
    let mut mapping = Mapping::new();
    mapping.add_group();
    mapping.set_condition_str("ANY");
    mapping.description = Some("draft".to_string());

    let data: MappingData = serde_json::from_value(stored_mapping()).unwrap();
    mapping.update(&data);
    assert_eq!(mapping.id, Some(MappingId::new(42)));
    assert_eq!(mapping.status, Some(MappingStatus::Review));
    assert_eq!(mapping.groups_len(), 1);
    assert_eq!(mapping.condition(), LogicalOperator::All);
    assert_eq!(save(&mapping), stored_mapping());
}

#[test]
fn missing_groups_hydrate_empty() {
    let mapping = load(json!({"id": 7, "condition": "BOTH"}));
    assert_eq!(mapping.groups_len(), 0);
    assert_eq!(mapping.condition(), LogicalOperator::All);
}

#[test]
fn end_to_end_load_add_group_save() {
    let mut mapping = load(stored_mapping());
    let conversions = mapping.groups()[0].conversions();
    assert!(conversions[0].by_variable());
    assert_eq!(conversions[1].operator, Some(ArithmeticOperator::Mul));
    assert_eq!(conversions[1].value, Operand::Value(Some(Literal::from(100))));

    mapping.add_group();
    assert_eq!(mapping.groups_len(), 2);
    assert!(mapping.has_multiple_groups());

    let payload = save(&mapping);
    assert_eq!(payload["id"], 42);
    assert_eq!(payload["groups"][0], stored_mapping()["groups"][0]);
    assert_eq!(payload["groups"][1], save(&Mapping::new())["groups"][0]);
    assert_eq!(
        payload["groups"][1],
        json!({
            "conversions": [{"operator": null, "value": {"schema": null, "attribute": null}}],
            "logic": {"operator": "ALL", "conditions": []}
        })
    );
}

#[test]
fn skeleton_payload_snapshot() {
    insta::assert_json_snapshot!(Mapping::new().to_wire(), @r###"
    {
      "target": {
        "schema": null,
        "attribute": null
      },
      "condition": "ALL",
      "groups": [
        {
          "conversions": [
            {
              "operator": null,
              "value": {
                "schema": null,
                "attribute": null
              }
            }
          ],
          "logic": {
            "operator": "ALL",
            "conditions": []
          }
        }
      ]
    }
    "###);
}
