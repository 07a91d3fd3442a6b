//! Form schema generator tests
//!
//! These validate the generated document end to end:
//! - Form block selection and warning shells
//! - Per-attribute translation (types, validations, select values)
//! - Dependency rules (visibility compiled, disabled kept verbatim)
//! - Grouping containers and sections
//! - The interested-party template panels

use chrono::{TimeZone, Utc};
use migrate_engine::catalog::{CatalogStore, ReferenceAliases};
use migrate_engine::mapping::form::{
    FormGeneratorOptions, FormSchemaGenerator, MIGRATED_PANEL_KEY, NO_FORMS_WARNING, WARNING_KEY,
};
use migrate_engine::{CatalogLookup, RecordMapper};
use serde_json::{json, Value};
use std::sync::Arc;

fn attributes_catalog() -> Value {
    json!([
        {"id": 577, "validations": ["Required"]},
        {"id": 580, "referenceData": "RD_TIPUS_PERSONA", "validations": ["required"]},
        {"id": 590, "dependencies": {
            "visibility": ["tipusPersona=1|2", "rol=REPRESENTANT"],
            "disabled": ["organismeEACAT=false"]
        }},
        {"id": 600, "dependencies": {"visibility": ["tipusPersona=juridica"]}},
        {"id": 610, "referenceData": "sense_dades"}
    ])
}

fn reference_catalog() -> Value {
    json!([
        {"id": "RD_TIPUS_PERSONA", "name": "tipusPersona", "data": [
            {"key": "1", "value": "Persona física"},
            {"key": "2", "value": "Persona jurídica"},
            {"key": "3", "value": "Administració pública"},
            {"key": "4", "value": "Entitat sense personalitat"}
        ]},
        {"referenceDataCatalog": [
            {"id": "paisos", "data": [
                {"key": "ES", "value": "Espanya", "reference": {"preferredCode": "724"}}
            ]},
            {"id": "idiomes", "data": [{"key": "ca", "value": "Català"}, {"key": "es", "value": "Castellà"}]}
        ]},
        {"id": "sense_dades", "data": []}
    ])
}

fn configuration(with_mobile: bool) -> Value {
    let mut attributes = vec![json!({"name": "email", "label": "Correu"})];
    if with_mobile {
        attributes.push(json!({
            "attributeId": 577,
            "name": "telefonMobil",
            "label": "Telèfon mòbil",
            "component": "mask"
        }));
    }

    json!({
        "config": {"roles": ["Sol·licitant", "Representant", "Altres"]},
        "nodes": [{"name": "FEM_config", "config": {"forms": [{"attributes": attributes}]}}]
    })
}

fn generator_with(configuration: Value) -> FormSchemaGenerator {
    let store = CatalogStore::from_documents(
        &attributes_catalog(),
        &reference_catalog(),
        configuration,
        &ReferenceAliases::default(),
    )
    .unwrap();

    let options = FormGeneratorOptions::default()
        .with_fixed_timestamp(Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap());
    FormSchemaGenerator::with_options(Arc::new(store) as Arc<dyn CatalogLookup>, options)
}

fn generator() -> FormSchemaGenerator {
    generator_with(configuration(true))
}

/// Legacy tree with one matching node holding `attributes`
fn legacy(attributes: Value) -> Value {
    json!({
        "nodes": [
            {"name": "FEM_inici", "config": {"activitySubtype": "inici", "forms": [{"attributes": [{"name": "wrong"}]}]}},
            {
                "name": "FEM_partsInteressades_gestioPartsInteressades",
                "type": "activity",
                "config": {"activitySubtype": "partsInteressades", "forms": [{"attributes": attributes}]}
            }
        ]
    })
}

fn map(generator: &FormSchemaGenerator, legacy: &Value) -> Value {
    generator.map(legacy).unwrap().unwrap()
}

fn components(doc: &Value) -> &Vec<Value> {
    doc["data"]["configForm"]["form"]["components"].as_array().unwrap()
}

fn migrated(doc: &Value) -> &Vec<Value> {
    let panel = components(doc)
        .iter()
        .find(|c| c["key"] == json!(MIGRATED_PANEL_KEY))
        .unwrap();
    panel["components"].as_array().unwrap()
}

fn by_key<'a>(components: &'a [Value], key: &str) -> &'a Value {
    components
        .iter()
        .find(|c| c["key"] == json!(key))
        .unwrap_or_else(|| panic!("no component with key {key}"))
}

fn option_values(component: &Value) -> Vec<Value> {
    component["data"]["values"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["value"].clone())
        .collect()
}

// ============================================================================
// Form Block Selection
// ============================================================================

#[test]
fn test_unmatched_tree_yields_warning_shell() {
    let doc = map(
        &generator(),
        &json!({"nodes": [{"name": "FEM_altres", "config": {"activitySubtype": "altres", "forms": [{"attributes": [{"name": "x"}]}]}}]}),
    );

    assert_eq!(doc[WARNING_KEY], json!("No form found for partsInteressades"));
    let comps = components(&doc);
    assert_eq!(comps.len(), 1);
    assert_eq!(comps[0]["components"], json!([]));
    assert_eq!(doc["family"], json!("CONF"));
}

#[test]
fn test_tree_without_forms_yields_warning_shell() {
    let doc = map(&generator(), &json!({"nodes": []}));
    assert_eq!(doc[WARNING_KEY], json!(NO_FORMS_WARNING));
}

#[test]
fn test_matching_node_is_selected_by_subtype_or_name() {
    let doc = map(&generator(), &legacy(json!([{"name": "nom"}])));

    assert!(doc.get(WARNING_KEY).is_none());
    let fields = migrated(&doc);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["key"], json!("nom"));

    let custom = FormSchemaGenerator::with_options(
        Arc::new(CatalogStore::from_documents(&json!([]), &json!([]), json!({}), &ReferenceAliases::default()).unwrap()),
        FormGeneratorOptions::default().with_target_subtype("inici").with_template(false),
    );
    let doc = map(&custom, &legacy(json!([])));
    assert_eq!(migrated(&doc)[0]["key"], json!("wrong"));
}

// ============================================================================
// Attribute Translation
// ============================================================================

#[test]
fn test_plain_attribute_shape() {
    let doc = map(
        &generator(),
        &legacy(json!([{"attributeId": 577, "name": "nom", "label": "Nom", "component": "input", "disabled": true}])),
    );

    assert_eq!(
        migrated(&doc)[0],
        json!({
            "label": "Nom",
            "key": "nom",
            "type": "textfield",
            "input": true,
            "tableView": true,
            "validateWhenHidden": false,
            "properties": {"attributeId": 577},
            "disabled": true,
            "validate": {"required": true}
        })
    );
}

#[test]
fn test_reference_data_forces_select() {
    let doc = map(
        &generator(),
        &legacy(json!([{"attributeId": 580, "name": "tipusPersona", "component": "boolean"}])),
    );

    let field = &migrated(&doc)[0];
    assert_eq!(field["type"], json!("select"));
    assert_eq!(field["label"], json!("tipusPersona"));
    assert_eq!(option_values(field), vec![json!("1"), json!("2"), json!("3"), json!("4")]);
    assert_eq!(field["validate"]["required"], json!(true));
}

#[test]
fn test_empty_reference_list_keeps_original_type() {
    let doc = map(
        &generator(),
        &legacy(json!([{"attributeId": 610, "name": "flag", "component": "boolean"}])),
    );

    let field = &migrated(&doc)[0];
    assert_eq!(field["type"], json!("checkbox"));
    assert!(field.get("data").is_none());
}

#[test]
fn test_role_field_falls_back_to_configuration_roles() {
    let doc = map(&generator(), &legacy(json!([{"name": "rol", "component": "select"}])));

    let field = &migrated(&doc)[0];
    assert_eq!(field["type"], json!("select"));
    assert_eq!(
        field["data"]["values"][0],
        json!({"label": "Sol·licitant", "value": "Sol·licitant"})
    );
    assert_eq!(field["data"]["values"].as_array().unwrap().len(), 3);
}

#[test]
fn test_select_without_any_source_has_no_values() {
    let doc = map(&generator(), &legacy(json!([{"name": "motiu", "component": "select"}])));

    let field = &migrated(&doc)[0];
    assert_eq!(field["type"], json!("select"));
    assert!(field.get("data").is_none());
}

// ============================================================================
// Dependency Rules
// ============================================================================

#[test]
fn test_first_visibility_rule_is_compiled_and_disabled_rule_kept() {
    let doc = map(&generator(), &legacy(json!([{"attributeId": 590, "name": "dir3"}])));

    let field = &migrated(&doc)[0];
    assert_eq!(
        field["customConditional"],
        json!("show = [1,2].includes(data.tipusPersona);")
    );
    assert_eq!(field["properties"]["disabledRule"], json!("organismeEACAT=false"));
    assert_eq!(field["properties"]["attributeId"], json!(590));
    assert!(field.get("disabled").is_none());
}

#[test]
fn test_text_rule_values_are_quoted() {
    let doc = map(&generator(), &legacy(json!([{"attributeId": 600, "name": "raoSocial"}])));

    assert_eq!(
        migrated(&doc)[0]["customConditional"],
        json!(r#"show = ["juridica"].includes(data.tipusPersona);"#)
    );
}

// ============================================================================
// Grouping
// ============================================================================

#[test]
fn test_grouped_attribute_nests_under_container() {
    let doc = map(
        &generator(),
        &legacy(json!([{"name": "representant$telefon", "label": "Telèfon"}])),
    );

    let fields = migrated(&doc);
    assert_eq!(fields.len(), 1);

    let container = &fields[0];
    assert_eq!(container["key"], json!("representant"));
    assert_eq!(container["type"], json!("container"));
    assert_eq!(container["label"], json!("Representant"));
    assert_eq!(container["customConditional"], json!("show = !!data.isRepresentant;"));

    let children = container["components"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["key"], json!("telefon"));
    assert_eq!(children[0]["label"], json!("Telèfon"));
}

#[test]
fn test_groups_are_created_once_and_reused() {
    let doc = map(
        &generator(),
        &legacy(json!([
            {"name": "adreca", "label": "Adreça postal", "component": "section"},
            {"name": "nom"},
            {"name": "adreca$pais"},
            {"name": "ADRECA$provincia"},
            {"name": "contacte$email"}
        ])),
    );

    let fields = migrated(&doc);
    let keys: Vec<_> = fields.iter().map(|f| f["key"].clone()).collect();
    assert_eq!(keys, vec![json!("adreca"), json!("nom"), json!("contacte")]);

    let address = by_key(fields, "adreca");
    assert_eq!(address["label"], json!("Adreça postal"));
    assert!(address.get("customConditional").is_none());
    let children: Vec<_> = address["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].clone())
        .collect();
    assert_eq!(children, vec![json!("pais"), json!("provincia")]);
}

#[test]
fn test_plain_field_and_group_of_same_name_get_distinct_keys() {
    let doc = map(
        &generator(),
        &legacy(json!([
            {"name": "adreca"},
            {"name": "adreca$pais"},
            {"name": "adreca$pais"}
        ])),
    );

    let fields = migrated(&doc);
    let keys: Vec<_> = fields.iter().map(|f| f["key"].clone()).collect();
    assert_eq!(keys, vec![json!("adreca"), json!("adreca_2")]);

    assert!(fields[0].get("components").is_none());
    let children: Vec<_> = fields[1]["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].clone())
        .collect();
    assert_eq!(children, vec![json!("pais"), json!("pais_2")]);
}

// ============================================================================
// Interested-Party Template
// ============================================================================

fn template(doc: &Value) -> &Vec<Value> {
    let panel = by_key(components(doc), "dadesPartInteressada");
    panel["components"].as_array().unwrap()
}

#[test]
fn test_template_sits_next_to_migrated_panel() {
    let doc = map(&generator(), &legacy(json!([])));

    let keys: Vec<_> = components(&doc).iter().map(|c| c["key"].clone()).collect();
    assert_eq!(keys, vec![json!("dadesPartInteressada"), json!(MIGRATED_PANEL_KEY)]);

    let panels: Vec<_> = template(&doc).iter().map(|c| c["key"].clone()).collect();
    assert_eq!(
        panels,
        vec![
            json!("filaPrincipal"),
            json!("personaFisica"),
            json!("personaJuridica"),
            json!("administracioPublica"),
            json!("entitatSensePersonalitat"),
            json!("adreca"),
        ]
    );
}

#[test]
fn test_top_row_fields() {
    let doc = map(&generator(), &legacy(json!([])));
    let row = by_key(template(&doc), "filaPrincipal");
    assert_eq!(row["type"], json!("columns"));

    let fields: Vec<&Value> = row["columns"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|column| column["components"].as_array().unwrap())
        .collect();

    let rol = fields.iter().find(|f| f["key"] == json!("rol")).unwrap();
    assert_eq!(option_values(rol), vec![json!("SOLLICITANT"), json!("REPRESENTANT"), json!("altres")]);

    let person_type = fields.iter().find(|f| f["key"] == json!("tipusPersona")).unwrap();
    assert_eq!(
        option_values(person_type),
        vec![
            json!("fisica"),
            json!("juridica"),
            json!("administracioPublica"),
            json!("entitatSensePersonalitat")
        ]
    );

    for key in ["isRepresentant", "notificacioElectronica"] {
        let flag = fields.iter().find(|f| f["key"] == json!(key)).unwrap();
        assert_eq!(flag["type"], json!("checkbox"));
        assert_eq!(flag["customConditional"], json!("show = !!data.rol;"));
    }
}

#[test]
fn test_person_panels_are_gated_and_cascade() {
    let doc = map(&generator(), &legacy(json!([])));
    let panel = by_key(template(&doc), "personaJuridica");

    assert_eq!(
        panel["conditional"],
        json!({"show": true, "when": "tipusPersona", "eq": "juridica"})
    );

    let fields = panel["components"].as_array().unwrap();
    assert_eq!(by_key(fields, "numeroDocument")["validate"]["required"], json!(true));
    assert_eq!(by_key(fields, "email")["type"], json!("email"));
    assert_eq!(
        by_key(fields, "codiPostal")["dependsOn"],
        json!(["pais", "comunitat", "provincia"])
    );
    assert_eq!(option_values(by_key(fields, "pais")), vec![json!("724")]);
    assert_eq!(option_values(by_key(fields, "idioma")), vec![json!("ca"), json!("es")]);
    // Lists missing from the catalog fall back to no options
    assert_eq!(by_key(fields, "provincia")["data"]["values"], json!([]));
}

#[test]
fn test_optional_mobile_field_comes_from_configuration() {
    let doc = map(&generator(), &legacy(json!([])));
    let individual = by_key(template(&doc), "personaFisica")["components"]
        .as_array()
        .unwrap();
    let mobile = by_key(individual, "telefonMobil");
    assert_eq!(mobile["label"], json!("Telèfon mòbil"));
    assert_eq!(mobile["type"], json!("textfield"));
    assert_eq!(mobile["validate"]["required"], json!(true));

    let without = map(&generator_with(configuration(false)), &legacy(json!([])));
    let individual = by_key(template(&without), "personaFisica")["components"]
        .as_array()
        .unwrap();
    assert!(individual.iter().all(|c| c["key"] != json!("telefonMobil")));
}

#[test]
fn test_address_panel_has_remarks() {
    let doc = map(&generator(), &legacy(json!([])));
    let address = by_key(template(&doc), "adreca");

    assert!(address.get("conditional").is_none());
    let fields = address["components"].as_array().unwrap();
    for key in ["pais", "comunitat", "provincia", "codiPostal", "adrecaCompleta", "observacions", "indicacionsAddicionals"] {
        by_key(fields, key);
    }
}

#[test]
fn test_fixed_timestamp_makes_output_deterministic() {
    let generator = generator();
    let input = legacy(json!([{"name": "nom"}]));

    let first = map(&generator, &input);
    let second = map(&generator, &input);
    assert_eq!(first, second);
    assert_eq!(
        first["controlData"]["lastUpdate"]["$date"],
        json!("2025-11-01T09:00:00.000Z")
    );
}
