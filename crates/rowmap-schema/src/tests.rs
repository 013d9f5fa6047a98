use super::*;

#[test]
fn test_key_role_from_catalog() {
    assert_eq!(KeyRole::from_catalog("PRI"), KeyRole::Primary);
    assert_eq!(KeyRole::from_catalog("UNI"), KeyRole::Unique);
    assert_eq!(KeyRole::from_catalog("MUL"), KeyRole::None);
    assert_eq!(KeyRole::from_catalog(""), KeyRole::None);
}

#[test]
fn test_live_column_upper_cases_type() {
    let col = LiveColumn::new("name", "varchar(50)", true, KeyRole::None);
    assert_eq!(col.sql_type, "VARCHAR(50)");
}

#[test]
fn test_field_spec_into_def() {
    let def = column("id")
        .primary()
        .limit(16)
        .into_def("id", SemanticType::ObjectId, false, &[]);
    assert_eq!(def.column, "id");
    assert!(def.primary);
    assert!(!def.nullable);
    assert_eq!(def.limit, Some(16));
    assert_eq!(def.unique, None);
}

#[test]
fn test_option_host_type_is_nullable() {
    let def = column("bio").into_def("bio", SemanticType::Text, true, &[]);
    assert!(def.nullable);
}

#[test]
fn test_unique_key_name() {
    let mut table = TableSchema::new("user");
    table.columns.push(ColumnDecl {
        name: "email".to_string(),
        semantic: SemanticType::Text,
        size_limit: Some(120),
        sql_type: "VARCHAR(120)".to_string(),
        nullable: false,
        primary: false,
        unique: Some(UniqueKey { name: None }),
    });
    table.columns.push(ColumnDecl {
        name: "handle".to_string(),
        semantic: SemanticType::Text,
        size_limit: Some(32),
        sql_type: "VARCHAR(32)".to_string(),
        nullable: false,
        primary: false,
        unique: Some(UniqueKey {
            name: Some("handle_key"),
        }),
    });

    assert_eq!(table.unique_key_name(&table.columns[0]), "uq_user_email");
    assert_eq!(table.unique_key_name(&table.columns[1]), "handle_key");
}

#[test]
fn test_column_definition() {
    let col = ColumnDecl {
        name: "count".to_string(),
        semantic: SemanticType::I32,
        size_limit: None,
        sql_type: "INT".to_string(),
        nullable: false,
        primary: false,
        unique: None,
    };
    assert_eq!(col.definition(), "INT NOT NULL");
}
