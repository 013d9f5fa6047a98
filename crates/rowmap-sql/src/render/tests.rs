use crate::*;

#[test]
fn test_insert() {
    let stmt = InsertStmt::new("widgets")
        .column("id", Expr::param("id"))
        .column("name", Expr::param("name"));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"INSERT INTO `widgets` (`id`, `name`) VALUES (?, ?)");
    assert_eq!(result.params, vec!["id", "name"]);
}

#[test]
fn test_update_with_raw_predicate() {
    let stmt = UpdateStmt::new("widgets")
        .set("id", Expr::param("id"))
        .set("name", Expr::param("name"))
        .where_(Expr::raw("`id` = ?"));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"UPDATE `widgets` SET `id` = ?, `name` = ? WHERE `id` = ?");
    // Placeholders inside raw fragments are bound by the caller.
    assert_eq!(result.params, vec!["id", "name"]);
}

#[test]
fn test_repeated_param_gets_its_own_placeholder() {
    let stmt = UpdateStmt::new("t")
        .set("id", Expr::param("id"))
        .where_(Expr::column("id").eq(Expr::param("id")));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"UPDATE `t` SET `id` = ? WHERE `id` = ?");
    assert_eq!(result.params, vec!["id", "id"]);
}

#[test]
fn test_select_with_limit() {
    let stmt = SelectStmt::new("widgets")
        .where_(Expr::raw("`name` = ?"))
        .limit(Some(1));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"SELECT * FROM `widgets` WHERE `name` = ? LIMIT 1");
}

#[test]
fn test_select_without_limit() {
    let stmt = SelectStmt::new("widgets").where_(Expr::raw("1 = 1"));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"SELECT * FROM `widgets` WHERE 1 = 1");
}

#[test]
fn test_all_equal() {
    let expr = Expr::all_equal(["user_id", "post_id"]).unwrap();
    let stmt = SelectStmt::new("post_like").where_(expr);

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"SELECT * FROM `post_like` WHERE `user_id` = ? AND `post_id` = ?");
    assert_eq!(result.params, vec!["user_id", "post_id"]);

    assert!(Expr::all_equal(Vec::<String>::new()).is_none());
}

#[test]
fn test_standalone_expression() {
    let expr = Expr::column("name").eq(Expr::param("name"));

    let result = render(&expr);
    insta::assert_snapshot!(result.sql, @"`name` = ?");
    assert_eq!(result.params, vec!["name"]);
}

#[test]
fn test_create_table() {
    let stmt = CreateTableStmt::new("widgets")
        .column(ColumnDef::new("id", "VARCHAR(16)", false))
        .column(ColumnDef::new("note", "TEXT", true));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"CREATE TABLE `widgets` (`id` VARCHAR(16) NOT NULL, `note` TEXT NULL)");
}

#[test]
fn test_alter_add_column_after() {
    let stmt = AlterTableStmt::new("widgets").clause(AlterClause::AddColumn {
        column: ColumnDef::new("active", "TINYINT", false),
        after: Some("name".to_string()),
    });

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"ALTER TABLE `widgets` ADD `active` TINYINT NOT NULL AFTER `name`");
}

#[test]
fn test_alter_change_column() {
    let stmt = AlterTableStmt::new("widgets").clause(AlterClause::ChangeColumn(ColumnDef::new(
        "name",
        "VARCHAR(64)",
        true,
    )));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"ALTER TABLE `widgets` CHANGE `name` `name` VARCHAR(64) NULL");
}

#[test]
fn test_alter_batched_clauses() {
    let stmt = AlterTableStmt::new("post_like")
        .clause(AlterClause::AddUniqueKey {
            name: "uq_post_like_slug".to_string(),
            column: "slug".to_string(),
        })
        .clause(AlterClause::AddPrimaryKey(vec![
            "user_id".to_string(),
            "post_id".to_string(),
        ]));

    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"ALTER TABLE `post_like` ADD UNIQUE KEY `uq_post_like_slug` (`slug`), ADD PRIMARY KEY (`user_id`, `post_id`)");
}

#[test]
fn test_identifier_escaping() {
    let stmt = SelectStmt::new("we`ird");
    let result = render(&stmt);
    insta::assert_snapshot!(result.sql, @"SELECT * FROM `we``ird`");
}
