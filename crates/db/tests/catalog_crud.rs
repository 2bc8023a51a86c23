//! Integration tests for the fabric and color repositories.

use sqlx::PgPool;
use stylist_db::models::color::{ColorListQuery, CreateColor, UpdateColor};
use stylist_db::models::fabric::{CreateFabric, FabricListQuery, UpdateFabric};
use stylist_db::repositories::{ColorRepo, FabricRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_color(color_id: &str, name: &str) -> CreateColor {
    CreateColor {
        color_id: color_id.to_string(),
        name: name.to_string(),
        hex_value: Some("#202840".to_string()),
        swatch_code: Some(format!("SW-{color_id}")),
        swatch_url: None,
        status: None,
    }
}

fn new_fabric(family_id: &str, display_name: &str, colors: Vec<CreateColor>) -> CreateFabric {
    CreateFabric {
        family_id: family_id.to_string(),
        display_name: display_name.to_string(),
        status: None,
        sort_order: None,
        colors,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// ---------------------------------------------------------------------------
// Fabrics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_fabric_with_colors(pool: PgPool) {
    let created = FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lana", "Lana Fría", vec![new_color("lana-gris", "Gris"), new_color("lana-azul", "Azul")]),
    )
    .await
    .unwrap();

    assert_eq!(created.fabric.family_id, "lana");
    assert_eq!(created.fabric.status, "active");
    assert_eq!(created.fabric.sort_order, 0);
    let names: Vec<_> = created.colors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Azul", "Gris"]);
    assert!(created.colors.iter().all(|c| c.fabric_family_id == created.fabric.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_color_rolls_back_fabric(pool: PgPool) {
    FabricRepo::create_with_colors(&pool, &new_fabric("lino", "Lino", vec![new_color("taken", "Taken")]))
        .await
        .unwrap();

    let err = FabricRepo::create_with_colors(
        &pool,
        &new_fabric("seda", "Seda", vec![new_color("taken", "Again")]),
    )
    .await
    .unwrap_err();
    assert!(is_unique_violation(&err));

    // The family insert was rolled back with the failing color.
    assert!(FabricRepo::find_by_family_id(&pool, "seda").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_family_id_is_unique_violation(pool: PgPool) {
    FabricRepo::create_with_colors(&pool, &new_fabric("lana", "Lana", vec![]))
        .await
        .unwrap();
    let err = FabricRepo::create_with_colors(&pool, &new_fabric("lana", "Other", vec![]))
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_fabrics_filters_and_orders(pool: PgPool) {
    for (id, name) in [("b-fam", "Beta"), ("a-fam", "Alpha"), ("c-fam", "Gamma")] {
        FabricRepo::create_with_colors(&pool, &new_fabric(id, name, vec![]))
            .await
            .unwrap();
    }
    let gamma = FabricRepo::find_by_family_id(&pool, "c-fam").await.unwrap().unwrap();
    FabricRepo::set_status(&pool, gamma.id, "inactive").await.unwrap();

    let all = FabricRepo::list(&pool, &FabricListQuery::default()).await.unwrap();
    let names: Vec<_> = all.iter().map(|f| f.fabric.display_name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);

    let active = FabricRepo::list(
        &pool,
        &FabricListQuery {
            status: Some("active".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 2);

    let searched = FabricRepo::list(
        &pool,
        &FabricListQuery {
            q: Some("ALP".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].fabric.family_id, "a-fam");

    let paged = FabricRepo::list(
        &pool,
        &FabricListQuery {
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].fabric.display_name, "Beta");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_fabric_replaces_colors(pool: PgPool) {
    let created = FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lana", "Lana", vec![new_color("old-1", "Old 1"), new_color("old-2", "Old 2")]),
    )
    .await
    .unwrap();

    let updated = FabricRepo::update(
        &pool,
        created.fabric.id,
        &UpdateFabric {
            display_name: Some("Lana Premium".into()),
            colors: Some(vec![new_color("new-1", "New 1")]),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.fabric.display_name, "Lana Premium");
    assert_eq!(updated.colors.len(), 1);
    assert_eq!(updated.colors[0].color_id, "new-1");
    assert!(ColorRepo::find_by_color_id(&pool, "old-1").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_fabric_without_colors_keeps_them(pool: PgPool) {
    let created = FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lana", "Lana", vec![new_color("keep", "Keep")]),
    )
    .await
    .unwrap();

    let updated = FabricRepo::update(
        &pool,
        created.fabric.id,
        &UpdateFabric {
            sort_order: Some(5),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.fabric.sort_order, 5);
    assert_eq!(updated.colors.len(), 1);
    assert!(updated.fabric.updated_at >= created.fabric.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_fabric_returns_none(pool: PgPool) {
    let result = FabricRepo::update(&pool, 9999, &UpdateFabric::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_fabric_cascades_colors(pool: PgPool) {
    let created = FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lana", "Lana", vec![new_color("gone", "Gone")]),
    )
    .await
    .unwrap();

    assert!(FabricRepo::delete(&pool, created.fabric.id).await.unwrap());
    assert!(!FabricRepo::delete(&pool, created.fabric.id).await.unwrap());
    assert!(ColorRepo::find_by_color_id(&pool, "gone").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_active_catalog_hides_inactive_rows(pool: PgPool) {
    let lana = FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lana", "Lana", vec![new_color("on", "On"), new_color("off", "Off")]),
    )
    .await
    .unwrap();
    let hidden = FabricRepo::create_with_colors(&pool, &new_fabric("hidden", "Hidden", vec![]))
        .await
        .unwrap();
    FabricRepo::set_status(&pool, hidden.fabric.id, "inactive").await.unwrap();
    let off = lana.colors.iter().find(|c| c.color_id == "off").unwrap();
    ColorRepo::set_status(&pool, off.id, "inactive").await.unwrap();

    let catalog = FabricRepo::list_active_with_colors(&pool).await.unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].colors.len(), 1);
    assert_eq!(catalog[0].colors[0].color_id, "on");
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_color_list_filters(pool: PgPool) {
    FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lana", "Lana", vec![new_color("lana-navy", "Navy"), new_color("lana-grey", "Grey")]),
    )
    .await
    .unwrap();
    FabricRepo::create_with_colors(
        &pool,
        &new_fabric("lino", "Lino", vec![new_color("lino-navy", "Navy Light")]),
    )
    .await
    .unwrap();

    let by_family = ColorRepo::list(
        &pool,
        &ColorListQuery {
            family_id: Some("lana".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_family.len(), 2);
    assert_eq!(by_family[0].name, "Grey");

    let search = ColorRepo::list(
        &pool,
        &ColorListQuery {
            q: Some("navy".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(search.len(), 2);

    let by_swatch = ColorRepo::list(
        &pool,
        &ColorListQuery {
            q: Some("SW-lino".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_swatch.len(), 1);
    assert_eq!(by_swatch[0].color_id, "lino-navy");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_color_update_and_move(pool: PgPool) {
    let lana = FabricRepo::create_with_colors(&pool, &new_fabric("lana", "Lana", vec![new_color("c1", "One")]))
        .await
        .unwrap();
    let lino = FabricRepo::create_with_colors(&pool, &new_fabric("lino", "Lino", vec![]))
        .await
        .unwrap();
    let color = &lana.colors[0];

    let updated = ColorRepo::update(
        &pool,
        color.id,
        &UpdateColor {
            name: Some("Renamed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.hex_value.as_deref(), Some("#202840"));

    let moved = ColorRepo::move_to_family(&pool, color.id, lino.fabric.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.fabric_family_id, lino.fabric.id);

    assert!(ColorRepo::delete(&pool, color.id).await.unwrap());
    assert!(ColorRepo::find_by_id(&pool, color.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_move_to_missing_family_is_fk_violation(pool: PgPool) {
    let lana = FabricRepo::create_with_colors(&pool, &new_fabric("lana", "Lana", vec![new_color("c1", "One")]))
        .await
        .unwrap();
    let err = ColorRepo::move_to_family(&pool, lana.colors[0].id, 424242)
        .await
        .unwrap_err();
    assert!(matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_status_rejected_by_check_constraint(pool: PgPool) {
    let lana = FabricRepo::create_with_colors(&pool, &new_fabric("lana", "Lana", vec![]))
        .await
        .unwrap();
    let err = FabricRepo::set_status(&pool, lana.fabric.id, "deleted")
        .await
        .unwrap_err();
    assert!(matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23514")));
}
