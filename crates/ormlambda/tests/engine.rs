mod common;

use common::{Call, D, RecordingRepository, engine};
use ormlambda::prelude::*;
use ormlambda::{IfExists, JoinType, ResolutionErrorKind, TableRef};

#[test]
fn unknown_backend_is_a_config_error() {
    let err = Engine::from_url("postgresql://h/db", RecordingRepository::new()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn builder_needs_a_dialect_or_url() {
    let err = Engine::builder()
        .join_type(JoinType::LeftInclusive)
        .build(RecordingRepository::new())
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn url_backends_select_the_mysql_dialect() {
    for url in [
        "mysql://root@localhost/db",
        "mysql+mysqlconnector://root@localhost/db",
        "mariadb://root@localhost/db",
    ] {
        let engine = Engine::from_url(url, RecordingRepository::new()).unwrap();
        assert_eq!(engine.dialect().name(), "mysql");
    }
}

#[test]
fn model_registers_the_relationship_closure() {
    let (engine, _repository) = engine();
    engine.model::<D>().unwrap();

    let names: Vec<&str> = engine
        .registry()
        .tables()
        .iter()
        .map(TableRef::name)
        .collect();
    for name in ["a", "b", "c", "d"] {
        assert!(names.contains(&name), "{name} not registered");
    }
}

#[test]
fn database_operations_go_to_the_repository() {
    let (engine, repository) = engine();

    engine.create_database("shop", IfExists::Replace).unwrap();
    assert!(!engine.database_exists("shop").unwrap());
    engine.drop_table("old").unwrap();
    engine.drop_database("shop").unwrap();

    assert_eq!(
        repository.calls(),
        vec![
            Call::CreateDatabase("shop".to_string(), IfExists::Replace),
            Call::DatabaseExists("shop".to_string()),
            Call::DropTable("old".to_string()),
            Call::DropDatabase("shop".to_string()),
        ]
    );
}

#[test]
fn build_compiles_without_running() {
    let (engine, repository) = engine();
    let mut model = engine.model::<D>().unwrap();
    model.where_(|d| d.c().b().data_b().eq("x"));

    let compiled = model.build().unwrap();
    assert!(compiled.sql.contains("INNER JOIN b AS `d_c_b`"));
    assert_eq!(compiled.groups.len(), 1);
    assert!(repository.calls().is_empty());
    assert!(model.query().is_empty());
}

#[test]
fn duplicate_explicit_join_alias_is_rejected() {
    let (engine, _repository) = engine();
    let mut model = engine.model::<D>().unwrap();
    model
        .join_as::<common::A, _>(JoinType::InnerJoin, "x", |d, a| {
            d.c().b().fk_b().eq(a.pk_a())
        })
        .unwrap()
        .join_as::<common::B, _>(JoinType::InnerJoin, "x", |d, b| d.c().fk_c().eq(b.pk_b()))
        .unwrap();

    let err = model.select().unwrap_err();
    assert_eq!(
        err.resolution_kind(),
        Some(ResolutionErrorKind::AliasCollision)
    );
}
