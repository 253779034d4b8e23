use arango_odm::errors::OdmResult;
use arango_odm::mapping::MapEvaluationContext;
use arango_odm::repository::ArangoSearchRepository;
use arango_odm_derive::ArangoEntity;
use arango_odm_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with, run_test, TestContext,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Clone, PartialEq, ArangoEntity, Serialize, Deserialize)]
#[arango(search_view(name = "commonView"))]
pub struct CommonViewEntity {
    #[arango(id)]
    id: Option<String>,
    #[arango(field_link)]
    value: String,
}

impl CommonViewEntity {
    fn new(id: &str, value: &str) -> Self {
        CommonViewEntity {
            id: Some(id.to_string()),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, ArangoEntity, Serialize, Deserialize)]
#[arango(document)]
pub struct ViewEntityA {
    #[arango(base)]
    #[serde(flatten)]
    base: CommonViewEntity,
    a: String,
}

#[derive(Debug, Clone, ArangoEntity, Serialize, Deserialize)]
#[arango(document)]
pub struct ViewEntityB {
    #[arango(base)]
    #[serde(flatten)]
    base: CommonViewEntity,
    b: String,
}

#[derive(Debug, Clone, PartialEq, ArangoEntity, Serialize, Deserialize)]
#[arango(document(name = "{region}_items"), search_view(name = "{region}-catalog"))]
pub struct CatalogItem {
    #[arango(id)]
    id: Option<String>,
    #[arango(field_link)]
    title: String,
}

fn populated_context() -> OdmResult<TestContext> {
    let ctx = create_test_context()?;
    let template = ctx.template();
    for (id, value) in [("1", "test0"), ("2", "test1")] {
        template.insert(&ViewEntityA {
            base: CommonViewEntity::new(id, value),
            a: "a".to_string(),
        })?;
    }
    for (id, value) in [("3", "test0"), ("4", "test1")] {
        template.insert(&ViewEntityB {
            base: CommonViewEntity::new(id, value),
            b: "b".to_string(),
        })?;
    }
    Ok(ctx)
}

fn repository(ctx: &TestContext) -> OdmResult<ArangoSearchRepository<CommonViewEntity>> {
    ctx.template().search_repository::<CommonViewEntity>()
}

#[test]
fn view_links_both_collections() {
    run_test(
        populated_context,
        |ctx| {
            let repository = repository(&ctx)?;
            assert_eq!(repository.view_name()?, "commonView");

            let properties = ctx.template().view("commonView")?.properties()?;
            assert_eq!(properties.links.len(), 2);
            assert!(properties.link_on("viewEntityA").is_some());
            assert!(properties.link_on("viewEntityB").is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn find_by_id() {
    run_test(
        populated_context,
        |ctx| {
            let repository = repository(&ctx)?;
            let found = repository.find_by_id("1")?;
            assert_eq!(found, Some(CommonViewEntity::new("1", "test0")));
            assert!(repository.exists_by_id("4")?);
            assert!(repository.find_by_id("5")?.is_none());
            assert!(!repository.exists_by_id("5")?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn find_by_value_spans_collections() {
    run_test(
        populated_context,
        |ctx| {
            let repository = repository(&ctx)?;
            let found = repository.find_by("value", "test0")?;
            let mut ids: Vec<String> = found.into_iter().filter_map(|e| e.id).collect();
            ids.sort();
            assert_eq!(ids, vec!["1", "3"]);

            let by_key = repository.find_by("id", "2")?;
            assert_eq!(by_key, vec![CommonViewEntity::new("2", "test1")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn find_all_and_count() {
    run_test(
        populated_context,
        |ctx| {
            let repository = repository(&ctx)?;
            assert_eq!(repository.count()?, 4);
            assert_eq!(repository.find_all()?.len(), 4);

            let some = repository.find_all_by_id(&["1", "4", "9"])?;
            assert_eq!(some.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn removed_documents_leave_the_view() {
    run_test(
        populated_context,
        |ctx| {
            let template = ctx.template();
            let repository = repository(&ctx)?;
            assert!(template.delete::<ViewEntityA>("1")?);
            assert!(repository.find_by_id("1")?.is_none());
            assert_eq!(repository.count()?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn view_name_follows_context() {
    run_test(
        || create_test_context_with(Arc::new(MapEvaluationContext::new().with("region", "eu"))),
        |ctx| {
            let template = ctx.template();
            template.insert(&CatalogItem { id: None, title: "Atlas".to_string() })?;
            let repository = template.search_repository::<CatalogItem>()?;
            assert_eq!(repository.view_name()?, "eu-catalog");
            assert_eq!(repository.count()?, 1);

            template.mapping_context().set_evaluation_context(Arc::new(
                MapEvaluationContext::new().with("region", "us"),
            ));
            assert_eq!(repository.view_name()?, "us-catalog");
            assert_eq!(repository.count()?, 0);

            template.insert(&CatalogItem { id: None, title: "Globe".to_string() })?;
            let found = repository.find_by("title", "Globe")?;
            assert_eq!(found.len(), 1);
            assert!(repository.find_by("title", "Atlas")?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
