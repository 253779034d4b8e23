use arango_odm::arango_template::ArangoTemplate;
use arango_odm::client::InMemoryClient;
use arango_odm::errors::OdmResult;
use arango_odm::mapping::EvaluationContext;
use std::backtrace::Backtrace;
use std::sync::Arc;
use std::time::Instant;

/// Runs a test between its setup and teardown.
///
/// `after` runs even when the test fails; panics and errors are reported
/// together with the time the test took.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> OdmResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> OdmResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> OdmResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => match after(ctx) {
                    Ok(_) => Ok(()),
                    Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
                },
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();
    match result {
        Ok(Ok(_)) => {}
        Ok(Err((e, bt))) => {
            eprintln!("\n==================== TEST FAILED ====================");
            eprintln!("Took {:?}", elapsed);
            if !bt.is_empty() && !bt.contains("disabled") {
                eprintln!("\nBacktrace:\n{}", bt);
            }
            eprintln!("=====================================================\n");
            panic!("{}", e);
        }
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            panic!("Test panicked after {:?}: {}", elapsed, err_msg);
        }
    }
}

#[derive(Clone)]
pub struct TestContext {
    database_name: String,
    template: ArangoTemplate,
}

impl TestContext {
    pub fn new(database_name: String, template: ArangoTemplate) -> Self {
        Self {
            database_name,
            template,
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn template(&self) -> ArangoTemplate {
        self.template.clone()
    }
}

pub fn random_database_name() -> String {
    format!("test-{}", uuid::Uuid::new_v4().simple())
}

/// Creates a template over a fresh in-memory database.
pub fn create_test_context() -> OdmResult<TestContext> {
    let database_name = random_database_name();
    let template = ArangoTemplate::builder()
        .client(InMemoryClient::with_database(&database_name))
        .database_name(&database_name)
        .build()?;
    Ok(TestContext::new(database_name, template))
}

/// Creates a template whose templated names resolve against `context`.
pub fn create_test_context_with(context: Arc<dyn EvaluationContext>) -> OdmResult<TestContext> {
    let database_name = random_database_name();
    let template = ArangoTemplate::builder()
        .client(InMemoryClient::with_database(&database_name))
        .database_name(&database_name)
        .evaluation_context(context)
        .build()?;
    Ok(TestContext::new(database_name, template))
}

/// Drops every view and collection the test created.
pub fn cleanup(ctx: TestContext) -> OdmResult<()> {
    let template = ctx.template();
    for view in template.view_registry().view_names() {
        if template.client().view_exists(&view)? {
            template.client().drop_view(&view)?;
        }
        template.view_registry().remove(&view);
    }
    for collection in template.client().collection_names()? {
        template.client().drop_collection(&collection)?;
    }
    log::debug!("Cleaned up test database {}", ctx.database_name());
    Ok(())
}
